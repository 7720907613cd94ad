#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_precision_loss, clippy::many_single_char_names)]
//! # Policy inference
//!
//! Building blocks for running a trained convolutional policy on the CPU:
//!
//! -   [`Tensor`]: a dense row-major `f32` array with a shape.
//! -   [`nn`]: inference layers (`Conv2d`, `BatchNorm2d`, `Dense`, ...) behind
//!     the [`nn::Layer`] trait and chained with [`nn::Sequential`].
//! -   [`PolicyNetwork`]: the frame-stack policy configured by [`PolicyConfig`].
//! -   [`Checkpoint`]: named parameters persisted as JSON.
//!
//! There is no autograd here; parameters only change by loading a checkpoint.

pub mod checkpoint;
pub mod error;
pub mod nn;
pub mod policy;
pub mod tensor;

pub use checkpoint::Checkpoint;
pub use error::MlError;
pub use policy::{PolicyConfig, PolicyNetwork};
pub use tensor::Tensor;

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Polecam
//!
//! Runs a pretrained convolutional policy on CartPole from pixels only.
//!
//! Each step renders the scene, crops and shrinks the frame to a small gray
//! screen, stacks it with the previous screen and lets the policy pick a
//! push. One line per finished episode goes to stdout:
//!
//! ```text
//! [EPISODE: 0] [STEP: 17.0]
//! ```
//!
//! ## Crates
//!
//! -   [`physics`]: cart-pole dynamics.
//! -   [`render`]: software rasterizer for the scene.
//! -   [`ml`]: tensors, layers, the policy network and checkpoints.
//! -   [`rl`]: simulator trait, screen extraction and the episode loop.
//!
//! This crate adds the configuration layer, reward logging and the binary.

pub mod app;
pub mod config;
pub mod frames;
pub mod logger;

pub use config::{RunArgs, RunConfig};

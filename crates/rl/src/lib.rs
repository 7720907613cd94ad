#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::cast_precision_loss)]
//! # Pixel policy harness
//!
//! Runs a pretrained policy on a simulator it only sees through rendered
//! pixels.
//!
//! -   [`Simulator`]: the capability a backend must offer, implemented by
//!     [`CartPoleSimulator`] and the deterministic [`StubSimulator`].
//! -   [`Environment`]: wraps a simulator and turns frames into observation
//!     tensors as configured by [`ScreenConfig`].
//! -   [`EpisodeRunner`]: stacks consecutive screens, queries the policy and
//!     steps the environment until each episode ends.

pub mod action;
pub mod cartpole;
pub mod env;
pub mod environment;
pub mod error;
pub mod runner;
pub mod screen;
pub mod stub;

pub use action::ActionSelection;
pub use cartpole::CartPoleSimulator;
pub use env::{Simulator, StepInfo, StepOutcome};
pub use environment::Environment;
pub use error::{EnvError, RunError};
pub use runner::{EpisodeReport, EpisodeRunner, EpisodeStartHook, RunSummary};
pub use screen::ScreenConfig;
pub use stub::StubSimulator;

#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
//! # Pole Physics
//!
//! Classic cart-pole dynamics for the pixel policy harness.
//!
//! The crate models a pole hinged on top of a cart that moves along a
//! frictionless track. The agent pushes the cart left or right with a fixed
//! force and the episode ends once the pole tilts past the angle threshold
//! or the cart leaves the track.
//!
//! ## Key Components
//!
//! -   **Configuration:** [`CartPoleConfig`] holds every physical constant
//!     and both termination thresholds.
//! -   **Simulation:** [`CartPole`] owns the state and advances it one tick
//!     per [`CartPole::step`] call.
//! -   **Actions:** [`Push`] is the discrete action space.
//!
//! ## Usage
//!
//! ```rust
//! use physics::{CartPole, CartPoleConfig, Push};
//!
//! let mut cartpole = CartPole::with_seed(CartPoleConfig::default(), 7);
//! cartpole.reset();
//! let transition = cartpole.step(Push::Right)?;
//! assert_eq!(transition.reward, 1.0);
//! # Ok::<(), physics::PhysicsError>(())
//! ```

pub mod cartpole;
pub mod error;

pub use cartpole::{CartPole, CartPoleConfig, CartPoleState, Integrator, Push, Transition};
pub use error::PhysicsError;

//! CartPole dynamics
//!
//! A pole is attached by an un-actuated joint to a cart moving along a
//! frictionless track. The equations of motion follow Barto, Sutton and
//! Anderson (1983), integrated with a fixed time step.

use serde::{Deserialize, Serialize};

use crate::PhysicsError;

/// Time integration scheme used by [`CartPole::step`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Integrator {
    /// Positions advance with the velocities from the start of the tick.
    #[default]
    Euler,
    /// Velocities advance first and positions use the updated velocities.
    SemiImplicitEuler,
}

/// Configuration for a [`CartPole`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartPoleConfig {
    /// Gravitational acceleration in m/s²
    pub gravity: f32,
    /// Cart mass in kg
    pub cart_mass: f32,
    /// Pole mass in kg
    pub pole_mass: f32,
    /// Half of the pole length in meters
    pub half_length: f32,
    /// Force magnitude applied to the cart on every push
    pub force_magnitude: f32,
    /// Seconds between state updates
    pub tau: f32,
    /// Angle threshold for failure detection (radians)
    pub theta_threshold: f32,
    /// Position threshold for failure detection (meters)
    pub x_threshold: f32,
    pub integrator: Integrator,
    /// Every state component starts uniformly in `[-reset_bound, reset_bound]`
    pub reset_bound: f32,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            gravity: 9.8,
            cart_mass: 1.0,
            pole_mass: 0.1,
            half_length: 0.5,
            force_magnitude: 10.0,
            tau: 0.02,
            theta_threshold: 12.0_f32.to_radians(),
            x_threshold: 2.4,
            integrator: Integrator::Euler,
            reset_bound: 0.05,
        }
    }
}

impl CartPoleConfig {
    fn total_mass(&self) -> f32 {
        self.cart_mass + self.pole_mass
    }

    fn pole_mass_length(&self) -> f32 {
        self.pole_mass * self.half_length
    }
}

/// Discrete push applied to the cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Push {
    Left,
    Right,
}

impl TryFrom<usize> for Push {
    type Error = PhysicsError;

    fn try_from(action: usize) -> Result<Self, Self::Error> {
        match action {
            0 => Ok(Push::Left),
            1 => Ok(Push::Right),
            other => Err(PhysicsError::InvalidAction(other)),
        }
    }
}

/// Cart position and velocity plus pole angle and angular velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CartPoleState {
    pub x: f32,
    pub x_dot: f32,
    pub theta: f32,
    pub theta_dot: f32,
}

impl CartPoleState {
    /// Get the state vector `[x, x_dot, theta, theta_dot]`
    #[must_use]
    pub fn to_array(&self) -> [f32; 4] {
        [self.x, self.x_dot, self.theta, self.theta_dot]
    }
}

/// Result of a single [`CartPole::step`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    pub state: CartPoleState,
    pub reward: f32,
    pub done: bool,
    /// Number of steps taken after the episode had already terminated.
    pub steps_beyond_done: Option<u32>,
}

/// A cart-pole system with its own random source for resets.
#[derive(Clone, Debug)]
pub struct CartPole {
    pub config: CartPoleConfig,
    state: Option<CartPoleState>,
    steps_beyond_done: Option<u32>,
    rng: fastrand::Rng,
}

impl CartPole {
    /// Create an unseeded cart-pole. Call [`CartPole::reset`] before stepping.
    #[must_use]
    pub fn new(config: CartPoleConfig) -> Self {
        Self::with_rng(config, fastrand::Rng::new())
    }

    /// Create a cart-pole whose resets are reproducible.
    #[must_use]
    pub fn with_seed(config: CartPoleConfig, seed: u64) -> Self {
        Self::with_rng(config, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(config: CartPoleConfig, rng: fastrand::Rng) -> Self {
        Self {
            config,
            state: None,
            steps_beyond_done: None,
            rng,
        }
    }

    /// Current state, `None` until the first reset.
    #[must_use]
    pub fn state(&self) -> Option<CartPoleState> {
        self.state
    }

    /// Reset to a random state near upright and return it.
    pub fn reset(&mut self) -> CartPoleState {
        let bound = self.config.reset_bound;
        let mut sample = || self.rng.f32() * 2.0 * bound - bound;
        let state = CartPoleState {
            x: sample(),
            x_dot: sample(),
            theta: sample(),
            theta_dot: sample(),
        };
        self.state = Some(state);
        self.steps_beyond_done = None;
        state
    }

    /// Place the system in an explicit state, clearing the termination bookkeeping.
    pub fn set_state(&mut self, state: CartPoleState) {
        self.state = Some(state);
        self.steps_beyond_done = None;
    }

    /// Check whether a state lies outside the position or angle limits
    #[must_use]
    pub fn is_terminal(&self, state: &CartPoleState) -> bool {
        state.x.abs() > self.config.x_threshold || state.theta.abs() > self.config.theta_threshold
    }

    /// Advance the simulation by one tick of `tau` seconds.
    ///
    /// The reward is 1.0 for every step up to and including the one that
    /// terminates the episode, and 0.0 for any step taken afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::NotReset`] if the system was never reset.
    pub fn step(&mut self, push: Push) -> Result<Transition, PhysicsError> {
        let s = self.state.ok_or(PhysicsError::NotReset)?;
        let cfg = &self.config;

        let force = match push {
            Push::Right => cfg.force_magnitude,
            Push::Left => -cfg.force_magnitude,
        };
        let (sin_theta, cos_theta) = s.theta.sin_cos();
        let total_mass = cfg.total_mass();
        let pole_mass_length = cfg.pole_mass_length();

        let temp = (force + pole_mass_length * s.theta_dot * s.theta_dot * sin_theta) / total_mass;
        let theta_acc = (cfg.gravity * sin_theta - cos_theta * temp)
            / (cfg.half_length * (4.0 / 3.0 - cfg.pole_mass * cos_theta * cos_theta / total_mass));
        let x_acc = temp - pole_mass_length * theta_acc * cos_theta / total_mass;

        let next = match cfg.integrator {
            Integrator::Euler => CartPoleState {
                x: s.x + cfg.tau * s.x_dot,
                x_dot: s.x_dot + cfg.tau * x_acc,
                theta: s.theta + cfg.tau * s.theta_dot,
                theta_dot: s.theta_dot + cfg.tau * theta_acc,
            },
            Integrator::SemiImplicitEuler => {
                let x_dot = s.x_dot + cfg.tau * x_acc;
                let theta_dot = s.theta_dot + cfg.tau * theta_acc;
                CartPoleState {
                    x: s.x + cfg.tau * x_dot,
                    x_dot,
                    theta: s.theta + cfg.tau * theta_dot,
                    theta_dot,
                }
            }
        };
        self.state = Some(next);

        let done = self.is_terminal(&next);
        let reward = if !done {
            1.0
        } else if let Some(beyond) = self.steps_beyond_done.as_mut() {
            if *beyond == 0 {
                tracing::warn!(
                    "step() called after the episode terminated; call reset() first, rewards are now 0"
                );
            }
            *beyond += 1;
            0.0
        } else {
            // pole just fell
            self.steps_beyond_done = Some(0);
            1.0
        };

        Ok(Transition {
            state: next,
            reward,
            done,
            steps_beyond_done: self.steps_beyond_done,
        })
    }
}

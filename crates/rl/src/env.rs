use image::RgbImage;

use crate::EnvError;

/// Extra per-step details reported by a simulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepInfo {
    /// Steps taken after the episode had already terminated, if it has.
    pub steps_beyond_done: Option<u32>,
}

/// Result of advancing a [`Simulator`] by one action.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome {
    pub state: Vec<f32>,
    pub reward: f32,
    pub done: bool,
    pub info: StepInfo,
}

/// Capability interface of a renderable, discrete-action simulator.
///
/// Inspired by classic frameworks like OpenAI Gym. Reward and termination
/// semantics belong to the implementation; callers only accumulate and
/// observe them.
pub trait Simulator {
    /// Move to a fresh initial condition. Must precede the first
    /// [`Simulator::step`] or [`Simulator::render`] of every episode.
    fn reset(&mut self) -> Result<(), EnvError>;

    /// Advance the simulation by one action.
    fn step(&mut self, action: usize) -> Result<StepOutcome, EnvError>;

    /// Current frame as an RGB image, `height x width x 3`.
    fn render(&self) -> Result<RgbImage, EnvError>;

    /// Number of discrete actions accepted by [`Simulator::step`].
    fn action_count(&self) -> usize;

    /// Half-width of the track in world units.
    fn x_threshold(&self) -> f32;

    /// Cart position in world units, `None` before the first reset.
    fn cart_position(&self) -> Option<f32>;

    /// Release simulator resources. Calling it more than once is harmless.
    fn close(&mut self) {}
}

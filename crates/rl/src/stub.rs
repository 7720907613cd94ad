//! Deterministic simulator for exercising the harness without physics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use image::{Rgb, RgbImage};

use crate::{EnvError, Simulator, StepInfo, StepOutcome};

const BACKGROUND: Rgb<u8> = Rgb([120, 120, 120]);
const BAR: Rgb<u8> = Rgb([0, 0, 0]);
const BAR_WIDTH: u32 = 4;

/// Frames show a dark vertical bar that moves three pixels per step within
/// an episode, so consecutive frames differ and identical step counts give
/// identical frames. Every step pays `reward`; the episode ends after
/// `done_after` steps.
#[derive(Debug)]
pub struct StubSimulator {
    width: u32,
    height: u32,
    reward: f32,
    done_after: usize,
    started: bool,
    episode_steps: usize,
    resets: usize,
    actions: Vec<usize>,
    closes: Arc<AtomicUsize>,
}

impl StubSimulator {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            reward: 1.0,
            done_after: 1,
            started: false,
            episode_steps: 0,
            resets: 0,
            actions: Vec::new(),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    #[must_use]
    pub fn with_reward(mut self, reward: f32) -> Self {
        self.reward = reward;
        self
    }

    /// Episodes terminate on their `steps`-th step (at least one).
    #[must_use]
    pub fn done_after(mut self, steps: usize) -> Self {
        self.done_after = steps.max(1);
        self
    }

    /// Number of resets so far.
    #[must_use]
    pub fn resets(&self) -> usize {
        self.resets
    }

    /// Every action received, across episodes.
    #[must_use]
    pub fn actions(&self) -> &[usize] {
        &self.actions
    }

    /// Shared counter of `close` calls that stayed effective, readable after
    /// the stub itself is gone.
    #[must_use]
    pub fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }

    fn is_closed(&self) -> bool {
        self.closes.load(Ordering::SeqCst) > 0
    }
}

impl Simulator for StubSimulator {
    fn reset(&mut self) -> Result<(), EnvError> {
        if self.is_closed() {
            return Err(EnvError::Closed);
        }
        self.started = true;
        self.episode_steps = 0;
        self.resets += 1;
        Ok(())
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome, EnvError> {
        if self.is_closed() {
            return Err(EnvError::Closed);
        }
        if !self.started {
            return Err(EnvError::NotReset);
        }
        if action >= self.action_count() {
            return Err(EnvError::InvalidAction { action, count: self.action_count() });
        }
        self.actions.push(action);
        self.episode_steps += 1;
        Ok(StepOutcome {
            state: vec![self.episode_steps as f32],
            reward: self.reward,
            done: self.episode_steps >= self.done_after,
            info: StepInfo::default(),
        })
    }

    fn render(&self) -> Result<RgbImage, EnvError> {
        if self.is_closed() {
            return Err(EnvError::Closed);
        }
        if !self.started {
            return Err(EnvError::NotReset);
        }
        #[allow(clippy::cast_possible_truncation)]
        let start = (self.episode_steps as u32 * 3) % self.width.max(1);
        Ok(RgbImage::from_fn(self.width, self.height, |x, _| {
            if (start..start + BAR_WIDTH).contains(&x) {
                BAR
            } else {
                BACKGROUND
            }
        }))
    }

    fn action_count(&self) -> usize {
        2
    }

    fn x_threshold(&self) -> f32 {
        1.0
    }

    fn cart_position(&self) -> Option<f32> {
        self.started.then_some(0.0)
    }

    fn close(&mut self) {
        if !self.is_closed() {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

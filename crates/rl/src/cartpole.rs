use image::RgbImage;
use physics::{CartPole, CartPoleConfig, Push};
use render::{CartPoleView, ViewConfig};

use crate::{EnvError, Simulator, StepInfo, StepOutcome};

/// The cart-pole physics paired with the software renderer.
pub struct CartPoleSimulator {
    cartpole: CartPole,
    view: CartPoleView,
    closed: bool,
}

impl CartPoleSimulator {
    /// `seed` makes resets reproducible; `None` seeds from the OS.
    #[must_use]
    pub fn new(cartpole: CartPoleConfig, view: ViewConfig, seed: Option<u64>) -> Self {
        let view = CartPoleView::new(view, &cartpole);
        let cartpole = match seed {
            Some(seed) => CartPole::with_seed(cartpole, seed),
            None => CartPole::new(cartpole),
        };
        Self { cartpole, view, closed: false }
    }

    #[must_use]
    pub fn cartpole(&self) -> &CartPole {
        &self.cartpole
    }

    pub fn cartpole_mut(&mut self) -> &mut CartPole {
        &mut self.cartpole
    }

    fn ensure_open(&self) -> Result<(), EnvError> {
        if self.closed {
            Err(EnvError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Simulator for CartPoleSimulator {
    fn reset(&mut self) -> Result<(), EnvError> {
        self.ensure_open()?;
        let state = self.cartpole.reset();
        tracing::debug!(?state, "cart-pole reset");
        Ok(())
    }

    fn step(&mut self, action: usize) -> Result<StepOutcome, EnvError> {
        self.ensure_open()?;
        let push = Push::try_from(action)?;
        let t = self.cartpole.step(push)?;
        Ok(StepOutcome {
            state: t.state.to_array().to_vec(),
            reward: t.reward,
            done: t.done,
            info: StepInfo { steps_beyond_done: t.steps_beyond_done },
        })
    }

    fn render(&self) -> Result<RgbImage, EnvError> {
        self.ensure_open()?;
        let state = self.cartpole.state().ok_or(EnvError::NotReset)?;
        Ok(self.view.render(&state))
    }

    fn action_count(&self) -> usize {
        2
    }

    fn x_threshold(&self) -> f32 {
        self.cartpole.config.x_threshold
    }

    fn cart_position(&self) -> Option<f32> {
        self.cartpole.state().map(|s| s.x)
    }

    fn close(&mut self) {
        if !self.closed {
            tracing::debug!("cart-pole simulator closed");
            self.closed = true;
        }
    }
}

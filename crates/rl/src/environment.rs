use image::RgbImage;
use ml::Tensor;

use crate::{EnvError, ScreenConfig, Simulator, StepOutcome};

/// A [`Simulator`] wrapped with pixel observation extraction.
///
/// Construction resets the simulator once and renders a frame to learn its
/// dimensions. After [`Environment::close`] every operation returns
/// [`EnvError::Closed`]; dropping an open environment closes it.
pub struct Environment<S: Simulator> {
    sim: S,
    screen: ScreenConfig,
    screen_width: u32,
    screen_height: u32,
    scale: f32,
    closed: bool,
}

impl<S: Simulator> Environment<S> {
    /// # Errors
    ///
    /// Fails if the initial reset or render fails, or if the frames would
    /// crop to nothing. The simulator is closed before returning an error.
    pub fn new(mut sim: S, screen: ScreenConfig) -> Result<Self, EnvError> {
        let probe = sim.reset().and_then(|()| sim.render());
        let frame = match probe {
            Ok(frame) => frame,
            Err(e) => {
                sim.close();
                return Err(e);
            }
        };
        let (screen_width, screen_height) = frame.dimensions();
        if let Err(e) = screen.output_shape(screen_width, screen_height) {
            sim.close();
            return Err(e);
        }
        let scale = screen_width as f32 / (sim.x_threshold() * 2.0);
        tracing::info!(screen_width, screen_height, scale, "environment ready");
        Ok(Self { sim, screen, screen_width, screen_height, scale, closed: false })
    }

    fn ensure_open(&self) -> Result<(), EnvError> {
        if self.closed {
            Err(EnvError::Closed)
        } else {
            Ok(())
        }
    }

    /// Start a new episode.
    ///
    /// # Errors
    ///
    /// [`EnvError::Closed`] after close, or the simulator's reset error.
    pub fn reset(&mut self) -> Result<(), EnvError> {
        self.ensure_open()?;
        self.sim.reset()
    }

    /// Forward one action to the simulator unchanged.
    ///
    /// # Errors
    ///
    /// [`EnvError::Closed`] after close, or the simulator's step error.
    pub fn step(&mut self, action: usize) -> Result<StepOutcome, EnvError> {
        self.ensure_open()?;
        self.sim.step(action)
    }

    /// Raw RGB frame from the simulator.
    ///
    /// # Errors
    ///
    /// [`EnvError::Closed`] after close, or the simulator's render error.
    pub fn render_pixels(&self) -> Result<RgbImage, EnvError> {
        self.ensure_open()?;
        self.sim.render()
    }

    /// Preprocessed observation of the current frame, shaped `[1, H, W]`.
    ///
    /// Repeated calls without a step in between return equal tensors.
    ///
    /// # Errors
    ///
    /// As [`Environment::render_pixels`] and [`ScreenConfig::preprocess`].
    pub fn get_screen(&self) -> Result<Tensor, EnvError> {
        let frame = self.render_pixels()?;
        self.screen.preprocess(&frame)
    }

    /// `(height, width)` of the tensors returned by [`Environment::get_screen`].
    ///
    /// # Errors
    ///
    /// Never fails for frames accepted at construction.
    pub fn screen_shape(&self) -> Result<(usize, usize), EnvError> {
        self.screen.output_shape(self.screen_width, self.screen_height)
    }

    /// Horizontal pixel column of the cart centre.
    ///
    /// # Errors
    ///
    /// [`EnvError::Closed`] after close, [`EnvError::NotReset`] before the
    /// simulator has a state.
    #[allow(clippy::cast_possible_truncation)]
    pub fn cart_location(&self) -> Result<i32, EnvError> {
        self.ensure_open()?;
        let x = self.sim.cart_position().ok_or(EnvError::NotReset)?;
        Ok((x * self.scale + self.screen_width as f32 / 2.0).floor() as i32)
    }

    #[must_use]
    pub fn action_count(&self) -> usize {
        self.sim.action_count()
    }

    /// Pixels per world unit along the track.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    pub fn frame_dimensions(&self) -> (u32, u32) {
        (self.screen_width, self.screen_height)
    }

    #[must_use]
    pub fn simulator(&self) -> &S {
        &self.sim
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Release the simulator. Later calls do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.sim.close();
        self.closed = true;
        tracing::debug!("environment closed");
    }
}

impl<S: Simulator> Drop for Environment<S> {
    fn drop(&mut self) {
        self.close();
    }
}

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use image::GrayImage;
use ml::Tensor;
use rl::{Environment, Simulator};

/// Saves the raw render and the preprocessed screen as PNG files.
pub struct FrameDumper {
    dir: PathBuf,
}

impl FrameDumper {
    /// # Errors
    ///
    /// Fails if `dir` cannot be created.
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create frame directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Writes `episode_{n}_raw.png` and `episode_{n}_screen.png`.
    ///
    /// # Errors
    ///
    /// Fails if the environment cannot render or a file cannot be written.
    pub fn dump<S: Simulator>(&self, episode: usize, env: &Environment<S>) -> Result<()> {
        let raw = env.render_pixels()?;
        raw.save(self.dir.join(format!("episode_{episode:05}_raw.png")))?;
        let screen = screen_image(&env.get_screen()?)?;
        screen.save(self.dir.join(format!("episode_{episode:05}_screen.png")))?;
        Ok(())
    }
}

/// `[1, H, W]` values in `[0, 1]` back to 8-bit gray.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn screen_image(screen: &Tensor) -> Result<GrayImage> {
    let &[1, h, w] = screen.shape() else {
        anyhow::bail!("expected a [1, H, W] screen, got {:?}", screen.shape());
    };
    let pixels = screen.data().iter().map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8).collect();
    GrayImage::from_raw(u32::try_from(w)?, u32::try_from(h)?, pixels).context("screen size mismatch")
}

//! Frame preprocessing: crop the cart band, shrink, convert to gray.

use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ml::Tensor;
use serde::{Deserialize, Serialize};

use crate::EnvError;

/// How a rendered frame becomes a policy observation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Fraction of the frame height where the kept band starts.
    pub crop_top: f32,
    /// Fraction of the frame height where the kept band ends (exclusive).
    pub crop_bottom: f32,
    /// Target length of the shorter side after resizing.
    pub resize_pixels: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self { crop_top: 0.4, crop_bottom: 0.8, resize_pixels: 40 }
    }
}

impl ScreenConfig {
    /// Row range `[start, end)` kept from a frame of `height` rows.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn crop_rows(&self, height: u32) -> (u32, u32) {
        let at = |fraction: f32| ((height as f32 * fraction).floor().max(0.0) as u32).min(height);
        let start = at(self.crop_top);
        (start, at(self.crop_bottom).max(start))
    }

    /// `(height, width)` of the observation produced for `width x height`
    /// frames.
    ///
    /// The shorter side of the cropped band becomes `resize_pixels` and the
    /// longer one keeps the aspect ratio, rounded down.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::EmptyFrame`] if the crop or the resize leaves
    /// nothing.
    pub fn output_shape(&self, width: u32, height: u32) -> Result<(usize, usize), EnvError> {
        let (start, end) = self.crop_rows(height);
        let cropped = end - start;
        if width == 0 || cropped == 0 || self.resize_pixels == 0 {
            return Err(EnvError::EmptyFrame { width, height });
        }
        let size = u64::from(self.resize_pixels);
        let (h, w) = if cropped <= width {
            (size, size * u64::from(width) / u64::from(cropped))
        } else {
            (size * u64::from(cropped) / u64::from(width), size)
        };
        if h == 0 || w == 0 {
            return Err(EnvError::EmptyFrame { width, height });
        }
        usize::try_from(h)
            .ok()
            .zip(usize::try_from(w).ok())
            .ok_or(EnvError::EmptyFrame { width, height })
    }

    /// Observation tensor `[1, H, W]` with values in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// As [`ScreenConfig::output_shape`].
    pub fn preprocess(&self, frame: &RgbImage) -> Result<Tensor, EnvError> {
        let (width, height) = frame.dimensions();
        let (out_h, out_w) = self.output_shape(width, height)?;
        let (start, end) = self.crop_rows(height);

        let band = imageops::crop_imm(frame, 0, start, width, end - start).to_image();
        #[allow(clippy::cast_possible_truncation)]
        let resized = imageops::resize(&band, out_w as u32, out_h as u32, FilterType::CatmullRom);
        let data = resized.pixels().map(|p| f32::from(luma(p)) / 255.0).collect();
        Ok(Tensor::new(vec![1, out_h, out_w], data)?)
    }
}

/// ITU-R 601-2 luma in 16-bit fixed point, rounded.
#[allow(clippy::cast_possible_truncation)]
fn luma(&Rgb([r, g, b]): &Rgb<u8>) -> u8 {
    let l = u32::from(r) * 19_595 + u32::from(g) * 38_470 + u32::from(b) * 7_471 + 0x8000;
    (l >> 16) as u8
}

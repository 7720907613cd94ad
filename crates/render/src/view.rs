//! Cart-pole scene layout
//!
//! Geometry follows the classic control renderer: a 600 × 400 frame where the
//! track spans `2 * x_threshold` world units, the cart is 50 × 30 pixels
//! and the pole is 10 pixels wide. Other frame sizes scale every length by
//! `width / 600`.

use glam::Vec2;
use image::{Rgb, RgbImage};
use physics::{CartPoleConfig, CartPoleState};
use serde::{Deserialize, Serialize};

const REFERENCE_WIDTH: f32 = 600.0;
const CART_WIDTH: f32 = 50.0;
const CART_HEIGHT: f32 = 30.0;
const POLE_WIDTH: f32 = 10.0;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const CART_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const POLE_COLOR: Rgb<u8> = Rgb([202, 152, 101]);
const AXLE_COLOR: Rgb<u8> = Rgb([129, 132, 203]);
const TRACK_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

/// Frame size of the rendered scene
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { width: 600, height: 400 }
    }
}

/// Draws a [`CartPoleState`] into an RGB frame.
#[derive(Clone, Debug)]
pub struct CartPoleView {
    pub config: ViewConfig,
    x_threshold: f32,
    half_length: f32,
}

impl CartPoleView {
    #[must_use]
    pub fn new(config: ViewConfig, cartpole: &CartPoleConfig) -> Self {
        Self {
            config,
            x_threshold: cartpole.x_threshold,
            half_length: cartpole.half_length,
        }
    }

    /// Pixels per world unit along the track.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.config.width as f32 / (self.x_threshold * 2.0)
    }

    /// Height of the track line above the bottom edge.
    fn cart_y(&self) -> f32 {
        self.config.height as f32 * 0.25
    }

    #[must_use]
    pub fn render(&self, state: &CartPoleState) -> RgbImage {
        let k = self.config.width as f32 / REFERENCE_WIDTH;
        let scale = self.scale();
        let mut canvas = crate::Canvas::new(self.config.width, self.config.height, BACKGROUND);

        let cart_x = state.x * scale + self.config.width as f32 / 2.0;
        let cart_y = self.cart_y();
        let (half_w, half_h) = (CART_WIDTH * k / 2.0, CART_HEIGHT * k / 2.0);
        canvas.fill_rect(cart_x - half_w, cart_x + half_w, cart_y - half_h, cart_y + half_h, CART_COLOR);

        let axle = Vec2::new(cart_x, cart_y + CART_HEIGHT * k / 4.0);
        let pole_half_w = POLE_WIDTH * k / 2.0;
        let pole_len = scale * 2.0 * self.half_length;
        let rotation = Vec2::from_angle(-state.theta);
        let pole: Vec<Vec2> = [
            Vec2::new(-pole_half_w, -pole_half_w),
            Vec2::new(-pole_half_w, pole_len - pole_half_w),
            Vec2::new(pole_half_w, pole_len - pole_half_w),
            Vec2::new(pole_half_w, -pole_half_w),
        ]
        .into_iter()
        .map(|corner| axle + rotation.rotate(corner))
        .collect();
        canvas.fill_convex_polygon(&pole, POLE_COLOR);
        canvas.fill_circle(axle, pole_half_w, AXLE_COLOR);

        canvas.hline(cart_y, TRACK_COLOR);

        tracing::trace!(cart_x, theta = state.theta, "rendered cart-pole frame");
        canvas.into_image()
    }
}

//! Software renderer for cart-pole frames.
//!
//! Frames are plain [`image::RgbImage`] buffers so they can be handed to the
//! preprocessing pipeline or written to disk without a window or GPU.

pub mod canvas;
pub mod view;

pub use canvas::Canvas;
pub use view::{CartPoleView, ViewConfig};

#![allow(dead_code)]

use ml::{PolicyConfig, PolicyNetwork, Tensor};

/// A three block network small enough to run many forward passes in tests.
/// Spatial sizes shrink 15x20 -> 7x9 -> 3x4 -> 1x1.
pub fn small_config() -> PolicyConfig {
    PolicyConfig {
        input_channels: 2,
        hidden_channels: vec![4, 4, 4],
        hidden_units: 8,
        kernel_size: 3,
        stride: 2,
        input_height: 15,
        input_width: 20,
        action_count: 2,
        checkpoint_path: None,
    }
}

pub fn small_network(seed: u64) -> PolicyNetwork {
    PolicyNetwork::new(small_config(), seed).unwrap()
}

/// Deterministic pseudo-image in `[0, 1]` for the given shape.
pub fn pattern(shape: &[usize], phase: f32) -> Tensor {
    let len = shape.iter().product();
    let data = (0..len).map(|i| ((i as f32 * 0.37 + phase).sin() + 1.0) / 2.0).collect();
    Tensor::from_vec(shape.to_vec(), data)
}

#![allow(dead_code)]

use ml::{PolicyConfig, PolicyNetwork, Tensor};
use rl::{Environment, ScreenConfig, StubSimulator};

/// 40x50 stub frames crop to a 20x40 band, resized to 15x30.
pub fn stub_screen() -> ScreenConfig {
    ScreenConfig { resize_pixels: 15, ..ScreenConfig::default() }
}

pub fn stub_env(sim: StubSimulator) -> Environment<StubSimulator> {
    Environment::new(sim, stub_screen()).unwrap()
}

/// Spatial sizes shrink 15x30 -> 7x14 -> 3x6 -> 1x2.
pub fn stub_policy_config() -> PolicyConfig {
    PolicyConfig {
        hidden_channels: vec![4, 4, 4],
        hidden_units: 8,
        kernel_size: 3,
        input_height: 15,
        input_width: 30,
        ..PolicyConfig::default()
    }
}

pub fn stub_policy(seed: u64) -> PolicyNetwork {
    PolicyNetwork::new(stub_policy_config(), seed).unwrap()
}

/// A policy whose output bias overwhelms everything else.
pub fn biased_policy(bias: [f32; 2]) -> PolicyNetwork {
    let mut checkpoint = stub_policy(9).state_dict();
    checkpoint.insert("head.2.bias", Tensor::from_vec(vec![2], bias.to_vec()));
    PolicyNetwork::from_checkpoint(stub_policy_config(), &checkpoint).unwrap()
}

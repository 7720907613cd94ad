#![allow(dead_code)]

use ml::PolicyConfig;
use polecam::RunConfig;
use rl::{Environment, ScreenConfig, StubSimulator};

/// 40x50 stub frames become 15x30 screens, matched by a small policy.
pub fn stub_config() -> RunConfig {
    RunConfig {
        policy: PolicyConfig {
            hidden_channels: vec![4, 4, 4],
            hidden_units: 8,
            kernel_size: 3,
            input_height: 15,
            input_width: 30,
            ..PolicyConfig::default()
        },
        screen: ScreenConfig { resize_pixels: 15, ..ScreenConfig::default() },
        episodes: Some(3),
        seed: Some(1),
        ..RunConfig::default()
    }
}

pub fn stub_env(config: &RunConfig, sim: StubSimulator) -> Environment<StubSimulator> {
    Environment::new(sim, config.screen.clone()).unwrap()
}

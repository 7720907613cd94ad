mod common;

use common::{pattern, small_config, small_network};
use ml::{MlError, PolicyConfig, PolicyNetwork, Tensor};

#[test]
fn default_architecture_sizes() {
    let cfg = PolicyConfig::default();
    assert_eq!(cfg.conv_output().unwrap(), (2, 16));
    assert_eq!(cfg.linear_input_size().unwrap(), 2 * 16 * 32);
    assert_eq!(cfg.input_shape(), [1, 2, 40, 150]);

    let net = PolicyNetwork::new(cfg, 0).unwrap();
    assert_eq!(net.named_params().len(), 3 * 2 + 3 * 4 + 2 * 2);
}

#[test]
fn output_is_a_distribution() {
    let net = small_network(11);
    for phase in 0..20 {
        let x = pattern(&[1, 2, 15, 20], phase as f32);
        let probs = net.action_probabilities(&x).unwrap();
        assert_eq!(probs.len(), 2);
        assert!(probs.iter().all(|&p| p >= 0.0));
        assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn forward_is_deterministic() {
    let net = small_network(5);
    let x = pattern(&[1, 2, 15, 20], 0.3);
    assert_eq!(net.forward(&x).unwrap(), net.forward(&x).unwrap());

    let twin = small_network(5);
    assert_eq!(net.forward(&x).unwrap(), twin.forward(&x).unwrap());
}

#[test]
fn batched_forward_matches_single_samples() {
    let net = small_network(8);
    let a = pattern(&[1, 2, 15, 20], 0.0);
    let b = pattern(&[1, 2, 15, 20], 1.7);
    let batch = Tensor::cat(&[&a, &b], 0).unwrap();
    let out = net.forward(&batch).unwrap();
    assert_eq!(out.shape(), &[2, 2]);
    let pa = net.action_probabilities(&a).unwrap();
    let pb = net.action_probabilities(&b).unwrap();
    for (x, y) in out.data().iter().zip(pa.iter().chain(&pb)) {
        assert!((x - y).abs() < 1e-6);
    }
}

#[test]
fn wrong_channel_count_is_rejected() {
    let net = small_network(1);
    let one_frame = pattern(&[1, 1, 15, 20], 0.0);
    match net.forward(&one_frame) {
        Err(MlError::ShapeMismatch { expected, found, .. }) => {
            assert_eq!(expected, vec![1, 2, 15, 20]);
            assert_eq!(found, vec![1, 1, 15, 20]);
        }
        Err(other) => panic!("expected shape mismatch, got {other}"),
        Ok(_) => panic!("single frame must not be accepted"),
    }
}

#[test]
fn wrong_spatial_size_is_rejected() {
    let net = small_network(1);
    for shape in [[1, 2, 16, 20], [1, 2, 15, 19]] {
        assert!(matches!(net.forward(&pattern(&shape, 0.0)), Err(MlError::ShapeMismatch { .. })));
    }
    assert!(matches!(net.forward(&pattern(&[2, 15, 20], 0.0)), Err(MlError::ShapeMismatch { .. })));
}

#[test]
fn action_probabilities_requires_batch_of_one() {
    let net = small_network(1);
    let batch = pattern(&[3, 2, 15, 20], 0.0);
    assert!(net.forward(&batch).is_ok());
    assert!(matches!(net.action_probabilities(&batch), Err(MlError::ShapeMismatch { .. })));
}

#[test]
fn impossible_architectures_are_rejected() {
    let too_small = PolicyConfig { input_height: 6, ..small_config() };
    assert!(matches!(PolicyNetwork::new(too_small, 0), Err(MlError::InvalidConfig(_))));

    let no_blocks = PolicyConfig { hidden_channels: Vec::new(), ..small_config() };
    assert!(matches!(PolicyNetwork::new(no_blocks, 0), Err(MlError::InvalidConfig(_))));

    let no_actions = PolicyConfig { action_count: 0, ..small_config() };
    assert!(matches!(PolicyNetwork::new(no_actions, 0), Err(MlError::InvalidConfig(_))));
}

#[test]
fn action_count_sets_output_width() {
    let cfg = PolicyConfig { action_count: 3, ..small_config() };
    let net = PolicyNetwork::new(cfg, 2).unwrap();
    let probs = net.action_probabilities(&pattern(&[1, 2, 15, 20], 0.0)).unwrap();
    assert_eq!(probs.len(), 3);
}

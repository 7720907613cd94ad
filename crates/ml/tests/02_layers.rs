use ml::nn::{conv_output_size, BatchNorm2d, Conv2d, Dense, Flatten, Layer, Relu, Sequential, Softmax};
use ml::{MlError, Tensor};

#[test]
fn conv_output_size_matches_unpadded_formula() {
    assert_eq!(conv_output_size(40, 5, 2), Some(18));
    assert_eq!(conv_output_size(18, 5, 2), Some(7));
    assert_eq!(conv_output_size(7, 5, 2), Some(2));
    assert_eq!(conv_output_size(150, 5, 2), Some(73));
    assert_eq!(conv_output_size(4, 5, 2), None);
}

#[test]
fn conv_forward_exact() {
    let conv = Conv2d {
        weight: Tensor::full(vec![1, 1, 2, 2], 1.0),
        bias: Tensor::from_vec(vec![1], vec![0.5]),
        stride: 1,
    };
    let x = Tensor::from_vec(vec![1, 1, 3, 3], (1..=9).map(|v| v as f32).collect());
    let y = conv.forward(&x).unwrap();
    assert_eq!(y.shape(), &[1, 1, 2, 2]);
    assert_eq!(y.data(), &[12.5, 16.5, 24.5, 28.5]);
}

#[test]
fn conv_stride_skips_positions() {
    let conv = Conv2d {
        weight: Tensor::full(vec![2, 1, 1, 1], 1.0),
        bias: Tensor::zeros(vec![2]),
        stride: 2,
    };
    let x = Tensor::from_vec(vec![1, 1, 3, 3], (1..=9).map(|v| v as f32).collect());
    let y = conv.forward(&x).unwrap();
    assert_eq!(y.shape(), &[1, 2, 2, 2]);
    assert_eq!(&y.data()[..4], &[1.0, 3.0, 7.0, 9.0]);
    assert_eq!(&y.data()[4..], &[1.0, 3.0, 7.0, 9.0]);
}

#[test]
fn conv_rejects_wrong_channels_and_small_inputs() {
    let mut rng = fastrand::Rng::with_seed(1);
    let conv = Conv2d::random(2, 4, 5, 2, &mut rng);
    let one_channel = Tensor::zeros(vec![1, 1, 10, 10]);
    assert!(matches!(conv.forward(&one_channel), Err(MlError::ShapeMismatch { .. })));
    let tiny = Tensor::zeros(vec![1, 2, 4, 10]);
    assert!(matches!(conv.forward(&tiny), Err(MlError::ShapeMismatch { .. })));
    let flat = Tensor::zeros(vec![2, 10]);
    assert!(matches!(conv.forward(&flat), Err(MlError::ShapeMismatch { .. })));
}

#[test]
fn batch_norm_uses_running_statistics() {
    let bn = BatchNorm2d {
        weight: Tensor::from_vec(vec![1], vec![2.0]),
        bias: Tensor::from_vec(vec![1], vec![1.0]),
        running_mean: Tensor::from_vec(vec![1], vec![1.0]),
        running_var: Tensor::from_vec(vec![1], vec![4.0]),
        eps: 1e-5,
    };
    let single = Tensor::from_vec(vec![1, 1, 1, 2], vec![3.0, 1.0]);
    let y = bn.forward(&single).unwrap();
    assert!((y.data()[0] - 3.0).abs() < 1e-4);
    assert!((y.data()[1] - 1.0).abs() < 1e-6);

    // the result for a sample does not depend on the rest of the batch
    let batch = Tensor::from_vec(vec![2, 1, 1, 2], vec![3.0, 1.0, 100.0, -50.0]);
    let yb = bn.forward(&batch).unwrap();
    assert_eq!(&yb.data()[..2], y.data());
}

#[test]
fn batch_norm_applies_per_channel() {
    let bn = BatchNorm2d {
        weight: Tensor::from_vec(vec![2], vec![1.0, 1.0]),
        bias: Tensor::from_vec(vec![2], vec![0.0, 10.0]),
        running_mean: Tensor::zeros(vec![2]),
        running_var: Tensor::from_vec(vec![2], vec![1.0, 1.0]),
        eps: 0.0,
    };
    let x = Tensor::from_vec(vec![1, 2, 1, 2], vec![1.0, 2.0, 1.0, 2.0]);
    let y = bn.forward(&x).unwrap();
    assert_eq!(y.data(), &[1.0, 2.0, 11.0, 12.0]);
}

#[test]
fn dense_forward_exact() {
    let w = vec![
        1.0, 0.5, -0.5, -1.0, // First row
        0.2, 0.3, 0.1, 0.9, // Second row
    ];
    let b = vec![0.1, -0.2];
    let layer = Dense::new(w, b.clone(), 4, 2).unwrap();
    let x = Tensor::from_vec(vec![1, 4], vec![1.0, 2.0, 3.0, 4.0]);
    let y = layer.forward(&x).unwrap();

    let expected_y0 = 1.0 * 1.0 + 0.5 * 2.0 - 0.5 * 3.0 - 1.0 * 4.0 + b[0];
    let expected_y1 = 0.2 * 1.0 + 0.3 * 2.0 + 0.1 * 3.0 + 0.9 * 4.0 + b[1];

    assert!((y.data()[0] - expected_y0).abs() < 1e-6);
    assert!((y.data()[1] - expected_y1).abs() < 1e-6);
}

#[test]
fn dense_rejects_wrong_feature_count() {
    let mut rng = fastrand::Rng::with_seed(2);
    let layer = Dense::random(4, 2, &mut rng);
    let x = Tensor::zeros(vec![1, 5]);
    assert!(matches!(layer.forward(&x), Err(MlError::ShapeMismatch { .. })));
    assert!(Dense::new(vec![0.0; 3], vec![0.0; 2], 4, 2).is_err());
}

#[test]
fn softmax_rows_sum_to_one() {
    let x = Tensor::from_vec(vec![2, 3], vec![1.0, 2.0, 3.0, 1000.0, 1000.0, -1000.0]);
    let y = Softmax.forward(&x).unwrap();
    for row in y.data().chunks(3) {
        assert!((row.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
    assert!((y.data()[3] - 0.5).abs() < 1e-6);
}

#[test]
fn sequential_chains_layers_and_names_params() {
    let mut rng = fastrand::Rng::with_seed(3);
    let mut seq = Sequential::new();
    seq.push(Conv2d::random(1, 2, 2, 1, &mut rng));
    seq.push(BatchNorm2d::new(2));
    seq.push(Relu);
    seq.push(Flatten);
    let y = seq.forward(&Tensor::full(vec![1, 1, 3, 3], 1.0)).unwrap();
    assert_eq!(y.shape(), &[1, 8]);
    assert!(y.data().iter().all(|&v| v >= 0.0));

    let names: Vec<String> = seq.named_params("base").into_iter().map(|(n, _)| n).collect();
    assert_eq!(
        names,
        [
            "base.0.weight",
            "base.0.bias",
            "base.1.weight",
            "base.1.bias",
            "base.1.running_mean",
            "base.1.running_var"
        ]
    );
}

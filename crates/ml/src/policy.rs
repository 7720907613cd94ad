//! Convolutional policy network
//!
//! Maps a stack of preprocessed frames to a probability distribution over
//! the discrete actions:
//!
//! ```text
//! [N, C, H, W] -> (Conv2d -> BatchNorm2d -> ReLU) x blocks -> flatten
//!              -> Dense -> ReLU -> Dense -> softmax -> [N, actions]
//! ```
//!
//! Parameter names mirror the layer indices (`base.0.weight`,
//! `base.1.running_mean`, `head.2.bias`, ...).

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::nn::{conv_output_size, BatchNorm2d, Conv2d, Dense, Flatten, Layer, Relu, Sequential, Softmax};
use crate::{Checkpoint, MlError, Tensor};

/// Optimizer-side counters some exporters store next to the batch-norm statistics.
const IGNORED_SUFFIX: &str = ".num_batches_tracked";

/// Architecture of a [`PolicyNetwork`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Stacked frames per observation
    pub input_channels: usize,
    /// Output channels of each convolution block
    pub hidden_channels: Vec<usize>,
    /// Width of the hidden fully connected layer
    pub hidden_units: usize,
    pub kernel_size: usize,
    pub stride: usize,
    pub input_height: usize,
    pub input_width: usize,
    pub action_count: usize,
    /// Parameters to load at startup
    pub checkpoint_path: Option<PathBuf>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            input_channels: 2,
            hidden_channels: vec![32, 32, 32],
            hidden_units: 24,
            kernel_size: 5,
            stride: 2,
            input_height: 40,
            input_width: 150,
            action_count: 2,
            checkpoint_path: None,
        }
    }
}

impl PolicyConfig {
    /// Spatial `(height, width)` after the last convolution block.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::InvalidConfig`] for zero sizes or when the input
    /// shrinks below the kernel before the last block.
    pub fn conv_output(&self) -> Result<(usize, usize), MlError> {
        if self.input_channels == 0 || self.hidden_units == 0 || self.action_count == 0 {
            return Err(MlError::InvalidConfig(
                "input_channels, hidden_units and action_count must be positive".into(),
            ));
        }
        if self.hidden_channels.is_empty() || self.hidden_channels.contains(&0) {
            return Err(MlError::InvalidConfig("hidden_channels must list positive channel counts".into()));
        }
        let shrink = |size: usize| {
            self.hidden_channels
                .iter()
                .try_fold(size, |s, _| conv_output_size(s, self.kernel_size, self.stride))
        };
        match (shrink(self.input_height), shrink(self.input_width)) {
            (Some(h), Some(w)) => Ok((h, w)),
            _ => Err(MlError::InvalidConfig(format!(
                "input {}x{} is too small for {} blocks of kernel {} stride {}",
                self.input_height,
                self.input_width,
                self.hidden_channels.len(),
                self.kernel_size,
                self.stride
            ))),
        }
    }

    /// Number of features entering the first dense layer.
    ///
    /// # Errors
    ///
    /// See [`PolicyConfig::conv_output`].
    pub fn linear_input_size(&self) -> Result<usize, MlError> {
        let (h, w) = self.conv_output()?;
        let last = self.hidden_channels.last().copied().unwrap_or_default();
        Ok(h * w * last)
    }

    /// Shape of a single stacked observation, batch axis included.
    #[must_use]
    pub fn input_shape(&self) -> [usize; 4] {
        [1, self.input_channels, self.input_height, self.input_width]
    }
}

pub struct PolicyNetwork {
    config: PolicyConfig,
    base: Sequential,
    head: Sequential,
}

impl PolicyNetwork {
    /// Glorot-initialized network with identity batch normalization.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::InvalidConfig`] if the architecture is impossible.
    pub fn new(config: PolicyConfig, seed: u64) -> Result<Self, MlError> {
        let linear_input = config.linear_input_size()?;
        let mut rng = fastrand::Rng::with_seed(seed);

        let mut base = Sequential::new();
        let mut in_channels = config.input_channels;
        for &out_channels in &config.hidden_channels {
            base.push(Conv2d::random(in_channels, out_channels, config.kernel_size, config.stride, &mut rng));
            base.push(BatchNorm2d::new(out_channels));
            base.push(Relu);
            in_channels = out_channels;
        }

        let mut head = Sequential::new();
        head.push(Dense::random(linear_input, config.hidden_units, &mut rng));
        head.push(Relu);
        head.push(Dense::random(config.hidden_units, config.action_count, &mut rng));

        Ok(Self { config, base, head })
    }

    /// Build the network and load the checkpoint named by
    /// `config.checkpoint_path`.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::MissingCheckpointPath`] when no path is set, or
    /// any error from [`Checkpoint::load`] and [`PolicyNetwork::from_checkpoint`].
    pub fn load(config: PolicyConfig) -> Result<Self, MlError> {
        let path = config.checkpoint_path.clone().ok_or(MlError::MissingCheckpointPath)?;
        let checkpoint = Checkpoint::load(&path)?;
        Self::from_checkpoint(config, &checkpoint)
    }

    /// Build the network with every parameter taken from `checkpoint`.
    ///
    /// Loading is strict: each parameter must be present with exactly the
    /// shape the architecture expects, and no unknown names may remain.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::MissingParameter`], [`MlError::ShapeMismatch`] or
    /// [`MlError::UnexpectedParameter`].
    pub fn from_checkpoint(config: PolicyConfig, checkpoint: &Checkpoint) -> Result<Self, MlError> {
        let mut net = Self::new(config, 0)?;
        let mut unused: BTreeSet<&str> = checkpoint
            .iter()
            .map(|(name, _)| name)
            .filter(|name| !name.ends_with(IGNORED_SUFFIX))
            .collect();

        for (name, param) in net.named_params_mut() {
            let loaded = checkpoint
                .get(&name)
                .ok_or_else(|| MlError::MissingParameter(name.clone()))?;
            loaded.expect_shape(&name, param.shape())?;
            *param = loaded.clone();
            unused.remove(name.as_str());
        }
        if let Some(extra) = unused.into_iter().next() {
            return Err(MlError::UnexpectedParameter(extra.to_string()));
        }
        Ok(net)
    }

    #[must_use]
    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    /// Action probabilities for a batch of stacked observations.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::ShapeMismatch`] unless `x` is `[N, C, H, W]` with
    /// the configured channels, height and width.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor, MlError> {
        let [_, c, h, w] = self.config.input_shape();
        match x.shape() {
            &[n, xc, xh, xw] if (xc, xh, xw) == (c, h, w) => {
                tracing::trace!(batch = n, "policy forward");
            }
            found => {
                let batch = found.first().copied().unwrap_or(1);
                return Err(MlError::shape("policy input", &[batch, c, h, w], found));
            }
        }
        let features = Flatten.forward(&self.base.forward(x)?)?;
        let logits = self.head.forward(&features)?;
        Softmax.forward(&logits)
    }

    /// Probabilities for a single observation of batch size one.
    ///
    /// # Errors
    ///
    /// As [`PolicyNetwork::forward`], plus a shape mismatch for larger batches.
    pub fn action_probabilities(&self, x: &Tensor) -> Result<Vec<f32>, MlError> {
        x.expect_shape("single observation", &self.config.input_shape())?;
        Ok(self.forward(x)?.into_data())
    }

    /// Every parameter with its checkpoint name.
    #[must_use]
    pub fn named_params(&self) -> Vec<(String, &Tensor)> {
        let mut params = self.base.named_params("base");
        params.extend(self.head.named_params("head"));
        params
    }

    fn named_params_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        let mut params = self.base.named_params_mut("base");
        params.extend(self.head.named_params_mut("head"));
        params
    }

    /// Snapshot of every parameter, loadable with [`PolicyNetwork::from_checkpoint`].
    #[must_use]
    pub fn state_dict(&self) -> Checkpoint {
        let mut checkpoint = Checkpoint::new();
        for (name, t) in self.named_params() {
            checkpoint.insert(name, t.clone());
        }
        checkpoint
    }
}

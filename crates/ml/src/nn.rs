//! Inference layers
//!
//! Every layer works on batched tensors: images are `[N, C, H, W]` and
//! feature vectors `[N, F]`. Parameters are exposed by name
//! (`weight`, `bias`, `running_mean`, `running_var`) so a [`Sequential`]
//! can list them as `prefix.index.name`.

use crate::{MlError, Tensor};

/// A layer of a feed-forward network.
pub trait Layer: Send + Sync {
    /// Performs the forward pass through the layer.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::ShapeMismatch`] when `x` does not fit the layer.
    fn forward(&self, x: &Tensor) -> Result<Tensor, MlError>;

    fn params(&self) -> Vec<(&'static str, &Tensor)> {
        Vec::new()
    }

    fn params_mut(&mut self) -> Vec<(&'static str, &mut Tensor)> {
        Vec::new()
    }
}

/// Spatial output size of an unpadded convolution, `None` if the kernel
/// does not fit.
#[must_use]
pub fn conv_output_size(size: usize, kernel_size: usize, stride: usize) -> Option<usize> {
    if stride == 0 || kernel_size == 0 || size < kernel_size {
        return None;
    }
    Some((size - (kernel_size - 1) - 1) / stride + 1)
}

fn glorot(fan_in: usize, fan_out: usize, len: usize, rng: &mut fastrand::Rng) -> Vec<f32> {
    let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
    (0..len).map(|_| rng.f32() * 2.0 * limit - limit).collect()
}

/// Unpadded 2D convolution with a square kernel.
pub struct Conv2d {
    /// `[out_channels, in_channels, kernel_size, kernel_size]`
    pub weight: Tensor,
    /// `[out_channels]`
    pub bias: Tensor,
    pub stride: usize,
}

impl Conv2d {
    /// Glorot-uniform weights and zero bias.
    #[must_use]
    pub fn random(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        rng: &mut fastrand::Rng,
    ) -> Self {
        let area = kernel_size * kernel_size;
        let len = out_channels * in_channels * area;
        Self {
            weight: Tensor::from_vec(
                vec![out_channels, in_channels, kernel_size, kernel_size],
                glorot(in_channels * area, out_channels * area, len, rng),
            ),
            bias: Tensor::zeros(vec![out_channels]),
            stride,
        }
    }

    fn dims(&self) -> (usize, usize, usize) {
        let s = self.weight.shape();
        (s[0], s[1], s[2])
    }
}

impl Layer for Conv2d {
    fn forward(&self, x: &Tensor) -> Result<Tensor, MlError> {
        let (out_c, in_c, k) = self.dims();
        let &[n, c, h, w] = x.shape() else {
            return Err(MlError::shape("conv2d input", &[1, in_c, k, k], x.shape()));
        };
        if c != in_c {
            return Err(MlError::shape("conv2d input channels", &[n, in_c, h, w], x.shape()));
        }
        let (Some(oh), Some(ow)) = (conv_output_size(h, k, self.stride), conv_output_size(w, k, self.stride))
        else {
            return Err(MlError::shape("conv2d spatial size", &[n, c, k, k], x.shape()));
        };

        let xd = x.data();
        let wd = self.weight.data();
        let mut out = vec![0.0f32; n * out_c * oh * ow];
        for b in 0..n {
            for o in 0..out_c {
                let bias = self.bias.data()[o];
                for oy in 0..oh {
                    for ox in 0..ow {
                        let mut sum = bias;
                        for ci in 0..c {
                            let x_base = (b * c + ci) * h * w;
                            let w_base = (o * c + ci) * k * k;
                            for ky in 0..k {
                                let row = x_base + (oy * self.stride + ky) * w + ox * self.stride;
                                let w_row = w_base + ky * k;
                                for kx in 0..k {
                                    sum += wd[w_row + kx] * xd[row + kx];
                                }
                            }
                        }
                        out[((b * out_c + o) * oh + oy) * ow + ox] = sum;
                    }
                }
            }
        }
        Tensor::new(vec![n, out_c, oh, ow], out)
    }

    fn params(&self) -> Vec<(&'static str, &Tensor)> {
        vec![("weight", &self.weight), ("bias", &self.bias)]
    }

    fn params_mut(&mut self) -> Vec<(&'static str, &mut Tensor)> {
        vec![("weight", &mut self.weight), ("bias", &mut self.bias)]
    }
}

/// Batch normalization over the channel axis, evaluated with the stored
/// running statistics only.
pub struct BatchNorm2d {
    pub weight: Tensor,
    pub bias: Tensor,
    pub running_mean: Tensor,
    pub running_var: Tensor,
    pub eps: f32,
}

impl BatchNorm2d {
    /// Identity normalization: unit scale, zero shift, zero mean, unit variance.
    #[must_use]
    pub fn new(channels: usize) -> Self {
        Self {
            weight: Tensor::full(vec![channels], 1.0),
            bias: Tensor::zeros(vec![channels]),
            running_mean: Tensor::zeros(vec![channels]),
            running_var: Tensor::full(vec![channels], 1.0),
            eps: 1e-5,
        }
    }
}

impl Layer for BatchNorm2d {
    fn forward(&self, x: &Tensor) -> Result<Tensor, MlError> {
        let channels = self.weight.len();
        let &[n, c, h, w] = x.shape() else {
            return Err(MlError::shape("batch norm input", &[1, channels, 1, 1], x.shape()));
        };
        if c != channels {
            return Err(MlError::shape("batch norm channels", &[n, channels, h, w], x.shape()));
        }

        let plane = h * w;
        let mut out = x.clone();
        for (i, chunk) in out.data_mut().chunks_mut(plane.max(1)).enumerate() {
            let ch = i % c;
            let scale = self.weight.data()[ch] / (self.running_var.data()[ch] + self.eps).sqrt();
            let shift = self.bias.data()[ch] - self.running_mean.data()[ch] * scale;
            for v in chunk {
                *v = *v * scale + shift;
            }
        }
        Ok(out)
    }

    fn params(&self) -> Vec<(&'static str, &Tensor)> {
        vec![
            ("weight", &self.weight),
            ("bias", &self.bias),
            ("running_mean", &self.running_mean),
            ("running_var", &self.running_var),
        ]
    }

    fn params_mut(&mut self) -> Vec<(&'static str, &mut Tensor)> {
        vec![
            ("weight", &mut self.weight),
            ("bias", &mut self.bias),
            ("running_mean", &mut self.running_mean),
            ("running_var", &mut self.running_var),
        ]
    }
}

#[derive(Default)]
pub struct Relu;

impl Layer for Relu {
    fn forward(&self, x: &Tensor) -> Result<Tensor, MlError> {
        Ok(x.map(|v| v.max(0.0)))
    }
}

/// Collapses every axis after the batch axis.
#[derive(Default)]
pub struct Flatten;

impl Layer for Flatten {
    fn forward(&self, x: &Tensor) -> Result<Tensor, MlError> {
        let Some(&n) = x.shape().first() else {
            return Err(MlError::shape("flatten input", &[1, 1], x.shape()));
        };
        let features = x.shape()[1..].iter().product();
        x.clone().reshape(vec![n, features])
    }
}

/// A fully connected layer.
pub struct Dense {
    /// `[out_dim, in_dim]`
    pub weight: Tensor,
    /// `[out_dim]`
    pub bias: Tensor,
}

impl Dense {
    /// Creates a new `Dense` layer with the given weights and biases.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::DataLength`] if the lengths do not match the dimensions.
    pub fn new(weights: Vec<f32>, bias: Vec<f32>, in_dim: usize, out_dim: usize) -> Result<Self, MlError> {
        Ok(Self {
            weight: Tensor::new(vec![out_dim, in_dim], weights)?,
            bias: Tensor::new(vec![out_dim], bias)?,
        })
    }

    /// Glorot initialization
    #[must_use]
    pub fn random(in_dim: usize, out_dim: usize, rng: &mut fastrand::Rng) -> Self {
        Self {
            weight: Tensor::from_vec(vec![out_dim, in_dim], glorot(in_dim, out_dim, in_dim * out_dim, rng)),
            bias: Tensor::zeros(vec![out_dim]),
        }
    }

    #[must_use]
    pub fn in_dim(&self) -> usize {
        self.weight.shape()[1]
    }

    #[must_use]
    pub fn out_dim(&self) -> usize {
        self.weight.shape()[0]
    }
}

impl Layer for Dense {
    fn forward(&self, x: &Tensor) -> Result<Tensor, MlError> {
        let (in_dim, out_dim) = (self.in_dim(), self.out_dim());
        let &[n, features] = x.shape() else {
            return Err(MlError::shape("dense input", &[1, in_dim], x.shape()));
        };
        if features != in_dim {
            return Err(MlError::shape("dense input features", &[n, in_dim], x.shape()));
        }

        let wd = self.weight.data();
        let mut y = vec![0f32; n * out_dim];
        for (row, x_row) in x.data().chunks(in_dim.max(1)).enumerate() {
            for o in 0..out_dim {
                let w_row = &wd[o * in_dim..(o + 1) * in_dim];
                let dot: f32 = w_row.iter().zip(x_row).map(|(w, v)| w * v).sum();
                y[row * out_dim + o] = dot + self.bias.data()[o];
            }
        }
        Tensor::new(vec![n, out_dim], y)
    }

    fn params(&self) -> Vec<(&'static str, &Tensor)> {
        vec![("weight", &self.weight), ("bias", &self.bias)]
    }

    fn params_mut(&mut self) -> Vec<(&'static str, &mut Tensor)> {
        vec![("weight", &mut self.weight), ("bias", &mut self.bias)]
    }
}

/// Softmax over the last axis of a `[N, F]` tensor.
pub struct Softmax;

impl Layer for Softmax {
    fn forward(&self, x: &Tensor) -> Result<Tensor, MlError> {
        let &[_, features] = x.shape() else {
            return Err(MlError::shape("softmax input", &[1, 1], x.shape()));
        };
        let mut out = x.clone();
        for row in out.data_mut().chunks_mut(features.max(1)) {
            let m = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let mut sum = 0.0;
            for v in row.iter_mut() {
                *v = (*v - m).exp();
                sum += *v;
            }
            for v in row.iter_mut() {
                *v /= sum;
            }
        }
        Ok(out)
    }
}

/// Layers applied in order.
#[derive(Default)]
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    pub fn push<L: Layer + 'static>(&mut self, layer: L) {
        self.layers.push(Box::new(layer));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Run every layer in order.
    ///
    /// # Errors
    ///
    /// Propagates the first layer error.
    pub fn forward(&self, x: &Tensor) -> Result<Tensor, MlError> {
        let mut layers = self.layers.iter();
        let Some(first) = layers.next() else {
            return Ok(x.clone());
        };
        let mut out = first.forward(x)?;
        for layer in layers {
            out = layer.forward(&out)?;
        }
        Ok(out)
    }

    /// Parameters named `prefix.index.param`.
    #[must_use]
    pub fn named_params(&self, prefix: &str) -> Vec<(String, &Tensor)> {
        let mut out = Vec::new();
        for (i, layer) in self.layers.iter().enumerate() {
            for (name, t) in layer.params() {
                out.push((format!("{prefix}.{i}.{name}"), t));
            }
        }
        out
    }

    pub fn named_params_mut(&mut self, prefix: &str) -> Vec<(String, &mut Tensor)> {
        let mut out = Vec::new();
        for (i, layer) in self.layers.iter_mut().enumerate() {
            for (name, t) in layer.params_mut() {
                out.push((format!("{prefix}.{i}.{name}"), t));
            }
        }
        out
    }
}

use serde::{Deserialize, Serialize};

use crate::MlError;

/// Dense row-major `f32` tensor.
///
/// The data length always equals the product of the shape, including when
/// the tensor comes out of a checkpoint file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTensor")]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct RawTensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl TryFrom<RawTensor> for Tensor {
    type Error = MlError;

    fn try_from(raw: RawTensor) -> Result<Self, Self::Error> {
        Tensor::new(raw.shape, raw.data)
    }
}

impl Tensor {
    /// Build a tensor, checking that `data` fills `shape` exactly.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::DataLength`] when the lengths disagree.
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Result<Self, MlError> {
        if shape.iter().product::<usize>() != data.len() {
            return Err(MlError::DataLength { len: data.len(), shape });
        }
        Ok(Self { shape, data })
    }

    /// Build a tensor from data known to match `shape`.
    ///
    /// # Panics
    ///
    /// Panics if the data length differs from the shape product.
    #[must_use]
    pub fn from_vec(shape: Vec<usize>, data: Vec<f32>) -> Self {
        assert_eq!(shape.iter().product::<usize>(), data.len());
        Self { shape, data }
    }

    #[must_use]
    pub fn full(shape: Vec<usize>, value: f32) -> Self {
        let len = shape.iter().product();
        Self { shape, data: vec![value; len] }
    }

    #[must_use]
    pub fn zeros(shape: Vec<usize>) -> Self {
        Self::full(shape, 0.0)
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[must_use]
    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Fail with a shape mismatch unless the shape equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::ShapeMismatch`] naming `context`.
    pub fn expect_shape(&self, context: &str, expected: &[usize]) -> Result<(), MlError> {
        if self.shape == expected {
            Ok(())
        } else {
            Err(MlError::shape(context, expected, &self.shape))
        }
    }

    /// Reinterpret the data with a new shape of the same size.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::DataLength`] if the element counts differ.
    pub fn reshape(self, shape: Vec<usize>) -> Result<Self, MlError> {
        Self::new(shape, self.data)
    }

    /// Insert an axis of size one at `axis`.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::ShapeMismatch`] if `axis` is past the last dimension.
    pub fn unsqueeze(mut self, axis: usize) -> Result<Self, MlError> {
        if axis > self.shape.len() {
            return Err(MlError::ShapeMismatch {
                context: format!("unsqueeze at axis {axis}"),
                expected: vec![axis],
                found: self.shape,
            });
        }
        self.shape.insert(axis, 1);
        Ok(self)
    }

    /// Concatenate tensors along `axis`. All other dimensions must agree.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::ShapeMismatch`] for an empty input, an axis out of
    /// range, or disagreeing dimensions.
    pub fn cat(tensors: &[&Tensor], axis: usize) -> Result<Self, MlError> {
        let Some(first) = tensors.first() else {
            return Err(MlError::shape("cat of zero tensors", &[1], &[0]));
        };
        if axis >= first.rank() {
            return Err(MlError::shape(format!("cat along axis {axis}"), &[axis + 1], first.shape()));
        }
        for t in &tensors[1..] {
            let same_rank = t.rank() == first.rank();
            let same_dims = same_rank
                && t.shape.iter().zip(&first.shape).enumerate().all(|(i, (a, b))| i == axis || a == b);
            if !same_dims {
                return Err(MlError::shape(format!("cat along axis {axis}"), first.shape(), t.shape()));
            }
        }

        let outer: usize = first.shape[..axis].iter().product();
        let mut shape = first.shape.clone();
        shape[axis] = tensors.iter().map(|t| t.shape[axis]).sum();
        let mut data = Vec::with_capacity(shape.iter().product());
        for o in 0..outer {
            for t in tensors {
                let inner: usize = t.shape[axis..].iter().product();
                data.extend_from_slice(&t.data[o * inner..(o + 1) * inner]);
            }
        }
        Ok(Self { shape, data })
    }

    /// Apply `f` to every element.
    #[must_use]
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            shape: self.shape.clone(),
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

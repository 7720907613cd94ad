use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MlError {
    #[error("shape mismatch in {context}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        context: String,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("data length {len} does not match shape {shape:?}")]
    DataLength { shape: Vec<usize>, len: usize },
    #[error("invalid network configuration: {0}")]
    InvalidConfig(String),
    #[error("checkpoint is missing parameter `{0}`")]
    MissingParameter(String),
    #[error("checkpoint has unexpected parameter `{0}`")]
    UnexpectedParameter(String),
    #[error("no checkpoint path configured")]
    MissingCheckpointPath,
    #[error("checkpoint i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed checkpoint: {0}")]
    Json(#[from] serde_json::Error),
}

impl MlError {
    pub(crate) fn shape(context: impl Into<String>, expected: &[usize], found: &[usize]) -> Self {
        MlError::ShapeMismatch {
            context: context.into(),
            expected: expected.to_vec(),
            found: found.to_vec(),
        }
    }
}

//! Named parameter snapshots stored as JSON.
//!
//! A checkpoint file is a single JSON object mapping parameter names to
//! `{"shape": [...], "data": [...]}`.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{MlError, Tensor};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint {
    tensors: BTreeMap<String, Tensor>,
}

impl Checkpoint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        self.tensors.insert(name.into(), tensor)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Tensor> {
        self.tensors.remove(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.tensors.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a checkpoint file.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::Io`] if the file cannot be opened and
    /// [`MlError::Json`] if it is not a valid checkpoint.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MlError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| MlError::Io { path: path.to_path_buf(), source })?;
        let checkpoint: Self = serde_json::from_reader(BufReader::new(file))?;
        tracing::info!(path = %path.display(), tensors = checkpoint.len(), "loaded checkpoint");
        Ok(checkpoint)
    }

    /// Write the checkpoint, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`MlError::Io`] if the file cannot be created.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MlError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| MlError::Io { path: path.to_path_buf(), source })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush().map_err(|source| MlError::Io { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), tensors = self.len(), "saved checkpoint");
        Ok(())
    }
}

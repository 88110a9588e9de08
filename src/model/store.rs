use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::model::{LinearUnit, ModelStoreError};

pub const MODEL_KIND: &str = "linear-unit";

/// Persisted parameters of the last successful fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedModel {
    pub kind: String,
    pub weight: f64,
    pub bias: f64,
    /// Running maximum the unit was trained against.
    pub scale: f64,
    pub epochs_run: u32,
    pub final_loss: f64,
    pub stopped_early: bool,
    pub saved_at: String,
}

impl SavedModel {
    pub fn unit(&self) -> LinearUnit {
        LinearUnit::new(self.weight, self.bias)
    }

    /// One-step-ahead forecast for `last`, denormalized by the saved scale.
    pub fn forecast(&self, last: f64) -> f64 {
        if self.scale <= 0.0 {
            return 0.0;
        }
        self.unit().predict(last / self.scale) * self.scale
    }
}

/// A single named slot on disk. Writes overwrite unconditionally.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self { path: dir.as_ref().join(format!("{}.json", key)) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> ModelStoreError {
        ModelStoreError::Io { path: self.path.display().to_string(), source }
    }

    pub fn save(&self, model: &SavedModel) -> Result<(), ModelStoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
            }
        }
        let blob = serde_json::to_string_pretty(model).map_err(ModelStoreError::Encode)?;
        fs::write(&self.path, blob).map_err(|e| self.io_err(e))
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<SavedModel>, ModelStoreError> {
        let blob = match fs::read_to_string(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_err(e)),
        };
        serde_json::from_str(&blob)
            .map(Some)
            .map_err(|source| ModelStoreError::Decode {
                path: self.path.display().to_string(),
                source,
            })
    }
}

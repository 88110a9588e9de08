//! Next-result regression: fit, persistence and the retrain pipeline.

pub mod predictor;
pub mod store;
pub mod unit;

pub use predictor::{train_and_predict, Forecast};
pub use store::{ModelStore, SavedModel};
pub use unit::{FitConfig, FitReport, LinearUnit};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TrainError {
    #[error("need at least {need} values to train, have {have}")]
    InsufficientData { have: usize, need: usize },
    #[error("history value #{index} is not a positive finite number: {value}")]
    InvalidValue { index: usize, value: f64 },
    #[error("inputs ({inputs}) and targets ({targets}) differ in length")]
    ShapeMismatch { inputs: usize, targets: usize },
    #[error("fit diverged at epoch {epoch}")]
    Diverged { epoch: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum ModelStoreError {
    #[error("model slot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("model blob could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("model blob at {path} could not be decoded: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Any failure of one retrain-and-forecast pass.
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error(transparent)]
    Train(#[from] TrainError),
    #[error(transparent)]
    Persist(#[from] ModelStoreError),
    #[error("training task aborted: {0}")]
    Aborted(String),
}

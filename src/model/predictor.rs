//! Retrain-and-forecast pipeline over the whole history.
//!
//! normalize -> lag-1 pairing -> fit -> persist -> forecast. Each step is
//! fallible and runs strictly after the previous one.

use crate::logging::{log_model_io, log_training, ProfileScope};
use crate::model::store::MODEL_KIND;
use crate::model::unit::fit;
use crate::model::{FitConfig, FitReport, LinearUnit, ModelStore, PredictError, SavedModel, TrainError};

#[derive(Debug, Clone)]
pub struct Forecast {
    /// Denormalized next-result prediction.
    pub value: f64,
    /// Running maximum used for this pass.
    pub scale: f64,
    pub history_len: usize,
    pub unit: LinearUnit,
    pub report: FitReport,
    pub saved: SavedModel,
}

impl Forecast {
    pub fn line(&self) -> String {
        format!("Next result prediction: {:.2}x.", self.value)
    }
}

/// Divide every value by the running maximum. Returns `(normalized, max)`.
pub fn normalize(values: &[f64]) -> Result<(Vec<f64>, f64), TrainError> {
    for (index, &value) in values.iter().enumerate() {
        if !value.is_finite() || value <= 0.0 {
            return Err(TrainError::InvalidValue { index, value });
        }
    }
    let max = values
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(TrainError::InsufficientData { have: 0, need: 2 })?;
    Ok((values.iter().map(|v| v / max).collect(), max))
}

/// Lag-1 supervised framing: input `x[i]`, target `x[i + 1]`.
pub fn lag_pairs(series: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if series.len() < 2 {
        return (Vec::new(), Vec::new());
    }
    (series[..series.len() - 1].to_vec(), series[1..].to_vec())
}

pub fn train_and_predict(
    values: &[f64],
    cfg: &FitConfig,
    slot: &ModelStore,
) -> Result<Forecast, PredictError> {
    let _scope = ProfileScope::new("predictor", "train_and_predict");
    if values.len() < 2 {
        return Err(TrainError::InsufficientData { have: values.len(), need: 2 }.into());
    }

    let (normalized, scale) = normalize(values)?;
    let (xs, ys) = lag_pairs(&normalized);
    let (unit, report) = fit(&xs, &ys, cfg)?;
    log_training(values.len(), scale, &report);

    let saved = SavedModel {
        kind: MODEL_KIND.to_string(),
        weight: unit.weight,
        bias: unit.bias,
        scale,
        epochs_run: report.epochs_run,
        final_loss: report.final_loss,
        stopped_early: report.stopped_early,
        saved_at: crate::logging::ts_now(),
    };
    slot.save(&saved)?;
    log_model_io("save", &slot.path().display().to_string(), true);

    let last = normalized[normalized.len() - 1];
    let value = unit.predict(last) * scale;

    Ok(Forecast {
        value,
        scale,
        history_len: values.len(),
        unit,
        report,
        saved,
    })
}

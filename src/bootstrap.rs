//! Startup sequence: fetch -> seed -> train once -> load saved model.
//!
//! Steps run strictly in order. No failure escapes: a failed fetch leaves the
//! session empty and offline, a failed fit or unreadable slot is logged and
//! reported in the returned [`BootReport`].

use crate::feed::{fetch_initial, ResultSource};
use crate::logging::{log_model_io, log_model_io_error, log_rejected, log_system, log_train_failed, v_str};
use crate::model::{train_and_predict, FitConfig, ModelStore, PredictError};
use crate::session::{App, MODEL_UNREADABLE};
use crate::state::ApiStatus;
use serde_json::json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelLoad {
    Loaded,
    Missing,
    Unreadable,
}

#[derive(Debug)]
pub struct BootReport {
    pub status: ApiStatus,
    pub seeded: usize,
    pub skipped: usize,
    /// `None` when the seeded history was too short to train on.
    pub trained: Option<Result<f64, PredictError>>,
    pub model: ModelLoad,
}

pub async fn bootstrap<S: ResultSource + ?Sized>(
    app: &mut App,
    source: &S,
    fit: &FitConfig,
    slot: &ModelStore,
    min_train_len: usize,
) -> BootReport {
    let fetched = fetch_initial(source).await;
    app.status = fetched.status;

    let mut seeded = 0;
    let mut skipped = 0;
    for value in fetched.results {
        match app.seed(value) {
            Ok(_) => seeded += 1,
            Err(err) => {
                skipped += 1;
                log_rejected(&value.to_string(), &err.to_string());
            }
        }
    }

    let trained = if app.len() >= min_train_len {
        Some(train_once(app, fit, slot).await)
    } else {
        None
    };

    let model = match slot.load() {
        Ok(found) => {
            log_model_io("load", &slot.path().display().to_string(), found.is_some());
            let state = if found.is_some() { ModelLoad::Loaded } else { ModelLoad::Missing };
            app.set_loaded_model(found);
            state
        }
        Err(err) => {
            log_model_io_error("load", &slot.path().display().to_string(), &err.to_string());
            app.set_prediction_line(MODEL_UNREADABLE);
            ModelLoad::Unreadable
        }
    };

    log_system(
        "bootstrap",
        &[
            ("status", v_str(app.status.as_str())),
            ("seeded", json!(seeded)),
            ("skipped", json!(skipped)),
            ("trained", json!(matches!(trained, Some(Ok(_))))),
            ("model_loaded", json!(model == ModelLoad::Loaded)),
            ("history_len", json!(app.len())),
        ],
    );

    BootReport { status: app.status, seeded, skipped, trained, model }
}

async fn train_once(app: &mut App, fit: &FitConfig, slot: &ModelStore) -> Result<f64, PredictError> {
    let history = app.values().to_vec();
    let history_len = history.len();
    let fit = fit.clone();
    let slot = slot.clone();
    let result = tokio::task::spawn_blocking(move || train_and_predict(&history, &fit, &slot))
        .await
        .unwrap_or_else(|e| Err(PredictError::Aborted(e.to_string())));
    match result {
        Ok(forecast) => {
            app.apply_forecast(&forecast);
            Ok(forecast.value)
        }
        Err(err) => {
            log_train_failed(history_len, &err.to_string());
            Err(err)
        }
    }
}

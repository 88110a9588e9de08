//! Background retraining with at most one fit in flight.
//!
//! Requests that arrive while a fit is running are coalesced: only the most
//! recent history is kept, and it starts as soon as the running fit reports
//! back through the outcome channel.

use tokio::sync::mpsc;

use crate::logging::{log, log_train_failed, obj, Domain, Level};
use crate::model::{train_and_predict, FitConfig, Forecast, ModelStore, PredictError};
use crate::session::App;
use serde_json::json;

#[derive(Debug)]
pub struct TrainOutcome {
    pub history_len: usize,
    pub result: Result<Forecast, PredictError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    Started,
    /// Queued behind the running fit, replacing any older queued request.
    Queued,
}

pub struct Retrainer {
    fit: FitConfig,
    slot: ModelStore,
    tx: mpsc::UnboundedSender<TrainOutcome>,
    busy: bool,
    pending: Option<Vec<f64>>,
    started: u64,
    coalesced: u64,
}

impl Retrainer {
    pub fn new(fit: FitConfig, slot: ModelStore) -> (Self, mpsc::UnboundedReceiver<TrainOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let retrainer = Self {
            fit,
            slot,
            tx,
            busy: false,
            pending: None,
            started: 0,
            coalesced: 0,
        };
        (retrainer, rx)
    }

    pub fn request(&mut self, history: Vec<f64>) -> Submission {
        if self.busy {
            if self.pending.replace(history).is_some() {
                self.coalesced += 1;
            }
            return Submission::Queued;
        }
        self.start(history);
        Submission::Started
    }

    fn start(&mut self, history: Vec<f64>) {
        self.busy = true;
        self.started += 1;
        let history_len = history.len();
        log(
            Level::Debug,
            Domain::Model,
            "train_start",
            obj(&[("history_len", json!(history_len)), ("run", json!(self.started))]),
        );

        let fit = self.fit.clone();
        let slot = self.slot.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let joined =
                tokio::task::spawn_blocking(move || train_and_predict(&history, &fit, &slot)).await;
            let result = joined.unwrap_or_else(|e| Err(PredictError::Aborted(e.to_string())));
            let _ = tx.send(TrainOutcome { history_len, result });
        });
    }

    /// Mark the running fit as done; starts the queued request if any.
    /// Returns true when a new fit was started.
    pub fn finished(&mut self) -> bool {
        self.busy = false;
        match self.pending.take() {
            Some(history) => {
                self.start(history);
                true
            }
            None => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn started(&self) -> u64 {
        self.started
    }

    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

/// Fold a finished fit into the session. Failures leave the previous
/// prediction in place.
pub fn apply_outcome(app: &mut App, outcome: TrainOutcome) -> Result<String, PredictError> {
    match outcome.result {
        Ok(forecast) => {
            app.apply_forecast(&forecast);
            Ok(forecast.line())
        }
        Err(err) => {
            log_train_failed(outcome.history_len, &err.to_string());
            Err(err)
        }
    }
}

/// Wait for the running fit (and anything queued behind it) to report.
pub async fn drain(
    retrainer: &mut Retrainer,
    rx: &mut mpsc::UnboundedReceiver<TrainOutcome>,
    app: &mut App,
) -> Vec<Result<String, PredictError>> {
    let mut lines = Vec::new();
    while retrainer.is_busy() {
        match rx.recv().await {
            Some(outcome) => {
                lines.push(apply_outcome(app, outcome));
                retrainer.finished();
            }
            None => break,
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Config;

    fn setup(dir: &std::path::Path) -> (Retrainer, mpsc::UnboundedReceiver<TrainOutcome>) {
        let fit = FitConfig { seed: Some(3), ..Default::default() };
        Retrainer::new(fit, ModelStore::new(dir, "model"))
    }

    #[tokio::test]
    async fn test_requests_while_busy_coalesce_to_latest() {
        let dir = tempfile::tempdir().unwrap();
        let (mut retrainer, mut rx) = setup(dir.path());
        let mut app = App::new(&Config::default());

        assert_eq!(retrainer.request(vec![1.0; 10]), Submission::Started);
        assert_eq!(retrainer.request(vec![1.0; 11]), Submission::Queued);
        assert_eq!(retrainer.request(vec![1.0; 12]), Submission::Queued);
        assert_eq!(retrainer.coalesced(), 1);

        let results = drain(&mut retrainer, &mut rx, &mut app).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(retrainer.started(), 2);
        assert!(!retrainer.is_busy());
        assert!(app.prediction_line().starts_with("Next result prediction: "));
        assert!(app.model().is_some());
    }

    #[tokio::test]
    async fn test_idle_request_starts_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let (mut retrainer, mut rx) = setup(dir.path());
        assert_eq!(retrainer.request(vec![2.0, 4.0, 3.0]), Submission::Started);
        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.history_len, 3);
        assert!(!retrainer.finished());
        assert!(!retrainer.is_busy());
    }

    #[tokio::test]
    async fn test_failed_fit_keeps_previous_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let (mut retrainer, mut rx) = setup(dir.path());
        let mut app = App::new(&Config::default());
        app.set_prediction_line("Next result prediction: 1.50x.");

        retrainer.request(vec![1.0]);
        let results = drain(&mut retrainer, &mut rx, &mut app).await;
        assert!(matches!(results[0], Err(PredictError::Train(_))));
        assert_eq!(app.prediction_line(), "Next result prediction: 1.50x.");
    }
}

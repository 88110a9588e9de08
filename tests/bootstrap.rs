//! Startup sequence: fetch -> seed -> train once -> load saved model.

use async_trait::async_trait;

use multiplierlab::bootstrap::{bootstrap, ModelLoad};
use multiplierlab::feed::{FetchError, ResultSource, StaticSource};
use multiplierlab::model::ModelStore;
use multiplierlab::session::{App, MODEL_LOADED, MODEL_UNREADABLE, NO_MODEL};
use multiplierlab::state::{ApiStatus, Config};

struct Unreachable;

#[async_trait]
impl ResultSource for Unreachable {
    fn describe(&self) -> String {
        "unreachable".to_string()
    }

    async fn fetch_results(&self) -> Result<Vec<f64>, FetchError> {
        Err(FetchError::Other("dns error".to_string()))
    }
}

fn cfg() -> Config {
    Config { seed: Some(5), ..Config::default() }
}

#[tokio::test]
async fn test_fetch_failure_boots_empty_and_offline() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg();
    let slot = ModelStore::new(dir.path(), "model");
    let mut app = App::new(&cfg);

    let boot = bootstrap(&mut app, &Unreachable, &cfg.fit_config(), &slot, cfg.min_train_len).await;

    assert_eq!(boot.status, ApiStatus::Offline);
    assert_eq!(app.status, ApiStatus::Offline);
    assert_eq!(boot.seeded, 0);
    assert!(app.is_empty());
    assert!(boot.trained.is_none());
    assert_eq!(boot.model, ModelLoad::Missing);
    assert_eq!(app.prediction_line(), NO_MODEL);
}

#[tokio::test]
async fn test_enough_fetched_results_train_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg();
    let slot = ModelStore::new(dir.path(), "model");
    let mut app = App::new(&cfg);
    let mut fetched = vec![1.2, 2.4, 1.1, 5.0, 1.9, 3.3, 1.0, 14.0, 1.4, 2.2, 1.7];
    fetched.push(-4.0);
    fetched.push(0.0);

    let source = StaticSource::new(fetched);
    let boot = bootstrap(&mut app, &source, &cfg.fit_config(), &slot, cfg.min_train_len).await;

    assert_eq!(boot.status, ApiStatus::Online);
    assert_eq!(boot.seeded, 11);
    assert_eq!(boot.skipped, 2);
    assert_eq!(app.len(), 11);
    assert_eq!(app.chart().len(), 11);
    assert!(matches!(boot.trained, Some(Ok(v)) if v.is_finite()));
    assert_eq!(boot.model, ModelLoad::Loaded);
    assert_eq!(app.prediction_line(), MODEL_LOADED);
    assert_eq!(app.model().unwrap().scale, 14.0);
}

#[tokio::test]
async fn test_short_history_only_loads_existing_model() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg();
    let slot = ModelStore::new(dir.path(), "model");

    // First session trains and persists.
    let mut first = App::new(&cfg);
    let source = StaticSource::new(vec![2.0; 10]);
    bootstrap(&mut first, &source, &cfg.fit_config(), &slot, cfg.min_train_len).await;
    let saved = slot.load().unwrap().expect("persisted");

    // Second session has too little data to train and picks the blob up.
    let mut second = App::new(&cfg);
    let source = StaticSource::new(vec![3.0, 1.5]);
    let boot = bootstrap(&mut second, &source, &cfg.fit_config(), &slot, cfg.min_train_len).await;
    assert!(boot.trained.is_none());
    assert_eq!(boot.model, ModelLoad::Loaded);
    assert_eq!(second.model(), Some(&saved));
    assert!(second.model_forecast().unwrap().is_finite());
}

#[tokio::test]
async fn test_corrupt_slot_is_reported_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = cfg();
    let slot = ModelStore::new(dir.path(), "model");
    std::fs::write(slot.path(), "[1, 2").unwrap();
    let mut app = App::new(&cfg);

    let boot = bootstrap(&mut app, &Unreachable, &cfg.fit_config(), &slot, cfg.min_train_len).await;

    assert_eq!(boot.model, ModelLoad::Unreadable);
    assert_eq!(app.prediction_line(), MODEL_UNREADABLE);
    assert!(app.model().is_none());
}

use std::path::PathBuf;
use std::time::Duration;

use crate::model::unit::FitConfig;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_url: String,
    pub fetch_timeout_ms: u64,
    pub model_dir: PathBuf,
    pub model_key: String,
    pub analysis_window: usize,
    pub favorable_threshold: f64,
    /// History length at which retraining starts
    pub min_train_len: usize,
    pub epochs: u32,
    pub train_budget_ms: u64,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub seed: Option<u64>,
    pub dashboard_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "https://sentry.io/api/1313749/store/".to_string(),
            fetch_timeout_ms: 10_000,
            model_dir: PathBuf::from("./.multiplierlab"),
            model_key: "model".to_string(),
            analysis_window: 5,
            favorable_threshold: 2.0,
            min_train_len: 10,
            epochs: 100,
            train_budget_ms: 5_000,
            learning_rate: 0.01,
            batch_size: 32,
            seed: None,
            dashboard_path: PathBuf::from("out/dashboard.html"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            api_url: std::env::var("API_URL").unwrap_or(d.api_url),
            fetch_timeout_ms: std::env::var("FETCH_TIMEOUT_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.fetch_timeout_ms),
            model_dir: std::env::var("MODEL_DIR").map(PathBuf::from).unwrap_or(d.model_dir),
            model_key: std::env::var("MODEL_KEY").unwrap_or(d.model_key),
            analysis_window: std::env::var("ANALYSIS_WINDOW").ok().and_then(|v| v.parse().ok()).filter(|w: &usize| *w > 0).unwrap_or(d.analysis_window),
            favorable_threshold: std::env::var("FAVORABLE_TH").ok().and_then(|v| v.parse().ok()).unwrap_or(d.favorable_threshold),
            min_train_len: std::env::var("MIN_TRAIN_LEN").ok().and_then(|v| v.parse().ok()).map(|n: usize| n.max(2)).unwrap_or(d.min_train_len),
            epochs: std::env::var("EPOCHS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.epochs),
            train_budget_ms: std::env::var("TRAIN_BUDGET_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(d.train_budget_ms),
            learning_rate: std::env::var("LEARNING_RATE").ok().and_then(|v| v.parse().ok()).unwrap_or(d.learning_rate),
            batch_size: std::env::var("BATCH_SIZE").ok().and_then(|v| v.parse().ok()).filter(|b: &usize| *b > 0).unwrap_or(d.batch_size),
            seed: std::env::var("SEED").ok().and_then(|v| v.parse().ok()),
            dashboard_path: std::env::var("DASHBOARD_PATH").map(PathBuf::from).unwrap_or(d.dashboard_path),
        }
    }

    pub fn fit_config(&self) -> FitConfig {
        FitConfig {
            epochs: self.epochs,
            learning_rate: self.learning_rate,
            batch_size: self.batch_size,
            budget: Duration::from_millis(self.train_budget_ms),
            seed: self.seed,
        }
    }
}

/// Why a raw input was refused before reaching the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("not a number: {0:?}")]
    NotANumber(String),
    #[error("value is not finite: {0}")]
    NotFinite(f64),
    #[error("value must be greater than zero: {0}")]
    NotPositive(f64),
}

/// Parse and validate one user-entered result.
pub fn parse_result(raw: &str) -> Result<f64, InputError> {
    let trimmed = raw.trim();
    let value: f64 = trimmed
        .parse()
        .map_err(|_| InputError::NotANumber(trimmed.to_string()))?;
    validate_result(value)
}

pub fn validate_result(value: f64) -> Result<f64, InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite(value));
    }
    if value <= 0.0 {
        return Err(InputError::NotPositive(value));
    }
    Ok(value)
}

/// Append-only history of observed results. Every element is finite and > 0.
#[derive(Debug, Clone, Default)]
pub struct ResultStore {
    values: Vec<f64>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the 1-based position of the appended value.
    pub fn append(&mut self, value: f64) -> Result<usize, InputError> {
        let value = validate_result(value)?;
        self.values.push(value);
        Ok(self.values.len())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    Unknown,
    Online,
    Offline,
}

impl ApiStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ApiStatus::Unknown => "API status unknown",
            ApiStatus::Online => "API online",
            ApiStatus::Offline => "API offline",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiStatus::Unknown => "unknown",
            ApiStatus::Online => "online",
            ApiStatus::Offline => "offline",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_positive_decimals() {
        assert_eq!(parse_result("1.5"), Ok(1.5));
        assert_eq!(parse_result("  12 \n"), Ok(12.0));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(matches!(parse_result("abc"), Err(InputError::NotANumber(_))));
        assert!(matches!(parse_result(""), Err(InputError::NotANumber(_))));
        assert_eq!(parse_result("0"), Err(InputError::NotPositive(0.0)));
        assert_eq!(parse_result("-3"), Err(InputError::NotPositive(-3.0)));
        assert!(matches!(parse_result("inf"), Err(InputError::NotFinite(_))));
        assert!(matches!(parse_result("NaN"), Err(InputError::NotFinite(_))));
    }

    #[test]
    fn test_store_rejects_invalid_without_mutation() {
        let mut store = ResultStore::new();
        store.append(2.0).unwrap();
        assert!(store.append(0.0).is_err());
        assert!(store.append(f64::NAN).is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_positions_and_last() {
        let mut store = ResultStore::new();
        assert_eq!(store.last(), None);
        assert_eq!(store.append(1.2).unwrap(), 1);
        assert_eq!(store.append(7.5).unwrap(), 2);
        assert_eq!(store.append(3.0).unwrap(), 3);
        assert_eq!(store.values(), &[1.2, 7.5, 3.0]);
        assert_eq!(store.last(), Some(3.0));
    }

    #[test]
    fn test_default_config_matches_documented_knobs() {
        let cfg = Config::default();
        assert_eq!(cfg.analysis_window, 5);
        assert_eq!(cfg.min_train_len, 10);
        assert_eq!(cfg.epochs, 100);
        assert_eq!(cfg.fit_config().budget, Duration::from_secs(5));
    }
}

//! Session state: the result history and everything derived from it.

use crate::analysis::{analyze, Analysis};
use crate::logging::{log_analysis, log_forecast, log_rejected, log_result};
use crate::model::{Forecast, SavedModel};
use crate::present::{render_block, ChartSeries, Tile};
use crate::state::{parse_result, ApiStatus, Config, InputError, ResultStore};

pub const MODEL_LOADED: &str = "Model loaded. Enter results to predict.";
pub const NO_MODEL: &str = "No saved model. Enter results to train.";
pub const MODEL_UNREADABLE: &str = "Saved model could not be read. Enter results to train.";

#[derive(Debug, Clone)]
pub struct Appended {
    pub index: usize,
    pub tile: Tile,
    pub analysis: Analysis,
    /// Full history to retrain on, once the history is long enough.
    pub retrain: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
pub struct App {
    analysis_window: usize,
    favorable_threshold: f64,
    min_train_len: usize,
    store: ResultStore,
    chart: ChartSeries,
    tiles: Vec<Tile>,
    pub status: ApiStatus,
    analysis_line: String,
    prediction_line: String,
    model: Option<SavedModel>,
    retrain_requests: u64,
}

impl App {
    pub fn new(cfg: &Config) -> Self {
        Self {
            analysis_window: cfg.analysis_window,
            favorable_threshold: cfg.favorable_threshold,
            min_train_len: cfg.min_train_len,
            store: ResultStore::new(),
            chart: ChartSeries::new(),
            tiles: Vec::new(),
            status: ApiStatus::Unknown,
            analysis_line: Analysis::NeedMoreData { have: 0, need: cfg.analysis_window }.line(),
            prediction_line: String::new(),
            model: None,
            retrain_requests: 0,
        }
    }

    /// Append a value and update chart and tiles, without analysis.
    fn push(&mut self, value: f64, source: &str) -> Result<(usize, Tile), InputError> {
        let index = self.store.append(value)?;
        self.chart.append_point(index, value);
        let tile = render_block(value);
        self.tiles.push(tile.clone());
        log_result(index, value, tile.bucket.as_str(), source);
        Ok((index, tile))
    }

    /// Seed one bootstrap value: store and present only.
    pub fn seed(&mut self, value: f64) -> Result<Tile, InputError> {
        self.push(value, "fetch").map(|(_, tile)| tile)
    }

    /// Validate raw user input, then append, present, analyze, and decide
    /// whether a retrain is due.
    pub fn submit(&mut self, raw: &str) -> Result<Appended, InputError> {
        let value = parse_result(raw).map_err(|err| {
            log_rejected(raw, &err.to_string());
            err
        })?;
        let (index, tile) = self.push(value, "user")?;
        let analysis = self.refresh_analysis();
        let retrain = self.retrain_due();
        Ok(Appended { index, tile, analysis, retrain })
    }

    pub fn refresh_analysis(&mut self) -> Analysis {
        let analysis = analyze(self.store.values(), self.analysis_window, self.favorable_threshold);
        let recommendation = match &analysis {
            Analysis::Ready { recommendation, .. } => recommendation.as_str(),
            Analysis::NeedMoreData { .. } => "need_more_data",
        };
        log_analysis(self.store.len(), analysis.mean(), recommendation);
        self.analysis_line = analysis.line();
        analysis
    }

    /// History snapshot to retrain on, counted as one request.
    pub fn retrain_due(&mut self) -> Option<Vec<f64>> {
        if self.store.len() < self.min_train_len {
            return None;
        }
        self.retrain_requests += 1;
        Some(self.store.values().to_vec())
    }

    pub fn apply_forecast(&mut self, forecast: &Forecast) {
        log_forecast(forecast.history_len, forecast.value);
        self.prediction_line = forecast.line();
        self.model = Some(forecast.saved.clone());
    }

    pub fn set_loaded_model(&mut self, model: Option<SavedModel>) {
        self.prediction_line = if model.is_some() { MODEL_LOADED } else { NO_MODEL }.to_string();
        self.model = model;
    }

    pub fn set_prediction_line(&mut self, line: &str) {
        self.prediction_line = line.to_string();
    }

    pub fn values(&self) -> &[f64] {
        self.store.values()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn chart(&self) -> &ChartSeries {
        &self.chart
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn analysis_line(&self) -> &str {
        &self.analysis_line
    }

    pub fn prediction_line(&self) -> &str {
        &self.prediction_line
    }

    pub fn model(&self) -> Option<&SavedModel> {
        self.model.as_ref()
    }

    pub fn retrain_requests(&self) -> u64 {
        self.retrain_requests
    }

    /// Forecast from the current model for the latest result, if both exist.
    pub fn model_forecast(&self) -> Option<f64> {
        Some(self.model.as_ref()?.forecast(self.store.last()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::NEED_MORE_DATA;
    use crate::present::Bucket;

    fn app() -> App {
        App::new(&Config::default())
    }

    #[test]
    fn test_valid_appends_grow_store_and_chart() {
        let mut app = app();
        for (i, raw) in ["1.5", "2", "30", "0.5"].iter().enumerate() {
            let out = app.submit(raw).unwrap();
            assert_eq!(out.index, i + 1);
        }
        assert_eq!(app.len(), 4);
        assert_eq!(app.chart().len(), 4);
        assert_eq!(app.tiles().len(), 4);
        assert_eq!(app.chart().labels(), &[1, 2, 3, 4]);
        assert_eq!(app.tiles()[2].bucket, Bucket::High);
    }

    #[test]
    fn test_invalid_input_changes_nothing() {
        let mut app = app();
        app.submit("3").unwrap();
        for raw in ["abc", "", "0", "-1", "inf", "NaN"] {
            assert!(app.submit(raw).is_err(), "{raw:?} accepted");
        }
        assert_eq!(app.len(), 1);
        assert_eq!(app.chart().len(), 1);
        assert_eq!(app.tiles().len(), 1);
        assert_eq!(app.retrain_requests(), 0);
    }

    #[test]
    fn test_analysis_line_follows_appends() {
        let mut app = app();
        for raw in ["1", "3", "5", "2"] {
            app.submit(raw).unwrap();
            assert_eq!(app.analysis_line(), NEED_MORE_DATA);
        }
        let out = app.submit("8").unwrap();
        assert!((out.analysis.mean().unwrap() - 3.8).abs() < 1e-12);
        assert_eq!(app.analysis_line(), "Average of the last 5 results: 3.80x. It is a good moment to bet.");
    }

    #[test]
    fn test_retrain_requested_once_per_append_from_ten() {
        let mut app = app();
        for i in 1..=15 {
            let out = app.submit("1.7").unwrap();
            if i < 10 {
                assert!(out.retrain.is_none(), "retrain at {i}");
            } else {
                assert_eq!(out.retrain.unwrap().len(), i);
            }
        }
        assert_eq!(app.retrain_requests(), 6);
    }

    #[test]
    fn test_seed_skips_analysis() {
        let mut app = app();
        for v in [3.0, 3.0, 3.0, 3.0, 3.0] {
            app.seed(v).unwrap();
        }
        assert_eq!(app.len(), 5);
        assert_eq!(app.analysis_line(), NEED_MORE_DATA);
        assert!(app.seed(-1.0).is_err());
    }

    #[test]
    fn test_need_more_data_uses_configured_window() {
        let cfg = Config { analysis_window: 3, ..Config::default() };
        let mut app = App::new(&cfg);
        let initial = app.analysis_line().to_string();
        assert_eq!(initial, "Enter at least 3 results to see the analysis.");
        app.submit("1.5").unwrap();
        assert_eq!(app.analysis_line(), initial);
        app.submit("2.5").unwrap();
        app.submit("3.5").unwrap();
        assert!(app.analysis_line().starts_with("Average of the last 3 results: 2.50x."));
    }

    #[test]
    fn test_loaded_model_message() {
        let mut app = app();
        app.set_loaded_model(None);
        assert_eq!(app.prediction_line(), NO_MODEL);
        assert_eq!(app.model_forecast(), None);
    }
}

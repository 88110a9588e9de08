use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::feed::{FetchError, ResultSource};
use crate::logging::{log, obj, v_str, Domain, Level};
use crate::state::Config;

/// Expected body: `{"results": [numbers...]}`. Other shapes yield nothing.
#[derive(Deserialize, Debug, Default)]
struct ResultsEnvelope {
    #[serde(default)]
    results: Option<Value>,
}

impl ResultsEnvelope {
    fn numbers(self) -> Vec<f64> {
        match self.results {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_f64).collect(),
            _ => Vec::new(),
        }
    }
}

/// Extract the numeric `results` from an already-decoded body.
pub fn extract_results(body: Value) -> Vec<f64> {
    serde_json::from_value::<ResultsEnvelope>(body)
        .map(ResultsEnvelope::numbers)
        .unwrap_or_default()
}

pub struct HttpResultSource {
    /// Build failure is kept and reported on every fetch.
    client: Result<Client, String>,
    endpoint: String,
}

impl HttpResultSource {
    pub fn new(cfg: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_millis(cfg.fetch_timeout_ms))
            .build()
            .map_err(|err| {
                log(
                    Level::Error,
                    Domain::Fetch,
                    "client_build_failed",
                    obj(&[("url", v_str(&cfg.api_url)), ("msg", v_str(&err.to_string()))]),
                );
                err.to_string()
            });
        Self { client, endpoint: cfg.api_url.clone() }
    }

    fn url(&self) -> Result<Url, FetchError> {
        Url::parse(&self.endpoint).map_err(|source| FetchError::BadUrl {
            url: self.endpoint.clone(),
            source,
        })
    }
}

#[async_trait]
impl ResultSource for HttpResultSource {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    async fn fetch_results(&self) -> Result<Vec<f64>, FetchError> {
        let client = self.client.as_ref().map_err(|msg| FetchError::Client(msg.clone()))?;
        let url = self.url()?;
        // Status codes are not inspected: any JSON body counts as online.
        let resp = client.get(url).send().await.map_err(FetchError::Transport)?;
        let body: Value = resp.json().await.map_err(FetchError::Decode)?;
        Ok(extract_results(body))
    }
}

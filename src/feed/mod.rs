//! Initial result feed. Any failure degrades to an empty list and an
//! offline status; nothing propagates past [`fetch_initial`].

use async_trait::async_trait;

use crate::logging::log_fetch;
use crate::state::ApiStatus;

pub mod remote;

pub use remote::HttpResultSource;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid endpoint url {url:?}: {source}")]
    BadUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("http client unavailable: {0}")]
    Client(String),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("response is not JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

#[async_trait]
pub trait ResultSource {
    /// Human-readable origin, used in logs.
    fn describe(&self) -> String;

    /// Numbers found in the response. `Ok(vec![])` when the body has the
    /// wrong shape.
    async fn fetch_results(&self) -> Result<Vec<f64>, FetchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOutcome {
    pub status: ApiStatus,
    pub results: Vec<f64>,
}

pub async fn fetch_initial<S: ResultSource + ?Sized>(source: &S) -> FetchOutcome {
    match source.fetch_results().await {
        Ok(results) => {
            log_fetch(&source.describe(), ApiStatus::Online.as_str(), results.len(), None);
            FetchOutcome { status: ApiStatus::Online, results }
        }
        Err(err) => {
            log_fetch(&source.describe(), ApiStatus::Offline.as_str(), 0, Some(&err.to_string()));
            FetchOutcome { status: ApiStatus::Offline, results: Vec::new() }
        }
    }
}

/// Fixed in-memory source, for scripted sessions and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    results: Vec<f64>,
}

impl StaticSource {
    pub fn new(results: Vec<f64>) -> Self {
        Self { results }
    }
}

#[async_trait]
impl ResultSource for StaticSource {
    fn describe(&self) -> String {
        "static".to_string()
    }

    async fn fetch_results(&self) -> Result<Vec<f64>, FetchError> {
        Ok(self.results.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl ResultSource for Failing {
        fn describe(&self) -> String {
            "failing".to_string()
        }

        async fn fetch_results(&self) -> Result<Vec<f64>, FetchError> {
            Err(FetchError::Other("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failure_degrades_to_offline_empty() {
        let out = fetch_initial(&Failing).await;
        assert_eq!(out.status, ApiStatus::Offline);
        assert!(out.results.is_empty());
    }

    #[tokio::test]
    async fn test_success_is_online() {
        let out = fetch_initial(&StaticSource::new(vec![1.5, 2.5])).await;
        assert_eq!(out.status, ApiStatus::Online);
        assert_eq!(out.results, vec![1.5, 2.5]);
    }
}

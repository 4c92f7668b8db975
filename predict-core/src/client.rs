use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

use crate::{
    error::PredictionServiceError,
    model::{PredictionQuery, PredictionRequest, WeatherPrediction},
};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5011/predict";

/// Anything that can turn a query into a prediction.
#[async_trait]
pub trait PredictionService: Send + Sync + Debug {
    async fn fetch_prediction(
        &self,
        query: &PredictionQuery,
    ) -> Result<WeatherPrediction, PredictionServiceError>;
}

/// JSON-over-HTTP client for the prediction endpoint. No retries, no timeout.
#[derive(Debug, Clone)]
pub struct HttpPredictionClient {
    endpoint: String,
    http: Client,
}

impl HttpPredictionClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), http: Client::new() }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Default for HttpPredictionClient {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[async_trait]
impl PredictionService for HttpPredictionClient {
    #[tracing::instrument(level = "debug", skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_prediction(
        &self,
        query: &PredictionQuery,
    ) -> Result<WeatherPrediction, PredictionServiceError> {
        let res = self
            .http
            .post(&self.endpoint)
            .json(&PredictionRequest::from(query))
            .send()
            .await
            .map_err(|e| PredictionServiceError::Transport { cause: describe(e) })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| PredictionServiceError::Transport { cause: describe(e) })?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "prediction request rejected");
            return Err(PredictionServiceError::Status { status: status.as_u16(), body });
        }

        serde_json::from_str(&body)
            .map_err(|e| PredictionServiceError::InvalidResponse { cause: e.to_string() })
    }
}

/// reqwest's top-level message omits the underlying cause.
fn describe(err: reqwest::Error) -> String {
    format!("{:#}", anyhow::Error::from(err))
}

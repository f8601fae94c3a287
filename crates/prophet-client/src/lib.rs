//! HTTP client for the Prophet forecast sidecar service.
//!
//! The service exposes the model's fit/predict lifecycle over four
//! endpoints: `POST /fit`, `POST /predict`, `GET /components/{id}` and
//! `GET /health`. Fitting returns an opaque model id that the predict and
//! components calls consume.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use forecast_core::{ForecastError, ForecastModel, ForecastPoint, ModelHandle, TrainingPoint};
use serde::{Deserialize, Serialize};

/// Configuration for the Prophet service connection.
#[derive(Debug, Clone)]
pub struct ProphetConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ProphetConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("PROPHET_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8005".to_string()),
            // Fitting several years of daily data takes a while.
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct FitRow {
    ds: NaiveDate,
    y: f64,
}

#[derive(Debug, Clone, Serialize)]
struct FitRequest {
    rows: Vec<FitRow>,
}

#[derive(Debug, Deserialize)]
struct FitResponse {
    model_id: String,
}

#[derive(Debug, Clone, Serialize)]
struct PredictRequest {
    model_id: String,
    horizon_days: u32,
}

#[derive(Debug, Deserialize)]
struct PredictRow {
    ds: NaiveDate,
    yhat: f64,
    yhat_lower: f64,
    yhat_upper: f64,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    rows: Vec<PredictRow>,
}

#[derive(Clone)]
pub struct ProphetClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProphetClient {
    pub fn new(config: ProphetConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            base_url: config.base_url,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ProphetConfig::default())
    }

    /// Check service health.
    pub async fn health(&self) -> Result<bool, ForecastError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(map_reqwest)?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ForecastModel for ProphetClient {
    async fn fit(&self, training: &[TrainingPoint]) -> Result<ModelHandle, ForecastError> {
        let request = FitRequest {
            rows: training
                .iter()
                .map(|p| FitRow { ds: p.date, y: p.value })
                .collect(),
        };

        tracing::info!("fitting model over {} training rows", request.rows.len());

        let response = self
            .client
            .post(format!("{}/fit", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::SERVICE_UNAVAILABLE {
                return Err(ForecastError::ServiceUnavailable(body));
            }
            // Degenerate/singular series make Prophet raise during fit.
            return Err(ForecastError::FitFailed(format!("HTTP {}: {}", status, body)));
        }

        let fit: FitResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::InvalidResponse(e.to_string()))?;

        Ok(ModelHandle { id: fit.model_id })
    }

    async fn predict(
        &self,
        handle: &ModelHandle,
        horizon_days: u32,
    ) -> Result<Vec<ForecastPoint>, ForecastError> {
        let request = PredictRequest {
            model_id: handle.id.clone(),
            horizon_days,
        };

        let response = self
            .client
            .post(format!("{}/predict", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(map_reqwest)?;

        if !response.status().is_success() {
            return Err(ForecastError::ServiceUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let predict: PredictResponse = response
            .json()
            .await
            .map_err(|e| ForecastError::InvalidResponse(e.to_string()))?;

        // The service emits rows in date order; re-assert rather than trust,
        // and run every row through the band-ordering constructor.
        let mut points: Vec<ForecastPoint> = predict
            .rows
            .into_iter()
            .map(|r| ForecastPoint::new(r.ds, r.yhat, r.yhat_lower, r.yhat_upper))
            .collect();
        points.sort_by_key(|p| p.date);

        Ok(points)
    }

    async fn components(&self, handle: &ModelHandle) -> Result<serde_json::Value, ForecastError> {
        let response = self
            .client
            .get(format!("{}/components/{}", self.base_url, handle.id))
            .send()
            .await
            .map_err(map_reqwest)?;

        if !response.status().is_success() {
            return Err(ForecastError::ServiceUnavailable(format!(
                "HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ForecastError::InvalidResponse(e.to_string()))
    }
}

fn map_reqwest(e: reqwest::Error) -> ForecastError {
    if e.is_timeout() {
        ForecastError::Timeout(e.to_string())
    } else {
        ForecastError::RequestFailed(e.to_string())
    }
}

use async_trait::async_trait;

use crate::error::{ForecastError, ProviderError};
use crate::types::{CompanyInfo, ForecastPoint, ModelHandle, PriceSeries, ProviderKind, TrainingPoint};

/// A market data source that can produce a normalized daily series.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Fetch and normalize the full daily history for a ticker.
    async fn fetch_daily(&self, ticker: &str) -> Result<PriceSeries, ProviderError>;

    /// Company metadata, when the provider has any. Optional: a provider
    /// without a metadata endpoint returns `Ok(None)`.
    async fn company_info(&self, _ticker: &str) -> Result<Option<CompanyInfo>, ProviderError> {
        Ok(None)
    }
}

/// The external additive forecasting model, used as an opaque
/// fit/predict oracle.
#[async_trait]
pub trait ForecastModel: Send + Sync {
    /// Fit once over the cleaned training series.
    async fn fit(&self, training: &[TrainingPoint]) -> Result<ModelHandle, ForecastError>;

    /// Predict over the training span plus `horizon_days` further.
    /// Points come back in ascending date order.
    async fn predict(
        &self,
        handle: &ModelHandle,
        horizon_days: u32,
    ) -> Result<Vec<ForecastPoint>, ForecastError>;

    /// The model's native trend/seasonality decomposition, passed through
    /// opaquely for the presentation layer.
    async fn components(&self, handle: &ModelHandle) -> Result<serde_json::Value, ForecastError>;
}

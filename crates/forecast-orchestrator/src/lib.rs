//! End-to-end pipeline driver: ticker symbol in, chart-ready forecast out.
//!
//! One `run` call walks the whole chain: cache-mediated provider fetch,
//! validation, series cleaning, model fit/predict, chart projection.
//! Every failure along the way comes back as a structured
//! [`PipelineError`] carrying a single user-facing message.

use std::sync::Arc;
use std::time::Duration;

use forecast_core::{
    prepare, validate, CompanyInfo, ForecastModel, ForecastResult, MarketDataProvider,
    PipelineError, PriceRecord,
};
use series_cache::SeriesCache;

pub mod chart;
pub use chart::{build_overlay, open_close_series, BandedPoint, ChartOverlay, ChartPoint, OpenClosePoint};

pub const MIN_HORIZON_YEARS: u32 = 1;
pub const MAX_HORIZON_YEARS: u32 = 5;

/// Horizon is whole years of calendar days. No leap-year or trading-day
/// adjustment: a deliberate approximation carried over from the original
/// behavior, not an oversight.
pub const DAYS_PER_YEAR: u32 = 365;

/// Rows shown in the raw-data and forecast tables.
const TAIL_ROWS: usize = 10;

/// Everything the presentation layer consumes for one request.
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    pub ticker: String,
    pub company: Option<CompanyInfo>,
    /// Most recent raw records, for the tabular view.
    pub raw_tail: Vec<PriceRecord>,
    pub open_close: Vec<OpenClosePoint>,
    pub result: ForecastResult,
    /// Tail of the forecast sequence, for the tabular view.
    pub forecast_tail: Vec<forecast_core::ForecastPoint>,
    pub overlay: ChartOverlay,
    /// The model's native trend/seasonality decomposition, opaque.
    pub components: Option<serde_json::Value>,
}

pub struct ForecastOrchestrator {
    provider: Arc<dyn MarketDataProvider>,
    model: Arc<dyn ForecastModel>,
    cache: SeriesCache,
}

impl ForecastOrchestrator {
    pub fn new(provider: Arc<dyn MarketDataProvider>, model: Arc<dyn ForecastModel>) -> Self {
        Self {
            provider,
            model,
            cache: SeriesCache::default(),
        }
    }

    /// Default production wiring: Yahoo Finance data, Prophet sidecar.
    pub fn yahoo_prophet() -> Self {
        Self::new(
            Arc::new(market_data::YahooFinanceClient::new()),
            Arc::new(prophet_client::ProphetClient::with_defaults()),
        )
    }

    /// Keyed-provider wiring. `api_key: None` uses the documented demo key.
    pub fn alpha_vantage_prophet(api_key: Option<String>) -> Self {
        Self::new(
            Arc::new(market_data::AlphaVantageClient::new(api_key)),
            Arc::new(prophet_client::ProphetClient::with_defaults()),
        )
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache = SeriesCache::new(ttl);
        self
    }

    /// Run the full pipeline for one ticker and horizon.
    pub async fn run(
        &self,
        ticker: &str,
        horizon_years: u32,
    ) -> Result<ForecastOutput, PipelineError> {
        let ticker = ticker.trim().to_uppercase();

        if !(MIN_HORIZON_YEARS..=MAX_HORIZON_YEARS).contains(&horizon_years) {
            return Err(PipelineError::InvalidHorizon(horizon_years));
        }
        let horizon_days = horizon_years * DAYS_PER_YEAR;

        tracing::info!(
            "forecast request for {} ({} year horizon)",
            ticker,
            horizon_years
        );

        let series = self
            .cache
            .get_or_fetch(self.provider.kind(), &ticker, || {
                self.provider.fetch_daily(&ticker)
            })
            .await;

        validate(&series)?;
        let training = prepare(&series)?;

        let handle = self.model.fit(&training).await?;
        let forecast = self.model.predict(&handle, horizon_days).await?;

        // Decomposition is nice-to-have; its failure must not sink a
        // forecast that already succeeded.
        let components = match self.model.components(&handle).await {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("components fetch failed for {}: {}", ticker, e);
                None
            }
        };

        let company = match self.provider.company_info(&ticker).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!("company info fetch failed for {}: {}", ticker, e);
                None
            }
        };

        let result = ForecastResult {
            training,
            forecast,
            horizon_days,
        };

        let overlay = build_overlay(&result);
        let output = ForecastOutput {
            company,
            raw_tail: series.tail(TAIL_ROWS).to_vec(),
            open_close: open_close_series(&series),
            forecast_tail: result.forecast_tail(TAIL_ROWS).to_vec(),
            overlay,
            components,
            result,
            ticker,
        };

        tracing::info!(
            "forecast for {} complete: {} training rows, {} forecast rows",
            output.ticker,
            output.result.training.len(),
            output.result.forecast.len()
        );

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Days, NaiveDate};
    use forecast_core::{
        ForecastError, ForecastPoint, ModelHandle, NormalizationError, PriceSeries, ProviderError,
        ProviderKind, TrainingPoint, ValidationError,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    /// `count` consecutive daily records starting at `start`, close prices
    /// drifting upward. `null_closes` marks trailing rows whose close is null.
    fn create_test_series(start: &str, count: usize, null_closes: usize) -> PriceSeries {
        let start = d(start);
        let records = (0..count)
            .map(|i| {
                let date = start.checked_add_days(Days::new(i as u64)).unwrap();
                let close = if i >= count - null_closes {
                    None
                } else {
                    Some(100.0 + i as f64 * 0.1)
                };
                PriceRecord {
                    date,
                    open: close.map(|c| c - 0.5),
                    high: close.map(|c| c + 1.0),
                    low: close.map(|c| c - 1.0),
                    close,
                    volume: Some(1_000_000),
                }
            })
            .collect();

        PriceSeries {
            ticker: "AAPL".to_string(),
            provider: ProviderKind::YahooFinance,
            records,
        }
    }

    struct StubProvider {
        response: Mutex<Option<Result<PriceSeries, ProviderError>>>,
        fetches: AtomicUsize,
    }

    impl StubProvider {
        fn returning(result: Result<PriceSeries, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                response: Mutex::new(Some(result)),
                fetches: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl MarketDataProvider for StubProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::YahooFinance
        }

        async fn fetch_daily(&self, _ticker: &str) -> Result<PriceSeries, ProviderError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.response
                .lock()
                .unwrap()
                .take()
                .expect("stub provider fetched more than once")
        }
    }

    /// Echoes the training range back and extends it by the horizon,
    /// with a fixed ±2.0 band.
    struct StubModel {
        fits: AtomicUsize,
        training: Mutex<Vec<TrainingPoint>>,
    }

    impl StubModel {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fits: AtomicUsize::new(0),
                training: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ForecastModel for StubModel {
        async fn fit(&self, training: &[TrainingPoint]) -> Result<ModelHandle, ForecastError> {
            self.fits.fetch_add(1, Ordering::SeqCst);
            *self.training.lock().unwrap() = training.to_vec();
            Ok(ModelHandle { id: "stub-1".to_string() })
        }

        async fn predict(
            &self,
            _handle: &ModelHandle,
            horizon_days: u32,
        ) -> Result<Vec<ForecastPoint>, ForecastError> {
            let training = self.training.lock().unwrap().clone();
            let mut points: Vec<ForecastPoint> = training
                .iter()
                .map(|p| ForecastPoint::new(p.date, p.value, p.value - 2.0, p.value + 2.0))
                .collect();

            let last = training.last().expect("predict before fit");
            for offset in 1..=horizon_days {
                let date = last.date.checked_add_days(Days::new(offset as u64)).unwrap();
                points.push(ForecastPoint::new(date, last.value, last.value - 2.0, last.value + 2.0));
            }
            Ok(points)
        }

        async fn components(&self, _handle: &ModelHandle) -> Result<serde_json::Value, ForecastError> {
            Ok(serde_json::json!({ "trend": [], "weekly": [], "yearly": [] }))
        }
    }

    #[tokio::test]
    async fn full_run_produces_horizon_aligned_forecast() {
        // Scenario: 500 daily records, 1-year horizon.
        let series = create_test_series("2015-01-01", 500, 0);
        let last_observed = series.records.last().unwrap().date;
        let provider = StubProvider::returning(Ok(series));
        let model = StubModel::new();
        let orchestrator = ForecastOrchestrator::new(provider.clone(), model.clone());

        let output = orchestrator.run("aapl", 1).await.unwrap();

        assert_eq!(output.ticker, "AAPL");
        assert_eq!(output.result.training.len(), 500);
        assert_eq!(output.result.horizon_days, 365);

        let last_forecast = output.result.forecast.last().unwrap().date;
        assert_eq!(
            last_forecast,
            last_observed.checked_add_days(Days::new(365)).unwrap()
        );

        // In-sample range retained, future range sliceable.
        assert_eq!(output.result.future_only().len(), 365);
        assert_eq!(output.raw_tail.len(), 10);
        assert_eq!(output.forecast_tail.len(), 10);
        assert!(output.components.is_some());
        assert_eq!(model.fits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn every_forecast_point_keeps_band_ordered() {
        let provider = StubProvider::returning(Ok(create_test_series("2023-01-01", 50, 0)));
        let model = StubModel::new();
        let orchestrator = ForecastOrchestrator::new(provider, model);

        let output = orchestrator.run("AAPL", 2).await.unwrap();
        for p in &output.result.forecast {
            assert!(p.lower <= p.predicted && p.predicted <= p.upper);
        }
    }

    #[tokio::test]
    async fn provider_payload_missing_container_yields_no_data_and_skips_model() {
        // Scenario: provider payload missing its top-level container. The
        // fetch fails, the cache stores an empty series, the validator
        // rejects it before the model is ever touched.
        let provider = StubProvider::returning(Err(ProviderError::Normalization(
            NormalizationError::MissingContainer {
                provider: "Yahoo Finance",
                container: "chart.result",
            },
        )));
        let model = StubModel::new();
        let orchestrator = ForecastOrchestrator::new(provider, model.clone());

        let err = orchestrator.run("AAPL", 1).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::NoData { .. })
        ));
        assert!(err.user_message().contains("No data returned"));
        assert_eq!(model.fits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn sparse_closes_rejected_before_fitting() {
        // Scenario: 11 rows, only 1 with a close price.
        let provider = StubProvider::returning(Ok(create_test_series("2024-01-01", 11, 10)));
        let model = StubModel::new();
        let orchestrator = ForecastOrchestrator::new(provider, model.clone());

        let err = orchestrator.run("AAPL", 1).await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::TooFewCloses { found: 1 })
        ));
        assert!(err.user_message().contains("closing price rows"));
        assert_eq!(model.fits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_fit_failure_surfaces_as_forecast_error_without_retry() {
        struct FailingModel {
            fits: AtomicUsize,
        }

        #[async_trait]
        impl ForecastModel for FailingModel {
            async fn fit(&self, _training: &[TrainingPoint]) -> Result<ModelHandle, ForecastError> {
                self.fits.fetch_add(1, Ordering::SeqCst);
                Err(ForecastError::FitFailed("singular data".to_string()))
            }

            async fn predict(
                &self,
                _handle: &ModelHandle,
                _horizon_days: u32,
            ) -> Result<Vec<ForecastPoint>, ForecastError> {
                unreachable!("predict after failed fit")
            }

            async fn components(
                &self,
                _handle: &ModelHandle,
            ) -> Result<serde_json::Value, ForecastError> {
                unreachable!("components after failed fit")
            }
        }

        let provider = StubProvider::returning(Ok(create_test_series("2023-01-01", 50, 0)));
        let model = Arc::new(FailingModel { fits: AtomicUsize::new(0) });
        let orchestrator = ForecastOrchestrator::new(provider, model.clone());

        let err = orchestrator.run("AAPL", 1).await.unwrap_err();
        assert!(matches!(err, PipelineError::Forecast(_)));
        assert!(err.user_message().contains("Forecasting failed"));
        assert_eq!(model.fits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn second_run_within_ttl_reuses_cached_series() {
        let provider = StubProvider::returning(Ok(create_test_series("2023-01-01", 50, 0)));
        let model = StubModel::new();
        let orchestrator = ForecastOrchestrator::new(provider.clone(), model);

        // Stub panics if fetched twice; ticker spelling differences must
        // still land on the same cache key.
        orchestrator.run("AAPL", 1).await.unwrap();
        orchestrator.run(" aapl ", 1).await.unwrap();
        assert_eq!(provider.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn out_of_range_horizon_is_rejected() {
        let provider = StubProvider::returning(Ok(create_test_series("2023-01-01", 50, 0)));
        let orchestrator = ForecastOrchestrator::new(provider, StubModel::new());

        let err = orchestrator.run("AAPL", 0).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidHorizon(0)));
        let err = orchestrator.run("AAPL", 6).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidHorizon(6)));
    }
}

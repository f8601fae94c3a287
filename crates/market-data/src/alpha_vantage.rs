use std::time::Duration;

use async_trait::async_trait;
use forecast_core::{
    CompanyInfo, MarketDataProvider, PriceSeries, ProviderError, ProviderKind,
};
use serde_json::Value;

use crate::normalize::normalize;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage hands out `demo` as a functioning key for sample tickers.
/// Used when no key is configured; a real key lifts the rate limits.
pub const DEMO_API_KEY: &str = "demo";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    client: reqwest::Client,
}

impl AlphaVantageClient {
    /// `api_key: None` falls back to [`DEMO_API_KEY`].
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key: api_key.unwrap_or_else(|| DEMO_API_KEY.to_string()),
            client,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var("ALPHA_VANTAGE_API_KEY").ok())
    }

    async fn get_json(&self, url: &str) -> Result<Value, ProviderError> {
        let response = self.client.get(url).send().await.map_err(map_reqwest)?;
        let json: Value = response.json().await.map_err(map_reqwest)?;

        // Alpha Vantage reports failures inside a 200 body.
        if let Some(error) = json.get("Error Message") {
            return Err(ProviderError::Rejected(error.to_string()));
        }
        if let Some(note) = json.get("Note") {
            return Err(ProviderError::RateLimited(note.to_string()));
        }

        Ok(json)
    }

    /// Fetch the raw full-size daily payload for a ticker.
    pub async fn fetch_daily_raw(&self, ticker: &str) -> Result<Value, ProviderError> {
        let url = format!(
            "{}?function=TIME_SERIES_DAILY&symbol={}&outputsize=full&apikey={}",
            BASE_URL, ticker, self.api_key
        );
        self.get_json(&url).await
    }

    /// Company fundamentals overview, mapped to the shared metadata shape.
    pub async fn fetch_company_overview(&self, ticker: &str) -> Result<CompanyInfo, ProviderError> {
        let url = format!(
            "{}?function=OVERVIEW&symbol={}&apikey={}",
            BASE_URL, ticker, self.api_key
        );
        let json = self.get_json(&url).await?;

        Ok(CompanyInfo {
            name: string_field(&json, "Name"),
            sector: string_field(&json, "Sector"),
            industry: string_field(&json, "Industry"),
            market_cap: json
                .get("MarketCapitalization")
                .and_then(|v| v.as_str())
                .and_then(|s| s.parse::<f64>().ok()),
            description: string_field(&json, "Description"),
        })
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::AlphaVantage
    }

    async fn fetch_daily(&self, ticker: &str) -> Result<PriceSeries, ProviderError> {
        tracing::info!("fetching daily series for {} from Alpha Vantage", ticker);
        let raw = self.fetch_daily_raw(ticker).await?;
        let series = normalize(&raw, ProviderKind::AlphaVantage, ticker)?;
        tracing::info!("normalized {} records for {}", series.len(), ticker);
        Ok(series)
    }

    async fn company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, ProviderError> {
        Ok(Some(self.fetch_company_overview(ticker).await?))
    }
}

fn string_field(json: &Value, name: &str) -> Option<String> {
    json.get(name)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty() && *s != "None")
        .map(str::to_string)
}

pub(crate) fn map_reqwest(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::RequestFailed(e.to_string())
    }
}

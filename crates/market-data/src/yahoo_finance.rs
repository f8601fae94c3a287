use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use forecast_core::{
    CompanyInfo, MarketDataProvider, PriceSeries, ProviderError, ProviderKind,
};
use serde_json::Value;

use crate::alpha_vantage::map_reqwest;
use crate::normalize::normalize;

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart";
const QUOTE_URL: &str = "https://query2.finance.yahoo.com/v8/finance/quote";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// 2015-01-01 UTC, the start of the span the app has always charted.
const HISTORY_START_EPOCH: i64 = 1_420_070_400;

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: reqwest::Client,
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        // Yahoo rejects requests without a browser-looking user agent.
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { client }
    }

    /// Raw chart payload with daily bars from 2015-01-01 through today.
    pub async fn fetch_daily_raw(&self, ticker: &str) -> Result<Value, ProviderError> {
        let period1 = HISTORY_START_EPOCH;
        let period2 = Utc::now().timestamp();

        let url = format!(
            "{}/{}?period1={}&period2={}&interval=1d",
            CHART_URL, ticker, period1, period2
        );

        let response = self.client.get(&url).send().await.map_err(map_reqwest)?;
        let json: Value = response.json().await.map_err(map_reqwest)?;

        if let Some(error) = json
            .get("chart")
            .and_then(|v| v.get("error"))
            .filter(|v| !v.is_null())
        {
            return Err(ProviderError::Rejected(error.to_string()));
        }

        Ok(json)
    }

    /// Company metadata from the quote endpoint. Yahoo's quote payload
    /// carries name and market cap but not sector/industry, so those
    /// stay empty here.
    pub async fn fetch_quote_info(&self, ticker: &str) -> Result<CompanyInfo, ProviderError> {
        let url = format!("{}?symbols={}", QUOTE_URL, ticker);

        let response = self.client.get(&url).send().await.map_err(map_reqwest)?;
        let json: Value = response.json().await.map_err(map_reqwest)?;

        let result = json
            .get("quoteResponse")
            .and_then(|v| v.get("result"))
            .and_then(|v| v.as_array())
            .and_then(|arr| arr.first());

        let Some(quote) = result else {
            return Ok(CompanyInfo::default());
        };

        Ok(CompanyInfo {
            name: quote
                .get("shortName")
                .or_else(|| quote.get("longName"))
                .and_then(|v| v.as_str())
                .map(str::to_string),
            sector: None,
            industry: None,
            market_cap: quote.get("marketCap").and_then(|v| v.as_f64()),
            description: None,
        })
    }
}

impl Default for YahooFinanceClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::YahooFinance
    }

    async fn fetch_daily(&self, ticker: &str) -> Result<PriceSeries, ProviderError> {
        tracing::info!("fetching daily series for {} from Yahoo Finance", ticker);
        let raw = self.fetch_daily_raw(ticker).await?;
        let series = normalize(&raw, ProviderKind::YahooFinance, ticker)?;
        tracing::info!("normalized {} records for {}", series.len(), ticker);
        Ok(series)
    }

    async fn company_info(&self, ticker: &str) -> Result<Option<CompanyInfo>, ProviderError> {
        Ok(Some(self.fetch_quote_info(ticker).await?))
    }
}

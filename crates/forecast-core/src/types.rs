use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which market data provider produced a series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    AlphaVantage,
    YahooFinance,
}

impl ProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::AlphaVantage => "Alpha Vantage",
            ProviderKind::YahooFinance => "Yahoo Finance",
        }
    }
}

/// One normalized daily OHLCV record.
///
/// Fields other than the date are optional because providers emit null
/// slots mid-series (Yahoo in particular); downstream cleaning decides
/// what to do with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
}

/// Normalized daily series for one ticker. Records are sorted strictly
/// ascending by date with no duplicates once produced by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub provider: ProviderKind,
    pub records: Vec<PriceRecord>,
}

impl PriceSeries {
    pub fn empty(ticker: &str, provider: ProviderKind) -> Self {
        Self {
            ticker: ticker.to_string(),
            provider,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Most recent `n` records, oldest first.
    pub fn tail(&self, n: usize) -> &[PriceRecord] {
        let start = self.records.len().saturating_sub(n);
        &self.records[start..]
    }

    /// Count of records carrying a finite close price.
    pub fn usable_close_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.close.is_some_and(f64::is_finite))
            .count()
    }
}

/// One (date, close) observation fed to the forecasting model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One predicted value with its uncertainty band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ForecastPoint {
    /// Orders the band so `lower <= predicted <= upper` always holds,
    /// whatever the model service sent back.
    pub fn new(date: NaiveDate, predicted: f64, lower: f64, upper: f64) -> Self {
        let lo = lower.min(predicted).min(upper);
        let hi = upper.max(predicted).max(lower);
        Self {
            date,
            predicted,
            lower: lo,
            upper: hi,
        }
    }
}

/// Output of one forecast request. The forecast sequence spans the
/// training range plus `horizon_days` beyond the last observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub training: Vec<TrainingPoint>,
    pub forecast: Vec<ForecastPoint>,
    pub horizon_days: u32,
}

impl ForecastResult {
    /// Forecast points strictly after the last training date.
    pub fn future_only(&self) -> &[ForecastPoint] {
        let Some(last) = self.training.last() else {
            return &self.forecast;
        };
        let idx = self.forecast.partition_point(|p| p.date <= last.date);
        &self.forecast[idx..]
    }

    /// Most recent `n` forecast points, oldest first.
    pub fn forecast_tail(&self, n: usize) -> &[ForecastPoint] {
        let start = self.forecast.len().saturating_sub(n);
        &self.forecast[start..]
    }
}

/// Opaque handle to a fitted model on the forecast service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelHandle {
    pub id: String,
}

/// Company metadata shown alongside the chart.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<f64>,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn forecast_point_band_is_reordered() {
        let p = ForecastPoint::new(d("2024-01-01"), 100.0, 110.0, 90.0);
        assert!(p.lower <= p.predicted && p.predicted <= p.upper);
        assert_eq!(p.lower, 90.0);
        assert_eq!(p.upper, 110.0);
    }

    #[test]
    fn future_only_splits_on_last_training_date() {
        let result = ForecastResult {
            training: vec![
                TrainingPoint { date: d("2024-01-01"), value: 1.0 },
                TrainingPoint { date: d("2024-01-02"), value: 2.0 },
            ],
            forecast: vec![
                ForecastPoint::new(d("2024-01-01"), 1.0, 0.5, 1.5),
                ForecastPoint::new(d("2024-01-02"), 2.0, 1.5, 2.5),
                ForecastPoint::new(d("2024-01-03"), 3.0, 2.5, 3.5),
            ],
            horizon_days: 1,
        };

        let future = result.future_only();
        assert_eq!(future.len(), 1);
        assert_eq!(future[0].date, d("2024-01-03"));
    }

    #[test]
    fn tail_handles_short_series() {
        let series = PriceSeries::empty("AAPL", ProviderKind::YahooFinance);
        assert!(series.tail(10).is_empty());
    }
}

use crate::error::ValidationError;
use crate::types::PriceSeries;

/// Minimum observations the forecasting model needs to fit a trend.
/// Calling it with fewer fails inside the model, so the pipeline gates here.
pub const MIN_TRAINING_ROWS: usize = 2;

/// Gate a normalized series before any cleaning or model work happens.
///
/// Pure, no I/O. An empty series and a series with too few usable closes
/// are rejected with distinct reasons so the user message can say which.
pub fn validate(series: &PriceSeries) -> Result<(), ValidationError> {
    if series.is_empty() {
        return Err(ValidationError::no_data(series.provider));
    }

    let usable = series.usable_close_count();
    if usable < MIN_TRAINING_ROWS {
        return Err(ValidationError::TooFewCloses { found: usable });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PriceRecord, ProviderKind};
    use chrono::NaiveDate;

    fn record(date: &str, close: Option<f64>) -> PriceRecord {
        PriceRecord {
            date: date.parse::<NaiveDate>().unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume: Some(1_000),
        }
    }

    fn series(records: Vec<PriceRecord>) -> PriceSeries {
        PriceSeries {
            ticker: "AAPL".to_string(),
            provider: ProviderKind::YahooFinance,
            records,
        }
    }

    #[test]
    fn empty_series_rejected_with_no_data_reason() {
        let err = validate(&series(vec![])).unwrap_err();
        assert!(matches!(err, ValidationError::NoData { .. }));
        assert!(err.to_string().starts_with("No data returned"));
    }

    #[test]
    fn exactly_two_valid_rows_pass() {
        let s = series(vec![
            record("2024-01-02", Some(185.0)),
            record("2024-01-03", Some(186.5)),
        ]);
        assert!(validate(&s).is_ok());
    }

    #[test]
    fn one_valid_row_rejected_with_row_count_reason() {
        let s = series(vec![
            record("2024-01-02", Some(185.0)),
            record("2024-01-03", None),
        ]);
        let err = validate(&s).unwrap_err();
        assert_eq!(err, ValidationError::TooFewCloses { found: 1 });
        assert!(err.to_string().contains("closing price rows"));
    }

    #[test]
    fn nan_closes_do_not_count_as_usable() {
        let s = series(vec![
            record("2024-01-02", Some(f64::NAN)),
            record("2024-01-03", Some(f64::NAN)),
        ]);
        let err = validate(&s).unwrap_err();
        assert_eq!(err, ValidationError::TooFewCloses { found: 0 });
    }

    #[test]
    fn no_data_and_too_few_reasons_are_distinct() {
        let empty_msg = validate(&series(vec![])).unwrap_err().to_string();
        let sparse_msg = validate(&series(vec![record("2024-01-02", Some(1.0))]))
            .unwrap_err()
            .to_string();
        assert_ne!(empty_msg, sparse_msg);
    }
}

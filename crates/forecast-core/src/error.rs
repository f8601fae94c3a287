use thiserror::Error;

use crate::types::ProviderKind;

/// Raw provider payload did not have the expected shape.
#[derive(Error, Debug)]
pub enum NormalizationError {
    #[error("missing expected container {container:?} in {provider} response")]
    MissingContainer {
        provider: &'static str,
        container: &'static str,
    },

    #[error("malformed {provider} payload: {detail}")]
    MalformedPayload {
        provider: &'static str,
        detail: String,
    },
}

/// Network or payload failure while talking to a market data provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("provider rejected request: {0}")]
    Rejected(String),

    #[error("provider rate limited: {0}")]
    RateLimited(String),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

/// Series rejected before any cleaning was attempted.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No data returned from {provider} for that ticker.")]
    NoData { provider: &'static str },

    #[error("Not enough valid closing price rows for forecasting (found {found}, need at least 2).")]
    TooFewCloses { found: usize },
}

impl ValidationError {
    pub fn no_data(provider: ProviderKind) -> Self {
        ValidationError::NoData {
            provider: provider.display_name(),
        }
    }
}

/// Data existed but collapsed below the minimum during coercion.
/// Deliberately distinct from [`ValidationError`]: the root cause here
/// is malformed rows, not absence of data.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CleaningError {
    #[error("After cleaning, there aren't enough data points to train (kept {kept}, dropped {dropped}).")]
    TooFewAfterCleaning { kept: usize, dropped: usize },
}

/// The external forecasting model failed during fit or predict.
#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("model fit failed: {0}")]
    FitFailed(String),

    #[error("model service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("invalid model response: {0}")]
    InvalidResponse(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Umbrella error for one pipeline run. Each variant maps to exactly one
/// user-facing message; the caller halts the run on any of them.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Cleaning(#[from] CleaningError),

    #[error(transparent)]
    Forecast(#[from] ForecastError),

    #[error("invalid horizon: {0} years (expected 1..=5)")]
    InvalidHorizon(u32),
}

impl PipelineError {
    /// Single human-readable message for the presentation layer.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::Provider(_) => {
                "No data returned from the provider for that ticker.".to_string()
            }
            PipelineError::Validation(e) => e.to_string(),
            PipelineError::Cleaning(e) => e.to_string(),
            PipelineError::Forecast(_) => {
                "Forecasting failed for this series. Try another ticker or horizon.".to_string()
            }
            PipelineError::InvalidHorizon(years) => {
                format!("Prediction horizon must be between 1 and 5 years (got {}).", years)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_data_message_names_the_provider() {
        let err = ValidationError::no_data(ProviderKind::YahooFinance);
        assert_eq!(
            err.to_string(),
            "No data returned from Yahoo Finance for that ticker."
        );
    }

    #[test]
    fn cleaning_message_differs_from_validation_message() {
        let validation = ValidationError::TooFewCloses { found: 1 }.to_string();
        let cleaning = CleaningError::TooFewAfterCleaning { kept: 1, dropped: 10 }.to_string();
        assert_ne!(validation, cleaning);
        assert!(cleaning.contains("After cleaning"));
    }
}

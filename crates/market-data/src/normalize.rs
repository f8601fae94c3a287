use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use forecast_core::{NormalizationError, PriceRecord, PriceSeries, ProviderKind};
use serde_json::Value;

/// Map a raw provider payload onto the canonical series.
///
/// Pure transformation: rows that fail to parse are skipped, records come
/// out sorted strictly ascending by date, and duplicate dates keep the
/// last-seen record. A payload missing its expected top-level container is
/// a [`NormalizationError`], which the fetch path downgrades to an empty
/// series so the validator can produce the user-facing message.
pub fn normalize(
    raw: &Value,
    kind: ProviderKind,
    ticker: &str,
) -> Result<PriceSeries, NormalizationError> {
    let by_date = match kind {
        ProviderKind::AlphaVantage => normalize_alpha_vantage(raw)?,
        ProviderKind::YahooFinance => normalize_yahoo(raw)?,
    };

    Ok(PriceSeries {
        ticker: ticker.to_string(),
        provider: kind,
        records: by_date.into_values().collect(),
    })
}

/// Alpha Vantage daily payload: an object keyed by date under
/// `"Time Series (Daily)"`, every numeric field a string.
fn normalize_alpha_vantage(raw: &Value) -> Result<BTreeMap<NaiveDate, PriceRecord>, NormalizationError> {
    let series = raw
        .get("Time Series (Daily)")
        .and_then(|v| v.as_object())
        .ok_or(NormalizationError::MissingContainer {
            provider: "Alpha Vantage",
            container: "Time Series (Daily)",
        })?;

    let mut by_date = BTreeMap::new();
    for (date_key, fields) in series {
        let Ok(date) = date_key.parse::<NaiveDate>() else {
            tracing::debug!("skipping unparseable date key {:?}", date_key);
            continue;
        };

        // Insert overwrites, so a duplicate date keeps the last-seen record.
        by_date.insert(
            date,
            PriceRecord {
                date,
                open: text_field(fields, "1. open"),
                high: text_field(fields, "2. high"),
                low: text_field(fields, "3. low"),
                close: text_field(fields, "4. close"),
                volume: fields
                    .get("5. volume")
                    .and_then(|v| v.as_str())
                    .and_then(|s| s.parse::<u64>().ok()),
            },
        );
    }

    Ok(by_date)
}

/// Yahoo chart payload: `chart.result[0]` carrying a `timestamp` array and
/// parallel OHLCV arrays under `indicators.quote[0]`, with null slots.
fn normalize_yahoo(raw: &Value) -> Result<BTreeMap<NaiveDate, PriceRecord>, NormalizationError> {
    let result = raw
        .get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or(NormalizationError::MissingContainer {
            provider: "Yahoo Finance",
            container: "chart.result",
        })?;

    let timestamps = result
        .get("timestamp")
        .and_then(|v| v.as_array())
        .ok_or(NormalizationError::MissingContainer {
            provider: "Yahoo Finance",
            container: "timestamp",
        })?;

    let quote = result
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or(NormalizationError::MissingContainer {
            provider: "Yahoo Finance",
            container: "indicators.quote",
        })?;

    let column = |name: &str| quote.get(name).and_then(|v| v.as_array());
    let opens = column("open");
    let highs = column("high");
    let lows = column("low");
    let closes = column("close");
    let volumes = column("volume");

    let mut by_date = BTreeMap::new();
    for (i, ts) in timestamps.iter().enumerate() {
        let Some(date) = ts
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.date_naive())
        else {
            continue;
        };

        by_date.insert(
            date,
            PriceRecord {
                date,
                open: slot(opens, i),
                high: slot(highs, i),
                low: slot(lows, i),
                close: slot(closes, i),
                volume: volumes.and_then(|col| col.get(i)).and_then(|v| v.as_u64()),
            },
        );
    }

    Ok(by_date)
}

fn text_field(fields: &Value, name: &str) -> Option<f64> {
    fields
        .get(name)
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse::<f64>().ok())
}

fn slot(column: Option<&Vec<Value>>, i: usize) -> Option<f64> {
    column.and_then(|col| col.get(i)).and_then(|v| v.as_f64())
}

//! Chart-ready projections of pipeline output. Pure field selection,
//! no numeric transformation.

use chrono::NaiveDate;
use forecast_core::{ForecastResult, PriceSeries};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandedPoint {
    pub date: NaiveDate,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Observed-vs-predicted overlay. The two sequences are independently
/// ascending and not the same length: predicted runs past the last
/// observation by the forecast horizon.
#[derive(Debug, Clone, Serialize)]
pub struct ChartOverlay {
    pub observed: Vec<ChartPoint>,
    pub predicted: Vec<BandedPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpenClosePoint {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub close: Option<f64>,
}

pub fn build_overlay(result: &ForecastResult) -> ChartOverlay {
    ChartOverlay {
        observed: result
            .training
            .iter()
            .map(|p| ChartPoint { date: p.date, value: p.value })
            .collect(),
        predicted: result
            .forecast
            .iter()
            .map(|p| BandedPoint {
                date: p.date,
                value: p.predicted,
                lower: p.lower,
                upper: p.upper,
            })
            .collect(),
    }
}

/// The "Stock Open" / "Stock Close" pair plotted over the raw series.
pub fn open_close_series(series: &PriceSeries) -> Vec<OpenClosePoint> {
    series
        .records
        .iter()
        .map(|r| OpenClosePoint {
            date: r.date,
            open: r.open,
            close: r.close,
        })
        .collect()
}

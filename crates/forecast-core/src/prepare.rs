use crate::error::CleaningError;
use crate::types::{PriceSeries, TrainingPoint};
use crate::validate::MIN_TRAINING_ROWS;

/// Project a normalized series into the model's (date, value) input shape.
///
/// Rows without a finite close are dropped rather than failing the whole
/// series. Ascending date order is re-asserted instead of assumed: the
/// normalizer sorts, but this function must stay correct if handed an
/// unsorted series from elsewhere.
pub fn prepare(series: &PriceSeries) -> Result<Vec<TrainingPoint>, CleaningError> {
    let mut points: Vec<TrainingPoint> = series
        .records
        .iter()
        .filter_map(|r| {
            let value = r.close.filter(|c| c.is_finite())?;
            Some(TrainingPoint { date: r.date, value })
        })
        .collect();

    if !points.is_sorted_by_key(|p| p.date) {
        points.sort_by_key(|p| p.date);
    }

    if points.len() < MIN_TRAINING_ROWS {
        return Err(CleaningError::TooFewAfterCleaning {
            kept: points.len(),
            dropped: series.len() - points.len(),
        });
    }

    Ok(points)
}

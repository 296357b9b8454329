use anyhow::Result;

use crate::grid::QualifyingEntry;
use crate::prediction::boosting::GradientBoostedRegressor;
use crate::prediction::types::PredictionRow;

/// Predicts a lap time for every grid entry, joined or not, and orders the
/// rows fastest first. Equal predictions keep their grid order.
pub fn rank(
    entries: &[QualifyingEntry],
    model: &GradientBoostedRegressor,
) -> Result<Vec<PredictionRow>> {
    let features: Vec<f64> = entries.iter().map(|e| e.qualifying_time).collect();
    let predicted = model.predict(&features)?;

    let mut rows: Vec<PredictionRow> = entries
        .iter()
        .zip(predicted)
        .map(|(entry, predicted_time)| PredictionRow {
            driver: entry.driver.clone(),
            driver_code: entry.driver_code.clone(),
            qualifying_time: entry.qualifying_time,
            predicted_time,
        })
        .collect();

    // stable
    rows.sort_by(|a, b| a.predicted_time.total_cmp(&b.predicted_time));
    Ok(rows)
}

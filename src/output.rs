//! Output formatting and persistence for prediction reports.
//!
//! Supports a console table, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use tracing::debug;

use crate::prediction::types::{PredictionReport, UnmatchReason};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs the report using Rust's debug pretty-print format.
pub fn print_pretty(report: &PredictionReport) {
    debug!("{:#?}", report);
}

/// Serializes the report as pretty-printed JSON.
pub fn to_json(report: &PredictionReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Renders the ranking table, any unmatched drivers and the model error.
pub fn render_report(report: &PredictionReport) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "\n Predicted {} Winner \n", report.title);
    let _ = writeln!(
        out,
        " {:>3}  {:<22} {:<5} {:>10} {:>14}",
        "Pos", "Driver", "Code", "Quali (s)", "Predicted (s)"
    );
    for (i, row) in report.ranking.iter().enumerate() {
        let _ = writeln!(
            out,
            " {:>3}  {:<22} {:<5} {:>10.3} {:>14.3}",
            i + 1,
            row.driver,
            row.driver_code.as_deref().unwrap_or("-"),
            row.qualifying_time,
            row.predicted_time
        );
    }

    if !report.unmatched.is_empty() {
        let _ = writeln!(out, "\n Not in training data:");
        for miss in &report.unmatched {
            let why = match &miss.reason {
                UnmatchReason::Unmapped => "no driver code".to_string(),
                UnmatchReason::NoHistory(code) => format!("no {} laps for {}", report.session, code),
                UnmatchReason::DuplicateCode(code) => format!("code {} used twice", code),
            };
            let _ = writeln!(out, "   {} ({})", miss.driver, why);
        }
    }

    let _ = write!(out, "\n Model Error (MAE): {:.2} seconds", report.mae);
    if report.mae_in_sample {
        let _ = write!(out, " (in-sample)");
    }
    out.push('\n');
    out
}

#[derive(Debug, Serialize)]
struct PredictionRecord<'a> {
    generated_at: DateTime<Utc>,
    session: String,
    position: usize,
    driver: &'a str,
    driver_code: Option<&'a str>,
    qualifying_time: f64,
    predicted_time: f64,
    mae: f64,
}

/// Appends every ranked row of the report to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_predictions(path: &str, report: &PredictionReport) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = report.ranking.len(), "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    let session = report.session.to_string();
    for (i, row) in report.ranking.iter().enumerate() {
        writer.serialize(PredictionRecord {
            generated_at: report.generated_at,
            session: session.clone(),
            position: i + 1,
            driver: &row.driver,
            driver_code: row.driver_code.as_deref(),
            qualifying_time: row.qualifying_time,
            predicted_time: row.predicted_time,
            mae: report.mae,
        })?;
    }
    writer.flush()?;

    Ok(())
}

//! Data types used by the prediction pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::services::SessionId;

/// Fixed hyperparameters of the boosted ensemble and the hold-out split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: u16,
    /// Seed of the train/test shuffle.
    pub seed: u64,
    /// Share of samples held out for evaluation, in `[0, 1)`.
    pub test_fraction: f64,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            seed: 39,
            test_fraction: 0.2,
        }
    }
}

/// One (feature, label) pair: a driver's qualifying time and historical
/// mean lap time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedSample {
    pub driver_code: String,
    pub qualifying_time: f64,
    pub lap_time: f64,
}

/// Why a grid entry did not produce a training sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "driver_code", rename_all = "snake_case")]
pub enum UnmatchReason {
    /// The driver name has no identity code.
    Unmapped,
    /// The code has no clean laps in the historical session.
    NoHistory(String),
    /// Another grid entry already joined with this code.
    DuplicateCode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unmatched {
    pub driver: String,
    #[serde(flatten)]
    pub reason: UnmatchReason,
}

/// A driver's predicted lap time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionRow {
    pub driver: String,
    pub driver_code: Option<String>,
    pub qualifying_time: f64,
    pub predicted_time: f64,
}

/// Everything one pipeline run produces.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub session: SessionId,
    pub event_name: String,
    pub clean_laps: usize,
    pub train_samples: usize,
    pub test_samples: usize,
    /// Mean absolute error in seconds.
    pub mae: f64,
    /// `true` when the hold-out partition was empty and the error was
    /// measured on the training samples.
    pub mae_in_sample: bool,
    pub ranking: Vec<PredictionRow>,
    pub unmatched: Vec<Unmatched>,
}

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use crate::grid::GridConfig;
use crate::laps::clean_laps;
use crate::prediction::boosting::GradientBoostedRegressor;
use crate::prediction::join::join;
use crate::prediction::rank::rank;
use crate::prediction::split::train_test_split;
use crate::prediction::types::{JoinedSample, ModelParams, PredictionReport, UnmatchReason};
use crate::prediction::utility::mean_absolute_error;
use crate::services::{LapSource, SessionId};

/// A fitted model and its hold-out error.
pub struct TrainedModel {
    pub model: GradientBoostedRegressor,
    pub mae: f64,
    pub mae_in_sample: bool,
    pub train_samples: usize,
    pub test_samples: usize,
}

/// Splits the samples, fits the ensemble on the training partition and
/// measures MAE on the held-out one.
///
/// When the hold-out partition is empty (a single sample) the error is
/// measured on the training partition instead.
pub fn train_and_evaluate(samples: &[JoinedSample], params: &ModelParams) -> Result<TrainedModel> {
    let split = train_test_split(samples, params.test_fraction, params.seed);

    let x_train: Vec<f64> = split.train.iter().map(|s| s.qualifying_time).collect();
    let y_train: Vec<f64> = split.train.iter().map(|s| s.lap_time).collect();
    let model = GradientBoostedRegressor::fit(&x_train, &y_train, params)?;

    let (eval, mae_in_sample) = if split.test.is_empty() {
        warn!(
            samples = samples.len(),
            "Too few samples to hold any out, measuring error on training data"
        );
        (&split.train, true)
    } else {
        (&split.test, false)
    };

    let x_eval: Vec<f64> = eval.iter().map(|s| s.qualifying_time).collect();
    let y_eval: Vec<f64> = eval.iter().map(|s| s.lap_time).collect();
    let mae = mean_absolute_error(&model.predict(&x_eval)?, &y_eval);

    info!(
        train = split.train.len(),
        test = split.test.len(),
        mae,
        "Model trained"
    );

    Ok(TrainedModel {
        model,
        mae,
        mae_in_sample,
        train_samples: split.train.len(),
        test_samples: split.test.len(),
    })
}

/// Runs the whole pipeline: load, clean, map, join, train, rank.
///
/// Fails with [`crate::error::PipelineError::SourceUnavailable`] when the
/// session cannot be loaded and with
/// [`crate::error::PipelineError::EmptyDataset`] when no grid entry joins
/// with the historical laps.
#[tracing::instrument(skip(source, config, session), fields(session = %session, grid = %config.title))]
pub async fn predict_race<S: LapSource + ?Sized>(
    source: &S,
    config: &GridConfig,
    session: &SessionId,
) -> Result<PredictionReport> {
    config.validate()?;

    let table = source.load_session(session).await?;
    let laps = clean_laps(&table);
    info!(raw = table.laps.len(), clean = laps.len(), "Historical laps ready");

    let entries = config.driver_codes.resolve(&config.entries);
    let outcome = join(&entries, &laps);

    for miss in &outcome.unmatched {
        match &miss.reason {
            UnmatchReason::Unmapped => {
                warn!(driver = %miss.driver, "Driver has no identity code, excluded from training")
            }
            UnmatchReason::NoHistory(code) => {
                warn!(driver = %miss.driver, code = %code, "No historical laps for driver, excluded from training")
            }
            UnmatchReason::DuplicateCode(code) => {
                warn!(driver = %miss.driver, code = %code, "Code already joined by another driver, excluded from training")
            }
        }
    }

    let samples = outcome.require_samples(session)?;
    info!(
        samples = samples.len(),
        unmatched = outcome.unmatched.len(),
        "Grid joined with history"
    );

    let trained = train_and_evaluate(samples, &config.model)?;
    let ranking = rank(&entries, &trained.model)?;

    Ok(PredictionReport {
        title: config.title.clone(),
        generated_at: Utc::now(),
        session: session.clone(),
        event_name: table.event_name,
        clean_laps: laps.len(),
        train_samples: trained.train_samples,
        test_samples: trained.test_samples,
        mae: trained.mae,
        mae_in_sample: trained.mae_in_sample,
        ranking,
        unmatched: outcome.unmatched,
    })
}

use anyhow::Result;
use race_pace::error::PipelineError;
use race_pace::grid::{GridConfig, IdentityMap, ReferenceTable};
use race_pace::prediction::predict_race;
use race_pace::prediction::types::{ModelParams, UnmatchReason};
use race_pace::services::{LapSource, RawLap, RawLapTable, SessionId, SessionKind};

struct FixedSource {
    laps: Vec<RawLap>,
}

#[async_trait::async_trait]
impl LapSource for FixedSource {
    async fn load_session(&self, session: &SessionId) -> Result<RawLapTable> {
        Ok(RawLapTable {
            session: session.clone(),
            event_name: "Test Grand Prix".to_string(),
            round: 1,
            laps: self.laps.clone(),
        })
    }
}

fn lap(code: &str, time: Option<&str>) -> RawLap {
    RawLap {
        driver_code: code.to_string(),
        lap_number: 1,
        lap_time: time.map(str::to_string),
    }
}

fn abc_grid() -> GridConfig {
    let entries: ReferenceTable = [("Driver A", 80.0), ("Driver B", 81.0), ("Driver C", 82.0)]
        .into_iter()
        .collect();
    let driver_codes: IdentityMap = [("Driver A", "A"), ("Driver B", "B"), ("Driver C", "C")]
        .into_iter()
        .collect();
    GridConfig {
        title: "Test Grand Prix".to_string(),
        entries,
        driver_codes,
        model: ModelParams::default(),
    }
}

fn session() -> SessionId {
    SessionId::new(2024, "Test Grand Prix", SessionKind::Race)
}

#[tokio::test]
async fn test_full_pipeline() {
    // A averages 90.0 over two laps, B averages 91.5, C has no laps
    let source = FixedSource {
        laps: vec![
            lap("A", Some("1:29.000")),
            lap("A", Some("1:31.000")),
            lap("A", None),
            lap("B", Some("91.500")),
        ],
    };

    let report = predict_race(&source, &abc_grid(), &session())
        .await
        .expect("pipeline failed");

    assert_eq!(report.train_samples + report.test_samples, 2);
    assert_eq!(report.clean_laps, 3);
    assert_eq!(report.ranking.len(), 3);
    assert!(report.ranking.iter().all(|r| r.predicted_time.is_finite()));
    assert!(
        report
            .ranking
            .windows(2)
            .all(|w| w[0].predicted_time <= w[1].predicted_time)
    );
    assert!(report.ranking.iter().any(|r| r.driver == "Driver C"));
    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(
        report.unmatched[0].reason,
        UnmatchReason::NoHistory("C".to_string())
    );
    assert!(report.mae.is_finite() && report.mae >= 0.0);
}

#[tokio::test]
async fn test_pipeline_is_deterministic() {
    let source = FixedSource {
        laps: (0..10)
            .map(|i| {
                let code = ["A", "B", "C"][i % 3];
                let time = format!("{:.3}", 90.0 + (i % 3) as f64 * 0.7 + i as f64 * 0.01);
                lap(code, Some(&time))
            })
            .collect(),
    };

    let a = predict_race(&source, &abc_grid(), &session()).await.unwrap();
    let b = predict_race(&source, &abc_grid(), &session()).await.unwrap();

    assert_eq!(a.mae.to_bits(), b.mae.to_bits());
    assert_eq!(a.ranking, b.ranking);
}

#[tokio::test]
async fn test_empty_join_fails_fast() {
    let source = FixedSource {
        laps: vec![lap("X", Some("1:30.000")), lap("Y", Some("1:31.000"))],
    };

    let err = predict_race(&source, &abc_grid(), &session())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::EmptyDataset { .. })
    ));
}

#[tokio::test]
async fn test_unmapped_driver_is_reported_not_fatal() {
    let mut grid = abc_grid();
    grid.entries = [("Driver A", 80.0), ("Driver B", 81.0), ("Driver Unknown", 82.0)]
        .into_iter()
        .collect();
    let source = FixedSource {
        laps: vec![lap("A", Some("90.0")), lap("B", Some("91.5"))],
    };

    let report = predict_race(&source, &grid, &session()).await.unwrap();

    assert_eq!(report.ranking.len(), 3);
    assert_eq!(report.unmatched.len(), 1);
    assert_eq!(report.unmatched[0].driver, "Driver Unknown");
    assert_eq!(report.unmatched[0].reason, UnmatchReason::Unmapped);
}

#[tokio::test]
async fn test_invalid_grid_rejected_before_loading() {
    let mut grid = abc_grid();
    grid.driver_codes = [("Driver A", "A"), ("Driver B", "A")].into_iter().collect();
    let source = FixedSource { laps: vec![] };

    let err = predict_race(&source, &grid, &session()).await.unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::InvalidConfig { .. })
    ));
}

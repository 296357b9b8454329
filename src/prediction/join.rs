use anyhow::Result;
use std::collections::{HashMap, HashSet};

use crate::error::PipelineError;
use crate::grid::QualifyingEntry;
use crate::laps::{LapRecord, mean_lap_times};
use crate::prediction::types::{JoinedSample, UnmatchReason, Unmatched};
use crate::services::SessionId;

/// Result of joining the grid with historical laps.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub samples: Vec<JoinedSample>,
    pub unmatched: Vec<Unmatched>,
}

impl JoinOutcome {
    /// Returns the samples, or [`PipelineError::EmptyDataset`] when there are
    /// none. Must be checked before fitting a model.
    pub fn require_samples(&self, session: &SessionId) -> Result<&[JoinedSample]> {
        if self.samples.is_empty() {
            return Err(PipelineError::EmptyDataset {
                session: session.to_string(),
            }
            .into());
        }
        Ok(&self.samples)
    }
}

/// Inner-joins grid entries with laps on driver code.
///
/// Each matched entry yields one sample labelled with the driver's mean lap
/// time. Entries without a code, without laps, or repeating a code already
/// joined are listed in `unmatched` instead. Samples keep the grid order.
pub fn join(entries: &[QualifyingEntry], laps: &[LapRecord]) -> JoinOutcome {
    let history: HashMap<String, f64> = mean_lap_times(laps)
        .into_iter()
        .map(|r| (r.driver_code, r.lap_time))
        .collect();

    let mut samples = Vec::new();
    let mut unmatched = Vec::new();
    let mut joined_codes = HashSet::new();

    for entry in entries {
        let Some(code) = entry.driver_code.as_deref() else {
            unmatched.push(Unmatched {
                driver: entry.driver.clone(),
                reason: UnmatchReason::Unmapped,
            });
            continue;
        };

        match history.get(code) {
            Some(&lap_time) if joined_codes.insert(code) => samples.push(JoinedSample {
                driver_code: code.to_string(),
                qualifying_time: entry.qualifying_time,
                lap_time,
            }),
            Some(_) => unmatched.push(Unmatched {
                driver: entry.driver.clone(),
                reason: UnmatchReason::DuplicateCode(code.to_string()),
            }),
            None => unmatched.push(Unmatched {
                driver: entry.driver.clone(),
                reason: UnmatchReason::NoHistory(code.to_string()),
            }),
        }
    }

    JoinOutcome { samples, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::SessionKind;

    fn entry(driver: &str, time: f64, code: Option<&str>) -> QualifyingEntry {
        QualifyingEntry {
            driver: driver.to_string(),
            qualifying_time: time,
            driver_code: code.map(str::to_string),
        }
    }

    fn lap(code: &str, time: f64) -> LapRecord {
        LapRecord {
            driver_code: code.to_string(),
            lap_time: time,
        }
    }

    #[test]
    fn test_join_matches_only_shared_codes() {
        let entries = vec![
            entry("Driver A", 80.0, Some("A")),
            entry("Driver B", 81.0, Some("B")),
            entry("Driver C", 82.0, Some("C")),
        ];
        let laps = vec![lap("A", 90.0), lap("B", 91.0), lap("B", 92.0), lap("Z", 99.0)];

        let outcome = join(&entries, &laps);

        assert_eq!(
            outcome.samples,
            vec![
                JoinedSample {
                    driver_code: "A".to_string(),
                    qualifying_time: 80.0,
                    lap_time: 90.0
                },
                JoinedSample {
                    driver_code: "B".to_string(),
                    qualifying_time: 81.0,
                    lap_time: 91.5
                },
            ]
        );
        assert_eq!(
            outcome.unmatched,
            vec![Unmatched {
                driver: "Driver C".to_string(),
                reason: UnmatchReason::NoHistory("C".to_string())
            }]
        );
    }

    #[test]
    fn test_join_size_bound_and_membership() {
        let entries = vec![
            entry("Driver A", 80.0, Some("A")),
            entry("Driver A2", 80.5, Some("A")),
            entry("Driver B", 81.0, Some("B")),
            entry("Nobody", 83.0, None),
        ];
        let laps = vec![lap("A", 90.0), lap("C", 93.0)];

        let outcome = join(&entries, &laps);

        assert!(outcome.samples.len() <= entries.len().min(laps.len()));
        for s in &outcome.samples {
            assert!(entries.iter().any(|e| e.driver_code.as_deref() == Some(&*s.driver_code)));
            assert!(laps.iter().any(|l| l.driver_code == s.driver_code));
        }
        assert_eq!(outcome.samples.len(), 1);
        assert_eq!(outcome.unmatched.len(), 3);
        assert_eq!(
            outcome.unmatched[0].reason,
            UnmatchReason::DuplicateCode("A".to_string())
        );
    }

    #[test]
    fn test_unmapped_name_is_dropped_not_errored() {
        let entries = vec![entry("Alexander Alon", 85.889, None)];
        let laps = vec![lap("ALB", 90.0)];

        let outcome = join(&entries, &laps);

        assert!(outcome.samples.is_empty());
        assert_eq!(outcome.unmatched[0].reason, UnmatchReason::Unmapped);
    }

    #[test]
    fn test_require_samples_on_empty_join() {
        let session = SessionId::new(2024, "British Grand Prix", SessionKind::Race);
        let outcome = join(&[entry("Driver A", 80.0, Some("A"))], &[]);

        let err = outcome.require_samples(&session).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::EmptyDataset { .. })
        ));
    }
}

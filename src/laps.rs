//! Cleaning raw timing rows into numeric lap records.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use crate::services::RawLapTable;

/// One valid historical lap, or a per-driver summary of several.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LapRecord {
    pub driver_code: String,
    pub lap_time: f64,
}

/// Parses a provider lap time into seconds.
///
/// Accepts `SS.fff`, `M:SS.fff` and `H:MM:SS.fff`. Hours and minutes must be
/// whole numbers and every field after the first must be below 60. Returns
/// `None` for anything else, including signs, exponents and `NaN`.
pub fn parse_lap_time(raw: &str) -> Option<f64> {
    let parts: Vec<&str> = raw.trim().split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let (last, leading) = parts.split_last()?;

    let mut seconds = 0.0;
    for (i, part) in leading.iter().enumerate() {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u32 = part.parse().ok()?;
        if i > 0 && value >= 60 {
            return None;
        }
        seconds = seconds * 60.0 + f64::from(value);
    }

    if !last.bytes().any(|b| b.is_ascii_digit())
        || !last.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }
    let secs: f64 = last.parse().ok()?;
    if !leading.is_empty() && secs >= 60.0 {
        return None;
    }

    Some(seconds * 60.0 + secs)
}

/// Drops rows whose lap time is missing or unparseable and converts the rest
/// to seconds. Row order follows the input table.
pub fn clean_laps(table: &RawLapTable) -> Vec<LapRecord> {
    let records: Vec<LapRecord> = table
        .laps
        .iter()
        .filter_map(|lap| {
            let lap_time = parse_lap_time(lap.lap_time.as_deref()?)?;
            Some(LapRecord {
                driver_code: lap.driver_code.clone(),
                lap_time,
            })
        })
        .collect();

    debug!(
        raw = table.laps.len(),
        clean = records.len(),
        dropped = table.laps.len() - records.len(),
        "Laps cleaned"
    );
    records
}

/// Collapses laps into one record per driver holding the mean lap time,
/// ordered by driver code.
pub fn mean_lap_times(laps: &[LapRecord]) -> Vec<LapRecord> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for lap in laps {
        let entry = sums.entry(lap.driver_code.as_str()).or_default();
        entry.0 += lap.lap_time;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(code, (sum, count))| LapRecord {
            driver_code: code.to_string(),
            lap_time: sum / count as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{RawLap, SessionId, SessionKind};

    fn raw(code: &str, time: Option<&str>) -> RawLap {
        RawLap {
            driver_code: code.to_string(),
            lap_number: 1,
            lap_time: time.map(str::to_string),
        }
    }

    fn table(laps: Vec<RawLap>) -> RawLapTable {
        RawLapTable {
            session: SessionId::new(2024, "British Grand Prix", SessionKind::Race),
            event_name: "British Grand Prix".to_string(),
            round: 12,
            laps,
        }
    }

    #[test]
    fn test_parse_lap_time_formats() {
        assert_eq!(parse_lap_time("1:30.500"), Some(90.5));
        assert_eq!(parse_lap_time("85.25"), Some(85.25));
        assert_eq!(parse_lap_time("1:00:01.5"), Some(3601.5));
        assert_eq!(parse_lap_time(" 0:59.000 "), Some(59.0));
    }

    #[test]
    fn test_parse_lap_time_rejects_garbage() {
        assert_eq!(parse_lap_time(""), None);
        assert_eq!(parse_lap_time("DNF"), None);
        assert_eq!(parse_lap_time("1:-2.0"), None);
        assert_eq!(parse_lap_time("-90.0"), None);
        assert_eq!(parse_lap_time("NaN"), None);
        assert_eq!(parse_lap_time("1::2"), None);
    }

    #[test]
    fn test_parse_lap_time_rejects_out_of_range_fields() {
        assert_eq!(parse_lap_time("1:75.0"), None);
        assert_eq!(parse_lap_time("1:60.0"), None);
        assert_eq!(parse_lap_time("1:61:00.0"), None);
        assert_eq!(parse_lap_time("1.5:30"), None);
        assert_eq!(parse_lap_time("1e2"), None);
        assert_eq!(parse_lap_time("+90.0"), None);
        assert_eq!(parse_lap_time("1:2:3:4"), None);
        assert_eq!(parse_lap_time("1:."), None);
        assert_eq!(parse_lap_time("1:30.5.1"), None);
    }

    #[test]
    fn test_parse_lap_time_boundaries() {
        assert_eq!(parse_lap_time("1:59.5"), Some(119.5));
        assert_eq!(parse_lap_time("75.0"), Some(75.0));
        assert_eq!(parse_lap_time("2:00.125"), Some(120.125));
        assert_eq!(parse_lap_time("0.0"), Some(0.0));
    }

    #[test]
    fn test_clean_laps_drops_missing_times() {
        let t = table(vec![
            raw("VER", Some("1:30.000")),
            raw("VER", None),
            raw("HAM", Some("")),
            raw("HAM", Some("1:31.000")),
            raw("NOR", Some("lapped")),
        ]);

        let laps = clean_laps(&t);

        assert_eq!(
            laps,
            vec![
                LapRecord {
                    driver_code: "VER".to_string(),
                    lap_time: 90.0
                },
                LapRecord {
                    driver_code: "HAM".to_string(),
                    lap_time: 91.0
                },
            ]
        );
    }

    #[test]
    fn test_clean_laps_never_emits_negative_or_missing() {
        let t = table(vec![
            raw("A", Some("-1.0")),
            raw("A", Some("inf")),
            raw("B", None),
            raw("B", Some("0.0")),
            raw("C", Some("2:00.125")),
        ]);

        let laps = clean_laps(&t);

        assert!(laps.len() <= t.laps.len());
        assert!(laps.iter().all(|l| l.lap_time.is_finite() && l.lap_time >= 0.0));
        assert_eq!(laps.len(), 2);
    }

    #[test]
    fn test_mean_lap_times_one_row_per_driver() {
        let laps = vec![
            LapRecord {
                driver_code: "B".to_string(),
                lap_time: 91.0,
            },
            LapRecord {
                driver_code: "A".to_string(),
                lap_time: 89.0,
            },
            LapRecord {
                driver_code: "B".to_string(),
                lap_time: 92.0,
            },
            LapRecord {
                driver_code: "A".to_string(),
                lap_time: 91.0,
            },
        ];

        let means = mean_lap_times(&laps);

        assert_eq!(means.len(), 2);
        assert_eq!(means[0].driver_code, "A");
        assert_eq!(means[0].lap_time, 90.0);
        assert_eq!(means[1].driver_code, "B");
        assert_eq!(means[1].lap_time, 91.5);
    }

    #[test]
    fn test_mean_lap_times_empty() {
        assert!(mean_lap_times(&[]).is_empty());
    }
}

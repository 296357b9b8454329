//! JSON parser for Ergast-compatible timing API responses.
//!
//! Only the fields the pipeline needs are modelled; everything else in the
//! `MRData` envelope is ignored.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

use crate::services::RawLap;

#[derive(Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MRData")]
    mr_data: T,
}

#[derive(Deserialize)]
struct RaceTableData {
    #[serde(default)]
    total: Option<String>,
    #[serde(rename = "RaceTable")]
    race_table: RaceTable,
}

#[derive(Deserialize)]
struct RaceTable {
    #[serde(rename = "Races", default)]
    races: Vec<Race>,
}

#[derive(Deserialize)]
struct Race {
    round: String,
    #[serde(rename = "raceName")]
    race_name: String,
    #[serde(rename = "Laps", default)]
    laps: Vec<Lap>,
    #[serde(rename = "QualifyingResults", default)]
    qualifying_results: Vec<QualifyingResult>,
}

#[derive(Deserialize)]
struct Lap {
    number: String,
    #[serde(rename = "Timings", default)]
    timings: Vec<Timing>,
}

#[derive(Deserialize)]
struct Timing {
    #[serde(rename = "driverId")]
    driver_id: String,
    #[serde(default)]
    time: Option<String>,
}

#[derive(Deserialize)]
struct QualifyingResult {
    #[serde(rename = "Driver")]
    driver: Driver,
    #[serde(rename = "Q1", default)]
    q1: Option<String>,
    #[serde(rename = "Q2", default)]
    q2: Option<String>,
    #[serde(rename = "Q3", default)]
    q3: Option<String>,
}

#[derive(Deserialize)]
struct DriverTableData {
    #[serde(rename = "DriverTable")]
    driver_table: DriverTable,
}

#[derive(Deserialize)]
struct DriverTable {
    #[serde(rename = "Drivers", default)]
    drivers: Vec<Driver>,
}

#[derive(Deserialize)]
struct Driver {
    #[serde(rename = "driverId")]
    driver_id: String,
    #[serde(default)]
    code: Option<String>,
}

impl Driver {
    /// The three-letter code, or the upper-cased driver id when the provider
    /// has none (common for older seasons).
    fn code(&self) -> String {
        match &self.code {
            Some(code) if !code.trim().is_empty() => code.trim().to_string(),
            _ => self.driver_id.to_ascii_uppercase(),
        }
    }
}

/// One event of a season schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub round: u32,
    pub name: String,
}

/// A single lap timing as listed by the laps endpoint, keyed by driver id.
#[derive(Debug, Clone, PartialEq)]
pub struct LapTiming {
    pub driver_id: String,
    pub lap_number: u32,
    pub time: Option<String>,
}

/// One page of the laps endpoint. `total` counts timing rows across all
/// pages.
#[derive(Debug, Clone, PartialEq)]
pub struct LapsPage {
    pub total: usize,
    pub timings: Vec<LapTiming>,
}

fn parse_u32(field: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .with_context(|| format!("invalid {field} '{value}'"))
}

/// Decodes a season schedule (`/{season}.json`).
pub fn parse_schedule(bytes: &[u8]) -> Result<Vec<ScheduledEvent>> {
    let envelope: Envelope<RaceTableData> = serde_json::from_slice(bytes)?;
    envelope
        .mr_data
        .race_table
        .races
        .into_iter()
        .map(|race| {
            Ok(ScheduledEvent {
                round: parse_u32("round", &race.round)?,
                name: race.race_name,
            })
        })
        .collect()
}

/// Decodes a driver list (`/{season}/{round}/drivers.json`) into a
/// driver id → code map.
pub fn parse_driver_codes(bytes: &[u8]) -> Result<HashMap<String, String>> {
    let envelope: Envelope<DriverTableData> = serde_json::from_slice(bytes)?;
    Ok(envelope
        .mr_data
        .driver_table
        .drivers
        .into_iter()
        .map(|d| {
            let code = d.code();
            (d.driver_id, code)
        })
        .collect())
}

/// Decodes one page of lap timings (`/{season}/{round}/laps.json`).
///
/// A page past the last lap decodes to an empty `timings` list.
pub fn parse_laps_page(bytes: &[u8]) -> Result<LapsPage> {
    let envelope: Envelope<RaceTableData> = serde_json::from_slice(bytes)?;
    let data = envelope.mr_data;
    let total = match data.total.as_deref() {
        Some(t) => t
            .trim()
            .parse()
            .with_context(|| format!("invalid total '{t}'"))?,
        None => 0,
    };

    let mut timings = Vec::new();
    for race in data.race_table.races {
        for lap in race.laps {
            let lap_number = parse_u32("lap number", &lap.number)?;
            for t in lap.timings {
                timings.push(LapTiming {
                    driver_id: t.driver_id,
                    lap_number,
                    time: t.time,
                });
            }
        }
    }

    Ok(LapsPage { total, timings })
}

/// Decodes qualifying results (`/{season}/{round}/qualifying.json`).
///
/// Each of Q1, Q2 and Q3 becomes a lap numbered 1 to 3; a segment the driver
/// did not run is kept with a missing lap time.
pub fn parse_qualifying(bytes: &[u8]) -> Result<Vec<RawLap>> {
    let envelope: Envelope<RaceTableData> = serde_json::from_slice(bytes)?;
    let mut laps = Vec::new();

    for race in envelope.mr_data.race_table.races {
        for result in race.qualifying_results {
            let code = result.driver.code();
            for (lap_number, time) in [(1, result.q1), (2, result.q2), (3, result.q3)] {
                laps.push(RawLap {
                    driver_code: code.clone(),
                    lap_number,
                    lap_time: time.filter(|t| !t.trim().is_empty()),
                });
            }
        }
    }

    Ok(laps)
}

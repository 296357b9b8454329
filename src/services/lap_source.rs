//! Trait and types for loading a historical timing session.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which session of a race weekend to load.
///
/// Parsed from the short codes used on the command line (`R`, `Q`) or
/// their long names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionKind {
    Race,
    Qualifying,
}

impl SessionKind {
    pub fn code(&self) -> &'static str {
        match self {
            SessionKind::Race => "R",
            SessionKind::Qualifying => "Q",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r" | "race" => Ok(SessionKind::Race),
            "q" | "qualifying" => Ok(SessionKind::Qualifying),
            other => Err(format!(
                "unknown session type '{other}' (expected R or Q)"
            )),
        }
    }
}

/// Identifies one historical session: season, event and session kind.
///
/// `event` is either the event name as published in the season schedule
/// (matched case-insensitively) or a round number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionId {
    pub season: u16,
    pub event: String,
    pub kind: SessionKind,
}

impl SessionId {
    pub fn new(season: u16, event: impl Into<String>, kind: SessionKind) -> Self {
        Self {
            season,
            event: event.into(),
            kind,
        }
    }

    /// File-system friendly key, e.g. `2024_british-grand-prix_R`.
    pub fn cache_key(&self) -> String {
        format!("{}_{}_{}", self.season, slug(&self.event), self.kind)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.season, self.event, self.kind)
    }
}

fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// One raw timing row: the lap time is kept as the provider's string and may
/// be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLap {
    pub driver_code: String,
    pub lap_number: u32,
    pub lap_time: Option<String>,
}

/// Everything loaded for one session, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLapTable {
    pub session: SessionId,
    pub event_name: String,
    pub round: u32,
    pub laps: Vec<RawLap>,
}

/// Abstraction over a provider of historical timing data.
#[async_trait::async_trait]
pub trait LapSource: Send + Sync {
    /// Loads the per-lap timing table of `session`.
    ///
    /// Fails with [`crate::error::PipelineError::SourceUnavailable`] when the
    /// session cannot be located or has no data.
    async fn load_session(&self, session: &SessionId) -> Result<RawLapTable>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_kind_parses_codes_and_names() {
        assert_eq!("R".parse::<SessionKind>().unwrap(), SessionKind::Race);
        assert_eq!("race".parse::<SessionKind>().unwrap(), SessionKind::Race);
        assert_eq!(
            " Qualifying ".parse::<SessionKind>().unwrap(),
            SessionKind::Qualifying
        );
        assert!("FP1".parse::<SessionKind>().is_err());
    }

    #[test]
    fn test_cache_key_is_slugged() {
        let id = SessionId::new(2024, "British Grand Prix", SessionKind::Race);
        assert_eq!(id.cache_key(), "2024_british-grand-prix_R");

        let id = SessionId::new(2023, "  São Paulo GP!! ", SessionKind::Qualifying);
        assert_eq!(id.cache_key(), "2023_s-o-paulo-gp_Q");
    }

    #[test]
    fn test_display() {
        let id = SessionId::new(2024, "12", SessionKind::Race);
        assert_eq!(id.to_string(), "2024 12 R");
    }
}

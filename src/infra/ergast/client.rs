use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Display;
use tracing::{debug, info};

use crate::error::PipelineError;
use crate::fetch::{BasicClient, HttpClient, fetch_bytes};
use crate::parser::{
    ScheduledEvent, parse_driver_codes, parse_laps_page, parse_qualifying, parse_schedule,
};
use crate::services::{LapSource, RawLap, RawLapTable, SessionId, SessionKind};

pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

/// Largest page the public mirror serves.
const PAGE_SIZE: usize = 100;

/// Client for an Ergast-compatible historical timing API.
pub struct ErgastClient<C = BasicClient> {
    base_url: String,
    http: C,
    page_size: usize,
}

impl ErgastClient<BasicClient> {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self::with_client(base_url, BasicClient::new()?))
    }
}

impl<C: HttpClient> ErgastClient<C> {
    pub fn with_client(base_url: &str, http: C) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
            page_size: PAGE_SIZE,
        }
    }

    /// Lists every event of `season` in round order.
    #[tracing::instrument(skip(self))]
    pub async fn schedule(&self, season: u16) -> Result<Vec<ScheduledEvent>> {
        let url = format!("{}/{}.json?limit={}", self.base_url, season, self.page_size);
        let bytes = fetch_bytes(&self.http, &url).await?;
        parse_schedule(&bytes)
    }

    /// Finds the scheduled event named (or numbered) by `session.event`.
    pub async fn resolve_event(&self, session: &SessionId) -> Result<ScheduledEvent> {
        let events = self
            .schedule(session.season)
            .await
            .map_err(|e| unavailable(session, e))?;

        find_event(&events, &session.event).cloned().ok_or_else(|| {
            unavailable(
                session,
                format!(
                    "no event '{}' in the {} schedule",
                    session.event, session.season
                ),
            )
        })
    }

    async fn driver_codes(&self, season: u16, round: u32) -> Result<HashMap<String, String>> {
        let url = format!(
            "{}/{}/{}/drivers.json?limit={}",
            self.base_url, season, round, self.page_size
        );
        let bytes = fetch_bytes(&self.http, &url).await?;
        parse_driver_codes(&bytes)
    }

    async fn race_laps(&self, season: u16, round: u32) -> Result<Vec<RawLap>> {
        let codes = self.driver_codes(season, round).await?;
        let mut laps = Vec::new();
        let mut offset = 0;

        loop {
            let url = format!(
                "{}/{}/{}/laps.json?limit={}&offset={}",
                self.base_url, season, round, self.page_size, offset
            );
            let bytes = fetch_bytes(&self.http, &url).await?;
            let page = parse_laps_page(&bytes)?;
            let received = page.timings.len();
            debug!(offset, received, total = page.total, "Laps page");

            for timing in page.timings {
                let driver_code = codes
                    .get(&timing.driver_id)
                    .cloned()
                    .unwrap_or_else(|| timing.driver_id.to_ascii_uppercase());
                laps.push(RawLap {
                    driver_code,
                    lap_number: timing.lap_number,
                    lap_time: timing.time,
                });
            }

            match next_offset(offset, received, page.total) {
                Some(next) => offset = next,
                None => break,
            }
        }

        Ok(laps)
    }

    async fn qualifying_laps(&self, season: u16, round: u32) -> Result<Vec<RawLap>> {
        let url = format!(
            "{}/{}/{}/qualifying.json?limit={}",
            self.base_url, season, round, self.page_size
        );
        let bytes = fetch_bytes(&self.http, &url).await?;
        parse_qualifying(&bytes)
    }
}

#[async_trait]
impl<C: HttpClient> LapSource for ErgastClient<C> {
    #[tracing::instrument(skip(self, session), fields(session = %session))]
    async fn load_session(&self, session: &SessionId) -> Result<RawLapTable> {
        let event = self.resolve_event(session).await?;

        let laps = match session.kind {
            SessionKind::Race => self.race_laps(session.season, event.round).await,
            SessionKind::Qualifying => self.qualifying_laps(session.season, event.round).await,
        }
        .map_err(|e| unavailable(session, e))?;

        if laps.is_empty() {
            return Err(unavailable(session, "session has no timing data"));
        }

        info!(
            event = %event.name,
            round = event.round,
            laps = laps.len(),
            "Session loaded from provider"
        );

        Ok(RawLapTable {
            session: session.clone(),
            event_name: event.name,
            round: event.round,
            laps,
        })
    }
}

fn unavailable(session: &SessionId, reason: impl Display) -> anyhow::Error {
    PipelineError::SourceUnavailable {
        session: session.to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Matches an event by round number or case-insensitive name.
fn find_event<'a>(events: &'a [ScheduledEvent], event: &str) -> Option<&'a ScheduledEvent> {
    let wanted = event.trim();
    if let Ok(round) = wanted.parse::<u32>() {
        return events.iter().find(|e| e.round == round);
    }
    events.iter().find(|e| e.name.eq_ignore_ascii_case(wanted))
}

/// Offset of the next laps page, or `None` once everything was read.
fn next_offset(offset: usize, received: usize, total: usize) -> Option<usize> {
    if received == 0 {
        return None;
    }
    let next = offset + received;
    (next < total).then_some(next)
}

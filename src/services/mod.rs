//! Service traits the pipeline depends on.

pub mod lap_source;

pub use lap_source::{LapSource, RawLap, RawLapTable, SessionId, SessionKind};

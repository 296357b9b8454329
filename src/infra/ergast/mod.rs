//! Historical timing data from an Ergast-compatible HTTP API.

mod client;

pub use client::{DEFAULT_BASE_URL, ErgastClient};

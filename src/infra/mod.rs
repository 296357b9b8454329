//! Concrete data sources.
//!
//! [`ergast::ErgastClient`] talks to the remote timing provider.
//! [`cache::CachedSource`] keeps fetched sessions on disk between runs.

pub mod cache;
pub mod ergast;

//! Joining, model fitting and ranking.
//!
//! This module joins the grid with historical lap times, fits a gradient
//! boosted ensemble mapping qualifying time to race lap time, evaluates it on
//! a held-out split and ranks the grid by predicted pace.

pub mod boosting;
pub mod join;
pub mod pipeline;
pub mod rank;
pub mod split;
pub mod types;
pub mod utility;

pub use pipeline::{predict_race, train_and_evaluate};

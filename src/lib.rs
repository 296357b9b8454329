pub mod error;
pub mod fetch;
pub mod grid;
pub mod infra;
pub mod laps;
pub mod output;
pub mod parser;
pub mod prediction;
pub mod services;

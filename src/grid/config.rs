use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::debug;

use super::{IdentityMap, ReferenceTable};
use crate::error::PipelineError;
use crate::prediction::types::ModelParams;

/// Reference table, identity map and model settings for one prediction.
///
/// Stored as JSON on disk:
/// ```json
/// {
///   "title": "2025 British Grand Prix",
///   "entries": [{ "driver": "Max Verstappen", "qualifying_time": 84.892 }],
///   "driver_codes": { "Max Verstappen": "VER" },
///   "model": { "n_estimators": 100, "learning_rate": 0.1, "seed": 39 }
/// }
/// ```
/// `model` and any of its fields may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub title: String,
    pub entries: ReferenceTable,
    pub driver_codes: IdentityMap,
    #[serde(default)]
    pub model: ModelParams,
}

impl GridConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading grid config {}", path.display()))?;
        let config: GridConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing grid config {}", path.display()))?;
        config.validate()?;
        debug!(
            path = %path.display(),
            entries = config.entries.len(),
            codes = config.driver_codes.len(),
            "Grid config loaded"
        );
        Ok(config)
    }

    /// Rejects configs the pipeline cannot run on.
    ///
    /// Names and codes must be unique, qualifying times finite and positive,
    /// and the model settings usable.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.entries.is_empty() {
            return Err(PipelineError::invalid_config("no grid entries"));
        }

        let mut names = HashSet::new();
        for row in self.entries.rows() {
            if !names.insert(row.driver.as_str()) {
                return Err(PipelineError::invalid_config(format!(
                    "duplicate driver '{}'",
                    row.driver
                )));
            }
            if !row.qualifying_time.is_finite() || row.qualifying_time <= 0.0 {
                return Err(PipelineError::invalid_config(format!(
                    "qualifying time {} of '{}' is not a positive number",
                    row.qualifying_time, row.driver
                )));
            }
        }

        let mut owners: BTreeMap<&str, &str> = BTreeMap::new();
        for (driver, code) in self.driver_codes.iter() {
            if code.trim().is_empty() {
                return Err(PipelineError::invalid_config(format!(
                    "empty code for '{driver}'"
                )));
            }
            if let Some(first) = owners.insert(code, driver) {
                return Err(PipelineError::invalid_config(format!(
                    "code '{code}' is assigned to both '{first}' and '{driver}'"
                )));
            }
        }

        let model = &self.model;
        if model.n_estimators == 0 {
            return Err(PipelineError::invalid_config("n_estimators must be at least 1"));
        }
        if !model.learning_rate.is_finite() || model.learning_rate <= 0.0 {
            return Err(PipelineError::invalid_config("learning_rate must be positive"));
        }
        if model.max_depth == 0 {
            return Err(PipelineError::invalid_config("max_depth must be at least 1"));
        }
        if !(0.0..1.0).contains(&model.test_fraction) {
            return Err(PipelineError::invalid_config("test_fraction must be in [0, 1)"));
        }

        Ok(())
    }

    /// The 2025 British Grand Prix grid with default model settings.
    pub fn british_grand_prix_2025() -> Self {
        let entries: ReferenceTable = [
            ("Max Verstappen", 84.892),
            ("Oscar Piastri", 84.995),
            ("Lando Norris", 85.010),
            ("George Russell", 85.029),
            ("Lewis Hamilton", 85.095),
            ("Charles Leclerc", 85.121),
            ("Kimi Antonelli", 85.374),
            ("Oliver Bearman", 85.471),
            ("Fernando Alonso", 85.621),
            ("Pierre Gasly", 85.785),
            ("Carlos Sainz", 85.746),
            ("Yuki Tsunoda", 85.826),
            ("Isack Hadjar", 85.864),
            ("Alexander Albon", 85.889),
            ("Esteban Ocon", 85.950),
            ("Liam Lawson", 86.440),
            ("Gabriel Bortoleto", 86.446),
            ("Lance Stroll", 86.504),
            ("Nico Hulkenberg", 86.574),
            ("Franco Colapinto", 87.060),
        ]
        .into_iter()
        .collect();

        let driver_codes: IdentityMap = [
            ("Max Verstappen", "VER"),
            ("Oscar Piastri", "PIA"),
            ("Lando Norris", "NOR"),
            ("George Russell", "RUS"),
            ("Lewis Hamilton", "HAM"),
            ("Charles Leclerc", "LEC"),
            ("Kimi Antonelli", "ANT"),
            ("Oliver Bearman", "BEA"),
            ("Fernando Alonso", "ALO"),
            ("Pierre Gasly", "GAS"),
            ("Carlos Sainz", "SAI"),
            ("Yuki Tsunoda", "TSU"),
            ("Isack Hadjar", "HAD"),
            ("Alexander Albon", "ALB"),
            ("Esteban Ocon", "OCO"),
            ("Liam Lawson", "LAW"),
            ("Gabriel Bortoleto", "BOR"),
            ("Lance Stroll", "STR"),
            ("Nico Hulkenberg", "HUL"),
            ("Franco Colapinto", "COL"),
        ]
        .into_iter()
        .collect();

        Self {
            title: "2025 British Grand Prix".to_string(),
            entries,
            driver_codes,
            model: ModelParams::default(),
        }
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self::british_grand_prix_2025()
    }
}

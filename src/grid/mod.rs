//! The current grid: qualifying times and driver identities.
//!
//! [`ReferenceTable`] holds the qualifying times by full driver name.
//! [`IdentityMap`] maps those names to the short codes the timing provider
//! uses. [`GridConfig`] bundles both with the model settings.

mod config;

pub use config::GridConfig;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceRow {
    pub driver: String,
    /// Qualifying lap in seconds.
    pub qualifying_time: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceTable {
    rows: Vec<ReferenceRow>,
}

impl ReferenceTable {
    pub fn new(rows: Vec<ReferenceRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[ReferenceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<(&'static str, f64)> for ReferenceTable {
    fn from_iter<I: IntoIterator<Item = (&'static str, f64)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(driver, qualifying_time)| ReferenceRow {
                    driver: driver.to_string(),
                    qualifying_time,
                })
                .collect(),
        )
    }
}

/// A reference row after identity lookup. `driver_code` is `None` when the
/// name has no entry in the [`IdentityMap`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualifyingEntry {
    pub driver: String,
    pub qualifying_time: f64,
    pub driver_code: Option<String>,
}

/// Maps full driver names to provider codes.
///
/// Stored as a plain JSON object:
/// ```json
/// { "Max Verstappen": "VER", "Lando Norris": "NOR" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityMap {
    codes: BTreeMap<String, String>,
}

impl IdentityMap {
    pub fn new(codes: BTreeMap<String, String>) -> Self {
        Self { codes }
    }

    /// Exact lookup; no trimming or case folding.
    pub fn code_for(&self, driver: &str) -> Option<&str> {
        self.codes.get(driver).map(String::as_str)
    }

    /// Attaches a code to every reference row. Never fails: unknown names
    /// get `None` and drop out at the join.
    pub fn resolve(&self, table: &ReferenceTable) -> Vec<QualifyingEntry> {
        table
            .rows()
            .iter()
            .map(|row| QualifyingEntry {
                driver: row.driver.clone(),
                qualifying_time: row.qualifying_time,
                driver_code: self.code_for(&row.driver).map(str::to_string),
            })
            .collect()
    }

    /// Iterates over all `(driver, code)` pairs in driver-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.codes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl FromIterator<(&'static str, &'static str)> for IdentityMap {
    fn from_iter<I: IntoIterator<Item = (&'static str, &'static str)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(driver, code)| (driver.to_string(), code.to_string()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> IdentityMap {
        [("Max Verstappen", "VER"), ("Lando Norris", "NOR")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_code_for_is_exact() {
        let m = map();
        assert_eq!(m.code_for("Max Verstappen"), Some("VER"));
        assert_eq!(m.code_for("max verstappen"), None);
        assert_eq!(m.code_for(" Max Verstappen"), None);
    }

    #[test]
    fn test_code_for_is_pure() {
        let m = map();
        let first = m.code_for("Lando Norris");
        for _ in 0..10 {
            assert_eq!(m.code_for("Lando Norris"), first);
            assert_eq!(m.code_for("Nobody"), None);
        }
    }

    #[test]
    fn test_resolve_keeps_unmapped_rows() {
        let table: ReferenceTable = [("Max Verstappen", 84.892), ("Alexander Alon", 85.889)]
            .into_iter()
            .collect();

        let entries = map().resolve(&table);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].driver_code.as_deref(), Some("VER"));
        assert_eq!(entries[1].driver, "Alexander Alon");
        assert_eq!(entries[1].driver_code, None);
        assert_eq!(entries[1].qualifying_time, 85.889);
    }

    #[test]
    fn test_json_shapes() {
        let m: IdentityMap = serde_json::from_str(r#"{"Oscar Piastri":"PIA"}"#).unwrap();
        assert_eq!(m.code_for("Oscar Piastri"), Some("PIA"));

        let t: ReferenceTable =
            serde_json::from_str(r#"[{"driver":"Oscar Piastri","qualifying_time":84.995}]"#)
                .unwrap();
        assert_eq!(t.rows()[0].qualifying_time, 84.995);
    }
}

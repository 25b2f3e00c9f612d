//! Units-inference report model.
//!
//! The report is a JSON object produced by the external units analysis:
//! detected errors (by root-token and token id), per-variable candidate
//! units sorted by likelihood, and per-token units for subexpressions.
//! Variable unit entries appear either as plain maps or wrapped in
//! single-element lists; both forms are accepted.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;
use crate::units::algebra::UnitMap;

/// One reported unit inconsistency.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitError {
    /// Root token of the offending statement.
    pub root_token_id: String,

    /// The operator token where units disagree.
    #[serde(rename = "token_id")]
    pub token_id: String,

    /// Error kind tag as reported upstream.
    pub error_type: String,
}

/// Inferred units for one variable.
#[derive(Debug, Clone, Deserialize)]
pub struct PhysVar {
    /// Variable id, matching the dump's variable ids.
    pub var_id: String,

    /// Variable name, for presentation only.
    pub var_name: String,

    /// Candidate units, most likely first.
    #[serde(deserialize_with = "unit_candidates")]
    pub units: Vec<UnitMap>,
}

/// A decoded units report.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnitsReport {
    /// Reported inconsistencies.
    #[serde(default)]
    pub errors: Vec<UnitError>,

    /// Per-variable inferred units.
    #[serde(default)]
    pub variables: Vec<PhysVar>,

    /// Per-token units for subexpressions.
    #[serde(default)]
    pub token_units: HashMap<String, UnitMap>,
}

impl UnitsReport {
    /// Decode a report from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and decode a report file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }
}

fn unit_candidates<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Vec<UnitMap>, D::Error> {
    let raw = Vec::<Value>::deserialize(deserializer)?;
    let mut units = Vec::with_capacity(raw.len());
    for entry in raw {
        let value = match entry {
            Value::Array(items) => match items.into_iter().next() {
                Some(first) => first,
                None => continue,
            },
            other => other,
        };
        units.push(serde_json::from_value(value).map_err(serde::de::Error::custom)?);
    }
    Ok(units)
}

/// Unit lookups keyed by the dump's id strings.
#[derive(Debug, Clone, Default)]
pub struct UnitCatalog {
    var_units: HashMap<String, Vec<UnitMap>>,
    token_units: HashMap<String, UnitMap>,
}

impl UnitCatalog {
    /// Index a report for lookup.
    pub fn new(report: &UnitsReport) -> Self {
        let mut catalog = UnitCatalog::default();
        for var in &report.variables {
            catalog.var_units.insert(var.var_id.clone(), var.units.clone());
        }
        for (token, unit) in &report.token_units {
            catalog.token_units.insert(token.clone(), unit.clone());
        }
        catalog
    }

    /// Most likely unit of a variable, by dump id.
    pub fn variable_unit(&self, ext_id: &str) -> Option<&UnitMap> {
        self.var_units.get(ext_id).and_then(|units| units.first())
    }

    /// Unit of a subexpression token, by dump id.
    pub fn token_unit(&self, ext_id: &str) -> Option<&UnitMap> {
        self.token_units.get(ext_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_both_unit_entry_shapes() {
        let text = r#"{
            "errors": [
                {"root_token_id": "t9", "token_id": "t5", "error_type": "ADDITION_OF_INCOMPATIBLE_UNITS"}
            ],
            "variables": [
                {"var_id": "v1", "var_name": "vel", "units": [{"m": 1.0, "s": -1.0}]},
                {"var_id": "v2", "var_name": "dt", "units": [[{"s": 1.0}], {"s": 2.0}]}
            ],
            "token_units": {"t5": {"m": 1.0}}
        }"#;

        let report = UnitsReport::from_json(text).unwrap();
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].token_id, "t5");

        let catalog = UnitCatalog::new(&report);
        let vel = catalog.variable_unit("v1").unwrap();
        assert_eq!(vel.get("m"), 1.0);
        assert_eq!(vel.get("s"), -1.0);

        // List-wrapped entries collapse to their first element.
        let dt = catalog.variable_unit("v2").unwrap();
        assert_eq!(dt.get("s"), 1.0);

        assert!(catalog.token_unit("t5").is_some());
        assert!(catalog.token_unit("t6").is_none());
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let report = UnitsReport::from_json("{}").unwrap();
        assert!(report.errors.is_empty());
        assert!(report.variables.is_empty());
        assert!(report.token_units.is_empty());
    }
}

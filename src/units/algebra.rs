//! Unit-map algebra.
//!
//! A unit is a map from dimension name (`"m"`, `"s"`, …) to a signed
//! exponent. Maps are kept canonical: zero exponents are pruned on every
//! operation, so two units compare equal exactly when they denote the same
//! physical dimension.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};

/// A physical unit as dimension → exponent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnitMap(BTreeMap<String, f64>);

impl UnitMap {
    /// The dimensionless unit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a raw map, pruning zero exponents.
    pub fn from_map(map: BTreeMap<String, f64>) -> Self {
        Self(map.into_iter().filter(|(_, e)| *e != 0.0).collect())
    }

    /// Set one dimension's exponent (zero removes it).
    pub fn insert(&mut self, dimension: &str, exponent: f64) {
        if exponent == 0.0 {
            self.0.remove(dimension);
        } else {
            self.0.insert(dimension.to_string(), exponent);
        }
    }

    /// Exponent of a dimension (zero when absent).
    pub fn get(&self, dimension: &str) -> f64 {
        self.0.get(dimension).copied().unwrap_or(0.0)
    }

    /// Whether the unit is dimensionless.
    pub fn is_dimensionless(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate dimensions and exponents.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(d, &e)| (d.as_str(), e))
    }

    /// `self · other`: exponents add.
    pub fn multiply(&self, other: &UnitMap) -> UnitMap {
        let mut out = self.clone();
        for (dimension, exponent) in other.iter() {
            out.insert(dimension, out.get(dimension) + exponent);
        }
        out
    }

    /// `self / other`: exponents subtract.
    pub fn divide(&self, other: &UnitMap) -> UnitMap {
        let mut out = self.clone();
        for (dimension, exponent) in other.iter() {
            out.insert(dimension, out.get(dimension) - exponent);
        }
        out
    }

    /// `self^power`: exponents scale.
    pub fn pow(&self, power: f64) -> UnitMap {
        let mut out = UnitMap::new();
        for (dimension, exponent) in self.iter() {
            out.insert(dimension, exponent * power);
        }
        out
    }

    /// The unit `self` must be multiplied by to become `target`.
    pub fn diff(&self, target: &UnitMap) -> UnitMap {
        target.divide(self)
    }
}

impl fmt::Display for UnitMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(d, e)| if e == 1.0 { d.to_string() } else { format!("{d}^{e}") })
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}

impl<'de> Deserialize<'de> for UnitMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = BTreeMap::<String, f64>::deserialize(deserializer)?;
        Ok(UnitMap::from_map(map))
    }
}

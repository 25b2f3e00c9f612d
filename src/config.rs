//! Operational configuration.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// PhysFix configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysfixConfig {
    /// Analysis configuration.
    pub analysis: AnalysisConfig,

    /// Output configuration.
    pub output: OutputConfig,
}

/// Analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Only analyze the named functions (empty = all).
    pub functions: Vec<String>,

    /// Bound on the multiply/divide chain length of the repair search.
    pub max_fix_depth: usize,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format: "yaml" or "json".
    pub format: String,
}

impl Default for PhysfixConfig {
    fn default() -> Self {
        Self { analysis: AnalysisConfig::default(), output: OutputConfig::default() }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { functions: Vec::new(), max_fix_depth: 5 }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { format: "yaml".to_string() }
    }
}

impl PhysfixConfig {
    /// Load a TOML config file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
        toml::from_str(&text).context("Failed to parse config")
    }

    /// Whether a function passes the name filter.
    pub fn wants_function(&self, name: &str) -> bool {
        self.analysis.functions.is_empty() || self.analysis.functions.iter().any(|f| f == name)
    }
}

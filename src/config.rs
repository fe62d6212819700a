//! Planner configuration

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::planner::DEFAULT_MAX_DEPTH;

/// Materials that are extracted rather than manufactured
pub const DEFAULT_RAW_RESOURCES: &[&str] = &[
    "ALO", "AMM", "AR", "AUO", "BER", "BOR", "BRM", "BTS", "CLI", "CUO", "F", "FEO", "GAL", "H",
    "H2O", "HAL", "HE", "HE3", "HEX", "LES", "LIO", "LST", "MAG", "MGS", "N", "NE", "O", "SCR",
    "SIO", "TAI", "TCO", "TIO", "TS", "ZIR",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Tickers that end recursion and are never scheduled
    pub raw_resources: Vec<String>,
    /// Preset recipe index per ambiguous ticker
    pub choices: HashMap<String, usize>,
    /// Deepest recipe chain allowed before the run is aborted
    pub max_depth: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            raw_resources: DEFAULT_RAW_RESOURCES.iter().map(|t| t.to_string()).collect(),
            choices: HashMap::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl PlannerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Apply choices given on the command line over the configured ones
    pub fn merge_choices(&mut self, overrides: impl IntoIterator<Item = (String, usize)>) {
        self.choices.extend(overrides);
    }
}

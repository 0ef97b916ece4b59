//! Search configuration.
//!
//! The defaults reproduce the fixed search policy: one chain, 20 MCMC steps,
//! at most 10 mutations per variant, every step retained, no debug output.
use crate::error::{EvoError, Result, Stage};
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::{Display, EnumIter, EnumString};
use validator::Validate;

/// Which variants the search engine reports.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OutputMode {
    /// Highest scoring variant per chain.
    Best,
    /// Final state of each chain.
    Last,
    /// Every step of every chain.
    #[default]
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder, Validate)]
#[serde(default)]
pub struct SearchConfig {
    #[builder(default = 1)]
    #[validate(range(min = 1))]
    pub parallel_chains: usize,

    /// MCMC steps per chain.
    #[builder(default = 20)]
    #[validate(range(min = 1))]
    pub n_steps: usize,

    /// Maximum cumulative mutations per variant.
    #[builder(default = 10)]
    #[validate(range(min = 1))]
    pub max_mutations: usize,

    #[builder(default)]
    pub output: OutputMode,

    #[builder(default)]
    pub verbose: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig::builder().build()
    }
}

impl SearchConfig {
    /// Load a JSON config; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            EvoError::config(Stage::Search, format!("cannot read {}: {e}", path.display()))
        })?;
        let config: SearchConfig = serde_json::from_str(&text).map_err(|e| {
            EvoError::config(Stage::Search, format!("invalid config {}: {e}", path.display()))
        })?;
        config.check()?;
        Ok(config)
    }

    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| EvoError::config(Stage::Search, e.to_string()))
    }
}

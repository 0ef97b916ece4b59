//! Scoring experts.
//!
//! An expert is an immutable sequence scorer bound to one loaded model, its
//! tokenizer, a device and a temperature. The search engine combines experts
//! as a product of experts, weighting each by its temperature.
mod esm;

pub use esm::EsmExpert;

use crate::checkpoints;
use crate::device::DeviceKind;
use crate::error::{EvoError, Result, Stage};
use crate::store::ModelStore;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Scoring temperature used unless overridden.
pub const DEFAULT_TEMPERATURE: f32 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ExpertName {
    /// ESM-2 masked language model.
    Esm,
}

/// Serialisable description of a built expert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertSpec {
    pub name: ExpertName,
    /// Canonical model identifier.
    pub checkpoint: String,
    pub temperature: f32,
    pub device: DeviceKind,
}

pub trait Expert {
    fn spec(&self) -> &ExpertSpec;

    /// Score each variant against the wild type. Higher is more favorable;
    /// a variant identical to the wild type scores zero.
    fn score(&self, wildtype: &str, variants: &[&str]) -> Result<Vec<f32>>;

    /// Score weighted by the expert temperature.
    fn weighted_score(&self, wildtype: &str, variants: &[&str]) -> Result<Vec<f32>> {
        let temperature = self.spec().temperature;
        Ok(self
            .score(wildtype, variants)?
            .into_iter()
            .map(|s| s * temperature)
            .collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpertOptions {
    pub temperature: f32,
}

impl Default for ExpertOptions {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

/// Build an expert. Names and checkpoint keys are checked before the store is
/// touched; `device: None` picks the best available device.
pub fn build_expert(
    name: &str,
    checkpoint_key: &str,
    device: Option<DeviceKind>,
    options: &ExpertOptions,
    store: &dyn ModelStore,
) -> Result<Box<dyn Expert>> {
    let expert_name = ExpertName::from_str(name)
        .map_err(|_| {
            EvoError::config(
                Stage::Registry,
                format!("unknown expert `{name}` (expected one of: {})", ExpertName::iter().join(", ")),
            )
        })?;
    let identifier = checkpoints::resolve(checkpoint_key)?;
    if !(options.temperature.is_finite() && options.temperature > 0.0) {
        return Err(EvoError::config(
            Stage::Registry,
            format!("temperature must be positive, got {}", options.temperature),
        ));
    }
    let device = device.unwrap_or_else(DeviceKind::detect);
    tracing::info!(expert = %expert_name, checkpoint = identifier, %device, "building expert");

    let spec = ExpertSpec {
        name: expert_name,
        checkpoint: identifier.to_string(),
        temperature: options.temperature,
        device,
    };
    match expert_name {
        ExpertName::Esm => Ok(Box::new(EsmExpert::load(spec, store)?)),
    }
}

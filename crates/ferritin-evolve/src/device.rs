//! Compute device selection.
//!
//! ```shell
//! cargo run --bin ferritin-evolve --features cuda -- evolve ...
//! ```
use crate::error::{EvoError, Result, Stage};
use candle_core::utils::cuda_is_available;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Kind of compute device a model is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Cpu,
    Cuda(usize),
    Metal(usize),
}

impl DeviceKind {
    /// Every device kind this build can use, most preferred first.
    /// `Cpu` is always last.
    pub fn available() -> Vec<DeviceKind> {
        let mut kinds = Vec::new();
        if cuda_is_available() {
            kinds.push(DeviceKind::Cuda(0));
        }
        kinds.push(DeviceKind::Cpu);
        kinds
    }

    /// The preferred accelerated device, falling back to the CPU.
    pub fn detect() -> DeviceKind {
        let kind = Self::available()
            .first()
            .copied()
            .unwrap_or(DeviceKind::Cpu);
        if kind == DeviceKind::Cpu {
            tracing::info!("Running on CPU, to run on GPU, build with `--features cuda`");
        }
        kind
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceKind::Cpu => write!(f, "cpu"),
            DeviceKind::Cuda(ordinal) => write!(f, "cuda:{ordinal}"),
            DeviceKind::Metal(ordinal) => write!(f, "metal:{ordinal}"),
        }
    }
}

impl FromStr for DeviceKind {
    type Err = EvoError;

    /// Accepts `cpu`, `cuda`, `cuda:N`, `metal` and `metal:N`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || EvoError::config(Stage::Load, format!("unknown device `{s}`"));
        let (kind, ordinal) = match s.split_once(':') {
            Some((kind, ordinal)) => (kind, Some(ordinal.parse::<usize>().map_err(|_| invalid())?)),
            None => (s, None),
        };
        match kind.to_ascii_lowercase().as_str() {
            "cpu" if ordinal.is_none() => Ok(DeviceKind::Cpu),
            "cuda" => Ok(DeviceKind::Cuda(ordinal.unwrap_or(0))),
            "metal" => Ok(DeviceKind::Metal(ordinal.unwrap_or(0))),
            _ => Err(invalid()),
        }
    }
}

impl Serialize for DeviceKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DeviceKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

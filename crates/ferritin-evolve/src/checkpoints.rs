//! ESM-2 checkpoint registry.
//!
//! Short mnemonic keys mapped to the canonical Hugging Face identifiers of the
//! ESM-2 masked language models. Adding a checkpoint is one table entry.
//!
//! See <https://huggingface.co/facebook/esm2_t33_650M_UR50D>.
use crate::error::{EvoError, Result, Stage};

pub const ESM2_T48_15B: &str = "facebook/esm2_t48_15B_UR50D";
pub const ESM2_T36_3B: &str = "facebook/esm2_t36_3B_UR50D";
pub const ESM2_T33_650M: &str = "facebook/esm2_t33_650M_UR50D";
pub const ESM2_T30_150M: &str = "facebook/esm2_t30_150M_UR50D";
pub const ESM2_T12_35M: &str = "facebook/esm2_t12_35M_UR50D";
pub const ESM2_T6_8M: &str = "facebook/esm2_t6_8M_UR50D";

pub const DEFAULT_CHECKPOINT: &str = "default";

#[rustfmt::skip]
const CHECKPOINTS: &[(&str, &str)] = &[
    ("t48_15B",          ESM2_T48_15B),
    ("t36_3B",           ESM2_T36_3B),
    ("t33_650M",         ESM2_T33_650M),
    ("t30_150M",         ESM2_T30_150M),
    ("t12_35M",          ESM2_T12_35M),
    ("t6/8M",            ESM2_T6_8M),
    (DEFAULT_CHECKPOINT, ESM2_T30_150M),
];

/// Resolve a checkpoint key to its canonical model identifier.
///
/// Lookup is exact; there is no fallback to the default for unknown keys.
pub fn resolve(key: &str) -> Result<&'static str> {
    CHECKPOINTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, id)| *id)
        .ok_or_else(|| {
            EvoError::config(
                Stage::Registry,
                format!(
                    "unknown checkpoint `{key}` (expected one of: {})",
                    CHECKPOINTS
                        .iter()
                        .map(|(k, _)| *k)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            )
        })
}

/// All `(key, identifier)` pairs in declaration order.
pub fn checkpoints() -> impl Iterator<Item = (&'static str, &'static str)> {
    CHECKPOINTS.iter().copied()
}

//! Model store.
//!
//! The masked language model and its tokenizer are external collaborators: a
//! [`ModelStore`] fetches them by canonical identifier and hands back a
//! [`MaskedLanguageModel`] that only has to produce logits.
pub mod onnx;

use crate::device::DeviceKind;
use crate::error::{EvoError, Result};
use candle_core::Tensor;
use tokenizers::Tokenizer;

pub use onnx::{HubModelStore, OnnxEsm2};

/// Anything that maps token ids to per-position vocabulary logits.
pub trait MaskedLanguageModel {
    /// `token_ids` is one tokenized sequence including special tokens.
    /// Returns logits of shape `[1, token_ids.len(), vocab_size]`.
    fn logits(&self, token_ids: &[u32]) -> Result<Tensor>;

    fn device(&self) -> DeviceKind;
}

pub trait ModelStore {
    fn load_model(&self, identifier: &str, device: DeviceKind) -> Result<Box<dyn MaskedLanguageModel>>;
    fn load_tokenizer(&self, identifier: &str) -> Result<Tokenizer>;
}

/// The ESM-2 vocabulary, shared by every ESM-2 checkpoint.
pub fn esm2_tokenizer() -> Result<Tokenizer> {
    let tokenizer_bytes = include_bytes!("tokenizer.json");
    Tokenizer::from_bytes(tokenizer_bytes)
        .map_err(|e| EvoError::model_load("esm2 tokenizer", format!("Failed to load tokenizer: {e}")))
}

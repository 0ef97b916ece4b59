use super::{Expert, ExpertSpec};
use crate::error::{EvoError, Result, Stage};
use crate::store::{MaskedLanguageModel, ModelStore};
use candle_core::{Tensor, D};
use tokenizers::Tokenizer;

/// ESM-2 expert.
///
/// The score of a variant is the sum over positions of
/// `log p(variant residue) - log p(wild-type residue)`, both read from the
/// model's output on the variant.
pub struct EsmExpert {
    spec: ExpertSpec,
    model: Box<dyn MaskedLanguageModel>,
    tokenizer: Tokenizer,
}

impl EsmExpert {
    pub fn load(mut spec: ExpertSpec, store: &dyn ModelStore) -> Result<Self> {
        let tokenizer = store.load_tokenizer(&spec.checkpoint)?;
        let model = store.load_model(&spec.checkpoint, spec.device)?;
        // the store may have fallen back to another device
        spec.device = model.device();
        Ok(Self::new(spec, model, tokenizer))
    }

    pub fn new(spec: ExpertSpec, model: Box<dyn MaskedLanguageModel>, tokenizer: Tokenizer) -> Self {
        Self {
            spec,
            model,
            tokenizer,
        }
    }

    fn encode(&self, sequence: &str) -> Result<Vec<u32>> {
        Ok(self
            .tokenizer
            .encode(sequence, true)
            .map_err(|e| EvoError::SequenceFormat(format!("tokenization failed: {e}")))?
            .get_ids()
            .to_vec())
    }

    fn score_one(&self, wildtype_ids: &[u32], variant: &str) -> Result<f32> {
        let variant_ids = self.encode(variant)?;
        let logits = self.model.logits(&variant_ids)?;
        log_likelihood_ratio(&logits, &variant_ids, wildtype_ids)
            .map_err(|e| EvoError::from_runtime(Stage::Search, e, EvoError::Evolution))
    }
}

fn log_likelihood_ratio(logits: &Tensor, variant_ids: &[u32], wildtype_ids: &[u32]) -> candle_core::Result<f32> {
    let logits = logits.squeeze(0)?;
    let log_probs = candle_nn::ops::log_softmax(&logits, D::Minus1)?;
    let gather = |ids: &[u32]| -> candle_core::Result<Tensor> {
        let index = Tensor::new(ids, logits.device())?.unsqueeze(1)?;
        log_probs.gather(&index, 1)?.squeeze(1)
    };
    let variant_lp = gather(variant_ids)?;
    let wildtype_lp = gather(wildtype_ids)?;
    (variant_lp - wildtype_lp)?.sum_all()?.to_scalar::<f32>()
}

impl Expert for EsmExpert {
    fn spec(&self) -> &ExpertSpec {
        &self.spec
    }

    fn score(&self, wildtype: &str, variants: &[&str]) -> Result<Vec<f32>> {
        let wildtype_ids = self.encode(wildtype)?;
        variants
            .iter()
            .enumerate()
            .map(|(i, variant)| {
                if variant.len() != wildtype.len() {
                    return Err(EvoError::SequenceFormat(format!(
                        "variant {i} has length {}, wild type has length {}",
                        variant.len(),
                        wildtype.len()
                    )));
                }
                self.score_one(&wildtype_ids, variant)
            })
            .collect()
    }
}

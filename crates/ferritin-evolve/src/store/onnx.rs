//! ESM-2 masked language models converted to ONNX format from
//! [ESM2](https://github.com/facebookresearch/esm) and uploaded to the HuggingFace hub.
//! The tokenizer is included in this crate and loaded from memory using `tokenizer.json`.
//!
//! # Models:
//! * ESM2_T6_8M - small 6-layer protein language model
//! * ESM2_T12_35M - medium 12-layer protein language model
//! * ESM2_T30_150M - large 30-layer protein language model
//!
//! The larger checkpoints have no published ONNX export; loading them fails
//! with a model-load error.
use super::{esm2_tokenizer, MaskedLanguageModel, ModelStore};
use crate::checkpoints::{ESM2_T12_35M, ESM2_T30_150M, ESM2_T6_8M};
use crate::device::DeviceKind;
use crate::error::{EvoError, Result, Stage};
use candle_core::{Device, Tensor};
use hf_hub::api::sync::{Api, ApiBuilder};
use ndarray::Array2;
use ort::execution_providers::CUDAExecutionProvider;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

const MODEL_FILE: &str = "model.onnx";

/// Hub repository holding the ONNX export of a canonical checkpoint.
pub fn onnx_repo(identifier: &str) -> Option<&'static str> {
    match identifier {
        ESM2_T6_8M => Some("zcpbx/esm2-t6-8m-UR50D-onnx"),
        ESM2_T12_35M => Some("zcpbx/esm2-t12-35M-UR50D-onnx"),
        ESM2_T30_150M => Some("zcpbx/esm2-t30-150M-UR50D-onnx"),
        _ => None,
    }
}

/// Fetches ONNX exports from the HuggingFace hub, or from a local directory.
#[derive(Debug, Clone)]
pub struct HubModelStore {
    source: Source,
    intra_threads: usize,
}

#[derive(Debug, Clone)]
enum Source {
    Hub { cache_dir: Option<PathBuf> },
    Dir(PathBuf),
}

impl Default for HubModelStore {
    fn default() -> Self {
        Self {
            source: Source::Hub { cache_dir: None },
            intra_threads: 1,
        }
    }
}

impl HubModelStore {
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Hub {
                cache_dir: Some(cache_dir.into()),
            },
            ..Self::default()
        }
    }

    /// Use `dir/model.onnx` for every identifier instead of downloading.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            source: Source::Dir(dir.into()),
            ..Self::default()
        }
    }

    pub fn intra_threads(mut self, n: usize) -> Self {
        self.intra_threads = n.max(1);
        self
    }

    fn api(&self, cache_dir: &Option<PathBuf>) -> std::result::Result<Api, hf_hub::api::sync::ApiError> {
        match cache_dir {
            Some(dir) => ApiBuilder::new().with_cache_dir(dir.clone()).build(),
            None => Api::new(),
        }
    }

    fn model_path(&self, identifier: &str) -> Result<PathBuf> {
        match &self.source {
            Source::Dir(dir) => {
                let path = dir.join(MODEL_FILE);
                if path.is_file() {
                    Ok(path)
                } else {
                    Err(EvoError::model_load(
                        identifier,
                        format!("{} does not exist", path.display()),
                    ))
                }
            }
            Source::Hub { cache_dir } => {
                let repo_id = onnx_repo(identifier).ok_or_else(|| {
                    EvoError::model_load(identifier, "no ONNX export is published for this checkpoint")
                })?;
                let api = self
                    .api(cache_dir)
                    .map_err(|e| EvoError::model_load(identifier, e))?;
                tracing::info!(repo = repo_id, "fetching {MODEL_FILE}");
                api.model(repo_id.to_string())
                    .get(MODEL_FILE)
                    .map_err(|e| EvoError::model_load(identifier, e))
            }
        }
    }
}

impl ModelStore for HubModelStore {
    fn load_model(&self, identifier: &str, device: DeviceKind) -> Result<Box<dyn MaskedLanguageModel>> {
        let model_path = self.model_path(identifier)?;
        let model = OnnxEsm2::load(identifier, &model_path, device, self.intra_threads)?;
        Ok(Box::new(model))
    }

    fn load_tokenizer(&self, identifier: &str) -> Result<Tokenizer> {
        if !identifier.contains("esm2") && matches!(self.source, Source::Hub { .. }) {
            return Err(EvoError::model_load(identifier, "no tokenizer for non ESM-2 checkpoints"));
        }
        esm2_tokenizer()
    }
}

/// An ESM-2 ONNX graph executed by ONNX Runtime.
pub struct OnnxEsm2 {
    session: Session,
    device: DeviceKind,
}

impl OnnxEsm2 {
    pub fn load(identifier: &str, model_path: &Path, device: DeviceKind, intra_threads: usize) -> Result<Self> {
        let load_error = |e: ort::Error| {
            EvoError::from_runtime(Stage::Load, e, |reason| EvoError::model_load(identifier, reason))
        };
        let mut builder = Session::builder()
            .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level1))
            .and_then(|b| b.with_intra_threads(intra_threads))
            .map_err(load_error)?;
        let device = match device {
            DeviceKind::Cuda(ordinal) => {
                builder = builder
                    .with_execution_providers([CUDAExecutionProvider::default()
                        .with_device_id(ordinal as i32)
                        .build()])
                    .map_err(load_error)?;
                device
            }
            DeviceKind::Metal(_) => {
                tracing::warn!("no ONNX Runtime provider for {device}, running {identifier} on CPU");
                DeviceKind::Cpu
            }
            DeviceKind::Cpu => device,
        };
        tracing::info!(model = identifier, path = %model_path.display(), %device, "loading ONNX session");
        let session = builder.commit_from_file(model_path).map_err(load_error)?;
        Ok(Self { session, device })
    }
}

impl MaskedLanguageModel for OnnxEsm2 {
    fn logits(&self, token_ids: &[u32]) -> Result<Tensor> {
        let runtime_error =
            |e: ort::Error| EvoError::from_runtime(Stage::Search, e, EvoError::Evolution);

        // since we are taking a single string we set the first <batch> dimension == 1.
        let shape = (1, token_ids.len());
        let tokens_array: Array2<i64> =
            Array2::from_shape_vec(shape, token_ids.iter().map(|&x| x as i64).collect())
                .map_err(|e| EvoError::Evolution(e.to_string()))?;
        let mask_array: Array2<i64> = Array2::ones(shape);

        let inputs = ort::inputs!["input_ids" => tokens_array, "attention_mask" => mask_array]
            .map_err(runtime_error)?;
        let outputs = self.session.run(inputs).map_err(runtime_error)?;
        let logits = outputs
            .get("logits")
            .ok_or_else(|| EvoError::Evolution("model produced no `logits` output".into()))?
            .try_extract_tensor::<f32>()
            .map_err(runtime_error)?;

        //     <Batch> <SeqLength> <Vocab>
        let dims = logits.shape().to_vec();
        let values: Vec<f32> = logits.iter().copied().collect();
        Tensor::from_vec(values, dims.as_slice(), &Device::Cpu)
            .map_err(|e| EvoError::Evolution(e.to_string()))
    }

    fn device(&self) -> DeviceKind {
        self.device
    }
}

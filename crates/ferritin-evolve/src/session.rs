//! Evolution session: one loaded expert, reused across runs.
use crate::config::SearchConfig;
use crate::device::DeviceKind;
use crate::error::Result;
use crate::expert::{build_expert, Expert, ExpertOptions};
use crate::search::{evolve, SearchEngine};
use crate::store::{HubModelStore, ModelStore};
use crate::table::{self, ResultTable};

/// Owns an expert and a search engine. Each [`EvolutionSession::run`] is
/// independent of the previous ones apart from reusing the loaded expert.
pub struct EvolutionSession {
    expert: Box<dyn Expert>,
    engine: Box<dyn SearchEngine>,
    config: SearchConfig,
}

impl EvolutionSession {
    /// Load `expert_name` at `checkpoint_key` from the HuggingFace hub on the
    /// best available device.
    pub fn new(
        expert_name: &str,
        checkpoint_key: &str,
        engine: impl SearchEngine + 'static,
    ) -> Result<Self> {
        Self::load(
            expert_name,
            checkpoint_key,
            None,
            &ExpertOptions::default(),
            &HubModelStore::default(),
            engine,
        )
    }

    pub fn load(
        expert_name: &str,
        checkpoint_key: &str,
        device: Option<DeviceKind>,
        options: &ExpertOptions,
        store: &dyn ModelStore,
        engine: impl SearchEngine + 'static,
    ) -> Result<Self> {
        let expert = build_expert(expert_name, checkpoint_key, device, options, store)?;
        Ok(Self::from_parts(expert, engine))
    }

    pub fn from_parts(expert: Box<dyn Expert>, engine: impl SearchEngine + 'static) -> Self {
        Self {
            expert,
            engine: Box::new(engine),
            config: SearchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn expert(&self) -> &dyn Expert {
        self.expert.as_ref()
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Evolve `raw_sequence` and rank the resulting variants.
    pub fn run(&self, raw_sequence: &str) -> Result<ResultTable> {
        let output = evolve(raw_sequence, self.expert(), &self.config, self.engine.as_ref())?;
        table::format(raw_sequence, &output.variants, &output.scores)
    }
}

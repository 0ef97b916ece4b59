use candle_core::{Device, Tensor};
use ferritin_evolve::store::esm2_tokenizer;
use ferritin_evolve::{
    build_expert, DeviceKind, EvoError, EvolutionSession, Expert, ExpertOptions, MaskedLanguageModel,
    ModelStore, Result, SearchConfig, SearchEngine, SearchOutput, Stage,
};
use std::cell::{Cell, RefCell};
use std::path::Path;
use tokenizers::Tokenizer;

const VOCAB: usize = 33;

/// Logit 5.0 on leucine at every position.
struct LeucineModel;

impl MaskedLanguageModel for LeucineModel {
    fn logits(&self, token_ids: &[u32]) -> Result<Tensor> {
        let mut values = vec![0f32; token_ids.len() * VOCAB];
        for row in values.chunks_mut(VOCAB) {
            row[4] = 5.0;
        }
        Tensor::from_vec(values, (1, token_ids.len(), VOCAB), &Device::Cpu)
            .map_err(|e| EvoError::Evolution(e.to_string()))
    }

    fn device(&self) -> DeviceKind {
        DeviceKind::Cpu
    }
}

#[derive(Default)]
struct CountingStore {
    models: Cell<usize>,
    tokenizers: Cell<usize>,
    last_identifier: RefCell<Option<String>>,
}

impl ModelStore for CountingStore {
    fn load_model(&self, identifier: &str, _device: DeviceKind) -> Result<Box<dyn MaskedLanguageModel>> {
        self.models.set(self.models.get() + 1);
        *self.last_identifier.borrow_mut() = Some(identifier.to_string());
        Ok(Box::new(LeucineModel))
    }

    fn load_tokenizer(&self, _identifier: &str) -> Result<Tokenizer> {
        self.tokenizers.set(self.tokenizers.get() + 1);
        esm2_tokenizer()
    }
}

/// Returns the same canned output for every call.
struct CannedSearch(SearchOutput);

impl SearchEngine for CannedSearch {
    fn run_search(&self, _wt_fasta: &Path, _experts: &[&dyn Expert], _config: &SearchConfig) -> Result<SearchOutput> {
        Ok(self.0.clone())
    }
}

/// Scores every single-site leucine substitution with the first expert.
struct LeucineScan;

impl SearchEngine for LeucineScan {
    fn run_search(&self, wt_fasta: &Path, experts: &[&dyn Expert], config: &SearchConfig) -> Result<SearchOutput> {
        let wildtype = ferritin_evolve::fasta::read_first(wt_fasta)?.sequence;
        let variants: Vec<String> = (0..wildtype.len())
            .take(config.n_steps)
            .map(|i| {
                let mut v = wildtype.clone().into_bytes();
                v[i] = b'L';
                String::from_utf8(v).unwrap()
            })
            .collect();
        let refs: Vec<&str> = variants.iter().map(String::as_str).collect();
        let scores = experts[0].weighted_score(&wildtype, &refs)?;
        Ok(SearchOutput {
            variants,
            scores: scores.into_iter().map(f64::from).collect(),
        })
    }
}

fn canned(variants: &[&str], scores: &[f64]) -> CannedSearch {
    CannedSearch(SearchOutput {
        variants: variants.iter().map(|s| s.to_string()).collect(),
        scores: scores.to_vec(),
    })
}

fn session(store: &CountingStore, engine: impl SearchEngine + 'static) -> EvolutionSession {
    EvolutionSession::load("esm", "t6/8M", Some(DeviceKind::Cpu), &ExpertOptions::default(), store, engine).unwrap()
}

#[test]
fn unknown_checkpoint_fails_before_loading() {
    let store = CountingStore::default();
    let err = build_expert("esm", "nonexistent", None, &ExpertOptions::default(), &store)
        .err()
        .unwrap();
    assert!(matches!(err, EvoError::Configuration { stage: Stage::Registry, .. }));
    assert_eq!(store.models.get(), 0);
    assert_eq!(store.tokenizers.get(), 0);
}

#[test]
fn unknown_expert_fails_before_loading() {
    let store = CountingStore::default();
    let err = build_expert("amplify", "default", None, &ExpertOptions::default(), &store)
        .err()
        .unwrap();
    assert!(matches!(err, EvoError::Configuration { .. }));
    assert!(err.to_string().contains("amplify"));
    assert_eq!(store.models.get(), 0);
}

#[test]
fn bad_temperature_is_rejected() {
    let store = CountingStore::default();
    let options = ExpertOptions { temperature: 0.0 };
    let err = build_expert("esm", "default", None, &options, &store).err().unwrap();
    assert!(matches!(err, EvoError::Configuration { .. }));
    assert_eq!(store.models.get(), 0);
}

#[test]
fn expert_is_bound_to_the_resolved_checkpoint() {
    let store = CountingStore::default();
    let expert = build_expert("esm", "default", Some(DeviceKind::Cpu), &ExpertOptions::default(), &store).unwrap();
    let spec = expert.spec();
    assert_eq!(spec.checkpoint, "facebook/esm2_t30_150M_UR50D");
    assert_eq!(spec.temperature, 0.95);
    assert_eq!(spec.device, DeviceKind::Cpu);
    assert_eq!(store.last_identifier.borrow().as_deref(), Some("facebook/esm2_t30_150M_UR50D"));
    assert_eq!((store.models.get(), store.tokenizers.get()), (1, 1));
}

#[test]
fn single_substitution_scenario() {
    let store = CountingStore::default();
    let session = session(&store, canned(&["MKTAYLAK"], &[0.73]));
    let table = session.run("MKTAYIAK").unwrap();

    assert_eq!(table.len(), 1);
    let record = table.best().unwrap();
    assert_eq!(record.rank, 0);
    assert_eq!(record.pos, vec![5]);
    assert_eq!(record.source, vec!['I']);
    assert_eq!(record.target, vec!['L']);
    assert_eq!(record.score, 0.73);
    assert_eq!(record.sequence, "MKTAYLAK");
}

#[test]
fn unchanged_candidates_scenario() {
    let store = CountingStore::default();
    let session = session(&store, canned(&["MKTAYIAK", "MKTAYIAK"], &[0.1, 0.9]));
    let table = session.run("MKTAYIAK").unwrap();

    let scores: Vec<f64> = table.iter().map(|r| r.score).collect();
    assert_eq!(scores, vec![0.9, 0.1]);
    assert!(table.iter().all(|r| r.pos.is_empty() && r.source.is_empty() && r.target.is_empty()));
}

#[test]
fn length_mismatch_scenario() {
    let store = CountingStore::default();
    let session = session(&store, canned(&["MKTAYLAK", "MKTAYLAKQ"], &[0.73, 0.5]));
    let err = session.run("MKTAYIAK").unwrap_err();
    assert!(matches!(err, EvoError::Format(_)));
    assert_eq!(err.stage(), Stage::Format);
}

#[test]
fn expert_is_reused_across_runs() {
    let store = CountingStore::default();
    let session = session(&store, LeucineScan);
    let first = session.run("MKTAYIAK").unwrap();
    let second = session.run("MKTAYIAK").unwrap();
    assert_eq!(first, second);
    assert_eq!(store.models.get(), 1);

    // no leucine in the wild type, so every swap gains the same
    let best = first.best().unwrap();
    assert!((best.score - 5.0 * 0.95).abs() < 1e-4);
    assert_eq!(best.target, vec!['L']);
    assert_eq!(first.mutated().count(), 8);
}

#[test]
fn search_config_reaches_the_engine() {
    let store = CountingStore::default();
    let config = SearchConfig::builder().n_steps(3).build();
    let session = session(&store, LeucineScan).with_config(config);
    let table = session.run("MKTAYIAK").unwrap();
    assert_eq!(table.len(), 3);
}

#[test]
fn invalid_sequence_is_rejected() {
    let store = CountingStore::default();
    let session = session(&store, canned(&[], &[]));
    assert!(matches!(session.run(""), Err(EvoError::SequenceFormat(_))));
    assert!(matches!(session.run("MKT AYIAK"), Err(EvoError::SequenceFormat(_))));
}

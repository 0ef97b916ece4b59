//! Directed evolution driver.
//!
//! The MCMC search itself is an external collaborator behind [`SearchEngine`].
//! [`evolve`] writes the wild type to a scoped FASTA file, hands it to the
//! engine once, and returns the raw variants and scores.
pub mod external;

pub use external::ExternalSearch;

use crate::config::SearchConfig;
use crate::error::{EvoError, Result};
use crate::expert::Expert;
use crate::fasta::{ScopedFasta, INPUT_LABEL};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw search result: parallel lists of candidate sequences and scores, in
/// whatever order the engine produced them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutput {
    pub variants: Vec<String>,
    pub scores: Vec<f64>,
}

pub trait SearchEngine {
    /// Run the search from the single-record FASTA at `wt_fasta`.
    fn run_search(
        &self,
        wt_fasta: &Path,
        experts: &[&dyn Expert],
        config: &SearchConfig,
    ) -> Result<SearchOutput>;
}

/// Run one directed evolution search on `raw_sequence`.
///
/// The input FASTA is removed before this returns, whatever the outcome.
pub fn evolve(
    raw_sequence: &str,
    expert: &dyn Expert,
    config: &SearchConfig,
    engine: &dyn SearchEngine,
) -> Result<SearchOutput> {
    config.check()?;
    check_sequence(raw_sequence)?;

    let fasta = ScopedFasta::write(INPUT_LABEL, raw_sequence)?;
    tracing::debug!(path = %fasta.path().display(), ?config, "wrote search input");
    tracing::info!(
        length = raw_sequence.len(),
        chains = config.parallel_chains,
        steps = config.n_steps,
        "starting directed evolution"
    );
    let output = engine.run_search(fasta.path(), &[expert], config)?;
    tracing::info!(variants = output.variants.len(), "directed evolution finished");
    Ok(output)
}

/// Reject inputs that cannot be written as a single FASTA record. Residue
/// validity is left to the search engine.
fn check_sequence(raw_sequence: &str) -> Result<()> {
    if raw_sequence.is_empty() {
        return Err(EvoError::SequenceFormat("empty sequence".into()));
    }
    if let Some((i, c)) = raw_sequence
        .char_indices()
        .find(|(_, c)| c.is_whitespace() || *c == '>')
    {
        return Err(EvoError::SequenceFormat(format!(
            "unexpected {c:?} at offset {i}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceKind;
    use crate::expert::{ExpertName, ExpertSpec};
    use crate::fasta::read_first;
    use std::cell::RefCell;
    use std::path::PathBuf;

    struct NullExpert(ExpertSpec);

    impl Expert for NullExpert {
        fn spec(&self) -> &ExpertSpec {
            &self.0
        }
        fn score(&self, _wildtype: &str, variants: &[&str]) -> Result<Vec<f32>> {
            Ok(vec![0.0; variants.len()])
        }
    }

    fn expert() -> NullExpert {
        NullExpert(ExpertSpec {
            name: ExpertName::Esm,
            checkpoint: "test".into(),
            temperature: 1.0,
            device: DeviceKind::Cpu,
        })
    }

    /// Echoes the FASTA input back as its only variant and remembers the path.
    #[derive(Default)]
    struct EchoSearch {
        seen: RefCell<Option<(PathBuf, usize)>>,
        fail: Option<fn() -> EvoError>,
    }

    impl SearchEngine for EchoSearch {
        fn run_search(
            &self,
            wt_fasta: &Path,
            experts: &[&dyn Expert],
            _config: &SearchConfig,
        ) -> Result<SearchOutput> {
            *self.seen.borrow_mut() = Some((wt_fasta.to_path_buf(), experts.len()));
            if let Some(fail) = self.fail {
                return Err(fail());
            }
            let record = read_first(wt_fasta)?;
            assert_eq!(record.label, INPUT_LABEL);
            Ok(SearchOutput {
                variants: vec![record.sequence],
                scores: vec![1.0],
            })
        }
    }

    #[test]
    fn hands_the_sequence_to_the_engine_and_cleans_up() {
        let engine = EchoSearch::default();
        let output = evolve("MKTAYIAK", &expert(), &SearchConfig::default(), &engine).unwrap();
        assert_eq!(output.variants, vec!["MKTAYIAK".to_string()]);

        let (path, n_experts) = engine.seen.borrow().clone().unwrap();
        assert_eq!(n_experts, 1);
        assert!(!path.exists());
    }

    #[test]
    fn engine_errors_propagate_and_still_clean_up() {
        let engine = EchoSearch {
            fail: Some(|| EvoError::ResourceExhausted {
                stage: crate::error::Stage::Search,
                reason: "CUDA out of memory".into(),
            }),
            ..Default::default()
        };
        let err = evolve("MKTAYIAK", &expert(), &SearchConfig::default(), &engine).unwrap_err();
        assert!(matches!(err, EvoError::ResourceExhausted { .. }));
        let (path, _) = engine.seen.borrow().clone().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn invalid_input_never_reaches_the_engine() {
        let engine = EchoSearch::default();
        let err = evolve("", &expert(), &SearchConfig::default(), &engine).unwrap_err();
        assert!(matches!(err, EvoError::SequenceFormat(_)));

        let config = SearchConfig::builder().parallel_chains(0).build();
        let err = evolve("MKTAYIAK", &expert(), &config, &engine).unwrap_err();
        assert!(matches!(err, EvoError::Configuration { .. }));
        assert!(engine.seen.borrow().is_none());
    }

    #[test]
    fn sequence_checks() {
        assert!(check_sequence("MKTAYIAK").is_ok());
        assert!(matches!(check_sequence("MKT AYIAK"), Err(EvoError::SequenceFormat(_))));
        assert!(matches!(check_sequence("MKT\nAYIAK"), Err(EvoError::SequenceFormat(_))));
        assert!(matches!(check_sequence(">MKT"), Err(EvoError::SequenceFormat(_))));
    }
}

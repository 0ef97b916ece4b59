//! Search engine running in a separate process.
//!
//! The program is invoked as
//!
//! ```text
//! <program> [args...] --wt-fasta <path> --output all --parallel-chains 1 \
//!     --n-steps 20 --max-mutations 10 --experts '<json>' [--verbose]
//! ```
//!
//! and must print a single JSON object on stdout, either
//! `{"status": "ok", "variants": [...], "scores": [...]}` or
//! `{"status": "error", "kind": "sequence_format" | "resource_exhausted" | "internal", "message": "..."}`.
use super::{SearchEngine, SearchOutput};
use crate::config::SearchConfig;
use crate::error::{EvoError, Result, Stage};
use crate::expert::{Expert, ExpertSpec};
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

const STDERR_TAIL: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Response {
    Ok { variants: Vec<String>, scores: Vec<f64> },
    Error { kind: FailureKind, message: String },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum FailureKind {
    SequenceFormat,
    ResourceExhausted,
    Internal,
}

#[derive(Debug, Clone)]
pub struct ExternalSearch {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalSearch {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Leading arguments passed before the search options, e.g. a script path.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn command(&self, wt_fasta: &Path, experts: &[ExpertSpec], config: &SearchConfig) -> Result<Command> {
        let experts = serde_json::to_string(experts)
            .map_err(|e| EvoError::Evolution(format!("cannot encode experts: {e}")))?;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--wt-fasta")
            .arg(wt_fasta)
            .arg("--output")
            .arg(config.output.to_string())
            .arg("--parallel-chains")
            .arg(config.parallel_chains.to_string())
            .arg("--n-steps")
            .arg(config.n_steps.to_string())
            .arg("--max-mutations")
            .arg(config.max_mutations.to_string())
            .arg("--experts")
            .arg(experts);
        if config.verbose {
            cmd.arg("--verbose");
        }
        Ok(cmd)
    }
}

impl SearchEngine for ExternalSearch {
    fn run_search(
        &self,
        wt_fasta: &Path,
        experts: &[&dyn Expert],
        config: &SearchConfig,
    ) -> Result<SearchOutput> {
        let specs: Vec<ExpertSpec> = experts.iter().map(|e| e.spec().clone()).collect();
        let mut cmd = self.command(wt_fasta, &specs, config)?;
        tracing::debug!(?cmd, "spawning search");

        let output = cmd.output().map_err(|e| {
            EvoError::Evolution(format!("cannot run {}: {e}", self.program.display()))
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if config.verbose && !stderr.is_empty() {
            tracing::info!("{}", stderr.trim_end());
        }

        match serde_json::from_str::<Response>(stdout.trim()) {
            Ok(Response::Ok { .. }) if !output.status.success() => Err(EvoError::Evolution(format!(
                "{} reported results but exited with {}; stderr: {}",
                self.program.display(),
                output.status,
                tail(&stderr, STDERR_TAIL)
            ))),
            Ok(Response::Ok { variants, scores }) => Ok(SearchOutput { variants, scores }),
            Ok(Response::Error { kind, message }) => Err(match kind {
                FailureKind::SequenceFormat => EvoError::SequenceFormat(message),
                FailureKind::ResourceExhausted => EvoError::ResourceExhausted {
                    stage: Stage::Search,
                    reason: message,
                },
                FailureKind::Internal => EvoError::Evolution(message),
            }),
            Err(e) => Err(EvoError::Evolution(format!(
                "{} exited with {} and unreadable output ({e}); stderr: {}",
                self.program.display(),
                output.status,
                tail(&stderr, STDERR_TAIL)
            ))),
        }
    }
}

fn tail(text: &str, max: usize) -> &str {
    let text = text.trim_end();
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

pub mod checkpoints;
pub mod evolve;
pub mod score;

use crate::cli::{ModelArgs, SequenceArgs};
use anyhow::{Context, Result};
use ferritin_evolve::fasta;
use ferritin_evolve::{build_expert, DeviceKind, Expert, ExpertOptions, HubModelStore};

pub fn read_sequence(args: &SequenceArgs) -> Result<String> {
    match (&args.sequence, &args.fasta) {
        (Some(seq), _) => Ok(seq.trim().to_string()),
        (None, Some(path)) => {
            let record = fasta::read_first(path)?;
            tracing::info!(label = %record.label, length = record.sequence.len(), "read input");
            Ok(record.sequence)
        }
        (None, None) => anyhow::bail!("Either --sequence or --fasta must be provided"),
    }
}

pub fn load_expert(args: &ModelArgs) -> Result<Box<dyn Expert>> {
    let device = args.cpu.then_some(DeviceKind::Cpu);
    let mut options = ExpertOptions::default();
    if let Some(temperature) = args.temperature {
        options.temperature = temperature;
    }
    let store = match (&args.model_dir, &args.cache_dir) {
        (Some(dir), _) => HubModelStore::from_dir(dir),
        (None, Some(cache)) => HubModelStore::with_cache_dir(cache),
        (None, None) => HubModelStore::default(),
    }
    .intra_threads(args.threads);
    build_expert(&args.expert, &args.checkpoint, device, &options, &store)
        .with_context(|| format!("building `{}` expert at checkpoint `{}`", args.expert, args.checkpoint))
}

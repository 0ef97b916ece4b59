use super::commands;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the ESM-2 checkpoint keys.
    Checkpoints,
    /// Run directed evolution on one sequence and rank the variants.
    Evolve(EvolveArgs),
    /// Score variants against a wild-type sequence.
    Score(ScoreArgs),
}

#[derive(Args, Debug)]
pub struct ModelArgs {
    /// Scoring expert.
    #[arg(long, default_value = "esm")]
    pub expert: String,

    /// Checkpoint key, see the `checkpoints` subcommand.
    #[arg(long, default_value = "default")]
    pub checkpoint: String,

    /// Run on CPU rather than on GPU.
    #[arg(long)]
    pub cpu: bool,

    /// Expert temperature.
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Directory holding `model.onnx`, used instead of the HuggingFace hub.
    #[arg(long, conflicts_with = "cache_dir")]
    pub model_dir: Option<PathBuf>,

    /// HuggingFace cache directory, defaults to `$HF_HOME`.
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// ONNX Runtime intra-op threads.
    #[arg(long, default_value_t = 1)]
    pub threads: usize,
}

#[derive(Args, Debug)]
pub struct SequenceArgs {
    /// Protein String
    #[arg(long, required_unless_present = "fasta", conflicts_with = "fasta")]
    pub sequence: Option<String>,

    /// Path to a protein FASTA file; the first record is used.
    #[arg(long)]
    pub fasta: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct EvolveArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub input: SequenceArgs,

    /// Search engine executable.
    #[arg(long)]
    pub search_program: PathBuf,

    /// Extra leading argument for the search engine (repeatable).
    #[arg(long = "search-arg", allow_hyphen_values = true)]
    pub search_args: Vec<String>,

    /// JSON search configuration.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub parallel_chains: Option<usize>,

    #[arg(long)]
    pub n_steps: Option<usize>,

    #[arg(long)]
    pub max_mutations: Option<usize>,

    /// Ask the search engine for diagnostic output.
    #[arg(long)]
    pub verbose: bool,

    /// Write the table to this `.csv` or `.json` file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[command(flatten)]
    pub input: SequenceArgs,

    /// Variant sequence to score (repeatable).
    #[arg(long, required = true)]
    pub variant: Vec<String>,
}

impl Cli {
    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Checkpoints => commands::checkpoints::execute(),
            Commands::Evolve(args) => commands::evolve::execute(args),
            Commands::Score(args) => commands::score::execute(args),
        }
    }
}

use super::{load_expert, read_sequence};
use crate::cli::EvolveArgs;
use anyhow::{bail, Context, Result};
use ferritin_evolve::{EvolutionSession, ExternalSearch, ResultTable, SearchConfig};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

pub fn execute(args: EvolveArgs) -> Result<()> {
    let config = search_config(&args)?;
    if let Some(path) = &args.output {
        output_format(path)?;
    }
    let sequence = read_sequence(&args.input)?;
    let expert = load_expert(&args.model)?;

    let engine = ExternalSearch::new(&args.search_program).args(&args.search_args);
    let session = EvolutionSession::from_parts(expert, engine).with_config(config);
    let table = session
        .run(&sequence)
        .with_context(|| format!("evolving a {}-residue sequence", sequence.len()))?;

    if let Some(best) = table.best() {
        tracing::info!(score = best.score, mutations = best.pos.len(), "best variant");
    }
    match &args.output {
        Some(path) => write_table(&table, path),
        None => {
            table.write_json(std::io::stdout().lock())?;
            println!();
            Ok(())
        }
    }
}

fn search_config(args: &EvolveArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_json_file(path)?,
        None => SearchConfig::default(),
    };
    if let Some(n) = args.parallel_chains {
        config.parallel_chains = n;
    }
    if let Some(n) = args.n_steps {
        config.n_steps = n;
    }
    if let Some(n) = args.max_mutations {
        config.max_mutations = n;
    }
    config.verbose |= args.verbose;
    config.check()?;
    Ok(config)
}

fn output_format(path: &Path) -> Result<&str> {
    match path.extension().and_then(|e| e.to_str()) {
        Some(extension @ ("csv" | "json")) => Ok(extension),
        _ => bail!("unsupported output format `{}`, use .csv or .json", path.display()),
    }
}

fn write_table(table: &ResultTable, path: &Path) -> Result<()> {
    let extension = output_format(path)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let writer = BufWriter::new(file);
    match extension {
        "csv" => table.write_csv(writer)?,
        _ => table.write_json(writer)?,
    }
    tracing::info!(path = %path.display(), records = table.len(), "wrote variants");
    Ok(())
}

use super::{load_expert, read_sequence};
use crate::cli::ScoreArgs;
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct Scored<'a> {
    variant: &'a str,
    score: f32,
}

pub fn execute(args: ScoreArgs) -> Result<()> {
    let wildtype = read_sequence(&args.input)?;
    let expert = load_expert(&args.model)?;
    let variants: Vec<&str> = args.variant.iter().map(|v| v.as_str()).collect();
    let scores = expert.score(&wildtype, &variants)?;

    let scored: Vec<Scored> = variants
        .iter()
        .copied()
        .zip(scores)
        .map(|(variant, score)| Scored { variant, score })
        .collect();
    serde_json::to_writer_pretty(std::io::stdout().lock(), &scored)?;
    println!();
    Ok(())
}

//! Ranked variant table.
//!
//! Turns the raw search output into one record per variant, with the
//! substitutions relative to the input spelled out, sorted best first.
use crate::error::{EvoError, Result};
use itertools::Itertools;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::io::Write;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    /// Position in the sorted table, starting at zero.
    pub rank: usize,
    /// Index of the variant in the search output.
    pub variant: usize,
    pub score: f64,
    /// Zero-based offsets where the variant differs from the input.
    pub pos: Vec<usize>,
    pub source: Vec<char>,
    pub target: Vec<char>,
    pub sequence: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    records: Vec<VariantRecord>,
}

/// Build the ranked table for `variants` produced from `raw_sequence`.
///
/// Whitespace inside variants is stripped. Records are sorted by descending
/// score; equal scores keep their search output order.
pub fn format(raw_sequence: &str, variants: &[String], scores: &[f64]) -> Result<ResultTable> {
    if variants.len() != scores.len() {
        return Err(EvoError::Format(format!(
            "{} variants but {} scores",
            variants.len(),
            scores.len()
        )));
    }
    let raw: Vec<char> = raw_sequence.chars().collect();

    let mut records = variants
        .iter()
        .zip(scores)
        .enumerate()
        .map(|(index, (variant, &score))| diff_variant(&raw, index, variant, score))
        .collect::<Result<Vec<_>>>()?;

    // stable: ties stay in search order; scores are finite and -0.0 == 0.0
    records.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    for (rank, record) in records.iter_mut().enumerate() {
        record.rank = rank;
    }
    Ok(ResultTable { records })
}

fn diff_variant(raw: &[char], index: usize, variant: &str, score: f64) -> Result<VariantRecord> {
    if !score.is_finite() {
        return Err(EvoError::Format(format!("variant {index} has score {score}")));
    }
    let sequence: String = variant.chars().filter(|c| !c.is_whitespace()).collect();
    let residues: Vec<char> = sequence.chars().collect();
    if residues.len() != raw.len() {
        return Err(EvoError::Format(format!(
            "variant {index} has length {}, input has length {}",
            residues.len(),
            raw.len()
        )));
    }

    let (pos, (source, target)): (Vec<usize>, (Vec<char>, Vec<char>)) = raw
        .iter()
        .zip(&residues)
        .enumerate()
        .filter(|(_, (r, v))| r != v)
        .map(|(i, (&r, &v))| (i, (r, v)))
        .unzip();

    Ok(VariantRecord {
        rank: 0,
        variant: index,
        score,
        pos,
        source,
        target,
        sequence,
    })
}

impl ResultTable {
    pub fn records(&self) -> &[VariantRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariantRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Highest scoring record.
    pub fn best(&self) -> Option<&VariantRecord> {
        self.records.first()
    }

    /// Records carrying at least one substitution.
    pub fn mutated(&self) -> impl Iterator<Item = &VariantRecord> {
        self.records.iter().filter(|r| !r.pos.is_empty())
    }

    /// Columns `rank, variant, score, pos, source, target, sequence`, with the
    /// three diff columns as list columns.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let list = |name: &str, f: &dyn Fn(&VariantRecord) -> Series| -> Column {
            let rows: Vec<Series> = self.records.iter().map(f).collect();
            Series::new(name.into(), rows).into()
        };
        let (rank, variant, score) = self.scalar_columns();
        DataFrame::new(vec![
            rank,
            variant,
            score,
            list("pos", &|r| {
                Series::new("".into(), r.pos.iter().map(|&p| p as u32).collect::<Vec<u32>>())
            }),
            list("source", &|r| {
                Series::new("".into(), r.source.iter().map(char::to_string).collect::<Vec<String>>())
            }),
            list("target", &|r| {
                Series::new("".into(), r.target.iter().map(char::to_string).collect::<Vec<String>>())
            }),
            Series::new(
                "sequence".into(),
                self.records.iter().map(|r| r.sequence.as_str()).collect::<Vec<&str>>(),
            )
            .into(),
        ])
    }

    /// Same columns as [`ResultTable::to_dataframe`], with the diff lists
    /// joined by `;` so the frame can be written as CSV.
    pub fn to_flat_dataframe(&self) -> PolarsResult<DataFrame> {
        let joined = |name: &str, f: &dyn Fn(&VariantRecord) -> String| -> Column {
            Series::new(
                name.into(),
                self.records.iter().map(f).collect::<Vec<String>>(),
            )
            .into()
        };
        let (rank, variant, score) = self.scalar_columns();
        DataFrame::new(vec![
            rank,
            variant,
            score,
            joined("pos", &|r| r.pos.iter().join(";")),
            joined("source", &|r| r.source.iter().join(";")),
            joined("target", &|r| r.target.iter().join(";")),
            joined("sequence", &|r| r.sequence.clone()),
        ])
    }

    fn scalar_columns(&self) -> (Column, Column, Column) {
        let rank: Vec<u32> = self.records.iter().map(|r| r.rank as u32).collect();
        let variant: Vec<u32> = self.records.iter().map(|r| r.variant as u32).collect();
        let score: Vec<f64> = self.records.iter().map(|r| r.score).collect();
        (
            Series::new("rank".into(), rank).into(),
            Series::new("variant".into(), variant).into(),
            Series::new("score".into(), score).into(),
        )
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> PolarsResult<()> {
        let mut df = self.to_flat_dataframe()?;
        CsvWriter::new(writer).include_header(true).finish(&mut df)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> serde_json::Result<()> {
        serde_json::to_writer_pretty(writer, self)
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a VariantRecord;
    type IntoIter = std::slice::Iter<'a, VariantRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

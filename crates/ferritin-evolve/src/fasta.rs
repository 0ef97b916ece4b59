//! Minimal FASTA support.
//!
//! Writing covers the single-record handoff file given to the search engine;
//! reading covers sequence inputs for the CLI.
use crate::error::{EvoError, Result};
use std::io::{self, Write};
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

/// Record label used for the search engine input.
pub const INPUT_LABEL: &str = "Input_Sequence";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub label: String,
    pub sequence: String,
}

/// Write one record: a `>label` header line followed by the sequence verbatim.
pub fn write_record<W: Write>(writer: &mut W, label: &str, sequence: &str) -> io::Result<()> {
    writeln!(writer, ">{label}")?;
    writeln!(writer, "{sequence}")
}

/// Parse every record in `text`. Sequence lines are concatenated with
/// surrounding whitespace removed; blank lines are ignored.
pub fn parse_records(text: &str) -> Result<Vec<FastaRecord>> {
    let mut records: Vec<FastaRecord> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(label) = line.strip_prefix('>') {
            records.push(FastaRecord {
                label: label.trim().to_string(),
                sequence: String::new(),
            });
        } else {
            let record = records.last_mut().ok_or_else(|| {
                EvoError::SequenceFormat(format!(
                    "line {}: sequence data before the first `>` header",
                    lineno + 1
                ))
            })?;
            record.sequence.push_str(line);
        }
    }
    Ok(records)
}

/// Read the first record of a FASTA file.
pub fn read_first(path: &Path) -> Result<FastaRecord> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        EvoError::SequenceFormat(format!("cannot read {}: {e}", path.display()))
    })?;
    parse_records(&text)?
        .into_iter()
        .next()
        .filter(|r| !r.sequence.is_empty())
        .ok_or_else(|| {
            EvoError::SequenceFormat(format!("{} contains no sequence record", path.display()))
        })
}

/// A single-record FASTA file that is deleted when dropped.
#[derive(Debug)]
pub struct ScopedFasta {
    file: NamedTempFile,
}

impl ScopedFasta {
    pub fn write(label: &str, sequence: &str) -> Result<Self> {
        let mut file = Builder::new()
            .prefix("ferritin-evolve-")
            .suffix(".fasta")
            .tempfile()
            .map_err(|e| EvoError::Evolution(format!("cannot create input FASTA: {e}")))?;
        write_record(&mut file, label, sequence)
            .and_then(|_| file.flush())
            .map_err(|e| EvoError::Evolution(format!("cannot write input FASTA: {e}")))?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferritin_test_data::TestFile;

    #[test]
    fn write_then_read_round_trip() {
        let fasta = ScopedFasta::write(INPUT_LABEL, "MKTAYIAK").unwrap();
        let text = std::fs::read_to_string(fasta.path()).unwrap();
        assert_eq!(text, ">Input_Sequence\nMKTAYIAK\n");

        let record = read_first(fasta.path()).unwrap();
        assert_eq!(record.label, INPUT_LABEL);
        assert_eq!(record.sequence, "MKTAYIAK");
    }

    #[test]
    fn scoped_file_is_removed_on_drop() {
        let fasta = ScopedFasta::write(INPUT_LABEL, "MK").unwrap();
        let path = fasta.path().to_path_buf();
        assert!(path.exists());
        drop(fasta);
        assert!(!path.exists());
    }

    #[test]
    fn wrapped_sequences_are_joined() {
        let records = parse_records(TestFile::sprot_01().contents()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sequence.len(), 256);
        assert!(records[0].sequence.starts_with("MAFSAEDVLKEY"));
        assert!(records[0].sequence.ends_with("WKFTPL"));
    }

    #[test]
    fn multiple_records() {
        let records = parse_records(TestFile::pair().contents()).unwrap();
        assert_eq!(
            records,
            vec![
                FastaRecord {
                    label: "first".into(),
                    sequence: "MKTAYIAK".into()
                },
                FastaRecord {
                    label: "second".into(),
                    sequence: "MKTAYLAK".into()
                },
            ]
        );
    }

    #[test]
    fn headerless_data_is_rejected() {
        let err = parse_records("MKTAYIAK\n").unwrap_err();
        assert!(matches!(err, EvoError::SequenceFormat(_)));
    }

    #[test]
    fn reads_fixture_from_disk() {
        let (path, _tmp) = TestFile::ubiquitin().create_temp().unwrap();
        let record = read_first(Path::new(&path)).unwrap();
        assert!(record.label.contains("UBC_HUMAN"));
        assert_eq!(record.sequence.len(), 76);
    }
}

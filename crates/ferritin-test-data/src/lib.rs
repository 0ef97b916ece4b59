//! ferretin-test-data
//!
//! A module to provide test files embedded in the crate for use in testing.
//! Example sequence data is included in the crate distribution for reference files.
//!
//! The test files are represented as `TestFile` objects which package the raw data
//! and create temporary files for programs to operate on.
use std::fs;
use tempfile::{Builder, NamedTempFile};

#[derive(Debug)]
/// Test File
///
/// Example usage:
///
/// ```ignore
/// // returns (filepath, _tempfile_handle).
/// // _handle ensures the tempfile remains in scope
/// use ferritin_test_data::TestFile;
/// let (fasta_file, _temp) = TestFile::ubiquitin().create_temp().unwrap();
///
/// ```
pub struct TestFile {
    filebinary: &'static [u8],
    suffix: &'static str,
}

impl TestFile {
    /// Human polyubiquitin-C, first repeat (76 residues, one line).
    pub fn ubiquitin() -> Self {
        Self {
            filebinary: include_bytes!("../data/fasta/ubiquitin.fasta"),
            suffix: "fasta",
        }
    }
    /// 256-residue protein with the sequence wrapped at 60 columns.
    pub fn sprot_01() -> Self {
        Self {
            filebinary: include_bytes!("../data/fasta/sprot_01.fasta"),
            suffix: "fasta",
        }
    }
    /// Two short records separated by a blank line.
    pub fn pair() -> Self {
        Self {
            filebinary: include_bytes!("../data/fasta/pair.fasta"),
            suffix: "fasta",
        }
    }

    /// Raw file contents as text.
    pub fn contents(&self) -> &'static str {
        std::str::from_utf8(self.filebinary).unwrap_or_default()
    }

    pub fn create_temp(&self) -> std::io::Result<(String, NamedTempFile)> {
        let temp = Builder::new()
            .suffix(&format!(".{}", self.suffix))
            .tempfile()?;

        fs::write(&temp, self.filebinary)?;
        let path = temp.path().to_string_lossy().into_owned();

        Ok((path, temp))
    }
}

//! Amplicon panel parsing and validation.
//!
//! The panel is a tab-separated file with one amplicon per row:
//! `AmpliconID  ForwardPrimer  ReversePrimer  Strand`. Empty lines and
//! `#`-comments are skipped, surrounding whitespace is trimmed (spreadsheet
//! exports like putting it there), adjacent tabs are compressed, and primer
//! sequences are upper-cased before validation against {A,C,G,T}. Any
//! malformed row aborts the run; a panel is all-or-nothing.

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::errors::{AmpdedupError, Result};

/// Which strand an amplicon's reads are written to.
///
/// The strand is an opaque routing flag from the panel (literal `0` or
/// `1`); each value gets its own deduplicated and downsampled output file
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    /// Strand field `0`
    Zero,
    /// Strand field `1`
    One,
}

impl Strand {
    /// Index into strand-keyed output arrays.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Strand::Zero => 0,
            Strand::One => 1,
        }
    }

    fn from_field(field: &str, line: usize) -> Result<Self> {
        match field {
            "0" => Ok(Strand::Zero),
            "1" => Ok(Strand::One),
            other => Err(AmpdedupError::InvalidStrand { line, value: other.to_string() }),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

/// Immutable configuration entity for one targeted region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amplicon {
    /// Identifier used as the ledger/pool key and in all outputs
    pub id: String,
    /// Forward primer, uppercase {A,C,G,T}
    pub forward_primer: String,
    /// Reverse primer, uppercase {A,C,G,T}
    pub reverse_primer: String,
    /// Output-routing strand flag
    pub strand: Strand,
}

impl Amplicon {
    /// Minimum post-clip read length for a pair to count as usable:
    /// both primers plus the insert-size margin (strict comparison).
    #[must_use]
    pub fn min_usable_len(&self, min_insert_size: usize) -> usize {
        self.forward_primer.len() + self.reverse_primer.len() + min_insert_size
    }
}

/// The working set of amplicons for a run, in panel-file order.
///
/// Panel order is load-bearing: it is the primer-matching scan order
/// (first match claims the pair) and the output/statistics order.
#[derive(Debug, Clone, Default)]
pub struct AmpliconPanel {
    amplicons: Vec<Amplicon>,
}

impl AmpliconPanel {
    /// Loads and validates a panel file.
    ///
    /// # Errors
    /// Fails on an unreadable file or any malformed row; no partial panel
    /// is ever returned.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|e| AmpdedupError::InvalidFileFormat {
            file_type: "Amplicon list".to_string(),
            path: path_ref.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_reader(BufReader::new(file), path_ref)
    }

    /// Parses a panel from any buffered source.
    pub fn from_reader<R: BufRead>(reader: R, path: &Path) -> Result<Self> {
        let mut amplicons = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| AmpdedupError::InvalidFileFormat {
                file_type: "Amplicon list".to_string(),
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let line_no = index + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            amplicons.push(parse_row(trimmed, line_no)?);
        }
        Ok(Self { amplicons })
    }

    /// Iterates amplicons in panel-file order.
    pub fn iter(&self) -> std::slice::Iter<'_, Amplicon> {
        self.amplicons.iter()
    }

    /// Number of amplicons in the panel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amplicons.len()
    }

    /// Whether the panel is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amplicons.is_empty()
    }
}

impl<'a> IntoIterator for &'a AmpliconPanel {
    type Item = &'a Amplicon;
    type IntoIter = std::slice::Iter<'a, Amplicon>;

    fn into_iter(self) -> Self::IntoIter {
        self.amplicons.iter()
    }
}

fn parse_row(row: &str, line: usize) -> Result<Amplicon> {
    // Compress adjacent tabs and trim each field
    let fields: Vec<&str> =
        row.split('\t').map(str::trim).filter(|field| !field.is_empty()).collect();
    if fields.len() != 4 {
        return Err(AmpdedupError::InvalidPanelRow { line, found: fields.len() });
    }

    let forward_primer = fields[1].to_uppercase();
    let reverse_primer = fields[2].to_uppercase();
    validate_primer(&forward_primer, "forward", line)?;
    validate_primer(&reverse_primer, "reverse", line)?;
    let strand = Strand::from_field(fields[3], line)?;

    Ok(Amplicon { id: fields[0].to_string(), forward_primer, reverse_primer, strand })
}

fn validate_primer(primer: &str, which: &str, line: usize) -> Result<()> {
    if primer.bytes().all(|b| matches!(b, b'A' | b'T' | b'G' | b'C')) && !primer.is_empty() {
        Ok(())
    } else {
        Err(AmpdedupError::NonStandardBase { line, which: which.to_string() })
    }
}

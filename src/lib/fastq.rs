//! Paired FASTQ reading and writing.
//!
//! Reads R1/R2 FASTQ files in lockstep, applying the input-consistency gate
//! on early records (paired headers must be equal-length and at Hamming
//! distance exactly one), and writes plain FASTQ records for the
//! deduplicated and downsampled outputs. Gzip-compressed input is handled
//! transparently by the fgoxide reader.

use anyhow::{Context, Result, bail};
use fgoxide::io::Io;
use seq_io::fastq::Reader as FastqReader;
use seq_io::fastq::Record;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::dna::hamming_distance;
use crate::errors::AmpdedupError;

const BUFFER_SIZE: usize = 1024 * 1024;

/// Number of leading pairs subject to the header-consistency gate.
const HEADER_CHECK_PAIRS: u32 = 10;

/// One streaming unit: a raw or trimmed read pair.
///
/// Headers are stored without the leading '@'. Quality strings are the raw
/// ASCII bytes from the file; decoding to Phred scores happens in
/// [`crate::phred`] with an explicit offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadPair {
    /// R1 header (without '@')
    pub header_r1: String,
    /// R2 header (without '@')
    pub header_r2: String,
    /// R1 bases
    pub seq_r1: Vec<u8>,
    /// R2 bases
    pub seq_r2: Vec<u8>,
    /// R1 quality bytes (ASCII-encoded)
    pub qual_r1: Vec<u8>,
    /// R2 quality bytes (ASCII-encoded)
    pub qual_r2: Vec<u8>,
}

impl ReadPair {
    /// Removes the first `n` bases (and quality bytes) from both mates.
    ///
    /// Saturates at the read length, so a read shorter than the tag region
    /// trims to empty instead of panicking.
    pub fn trim_leading(&mut self, n: usize) {
        trim_front(&mut self.seq_r1, n);
        trim_front(&mut self.seq_r2, n);
        trim_front(&mut self.qual_r1, n);
        trim_front(&mut self.qual_r2, n);
    }
}

fn trim_front(v: &mut Vec<u8>, n: usize) {
    v.drain(..n.min(v.len()));
}

/// Lock-step reader over an R1/R2 FASTQ file pair.
///
/// The first [`HEADER_CHECK_PAIRS`] pairs are checked for header
/// consistency: mismatched or reordered input files fail fast instead of
/// silently producing nonsense molecules. Records whose sequence and
/// quality lengths disagree are a fatal format error.
pub struct PairedFastqReader {
    r1: FastqReader<Box<dyn BufRead + Send>>,
    r2: FastqReader<Box<dyn BufRead + Send>>,
    pairs_seen: u32,
}

impl PairedFastqReader {
    /// Opens a reader over two FASTQ paths (plain or gzip).
    pub fn from_paths<P: AsRef<Path>>(r1: P, r2: P) -> Result<Self> {
        let fgio = Io::new(5, BUFFER_SIZE);
        let r1_reader = fgio
            .new_reader(r1.as_ref())
            .with_context(|| format!("Failed to open R1 FASTQ: {}", r1.as_ref().display()))?;
        let r2_reader = fgio
            .new_reader(r2.as_ref())
            .with_context(|| format!("Failed to open R2 FASTQ: {}", r2.as_ref().display()))?;
        Ok(Self::from_readers(r1_reader, r2_reader))
    }

    /// Builds a reader from already-open sources (used by tests).
    #[must_use]
    pub fn from_readers(r1: Box<dyn BufRead + Send>, r2: Box<dyn BufRead + Send>) -> Self {
        Self { r1: FastqReader::new(r1), r2: FastqReader::new(r2), pairs_seen: 0 }
    }

    /// Reads the next pair, or `None` when both inputs are exhausted.
    ///
    /// # Errors
    /// Fails when one file ends before the other, when a record is
    /// malformed, or when an early pair fails the header-consistency gate.
    pub fn next_pair(&mut self) -> Result<Option<ReadPair>> {
        let rec1 = self.r1.next();
        let rec2 = self.r2.next();

        let (rec1, rec2) = match (rec1, rec2) {
            (None, None) => return Ok(None),
            (Some(r1), Some(r2)) => {
                (r1.context("Error parsing R1 FASTQ")?, r2.context("Error parsing R2 FASTQ")?)
            }
            _ => bail!("R1 and R2 FASTQ files contain different numbers of records"),
        };

        let pair = ReadPair {
            header_r1: String::from_utf8_lossy(rec1.head()).into_owned(),
            header_r2: String::from_utf8_lossy(rec2.head()).into_owned(),
            seq_r1: rec1.seq().to_vec(),
            seq_r2: rec2.seq().to_vec(),
            qual_r1: rec1.qual().to_vec(),
            qual_r2: rec2.qual().to_vec(),
        };

        if pair.seq_r1.len() != pair.qual_r1.len() || pair.seq_r2.len() != pair.qual_r2.len() {
            bail!("FASTQ record '{}' has mismatched sequence/quality lengths", pair.header_r1);
        }

        if self.pairs_seen < HEADER_CHECK_PAIRS {
            let h1 = pair.header_r1.as_bytes();
            let h2 = pair.header_r2.as_bytes();
            if h1.len() != h2.len() || hamming_distance(h1, h2) != 1 {
                return Err(AmpdedupError::MismatchedHeaders {
                    header_r1: pair.header_r1.clone(),
                    header_r2: pair.header_r2.clone(),
                }
                .into());
            }
            self.pairs_seen += 1;
        }

        Ok(Some(pair))
    }
}

/// Writer for one output file pair (R1 + R2).
pub struct FastqPairWriter {
    r1: Box<dyn Write + Send>,
    r2: Box<dyn Write + Send>,
}

impl FastqPairWriter {
    /// Creates both output files.
    pub fn create<P: AsRef<Path>>(r1: P, r2: P) -> Result<Self> {
        let fgio = Io::new(5, BUFFER_SIZE);
        let w1 = fgio
            .new_writer(r1.as_ref())
            .with_context(|| format!("Failed to create {}", r1.as_ref().display()))?;
        let w2 = fgio
            .new_writer(r2.as_ref())
            .with_context(|| format!("Failed to create {}", r2.as_ref().display()))?;
        Ok(Self { r1: Box::new(w1), r2: Box::new(w2) })
    }

    /// Writes one record to each mate's file.
    pub fn write_pair(
        &mut self,
        header_r1: &str,
        seq_r1: &[u8],
        qual_r1: &[u8],
        header_r2: &str,
        seq_r2: &[u8],
        qual_r2: &[u8],
    ) -> Result<()> {
        write_record_to(&mut self.r1, header_r1, seq_r1, qual_r1)?;
        write_record_to(&mut self.r2, header_r2, seq_r2, qual_r2)?;
        Ok(())
    }

    /// Flushes both outputs.
    pub fn finish(mut self) -> Result<()> {
        self.r1.flush().context("Failed to flush R1 output")?;
        self.r2.flush().context("Failed to flush R2 output")?;
        Ok(())
    }
}

/// Write a FASTQ record to any writer.
///
/// Quality bytes are written as-is (they are already ASCII-encoded).
pub fn write_record_to<W: Write>(
    writer: &mut W,
    header: &str,
    seq: &[u8],
    qual: &[u8],
) -> Result<()> {
    writeln!(writer, "@{header}")?;
    writer.write_all(seq)?;
    writeln!(writer)?;
    writeln!(writer, "+")?;
    writer.write_all(qual)?;
    writeln!(writer)?;
    Ok(())
}

/// Derives the sample identifier from an R1 FASTQ filename: the text before
/// the second underscore (the first underscore is retained).
///
/// # Examples
///
/// ```
/// use ampdedup_lib::fastq::sample_id;
///
/// assert_eq!(sample_id("Sample1_S1_L001_R1_001.fastq"), "Sample1_S1");
/// assert_eq!(sample_id("nounderscore.fastq"), "nounderscore.fastq");
/// ```
#[must_use]
pub fn sample_id(fastq_name: &str) -> String {
    let mut out = String::new();
    let mut underscores = 0;
    for c in fastq_name.chars() {
        if c == '_' {
            underscores += 1;
            if underscores == 2 {
                break;
            }
        }
        out.push(c);
    }
    out
}

/// Derives the output-file prefix from an R1 FASTQ filename: the text
/// before the first underscore (the whole name if there is none).
#[must_use]
pub fn file_prefix(fastq_name: &str) -> &str {
    fastq_name.split('_').next().unwrap_or(fastq_name)
}

//! Run counters and per-RTI metrics output.
//!
//! `RunMetrics` carries the streaming-phase counters, threaded explicitly
//! through the pipeline rather than held as ambient state. `RtiMetric` is
//! one row of the tab-separated statistics table, written with fgoxide's
//! `DelimFile`; serde renames pin the published column names, which
//! downstream report scripts parse by header.

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A metric type that can be serialized to TSV files.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Human-readable name for this metric type, used in error messages.
    fn metric_name() -> &'static str;
}

/// Divides two counters, reporting 0.0 on a zero denominator.
#[inline]
#[must_use]
pub fn fraction(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 { 0.0 } else { numerator as f64 / denominator as f64 }
}

/// Counters accumulated over one deduplication run.
///
/// Streaming-phase counters are monotonically non-decreasing and fixed
/// before the post-stream filters run; `total_unique_molecules` and
/// `unique_per_amplicon` are filled during emission.
#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Read pairs consumed from the input
    pub total_pairs: u64,
    /// Pairs rejected as all-N placeholders
    pub n_masked: u64,
    /// Pairs rejected by the RTI base-quality gate
    pub rti_quality_discarded: u64,
    /// Pairs whose forward and reverse primers both matched
    pub primer_matched: u64,
    /// Primer-matched pairs rejected by the insert-length filter
    pub short_insert_discarded: u64,
    /// Pairs passing all streaming filters
    pub total_usable_reads: u64,
    /// Emitted molecules across all amplicons
    pub total_unique_molecules: u64,
    /// Usable-pair count per amplicon
    pub usable_per_amplicon: HashMap<String, u64>,
    /// Emitted-molecule count per amplicon
    pub unique_per_amplicon: HashMap<String, u64>,
}

impl RunMetrics {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs that matched no amplicon: everything not otherwise accounted
    /// for. Derived from the other counters rather than counted directly.
    #[must_use]
    pub fn primer_unmatched(&self) -> u64 {
        self.total_pairs
            .saturating_sub(self.primer_matched + self.rti_quality_discarded + self.n_masked)
    }

    /// Usable-pair count for one amplicon.
    #[must_use]
    pub fn usable_reads(&self, amplicon_id: &str) -> u64 {
        self.usable_per_amplicon.get(amplicon_id).copied().unwrap_or(0)
    }

    /// Emitted-molecule count for one amplicon.
    #[must_use]
    pub fn unique_reads(&self, amplicon_id: &str) -> u64 {
        self.unique_per_amplicon.get(amplicon_id).copied().unwrap_or(0)
    }

    /// Global fraction of usable reads collapsed away by deduplication.
    #[must_use]
    pub fn duplication_rate(&self) -> f64 {
        if self.total_usable_reads == 0 {
            0.0
        } else {
            1.0 - fraction(self.total_unique_molecules, self.total_usable_reads)
        }
    }
}

/// One row of the per-RTI statistics table.
///
/// Column names are part of the published format, including the
/// space-and-parentheses frequency header.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RtiMetric {
    /// Sample identifier derived from the R1 filename
    #[serde(rename = "SampleID")]
    pub sample_id: String,
    /// Amplicon the molecule mapped to
    #[serde(rename = "Amplicon")]
    pub amplicon: String,
    /// The amplicon's strand flag (0/1)
    #[serde(rename = "Strand")]
    pub strand: u8,
    /// Composite RTI key
    #[serde(rename = "RTI")]
    pub rti: String,
    /// Number of raw pairs merged into the molecule
    #[serde(rename = "Frequency (Reads)")]
    pub frequency: u64,
    /// Error score of the retained read
    #[serde(rename = "SequenceErrors")]
    pub sequence_errors: f64,
}

impl Metric for RtiMetric {
    fn metric_name() -> &'static str {
        "per-RTI"
    }
}

/// Write metrics to a TSV file with consistent error handling.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
pub fn write_metrics<P: AsRef<Path>, T: Serialize>(
    path: P,
    metrics: &[T],
    description: &str,
) -> Result<()> {
    let path_ref = path.as_ref();
    DelimFile::default()
        .write_tsv(&path_ref, metrics)
        .with_context(|| format!("Failed to write {} metrics: {}", description, path_ref.display()))
}

/// Write metrics implementing the [`Metric`] trait to a TSV file.
///
/// # Errors
/// Returns an error if the file cannot be created or written to
pub fn write_metrics_auto<P: AsRef<Path>, T: Metric>(path: P, metrics: &[T]) -> Result<()> {
    write_metrics(path, metrics, T::metric_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_fraction_guards_zero_denominator() {
        assert!((fraction(5, 0) - 0.0).abs() < f64::EPSILON);
        assert!((fraction(1, 4) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_primer_unmatched_is_derived() {
        let metrics = RunMetrics {
            total_pairs: 100,
            n_masked: 5,
            rti_quality_discarded: 10,
            primer_matched: 70,
            ..RunMetrics::default()
        };
        assert_eq!(metrics.primer_unmatched(), 15);
    }

    #[test]
    fn test_primer_unmatched_saturates() {
        let metrics = RunMetrics { total_pairs: 0, primer_matched: 1, ..RunMetrics::default() };
        assert_eq!(metrics.primer_unmatched(), 0);
    }

    #[test]
    fn test_duplication_rate() {
        let mut metrics = RunMetrics::new();
        assert!((metrics.duplication_rate() - 0.0).abs() < f64::EPSILON);

        metrics.total_usable_reads = 100;
        metrics.total_unique_molecules = 80;
        assert!((metrics.duplication_rate() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_per_amplicon_lookups_default_to_zero() {
        let mut metrics = RunMetrics::new();
        metrics.usable_per_amplicon.insert("AMP1".to_string(), 7);
        assert_eq!(metrics.usable_reads("AMP1"), 7);
        assert_eq!(metrics.usable_reads("AMP2"), 0);
        assert_eq!(metrics.unique_reads("AMP1"), 0);
    }

    #[test]
    fn test_rti_metric_column_names() -> Result<()> {
        let rows = vec![RtiMetric {
            sample_id: "Sample1_S1".to_string(),
            amplicon: "AMP1".to_string(),
            strand: 0,
            rti: "AAAAATTTTT".to_string(),
            frequency: 5,
            sequence_errors: 0.0123,
        }];

        let file = NamedTempFile::new()?;
        write_metrics_auto(file.path(), &rows)?;

        let content = std::fs::read_to_string(file.path())?;
        let header = content.lines().next().unwrap();
        assert_eq!(header, "SampleID\tAmplicon\tStrand\tRTI\tFrequency (Reads)\tSequenceErrors");
        assert!(content.contains("AAAAATTTTT"));
        assert!(content.contains("Sample1_S1"));
        Ok(())
    }

    #[test]
    fn test_rti_metric_round_trip() -> Result<()> {
        let rows = vec![
            RtiMetric {
                sample_id: "S_1".to_string(),
                amplicon: "AMP1".to_string(),
                strand: 0,
                rti: "AAAAATTTTT".to_string(),
                frequency: 5,
                sequence_errors: 0.01,
            },
            RtiMetric {
                sample_id: "S_1".to_string(),
                amplicon: "AMP2".to_string(),
                strand: 1,
                rti: "CCCCCGGGGG".to_string(),
                frequency: 2,
                sequence_errors: 0.02,
            },
        ];

        let file = NamedTempFile::new()?;
        write_metrics(file.path(), &rows, "test")?;

        let back: Vec<RtiMetric> = DelimFile::default().read_tsv(&file.path())?;
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].rti, "AAAAATTTTT");
        assert_eq!(back[1].strand, 1);
        assert_eq!(back[1].frequency, 2);
        Ok(())
    }
}

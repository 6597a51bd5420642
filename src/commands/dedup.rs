//! Remove PCR duplicates from paired-end amplicon FASTQ data.
//!
//! This command streams an R1/R2 FASTQ pair against an amplicon panel,
//! deduplicates read pairs by their dual-tagged random template identifier
//! (RTI), and writes per-strand deduplicated FASTQ pairs, a depth-matched
//! downsampled control, and a per-RTI statistics table. See
//! [`ampdedup_lib::pipeline`] for the algorithm.

use anyhow::{Result, bail};
use clap::Parser;
use log::info;
use std::path::PathBuf;

use ampdedup_lib::pipeline::{self, DedupConfig};
use ampdedup_lib::validation::{validate_files_exist, validate_nonzero};

use crate::commands::command::Command;

/// Remove PCR duplicates from a paired-end amplicon FASTQ pair.
#[derive(Debug, Parser)]
#[command(
    name = "dedup",
    about = "\x1b[38;5;30m[DEDUPLICATION]\x1b[0m \x1b[36mRemove RTI-tagged PCR duplicates from amplicon FASTQ pairs\x1b[0m",
    long_about = r#"
Removes PCR duplicates from paired-end sequenced amplicon library preps
using dual-tagged random template identifiers (RTIs).

Each mate carries an RTI at its 5' end followed by a fixed anti-complementary
spacer. Read pairs are assigned to an amplicon by anchored local alignment of
both primers, deduplicated per (amplicon, RTI) keeping the lowest-error read,
and RTIs within the configured edit distance collapse onto the more frequent
RTI. Outputs are written next to the inputs:

  <R1>.Dedupped_0.fastq / <R2>.Dedupped_0.fastq   deduplicated pairs, strand 0
  <R1>.Dedupped_1.fastq / <R2>.Dedupped_1.fastq   deduplicated pairs, strand 1
  <R1>.Trimmed_0.fastq  / <R2>.Trimmed_0.fastq    depth-matched unfiltered pairs
  <R1>.Trimmed_1.fastq  / <R2>.Trimmed_1.fastq    depth-matched unfiltered pairs
  <prefix>_RTIs.txt                               per-RTI statistics table
  <prefix>_RTIHeaders.txt                         R1 header -> RTI index

The amplicon list is tab-separated:

  AmpliconID  ForwardPrimer  ReversePrimer  Strand

with primers restricted to A/T/G/C and strand either 0 or 1.

Example usage:
  ampdedup dedup amplicons.txt Sample1_S1_R1.fastq Sample1_S1_R2.fastq --seed 42
"#
)]
pub struct Dedup {
    /// Amplicon list: AmpliconID, ForwardPrimer, ReversePrimer, Strand
    #[arg(value_name = "AMPLICON_LIST")]
    pub amplicons: PathBuf,

    /// R1 FASTQ file (plain or gzipped)
    #[arg(value_name = "R1_FASTQ")]
    pub r1: PathBuf,

    /// R2 FASTQ file (plain or gzipped)
    #[arg(value_name = "R2_FASTQ")]
    pub r2: PathBuf,

    /// Random template identifier length at the 5' end of each mate
    #[arg(long = "rti-length", default_value_t = 5)]
    pub rti_length: usize,

    /// Anti-complementary spacer length between the RTI and the insert
    #[arg(long = "spacer-length", default_value_t = 3)]
    pub spacer_length: usize,

    /// Minimum Phred score required of every RTI base
    #[arg(long = "min-rti-base-quality", default_value_t = 17)]
    pub min_rti_base_quality: u8,

    /// RTIs closer than this Hamming distance collapse onto the more
    /// frequent RTI
    #[arg(long = "min-rti-edit-distance", default_value_t = 2)]
    pub min_rti_edit_distance: usize,

    /// Quality ASCII offset
    #[arg(long = "phred-offset", default_value_t = 33)]
    pub phred_offset: u8,

    /// Maximum expected Phred score
    #[arg(long = "max-quality", default_value_t = 40)]
    pub max_quality: u8,

    /// Minimum insert length margin over the two primer lengths (strict)
    #[arg(long = "min-insert-size", default_value_t = 5)]
    pub min_insert_size: usize,

    /// Minimum RTI depth / highest-base-error-rate score for emission
    #[arg(long = "min-rti-depth-error-rate", default_value_t = 1000.0)]
    pub min_rti_depth_error_rate: f64,

    /// Random seed for downsampling reproducibility
    #[arg(long = "seed")]
    pub seed: Option<u64>,
}

impl Command for Dedup {
    fn execute(&self, command_line: &str) -> Result<()> {
        validate_files_exist(&[
            (&self.amplicons, "Amplicon list"),
            (&self.r1, "Input R1 FASTQ"),
            (&self.r2, "Input R2 FASTQ"),
        ])?;
        validate_nonzero(self.rti_length, "rti-length")?;
        if self.min_rti_depth_error_rate < 0.0 {
            bail!(
                "--min-rti-depth-error-rate must be non-negative, got {}",
                self.min_rti_depth_error_rate
            );
        }

        // Parameter banner, logged for provenance
        info!("CL: {command_line}");
        info!("RTILength: {}", self.rti_length);
        info!("AntiComplementaryRegionLength: {}", self.spacer_length);
        info!("MinimumRTIBaseQScore: {}", self.min_rti_base_quality);
        info!("MinimumRTIEditDistance: {}", self.min_rti_edit_distance);
        info!("MinRTIDepthErrorRate: {}", self.min_rti_depth_error_rate);
        info!("QScorePhredOffset: {}", self.phred_offset);
        info!("MaxQScore: {}", self.max_quality);
        info!("MinInsertSize: {}", self.min_insert_size);
        if let Some(seed) = self.seed {
            info!("Seed: {seed}");
        }

        let config = DedupConfig {
            rti_len: self.rti_length,
            spacer_len: self.spacer_length,
            min_rti_base_quality: self.min_rti_base_quality,
            min_rti_edit_distance: self.min_rti_edit_distance,
            phred_offset: self.phred_offset,
            max_quality: self.max_quality,
            min_insert_size: self.min_insert_size,
            min_rti_depth_error_rate: self.min_rti_depth_error_rate,
            seed: self.seed,
        };

        pipeline::run(&config, &self.amplicons, &self.r1, &self.r2)?;
        Ok(())
    }
}

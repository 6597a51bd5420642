#![deny(unsafe_code)]
// Clippy lint configuration for CI
// These lints are allowed because:
// - cast_*: Scientific/bioinformatics code intentionally casts between numeric types
// - missing_*_doc: Documentation improvements tracked separately
// - module_name_repetitions: Metric/error type names repeat their module on purpose
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::uninlined_format_args
)]

//! # ampdedup - Amplicon PCR-Duplicate Removal Library
//!
//! This library removes PCR duplicates from paired-end amplicon sequencing
//! data by recognizing molecules that share a dual-tagged random template
//! identifier (RTI), collapsing RTIs that differ only by sequencing or PCR
//! error, and emitting a depth-matched non-deduplicated control alongside
//! the deduplicated reads.
//!
//! ## Overview
//!
//! The library is organized into focused modules:
//!
//! ### Core Pipeline
//!
//! - **[`pipeline`]** - the single-pass streaming driver and its
//!   configuration
//! - **[`ledger`]** - best-representative-per-RTI state with the admission
//!   filter and edit-distance collapser
//! - **[`pool`]** - the unfiltered read pool and depth-matched downsampler
//!
//! ### Sequence Primitives
//!
//! - **[`dna`]** - reverse complement and Hamming distance
//! - **[`phred`]** - quality-to-error-probability conversions
//! - **[`primer`]** - anchored Smith-Waterman primer matching and adapter
//!   clipping
//! - **[`rti`]** - RTI extraction and the per-base quality gate
//!
//! ### I/O and Support
//!
//! - **[`amplicon`]** - amplicon panel parsing and validation
//! - **[`fastq`]** - lock-step paired FASTQ reading and writing
//! - **[`metrics`]** - run counters and the per-RTI statistics table
//! - **[`logging`]** - formatting helpers and the run summary
//! - **[`progress`]** - interval progress tracking
//! - **[`validation`]** - input validation with typed errors
//! - **[`errors`]** - the library error type
//!
//! ## Quick Start
//!
//! ```no_run
//! use ampdedup_lib::pipeline::{DedupConfig, run};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = DedupConfig { seed: Some(42), ..DedupConfig::default() };
//! let metrics = run(
//!     &config,
//!     Path::new("amplicons.txt"),
//!     Path::new("Sample1_S1_R1.fastq"),
//!     Path::new("Sample1_S1_R2.fastq"),
//! )?;
//! println!("unique molecules: {}", metrics.total_unique_molecules);
//! # Ok(())
//! # }
//! ```

pub mod amplicon;
pub mod dna;
pub mod errors;
pub mod fastq;
pub mod ledger;
pub mod logging;
pub mod metrics;
pub mod phred;
pub mod pipeline;
pub mod pool;
pub mod primer;
pub mod progress;
pub mod rti;
pub mod validation;

// Re-export the error type for convenient access
pub use errors::AmpdedupError;

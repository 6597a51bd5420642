//! The deduplication pipeline: one streaming pass, two filter passes, and
//! depth-matched downsampling.
//!
//! Control flow per pair: all-N check -> RTI quality gate -> RTI extraction
//! and front-trim -> amplicon scan (first forward-primer hit claims the
//! pair) -> adapter clipping -> insert-length filter -> ledger update and
//! pool accumulation. After the stream: depth/error admission filter, then
//! RTI collapsing, then emission of the deduplicated FASTQ pairs, the
//! per-RTI table, and the downsampled unfiltered FASTQ pairs.
//!
//! The pipeline is strictly single-threaded and order-sensitive; all state
//! (ledger, pool, counters) is owned by this function and threaded through
//! explicitly.

use anyhow::{Context, Result};
use log::info;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::amplicon::AmpliconPanel;
use crate::dna::reverse_complement;
use crate::fastq::{FastqPairWriter, PairedFastqReader, file_prefix, sample_id};
use crate::ledger::MoleculeLedger;
use crate::logging::{OperationTimer, log_run_summary};
use crate::metrics::{RtiMetric, RunMetrics, write_metrics};
use crate::phred::{max_error_rate, mean_error_rate};
use crate::pool::UnfilteredPool;
use crate::primer::{clip_trailing_primer, matches_primer_prefix};
use crate::progress::ProgressTracker;
use crate::rti::{extract_rti, is_n_masked, rti_passes_quality};

const BUFFER_SIZE: usize = 1024 * 1024;

/// Tunable settings for one run. Defaults suit Illumina 1.8/1.9 amplicon
/// libraries with 5-base RTIs.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// RTI bases at the 5' end of each mate
    pub rti_len: usize,
    /// Anti-complementary spacer bases between the RTI and the insert
    pub spacer_len: usize,
    /// Minimum Phred score of every RTI base
    pub min_rti_base_quality: u8,
    /// RTIs closer than this Hamming distance collapse (exclusive bound)
    pub min_rti_edit_distance: usize,
    /// Quality ASCII offset
    pub phred_offset: u8,
    /// Maximum expected Phred score (reported, not enforced)
    pub max_quality: u8,
    /// Strict insert-length margin over the two primer lengths
    pub min_insert_size: usize,
    /// Minimum depth/error-rate score for a molecule to be emitted
    pub min_rti_depth_error_rate: f64,
    /// RNG seed for the downsampler; entropy-seeded when absent
    pub seed: Option<u64>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            rti_len: 5,
            spacer_len: 3,
            min_rti_base_quality: 17,
            min_rti_edit_distance: 2,
            phred_offset: 33,
            max_quality: 40,
            min_insert_size: 5,
            min_rti_depth_error_rate: 1000.0,
            seed: None,
        }
    }
}

/// Output locations, all derived from the input FASTQ paths: per-strand
/// deduplicated and downsampled FASTQ pairs, plus the two tables under the
/// R1 path's first-underscore prefix.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    /// Deduplicated R1 outputs, indexed by strand
    pub dedupped_r1: [PathBuf; 2],
    /// Deduplicated R2 outputs, indexed by strand
    pub dedupped_r2: [PathBuf; 2],
    /// Downsampled unfiltered R1 outputs, indexed by strand
    pub trimmed_r1: [PathBuf; 2],
    /// Downsampled unfiltered R2 outputs, indexed by strand
    pub trimmed_r2: [PathBuf; 2],
    /// Per-RTI statistics table
    pub rti_table: PathBuf,
    /// RTI-to-header index
    pub rti_headers: PathBuf,
}

impl OutputPaths {
    /// Derives every output path from the two input paths. FASTQ outputs
    /// append suffixes to the input paths; the two tables are named from
    /// the R1 filename's first-underscore prefix, next to the inputs.
    #[must_use]
    pub fn from_inputs(r1: &Path, r2: &Path) -> Self {
        let r1_name = r1.to_string_lossy();
        let r2_name = r2.to_string_lossy();
        let parent = r1.parent().unwrap_or_else(|| Path::new(""));
        let basename =
            r1.file_name().map_or_else(|| r1_name.clone(), |name| name.to_string_lossy());
        let prefix = file_prefix(&basename);
        Self {
            dedupped_r1: [
                PathBuf::from(format!("{r1_name}.Dedupped_0.fastq")),
                PathBuf::from(format!("{r1_name}.Dedupped_1.fastq")),
            ],
            dedupped_r2: [
                PathBuf::from(format!("{r2_name}.Dedupped_0.fastq")),
                PathBuf::from(format!("{r2_name}.Dedupped_1.fastq")),
            ],
            trimmed_r1: [
                PathBuf::from(format!("{r1_name}.Trimmed_0.fastq")),
                PathBuf::from(format!("{r1_name}.Trimmed_1.fastq")),
            ],
            trimmed_r2: [
                PathBuf::from(format!("{r2_name}.Trimmed_0.fastq")),
                PathBuf::from(format!("{r2_name}.Trimmed_1.fastq")),
            ],
            rti_table: parent.join(format!("{prefix}_RTIs.txt")),
            rti_headers: parent.join(format!("{prefix}_RTIHeaders.txt")),
        }
    }
}

/// Runs the full pipeline over one R1/R2 pair against an amplicon panel.
///
/// # Errors
/// Fails on configuration errors (unreadable or malformed panel), on input
/// consistency errors (header gate, mismatched record counts, malformed
/// records), and on any output I/O failure. Per-record soft rejections are
/// counted, not raised.
pub fn run(
    config: &DedupConfig,
    amplicon_path: &Path,
    r1_path: &Path,
    r2_path: &Path,
) -> Result<RunMetrics> {
    let panel = AmpliconPanel::from_path(amplicon_path)?;
    info!("Loaded {} amplicons from {}", panel.len(), amplicon_path.display());

    let r1_basename = r1_path
        .file_name()
        .map_or_else(|| r1_path.to_string_lossy().into_owned(), |n| n.to_string_lossy().into_owned());
    let sample = sample_id(&r1_basename);
    let paths = OutputPaths::from_inputs(r1_path, r2_path);

    let mut reader = PairedFastqReader::from_paths(r1_path, r2_path)?;
    let mut dedup_writers = [
        FastqPairWriter::create(&paths.dedupped_r1[0], &paths.dedupped_r2[0])?,
        FastqPairWriter::create(&paths.dedupped_r1[1], &paths.dedupped_r2[1])?,
    ];
    let mut trimmed_writers = [
        FastqPairWriter::create(&paths.trimmed_r1[0], &paths.trimmed_r2[0])?,
        FastqPairWriter::create(&paths.trimmed_r1[1], &paths.trimmed_r2[1])?,
    ];
    let fgio = fgoxide::io::Io::new(5, BUFFER_SIZE);
    let mut rti_header_out = fgio
        .new_writer(&paths.rti_headers)
        .with_context(|| format!("Failed to create {}", paths.rti_headers.display()))?;

    let mut metrics = RunMetrics::new();
    let mut ledger = MoleculeLedger::new();
    let mut pool = UnfilteredPool::new();
    let tag_region_len = config.rti_len + config.spacer_len;

    let timer = OperationTimer::new("Deduplicating read pairs");
    let mut progress = ProgressTracker::new("Processed read pairs").with_interval(100_000);

    while let Some(mut pair) = reader.next_pair()? {
        metrics.total_pairs += 1;
        progress.log_if_needed(1);

        if is_n_masked(&pair.seq_r1) || is_n_masked(&pair.seq_r2) {
            metrics.n_masked += 1;
            continue;
        }

        let offset = config.phred_offset;
        let min_q = config.min_rti_base_quality;
        if !rti_passes_quality(&pair.qual_r1, config.rti_len, offset, min_q)
            || !rti_passes_quality(&pair.qual_r2, config.rti_len, offset, min_q)
        {
            metrics.rti_quality_discarded += 1;
            continue;
        }

        let tag = extract_rti(&pair.seq_r1, &pair.seq_r2, &pair.qual_r1, &pair.qual_r2, config.rti_len);
        pair.trim_leading(tag_region_len);

        for amplicon in &panel {
            if !matches_primer_prefix(&pair.seq_r1, amplicon.forward_primer.as_bytes()) {
                continue;
            }
            if matches_primer_prefix(&pair.seq_r2, amplicon.reverse_primer.as_bytes()) {
                metrics.primer_matched += 1;

                // Remove read-through into the far adapter on both mates
                clip_trailing_primer(
                    &mut pair.seq_r1,
                    &mut pair.qual_r1,
                    &reverse_complement(amplicon.reverse_primer.as_bytes()),
                );
                clip_trailing_primer(
                    &mut pair.seq_r2,
                    &mut pair.qual_r2,
                    &reverse_complement(amplicon.forward_primer.as_bytes()),
                );

                let min_len = amplicon.min_usable_len(config.min_insert_size);
                if pair.seq_r1.len() > min_len && pair.seq_r2.len() > min_len {
                    *metrics.usable_per_amplicon.entry(amplicon.id.clone()).or_insert(0) += 1;
                    metrics.total_usable_reads += 1;

                    writeln!(rti_header_out, "{}\t{}", pair.header_r1, tag.key)?;

                    let read_errors = mean_error_rate(&pair.qual_r1, offset)
                        + mean_error_rate(&pair.qual_r2, offset);
                    let rti_errors = max_error_rate(&tag.quals, offset);

                    ledger.observe(&amplicon.id, &tag.key, &pair, read_errors, rti_errors);
                    pool.push(&amplicon.id, pair.clone());
                } else {
                    metrics.short_insert_discarded += 1;
                }
            }
            // First forward-primer hit claims the pair even when the
            // reverse primer then fails
            break;
        }
    }
    progress.log_final();

    let depth_cleared = ledger.apply_depth_filter(config.min_rti_depth_error_rate);
    info!("Admission filter cleared {depth_cleared} low depth/error-rate RTIs");
    let collapse_cleared = ledger.collapse(config.min_rti_edit_distance);
    info!("Collapsed {collapse_cleared} RTIs within edit distance {}", config.min_rti_edit_distance);

    // Emit surviving molecules and collect the stats table
    let mut rti_rows: Vec<RtiMetric> = Vec::new();
    for amplicon in &panel {
        let strand = amplicon.strand.index();
        for (rti, molecule) in ledger.emitted(&amplicon.id) {
            metrics.total_unique_molecules += 1;
            *metrics.unique_per_amplicon.entry(amplicon.id.clone()).or_insert(0) += 1;

            dedup_writers[strand].write_pair(
                &molecule.header_r1,
                &molecule.seq_r1,
                &molecule.qual_r1,
                &molecule.header_r2,
                &molecule.seq_r2,
                &molecule.qual_r2,
            )?;

            rti_rows.push(RtiMetric {
                sample_id: sample.clone(),
                amplicon: amplicon.id.clone(),
                strand: strand as u8,
                rti: rti.clone(),
                frequency: molecule.frequency,
                sequence_errors: molecule.read_errors,
            });
        }
    }
    write_metrics(&paths.rti_table, &rti_rows, "per-RTI")?;

    log_run_summary(&metrics, &panel);

    // Depth-matched downsampling of the unfiltered pools
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    for amplicon in &panel {
        let depth = metrics.unique_reads(&amplicon.id) as usize;
        let strand = amplicon.strand.index();
        for sampled in pool.downsample(&amplicon.id, depth, &mut rng) {
            trimmed_writers[strand].write_pair(
                &sampled.header_r1,
                &sampled.seq_r1,
                &sampled.qual_r1,
                &sampled.header_r2,
                &sampled.seq_r2,
                &sampled.qual_r2,
            )?;
        }
    }

    for writer in dedup_writers {
        writer.finish()?;
    }
    for writer in trimmed_writers {
        writer.finish()?;
    }
    rti_header_out.flush().context("Failed to flush RTI header index")?;

    timer.log_completion(metrics.total_pairs);
    Ok(metrics)
}

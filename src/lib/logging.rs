//! Logging utilities for formatted output.
//!
//! Provides percentage formatting, an operation timer, and the end-of-run
//! summary that reports per-amplicon and global deduplication statistics.

use std::time::{Duration, Instant};

use crate::amplicon::AmpliconPanel;
use crate::metrics::{RunMetrics, fraction};

/// Formats a percentage with specified decimal places.
///
/// # Arguments
///
/// * `value` - The fraction (0.0-1.0) to format as percentage
/// * `decimals` - Number of decimal places to include
///
/// # Examples
///
/// ```
/// use ampdedup_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(0.5, 1), "50.0%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration in human-readable form.
///
/// # Examples
///
/// ```
/// use ampdedup_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Logs a formatted summary of a deduplication run.
///
/// Reports the per-category discard counts with percentages, a per-amplicon
/// usable/unique/duplication-rate table in panel order, and the global
/// unique-molecule count and duplication rate. Amplicons with no usable
/// reads report zeros rather than dividing by zero.
pub fn log_run_summary(metrics: &RunMetrics, panel: &AmpliconPanel) {
    log::info!("Total paired reads: {}", metrics.total_pairs);
    log::info!(
        "N-masked paired reads: {} ({})",
        metrics.n_masked,
        format_percent(fraction(metrics.n_masked, metrics.total_pairs), 2)
    );
    log::info!(
        "RTI quality discarded paired reads: {} ({})",
        metrics.rti_quality_discarded,
        format_percent(fraction(metrics.rti_quality_discarded, metrics.total_pairs), 2)
    );
    log::info!(
        "Unmatched primer paired reads: {} ({})",
        metrics.primer_unmatched(),
        format_percent(fraction(metrics.primer_unmatched(), metrics.total_pairs), 2)
    );
    log::info!(
        "Short insert discarded paired reads: {} ({})",
        metrics.short_insert_discarded,
        format_percent(fraction(metrics.short_insert_discarded, metrics.total_pairs), 2)
    );

    log::info!("Amplicon\tUsableReads\tUniqueReads\tDuplicationRate");
    for amplicon in panel.iter() {
        let usable = metrics.usable_reads(&amplicon.id);
        let unique = metrics.unique_reads(&amplicon.id);
        if usable == 0 {
            log::info!("{}\t0\t0\t0", amplicon.id);
        } else {
            let dup_rate = 1.0 - fraction(unique, usable);
            log::info!("{}\t{usable}\t{unique}\t{}", amplicon.id, format_percent(dup_rate, 2));
        }
    }

    log::info!(
        "Unique molecules: {} ({})",
        metrics.total_unique_molecules,
        format_percent(fraction(metrics.total_unique_molecules, metrics.total_usable_reads), 2)
    );
    log::info!("Duplication rate: {}", format_percent(metrics.duplication_rate(), 2));
}

/// Operation timing and summary helper.
///
/// Tracks operation timing and provides formatted summary output.
///
/// # Examples
///
/// ```no_run
/// use ampdedup_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Processing read pairs");
///
/// // ... do work ...
///
/// timer.log_completion(10_000); // Log with item count
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Logs the completion with item count.
    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!("{} completed: {count} in {}", self.operation, format_duration(duration));
    }
}

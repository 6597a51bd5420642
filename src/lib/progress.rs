//! Progress tracking utilities
//!
//! Provides a progress tracker for logging counts at regular intervals
//! during the single-pass streaming loop.

use log::info;

/// Progress tracker for logging progress at regular intervals.
///
/// Maintains an internal count and logs progress messages when the count
/// crosses interval boundaries. The pipeline is single-threaded, so the
/// counter is plain state behind `&mut self`.
///
/// # Example
/// ```
/// use ampdedup_lib::progress::ProgressTracker;
///
/// let mut tracker = ProgressTracker::new("Processed read pairs").with_interval(100);
///
/// for _ in 0..250 {
///     tracker.log_if_needed(1); // Logs at 100, 200
/// }
/// tracker.log_final(); // Logs "Processed read pairs 250 (complete)"
/// ```
pub struct ProgressTracker {
    /// The logging interval - progress is logged when count crosses multiples of this.
    interval: u64,
    /// Message prefix for log output.
    message: String,
    /// Count of items processed so far.
    count: u64,
}

impl ProgressTracker {
    /// Create a new progress tracker with the specified message.
    ///
    /// The tracker starts with a count of 0 and a default interval of 100,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 100_000, message: message.into(), count: 0 }
    }

    /// Set the logging interval.
    ///
    /// Progress will be logged each time the count crosses a multiple of this
    /// interval.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Add to the count and log if an interval boundary was crossed.
    ///
    /// # Returns
    /// `true` if the final count is exactly a multiple of the interval,
    /// `false` otherwise. `log_final` uses this to know whether a closing
    /// message is still needed.
    pub fn log_if_needed(&mut self, additional: u64) -> bool {
        let prev = self.count;
        self.count += additional;

        let prev_intervals = prev / self.interval;
        let new_intervals = self.count / self.interval;
        for i in (prev_intervals + 1)..=new_intervals {
            info!("{} {}", self.message, i * self.interval);
        }

        self.count > 0 && self.count % self.interval == 0
    }

    /// Log final progress.
    ///
    /// If the current count is not exactly on an interval boundary, logs a
    /// final message with "(complete)"; otherwise the last `log_if_needed`
    /// call already reported it.
    pub fn log_final(&mut self) {
        if !self.log_if_needed(0) && self.count > 0 {
            info!("{} {} (complete)", self.message, self.count);
        }
    }

    /// Get the current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tracker_new() {
        let tracker = ProgressTracker::new("Processing");
        assert_eq!(tracker.interval, 100_000);
        assert_eq!(tracker.message, "Processing");
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn test_with_interval() {
        let tracker = ProgressTracker::new("Processing").with_interval(100);
        assert_eq!(tracker.interval, 100);
    }

    #[test]
    fn test_log_if_needed_returns_correctly() {
        let mut tracker = ProgressTracker::new("Test").with_interval(10);

        assert!(!tracker.log_if_needed(5)); // count=5
        assert!(!tracker.log_if_needed(3)); // count=8
        assert!(tracker.log_if_needed(2)); // count=10, exactly on interval
        assert!(!tracker.log_if_needed(5)); // count=15
        assert!(!tracker.log_if_needed(10)); // count=25, crossed 20
    }

    #[test]
    fn test_log_if_needed_zero() {
        let mut tracker = ProgressTracker::new("Test").with_interval(10);

        assert!(!tracker.log_if_needed(0));
        tracker.log_if_needed(10);
        assert!(tracker.log_if_needed(0)); // count=10, exactly on interval
        tracker.log_if_needed(5);
        assert!(!tracker.log_if_needed(0)); // count=15
    }

    #[test]
    fn test_count() {
        let mut tracker = ProgressTracker::new("Test").with_interval(100);

        assert_eq!(tracker.count(), 0);
        tracker.log_if_needed(50);
        assert_eq!(tracker.count(), 50);
        tracker.log_if_needed(75);
        assert_eq!(tracker.count(), 125);
    }

    #[test]
    fn test_crossing_multiple_intervals() {
        let mut tracker = ProgressTracker::new("Test").with_interval(10);

        assert!(!tracker.log_if_needed(35)); // crossed 10, 20, 30 but not on interval
        assert_eq!(tracker.count(), 35);
        assert!(tracker.log_if_needed(5)); // count=40
    }

    #[test]
    fn test_log_final() {
        let mut tracker = ProgressTracker::new("Test").with_interval(10);
        tracker.log_if_needed(25);
        tracker.log_final();
        assert_eq!(tracker.count(), 25);
    }
}

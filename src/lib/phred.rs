//! Phred quality score utilities.
//!
//! Converts ASCII-encoded quality characters to error probabilities and
//! aggregates them per read. The pipeline uses the arithmetic mean of the
//! per-base error probability as a read-level error score (the usearch
//! "average quality" definition) and the worst single base as the RTI-level
//! error score. The Phred offset is always an explicit parameter because the
//! same functions are applied at offsets other than 33 in legacy data.

/// Decodes a single quality character to its Phred score.
///
/// The result is signed: qualities below the offset decode to negative
/// scores rather than wrapping, which keeps threshold comparisons honest on
/// malformed input.
#[inline]
#[must_use]
pub fn phred_score(qual: u8, offset: u8) -> i32 {
    i32::from(qual) - i32::from(offset)
}

/// Converts a single quality character to its error probability.
///
/// Phred score Q relates to error probability P by `P = 10^(-Q/10)`.
///
/// # Examples
///
/// ```
/// use ampdedup_lib::phred::base_error_probability;
///
/// // Q20 ('5' at Phred+33) corresponds to a 1% error rate
/// let p = base_error_probability(b'5', 33);
/// assert!((p - 0.01).abs() < 1e-12);
/// ```
#[inline]
#[must_use]
pub fn base_error_probability(qual: u8, offset: u8) -> f64 {
    10f64.powf(f64::from(phred_score(qual, offset)) / -10.0)
}

/// Mean per-base error probability across a quality string.
///
/// Returns 0.0 for an empty string; the pipeline never scores empty reads
/// because the insert-length filter runs first.
#[must_use]
pub fn mean_error_rate(quals: &[u8], offset: u8) -> f64 {
    if quals.is_empty() {
        return 0.0;
    }
    let sum: f64 = quals.iter().map(|&q| base_error_probability(q, offset)).sum();
    sum / quals.len() as f64
}

/// Highest per-base error probability across a quality string.
///
/// Returns 0.0 for an empty string.
#[must_use]
pub fn max_error_rate(quals: &[u8], offset: u8) -> f64 {
    quals.iter().map(|&q| base_error_probability(q, offset)).fold(0.0, f64::max)
}

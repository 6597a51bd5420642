//! Primer matching and adapter clipping via local alignment.
//!
//! A read is assigned to an amplicon by locally aligning each primer
//! against the read with Smith-Waterman (match +1, mismatch -2, gap open
//! -4, gap extend -4) and accepting only alignments that score at least
//! [`MIN_ALIGNMENT_SCORE`] *and* begin at position 0 in both the read and
//! the primer. The anchoring condition is the load-bearing part: it rejects
//! primer-like sequence occurring anywhere but the read's 5' end.
//!
//! The same scoring drives [`clip_trailing_primer`], which removes
//! read-through into the downstream adapter (the reverse complement of the
//! opposite primer) together with everything after it.

use bio::alignment::pairwise::Aligner;

/// Smith-Waterman match score.
const MATCH_SCORE: i32 = 1;
/// Smith-Waterman mismatch penalty.
const MISMATCH_SCORE: i32 = -2;
/// Affine gap-open penalty.
const GAP_OPEN: i32 = -4;
/// Affine gap-extend penalty.
const GAP_EXTEND: i32 = -4;
/// Minimum local-alignment score for a primer hit to count.
const MIN_ALIGNMENT_SCORE: i32 = 10;

#[inline]
fn score(a: u8, b: u8) -> i32 {
    if a == b { MATCH_SCORE } else { MISMATCH_SCORE }
}

/// Tests whether `primer` matches the 5' end of `read`.
///
/// Accepts only when the best local alignment scores at least
/// [`MIN_ALIGNMENT_SCORE`] and has no unaligned leading bases on either
/// sequence. A consequence of the score floor is that primers shorter than
/// ten bases can never match, even perfectly.
///
/// # Examples
///
/// ```
/// use ampdedup_lib::primer::matches_primer_prefix;
///
/// let read = b"ACGTACGTACGTTTTTTTTTTTTTTTTT";
/// assert!(matches_primer_prefix(read, b"ACGTACGTACGT"));
/// // Same primer internal to the read: rejected by anchoring
/// assert!(!matches_primer_prefix(b"TTTTTACGTACGTACGTTTTT", b"ACGTACGTACGT"));
/// ```
#[must_use]
pub fn matches_primer_prefix(read: &[u8], primer: &[u8]) -> bool {
    if read.is_empty() || primer.is_empty() {
        return false;
    }
    let mut aligner = Aligner::with_capacity(read.len(), primer.len(), GAP_OPEN, GAP_EXTEND, score);
    let alignment = aligner.local(read, primer);
    alignment.score >= MIN_ALIGNMENT_SCORE && alignment.xstart == 0 && alignment.ystart == 0
}

/// Removes a trailing adapter match (and all bases after it) from a read.
///
/// `adapter` is the reverse complement of the opposite amplicon primer;
/// finding it means the sequencer read through the insert into the far
/// adapter. The read and its quality string are truncated in lock-step at
/// the read-side start of the best local alignment, provided that alignment
/// scores at least [`MIN_ALIGNMENT_SCORE`]. Reads without an adequate match
/// are left unchanged.
pub fn clip_trailing_primer(seq: &mut Vec<u8>, qual: &mut Vec<u8>, adapter: &[u8]) {
    if seq.is_empty() || adapter.is_empty() {
        return;
    }
    let mut aligner = Aligner::with_capacity(seq.len(), adapter.len(), GAP_OPEN, GAP_EXTEND, score);
    let alignment = aligner.local(seq, adapter);
    if alignment.score >= MIN_ALIGNMENT_SCORE {
        seq.truncate(alignment.xstart);
        qual.truncate(alignment.xstart);
    }
}

//! Random template identifier (RTI) extraction and quality gating.
//!
//! Each mate carries an RTI at its 5' end followed by a fixed
//! anti-complementary spacer with no information value. The composite RTI
//! key is the forward RTI concatenated with the reverse complement of the
//! reverse RTI, giving a fixed key width of `2 * rti_len`. The quality gate
//! requires every RTI base on both mates to meet a minimum Phred score
//! before the pair is allowed to contribute a key.

use crate::dna::reverse_complement;
use crate::phred::phred_score;

/// A composite RTI extracted from a read pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtiTag {
    /// `seq_r1[..rti_len] + reverse_complement(seq_r2[..rti_len])`
    pub key: String,
    /// `qual_r1[..rti_len] + qual_r2[..rti_len]` (unmodified orientation)
    pub quals: Vec<u8>,
}

/// Builds the composite RTI key and its quality bytes from a read pair.
///
/// Callers must have passed both mates through [`rti_passes_quality`]
/// first, which guarantees at least `rti_len` bases are present.
#[must_use]
pub fn extract_rti(
    seq_r1: &[u8],
    seq_r2: &[u8],
    qual_r1: &[u8],
    qual_r2: &[u8],
    rti_len: usize,
) -> RtiTag {
    let mut key_bytes = seq_r1[..rti_len].to_vec();
    key_bytes.extend_from_slice(&reverse_complement(&seq_r2[..rti_len]));

    let mut quals = qual_r1[..rti_len].to_vec();
    quals.extend_from_slice(&qual_r2[..rti_len]);

    RtiTag { key: String::from_utf8_lossy(&key_bytes).into_owned(), quals }
}

/// Tests whether every base of the RTI meets the minimum quality.
///
/// Short-circuits on the first failing base. A read with fewer than
/// `rti_len` quality bytes cannot satisfy the gate and fails.
#[must_use]
pub fn rti_passes_quality(quals: &[u8], rti_len: usize, offset: u8, min_quality: u8) -> bool {
    if quals.len() < rti_len {
        return false;
    }
    quals[..rti_len].iter().all(|&q| phred_score(q, offset) >= i32::from(min_quality))
}

/// Detects the platform's all-N placeholder reads, which carry no sequence.
#[must_use]
pub fn is_n_masked(seq: &[u8]) -> bool {
    !seq.is_empty() && seq.iter().all(|&b| b == b'N')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_rti_key_and_quals() {
        let tag = extract_rti(b"AACCGTTTTT", b"GGTTACCCCC", b"IIIJJ55555", b"ABCDE66666", 5);
        // Key = R1[..5] + revcomp(R2[..5])
        assert_eq!(tag.key, "AACCGTAACC");
        assert_eq!(tag.key.len(), 2 * 5);
        // Quals = R1[..5] + R2[..5], reverse side NOT reversed
        assert_eq!(tag.quals, b"IIIJJABCDE");
    }

    #[test]
    fn test_extract_rti_reverse_side_is_reverse_complemented() {
        let tag = extract_rti(b"AAAAAXXX", b"TTTTTXXX", b"IIIIIXXX", b"IIIIIXXX", 5);
        assert_eq!(&tag.key[5..], "AAAAA");
    }

    #[test]
    fn test_rti_passes_quality() {
        // 'I' = Q40, '5' = Q20, '!' = Q0 at Phred+33
        assert!(rti_passes_quality(b"IIIII", 5, 33, 17));
        assert!(rti_passes_quality(b"55555", 5, 33, 20));
        // One base below threshold fails the whole gate
        assert!(!rti_passes_quality(b"II!II", 5, 33, 17));
        // Bases past the RTI region are ignored
        assert!(rti_passes_quality(b"IIIII!!!!!", 5, 33, 17));
    }

    #[test]
    fn test_rti_quality_boundary() {
        // '2' = Q17: exactly at the threshold passes
        assert!(rti_passes_quality(b"22222", 5, 33, 17));
        // '1' = Q16: one below fails
        assert!(!rti_passes_quality(b"21222", 5, 33, 17));
    }

    #[test]
    fn test_short_read_fails_gate() {
        assert!(!rti_passes_quality(b"III", 5, 33, 17));
        assert!(!rti_passes_quality(b"", 5, 33, 17));
    }

    #[test]
    fn test_is_n_masked() {
        assert!(is_n_masked(b"NNNNNNNNNN"));
        assert!(!is_n_masked(b"NNNNANNNNN"));
        assert!(!is_n_masked(b"ACGT"));
        assert!(!is_n_masked(b""));
    }
}

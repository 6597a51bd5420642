//! The molecule ledger: best-representative-per-RTI state.
//!
//! The ledger maps `amplicon -> (RTI key -> Molecule)` and is updated
//! online as read pairs stream past: the first observation of an
//! (amplicon, RTI) pair banks the read, later observations either replace
//! the retained copy (strictly lower read error) or only bump the
//! statistics. Two post-stream passes soft-delete molecules via the `emit`
//! flag - entries are never removed, so iteration state stays valid across
//! passes and emission simply skips tombstones.
//!
//! The inner map is a `BTreeMap` so RTI iteration is lexicographic, which
//! makes the collapser's pair order (and therefore its tie-break) and the
//! emission order deterministic.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::dna::hamming_distance;
use crate::fastq::ReadPair;

/// The deduplicated representative record for one (amplicon, RTI) pair.
///
/// `read_errors` scores the currently retained read only; `rti_errors` and
/// `frequency` accumulate over every observation ever merged into this
/// molecule, including ones whose sequence was later superseded.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    /// Retained R1 header
    pub header_r1: String,
    /// Retained R2 header
    pub header_r2: String,
    /// Retained R1 bases (trimmed and clipped)
    pub seq_r1: Vec<u8>,
    /// Retained R2 bases (trimmed and clipped)
    pub seq_r2: Vec<u8>,
    /// Retained R1 quality bytes
    pub qual_r1: Vec<u8>,
    /// Retained R2 quality bytes
    pub qual_r2: Vec<u8>,
    /// Summed mean error rate of both mates of the retained read
    pub read_errors: f64,
    /// Worst-RTI-base error, summed across all merged observations
    pub rti_errors: f64,
    /// Number of raw pairs merged into this molecule
    pub frequency: u64,
    /// Cleared by the admission filter or collapser to soft-delete
    pub emit: bool,
}

impl Molecule {
    fn from_pair(pair: &ReadPair, read_errors: f64, rti_errors: f64) -> Self {
        Self {
            header_r1: pair.header_r1.clone(),
            header_r2: pair.header_r2.clone(),
            seq_r1: pair.seq_r1.clone(),
            seq_r2: pair.seq_r2.clone(),
            qual_r1: pair.qual_r1.clone(),
            qual_r2: pair.qual_r2.clone(),
            read_errors,
            rti_errors,
            frequency: 1,
            emit: true,
        }
    }

    fn replace_retained(&mut self, pair: &ReadPair, read_errors: f64) {
        self.header_r1 = pair.header_r1.clone();
        self.header_r2 = pair.header_r2.clone();
        self.seq_r1 = pair.seq_r1.clone();
        self.seq_r2 = pair.seq_r2.clone();
        self.qual_r1 = pair.qual_r1.clone();
        self.qual_r2 = pair.qual_r2.clone();
        self.read_errors = read_errors;
    }
}

/// Streaming state: one molecule per (amplicon, RTI) pair.
#[derive(Debug, Default)]
pub struct MoleculeLedger {
    molecules: HashMap<String, BTreeMap<String, Molecule>>,
}

impl MoleculeLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one usable read pair into the ledger.
    ///
    /// First observation of the key banks the pair with frequency 1.
    /// Subsequent observations always increment `frequency` and add
    /// `rti_errors`; the retained sequence is replaced only when the new
    /// read's error score is strictly lower, so equal-error duplicates keep
    /// the earlier-seen read regardless of arrival order.
    pub fn observe(
        &mut self,
        amplicon_id: &str,
        rti: &str,
        pair: &ReadPair,
        read_errors: f64,
        rti_errors: f64,
    ) {
        let per_rti = self.molecules.entry(amplicon_id.to_string()).or_default();
        match per_rti.entry(rti.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(Molecule::from_pair(pair, read_errors, rti_errors));
            }
            Entry::Occupied(mut slot) => {
                let molecule = slot.get_mut();
                if read_errors < molecule.read_errors {
                    molecule.replace_retained(pair, read_errors);
                }
                molecule.frequency += 1;
                molecule.rti_errors += rti_errors;
            }
        }
    }

    /// Soft-deletes molecules whose depth-to-error ratio is too low.
    ///
    /// For each still-emitting molecule, `avg = rti_errors / frequency` and
    /// the molecule survives iff `frequency / avg >= min_depth_error_rate`.
    /// Returns the number of molecules cleared. Must run before
    /// [`collapse`](Self::collapse) so low-confidence RTIs cannot take part
    /// in collapse comparisons.
    pub fn apply_depth_filter(&mut self, min_depth_error_rate: f64) -> u64 {
        let mut cleared = 0;
        for per_rti in self.molecules.values_mut() {
            for molecule in per_rti.values_mut() {
                if !molecule.emit {
                    continue;
                }
                let avg_rti_error = molecule.rti_errors / molecule.frequency as f64;
                if (molecule.frequency as f64) / avg_rti_error < min_depth_error_rate {
                    molecule.emit = false;
                    cleared += 1;
                }
            }
        }
        cleared
    }

    /// Soft-deletes RTIs within `min_edit_distance` of a more frequent RTI.
    ///
    /// Per amplicon, still-emitting RTI keys are compared pairwise in
    /// lexicographic order. A pair at Hamming distance below the threshold
    /// is treated as one molecule corrupted by sequencing/synthesis error:
    /// the lower-frequency member is tombstoned, and on a frequency tie the
    /// earlier key loses. A key tombstoned mid-pass takes no further part
    /// in comparisons. This is deliberately a greedy pairwise pass, not a
    /// transitive clustering - with three or more mutually-close RTIs the
    /// outcome depends on the pair order, and downstream consumers rely on
    /// exactly these semantics. Returns the number of molecules cleared.
    pub fn collapse(&mut self, min_edit_distance: usize) -> u64 {
        let mut cleared = 0;
        for per_rti in self.molecules.values_mut() {
            // Distinct map keys are never at distance zero, so the identity
            // case needs no special handling.
            let keys: Vec<String> =
                per_rti.iter().filter(|(_, m)| m.emit).map(|(k, _)| k.clone()).collect();
            for i in 0..keys.len() {
                if !per_rti[&keys[i]].emit {
                    continue;
                }
                for j in (i + 1)..keys.len() {
                    if !per_rti[&keys[j]].emit {
                        continue;
                    }
                    let distance = hamming_distance(keys[i].as_bytes(), keys[j].as_bytes());
                    if distance >= min_edit_distance {
                        continue;
                    }
                    if per_rti[&keys[i]].frequency > per_rti[&keys[j]].frequency {
                        if let Some(m) = per_rti.get_mut(&keys[j]) {
                            m.emit = false;
                            cleared += 1;
                        }
                    } else {
                        if let Some(m) = per_rti.get_mut(&keys[i]) {
                            m.emit = false;
                            cleared += 1;
                        }
                        break;
                    }
                }
            }
        }
        cleared
    }

    /// Iterates the still-emitting molecules of one amplicon in
    /// lexicographic RTI order.
    pub fn emitted<'a>(
        &'a self,
        amplicon_id: &str,
    ) -> impl Iterator<Item = (&'a String, &'a Molecule)> {
        self.molecules
            .get(amplicon_id)
            .into_iter()
            .flat_map(|per_rti| per_rti.iter())
            .filter(|(_, molecule)| molecule.emit)
    }

    /// Looks up a single molecule (used by tests and diagnostics).
    #[must_use]
    pub fn get(&self, amplicon_id: &str, rti: &str) -> Option<&Molecule> {
        self.molecules.get(amplicon_id).and_then(|per_rti| per_rti.get(rti))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(name: &str, seq: &[u8]) -> ReadPair {
        ReadPair {
            header_r1: format!("{name}/1"),
            header_r2: format!("{name}/2"),
            seq_r1: seq.to_vec(),
            seq_r2: seq.to_vec(),
            qual_r1: vec![b'I'; seq.len()],
            qual_r2: vec![b'I'; seq.len()],
        }
    }

    #[test]
    fn test_first_observation_banks_read() {
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "AAAAATTTTT", &pair("r1", b"ACGT"), 0.01, 1e-4);

        let molecule = ledger.get("AMP1", "AAAAATTTTT").unwrap();
        assert_eq!(molecule.frequency, 1);
        assert!((molecule.read_errors - 0.01).abs() < 1e-12);
        assert!((molecule.rti_errors - 1e-4).abs() < 1e-12);
        assert!(molecule.emit);
        assert_eq!(molecule.header_r1, "r1/1");
    }

    #[test]
    fn test_noisier_duplicate_keeps_first_read() {
        // A noisier duplicate bumps the stats but never the sequence
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "AAAAATTTTT", &pair("first", b"ACGT"), 0.01, 1e-4);
        ledger.observe("AMP1", "AAAAATTTTT", &pair("second", b"TTTT"), 0.02, 2e-4);

        let molecule = ledger.get("AMP1", "AAAAATTTTT").unwrap();
        assert_eq!(molecule.frequency, 2);
        assert_eq!(molecule.header_r1, "first/1");
        assert_eq!(molecule.seq_r1, b"ACGT");
        assert!((molecule.read_errors - 0.01).abs() < 1e-12);
        // RTI errors accumulate across both observations
        assert!((molecule.rti_errors - 3e-4).abs() < 1e-12);
    }

    #[test]
    fn test_cleaner_duplicate_replaces_read() {
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "AAAAATTTTT", &pair("noisy", b"ACGT"), 0.05, 1e-4);
        ledger.observe("AMP1", "AAAAATTTTT", &pair("clean", b"AGGT"), 0.01, 1e-4);

        let molecule = ledger.get("AMP1", "AAAAATTTTT").unwrap();
        assert_eq!(molecule.frequency, 2);
        assert_eq!(molecule.header_r1, "clean/1");
        assert_eq!(molecule.seq_r1, b"AGGT");
        assert!((molecule.read_errors - 0.01).abs() < 1e-12);
        assert!((molecule.rti_errors - 2e-4).abs() < 1e-12);
    }

    #[test]
    fn test_equal_error_duplicate_keeps_earlier_read() {
        // Strict < comparison: ties retain the incumbent
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "AAAAATTTTT", &pair("first", b"ACGT"), 0.01, 1e-4);
        ledger.observe("AMP1", "AAAAATTTTT", &pair("tied", b"TTTT"), 0.01, 1e-4);

        let molecule = ledger.get("AMP1", "AAAAATTTTT").unwrap();
        assert_eq!(molecule.header_r1, "first/1");
        assert_eq!(molecule.frequency, 2);
    }

    #[test]
    fn test_same_rti_different_amplicons_stay_separate() {
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "AAAAATTTTT", &pair("a", b"ACGT"), 0.01, 1e-4);
        ledger.observe("AMP2", "AAAAATTTTT", &pair("b", b"ACGT"), 0.01, 1e-4);

        assert_eq!(ledger.get("AMP1", "AAAAATTTTT").unwrap().frequency, 1);
        assert_eq!(ledger.get("AMP2", "AAAAATTTTT").unwrap().frequency, 1);
    }

    #[test]
    fn test_depth_filter_clears_low_confidence() {
        let mut ledger = MoleculeLedger::new();
        // frequency 1, avg error 1e-3 -> score 1000: survives at threshold 1000
        ledger.observe("AMP1", "AAAAATTTTT", &pair("ok", b"ACGT"), 0.01, 1e-3);
        // frequency 1, avg error 1e-2 -> score 100: cleared
        ledger.observe("AMP1", "CCCCCGGGGG", &pair("bad", b"ACGT"), 0.01, 1e-2);

        let cleared = ledger.apply_depth_filter(1000.0);
        assert_eq!(cleared, 1);
        assert!(ledger.get("AMP1", "AAAAATTTTT").unwrap().emit);
        assert!(!ledger.get("AMP1", "CCCCCGGGGG").unwrap().emit);
        // Tombstoned, not removed
        assert_eq!(ledger.get("AMP1", "CCCCCGGGGG").unwrap().frequency, 1);
    }

    #[test]
    fn test_collapse_prefers_higher_frequency() {
        // Distance-1 keys with frequencies 5 and 2 at threshold 2:
        // the frequency-2 molecule is tombstoned
        let mut ledger = MoleculeLedger::new();
        for _ in 0..5 {
            ledger.observe("AMP1", "AAAAATTTTT", &pair("major", b"ACGT"), 0.01, 1e-4);
        }
        for _ in 0..2 {
            ledger.observe("AMP1", "AAAAATTTTC", &pair("minor", b"ACGT"), 0.01, 1e-4);
        }

        let cleared = ledger.collapse(2);
        assert_eq!(cleared, 1);
        assert!(ledger.get("AMP1", "AAAAATTTTT").unwrap().emit);
        assert!(!ledger.get("AMP1", "AAAAATTTTC").unwrap().emit);
    }

    #[test]
    fn test_collapse_ignores_distant_keys() {
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "AAAAATTTTT", &pair("a", b"ACGT"), 0.01, 1e-4);
        // Distance 2 is not strictly below the threshold of 2
        ledger.observe("AMP1", "AAAAATTTCC", &pair("b", b"ACGT"), 0.01, 1e-4);

        assert_eq!(ledger.collapse(2), 0);
        assert!(ledger.get("AMP1", "AAAAATTTTT").unwrap().emit);
        assert!(ledger.get("AMP1", "AAAAATTTCC").unwrap().emit);
    }

    #[test]
    fn test_collapse_tie_clears_lexicographically_smaller_key() {
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "AAAAATTTTC", &pair("a", b"ACGT"), 0.01, 1e-4);
        ledger.observe("AMP1", "AAAAATTTTT", &pair("b", b"ACGT"), 0.01, 1e-4);

        assert_eq!(ledger.collapse(2), 1);
        assert!(!ledger.get("AMP1", "AAAAATTTTC").unwrap().emit);
        assert!(ledger.get("AMP1", "AAAAATTTTT").unwrap().emit);
    }

    #[test]
    fn test_collapse_is_greedy_not_transitive() {
        // Three keys pairwise within distance 1 of the middle key:
        // A=GAAAA, B=CAAAA, C=CAAAT. A-B distance 1, B-C distance 1,
        // A-C distance 2. Frequencies: A=3, B=1, C=2.
        let mut ledger = MoleculeLedger::new();
        for _ in 0..3 {
            ledger.observe("AMP1", "GAAAA", &pair("a", b"ACGT"), 0.01, 1e-4);
        }
        ledger.observe("AMP1", "CAAAA", &pair("b", b"ACGT"), 0.01, 1e-4);
        for _ in 0..2 {
            ledger.observe("AMP1", "CAAAT", &pair("c", b"ACGT"), 0.01, 1e-4);
        }

        ledger.collapse(2);
        // Pair order is lexicographic: (CAAAA, CAAAT) first -> CAAAA loses;
        // CAAAA is then skipped entirely, so GAAAA never sees it and both
        // survivors remain even though GAAAA-CAAAA would also have collided.
        assert!(!ledger.get("AMP1", "CAAAA").unwrap().emit);
        assert!(ledger.get("AMP1", "CAAAT").unwrap().emit);
        assert!(ledger.get("AMP1", "GAAAA").unwrap().emit);
    }

    #[test]
    fn test_collapse_skips_tombstoned_molecules() {
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "AAAAATTTTT", &pair("a", b"ACGT"), 0.01, 1e-2);
        for _ in 0..2 {
            ledger.observe("AMP1", "AAAAATTTTC", &pair("b", b"ACGT"), 0.01, 1e-4);
        }

        // The depth filter clears the noisy singleton first; the collapser
        // must not resurrect or count it.
        ledger.apply_depth_filter(1000.0);
        assert!(!ledger.get("AMP1", "AAAAATTTTT").unwrap().emit);
        assert_eq!(ledger.collapse(2), 0);
        assert!(ledger.get("AMP1", "AAAAATTTTC").unwrap().emit);
    }

    #[test]
    fn test_emitted_is_sorted_and_skips_tombstones() {
        let mut ledger = MoleculeLedger::new();
        ledger.observe("AMP1", "CCCCCGGGGG", &pair("c", b"ACGT"), 0.01, 1e-4);
        ledger.observe("AMP1", "AAAAATTTTT", &pair("a", b"ACGT"), 0.01, 1e-4);
        ledger.observe("AMP1", "GGGGGAAAAA", &pair("g", b"ACGT"), 0.01, 1e-2);

        ledger.apply_depth_filter(1000.0);
        let keys: Vec<&String> = ledger.emitted("AMP1").map(|(k, _)| k).collect();
        assert_eq!(keys, ["AAAAATTTTT", "CCCCCGGGGG"]);

        assert_eq!(ledger.emitted("ABSENT").count(), 0);
    }
}

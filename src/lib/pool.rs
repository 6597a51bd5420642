//! The unfiltered read pool and depth-matched downsampler.
//!
//! Every primer-matched, length-passing pair is appended to its amplicon's
//! pool regardless of RTI, giving a pre-deduplication baseline. After the
//! filters fix the per-amplicon unique-molecule counts, each pool is
//! uniformly shuffled (Fisher-Yates via `SliceRandom`) and truncated to
//! that count, producing a non-deduplicated output at matched depth for
//! like-for-like duplication-rate comparison.

use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

use crate::fastq::ReadPair;

/// Per-amplicon ordered pools of retained read pairs.
#[derive(Debug, Default)]
pub struct UnfilteredPool {
    pools: HashMap<String, Vec<ReadPair>>,
}

impl UnfilteredPool {
    /// Creates an empty pool set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pair to its amplicon's pool.
    pub fn push(&mut self, amplicon_id: &str, pair: ReadPair) {
        self.pools.entry(amplicon_id.to_string()).or_default().push(pair);
    }

    /// Number of pairs pooled for an amplicon.
    #[must_use]
    pub fn len(&self, amplicon_id: &str) -> usize {
        self.pools.get(amplicon_id).map_or(0, Vec::len)
    }

    /// Whether nothing has been pooled for an amplicon.
    #[must_use]
    pub fn is_empty(&self, amplicon_id: &str) -> bool {
        self.len(amplicon_id) == 0
    }

    /// Shuffles an amplicon's pool and returns the first `depth` entries.
    ///
    /// `depth` is the amplicon's emitted-molecule count; it can never
    /// exceed the pool size because every emitted molecule came from a
    /// pooled pair, but the slice saturates defensively anyway.
    pub fn downsample<R: Rng>(
        &mut self,
        amplicon_id: &str,
        depth: usize,
        rng: &mut R,
    ) -> &[ReadPair] {
        match self.pools.get_mut(amplicon_id) {
            Some(pool) => {
                pool.shuffle(rng);
                &pool[..depth.min(pool.len())]
            }
            None => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn pair(name: &str) -> ReadPair {
        ReadPair {
            header_r1: format!("{name}/1"),
            header_r2: format!("{name}/2"),
            seq_r1: b"ACGT".to_vec(),
            seq_r2: b"TGCA".to_vec(),
            qual_r1: b"IIII".to_vec(),
            qual_r2: b"IIII".to_vec(),
        }
    }

    #[test]
    fn test_push_and_len() {
        let mut pool = UnfilteredPool::new();
        assert!(pool.is_empty("AMP1"));

        pool.push("AMP1", pair("r1"));
        pool.push("AMP1", pair("r2"));
        pool.push("AMP2", pair("r3"));

        assert_eq!(pool.len("AMP1"), 2);
        assert_eq!(pool.len("AMP2"), 1);
        assert_eq!(pool.len("ABSENT"), 0);
    }

    #[test]
    fn test_downsample_exact_depth_and_distinct_entries() {
        let mut pool = UnfilteredPool::new();
        for i in 0..20 {
            pool.push("AMP1", pair(&format!("r{i}")));
        }

        let mut rng = StdRng::seed_from_u64(7);
        let sampled = pool.downsample("AMP1", 8, &mut rng);
        assert_eq!(sampled.len(), 8);

        // Every sampled entry is a distinct original pool entry
        let names: HashSet<&String> = sampled.iter().map(|p| &p.header_r1).collect();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_downsample_depth_saturates_at_pool_size() {
        let mut pool = UnfilteredPool::new();
        pool.push("AMP1", pair("only"));

        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pool.downsample("AMP1", 10, &mut rng).len(), 1);
    }

    #[test]
    fn test_downsample_absent_amplicon_is_empty() {
        let mut pool = UnfilteredPool::new();
        let mut rng = StdRng::seed_from_u64(7);
        assert!(pool.downsample("ABSENT", 5, &mut rng).is_empty());
    }

    #[test]
    fn test_downsample_is_seed_reproducible() {
        let build = || {
            let mut pool = UnfilteredPool::new();
            for i in 0..50 {
                pool.push("AMP1", pair(&format!("r{i}")));
            }
            pool
        };

        let mut first = build();
        let mut second = build();
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);

        let names1: Vec<String> =
            first.downsample("AMP1", 10, &mut rng1).iter().map(|p| p.header_r1.clone()).collect();
        let names2: Vec<String> =
            second.downsample("AMP1", 10, &mut rng2).iter().map(|p| p.header_r1.clone()).collect();
        assert_eq!(names1, names2);
    }

    #[test]
    fn test_shuffle_marginal_uniformity() {
        // Over many seeded trials each entry should be selected roughly
        // equally often when taking 1 of 4.
        let mut counts = [0u32; 4];
        for seed in 0..400 {
            let mut pool = UnfilteredPool::new();
            for i in 0..4 {
                pool.push("AMP1", pair(&format!("r{i}")));
            }
            let mut rng = StdRng::seed_from_u64(seed);
            let picked = &pool.downsample("AMP1", 1, &mut rng)[0];
            let idx: usize =
                picked.header_r1.trim_start_matches('r').trim_end_matches("/1").parse().unwrap();
            counts[idx] += 1;
        }
        // Expect ~100 per entry; allow a generous band
        for &c in &counts {
            assert!((50..=150).contains(&c), "selection counts skewed: {counts:?}");
        }
    }
}

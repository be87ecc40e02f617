//! Bloom-filter bookkeeping for URLs already processed
//!
//! Memory stays fixed regardless of crawl breadth; the price is a small
//! false-positive rate, which at worst drops a URL from future visits.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Default expected number of tracked URLs
const DEFAULT_CAPACITY: usize = crate::limits::MAX_CRAWL_URLS as usize;

/// Default false-positive rate
const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.001;

/// Hash seed fixed for the lifetime of one filter
const DEFAULT_SEED: u64 = 0x51_7e_5e_eb;

/// Probabilistic set of visited URLs
///
/// Bit-array size, hash count, and seed are fixed at construction for a
/// whole crawl. `contains` has no false negatives; a positive answer may be
/// wrong with the configured probability.
#[derive(Debug, Clone)]
pub struct VisitedSet {
    bits: Vec<u8>,
    num_bits: usize,
    num_hashes: usize,
    seed: u64,
}

impl Default for VisitedSet {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_FALSE_POSITIVE_RATE)
    }
}

impl VisitedSet {
    /// Create a filter sized for `capacity` items at `false_positive_rate`
    ///
    /// Uses the standard optimal parameters: m = -n·ln(p)/ln(2)² bits and
    /// k = (m/n)·ln(2) hash probes.
    pub fn new(capacity: usize, false_positive_rate: f64) -> Self {
        let n = capacity.max(1) as f64;
        let m = (-n * false_positive_rate.ln() / (2.0_f64.ln().powi(2))).ceil() as usize;
        let num_bits = m.max(8);
        let k = ((num_bits as f64 / n) * 2.0_f64.ln()).round() as usize;
        Self::with_params(num_bits, k.clamp(1, 16), DEFAULT_SEED)
    }

    /// Create a filter with explicit parameters
    pub fn with_params(num_bits: usize, num_hashes: usize, seed: u64) -> Self {
        let num_bits = num_bits.max(8);
        Self {
            bits: vec![0u8; num_bits.div_ceil(8)],
            num_bits,
            num_hashes: num_hashes.max(1),
            seed,
        }
    }

    /// Record a URL as seen
    pub fn insert(&mut self, url: &str) {
        for i in 0..self.num_hashes {
            let bit_idx = self.probe(url, i);
            self.bits[bit_idx / 8] |= 1 << (bit_idx % 8);
        }
    }

    /// Test whether a URL was seen
    ///
    /// False means definitely unseen; true means seen, up to the configured
    /// false-positive rate.
    pub fn contains(&self, url: &str) -> bool {
        (0..self.num_hashes).all(|i| {
            let bit_idx = self.probe(url, i);
            self.bits[bit_idx / 8] & (1 << (bit_idx % 8)) != 0
        })
    }

    /// Size of the bit array in bytes
    pub fn size_bytes(&self) -> usize {
        self.bits.len()
    }

    /// Bit index for probe `i` of `url`
    fn probe(&self, url: &str, i: usize) -> usize {
        let hash = xxh3_64_with_seed(url.as_bytes(), self.seed.wrapping_add(i as u64));
        hash as usize % self.num_bits
    }
}

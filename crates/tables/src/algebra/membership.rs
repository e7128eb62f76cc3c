use fastbloom::BloomFilter;

/// Number of hash functions used by every membership filter.
pub const NUM_HASHES: u32 = 5;

/// Target false-positive rate of every membership filter.
pub const FALSE_POSITIVE_RATE: f64 = 0.005;

/// Number of bits a filter needs to hold `expected_items` values at
/// [`FALSE_POSITIVE_RATE`] with [`NUM_HASHES`] hash functions:
/// `ceil(-k * n / ln(1 - p^(1/k)))`.
pub fn vector_size(expected_items: usize) -> usize {
    let k = NUM_HASHES as f64;
    let n = expected_items as f64;
    (-k * n / (1.0 - FALSE_POSITIVE_RATE.powf(1.0 / k)).ln()).ceil() as usize
}

/// Approximate set of strings backed by a Bloom filter, which counts how
/// often lookups found a value already present.
///
/// A Bloom filter cannot remove values, so [`Self::reset`] allocates a new
/// one.
#[derive(Debug)]
pub struct MembershipFilter {
    /// Underlying Bloom filter.
    bloom_filter: BloomFilter,
    /// Number of bits requested for the filter.
    num_bits: usize,
    /// Number of lookups that found the value (possibly falsely) present.
    hits: usize,
    /// Number of lookups that found the value absent.
    misses: usize,
}

/// Statistics about a membership filter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FilterStats {
    /// Filter size in bytes.
    pub size_byte: usize,
    /// Number of hits.
    pub hits: usize,
    /// Number of misses.
    pub misses: usize,
}

impl MembershipFilter {
    /// Constructs a filter sized for `expected_items` distinct values.
    pub fn with_expected_items(expected_items: usize) -> Self {
        Self::with_num_bits(vector_size(expected_items).max(64))
    }

    fn with_num_bits(num_bits: usize) -> Self {
        Self {
            bloom_filter: BloomFilter::with_num_bits(num_bits).hashes(NUM_HASHES),
            num_bits,
            hits: 0,
            misses: 0,
        }
    }

    /// Replaces the filter with an empty one of the same size.
    pub fn reset(&mut self) {
        *self = Self::with_num_bits(self.num_bits);
    }

    /// Looks `value` up and inserts it if it is absent.
    ///
    /// Returns true if the value was probably present already, in which case
    /// the filter is unchanged.
    pub fn check_and_insert(&mut self, value: &str) -> bool {
        if self.bloom_filter.contains(&value) {
            self.hits += 1;
            true
        } else {
            self.misses += 1;
            self.bloom_filter.insert(&value);
            false
        }
    }

    pub fn num_hashes(&self) -> u32 {
        self.bloom_filter.num_hashes()
    }

    pub fn stats(&self) -> FilterStats {
        FilterStats {
            size_byte: size_of_val(&self.bloom_filter) + self.bloom_filter.num_bits() / 8,
            hits: self.hits,
            misses: self.misses,
        }
    }
}

// Deterministic, portable pseudo-random source for phrase generation.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Hand-rolled with zero runtime dependencies besides serde, so a seed
// reproduces the same four bars on every platform.
//
// The melody generator never touches a global RNG. It is handed a
// `&mut impl RandomSource`; `Xoshiro` is the production implementor, and
// tests can substitute a scripted source. All sampling helpers (uniform
// index, choice with replacement, Fisher-Yates shuffle, sampling without
// replacement) are provided methods on the trait so every implementor
// consumes raw `u64`s in exactly the same way.
//
// **Determinism.** Provided methods use integer arithmetic only. Do not
// introduce floating point into the index paths.

use serde::{Deserialize, Serialize};

/// A source of uniformly distributed 64-bit words, plus the sampling
/// operations built on top of it.
pub trait RandomSource {
    /// Next raw 64-bit word.
    fn next_u64(&mut self) -> u64;

    /// Uniform `f64` in [0, 1) from the upper 53 bits.
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Uniform integer in `[low, high)`, rejection-sampled to avoid modulo
    /// bias.
    ///
    /// Panics if `low >= high`.
    fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `usize` in `[low, high)`.
    fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Pick one element uniformly. `None` for an empty slice.
    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        Some(&items[self.range_usize(0, items.len())])
    }

    /// Draw `k` elements uniformly *with* replacement.
    fn choose_many<T: Clone>(&mut self, items: &[T], k: usize) -> Vec<T> {
        if items.is_empty() {
            return Vec::new();
        }
        (0..k)
            .map(|_| items[self.range_usize(0, items.len())].clone())
            .collect()
    }

    /// In-place Fisher-Yates shuffle.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_usize(0, i + 1);
            items.swap(i, j);
        }
    }

    /// `k` distinct indices from `0..n`, sampled *without* replacement, in
    /// draw order. `k` is clamped to `n`.
    ///
    /// Partial Fisher-Yates: only the first `k` slots are shuffled.
    fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        let k = k.min(n);
        let mut pool: Vec<usize> = (0..n).collect();
        for i in 0..k {
            let j = self.range_usize(i, n);
            pool.swap(i, j);
        }
        pool.truncate(k);
        pool
    }
}

/// Xoshiro256++ generator: the random source used for every generated bar.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Xoshiro {
    s: [u64; 4],
}

impl Xoshiro {
    /// Seed from a single `u64`, expanded to 256 bits with SplitMix64.
    /// Two instances with the same seed produce identical sequences.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Seed from the system clock. Used when the caller asks for a fresh,
    /// non-reproducible session.
    pub fn from_time() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self::new(nanos ^ u64::from(std::process::id()).rotate_left(32))
    }
}

impl RandomSource for Xoshiro {
    fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

/// SplitMix64, used only to expand a seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determinism_same_seed_same_output() {
        let mut a = Xoshiro::new(42);
        let mut b = Xoshiro::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_different_output() {
        let mut a = Xoshiro::new(42);
        let mut b = Xoshiro::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_in_unit_range() {
        let mut rng = Xoshiro::new(12345);
        for _ in 0..10_000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v), "f64 out of range: {v}");
        }
    }

    #[test]
    fn range_usize_within_bounds() {
        let mut rng = Xoshiro::new(555);
        for _ in 0..10_000 {
            let v = rng.range_usize(5, 15);
            assert!((5..15).contains(&v), "range_usize out of range: {v}");
        }
    }

    #[test]
    fn choose_empty_is_none() {
        let mut rng = Xoshiro::new(1);
        let empty: [u8; 0] = [];
        assert_eq!(rng.choose(&empty), None);
        assert!(rng.choose_many(&empty, 4).is_empty());
    }

    #[test]
    fn choose_many_draws_with_replacement() {
        let mut rng = Xoshiro::new(9);
        // More draws than items is only possible with replacement.
        let drawn = rng.choose_many(&['a', 'b'], 20);
        assert_eq!(drawn.len(), 20);
        assert!(drawn.iter().all(|c| *c == 'a' || *c == 'b'));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = Xoshiro::new(77);
        let mut items: Vec<u32> = (0..32).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort();
        assert_eq!(sorted, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn sample_indices_distinct_and_clamped() {
        let mut rng = Xoshiro::new(3);
        for k in 0..=20 {
            let picked = rng.sample_indices(16, k);
            assert_eq!(picked.len(), k.min(16));
            let mut dedup = picked.clone();
            dedup.sort();
            dedup.dedup();
            assert_eq!(dedup.len(), picked.len(), "duplicate index in {picked:?}");
            assert!(picked.iter().all(|&i| i < 16));
        }
    }

    #[test]
    fn sample_indices_reaches_every_slot() {
        let mut rng = Xoshiro::new(8);
        let mut seen = [false; 8];
        for _ in 0..200 {
            for i in rng.sample_indices(8, 1) {
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn serialization_roundtrip() {
        let mut rng = Xoshiro::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: Xoshiro = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}

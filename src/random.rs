//! Seedable pseudo-random generators for search threads.
//!
//! Every simulation path takes its generator as an explicit `&mut` parameter,
//! so a search seeded with a fixed value replays exactly. Entropy is only
//! consulted when a generator is built with `from_entropy`.

/// Source of uniformly distributed 64-bit words plus the sampling helpers the
/// search needs.
pub trait RandomSource {
    fn next_u64(&mut self) -> u64;

    /// Uniform integer in `[0, n)`. Returns 0 when `n == 0`.
    #[inline]
    fn below(&mut self, n: usize) -> usize {
        // Multiply-shift range reduction (Lemire).
        ((self.next_u64() as u128 * n as u128) >> 64) as usize
    }

    /// A fair coin.
    #[inline]
    fn coin(&mut self) -> bool {
        self.next_u64() & 1 == 1
    }

    /// Uniform element of `items`, `None` when empty.
    fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        match items.len() {
            0 => None,
            1 => items.first(),
            n => items.get(self.below(n)),
        }
    }

    /// Fisher-Yates shuffle in place.
    fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i + 1);
            items.swap(i, j);
        }
    }

    /// Up to `count` elements drawn uniformly without replacement.
    fn sample<T: Clone>(&mut self, items: &[T], count: usize) -> Vec<T> {
        if items.len() <= count {
            return items.to_vec();
        }
        let mut picked: Vec<usize> = (0..items.len()).collect();
        for i in 0..count {
            let j = i + self.below(items.len() - i);
            picked.swap(i, j);
        }
        picked[..count].iter().map(|&i| items[i].clone()).collect()
    }
}

/// SplitMix64, used to expand a 64-bit seed into generator state.
#[derive(Clone, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn from_entropy() -> Self {
        Self::new(fastrand::u64(..))
    }
}

impl RandomSource for SplitMix64 {
    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

/// xoshiro256** by Blackman and Vigna. The search's workhorse generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Xoshiro256 {
    s: [u64; 4],
}

impl Xoshiro256 {
    /// Draw the four state words from another source.
    pub fn from_source<R: RandomSource>(seeder: &mut R) -> Self {
        Self {
            s: [
                seeder.next_u64(),
                seeder.next_u64(),
                seeder.next_u64(),
                seeder.next_u64(),
            ],
        }
    }

    pub fn seed_from_u64(seed: u64) -> Self {
        Self::from_source(&mut SplitMix64::new(seed))
    }

    pub fn from_entropy() -> Self {
        Self::from_source(&mut SplitMix64::from_entropy())
    }
}

impl RandomSource for Xoshiro256 {
    fn next_u64(&mut self) -> u64 {
        let s = &mut self.s;
        let result = s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = s[1] << 17;
        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];
        s[2] ^= t;
        s[3] = s[3].rotate_left(45);
        result
    }
}

/// Constant source. Makes every coin flip and choice deterministic; used where
/// the caller only needs a path length, not a particular path.
#[derive(Clone, Copy, Debug, Default)]
pub struct FixedSource;

impl RandomSource for FixedSource {
    fn next_u64(&mut self) -> u64 {
        1
    }
}

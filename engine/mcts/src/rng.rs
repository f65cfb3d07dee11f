//! Playout randomness.
//!
//! A seedable ChaCha20 stream with one quirk kept from the engine's play
//! style: before every playout the stream is advanced by a wall-clock
//! derived number of throwaway draws, deliberately decorrelating playouts
//! between otherwise identical searches. Jitter is best effort; a
//! non-monotone clock only costs decorrelation, never correctness.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

const DEFAULT_SEED: u64 = 0x616d_6275_7368;

/// Random source used by playouts.
#[derive(Debug, Clone)]
pub struct PlayoutRng {
    rng: ChaCha20Rng,
}

impl PlayoutRng {
    /// Deterministic stream from an explicit seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }

    /// Reseed in place.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha20Rng::seed_from_u64(seed);
    }

    /// Advance the stream by `wall_clock_ms % 50` draws.
    pub fn jitter(&mut self) {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        for _ in 0..millis % 50 {
            self.rng.next_u32();
        }
    }

    /// Uniform draw in `0..n`. `n` must be positive.
    #[inline]
    pub fn below(&mut self, n: u32) -> u32 {
        self.rng.gen_range(0..n)
    }

    /// Uniform index into a non-empty slice length.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.below(len as u32) as usize
    }

    /// Bernoulli draw with probability `percent / 100`.
    #[inline]
    pub fn percent(&mut self, percent: u32) -> bool {
        self.below(100) < percent
    }

    /// Bernoulli draw with probability `p`, resolved at percent
    /// granularity like the rest of the playout policy.
    #[inline]
    pub fn probability(&mut self, p: f64) -> bool {
        (self.below(100) as f64) < 100.0 * p
    }
}

impl Default for PlayoutRng {
    fn default() -> Self {
        Self::seeded(DEFAULT_SEED)
    }
}

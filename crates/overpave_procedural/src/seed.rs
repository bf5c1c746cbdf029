//! # World Seed
//!
//! Every random decision the road generator makes is drawn from a stream
//! keyed by the world seed and absolute world coordinates. Call order,
//! cache state and graph ids never feed a stream.
//!
//! ## Stream Formula
//!
//! `stream(salts)` absorbs the seed, then every salt in order, into a
//! 64-bit state using the SplitMix64 finalizer. The salt count is absorbed
//! last, so `[a]` and `[a, 0]` key different streams. Four more finalizer
//! outputs, little-endian, form the 32-byte `ChaCha8Rng` key.
//!
//! **This formula is part of the world format.** Changing it changes every
//! road in every previously generated world.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Salts separating the independent random streams of the generator.
pub mod salt {
    /// Main-road endpoint on a region edge.
    pub const EDGE_POINT: i64 = 0x6564_6765;
    /// Street connection points on a region edge.
    pub const EDGE_CONNECTIONS: i64 = 0x636f_6e6e;
    /// Pairing of the four main-road endpoints.
    pub const PAIRING: i64 = 0x7061_6972;
    /// Bend placement of a main road.
    pub const BEND: i64 = 0x6265_6e64;
    /// Rolls of one street candidate.
    pub const STREETS: i64 = 0x7374_7265;
}

/// Weyl increment between absorbed words.
const GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// SplitMix64 output finalizer.
const fn finalize(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// World seed. Two generators built from equal seeds lay out equal roads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Wraps a raw seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// The raw seed.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// 32-byte stream key for `salts`. See the module docs for the formula.
    #[must_use]
    pub fn key(self, salts: &[i64]) -> [u8; 32] {
        let mut state = finalize(self.0.wrapping_add(GAMMA));
        for &salt in salts {
            state = finalize(state.wrapping_add(GAMMA) ^ salt as u64);
        }
        state = finalize(state ^ salts.len() as u64);

        let mut key = [0u8; 32];
        for word in key.chunks_exact_mut(8) {
            state = state.wrapping_add(GAMMA);
            word.copy_from_slice(&finalize(state).to_le_bytes());
        }
        key
    }

    /// Random stream keyed by this seed and `salts`.
    #[must_use]
    pub fn stream(self, salts: &[i64]) -> ChaCha8Rng {
        ChaCha8Rng::from_seed(self.key(salts))
    }
}

use std::sync::{Mutex, PoisonError};

use anchor_lang::prelude::*;
use arrayref::array_ref;
use rand::{rngs::OsRng, rngs::StdRng, RngCore, SeedableRng};

use crate::error::CompetitionError;

/// Source of the entropy behind ticket references, instant wins and draws.
///
/// Implementors only supply raw 64-bit values; the provided methods turn them
/// into unit floats, unbiased indices and identifiers so that every source
/// maps randomness onto outcomes the same way. Tests inject a seeded or
/// scripted source to assert exact selections.
pub trait RandomSource: Send + Sync {
    fn next_u64(&self) -> u64;

    /// Uniform value in `[0, 1)` built from the top 53 bits.
    fn unit(&self) -> f64 {
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Uniform index in `[0, range)`.
    fn below(&self, range: u64) -> Result<u64> {
        unbiased_range(self.next_u64(), range)
    }

    /// 20 lowercase hex characters (10 random bytes).
    fn identifier(&self) -> String {
        let high = self.next_u64().to_be_bytes();
        let low = self.next_u64().to_be_bytes();
        high.iter()
            .chain(low[..2].iter())
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }
}

/// Operating-system CSPRNG. Outcomes cannot be predicted from public state.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn next_u64(&self) -> u64 {
        let mut entropy = [0u8; 16];
        OsRng.fill_bytes(&mut entropy);

        let chunk1 = array_ref![entropy, 0, 8];
        let chunk2 = array_ref![entropy, 8, 8];
        mix(u64::from_le_bytes(*chunk1), u64::from_le_bytes(*chunk2))
    }
}

/// Reproducible source for tests and simulations.
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_u64(&self) -> u64 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_u64()
    }
}

/// splitmix64 finaliser; each output bit flips with ~50% probability when
/// any input bit changes.
pub(crate) fn mix(a: u64, b: u64) -> u64 {
    let mut z = a.wrapping_add(b);

    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

/// Maps a random value onto `[0, range)` without modulo bias.
pub(crate) fn unbiased_range(x: u64, range: u64) -> Result<u64> {
    if range == 0 {
        return err!(CompetitionError::Overflow);
    }

    if range.is_power_of_two() {
        return Ok(x & (range - 1));
    }

    // Values at or above the threshold would favour the low residues.
    let threshold = u64::MAX - (u64::MAX % range);

    let mut value = x;
    let mut salt: u64 = 1;
    while value >= threshold {
        value = mix(value, salt);
        salt = salt.wrapping_add(1);
    }

    Ok(value % range)
}

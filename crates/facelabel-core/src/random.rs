//! Injectable source of uniform draws in [0, 1).
//!
//! Every status transition is driven by one of these draws, so swapping the
//! source is enough to make a debouncer fully reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RandomError {
    #[error("scripted random source needs at least one draw")]
    EmptyScript,
    #[error("scripted draw {value} at position {index} is outside [0, 1)")]
    OutOfRange { index: usize, value: f64 },
}

/// Uniform random draws in the half-open interval [0, 1).
pub trait RandomSource {
    fn next_f64(&mut self) -> f64;
}

/// `rand`-backed source. Use [`StdRandom::seeded`] for reproducible runs.
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise.
    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Replays a fixed list of draws, wrapping around at the end.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    pub fn new(draws: Vec<f64>) -> Result<Self, RandomError> {
        if draws.is_empty() {
            return Err(RandomError::EmptyScript);
        }
        if let Some((index, &value)) = draws
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..1.0).contains(*v))
        {
            return Err(RandomError::OutOfRange { index, value });
        }
        Ok(Self { draws, cursor: 0 })
    }

    /// Total draws consumed so far, including wrap-arounds.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        let value = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        value
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

use crate::error::{Result, TileError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Bernoulli gate deciding whether a corpus entry is processed.
#[derive(Debug, Clone)]
pub struct Sampler {
    rate: f64,
    rng: StdRng,
}

impl Sampler {
    /// `seed` makes the sequence of decisions reproducible.
    pub fn new(rate: f64, seed: Option<u64>) -> Result<Self> {
        if !rate.is_finite() || !(0.0..=1.0).contains(&rate) {
            return Err(TileError::InvalidSampleRate(rate));
        }
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Ok(Self { rate, rng })
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn include(&mut self) -> bool {
        if self.rate >= 1.0 {
            true
        } else if self.rate <= 0.0 {
            false
        } else {
            self.rng.random::<f64>() < self.rate
        }
    }
}

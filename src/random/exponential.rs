use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::Result;
use crate::models::validate_mean;
use crate::random::RandomSource;

pub struct ExponentialSource {
    mean: f64,
    rng: StdRng,
}

impl ExponentialSource {
    pub fn seeded(mean: f64, seed: u64) -> Result<Self> {
        Self::with_rng(mean, StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy(mean: f64) -> Result<Self> {
        Self::with_rng(mean, StdRng::from_entropy())
    }

    fn with_rng(mean: f64, rng: StdRng) -> Result<Self> {
        validate_mean("exponential mean", mean)?;
        Ok(Self { mean, rng })
    }
}

impl RandomSource for ExponentialSource {
    fn generate(&mut self) -> f64 {
        // gen() yields [0, 1); flip it so ln never sees zero.
        let u = 1.0 - self.rng.gen::<f64>();
        -self.mean * u.ln()
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn variance(&self) -> f64 {
        self.mean * self.mean
    }
}

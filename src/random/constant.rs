use crate::error::Result;
use crate::models::validate_mean;
use crate::random::RandomSource;

/// Degenerate source that always yields its mean.
#[derive(Clone, Debug)]
pub struct ConstantSource {
    mean: f64,
}

impl ConstantSource {
    pub fn new(mean: f64) -> Result<Self> {
        validate_mean("constant mean", mean)?;
        Ok(Self { mean })
    }
}

impl RandomSource for ConstantSource {
    fn generate(&mut self) -> f64 {
        self.mean
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    fn variance(&self) -> f64 {
        0.0
    }
}

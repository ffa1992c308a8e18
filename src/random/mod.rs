mod constant;
mod exponential;

use crate::error::Result;
use crate::models::{DistributionConfig, SimConfig};

pub use constant::ConstantSource;
pub use exponential::ExponentialSource;

/// A stream of nonnegative variates parameterised by a mean.
pub trait RandomSource {
    fn generate(&mut self) -> f64;

    fn mean(&self) -> f64;

    fn variance(&self) -> f64;
}

/// The four independent streams a breakdown run draws from.
pub struct EventSources {
    pub inter_arrival: Box<dyn RandomSource>,
    pub service: Box<dyn RandomSource>,
    pub time_between_failures: Box<dyn RandomSource>,
    pub time_to_repair: Box<dyn RandomSource>,
}

impl EventSources {
    pub fn exponential(means: [f64; 4], seed: Option<u64>) -> Result<Self> {
        let source = |stream: u64, mean: f64| -> Result<Box<dyn RandomSource>> {
            let source = match seed {
                Some(seed) => ExponentialSource::seeded(mean, seed.wrapping_add(stream))?,
                None => ExponentialSource::from_entropy(mean)?,
            };
            Ok(Box::new(source))
        };
        Ok(Self {
            inter_arrival: source(0, means[0])?,
            service: source(1, means[1])?,
            time_between_failures: source(2, means[2])?,
            time_to_repair: source(3, means[3])?,
        })
    }

    pub fn constant(means: [f64; 4]) -> Result<Self> {
        Ok(Self {
            inter_arrival: Box::new(ConstantSource::new(means[0])?),
            service: Box::new(ConstantSource::new(means[1])?),
            time_between_failures: Box::new(ConstantSource::new(means[2])?),
            time_to_repair: Box::new(ConstantSource::new(means[3])?),
        })
    }
}

pub fn build_sources(config: &SimConfig) -> Result<EventSources> {
    let means = [
        config.mean_inter_arrival,
        config.mean_service,
        config.mean_time_between_failures,
        config.mean_time_to_repair,
    ];
    match config.distribution {
        DistributionConfig::Exponential => EventSources::exponential(means, config.seed),
        DistributionConfig::Constant => EventSources::constant(means),
    }
}

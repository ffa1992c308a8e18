use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SimConfig {
    pub servers: usize,
    pub capacity: usize,
    pub mean_inter_arrival: f64,
    pub mean_service: f64,
    pub mean_time_between_failures: f64,
    pub mean_time_to_repair: f64,
    #[serde(default)]
    pub repair_crews: RepairCrews,
    #[serde(default)]
    pub distribution: DistributionConfig,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub max_iterations: Option<u64>,
    #[serde(default)]
    pub compare_analytical: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum RepairCrews {
    #[default]
    Single,
    Multiple,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DistributionConfig {
    #[default]
    Exponential,
    Constant,
}

impl DistributionConfig {
    pub const ALL: [DistributionConfig; 2] =
        [DistributionConfig::Exponential, DistributionConfig::Constant];
}

impl fmt::Display for RepairCrews {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RepairCrews::Single => "single",
            RepairCrews::Multiple => "multiple",
        };
        f.write_str(label)
    }
}

impl fmt::Display for DistributionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DistributionConfig::Exponential => "exponential",
            DistributionConfig::Constant => "constant",
        };
        f.write_str(label)
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<()> {
        validate_topology(self.servers, self.capacity)?;
        for (name, value) in self.means() {
            validate_mean(name, value)?;
        }
        if self.max_iterations == Some(0) {
            return Err(Error::IterationLimitZero);
        }
        Ok(())
    }

    pub fn means(&self) -> [(&'static str, f64); 4] {
        [
            ("mean inter-arrival time", self.mean_inter_arrival),
            ("mean service time", self.mean_service),
            (
                "mean time between failures",
                self.mean_time_between_failures,
            ),
            ("mean time to repair", self.mean_time_to_repair),
        ]
    }
}

pub(crate) fn validate_topology(servers: usize, capacity: usize) -> Result<()> {
    if servers == 0 {
        return Err(Error::ServersZero);
    }
    if capacity < servers {
        return Err(Error::CapacityBelowServers { capacity, servers });
    }
    Ok(())
}

pub(crate) fn validate_mean(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::InvalidMean { name, value });
    }
    Ok(())
}

//! Closed-form M/M/c/K results, used as a reference for simulated estimates.
//!
//! `capacity` is the most jobs the system holds (queued plus in service),
//! matching the admission rule of the simulator.

use crate::error::Result;
use crate::models::{validate_mean, validate_topology};

#[derive(Clone, Debug)]
pub struct Mmck {
    arrival_rate: f64,
    service_rate: f64,
    servers: usize,
    probabilities: Vec<f64>,
}

impl Mmck {
    pub fn new(
        arrival_rate: f64,
        service_rate: f64,
        servers: usize,
        capacity: usize,
    ) -> Result<Self> {
        validate_mean("arrival rate", arrival_rate)?;
        validate_mean("service rate", service_rate)?;
        validate_topology(servers, capacity)?;

        let offered = arrival_rate / service_rate;
        let mut weights = Vec::with_capacity(capacity + 1);
        let mut weight = 1.0;
        weights.push(weight);
        for n in 1..=capacity {
            weight *= offered / n.min(servers) as f64;
            weights.push(weight);
        }
        let total: f64 = weights.iter().sum();
        let probabilities = weights.into_iter().map(|w| w / total).collect();

        Ok(Self {
            arrival_rate,
            service_rate,
            servers,
            probabilities,
        })
    }

    pub fn capacity(&self) -> usize {
        self.probabilities.len() - 1
    }

    /// Probability of `n` jobs in the system; zero beyond capacity.
    pub fn probability(&self, n: usize) -> f64 {
        self.probabilities.get(n).copied().unwrap_or(0.0)
    }

    pub fn blocking_probability(&self) -> f64 {
        self.probability(self.capacity())
    }

    pub fn all_busy_probability(&self) -> f64 {
        self.probabilities[self.servers..].iter().sum()
    }

    pub fn mean_number_in_system(&self) -> f64 {
        self.probabilities
            .iter()
            .enumerate()
            .map(|(n, p)| n as f64 * p)
            .sum()
    }

    pub fn mean_queue_length(&self) -> f64 {
        self.probabilities
            .iter()
            .enumerate()
            .skip(self.servers + 1)
            .map(|(n, p)| (n - self.servers) as f64 * p)
            .sum()
    }

    /// Rate of admitted jobs, λ(1 − p_K).
    pub fn throughput(&self) -> f64 {
        self.arrival_rate * (1.0 - self.blocking_probability())
    }

    pub fn response_time(&self) -> f64 {
        self.mean_number_in_system() / self.throughput()
    }

    pub fn waiting_time(&self) -> f64 {
        self.response_time() - 1.0 / self.service_rate
    }

    pub fn utilization(&self) -> f64 {
        self.throughput() / (self.servers as f64 * self.service_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-12
    }

    #[test]
    fn mm1k_matches_textbook_values() {
        // rho = 1/2, K = 2: p = (4/7, 2/7, 1/7)
        let model = Mmck::new(1.0, 2.0, 1, 2).unwrap();
        assert!(close(model.probability(0), 4.0 / 7.0));
        assert!(close(model.probability(1), 2.0 / 7.0));
        assert!(close(model.probability(2), 1.0 / 7.0));
        assert_eq!(model.probability(3), 0.0);
        assert!(close(model.mean_number_in_system(), 4.0 / 7.0));
        assert!(close(model.mean_queue_length(), 1.0 / 7.0));
        assert!(close(model.throughput(), 6.0 / 7.0));
        assert!(close(model.response_time(), 2.0 / 3.0));
        assert!(close(model.waiting_time(), 1.0 / 6.0));
        assert!(close(model.utilization(), 3.0 / 7.0));
        assert!(close(model.all_busy_probability(), 3.0 / 7.0));
    }

    #[test]
    fn erlang_loss_when_capacity_equals_servers() {
        // a = 2, c = K = 2: weights 1, 2, 2 -> blocking 2/5
        let model = Mmck::new(2.0, 1.0, 2, 2).unwrap();
        assert!(close(model.blocking_probability(), 0.4));
        assert!(close(model.mean_queue_length(), 0.0));
        assert!(close(model.waiting_time(), 0.0));
    }

    #[test]
    fn probabilities_sum_to_one() {
        let model = Mmck::new(3.0, 1.0, 4, 12).unwrap();
        let total: f64 = (0..=model.capacity()).map(|n| model.probability(n)).sum();
        assert!(close(total, 1.0));
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(Mmck::new(0.0, 1.0, 1, 1).is_err());
        assert!(Mmck::new(1.0, 1.0, 0, 1).is_err());
        assert!(Mmck::new(1.0, 1.0, 3, 2).is_err());
    }
}

use serde::Serialize;
use std::collections::BTreeMap;

use crate::analytical::Mmck;
use crate::engine::SimulationEngine;
use crate::models::{DistributionConfig, RepairCrews};
use crate::sim::StopReason;

/// Steady-state estimates derived from a finished run. Ratios whose
/// denominator is zero are NaN ("no data"), never zero.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub total_time: f64,
    pub jobs_encountered: usize,
    pub served: usize,
    pub dropped: usize,
    pub dropping_probability: f64,
    pub server_down_times: Vec<f64>,
    pub average_down_time: f64,
    pub server_down_probability: f64,
    pub average_waiting_time: f64,
    pub average_waiting_time_of_waiters: f64,
    pub state_probabilities: BTreeMap<usize, f64>,
    pub all_busy_probability: f64,
    pub system_utilization: f64,
    pub average_server_utilization: f64,
    pub mean_queue_length: f64,
    pub throughput: f64,
    pub response_time: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct Comparison {
    pub metric: String,
    pub simulated: f64,
    pub analytical: f64,
    pub percent_of_analytical: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunMetadata {
    pub servers: usize,
    pub capacity: usize,
    pub repair_crews: RepairCrews,
    pub distribution: DistributionConfig,
    pub seed: Option<u64>,
    pub iterations: u64,
    pub stop_reason: StopReason,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulationResult {
    pub metadata: RunMetadata,
    pub report: Report,
    pub comparison: Option<Vec<Comparison>>,
}

impl Report {
    pub fn from_engine(engine: &SimulationEngine) -> Self {
        let clock = engine.clock();
        let servers = engine.server_count();
        let served = engine.served_jobs().len();
        let dropped = engine.dropped_jobs().len();
        let jobs_encountered = engine.jobs_so_far();

        let server_down_times = engine.server_down_times().to_vec();
        let average_down_time = server_down_times.iter().sum::<f64>() / servers as f64;

        // Evicted jobs that had started service still count their wait.
        let waits: Vec<f64> = engine
            .served_jobs()
            .iter()
            .chain(engine.dropped_jobs())
            .filter_map(|job| job.time_in_queue())
            .collect();
        let total_wait: f64 = waits.iter().sum();
        let waiters: Vec<f64> = waits.iter().copied().filter(|wait| *wait > 0.0).collect();

        let state_probabilities: BTreeMap<usize, f64> = engine
            .state_times()
            .iter()
            .map(|(state, time)| (*state, time / clock))
            .collect();
        let all_busy_probability: f64 = state_probabilities
            .iter()
            .filter(|(state, _)| **state >= servers)
            .map(|(_, probability)| probability)
            .sum();
        let p0 = state_probabilities.get(&0).copied().unwrap_or(0.0);
        let mean_queue_length: f64 = state_probabilities
            .iter()
            .map(|(state, probability)| *state as f64 * probability)
            .sum();
        let busy_total: f64 = engine.server_times().iter().sum();
        let throughput = served as f64 / clock;

        Self {
            total_time: clock,
            jobs_encountered,
            served,
            dropped,
            dropping_probability: dropped as f64 / jobs_encountered as f64,
            server_down_times,
            average_down_time,
            server_down_probability: average_down_time / clock,
            average_waiting_time: total_wait / jobs_encountered as f64,
            average_waiting_time_of_waiters: waiters.iter().sum::<f64>() / waiters.len() as f64,
            state_probabilities,
            all_busy_probability,
            system_utilization: 1.0 - p0,
            average_server_utilization: busy_total / (servers as f64 * clock),
            mean_queue_length,
            throughput,
            response_time: mean_queue_length / throughput,
        }
    }

    /// Pairs simulated estimates with closed-form M/M/c/K values.
    pub fn compare(&self, reference: &Mmck) -> Vec<Comparison> {
        let mut rows = vec![comparison(
            "average waiting time",
            self.average_waiting_time,
            reference.waiting_time(),
        )];
        for (state, probability) in &self.state_probabilities {
            rows.push(comparison(
                format!("p({})", state),
                *probability,
                reference.probability(*state),
            ));
        }
        rows.extend([
            comparison(
                "all servers busy",
                self.all_busy_probability,
                reference.all_busy_probability(),
            ),
            comparison(
                "average server utilization",
                self.average_server_utilization,
                reference.utilization(),
            ),
            comparison(
                "mean queue length",
                self.mean_queue_length,
                reference.mean_number_in_system(),
            ),
            comparison("throughput", self.throughput, reference.throughput()),
            comparison(
                "response time",
                self.response_time,
                reference.response_time(),
            ),
        ]);
        rows
    }
}

fn comparison(metric: impl Into<String>, simulated: f64, analytical: f64) -> Comparison {
    Comparison {
        metric: metric.into(),
        simulated,
        analytical,
        percent_of_analytical: 100.0 * simulated / analytical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::EventSources;
    use crate::sim::BreakdownQueueModel;

    fn close(actual: f64, expected: f64) -> bool {
        (actual - expected).abs() < 1e-12
    }

    fn deterministic_engine() -> SimulationEngine {
        let mut model = BreakdownQueueModel::new(1, 5)
            .unwrap()
            .with_max_iterations(12)
            .unwrap();
        model
            .start_simulation(EventSources::constant([2.0, 3.0, 10.0, 4.0]).unwrap())
            .unwrap();
        model.engine().clone()
    }

    #[test]
    fn metrics_for_hand_computed_run() {
        let report = Report::from_engine(&deterministic_engine());

        assert_eq!(report.total_time, 14.0);
        assert_eq!(report.jobs_encountered, 4);
        assert_eq!(report.dropping_probability, 0.25);
        assert_eq!(report.server_down_times, vec![4.0]);
        assert_eq!(report.average_down_time, 4.0);
        assert!(close(report.server_down_probability, 4.0 / 14.0));
        // waits: 0, 1, 2 served plus 3 for the evicted job
        assert_eq!(report.average_waiting_time, 1.5);
        assert_eq!(report.average_waiting_time_of_waiters, 2.0);
        assert_eq!(report.state_probabilities.get(&0), Some(&0.0));
        assert!(close(report.state_probabilities[&2], 8.0 / 14.0));
        assert!(close(report.all_busy_probability, 1.0));
        assert_eq!(report.system_utilization, 1.0);
        assert!(close(report.average_server_utilization, 10.0 / 14.0));
        assert!(close(report.mean_queue_length, 2.0));
        assert!(close(report.throughput, 3.0 / 14.0));
        assert!(close(report.response_time, 28.0 / 3.0));
    }

    #[test]
    fn undefined_ratios_are_nan() {
        let mut model = BreakdownQueueModel::new(1, 5).unwrap();
        model
            .start_simulation(EventSources::constant([1.0, 1.0, 1e9, 1.0]).unwrap())
            .unwrap();
        let report = Report::from_engine(model.engine());

        assert_eq!(report.average_waiting_time, 0.0);
        assert!(report.average_waiting_time_of_waiters.is_nan());
        assert_eq!(report.dropping_probability, 0.0);

        let empty = Report::from_engine(&SimulationEngine::new(2, RepairCrews::Single));
        assert!(empty.dropping_probability.is_nan());
        assert!(empty.throughput.is_nan());
        assert!(empty.average_server_utilization.is_nan());
    }

    #[test]
    fn comparison_lists_each_state_and_summary_metric() {
        let report = Report::from_engine(&deterministic_engine());
        let reference = Mmck::new(0.5, 1.0 / 3.0, 1, 5).unwrap();
        let rows = report.compare(&reference);

        let metrics: Vec<&str> = rows.iter().map(|row| row.metric.as_str()).collect();
        assert_eq!(
            metrics,
            vec![
                "average waiting time",
                "p(0)",
                "p(1)",
                "p(2)",
                "p(3)",
                "all servers busy",
                "average server utilization",
                "mean queue length",
                "throughput",
                "response time",
            ]
        );
        let throughput = rows.iter().find(|row| row.metric == "throughput").unwrap();
        assert!(close(
            throughput.percent_of_analytical,
            100.0 * throughput.simulated / reference.throughput()
        ));
    }
}

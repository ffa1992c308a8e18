use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::state::Server;

/// Time-weighted accumulators for one run: time spent at each occupancy
/// level, plus busy and down time per server.
#[derive(Clone, Debug, Default)]
pub struct TimeLedger {
    state_times: BTreeMap<usize, f64>,
    busy_times: Vec<f64>,
    down_times: Vec<f64>,
}

impl TimeLedger {
    pub fn new(servers: usize) -> Self {
        Self {
            state_times: BTreeMap::new(),
            busy_times: vec![0.0; servers],
            down_times: vec![0.0; servers],
        }
    }

    pub fn reset(&mut self, servers: usize) {
        self.state_times.clear();
        self.busy_times = vec![0.0; servers];
        self.down_times = vec![0.0; servers];
    }

    /// Credits `clock - previous_clock` to `occupancy` and to every busy
    /// server. `servers` must still reflect the interval being closed.
    pub fn record(
        &mut self,
        occupancy: usize,
        servers: &[Server],
        clock: f64,
        previous_clock: f64,
    ) -> Result<f64> {
        let elapsed = clock - previous_clock;
        if elapsed.is_nan() || elapsed < 0.0 {
            return Err(Error::ClockRegression {
                from: previous_clock,
                to: clock,
            });
        }
        *self.state_times.entry(occupancy).or_insert(0.0) += elapsed;
        for (busy, server) in self.busy_times.iter_mut().zip(servers) {
            if server.is_busy() {
                *busy += elapsed;
            }
        }
        Ok(elapsed)
    }

    /// Same as [`record`](Self::record), also crediting down time.
    pub fn record_unreliable(
        &mut self,
        occupancy: usize,
        servers: &[Server],
        clock: f64,
        previous_clock: f64,
    ) -> Result<()> {
        let elapsed = self.record(occupancy, servers, clock, previous_clock)?;
        for (down, server) in self.down_times.iter_mut().zip(servers) {
            if server.is_down() {
                *down += elapsed;
            }
        }
        Ok(())
    }

    pub fn state_times(&self) -> &BTreeMap<usize, f64> {
        &self.state_times
    }

    pub fn busy_times(&self) -> &[f64] {
        &self.busy_times
    }

    pub fn down_times(&self) -> &[f64] {
        &self.down_times
    }

    pub fn total_time(&self) -> f64 {
        self.state_times.values().sum()
    }

    /// Σ(level × time at level) / clock, or 0 before any time has passed.
    pub fn mean_occupancy(&self, clock: f64) -> f64 {
        if clock <= 0.0 {
            return 0.0;
        }
        self.state_times
            .iter()
            .map(|(level, time)| *level as f64 * time / clock)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Job;

    fn busy_server(id: usize) -> Server {
        let mut server = Server::new(id);
        server.assign(Job::new(1, 0.0, 100.0), 0.0).unwrap();
        server
    }

    fn down_server(id: usize) -> Server {
        let mut server = Server::new(id);
        server.break_down(50.0).unwrap();
        server
    }

    #[test]
    fn credits_interval_to_occupancy_and_busy_servers() {
        let servers = vec![busy_server(0), Server::new(1)];
        let mut ledger = TimeLedger::new(2);

        ledger.record(1, &servers, 2.0, 0.0).unwrap();
        ledger.record(1, &servers, 3.5, 2.0).unwrap();
        ledger.record(0, &servers, 4.0, 3.5).unwrap();

        assert_eq!(ledger.state_times().get(&1), Some(&3.5));
        assert_eq!(ledger.state_times().get(&0), Some(&0.5));
        assert_eq!(ledger.busy_times(), &[4.0, 0.0]);
        assert_eq!(ledger.down_times(), &[0.0, 0.0]);
        assert_eq!(ledger.total_time(), 4.0);
    }

    #[test]
    fn unreliable_record_tracks_down_time() {
        let servers = vec![down_server(0), busy_server(1)];
        let mut ledger = TimeLedger::new(2);

        ledger.record_unreliable(1, &servers, 3.0, 1.0).unwrap();

        assert_eq!(ledger.down_times(), &[2.0, 0.0]);
        assert_eq!(ledger.busy_times(), &[0.0, 2.0]);
    }

    #[test]
    fn zero_length_interval_still_registers_level() {
        let servers = vec![Server::new(0)];
        let mut ledger = TimeLedger::new(1);
        ledger.record(0, &servers, 0.0, 0.0).unwrap();
        assert_eq!(ledger.state_times().get(&0), Some(&0.0));
    }

    #[test]
    fn backwards_clock_is_an_error() {
        let servers = vec![Server::new(0)];
        let mut ledger = TimeLedger::new(1);
        let err = ledger.record(0, &servers, 1.0, 2.0).unwrap_err();
        assert!(matches!(err, Error::ClockRegression { .. }));
        assert!(ledger.record(0, &servers, f64::NAN, 2.0).is_err());
        assert!(ledger.state_times().is_empty());
    }

    #[test]
    fn mean_occupancy_is_time_weighted() {
        let servers = vec![Server::new(0)];
        let mut ledger = TimeLedger::new(1);
        assert_eq!(ledger.mean_occupancy(0.0), 0.0);

        ledger.record(1, &servers, 3.0, 0.0).unwrap();
        ledger.record(2, &servers, 4.0, 3.0).unwrap();
        assert_eq!(ledger.mean_occupancy(4.0), 1.25);
    }

    #[test]
    fn reset_clears_everything() {
        let servers = vec![busy_server(0)];
        let mut ledger = TimeLedger::new(1);
        ledger.record_unreliable(1, &servers, 2.0, 0.0).unwrap();
        ledger.reset(3);
        assert!(ledger.state_times().is_empty());
        assert_eq!(ledger.busy_times(), &[0.0, 0.0, 0.0]);
        assert_eq!(ledger.down_times(), &[0.0, 0.0, 0.0]);
    }
}

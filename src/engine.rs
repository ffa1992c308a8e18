use std::collections::{BTreeMap, VecDeque};

use tracing::trace;

use crate::error::{Error, Result};
use crate::ledger::TimeLedger;
use crate::models::RepairCrews;
use crate::state::{Job, Server};
use crate::steady::SteadyStateDetector;

/// Index of the first idle server (if any) and how many are idle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerScan {
    pub first_idle: Option<usize>,
    pub idle: usize,
}

/// Shared state and bookkeeping for a multi-server queue. Models drive it
/// through the operations below; the collections are never handed out
/// mutably.
#[derive(Clone, Debug)]
pub struct SimulationEngine {
    server_count: usize,
    repair_crews: RepairCrews,
    clock: f64,
    queue: VecDeque<Job>,
    servers: Vec<Server>,
    served_jobs: Vec<Job>,
    dropped_jobs: Vec<Job>,
    ledger: TimeLedger,
    detector: SteadyStateDetector,
    jobs_created: usize,
    jobs_arrived: usize,
}

impl SimulationEngine {
    pub fn new(server_count: usize, repair_crews: RepairCrews) -> Self {
        Self {
            server_count,
            repair_crews,
            clock: 0.0,
            queue: VecDeque::new(),
            servers: init_servers(server_count),
            served_jobs: Vec::new(),
            dropped_jobs: Vec::new(),
            ledger: TimeLedger::new(server_count),
            detector: SteadyStateDetector::new(),
            jobs_created: 0,
            jobs_arrived: 0,
        }
    }

    /// Clears jobs, accumulators and the detector and rebuilds idle servers.
    /// The clock is left for the caller to rewind.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.served_jobs.clear();
        self.dropped_jobs.clear();
        self.ledger.reset(self.server_count);
        self.detector.reset();
        self.servers = init_servers(self.server_count);
        self.jobs_created = 0;
        self.jobs_arrived = 0;
    }

    pub fn set_clock(&mut self, clock: f64) {
        self.clock = clock;
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn server_count(&self) -> usize {
        self.server_count
    }

    pub fn repair_crews(&self) -> RepairCrews {
        self.repair_crews
    }

    pub fn set_repair_crews(&mut self, repair_crews: RepairCrews) {
        self.repair_crews = repair_crews;
    }

    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    pub fn queue(&self) -> impl ExactSizeIterator<Item = &Job> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn served_jobs(&self) -> &[Job] {
        &self.served_jobs
    }

    pub fn dropped_jobs(&self) -> &[Job] {
        &self.dropped_jobs
    }

    pub fn state_times(&self) -> &BTreeMap<usize, f64> {
        self.ledger.state_times()
    }

    pub fn server_times(&self) -> &[f64] {
        self.ledger.busy_times()
    }

    pub fn server_down_times(&self) -> &[f64] {
        self.ledger.down_times()
    }

    pub fn detector(&self) -> &SteadyStateDetector {
        &self.detector
    }

    /// Jobs that have reached the system, whether queued, served or dropped.
    pub fn jobs_arrived(&self) -> usize {
        self.jobs_arrived
    }

    /// Jobs that have left the system, served or dropped.
    pub fn jobs_so_far(&self) -> usize {
        self.served_jobs.len() + self.dropped_jobs.len()
    }

    pub fn new_job(&mut self, arrival_time: f64, service_duration: f64) -> Job {
        self.jobs_created += 1;
        Job::new(self.jobs_created, arrival_time, service_duration)
    }

    pub fn check_servers(&self) -> ServerScan {
        let mut scan = ServerScan {
            first_idle: None,
            idle: 0,
        };
        for (idx, server) in self.servers.iter().enumerate() {
            if server.is_idle() {
                scan.first_idle.get_or_insert(idx);
                scan.idle += 1;
            }
        }
        scan
    }

    pub fn busy_servers(&self) -> usize {
        self.servers.iter().filter(|server| server.is_busy()).count()
    }

    /// Jobs in service plus jobs waiting.
    pub fn number_of_jobs_in_system(&self) -> usize {
        self.busy_servers() + self.queue.len()
    }

    pub fn update_state_and_server_times(
        &mut self,
        clock: f64,
        previous_clock: f64,
    ) -> Result<()> {
        let occupancy = self.number_of_jobs_in_system();
        self.ledger
            .record(occupancy, &self.servers, clock, previous_clock)?;
        Ok(())
    }

    pub fn update_state_and_server_times_unreliable(
        &mut self,
        clock: f64,
        previous_clock: f64,
    ) -> Result<()> {
        let occupancy = self.number_of_jobs_in_system();
        self.ledger
            .record_unreliable(occupancy, &self.servers, clock, previous_clock)
    }

    /// Closes the interval ending at `to` against the current state, then
    /// moves the clock.
    pub fn advance_clock(&mut self, to: f64) -> Result<()> {
        self.update_state_and_server_times_unreliable(to, self.clock)?;
        self.clock = to;
        Ok(())
    }

    pub fn mean_queue_length(&self) -> f64 {
        self.ledger.mean_occupancy(self.clock)
    }

    pub fn is_in_steady_state(&mut self, iteration: u64) -> bool {
        let mean_queue_length = self.mean_queue_length();
        self.detector.observe(iteration, mean_queue_length)
    }

    /// The busy server that finishes first, with its service end time.
    pub fn next_server(&self) -> Option<(usize, f64)> {
        self.servers
            .iter()
            .enumerate()
            .filter_map(|(idx, server)| server.service_end().map(|end| (idx, end)))
            .fold(None, earliest)
    }

    /// The down server that is repaired first, with its repair time.
    pub fn next_repair(&self) -> Option<(usize, f64)> {
        self.servers
            .iter()
            .enumerate()
            .filter_map(|(idx, server)| server.repaired_at().map(|at| (idx, at)))
            .fold(None, earliest)
    }

    pub fn all_servers_unavailable(&self) -> bool {
        self.servers.iter().all(Server::is_down)
    }

    /// How long until a repair crew is free to start a new repair.
    pub fn repair_crew_available_at(&self, clock: f64) -> f64 {
        if self.repair_crews == RepairCrews::Multiple {
            return 0.0;
        }
        self.servers
            .iter()
            .filter_map(Server::repaired_at)
            .map(|repaired_at| repaired_at - clock)
            .fold(0.0, f64::max)
    }

    /// Queues an arriving job, or drops it when the system already holds
    /// `capacity` jobs. Returns whether the job was accepted.
    pub fn admit(&mut self, job: Job, capacity: usize) -> bool {
        self.jobs_arrived += 1;
        if self.number_of_jobs_in_system() >= capacity {
            trace!(job = job.id, clock = self.clock, "job dropped at capacity");
            self.drop_job(job);
            false
        } else {
            self.queue.push_back(job);
            true
        }
    }

    pub fn drop_job(&mut self, job: Job) {
        self.dropped_jobs.push(job);
    }

    pub fn complete_service(&mut self, server_id: usize) -> Result<()> {
        let job = self.server_mut(server_id)?.finish()?;
        self.served_jobs.push(job);
        Ok(())
    }

    /// Takes a server down, evicting its job to the dropped list. Returns
    /// the repair completion time.
    pub fn break_down(&mut self, server_id: usize, repair_duration: f64) -> Result<f64> {
        let repaired_at = self.clock + self.repair_crew_available_at(self.clock) + repair_duration;
        if let Some(job) = self.server_mut(server_id)?.break_down(repaired_at)? {
            trace!(job = job.id, server = server_id, "job evicted by breakdown");
            self.drop_job(job);
        }
        Ok(repaired_at)
    }

    pub fn repair(&mut self, server_id: usize) -> Result<()> {
        self.server_mut(server_id)?.repair()
    }

    /// Moves queued jobs onto idle servers, lowest index first. Returns how
    /// many jobs started service.
    pub fn dispatch(&mut self) -> Result<usize> {
        let mut started = 0;
        for server in self.servers.iter_mut() {
            if !server.is_idle() {
                continue;
            }
            let Some(job) = self.queue.pop_front() else {
                break;
            };
            server.assign(job, self.clock)?;
            started += 1;
        }
        Ok(started)
    }

    fn server_mut(&mut self, server_id: usize) -> Result<&mut Server> {
        self.servers
            .get_mut(server_id)
            .ok_or(Error::UnknownServer(server_id))
    }
}

fn init_servers(count: usize) -> Vec<Server> {
    (0..count).map(Server::new).collect()
}

// Strict comparison keeps the lowest index on equal times.
fn earliest(best: Option<(usize, f64)>, candidate: (usize, f64)) -> Option<(usize, f64)> {
    match best {
        Some((_, time)) if time <= candidate.1 => best,
        _ => Some(candidate),
    }
}

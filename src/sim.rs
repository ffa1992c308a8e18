use serde::Serialize;
use std::fmt;
use tracing::{debug, info, trace, warn};

use crate::analytical::Mmck;
use crate::engine::SimulationEngine;
use crate::error::{Error, Result};
use crate::events::{EventCandidates, EventKind, ScheduledEvent};
use crate::models::{validate_topology, RepairCrews, SimConfig};
use crate::random::{build_sources, EventSources};
use crate::report::{Report, RunMetadata, SimulationResult};
use crate::state::Job;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    SteadyState,
    IterationLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::SteadyState => f.write_str("steady-state"),
            StopReason::IterationLimit => f.write_str("iteration-limit"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunOutcome {
    pub iterations: u64,
    pub stop_reason: StopReason,
    pub clock: f64,
}

/// In-flight state of one run that lives outside the engine: the random
/// streams, the pre-drawn next arrival and each server's next breakdown.
pub struct Trajectory {
    sources: EventSources,
    next_job: Job,
    next_breakdowns: Vec<Option<f64>>,
}

impl Trajectory {
    pub fn next_job(&self) -> &Job {
        &self.next_job
    }

    /// `None` for servers that are down; re-armed on repair.
    pub fn next_breakdowns(&self) -> &[Option<f64>] {
        &self.next_breakdowns
    }

    fn next_breakdown(&self) -> Option<(usize, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, at) in self.next_breakdowns.iter().enumerate() {
            if let Some(at) = *at {
                if best.map_or(true, |(_, time)| at < time) {
                    best = Some((idx, at));
                }
            }
        }
        best
    }
}

/// Finite-capacity multi-server queue whose servers break down and get
/// repaired. Capacity counts queued and in-service jobs together.
pub struct BreakdownQueueModel {
    engine: SimulationEngine,
    capacity: usize,
    max_iterations: Option<u64>,
}

impl BreakdownQueueModel {
    pub fn new(servers: usize, capacity: usize) -> Result<Self> {
        validate_topology(servers, capacity)?;
        Ok(Self {
            engine: SimulationEngine::new(servers, RepairCrews::Single),
            capacity,
            max_iterations: None,
        })
    }

    pub fn with_repair_crews(mut self, repair_crews: RepairCrews) -> Self {
        self.engine.set_repair_crews(repair_crews);
        self
    }

    pub fn with_max_iterations(mut self, limit: u64) -> Result<Self> {
        if limit == 0 {
            return Err(Error::IterationLimitZero);
        }
        self.max_iterations = Some(limit);
        Ok(self)
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Runs until the steady-state detector fires or the iteration limit is
    /// reached. Results stay in the engine.
    pub fn start_simulation(&mut self, sources: EventSources) -> Result<RunOutcome> {
        let mut trajectory = self.begin(sources);
        info!(
            servers = self.engine.server_count(),
            capacity = self.capacity,
            repair_crews = %self.engine.repair_crews(),
            "simulation started"
        );

        let mut iteration = 0u64;
        let stop_reason = loop {
            if matches!(self.max_iterations, Some(limit) if iteration >= limit) {
                warn!(
                    iterations = iteration,
                    clock = self.engine.clock(),
                    "iteration limit reached before steady state"
                );
                break StopReason::IterationLimit;
            }
            if self.engine.is_in_steady_state(iteration) {
                debug!(
                    iterations = iteration,
                    mean_queue_length = self.engine.detector().current(),
                    "steady state detected"
                );
                break StopReason::SteadyState;
            }
            self.step(&mut trajectory)?;
            iteration += 1;
        };

        info!(
            clock = self.engine.clock(),
            served = self.engine.served_jobs().len(),
            dropped = self.engine.dropped_jobs().len(),
            %stop_reason,
            "simulation completed"
        );
        Ok(RunOutcome {
            iterations: iteration,
            stop_reason,
            clock: self.engine.clock(),
        })
    }

    /// Resets the engine and draws the first job and every server's first
    /// breakdown.
    pub fn begin(&mut self, mut sources: EventSources) -> Trajectory {
        self.engine.reset();
        self.engine.set_clock(0.0);
        let clock = self.engine.clock();

        let first_service = sources.service.generate();
        let next_job = self.engine.new_job(clock, first_service);
        let next_breakdowns = (0..self.engine.server_count())
            .map(|_| Some(clock + sources.time_between_failures.generate()))
            .collect();

        Trajectory {
            sources,
            next_job,
            next_breakdowns,
        }
    }

    pub fn next_event(&self, trajectory: &Trajectory) -> ScheduledEvent {
        let breakdown = if self.engine.all_servers_unavailable() {
            None
        } else {
            trajectory.next_breakdown()
        };
        EventCandidates {
            arrival: trajectory.next_job.arrival_time,
            service: self.engine.next_server(),
            repair: self.engine.next_repair(),
            breakdown,
        }
        .resolve()
    }

    /// Processes exactly one event, then moves queued jobs onto free servers.
    pub fn step(&mut self, trajectory: &mut Trajectory) -> Result<ScheduledEvent> {
        let event = self.next_event(trajectory);
        self.engine.advance_clock(event.time)?;
        let clock = self.engine.clock();

        match event.kind {
            EventKind::Arrival => {
                let inter_arrival = trajectory.sources.inter_arrival.generate();
                let service = trajectory.sources.service.generate();
                let following = self.engine.new_job(clock + inter_arrival, service);
                let job = std::mem::replace(&mut trajectory.next_job, following);
                self.engine.admit(job, self.capacity);
            }
            EventKind::ServiceCompletion { server_id } => {
                self.engine.complete_service(server_id)?;
            }
            EventKind::RepairCompletion { server_id } => {
                self.engine.repair(server_id)?;
                let next = clock + trajectory.sources.time_between_failures.generate();
                trajectory.next_breakdowns[server_id] = Some(next);
            }
            EventKind::Breakdown { server_id } => {
                let repair = trajectory.sources.time_to_repair.generate();
                let repaired_at = self.engine.break_down(server_id, repair)?;
                trajectory.next_breakdowns[server_id] = None;
                trace!(server = server_id, repaired_at, "server down");
            }
        }

        self.engine.dispatch()?;
        trace!(
            clock,
            event = %event.kind,
            jobs_in_system = self.engine.number_of_jobs_in_system(),
            "event processed"
        );
        Ok(event)
    }
}

pub fn run_simulation(config: &SimConfig) -> Result<SimulationResult> {
    config.validate()?;
    let sources = build_sources(config)?;
    let mut model = BreakdownQueueModel::new(config.servers, config.capacity)?
        .with_repair_crews(config.repair_crews);
    if let Some(limit) = config.max_iterations {
        model = model.with_max_iterations(limit)?;
    }

    let outcome = model.start_simulation(sources)?;
    let report = Report::from_engine(model.engine());
    let comparison = if config.compare_analytical {
        let reference = Mmck::new(
            1.0 / config.mean_inter_arrival,
            1.0 / config.mean_service,
            config.servers,
            config.capacity,
        )?;
        Some(report.compare(&reference))
    } else {
        None
    };

    Ok(SimulationResult {
        metadata: RunMetadata {
            servers: config.servers,
            capacity: config.capacity,
            repair_crews: config.repair_crews,
            distribution: config.distribution,
            seed: config.seed,
            iterations: outcome.iterations,
            stop_reason: outcome.stop_reason,
        },
        report,
        comparison,
    })
}

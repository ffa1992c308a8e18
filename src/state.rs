use serde::Serialize;

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Job {
    pub id: usize,
    pub arrival_time: f64,
    pub service_duration: f64,
    pub service_start: Option<f64>,
}

impl Job {
    pub fn new(id: usize, arrival_time: f64, service_duration: f64) -> Self {
        Self {
            id,
            arrival_time,
            service_duration,
            service_start: None,
        }
    }

    pub fn service_end(&self) -> Option<f64> {
        self.service_start.map(|start| start + self.service_duration)
    }

    pub fn time_in_queue(&self) -> Option<f64> {
        self.service_start.map(|start| start - self.arrival_time)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ServerStatus {
    Idle,
    Busy(Job),
    Down { repaired_at: f64 },
}

impl ServerStatus {
    pub fn label(&self) -> &'static str {
        match self {
            ServerStatus::Idle => "idle",
            ServerStatus::Busy(_) => "busy",
            ServerStatus::Down { .. } => "down",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Server {
    pub id: usize,
    pub status: ServerStatus,
}

impl Server {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            status: ServerStatus::Idle,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.status, ServerStatus::Idle)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.status, ServerStatus::Busy(_))
    }

    pub fn is_down(&self) -> bool {
        matches!(self.status, ServerStatus::Down { .. })
    }

    pub fn current_job(&self) -> Option<&Job> {
        match &self.status {
            ServerStatus::Busy(job) => Some(job),
            _ => None,
        }
    }

    pub fn service_end(&self) -> Option<f64> {
        self.current_job().and_then(Job::service_end)
    }

    pub fn repaired_at(&self) -> Option<f64> {
        match self.status {
            ServerStatus::Down { repaired_at } => Some(repaired_at),
            _ => None,
        }
    }

    /// Starts `job` at `clock`. Only an idle server accepts work.
    pub fn assign(&mut self, mut job: Job, clock: f64) -> Result<()> {
        if !self.is_idle() {
            return Err(self.unavailable());
        }
        job.service_start = Some(clock);
        self.status = ServerStatus::Busy(job);
        Ok(())
    }

    pub fn finish(&mut self) -> Result<Job> {
        match std::mem::replace(&mut self.status, ServerStatus::Idle) {
            ServerStatus::Busy(job) => Ok(job),
            other => {
                self.status = other;
                Err(self.unavailable())
            }
        }
    }

    /// Takes the server down until `repaired_at`, handing back any job it was serving.
    pub fn break_down(&mut self, repaired_at: f64) -> Result<Option<Job>> {
        let previous = std::mem::replace(&mut self.status, ServerStatus::Down { repaired_at });
        match previous {
            ServerStatus::Idle => Ok(None),
            ServerStatus::Busy(job) => Ok(Some(job)),
            other => {
                self.status = other;
                Err(self.unavailable())
            }
        }
    }

    pub fn repair(&mut self) -> Result<()> {
        if !self.is_down() {
            return Err(self.unavailable());
        }
        self.status = ServerStatus::Idle;
        Ok(())
    }

    fn unavailable(&self) -> Error {
        Error::ServerUnavailable {
            server: self.id,
            status: self.status.label(),
        }
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("servers must be greater than 0")]
    ServersZero,
    #[error("capacity ({capacity}) must be at least the number of servers ({servers})")]
    CapacityBelowServers { capacity: usize, servers: usize },
    #[error("{name} must be a finite value > 0 (got {value})")]
    InvalidMean { name: &'static str, value: f64 },
    #[error("max iterations must be greater than 0")]
    IterationLimitZero,
    #[error("server {server} cannot accept this transition while {status}")]
    ServerUnavailable { server: usize, status: &'static str },
    #[error("unknown server index {0}")]
    UnknownServer(usize),
    #[error("clock cannot move backwards (from {from} to {to})")]
    ClockRegression { from: f64, to: f64 },
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Cli(String),
}

pub type Result<T> = std::result::Result<T, Error>;

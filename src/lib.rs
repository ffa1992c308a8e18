pub mod analytical;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod output;
pub mod random;
pub mod report;
pub mod sim;
pub mod state;
pub mod steady;

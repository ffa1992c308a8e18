use std::fmt::Write;

use crate::models::{DistributionConfig, SimConfig};
use crate::report::{Comparison, SimulationResult};

pub trait Formatter {
    fn write(&self, result: &SimulationResult) -> String;
}

pub struct HumanFormatter;
pub struct SummaryFormatter;
pub struct JsonFormatter;

impl Formatter for HumanFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        let report = &result.report;
        let mut out = String::new();
        write_metadata(&mut out, result);
        out.push_str("Results:\n");
        line(&mut out, "total_time", report.total_time);
        let _ = writeln!(out, "jobs_encountered: {}", report.jobs_encountered);
        let _ = writeln!(out, "dropped: {}", report.dropped);
        line(&mut out, "dropping_probability", report.dropping_probability);
        out.push_str("down_times:\n");
        for (idx, down) in report.server_down_times.iter().enumerate() {
            let _ = writeln!(out, "  server {}: {:.4}", idx, down);
        }
        line(&mut out, "average_down_time", report.average_down_time);
        line(
            &mut out,
            "server_down_probability",
            report.server_down_probability,
        );
        let _ = writeln!(out, "served: {}", report.served);
        line(&mut out, "average_waiting_time", report.average_waiting_time);
        line(
            &mut out,
            "average_waiting_time_of_waiters",
            report.average_waiting_time_of_waiters,
        );
        out.push_str("state_probabilities:\n");
        for (state, probability) in &report.state_probabilities {
            let _ = writeln!(out, "  p({}): {:.4}", state, probability);
        }
        line(&mut out, "all_busy_probability", report.all_busy_probability);
        line(&mut out, "system_utilization", report.system_utilization);
        line(
            &mut out,
            "average_server_utilization",
            report.average_server_utilization,
        );
        line(&mut out, "mean_queue_length", report.mean_queue_length);
        line(&mut out, "throughput", report.throughput);
        line(&mut out, "response_time", report.response_time);
        if let Some(rows) = &result.comparison {
            write_comparison(&mut out, rows);
        }
        out
    }
}

impl Formatter for SummaryFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        let report = &result.report;
        let mut out = String::new();
        write_metadata(&mut out, result);
        out.push_str("Summary:\n");
        line(&mut out, "total_time", report.total_time);
        let _ = writeln!(out, "jobs_encountered: {}", report.jobs_encountered);
        let _ = writeln!(out, "served: {}", report.served);
        let _ = writeln!(out, "dropped: {}", report.dropped);
        line(&mut out, "dropping_probability", report.dropping_probability);
        line(&mut out, "mean_queue_length", report.mean_queue_length);
        line(&mut out, "throughput", report.throughput);
        line(&mut out, "response_time", report.response_time);
        out
    }
}

impl Formatter for JsonFormatter {
    fn write(&self, result: &SimulationResult) -> String {
        let mut output = serde_json::to_string_pretty(result)
            .unwrap_or_else(|err| format!("{{\"error\":\"{}\"}}", err));
        output.push('\n');
        output
    }
}

pub fn describe_config(config: &SimConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Servers: {}", config.servers);
    let _ = writeln!(out, "Capacity: {}", config.capacity);
    let _ = writeln!(out, "Mean inter-arrival time: {}", config.mean_inter_arrival);
    let _ = writeln!(out, "Mean service time: {}", config.mean_service);
    let _ = writeln!(
        out,
        "Mean time between failures: {}",
        config.mean_time_between_failures
    );
    let _ = writeln!(out, "Mean time to repair: {}", config.mean_time_to_repair);
    let _ = writeln!(out, "Repair crews: {}", config.repair_crews);
    let _ = writeln!(out, "Distribution: {}", config.distribution);
    let _ = writeln!(out, "Seed: {}", optional(config.seed));
    let _ = writeln!(out, "Max iterations: {}", optional(config.max_iterations));
    let _ = writeln!(out, "Compare analytical: {}", config.compare_analytical);
    out
}

pub fn list_distributions() -> String {
    DistributionConfig::ALL
        .iter()
        .map(|distribution| format!("{}\n", distribution))
        .collect()
}

fn write_metadata(out: &mut String, result: &SimulationResult) {
    let metadata = &result.metadata;
    out.push_str("Metadata:\n");
    let _ = writeln!(out, "servers: {}", metadata.servers);
    let _ = writeln!(out, "capacity: {}", metadata.capacity);
    let _ = writeln!(out, "repair_crews: {}", metadata.repair_crews);
    let _ = writeln!(out, "distribution: {}", metadata.distribution);
    let _ = writeln!(out, "seed: {}", optional(metadata.seed));
    let _ = writeln!(out, "iterations: {}", metadata.iterations);
    let _ = writeln!(out, "stop_reason: {}", metadata.stop_reason);
}

fn write_comparison(out: &mut String, rows: &[Comparison]) {
    out.push_str("Analytical comparison:\n");
    for row in rows {
        let _ = writeln!(
            out,
            "  {}: {:.4} vs {:.4} ({:.2}% of analytical)",
            row.metric, row.simulated, row.analytical, row.percent_of_analytical
        );
    }
}

fn line(out: &mut String, label: &str, value: f64) {
    let _ = writeln!(out, "{}: {:.4}", label, value);
}

fn optional(value: Option<u64>) -> String {
    value.map_or_else(|| "none".to_string(), |value| value.to_string())
}

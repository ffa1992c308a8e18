use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::models::{DistributionConfig, RepairCrews, SimConfig};

#[derive(Parser, Debug)]
#[command(
    name = "mmck-sim",
    about = "Discrete-event simulation of an M/M/c/K queue with server breakdowns",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation until steady state (or the iteration limit).
    Run(RunArgs),
    /// Print the merged configuration without running.
    ShowConfig(RunArgs),
    /// Print the supported random-variate distributions.
    ListDistributions,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    #[arg(long, help = "TOML or JSON config file; flags override its values")]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub servers: Option<usize>,
    #[arg(long, help = "Maximum jobs in the system, queued plus in service")]
    pub capacity: Option<usize>,
    #[arg(long)]
    pub mean_inter_arrival: Option<f64>,
    #[arg(long)]
    pub mean_service: Option<f64>,
    #[arg(long)]
    pub mean_time_between_failures: Option<f64>,
    #[arg(long)]
    pub mean_time_to_repair: Option<f64>,
    #[arg(long, value_enum)]
    pub repair_crews: Option<RepairCrewsArg>,
    #[arg(long, value_enum)]
    pub distribution: Option<DistributionArg>,
    #[arg(long, help = "Seed the random streams; omit for entropy")]
    pub seed: Option<u64>,
    #[arg(long, help = "Stop after this many events even without steady state")]
    pub max_iterations: Option<u64>,
    #[arg(long)]
    pub compare_analytical: bool,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
    #[arg(long, default_value = "warn", help = "Log filter used when RUST_LOG is unset")]
    pub log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepairCrewsArg {
    Single,
    Multiple,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistributionArg {
    Exponential,
    Constant,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FormatArg {
    #[default]
    Human,
    Summary,
    Json,
}

impl From<RepairCrewsArg> for RepairCrews {
    fn from(value: RepairCrewsArg) -> Self {
        match value {
            RepairCrewsArg::Single => RepairCrews::Single,
            RepairCrewsArg::Multiple => RepairCrews::Multiple,
        }
    }
}

impl From<DistributionArg> for DistributionConfig {
    fn from(value: DistributionArg) -> Self {
        match value {
            DistributionArg::Exponential => DistributionConfig::Exponential,
            DistributionArg::Constant => DistributionConfig::Constant,
        }
    }
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

pub fn parse_args() -> Result<Cli> {
    Cli::try_parse().map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => Error::Cli(err.to_string()),
    })
}

pub fn load_config(path: &Path) -> Result<SimConfig> {
    let contents = fs::read_to_string(path).map_err(|err| {
        Error::ConfigIo(format!(
            "failed to read config '{}': {}",
            path.display(),
            err
        ))
    })?;
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .unwrap_or("");

    match ext {
        "toml" => toml::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse TOML: {}", err))),
        "json" => serde_json::from_str(&contents)
            .map_err(|err| Error::ConfigParse(format!("failed to parse JSON: {}", err))),
        "" => Err(Error::UnsupportedConfigFormat("unknown".to_string())),
        _ => Err(Error::UnsupportedConfigFormat(ext.to_string())),
    }
}

/// Merges the optional config file with flags (flags win) and validates.
pub fn build_config(args: RunArgs) -> Result<(SimConfig, FormatArg)> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig {
            servers: required(args.servers, "servers")?,
            capacity: required(args.capacity, "capacity")?,
            mean_inter_arrival: required(args.mean_inter_arrival, "mean-inter-arrival")?,
            mean_service: required(args.mean_service, "mean-service")?,
            mean_time_between_failures: required(
                args.mean_time_between_failures,
                "mean-time-between-failures",
            )?,
            mean_time_to_repair: required(args.mean_time_to_repair, "mean-time-to-repair")?,
            repair_crews: RepairCrews::default(),
            distribution: DistributionConfig::default(),
            seed: None,
            max_iterations: None,
            compare_analytical: false,
        },
    };

    if let Some(servers) = args.servers {
        config.servers = servers;
    }
    if let Some(capacity) = args.capacity {
        config.capacity = capacity;
    }
    if let Some(mean) = args.mean_inter_arrival {
        config.mean_inter_arrival = mean;
    }
    if let Some(mean) = args.mean_service {
        config.mean_service = mean;
    }
    if let Some(mean) = args.mean_time_between_failures {
        config.mean_time_between_failures = mean;
    }
    if let Some(mean) = args.mean_time_to_repair {
        config.mean_time_to_repair = mean;
    }
    if let Some(repair_crews) = args.repair_crews {
        config.repair_crews = repair_crews.into();
    }
    if let Some(distribution) = args.distribution {
        config.distribution = distribution.into();
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if args.max_iterations.is_some() {
        config.max_iterations = args.max_iterations;
    }
    if args.compare_analytical {
        config.compare_analytical = true;
    }

    config.validate()?;
    Ok((config, args.format))
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T> {
    value.ok_or_else(|| Error::Cli(format!("missing required argument --{}", flag)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags() -> RunArgs {
        RunArgs {
            servers: Some(2),
            capacity: Some(6),
            mean_inter_arrival: Some(1.0),
            mean_service: Some(1.5),
            mean_time_between_failures: Some(40.0),
            mean_time_to_repair: Some(2.0),
            ..RunArgs::default()
        }
    }

    #[test]
    fn flags_alone_build_a_config() {
        let (config, format) = build_config(flags()).unwrap();
        assert_eq!(config.servers, 2);
        assert_eq!(config.capacity, 6);
        assert_eq!(config.repair_crews, RepairCrews::Single);
        assert_eq!(config.distribution, DistributionConfig::Exponential);
        assert_eq!(format, FormatArg::Human);
    }

    #[test]
    fn missing_flag_is_reported_by_name() {
        let args = RunArgs {
            mean_service: None,
            ..flags()
        };
        let err = build_config(args).unwrap_err();
        assert_eq!(err.to_string(), "missing required argument --mean-service");
    }

    #[test]
    fn flags_override_file_values() {
        let mut path = std::env::temp_dir();
        path.push(format!("mmck-config-unit-{}.json", std::process::id()));
        fs::write(
            &path,
            r#"{
                "servers": 1,
                "capacity": 3,
                "mean_inter_arrival": 2.0,
                "mean_service": 1.0,
                "mean_time_between_failures": 10.0,
                "mean_time_to_repair": 1.0,
                "repair_crews": "multiple",
                "seed": 5
            }"#,
        )
        .unwrap();

        let args = RunArgs {
            config: Some(path.clone()),
            capacity: Some(8),
            distribution: Some(DistributionArg::Constant),
            ..RunArgs::default()
        };
        let (config, _) = build_config(args).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.servers, 1);
        assert_eq!(config.capacity, 8);
        assert_eq!(config.repair_crews, RepairCrews::Multiple);
        assert_eq!(config.distribution, DistributionConfig::Constant);
        assert_eq!(config.seed, Some(5));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_config(Path::new("settings.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigIo(_)));

        let mut path = std::env::temp_dir();
        path.push(format!("mmck-config-unit-{}.yaml", std::process::id()));
        fs::write(&path, "servers: 1").unwrap();
        let err = load_config(&path).unwrap_err();
        fs::remove_file(&path).ok();
        assert_eq!(err.to_string(), "unsupported config format 'yaml'");
    }

    #[test]
    fn invalid_values_fail_validation() {
        let args = RunArgs {
            capacity: Some(1),
            ..flags()
        };
        assert!(matches!(
            build_config(args),
            Err(Error::CapacityBelowServers { .. })
        ));
    }

    #[test]
    fn cli_parses_subcommands_and_bare_flags() {
        let cli = Cli::try_parse_from(["mmck-sim", "list-distributions"]).unwrap();
        assert!(matches!(cli.into_command(), Command::ListDistributions));

        let cli = Cli::try_parse_from([
            "mmck-sim",
            "--servers",
            "1",
            "--format",
            "json",
            "--repair-crews",
            "multiple",
        ])
        .unwrap();
        match cli.into_command() {
            Command::Run(args) => {
                assert_eq!(args.servers, Some(1));
                assert_eq!(args.format, FormatArg::Json);
                assert_eq!(args.repair_crews, Some(RepairCrewsArg::Multiple));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}

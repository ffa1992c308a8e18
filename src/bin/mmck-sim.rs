use mmck_sim::config::{self, Command, FormatArg};
use mmck_sim::error::Result;
use mmck_sim::logging;
use mmck_sim::output::{self, Formatter, HumanFormatter, JsonFormatter, SummaryFormatter};
use mmck_sim::sim;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = config::parse_args()?;
    match cli.into_command() {
        Command::Run(args) => {
            logging::init_logging(&args.log_level);
            let (config, format) = config::build_config(args)?;
            let result = sim::run_simulation(&config)?;

            let formatter = formatter_for(&format);
            print!("{}", formatter.write(&result));
        }
        Command::ShowConfig(args) => {
            logging::init_logging(&args.log_level);
            let (config, _) = config::build_config(args)?;
            print!("{}", output::describe_config(&config));
        }
        Command::ListDistributions => {
            print!("{}", output::list_distributions());
        }
    }

    Ok(())
}

fn formatter_for(format: &FormatArg) -> Box<dyn Formatter> {
    match format {
        FormatArg::Human => Box::new(HumanFormatter),
        FormatArg::Summary => Box::new(SummaryFormatter),
        FormatArg::Json => Box::new(JsonFormatter),
    }
}

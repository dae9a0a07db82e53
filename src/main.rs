use clap::{Args, Parser, Subcommand};
use config::{Config, TimeUnit, DEFAULT_CLASS_NUM, DEFAULT_CLERK_NUM, DEFAULT_LOG_PERIOD};
use error::AcsError;
use generator::GeneratorConfig;
use simulation::Simulation;
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

mod clerk;
mod config;
mod counter;
mod customer;
mod customer_task;
mod error;
mod events;
mod file_reader;
mod generator;
mod monitor;
mod rendezvous;
mod service_queue;
mod simulation;

#[derive(Parser)]
#[command(author, version, about = "Service counter simulation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the counter with the customers listed in FILE
    Run(RunArgs),
    /// Write a random customer file
    Generate(GenerateArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Customer file, one "id:class,arrival,service" per line
    file: PathBuf,

    /// Number of clerks
    #[arg(short = 'c', long = "clerks", default_value_t = DEFAULT_CLERK_NUM)]
    clerks: usize,

    /// Number of customer classes
    #[arg(long, default_value_t = DEFAULT_CLASS_NUM)]
    classes: usize,

    /// Use milliseconds instead of seconds to speed up the simulation
    #[arg(short, long)]
    ms: bool,

    /// Log every customer transition instead of periodic queue dumps
    #[arg(short, long)]
    real_time: bool,

    /// Periodic queue dumps and the final report as JSON
    #[arg(long)]
    json: bool,

    /// Units between periodic queue dumps
    #[arg(long, default_value_t = DEFAULT_LOG_PERIOD)]
    log_period: u64,
}

#[derive(Args)]
struct GenerateArgs {
    /// Number of customers to generate
    #[arg(short = 'n', long, default_value_t = 10)]
    customers: u32,

    /// Number of customer classes
    #[arg(short = 'c', long, default_value_t = DEFAULT_CLASS_NUM)]
    classes: usize,

    /// Minimum arrival time
    #[arg(short = 'a', long, default_value_t = 1)]
    min_arrival: u64,

    /// Maximum arrival time
    #[arg(short = 'A', long, default_value_t = 10)]
    max_arrival: u64,

    /// Minimum service time
    #[arg(short = 's', long, default_value_t = 1)]
    min_service: u64,

    /// Maximum service time
    #[arg(short = 'S', long, default_value_t = 10)]
    max_service: u64,

    /// Output file
    #[arg(short, long, default_value = "customers.txt")]
    output: PathBuf,
}

async fn run(args: RunArgs) -> Result<(), AcsError> {
    let config = Config {
        clerks: args.clerks,
        classes: args.classes,
        time_unit: if args.ms {
            TimeUnit::Millis
        } else {
            TimeUnit::Seconds
        },
        real_time: args.real_time,
        json: args.json,
        log_period: args.log_period,
        ..Config::default()
    };

    let simulation = Simulation::new(config.clone())?;
    let customers = file_reader::read_customers(&args.file, config.classes)?;
    let report = simulation.run(customers).await?;

    if config.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in report.summary_lines(config.time_unit) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn generate(args: GenerateArgs) -> Result<(), AcsError> {
    let config = GeneratorConfig {
        customers: args.customers,
        classes: args.classes,
        min_arrival: args.min_arrival,
        max_arrival: args.max_arrival,
        min_service: args.min_service,
        max_service: args.max_service,
    };
    let customers = generator::generate(&config, &mut rand::thread_rng())?;
    generator::write_customers(&customers, File::create(&args.output)?)?;
    log::info!(
        "[GENERATOR] {} customers written to {}",
        customers.len(),
        args.output.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run(args).await,
        Commands::Generate(args) => generate(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

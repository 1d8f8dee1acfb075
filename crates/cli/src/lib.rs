pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;
use storelens_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "storelens",
    about = "Storelens retail analytics CLI",
    long_about = "Run retail analytics pipelines over a transactional store database: customer segmentation, inventory optimization, demand forecasting, and product associations.",
    after_help = "Examples:\n  storelens seed\n  storelens segment\n  storelens forecast --product 1 --horizon 14\n  storelens doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the demo retail dataset and verify it supports every pipeline")]
    Seed,
    #[command(about = "Validate config, database connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Segment customers by recency, frequency, and monetary value")]
    Segment,
    #[command(about = "Classify inventory and compute reorder recommendations")]
    Inventory {
        #[arg(long, help = "Restrict the analysis to a single store")]
        store: Option<i64>,
    },
    #[command(about = "Forecast daily demand for a product with confidence intervals")]
    Forecast {
        #[arg(long, help = "Product to forecast")]
        product: i64,
        #[arg(long, help = "Days ahead to forecast (defaults to the configured horizon)")]
        horizon: Option<u32>,
    },
    #[command(about = "Find co-purchased products, similar customers, and category stats")]
    Associations {
        #[arg(long, help = "Product to analyze")]
        product: i64,
    },
}

/// Logging goes to stderr so report JSON on stdout stays machine-readable.
fn init_tracing() {
    use tracing::Level;

    let (level, format) = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            (config.logging.level.parse::<Level>().unwrap_or(Level::INFO), config.logging.format)
        }
        Err(_) => (Level::WARN, LogFormat::Compact),
    };

    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    let _ = result;
}

pub fn run() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Segment => commands::segment::run(),
        Command::Inventory { store } => commands::inventory::run(store),
        Command::Forecast { product, horizon } => commands::forecast::run(product, horizon),
        Command::Associations { product } => commands::associations::run(product),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

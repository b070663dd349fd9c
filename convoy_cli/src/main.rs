use clap::{Parser, Subcommand};
use convoy_backend::client::BackendClient;
use jiff::{Zoned, civil::Date};
use mimalloc::MiMalloc;

use crate::{config::Config, router::Router, simulation_args::SimulationArgs};

mod complete;
mod config;
mod operate;
mod parsers;
mod render;
mod router;
mod screen;
mod simulation_args;
mod track;
mod trips;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,

    /// Draw straight lines between stops instead of asking OSRM for roads
    #[arg(long)]
    offline: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow one cargo to the depot
    #[command(visible_alias = "t")]
    Track {
        /// Id of the cargo to follow
        #[arg(short, long)]
        cargo: u64,

        #[command(flatten)]
        simulation: SimulationArgs,
    },
    /// Simulate every trip planned for a day
    #[command(visible_alias = "o")]
    Operate {
        /// Day of the plan, today when omitted (e.g., "2025-01-15")
        #[arg(long)]
        date: Option<Date>,

        #[command(flatten)]
        simulation: SimulationArgs,
    },
    /// List the trips planned for a day
    Trips {
        #[arg(long)]
        date: Option<Date>,
    },
    /// Record the delivery of trips after a failed sync
    Complete {
        #[arg(required = true, value_delimiter = ',')]
        trip_ids: Vec<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    let backend = BackendClient::new(config.backend);
    let today = || Zoned::now().date();

    match cli.command {
        Commands::Track { cargo, simulation } => {
            let router = Router::new(config.osrm, cli.offline);
            track::run(backend, router, cargo, simulation).await?
        }
        Commands::Operate { date, simulation } => {
            let router = Router::new(config.osrm, cli.offline);
            operate::run(backend, router, date.unwrap_or_else(today), simulation).await?
        }
        Commands::Trips { date } => trips::run(backend, date.unwrap_or_else(today)).await?,
        Commands::Complete { trip_ids } => complete::run(backend, trip_ids).await?,
    }

    Ok(())
}

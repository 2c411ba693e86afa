use std::{process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use simulator::models::{DEFAULT_INTERVAL_SECS, DEFAULT_NOTIFY_URL, Mode, Settings};
use tracing::error;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    #[arg(long, env = "DB_NAME", default_value = "bizpulse")]
    db_name: String,

    #[arg(long, env = "NOTIFY_URL", default_value = DEFAULT_NOTIFY_URL)]
    notify_url: String,

    #[arg(long, default_value_t = DEFAULT_INTERVAL_SECS)]
    interval_secs: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Backfill history instead of streaming live sales
    Seed {
        days: u32,

        #[arg(default_value_t = 24)]
        per_day: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let mode = match args.command {
        Some(Command::Seed { days, per_day }) => Mode::Seed { days, per_day },
        None => Mode::Live,
    };

    let settings = Settings {
        database_url: args.database_url,
        db_name: args.db_name,
        notify_url: args.notify_url,
        interval: Duration::from_secs(args.interval_secs.max(1)),
        mode,
    };

    match simulator::start(settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

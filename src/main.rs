use anyhow::Result;
use clap::{Parser, Subcommand};
use sparkify_dwh::cli::counts::{self, CountsConfig};
use sparkify_dwh::config::{resolve_dsn, Settings};
use sparkify_dwh::pipeline::{run_load, run_setup};
use sparkify_dwh::util::env as env_util;
use sparkify_dwh::warehouse::Warehouse;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dwh", version, about = "Sparkify warehouse loader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
enum Commands {
    /// Recreate the dwh schema and all seven tables, empty
    Setup {
        /// Optional override for the warehouse connection string
        #[arg(long)]
        db_url: Option<String>,
    },
    /// Bulk-load staging from S3, then populate dimensions and the fact table
    Load {
        /// Optional override for the warehouse connection string
        #[arg(long)]
        db_url: Option<String>,
    },
    /// Setup followed by load
    Run {
        /// Optional override for the warehouse connection string
        #[arg(long)]
        db_url: Option<String>,
    },
    /// Print row counts for the star-schema tables
    Counts {
        /// Optional override for the warehouse connection string
        #[arg(long)]
        db_url: Option<String>,
        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_util::init_env();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Setup { db_url } => {
            let settings = Settings::from_env()?;
            settings.log_snapshot();
            let wh = connect(db_url.as_deref(), &settings).await?;
            let res = run_setup(&wh).await;
            wh.close().await;
            res
        }
        Commands::Load { db_url } => {
            let settings = Settings::from_env()?;
            settings.log_snapshot();
            let wh = connect(db_url.as_deref(), &settings).await?;
            let res = run_load(&wh, &settings).await;
            wh.close().await;
            res
        }
        Commands::Run { db_url } => {
            let settings = Settings::from_env()?;
            settings.log_snapshot();
            let started = Instant::now();
            let wh = connect(db_url.as_deref(), &settings).await?;
            // Setup must finish before load starts; load assumes the tables
            // already exist.
            let res = match run_setup(&wh).await {
                Ok(()) => run_load(&wh, &settings).await,
                Err(e) => Err(e),
            };
            wh.close().await;
            info!(elapsed_ms = %started.elapsed().as_millis(), "run complete");
            res
        }
        Commands::Counts { db_url, json } => {
            counts::run(CountsConfig {
                database_url: db_url,
                json,
            })
            .await
        }
    }
}

async fn connect(db_url: Option<&str>, settings: &Settings) -> Result<Warehouse> {
    let dsn = resolve_dsn(db_url, &settings.cluster)?;
    Warehouse::connect(&dsn).await
}

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod config;
mod duration;
mod enrich;
mod error;
mod export;
mod fetch;
mod filter;
mod models;
mod pipeline;
mod publish;

use pipeline::{RunOptions, RunOutcome};
use publish::PublishOutcome;

#[derive(Parser)]
#[command(name = "watchtime-sync")]
#[command(about = "Republishes student watch-time aggregates to the local reporting API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, aggregate, enrich and republish the three views
    Run {
        /// Skip the DELETE and POST calls
        #[arg(long)]
        dry_run: bool,
        /// Also write each view as CSV into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,
    },
    /// Print the known course durations
    Courses,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { dry_run, export_dir } => {
            let config = config::Config::from_env()?;
            let client = reqwest::Client::builder()
                .user_agent(concat!("watchtime-sync/", env!("CARGO_PKG_VERSION")))
                .build()
                .context("failed to build HTTP client")?;
            let options = RunOptions { dry_run, export_dir };

            match pipeline::run(&client, &config, &options, chrono::Utc::now()).await? {
                RunOutcome::Aborted(reason) => {
                    println!("Run aborted: {reason:?}. Nothing was deleted or sent.");
                }
                RunOutcome::Completed(summary) => {
                    println!(
                        "Processed {} watch records (enrollment data {}).",
                        summary.watch_records,
                        if summary.enriched { "joined" } else { "unavailable" }
                    );
                    for destination in &summary.destinations {
                        let published = match destination.published {
                            PublishOutcome::Sent(rows) => format!("sent {rows} rows"),
                            PublishOutcome::Rejected(status) => format!("rejected with {status}"),
                            PublishOutcome::Failed => "unreachable".to_string(),
                            PublishOutcome::Empty => "nothing to send".to_string(),
                            PublishOutcome::Skipped => format!("dry run, {} rows", destination.rows),
                        };
                        println!(
                            "- {}: delete {:?}, {}",
                            destination.url, destination.deleted, published
                        );
                    }
                }
            }
        }
        Commands::Courses => {
            for (course, max) in aggregate::COURSE_DURATIONS {
                println!("{max}  {course}");
            }
        }
    }

    Ok(())
}

// src/main.rs
//! Binary entrypoint: validates the environment, wires the agent, and either
//! runs the pipeline once (`--run-now`) or enters the weekly scheduling loop.

use anyhow::{Context, Result};
use chrono::Weekday;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use competitor_monitor::agent::CompetitorAgent;
use competitor_monitor::config::Settings;
use competitor_monitor::schedule::{Scheduler, WeeklySchedule};

const LOG_FILE: &str = "competitor_agent.log";

#[derive(Parser, Debug)]
#[command(
    name = "competitor-monitor",
    about = "Collects competitor updates, summarizes them with Gemini, and publishes to Slack and Notion."
)]
struct Cli {
    /// Run the pipeline immediately instead of waiting for the weekly schedule.
    #[arg(long)]
    run_now: bool,
}

/// Console logging plus an append-mode log file of all operations.
fn init_tracing() -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(LOG_FILE)
        .with_context(|| format!("opening log file {LOG_FILE}"))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .with(fmt::layer().with_ansi(false).with_writer(std::sync::Mutex::new(file)))
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when variables come from the host env.
    let _ = dotenvy::dotenv();
    init_tracing()?;

    let cli = Cli::parse();

    let settings = match Settings::from_env() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = ?e, "refusing to start");
            return Ok(());
        }
    };

    let agent = Arc::new(CompetitorAgent::new(settings));

    if cli.run_now {
        agent.run_analysis().await;
        return Ok(());
    }

    // Weekly run: Monday 09:00 UTC.
    let mut scheduler = Scheduler::new();
    let job_agent = agent.clone();
    scheduler.add_job(WeeklySchedule::new(Weekday::Mon, 9, 0), move || {
        let agent = job_agent.clone();
        Box::pin(async move { agent.run_analysis().await })
    });

    tracing::info!("competitor monitoring agent started; waiting for scheduled runs");
    scheduler.run().await;
    Ok(())
}

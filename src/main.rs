// procdash - version 0.1.0
// Live terminal dashboard for host and process metrics
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::EventStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

mod cli;
mod commands;
mod config;
mod dashboard;
mod error;
mod fixture;
mod input;
mod logging;
mod model;
mod pagination;
mod provider;
mod render;
mod sampler;
mod shutdown;
mod surface;
mod view;

use cli::{Args, Commands};
use commands::{command_check, command_config, command_generate_testdata, command_test};
use config::{resolve_config, show_config, validate_effective_config, Config};
use dashboard::Dashboard;
use fixture::FixtureProvider;
use logging::{setup_logging, LogTarget};
use provider::{MetricsProvider, SysinfoProvider};
use sampler::{Sampler, TICK_INTERVAL};
use shutdown::ShutdownCoordinator;
use surface::TerminalSurface;

/// Snapshots waiting for the dashboard; the loop coalesces bursts anyway.
const SNAPSHOT_QUEUE: usize = 4;

/// How long the sampler may take to notice shutdown before it is aborted.
const SAMPLER_GRACE: Duration = Duration::from_secs(2);

type BoxedProvider = Box<dyn MetricsProvider + Send>;

/// Live host metrics, or a fixture file when `--test-data-file` is given.
fn build_provider(args: &Args) -> Result<BoxedProvider> {
    match &args.test_data_file {
        Some(path) => {
            let provider = FixtureProvider::from_file(path)
                .with_context(|| format!("Failed to load test data {}", path.display()))?;
            info!("Using fixture data from {}", path.display());
            Ok(Box::new(provider))
        }
        None => Ok(Box::new(SysinfoProvider::new())),
    }
}

fn run_command(command: &Commands, args: &Args, config: &Config) -> Result<()> {
    match command {
        Commands::Check => {
            let mut provider = build_provider(args)?;
            if !command_check(&mut provider, config)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Config {
            output,
            format,
            commented,
        } => command_config(output.clone(), *format, *commented),
        Commands::Test {
            iterations,
            verbose,
        } => {
            let mut sampler = Sampler::new(
                build_provider(args)?,
                config.disk_path(),
                config.process_order(),
            );
            command_test(&mut sampler, config.page_size(), *iterations, *verbose)
        }
        Commands::GenerateTestdata {
            output,
            processes,
            cores,
        } => command_generate_testdata(output.clone(), *processes, *cores),
    }
}

async fn run_dashboard(args: &Args, config: &Config) -> Result<()> {
    info!(
        "Starting procdash: page_size={}, disk_path={}, tick={}s",
        config.page_size(),
        config.disk_path().display(),
        TICK_INTERVAL.as_secs()
    );

    let provider = build_provider(args)?;
    let shutdown = ShutdownCoordinator::new();
    tokio::spawn(shutdown.clone().listen_for_signals());

    let surface = TerminalSurface::new().context("Failed to initialise terminal")?;
    let mut dashboard = Dashboard::new(surface, config.page_size());

    let (tx, rx) = mpsc::channel(SNAPSHOT_QUEUE);
    let sampler = Sampler::new(provider, config.disk_path(), config.process_order());
    let mut sampler_task = tokio::spawn(sampler.run(tx, shutdown.subscribe()));

    let result = dashboard.run(rx, EventStream::new(), &shutdown).await;

    match tokio::time::timeout(SAMPLER_GRACE, &mut sampler_task).await {
        Ok(Ok(())) => debug!("Sampler task joined"),
        Ok(Err(e)) => warn!("Sampler task failed: {}", e),
        Err(_) => {
            warn!("Sampler did not stop within {:?}, aborting", SAMPLER_GRACE);
            sampler_task.abort();
        }
    }

    let released = dashboard.release();
    shutdown.finish();

    result.context("Dashboard stopped on a render failure")?;
    released.context("Failed to restore terminal")?;
    Ok(())
}

/// -------------------------------------------------------------------
/// MAIN APPLICATION ENTRY POINT
/// -------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    let config = resolve_config(&args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }

    if let Some(command) = &args.command {
        setup_logging(
            config.log_level(),
            LogTarget::for_command(config.log_file.clone()),
        )?;
        return run_command(command, &args, &config);
    }

    setup_logging(
        config.log_level(),
        LogTarget::for_dashboard(config.log_file.clone()),
    )?;
    run_dashboard(&args, &config).await
}

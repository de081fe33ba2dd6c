use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::report::{colored_visit_line, error_line, summary_line};
use workload::{ReqwestTransport, Scheduler, SystemClock, WorkloadConfig, WorkloadEvent};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("workload")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("workload.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// No file and no requests: complain, show help, exit 1.
fn invalid_arguments() -> ! {
    eprintln!("{}", "ERROR: Invalid arguments!".red());
    eprintln!();
    let _ = Cli::command().print_help();
    std::process::exit(1);
}

async fn run_workload(cli: &Cli, config: WorkloadConfig) -> Result<()> {
    let (templates, scheduler_config) = config
        .into_scheduler(Arc::new(SystemClock))
        .context("Invalid configuration")?;

    let (mut scheduler, mut events) =
        Scheduler::new(templates, scheduler_config, Arc::new(ReqwestTransport::new()))
            .context("Failed to create scheduler")?;

    scheduler.start().context("Failed to start scheduler")?;

    if cli.is_verbose() {
        println!(
            "{} one request every {:?}, Ctrl-C to stop",
            "Running:".green(),
            scheduler.interval()
        );
    }

    let mut visits = 0u64;
    let mut errors = 0u64;

    loop {
        tokio::select! {
            Some(event) = events.recv() => match event {
                WorkloadEvent::Visit(visit) => {
                    visits += 1;
                    if !cli.silent {
                        println!("{}", colored_visit_line(&visit));
                    }
                }
                WorkloadEvent::Error(error) => {
                    errors += 1;
                    eprintln!("{}", error_line(&error));
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping scheduler");
                break;
            }
        }
    }

    scheduler.stop();

    println!("{}", summary_line(&scheduler.stats(), visits, errors).yellow());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();
    if !cli.has_input() {
        invalid_arguments();
    }

    // Load configuration, then layer the command line over it
    let mut config = WorkloadConfig::load(cli.file.as_ref()).context("Failed to load configuration")?;
    cli.apply_to(&mut config).context("Invalid command-line arguments")?;

    info!("Starting with config from: {:?}", cli.file);

    run_workload(&cli, config).await.context("Workload failed")?;

    Ok(())
}

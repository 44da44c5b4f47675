//! fs-churn - Randomized file churn generator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use fs_churn::churn::ChurnCoordinator;
use fs_churn::config::{ChurnConfig, CliArgs, Command, PopulateConfig};
use fs_churn::generate::{populate, scan_occupied};
use fs_churn::progress::{
    print_churn_header, print_churn_summary, print_populate_header, print_populate_summary,
    ProgressReporter,
};
use fs_churn::size::to_si;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose);

    match args.command.clone() {
        Command::Populate {
            dir,
            size,
            max_files,
            min_files,
        } => {
            let config = PopulateConfig::new(dir, &size, min_files, max_files)
                .context("Invalid configuration")?;
            run_populate(config, args.quiet)
        }
        Command::Churn {
            dir,
            buffer,
            scan_interval,
        } => {
            let config = ChurnConfig::new(dir, &buffer, scan_interval)
                .context("Invalid configuration")?;
            run_churn(config, args.quiet)
        }
    }
}

/// Run the one-shot population
fn run_populate(config: PopulateConfig, quiet: bool) -> Result<()> {
    if !quiet {
        print_populate_header(
            &config.dest.display().to_string(),
            config.total_size,
            config.min_files,
            config.max_files,
        );
    }

    // Account for files already present so repeated runs converge on
    // the target instead of doubling it
    let occupancy = scan_occupied(&config.dest)
        .context("Failed to scan destination directory")?;
    if occupancy.files > 0 {
        info!(
            files = occupancy.files,
            size = %to_si(occupancy.bytes),
            "Destination already contains files"
        );
    }
    let config = config.adjusted_for(occupancy.bytes, occupancy.files);

    let mut rng = rand::thread_rng();
    let report = populate(&config, &mut rng);

    if !quiet {
        print_populate_summary(&report);
    }

    Ok(())
}

/// Run the continuous churn until interrupted
fn run_churn(config: ChurnConfig, quiet: bool) -> Result<()> {
    if !quiet {
        print_churn_header(
            &config.dir.display().to_string(),
            config.buffer,
            config.scan_interval,
        );
    }

    let mut coordinator = ChurnCoordinator::new(config);

    // Graceful shutdown on Ctrl-C
    let shutdown_flag = coordinator.shutdown_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        shutdown_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    coordinator.start().context("Failed to start churn")?;

    let progress = if quiet {
        None
    } else {
        Some(ProgressReporter::new())
    };

    // Drive the status line until shutdown is requested
    let shutdown = coordinator.shutdown_flag();
    let stats = coordinator.stats();
    while !shutdown.load(Ordering::Relaxed) {
        if let Some(ref p) = progress {
            p.update(&stats.snapshot(), coordinator.net_bytes());
        }
        std::thread::sleep(Duration::from_millis(500));
    }

    let report = coordinator.finish().context("Churn failed")?;

    if let Some(ref p) = progress {
        p.finish("Churn stopped");
    }

    if !quiet {
        print_churn_summary(&report);
    }

    Ok(())
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fs_churn=debug,warn")
    } else {
        EnvFilter::new("fs_churn=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

//! Progress reporting for the churn engine
//!
//! Provides a live status line using an indicatif spinner, plus styled
//! header and summary blocks around each run.

use crate::churn::{ChurnReport, StatsSnapshot};
use crate::generate::PopulateReport;
use crate::size::{to_si, to_si_signed};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter that displays live churn status
pub struct ProgressReporter {
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the status line from the live counters
    pub fn update(&self, stats: &StatsSnapshot, net_bytes: i64) {
        let msg = format!(
            "Ops: {} | Skipped: {} | Failed: {} | Paused: {} | Net: {} | Scans: {}",
            stats.completed,
            stats.skipped,
            stats.failed,
            stats.paused_cycles,
            to_si_signed(net_bytes),
            stats.scans,
        );
        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Print a header at the start of a churn run
pub fn print_churn_header(dir: &str, buffer: i64, scan_interval: Duration) {
    print_banner();
    println!("  {} {}", style("Target:").bold(), dir);
    println!("  {} {}", style("Buffer:").bold(), to_si_signed(buffer));
    println!(
        "  {} every {}s",
        style("Rescan:").bold(),
        scan_interval.as_secs()
    );
    println!();
}

/// Print a header at the start of a populate run
pub fn print_populate_header(dir: &str, total_size: u64, min_files: u64, max_files: u64) {
    print_banner();
    println!("  {} {}", style("Target:").bold(), dir);
    println!("  {} {}", style("Size:").bold(), to_si(total_size));
    println!(
        "  {} {} to {}",
        style("Files:").bold(),
        min_files,
        max_files
    );
    println!();
}

/// Print a summary after a populate run
pub fn print_populate_summary(report: &PopulateReport) {
    println!();
    if report.stalled {
        println!("{}", style("Population stalled").yellow().bold());
    } else {
        println!("{}", style("Population complete").green().bold());
    }
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Files:").bold(), report.files_created);
    println!(
        "  {} {}",
        style("Written:").bold(),
        to_si(report.bytes_written)
    );
    println!();
}

/// Print a summary after a churn run
pub fn print_churn_summary(report: &ChurnReport) {
    let stats = &report.stats;
    println!();
    println!("{}", style("Churn stopped").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Completed:").bold(), stats.completed);
    println!("  {} {}", style("Skipped:").bold(), stats.skipped);
    if stats.failed > 0 {
        println!(
            "  {} {}",
            style("Failed:").yellow().bold(),
            stats.failed
        );
    }
    if stats.paused_cycles > 0 {
        println!("  {} {}", style("Paused cycles:").bold(), stats.paused_cycles);
    }
    println!("  {} {}", style("Rescans:").bold(), stats.scans);
    println!(
        "  {} {}",
        style("Net bytes:").bold(),
        to_si_signed(report.net_bytes)
    );
    println!(
        "  {} {:.1}s",
        style("Duration:").bold(),
        report.duration.as_secs_f64()
    );
    println!();
}

fn print_banner() {
    println!();
    println!(
        "{} {}",
        style("fs-churn").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
}

//! Configuration types for fs-churn
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Validated runtime configuration for both subcommands

use crate::error::{ConfigError, ConfigResult};
use crate::size::parse_size;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default period between directory rescans, in seconds
const DEFAULT_SCAN_INTERVAL_SECS: u64 = 30;

/// Randomized file churn generator for stress-testing filesystem tools
#[derive(Parser, Debug, Clone)]
#[command(
    name = "fs-churn",
    version,
    about = "Randomized file churn generator for stress-testing filesystem tools",
    long_about = "Generates and continuously mutates a population of files inside a target\n\
                  directory, to exercise backup agents, sync daemons, and monitoring probes\n\
                  under randomized load.\n\n\
                  Sizes use decimal (base-1000) multipliers: 1Ki = 1000 bytes.",
    after_help = "EXAMPLES:\n    \
        fs-churn populate /mnt/test --size 10Mi --max-files 50\n    \
        fs-churn churn /mnt/test --buffer 1Mi\n    \
        touch /mnt/test/__pause__   # pause a running churn\n"
)]
pub struct CliArgs {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Quiet mode - suppress the header, spinner, and summary
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose output (per-operation logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Fill a directory with random files summing to a target size
    Populate {
        /// Destination directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Total size of random data, e.g. 10Mi (units: b,Ki,Mi,Gi,Ti)
        #[arg(long, value_name = "SIZE")]
        size: String,

        /// Maximum number of files to create
        #[arg(long, value_name = "NUM")]
        max_files: u64,

        /// Minimum number of files to create
        #[arg(long, default_value = "1", value_name = "NUM")]
        min_files: u64,
    },

    /// Continuously mutate the files in a directory
    Churn {
        /// Target directory
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Net growth allowance for mutating operations, e.g. 1Mi
        #[arg(long, default_value = "1b", value_name = "SIZE")]
        buffer: String,

        /// Seconds between directory rescans
        #[arg(long, default_value_t = DEFAULT_SCAN_INTERVAL_SECS, value_name = "SECS")]
        scan_interval: u64,
    },
}

/// Validated configuration for the populate subcommand
#[derive(Debug, Clone)]
pub struct PopulateConfig {
    /// Destination directory
    pub dest: PathBuf,

    /// Target total size in bytes
    pub total_size: u64,

    /// Minimum number of files
    pub min_files: u64,

    /// Maximum number of files
    pub max_files: u64,
}

impl PopulateConfig {
    /// Validate CLI arguments into a runtime configuration
    pub fn new(dir: PathBuf, size: &str, min_files: u64, max_files: u64) -> ConfigResult<Self> {
        validate_directory(&dir)?;

        let total_size = parse_size(size)?;
        if total_size == 0 {
            return Err(ConfigError::ZeroSize {
                input: size.to_string(),
            });
        }

        if min_files > max_files {
            return Err(ConfigError::InvalidFileCounts {
                min: min_files,
                max: max_files,
            });
        }

        Ok(Self {
            dest: dir,
            total_size,
            min_files,
            max_files,
        })
    }

    /// Derive a configuration that accounts for files already present
    ///
    /// Subtracts the occupied bytes and file count (floored at zero)
    /// so repeated populate runs converge on the target instead of
    /// doubling it.
    pub fn adjusted_for(&self, occupied_bytes: u64, occupied_files: u64) -> Self {
        Self {
            dest: self.dest.clone(),
            total_size: self.total_size.saturating_sub(occupied_bytes),
            min_files: self.min_files.saturating_sub(occupied_files),
            max_files: self.max_files.saturating_sub(occupied_files),
        }
    }
}

/// Validated configuration for the churn subcommand
#[derive(Debug, Clone)]
pub struct ChurnConfig {
    /// Target directory
    pub dir: PathBuf,

    /// Byte budget ceiling for net growth
    pub buffer: i64,

    /// Period between directory rescans
    pub scan_interval: Duration,
}

impl ChurnConfig {
    /// Validate CLI arguments into a runtime configuration
    pub fn new(dir: PathBuf, buffer: &str, scan_interval_secs: u64) -> ConfigResult<Self> {
        validate_directory(&dir)?;

        let bytes = parse_size(buffer)?;
        let bytes = i64::try_from(bytes).map_err(|_| ConfigError::InvalidSize {
            input: buffer.to_string(),
            reason: "buffer too large for a signed byte counter".to_string(),
        })?;

        if scan_interval_secs == 0 {
            return Err(ConfigError::InvalidScanInterval {
                secs: scan_interval_secs,
            });
        }

        Ok(Self {
            dir,
            buffer: bytes,
            scan_interval: Duration::from_secs(scan_interval_secs),
        })
    }
}

/// The destination must exist and be a directory; fatal at startup only
fn validate_directory(dir: &Path) -> ConfigResult<()> {
    if !dir.exists() {
        return Err(ConfigError::DestinationMissing { path: dir.to_path_buf() });
    }
    if !dir.is_dir() {
        return Err(ConfigError::NotADirectory { path: dir.to_path_buf() });
    }
    Ok(())
}

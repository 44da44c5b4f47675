//! Error types for fs-churn
//!
//! This module defines the error hierarchy:
//! - Configuration and CLI errors (fatal at startup only)
//! - Worker thread errors (spawn/join failures)
//! - I/O errors
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Per-operation churn errors never reach this hierarchy: they are
//!   fully recovered inside the dispatcher and reported as outcomes

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the fs-churn application
#[derive(Error, Debug)]
pub enum ChurnError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Worker/concurrency errors
    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    /// I/O errors (directory listing, population writes, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration and CLI errors
///
/// These are the only fatal errors: everything that can go wrong after
/// startup is logged and recovered in place.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Size string did not parse
    #[error("Invalid size '{input}': {reason}")]
    InvalidSize { input: String, reason: String },

    /// Destination directory missing
    #[error("Destination directory '{}' does not exist", path.display())]
    DestinationMissing { path: PathBuf },

    /// Destination exists but is not a directory
    #[error("Destination '{}' is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    /// min-files exceeds max-files
    #[error("Invalid file counts: min-files {min} exceeds max-files {max}")]
    InvalidFileCounts { min: u64, max: u64 },

    /// Target size must be positive
    #[error("Invalid size '{input}': total size must be greater than zero")]
    ZeroSize { input: String },

    /// Scan interval out of range
    #[error("Invalid scan interval {secs}: must be at least 1 second")]
    InvalidScanInterval { secs: u64 },
}

/// Worker thread errors
#[derive(Error, Debug)]
pub enum WorkerError {
    /// Worker panicked
    #[error("Worker '{name}' panicked")]
    Panicked { name: String },

    /// Worker initialization failed
    #[error("Failed to spawn worker '{name}': {reason}")]
    SpawnFailed { name: String, reason: String },
}

/// Result type alias for ChurnError
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Result type alias for ConfigError
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

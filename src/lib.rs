//! fs-churn - Randomized file churn generator
//!
//! A tool for stress-testing filesystem-facing software (backup agents,
//! sync daemons, monitoring probes) by generating and continuously
//! mutating a population of files in a target directory.
//!
//! # Features
//!
//! - **Random Population**: One-shot bootstrap that fills a directory
//!   with randomly named, randomly sized files summing to a target size.
//!
//! - **Continuous Churn**: A driver loop that performs randomized
//!   create/read/append/delete/truncate/chmod operations against the
//!   directory, forever, with randomized pacing and exponential backoff
//!   on failure.
//!
//! - **Byte Budget**: A soft ceiling on net bytes added during churn, so
//!   a long run does not fill the disk. The budget is advisory: a race
//!   window between check and commit is an accepted property.
//!
//! - **Cooperative Pause**: Dropping a `__pause__` file into the target
//!   directory suspends all operations until it is removed.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Target Directory                        │
//! └───────────────▲────────────────────────────▲────────────────┘
//!                 │ readdir (every 30s)        │ file ops
//! ┌───────────────┴──────────┐  ┌──────────────┴────────────────┐
//! │     Scanner Thread       │  │        Operator Thread        │
//! │  rebuilds the index      │  │  random op every 1-4s,        │
//! │  from the filesystem     │  │  exponential backoff on error │
//! └───────────────┬──────────┘  └──────────────┬────────────────┘
//!                 │                            │
//!                 ▼                            ▼
//!          ┌─────────────────────────────────────────┐
//!          │            ChurnState (one lock)        │
//!          │  - directory index (set of file paths)  │
//!          │  - byte budget (net bytes altered)      │
//!          └─────────────────────────────────────────┘
//! ```
//!
//! Lock holds are always short (a snapshot or a single-key mutation) and
//! never span file I/O.
//!
//! # Example
//!
//! ```bash
//! # Create ~10 MB of random files (at most 50 of them)
//! fs-churn populate /mnt/test --size 10Mi --max-files 50
//!
//! # Churn the directory forever, allowing up to 1 MB of net growth
//! fs-churn churn /mnt/test --buffer 1Mi
//!
//! # Pause the churn without stopping the process
//! touch /mnt/test/__pause__
//! ```

pub mod churn;
pub mod config;
pub mod error;
pub mod generate;
pub mod progress;
pub mod size;
pub mod state;

pub use config::{ChurnConfig, PopulateConfig};
pub use error::{ChurnError, Result};
pub use state::{ChurnState, PAUSE_SENTINEL};

//! Continuous churn engine
//!
//! Two long-running workers drive the churn: a low-frequency scanner
//! that rebuilds the directory index, and an operator that performs one
//! randomized operation per cycle with backoff on failure.

pub mod coordinator;
pub mod dispatcher;

pub use coordinator::{Backoff, ChurnCoordinator, ChurnReport, ChurnStats, StatsSnapshot};
pub use dispatcher::{perform_random_operation, OpKind, OpOutcome};

//! Churn coordinator - drives the scanner and operator threads
//!
//! The coordinator is responsible for:
//! - Building the shared state and performing the initial scan
//! - Spawning the two long-running workers (scanner and operator)
//! - Exponential backoff pacing on operation failure
//! - Graceful shutdown via a shared flag checked at the head of every
//!   loop iteration and inside every sleep
//! - Final statistics

use crate::churn::dispatcher::{perform_random_operation, OpOutcome};
use crate::config::ChurnConfig;
use crate::error::{Result, WorkerError};
use crate::state::ChurnState;
use rand::Rng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Granularity at which sleeping workers re-check the shutdown flag
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Exponential backoff state for the operator loop
///
/// Not shared: each loop owns its exponent. A failure sleeps
/// `2^exponent` seconds and then grows the exponent; a success halves
/// it (asymptotic decay toward zero, never clamped to exactly zero).
/// The exponent is capped so a long failure streak tops out at 64s
/// between attempts instead of growing without bound.
#[derive(Debug, Default)]
pub struct Backoff {
    exponent: f64,
}

impl Backoff {
    /// Hard ceiling on the exponent (2^6 = 64 second max delay)
    const MAX_EXPONENT: f64 = 6.0;

    /// Current delay for a failure observed now
    pub fn delay(&self) -> Duration {
        Duration::from_secs_f64(2f64.powf(self.exponent))
    }

    /// Record a failure: returns the delay to sleep, then grows the
    /// exponent for the next failure
    pub fn record_failure(&mut self) -> Duration {
        let delay = self.delay();
        self.exponent = (self.exponent + 1.0).min(Self::MAX_EXPONENT);
        delay
    }

    /// Record a success: decays the exponent
    pub fn record_success(&mut self) {
        self.exponent /= 2.0;
    }
}

/// Counters shared between the workers and the progress display
#[derive(Debug, Default)]
pub struct ChurnStats {
    /// Operations completed
    pub completed: AtomicU64,

    /// Operations skipped on an unmet precondition
    pub skipped: AtomicU64,

    /// Operations failed
    pub failed: AtomicU64,

    /// Dispatch cycles spent paused on the sentinel
    pub paused_cycles: AtomicU64,

    /// Dispatch cycles that found an empty index
    pub empty_cycles: AtomicU64,

    /// Directory rescans performed
    pub scans: AtomicU64,
}

/// Point-in-time copy of the counters for display
#[derive(Debug, Clone, Copy, Default)]
pub struct StatsSnapshot {
    pub completed: u64,
    pub skipped: u64,
    pub failed: u64,
    pub paused_cycles: u64,
    pub empty_cycles: u64,
    pub scans: u64,
}

impl ChurnStats {
    fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    fn record_paused(&self) {
        self.paused_cycles.fetch_add(1, Ordering::Relaxed);
    }

    fn record_empty(&self) {
        self.empty_cycles.fetch_add(1, Ordering::Relaxed);
    }

    fn record_scan(&self) {
        self.scans.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the counters
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            completed: self.completed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            paused_cycles: self.paused_cycles.load(Ordering::Relaxed),
            empty_cycles: self.empty_cycles.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
        }
    }
}

/// Final report for a churn run
#[derive(Debug)]
pub struct ChurnReport {
    /// Final operation counters
    pub stats: StatsSnapshot,

    /// Net bytes added relative to churn start
    pub net_bytes: i64,

    /// How long the run lasted
    pub duration: Duration,
}

/// Coordinates the scanner and operator threads
pub struct ChurnCoordinator {
    config: Arc<ChurnConfig>,
    state: Arc<ChurnState>,
    stats: Arc<ChurnStats>,
    shutdown: Arc<AtomicBool>,
    workers: Vec<(String, JoinHandle<()>)>,
    start_time: Option<Instant>,
}

impl ChurnCoordinator {
    /// Create a coordinator for the given configuration
    pub fn new(config: ChurnConfig) -> Self {
        let state = Arc::new(ChurnState::new(config.dir.clone(), config.buffer));
        Self {
            config: Arc::new(config),
            state,
            stats: Arc::new(ChurnStats::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
            workers: Vec::new(),
            start_time: None,
        }
    }

    /// Get a clone of the shutdown flag (for signal handlers)
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Get a handle to the live counters (for progress display)
    pub fn stats(&self) -> Arc<ChurnStats> {
        Arc::clone(&self.stats)
    }

    /// Net bytes added so far
    pub fn net_bytes(&self) -> i64 {
        self.state.altered()
    }

    /// Perform the initial scan and spawn both workers
    pub fn start(&mut self) -> Result<()> {
        self.start_time = Some(Instant::now());

        let initial = self.state.scan()?;
        self.stats.record_scan();
        info!(
            dir = %self.config.dir.display(),
            files = initial,
            buffer = self.config.buffer,
            "Starting churn"
        );

        self.spawn("churn-scanner", scanner_loop)?;
        self.spawn("churn-operator", operator_loop)?;
        Ok(())
    }

    /// Block until shutdown is requested, then join both workers
    pub fn finish(mut self) -> Result<ChurnReport> {
        while !self.shutdown.load(Ordering::Relaxed) {
            thread::sleep(SHUTDOWN_POLL);
        }

        info!("Shutdown signal received, stopping workers");
        let workers = std::mem::take(&mut self.workers);
        for (name, handle) in workers {
            if handle.join().is_err() {
                let e = WorkerError::Panicked { name };
                warn!(error = %e, "Worker failed to join cleanly");
            }
        }

        let stats = self.stats.snapshot();
        let duration = self
            .start_time
            .map(|t| t.elapsed())
            .unwrap_or_default();

        info!(
            completed = stats.completed,
            failed = stats.failed,
            net_bytes = self.state.altered(),
            duration_secs = duration.as_secs(),
            "Churn stopped"
        );

        Ok(ChurnReport {
            stats,
            net_bytes: self.state.altered(),
            duration,
        })
    }

    fn spawn(
        &mut self,
        name: &str,
        body: fn(Arc<ChurnConfig>, Arc<ChurnState>, Arc<ChurnStats>, Arc<AtomicBool>),
    ) -> Result<()> {
        let config = Arc::clone(&self.config);
        let state = Arc::clone(&self.state);
        let stats = Arc::clone(&self.stats);
        let shutdown = Arc::clone(&self.shutdown);

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(config, state, stats, shutdown))
            .map_err(|e| WorkerError::SpawnFailed {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        self.workers.push((name.to_string(), handle));
        Ok(())
    }
}

/// Periodically rebuild the index from the filesystem
///
/// A transient listing failure is logged and the loop continues; the
/// scanner only stops on shutdown.
fn scanner_loop(
    config: Arc<ChurnConfig>,
    state: Arc<ChurnState>,
    stats: Arc<ChurnStats>,
    shutdown: Arc<AtomicBool>,
) {
    info!(interval_secs = config.scan_interval.as_secs(), "Scanner starting");

    while !shutdown.load(Ordering::Relaxed) {
        sleep_with_shutdown(config.scan_interval, &shutdown);
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match state.scan() {
            Ok(count) => {
                stats.record_scan();
                debug!(files = count, "Rescan complete");
            }
            Err(e) => warn!(error = %e, "Rescan failed"),
        }
    }

    info!("Scanner shutting down");
}

/// Dispatch random operations with randomized pacing and backoff
fn operator_loop(
    _config: Arc<ChurnConfig>,
    state: Arc<ChurnState>,
    stats: Arc<ChurnStats>,
    shutdown: Arc<AtomicBool>,
) {
    info!("Operator starting");

    let mut rng = rand::thread_rng();
    let mut backoff = Backoff::default();

    while !shutdown.load(Ordering::Relaxed) {
        let pacing = Duration::from_secs(rng.gen_range(1..=4));
        sleep_with_shutdown(pacing, &shutdown);
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match perform_random_operation(&state, &mut rng) {
            OpOutcome::Done { op, path } => {
                stats.record_completed();
                debug!(op = %op, path = %path.display(), "Operation completed");
                backoff.record_success();
            }
            OpOutcome::Skipped { op, reason } => {
                stats.record_skipped();
                debug!(op = %op, reason = reason, "Operation skipped");
                backoff.record_success();
            }
            OpOutcome::Paused => {
                stats.record_paused();
                debug!("Pause sentinel present, waiting for its removal");
                backoff.record_success();
            }
            OpOutcome::Empty => {
                stats.record_empty();
                warn!("Directory is empty or not yet scanned");
                sleep_with_shutdown(backoff.record_failure(), &shutdown);
            }
            OpOutcome::Failed { op, path, error } => {
                stats.record_failed();
                warn!(op = %op, path = %path.display(), error = %error, "Operation failed");
                sleep_with_shutdown(backoff.record_failure(), &shutdown);
            }
        }
    }

    info!("Operator shutting down");
}

/// Sleep for `duration`, returning early if shutdown is requested
fn sleep_with_shutdown(duration: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + duration;
    while Instant::now() < deadline {
        if shutdown.load(Ordering::Relaxed) {
            return;
        }
        thread::sleep(SHUTDOWN_POLL.min(deadline.saturating_duration_since(Instant::now())));
    }
}

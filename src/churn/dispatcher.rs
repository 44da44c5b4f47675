//! Randomized operation dispatcher
//!
//! Each dispatch cycle picks one of six operations and one target path
//! uniformly at random and executes it against the target directory.
//! Every outcome - including every I/O failure - is absorbed into an
//! [`OpOutcome`] for the coordinator; nothing propagates as an error.
//!
//! The pause sentinel is honored at dispatch time only: an operation
//! already in flight runs to completion even if the sentinel appears
//! mid-operation.

use crate::generate::{random_name, random_payload};
use crate::state::ChurnState;
use rand::Rng;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;

/// The six churn operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    /// Read and discard a file's contents
    Read,
    /// Create a new file of random content
    Create,
    /// Append random content to an existing file
    Append,
    /// Delete a file
    Delete,
    /// Strip a random number of bytes from the head of a file
    Truncate,
    /// Randomize a file's permission bits
    Chmod,
}

impl OpKind {
    /// Pick an operation uniformly at random
    fn random(rng: &mut impl Rng) -> Self {
        match rng.gen_range(0..6) {
            0 => OpKind::Read,
            1 => OpKind::Create,
            2 => OpKind::Append,
            3 => OpKind::Delete,
            4 => OpKind::Truncate,
            _ => OpKind::Chmod,
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Read => "read",
            OpKind::Create => "create",
            OpKind::Append => "append",
            OpKind::Delete => "delete",
            OpKind::Truncate => "truncate",
            OpKind::Chmod => "chmod",
        };
        f.write_str(name)
    }
}

/// Outcome of one dispatch cycle
#[derive(Debug)]
pub enum OpOutcome {
    /// The index is empty (or not yet scanned); no I/O was performed
    Empty,

    /// The pause sentinel is present; no I/O was performed.
    /// Never counted as a failure.
    Paused,

    /// Operation completed
    Done { op: OpKind, path: PathBuf },

    /// Operation skipped due to an unmet precondition; counts as success
    Skipped { op: OpKind, reason: &'static str },

    /// Operation failed; consumed by the coordinator's backoff
    Failed {
        op: OpKind,
        path: PathBuf,
        error: io::Error,
    },
}

impl OpOutcome {
    /// True for outcomes the coordinator treats as failures
    pub fn is_failure(&self) -> bool {
        matches!(self, OpOutcome::Empty | OpOutcome::Failed { .. })
    }
}

/// Perform one randomized operation against the shared state
pub fn perform_random_operation(state: &ChurnState, rng: &mut impl Rng) -> OpOutcome {
    let snapshot = state.snapshot();
    if snapshot.is_empty() {
        return OpOutcome::Empty;
    }
    if state.contains(&state.sentinel_path()) {
        return OpOutcome::Paused;
    }

    let op = OpKind::random(rng);
    let path = snapshot[rng.gen_range(0..snapshot.len())].clone();
    debug!(op = %op, path = %path.display(), "Dispatching operation");

    match op {
        OpKind::Read => read_file(state, path),
        OpKind::Create => create_file(state, rng),
        OpKind::Append => append_file(state, path, rng),
        OpKind::Delete => delete_file(state, path),
        OpKind::Truncate => truncate_head(state, path, rng),
        OpKind::Chmod => chmod_random(path, rng),
    }
}

/// Read and discard a file's full contents
///
/// A vanished file is an index-sync event: it is dropped from the index
/// and still reported as a failure.
fn read_file(state: &ChurnState, path: PathBuf) -> OpOutcome {
    match fs::read(&path) {
        Ok(_) => OpOutcome::Done {
            op: OpKind::Read,
            path,
        },
        Err(error) => {
            if error.kind() == io::ErrorKind::NotFound {
                state.remove(&path);
            }
            OpOutcome::Failed {
                op: OpKind::Read,
                path,
                error,
            }
        }
    }
}

/// Create a new file sized within the remaining byte budget
fn create_file(state: &ChurnState, rng: &mut impl Rng) -> OpOutcome {
    let headroom = state.headroom();
    if headroom < 2 {
        return OpOutcome::Skipped {
            op: OpKind::Create,
            reason: "byte budget exhausted",
        };
    }

    let size = rng.gen_range(1..headroom) as u64;
    let path = state.dir().join(random_name(rng, 10..20));
    let payload = random_payload(rng, size);

    match fs::write(&path, &payload) {
        Ok(()) => {
            state.adjust(size as i64);
            state.insert(path.clone());
            OpOutcome::Done {
                op: OpKind::Create,
                path,
            }
        }
        Err(error) => OpOutcome::Failed {
            op: OpKind::Create,
            path,
            error,
        },
    }
}

/// Append random content to an existing file
fn append_file(state: &ChurnState, path: PathBuf, rng: &mut impl Rng) -> OpOutcome {
    let headroom = state.headroom();
    if headroom < 2 {
        return OpOutcome::Skipped {
            op: OpKind::Append,
            reason: "byte budget exhausted",
        };
    }

    let size = rng.gen_range(1..headroom) as u64;
    let payload = random_payload(rng, size);

    let result = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&path)
        .and_then(|mut file| file.write_all(&payload));

    match result {
        Ok(()) => {
            state.adjust(size as i64);
            // Re-adding is idempotent; append may have recreated the file
            state.insert(path.clone());
            OpOutcome::Done {
                op: OpKind::Append,
                path,
            }
        }
        Err(error) => OpOutcome::Failed {
            op: OpKind::Append,
            path,
            error,
        },
    }
}

/// Delete a file, crediting its size back to the budget
///
/// The pause sentinel is never deleted, even when randomly selected.
fn delete_file(state: &ChurnState, path: PathBuf) -> OpOutcome {
    if path == state.sentinel_path() {
        return OpOutcome::Skipped {
            op: OpKind::Delete,
            reason: "target is the pause sentinel",
        };
    }

    let result = fs::metadata(&path)
        .map(|m| m.len())
        .and_then(|size| fs::remove_file(&path).map(|()| size));

    match result {
        Ok(size) => {
            state.adjust(-(size as i64));
            state.remove(&path);
            OpOutcome::Done {
                op: OpKind::Delete,
                path,
            }
        }
        Err(error) => OpOutcome::Failed {
            op: OpKind::Delete,
            path,
            error,
        },
    }
}

/// Strip a random number of bytes from the head of a file
///
/// The surviving tail is written to a fresh temp file in the same
/// directory and renamed over the original, so a concurrent reader sees
/// either the old or the new content, never a partial state. On any
/// error the original is left intact.
fn truncate_head(state: &ChurnState, path: PathBuf, rng: &mut impl Rng) -> OpOutcome {
    let data = match fs::read(&path) {
        Ok(data) => data,
        Err(error) => {
            return OpOutcome::Failed {
                op: OpKind::Truncate,
                path,
                error,
            }
        }
    };

    if data.len() < 2 {
        return OpOutcome::Skipped {
            op: OpKind::Truncate,
            reason: "file too small to truncate",
        };
    }

    let drop_count = rng.gen_range(1..=data.len());
    let tmp = state.dir().join(random_name(rng, 10..20));

    if let Err(error) = fs::write(&tmp, &data[drop_count..]) {
        let _ = fs::remove_file(&tmp);
        return OpOutcome::Failed {
            op: OpKind::Truncate,
            path,
            error,
        };
    }

    if let Err(error) = fs::rename(&tmp, &path) {
        let _ = fs::remove_file(&tmp);
        return OpOutcome::Failed {
            op: OpKind::Truncate,
            path,
            error,
        };
    }

    state.adjust(-(drop_count as i64));
    OpOutcome::Done {
        op: OpKind::Truncate,
        path,
    }
}

/// Randomize a file's permission bits
///
/// Owner read and write are always kept so the file stays usable by
/// later operations; a random non-empty subset of the remaining
/// owner/group/other bits is added on top.
#[cfg(unix)]
fn chmod_random(path: PathBuf, rng: &mut impl Rng) -> OpOutcome {
    use std::os::unix::fs::PermissionsExt;

    const EXTRA_BITS: [u32; 7] = [0o100, 0o040, 0o020, 0o010, 0o004, 0o002, 0o001];

    let mut mode = 0o600;
    for _ in 0..rng.gen_range(1..=EXTRA_BITS.len()) {
        mode |= EXTRA_BITS[rng.gen_range(0..EXTRA_BITS.len())];
    }

    match fs::set_permissions(&path, fs::Permissions::from_mode(mode)) {
        Ok(()) => OpOutcome::Done {
            op: OpKind::Chmod,
            path,
        },
        Err(error) => OpOutcome::Failed {
            op: OpKind::Chmod,
            path,
            error,
        },
    }
}

/// POSIX permission bits have no equivalent here; treat as a no-op
#[cfg(not(unix))]
fn chmod_random(_path: PathBuf, _rng: &mut impl Rng) -> OpOutcome {
    OpOutcome::Skipped {
        op: OpKind::Chmod,
        reason: "permission bits not supported on this platform",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::PAUSE_SENTINEL;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::tempdir;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    #[test]
    fn test_empty_index_no_io() {
        let dir = tempdir().unwrap();
        let state = ChurnState::new(dir.path(), 1000);

        let outcome = perform_random_operation(&state, &mut rng());
        assert!(matches!(outcome, OpOutcome::Empty));
        assert!(outcome.is_failure());
        assert_eq!(state.altered(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_pause_blocks_all_mutation() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PAUSE_SENTINEL), b"").unwrap();
        fs::write(dir.path().join("victim"), b"payload").unwrap();

        let state = ChurnState::new(dir.path(), 1000);
        state.scan().unwrap();

        let mut rng = rng();
        for _ in 0..50 {
            let outcome = perform_random_operation(&state, &mut rng);
            assert!(matches!(outcome, OpOutcome::Paused));
            assert!(!outcome.is_failure());
        }

        // Directory untouched, budget untouched
        assert_eq!(state.altered(), 0);
        assert_eq!(fs::read(dir.path().join("victim")).unwrap(), b"payload");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_read_missing_file_drops_from_index() {
        let dir = tempdir().unwrap();
        let state = ChurnState::new(dir.path(), 0);
        let ghost = dir.path().join("ghost");
        state.insert(ghost.clone());

        let outcome = read_file(&state, ghost.clone());
        assert!(matches!(outcome, OpOutcome::Failed { op: OpKind::Read, .. }));
        assert!(!state.contains(&ghost));
    }

    #[test]
    fn test_create_respects_budget() {
        let dir = tempdir().unwrap();
        let state = ChurnState::new(dir.path(), 1000);

        let outcome = create_file(&state, &mut rng());
        let path = match outcome {
            OpOutcome::Done { op: OpKind::Create, path } => path,
            other => panic!("unexpected outcome: {:?}", other),
        };

        assert!(state.contains(&path));
        assert!(state.altered() >= 1 && state.altered() < 1000);
        // File holds at least the charged bytes
        assert!(fs::metadata(&path).unwrap().len() >= state.altered() as u64);
    }

    #[test]
    fn test_create_skips_on_zero_buffer() {
        let dir = tempdir().unwrap();
        let state = ChurnState::new(dir.path(), 0);

        let outcome = create_file(&state, &mut rng());
        assert!(matches!(outcome, OpOutcome::Skipped { op: OpKind::Create, .. }));
        assert_eq!(state.altered(), 0);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_append_skips_on_zero_buffer() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::write(&target, b"abc").unwrap();
        let state = ChurnState::new(dir.path(), 0);

        let outcome = append_file(&state, target.clone(), &mut rng());
        assert!(matches!(outcome, OpOutcome::Skipped { op: OpKind::Append, .. }));
        assert_eq!(fs::metadata(&target).unwrap().len(), 3);
    }

    #[test]
    fn test_append_grows_file_and_budget() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::write(&target, b"abc").unwrap();

        let state = ChurnState::new(dir.path(), 500);
        let outcome = append_file(&state, target.clone(), &mut rng());

        assert!(matches!(outcome, OpOutcome::Done { op: OpKind::Append, .. }));
        assert!(state.altered() >= 1);
        assert!(state.contains(&target));
        assert!(fs::metadata(&target).unwrap().len() > 3);
    }

    #[test]
    fn test_delete_credits_budget() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::write(&target, vec![0u8; 64]).unwrap();

        let state = ChurnState::new(dir.path(), 1000);
        state.insert(target.clone());

        let outcome = delete_file(&state, target.clone());
        assert!(matches!(outcome, OpOutcome::Done { op: OpKind::Delete, .. }));
        assert_eq!(state.altered(), -64);
        assert!(!state.contains(&target));
        assert!(!target.exists());
    }

    #[test]
    fn test_delete_never_removes_sentinel() {
        let dir = tempdir().unwrap();
        let sentinel = dir.path().join(PAUSE_SENTINEL);
        fs::write(&sentinel, b"").unwrap();

        let state = ChurnState::new(dir.path(), 1000);
        let outcome = delete_file(&state, sentinel.clone());

        assert!(matches!(outcome, OpOutcome::Skipped { op: OpKind::Delete, .. }));
        assert!(sentinel.exists());
    }

    #[test]
    fn test_delete_missing_file_fails_cleanly() {
        let dir = tempdir().unwrap();
        let state = ChurnState::new(dir.path(), 0);

        let outcome = delete_file(&state, dir.path().join("ghost"));
        assert!(matches!(outcome, OpOutcome::Failed { op: OpKind::Delete, .. }));
        assert_eq!(state.altered(), 0);
    }

    #[test]
    fn test_truncate_keeps_tail() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        let original: Vec<u8> = (0..=99).collect();
        fs::write(&target, &original).unwrap();

        let state = ChurnState::new(dir.path(), 0);
        let outcome = truncate_head(&state, target.clone(), &mut rng());

        assert!(matches!(outcome, OpOutcome::Done { op: OpKind::Truncate, .. }));

        let after = fs::read(&target).unwrap();
        let dropped = original.len() - after.len();
        assert!(dropped >= 1 && dropped <= original.len());
        assert_eq!(after, original[dropped..]);
        assert_eq!(state.altered(), -(dropped as i64));

        // No temp file left behind
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_truncate_skips_tiny_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::write(&target, b"x").unwrap();

        let state = ChurnState::new(dir.path(), 0);
        let outcome = truncate_head(&state, target.clone(), &mut rng());

        assert!(matches!(outcome, OpOutcome::Skipped { op: OpKind::Truncate, .. }));
        assert_eq!(fs::read(&target).unwrap(), b"x");
    }

    #[cfg(unix)]
    #[test]
    fn test_chmod_always_keeps_owner_rw() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::write(&target, b"data").unwrap();

        let mut rng = rng();
        for _ in 0..30 {
            let outcome = chmod_random(target.clone(), &mut rng);
            assert!(matches!(outcome, OpOutcome::Done { op: OpKind::Chmod, .. }));

            let mode = fs::metadata(&target).unwrap().permissions().mode();
            assert_eq!(mode & 0o600, 0o600, "owner rw must survive, got {:o}", mode);
            // At least one extra bit beyond owner rw
            assert_ne!(mode & 0o177, 0, "expected a non-empty random subset");
        }
    }

    #[test]
    fn test_dispatch_many_operations_stay_recovered() {
        // Drive the dispatcher through a few hundred cycles and check
        // the core invariants hold: no panics, budget stays consistent
        // with the skip rule, index only references former regular files
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("seed"), vec![7u8; 128]).unwrap();

        let state = ChurnState::new(dir.path(), 4096);
        state.scan().unwrap();

        let mut rng = rng();
        for _ in 0..300 {
            let _ = perform_random_operation(&state, &mut rng);
        }

        // After a rescan, every indexed path exists as a regular file
        state.scan().unwrap();
        for path in state.snapshot() {
            assert!(path.is_file(), "indexed path is not a file: {:?}", path);
        }
    }
}

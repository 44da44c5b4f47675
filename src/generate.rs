//! Random population generator
//!
//! One-shot bootstrap that fills the target directory with randomly
//! named, randomly sized files whose sizes sum to approximately a
//! target total. Used by the `populate` subcommand before churn begins.
//!
//! Failure accounting: a failed write contributes **zero progress** -
//! neither the created count nor the remaining size changes. Ten
//! consecutive zero-progress attempts terminate the run early with a
//! partial result.

use crate::config::PopulateConfig;
use crate::size::to_si;
use rand::Rng;
use std::fs;
use std::io;
use std::ops::Range;
use std::path::Path;
use tracing::{info, warn};

/// Consecutive failed writes tolerated before giving up
const MAX_STALLED_ATTEMPTS: u32 = 10;

/// Minimum chunk length while at least this many bytes remain
const CHUNK_FLOOR: u64 = 10;

/// Result of a population run
#[derive(Debug, Default)]
pub struct PopulateReport {
    /// Files successfully created
    pub files_created: u64,

    /// Actual bytes written, including chunk-separator overshoot
    pub bytes_written: u64,

    /// Whether the run gave up after repeated write failures
    pub stalled: bool,
}

/// Existing occupancy of a directory (top-level regular files only)
#[derive(Debug, Default, Clone, Copy)]
pub struct Occupancy {
    /// Number of regular files
    pub files: u64,

    /// Sum of their sizes in bytes
    pub bytes: u64,
}

/// Measure the existing top-level files of a directory
pub fn scan_occupied(dir: &Path) -> io::Result<Occupancy> {
    let mut occupancy = Occupancy::default();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            occupancy.files += 1;
            occupancy.bytes += metadata.len();
        }
    }
    Ok(occupancy)
}

/// Generate a random lowercase ASCII name with a length drawn from `range`
pub fn random_name(rng: &mut impl Rng, range: Range<usize>) -> String {
    let len = rng.gen_range(range);
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}

/// Generate a random payload of at least `size` bytes
///
/// The buffer is filled chunk by chunk: each chunk length is drawn
/// uniformly from [min(remaining, 10), remaining], followed by one
/// newline separator. A payload can therefore be up to (chunk count)
/// bytes larger than requested; the overshoot is accepted.
pub fn random_payload(rng: &mut impl Rng, size: u64) -> Vec<u8> {
    let size = size as usize;
    let mut data = Vec::with_capacity(size + size / CHUNK_FLOOR as usize + 1);
    let mut written = 0usize;

    while written < size {
        let remaining = size - written;
        let chunk = rng.gen_range(remaining.min(CHUNK_FLOOR as usize)..=remaining);

        let start = data.len();
        data.resize(start + chunk, 0);
        rng.fill(&mut data[start..]);
        data.push(b'\n');

        written += chunk;
    }

    data
}

/// Write a file of approximately `size` random bytes, returning the
/// actual number of bytes written
pub fn write_random_file(path: &Path, size: u64, rng: &mut impl Rng) -> io::Result<u64> {
    let payload = random_payload(rng, size);
    fs::write(path, &payload)?;
    Ok(payload.len() as u64)
}

/// Populate the destination directory with random files
///
/// Creates between 0 and `max_files` files whose requested sizes sum to
/// at most `total_size`. Stops gracefully (partial result) when the
/// per-file cap drops below 2 bytes or after repeated write failures;
/// individual write errors are absorbed, never propagated.
pub fn populate(config: &PopulateConfig, rng: &mut impl Rng) -> PopulateReport {
    let mut report = PopulateReport::default();
    let mut remaining = config.total_size;
    let mut stalled_attempts = 0u32;

    while remaining > 0 && report.files_created < config.max_files {
        // Divide what is left across the files still owed to min-files
        let slots = config.min_files.saturating_sub(report.files_created).max(1);
        let cap = remaining / slots;
        if cap < 2 {
            // Cannot subdivide further
            break;
        }

        let last_permitted = report.files_created + 1 == config.max_files;
        let size = if last_permitted {
            remaining
        } else {
            rng.gen_range(1..cap)
        };

        let name = random_name(rng, 4..10);
        let path = config.dest.join(&name);

        match write_random_file(&path, size, rng) {
            Ok(written) => {
                info!(
                    path = %path.display(),
                    size = written,
                    "Created file"
                );
                report.files_created += 1;
                report.bytes_written += written;
                remaining -= size;
                stalled_attempts = 0;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed writing file");
                stalled_attempts += 1;
                if stalled_attempts >= MAX_STALLED_ATTEMPTS {
                    warn!(
                        attempts = stalled_attempts,
                        "No progress creating files, giving up"
                    );
                    report.stalled = true;
                    break;
                }
            }
        }
    }

    info!(
        files = report.files_created,
        bytes = %to_si(report.bytes_written),
        "Population complete"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PopulateConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn config(dest: PathBuf, size: u64, min: u64, max: u64) -> PopulateConfig {
        PopulateConfig {
            dest,
            total_size: size,
            min_files: min,
            max_files: max,
        }
    }

    #[test]
    fn test_random_name_charset_and_length() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let name = random_name(&mut rng, 4..10);
            assert!(name.len() >= 4 && name.len() < 10);
            assert!(name.chars().all(|c| c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_payload_size_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for size in [1u64, 2, 9, 10, 11, 100, 1000] {
            let payload = random_payload(&mut rng, size);
            // At least the requested bytes, at most one separator per
            // chunk on top (each chunk covers >= 1 byte)
            assert!(payload.len() as u64 >= size);
            assert!(payload.len() as u64 <= size * 2);
        }
    }

    #[test]
    fn test_payload_overshoot_is_separators_only() {
        let mut rng = StdRng::seed_from_u64(1);
        let payload = random_payload(&mut rng, 1000);
        // Chunks are at least 10 bytes until fewer than 10 remain, so
        // the overshoot is far below the worst case
        assert!(payload.len() <= 1000 + 110);
    }

    #[test]
    fn test_single_file_gets_exact_size() {
        // S = 1000b, m = 1, M = 1 -> one file of exactly 1000 bytes
        // plus chunk-separator overshoot
        let dir = tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let report = populate(&config(dir.path().into(), 1000, 1, 1), &mut rng);

        assert_eq!(report.files_created, 1);
        assert!(!report.stalled);

        let occupancy = scan_occupied(dir.path()).unwrap();
        assert_eq!(occupancy.files, 1);
        assert!(occupancy.bytes >= 1000);
        assert!(occupancy.bytes <= 1110);
        assert_eq!(occupancy.bytes, report.bytes_written);
    }

    #[test]
    fn test_file_count_within_bounds() {
        let dir = tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let report = populate(&config(dir.path().into(), 100_000, 3, 8), &mut rng);

        assert!(report.files_created >= 1);
        assert!(report.files_created <= 8);

        let occupancy = scan_occupied(dir.path()).unwrap();
        assert_eq!(occupancy.files, report.files_created);
        // Requested sizes sum to <= S; overshoot adds ~1 byte per
        // 10-byte chunk
        assert!(occupancy.bytes <= 100_000 + 100_000 / 5);
    }

    #[test]
    fn test_tiny_size_stops_at_subdivision_floor() {
        // cap = 1 / max(5, 1) = 0 < 2 -> no files
        let dir = tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(5);
        let report = populate(&config(dir.path().into(), 1, 5, 10), &mut rng);

        assert_eq!(report.files_created, 0);
        assert_eq!(scan_occupied(dir.path()).unwrap().files, 0);
    }

    #[test]
    fn test_unwritable_destination_stalls() {
        let mut rng = StdRng::seed_from_u64(9);
        let report = populate(
            &config(PathBuf::from("/nonexistent/churn-dest"), 10_000, 1, 4),
            &mut rng,
        );

        assert!(report.stalled);
        assert_eq!(report.files_created, 0);
    }

    #[test]
    fn test_scan_occupied() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("b"), vec![0u8; 50]).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let occupancy = scan_occupied(dir.path()).unwrap();
        assert_eq!(occupancy.files, 2);
        assert_eq!(occupancy.bytes, 150);
    }
}

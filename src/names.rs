//! Derives the timestamped output filenames for one backup run.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns `(archive_name, checksum_name)` for the given prefix, e.g.
/// `backup-1723118400.tar.gz` and `backup-1723118400.sha512`.
///
/// The timestamp is sampled exactly once so both names always agree.
pub fn derive(prefix: &str) -> (String, String) {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    at_time(prefix, secs)
}

/// Same as [`derive`] but with an explicit timestamp.
pub fn at_time(prefix: &str, secs: u64) -> (String, String) {
    let stem = format!("{}-{}", prefix, secs);
    (format!("{}.tar.gz", stem), format!("{}.sha512", stem))
}

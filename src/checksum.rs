//! SHA-512 integrity checksums for finished archives.

use sha2::{Digest, Sha512};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::error::BackupError;

/// Streams the file through SHA-512 and returns the lowercase hex digest.
///
/// One linear pass; memory use is independent of the file size.
pub fn compute(path: &Path) -> Result<String, BackupError> {
    let mut file = File::open(path).map_err(|e| BackupError::io(e, path))?;

    let mut hasher = Sha512::new();
    io::copy(&mut file, &mut hasher).map_err(|e| BackupError::io(e, path))?;

    Ok(format!("{:x}", hasher.finalize()))
}

/// Computes the digest of `path` and writes the bare hex string to a freshly
/// created file at `digest_path`. Returns the digest.
pub fn write_file(path: &Path, digest_path: &Path) -> Result<String, BackupError> {
    let digest = compute(path)?;

    let mut out = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(digest_path)
        .map_err(|e| BackupError::io(e, digest_path))?;
    out.write_all(digest.as_bytes())
        .map_err(|e| BackupError::io(e, digest_path))?;

    Ok(digest)
}

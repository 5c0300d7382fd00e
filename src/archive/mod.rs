//! # Archive Builder
//!
//! Walks the requested paths and writes every regular file it reaches into a
//! gzip-compressed tar stream, optionally wrapped in the encrypted container
//! from [`crate::crypto`].
//!
//! The writer stack is an ownership chain, innermost data first:
//!
//! ```text
//! tar::Builder -> GzEncoder -> (EncryptWriter) -> BufWriter<File>
//! ```
//!
//! Each layer is consumed on close and returns the layer beneath it, so the
//! flush order on success is always tar trailer, then gzip trailer, then GCM
//! tag, then the file itself. Closing in any other order would truncate the
//! archive.

use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::VecDeque;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, BufWriter, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt; // mode() helper
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::crypto::EncryptWriter;
use crate::error::BackupError;
use crate::report::{Reporter, SkipReason};

/// Default gzip level, balanced speed/ratio.
pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Holds all configuration options for an archive build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Gzip compression level (0-9).
    pub level: u32,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { level: DEFAULT_GZIP_LEVEL }
    }
}

/// What one build produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Number of file entries written into the tar stream.
    pub entries: usize,
    /// Number of paths skipped as symbolic links or named pipes.
    pub skipped: usize,
}

/// How a filesystem entry is treated by the walk. Derived from
/// `symlink_metadata`, so a symlink is seen as itself, never as its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Directory,
    Symlink,
    Fifo,
    Other,
}

pub fn classify(meta: &Metadata) -> EntryKind {
    let file_type = meta.file_type();
    if file_type.is_file() {
        EntryKind::Regular
    } else if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_symlink() {
        EntryKind::Symlink
    } else {
        #[cfg(unix)]
        {
            use std::os::unix::fs::FileTypeExt;
            if file_type.is_fifo() {
                return EntryKind::Fifo;
            }
        }
        EntryKind::Other
    }
}

/// Output layer beneath the gzip encoder: plain file or encrypted container.
enum Sink<W: Write> {
    Plain(W),
    Encrypted(EncryptWriter<W>),
}

impl<W: Write> Sink<W> {
    fn finalize(self) -> io::Result<W> {
        match self {
            Sink::Plain(mut w) => {
                w.flush()?;
                Ok(w)
            }
            Sink::Encrypted(enc) => enc.finalize(),
        }
    }
}

impl<W: Write> Write for Sink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Encrypted(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Encrypted(w) => w.flush(),
        }
    }
}

/// Builds the archive at `output_path` from `paths`, in order.
///
/// With a password the gzip stream is wrapped in the encrypted container.
/// The output file is created fresh; an already existing file is an error,
/// never a silent truncate. Any I/O failure aborts the whole build and the
/// partial output file is left on disk for the caller to deal with.
///
/// An empty `paths` slice is valid and produces an archive with zero entries.
pub fn create(
    paths: &[PathBuf],
    output_path: &Path,
    password: Option<&str>,
    options: &BuildOptions,
    reporter: &dyn Reporter,
) -> Result<BuildSummary, BackupError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(output_path)
        .map_err(|e| BackupError::io(e, output_path))?;
    let writer = BufWriter::new(file);

    let sink = match password {
        Some(pwd) => Sink::Encrypted(
            EncryptWriter::new(writer, pwd).map_err(|e| BackupError::io(e, output_path))?,
        ),
        None => Sink::Plain(writer),
    };
    let gz = GzEncoder::new(sink, Compression::new(options.level.min(9)));
    let mut tar = tar::Builder::new(gz);

    let mut summary = BuildSummary::default();

    // Explicit worklist instead of recursion, so deep trees can't overflow
    // the stack. Directory children are pushed to the front in name order,
    // which keeps the depth-first traversal deterministic.
    let mut pending: VecDeque<PathBuf> = paths.iter().cloned().collect();
    while let Some(path) = pending.pop_front() {
        let meta = fs::symlink_metadata(&path).map_err(|e| BackupError::io(e, &path))?;
        match classify(&meta) {
            EntryKind::Regular => {
                reporter.adding(&path);
                append_file(&mut tar, &path, &meta)?;
                summary.entries += 1;
            }
            EntryKind::Directory => {
                let mut children = Vec::new();
                for entry in fs::read_dir(&path).map_err(|e| BackupError::io(e, &path))? {
                    let entry = entry.map_err(|e| BackupError::io(e, &path))?;
                    children.push(entry.path());
                }
                children.sort();
                for child in children.into_iter().rev() {
                    pending.push_front(child);
                }
            }
            EntryKind::Symlink => {
                reporter.skipping(&path, SkipReason::SymbolicLink);
                summary.skipped += 1;
            }
            EntryKind::Fifo => {
                reporter.skipping(&path, SkipReason::NamedPipe);
                summary.skipped += 1;
            }
            EntryKind::Other => {}
        }
    }

    // Consume the stack layer by layer; each close flushes its trailer into
    // the layer below.
    let gz = tar.into_inner().map_err(|e| BackupError::io(e, output_path))?;
    let sink = gz.finish().map_err(|e| BackupError::io(e, output_path))?;
    sink.finalize().map_err(|e| BackupError::io(e, output_path))?;

    Ok(summary)
}

/// Streams one regular file into the tar layer.
///
/// Header fields come from the metadata captured before the content is read;
/// there is no locking, so a file mutated mid-read produces a stale header.
fn append_file<W: Write>(
    tar: &mut tar::Builder<W>,
    path: &Path,
    meta: &Metadata,
) -> Result<(), BackupError> {
    let mut file = File::open(path).map_err(|e| BackupError::io(e, path))?;

    let mut header = tar::Header::new_gnu();
    header.set_size(meta.len());
    #[cfg(unix)]
    header.set_mode(meta.permissions().mode());
    let modified = meta.modified().map_err(|e| BackupError::io(e, path))?;
    header.set_mtime(modified.duration_since(UNIX_EPOCH)?.as_secs());

    // Tar members are relative; drop a leading slash the way GNU tar does.
    let name = path.strip_prefix("/").unwrap_or(path);
    tar.append_data(&mut header, name, &mut file)
        .map_err(|e| BackupError::io(e, path))?;

    Ok(())
}

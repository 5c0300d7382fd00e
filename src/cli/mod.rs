use clap::Parser;
use std::path::PathBuf;

use crate::error::BackupError;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Files and directories to include in the backup. May be empty, which
    /// produces an archive with no entries.
    pub paths: Vec<PathBuf>,

    /// Prefix for the archive and checksum filenames.
    #[arg(long, default_value = "backup")]
    pub prefix: String,

    /// Gzip compression level (0-9).
    #[arg(long, default_value_t = crate::archive::DEFAULT_GZIP_LEVEL, value_parser = clap::value_parser!(u32).range(0..=9))]
    pub level: u32,

    /// Encrypt the archive with a password. If --password is not given, the
    /// password is read from SATCHEL_PASSWORD or prompted interactively.
    #[arg(short, long)]
    pub encrypt: bool,

    /// Set a password to encrypt the archive. Implies --encrypt.
    #[arg(long)]
    pub password: Option<String>,
}

/// Resolves the encryption password for this run.
///
/// Priority:
/// 1. `--password` command-line argument.
/// 2. `SATCHEL_PASSWORD` environment variable (only when `--encrypt` is set).
/// 3. Interactive no-echo prompt (only when `--encrypt` is set).
///
/// Returns `Ok(None)` when encryption was not requested at all.
pub fn resolve_password(args: &Args) -> Result<Option<String>, BackupError> {
    if let Some(pass) = args.password.clone() {
        return Ok(Some(pass));
    }
    if !args.encrypt {
        return Ok(None);
    }
    if let Ok(pass) = std::env::var("SATCHEL_PASSWORD") {
        return Ok(Some(pass));
    }
    prompt_password().map(Some)
}

/// Reads a password from the controlling terminal with echo disabled.
pub fn prompt_password() -> Result<String, BackupError> {
    rpassword::prompt_password("Enter password for archive encryption: ")
        .map_err(BackupError::PasswordRead)
}

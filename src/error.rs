use std::path::PathBuf;

use std::time::SystemTimeError;

/// The primary error type for all operations in the `satchel` crate.
#[derive(Debug)]
pub enum BackupError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    Io { source: std::io::Error, path: PathBuf },

    /// A cryptographic error, such as a failed decryption or a malformed
    /// encryption container header.
    Crypto(String),

    /// The interactive password prompt could not read from the terminal.
    PasswordRead(std::io::Error),

    /// A system time error, which can occur when reading file metadata.
    SystemTime(SystemTimeError),
}

impl BackupError {
    /// Attaches the offending path to an `std::io::Error`.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        BackupError::Io { source, path: path.into() }
    }
}

impl std::fmt::Display for BackupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupError::Io { source, path } => write!(f, "I/O error on path '{}': {}", path.display(), source),
            BackupError::Crypto(msg) => write!(f, "Crypto error: {}", msg),
            BackupError::PasswordRead(e) => write!(f, "Could not read password from terminal: {}", e),
            BackupError::SystemTime(e) => write!(f, "System time error: {}", e),
        }
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackupError::Io { source, .. } => Some(source),
            BackupError::PasswordRead(e) => Some(e),
            BackupError::SystemTime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SystemTimeError> for BackupError {
    fn from(err: SystemTimeError) -> Self {
        BackupError::SystemTime(err)
    }
}

// Generic IO error conversion that doesn't require a path
impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        BackupError::Io { source: err, path: PathBuf::new() }
    }
}

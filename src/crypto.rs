//! Cryptography module for handling the encrypted archive container.
//!
//! The container is a single self-describing stream:
//!
//! ```text
//! magic (8) | salt (16) | nonce (12) | AES-256-GCM ciphertext | tag (16)
//! ```
//!
//! Everything needed to decrypt it again is in the header, so a reader only
//! has to supply the password. Encryption is streaming: [`EncryptWriter`]
//! wraps any `Write` sink and never buffers the whole archive in memory.

use aes_gcm_stream::{Aes256GcmStreamDecryptor, Aes256GcmStreamEncryptor};
use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use crate::error::BackupError;

/// Identifies an encrypted satchel container.
pub const MAGIC: &[u8; 8] = b"SATCHEL1";

const KEY_SIZE: usize = 32; // 256 bits for AES-256
const NONCE_SIZE: usize = 12; // 96 bits for GCM
const SALT_SIZE: usize = 16; // 128 bits for salt
const PBKDF2_ROUNDS: u32 = 100_000;

pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

pub fn derive_key(password: &str, salt: &[u8]) -> [u8; KEY_SIZE] {
    let mut key = [0u8; KEY_SIZE];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

/// Streaming encryption layer for the archive writer stack.
///
/// Writes the container header on construction, encrypts everything written
/// through it, and appends the GCM tag in [`EncryptWriter::finalize`].
/// Dropping the writer without calling `finalize` leaves the container
/// without its tag, so decryption of such a stream will fail.
pub struct EncryptWriter<W: Write> {
    inner: W,
    enc: Aes256GcmStreamEncryptor,
}

impl<W: Write> EncryptWriter<W> {
    /// Creates the layer with a fresh salt and nonce derived key, and writes
    /// the self-describing header to `inner`.
    pub fn new(mut inner: W, password: &str) -> io::Result<Self> {
        let salt = generate_salt();
        let key = derive_key(password, &salt);
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);

        inner.write_all(MAGIC)?;
        inner.write_all(&salt)?;
        inner.write_all(&nonce)?;

        let enc = Aes256GcmStreamEncryptor::new(key, &nonce);
        Ok(Self { inner, enc })
    }

    /// Flushes the final cipher block and the authentication tag, then hands
    /// back the underlying writer.
    pub fn finalize(mut self) -> io::Result<W> {
        let (ct_tail, tag) = self.enc.finalize();
        if !ct_tail.is_empty() {
            self.inner.write_all(&ct_tail)?;
        }
        self.inner.write_all(&tag)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for EncryptWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let ct = self.enc.update(buf);
        self.inner.write_all(&ct)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Decrypts a container produced by [`EncryptWriter`] and returns the
/// plaintext stream (the gzip data).
///
/// There is deliberately no restore command in the CLI; this exists so the
/// archive contents can be verified after the fact.
pub fn decrypt_file(path: &Path, password: &str) -> Result<Vec<u8>, BackupError> {
    let mut file = File::open(path).map_err(|e| BackupError::io(e, path))?;

    let mut header = [0u8; MAGIC.len() + SALT_SIZE + NONCE_SIZE];
    file.read_exact(&mut header).map_err(|e| BackupError::io(e, path))?;
    if &header[..MAGIC.len()] != MAGIC {
        return Err(BackupError::Crypto("not an encrypted archive (bad magic)".to_string()));
    }
    let salt = &header[MAGIC.len()..MAGIC.len() + SALT_SIZE];
    let nonce = &header[MAGIC.len() + SALT_SIZE..];

    let key = derive_key(password, salt);
    let mut dec = Aes256GcmStreamDecryptor::new(key, nonce);

    let mut plaintext = Vec::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).map_err(|e| BackupError::io(e, path))?;
        if n == 0 {
            break;
        }
        plaintext.extend_from_slice(&dec.update(&buf[..n]));
    }
    let tail = dec
        .finalize()
        .map_err(|e| BackupError::Crypto(format!("decryption failed: {}", e)))?;
    plaintext.extend_from_slice(&tail);

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.bin");
        let data = b"some plaintext worth protecting".repeat(100);

        let file = File::create(&path).unwrap();
        let mut writer = EncryptWriter::new(file, "hunter2").unwrap();
        writer.write_all(&data).unwrap();
        writer.finalize().unwrap();

        let decrypted = decrypt_file(&path, "hunter2").unwrap();
        assert_eq!(decrypted, data);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.bin");

        let file = File::create(&path).unwrap();
        let mut writer = EncryptWriter::new(file, "correct").unwrap();
        writer.write_all(b"payload").unwrap();
        writer.finalize().unwrap();

        let err = decrypt_file(&path, "incorrect").unwrap_err();
        assert!(err.to_string().contains("decryption failed"), "got: {}", err);
    }

    #[test]
    fn header_is_self_describing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("container.bin");

        let file = File::create(&path).unwrap();
        let writer = EncryptWriter::new(file, "pw").unwrap();
        writer.finalize().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..MAGIC.len()], MAGIC);
        // magic + salt + nonce + tag, nothing else for an empty stream
        assert_eq!(bytes.len(), MAGIC.len() + SALT_SIZE + NONCE_SIZE + 16);
    }

    #[test]
    fn salts_are_unique_per_container() {
        let s1 = generate_salt();
        let s2 = generate_salt();
        assert_ne!(s1, s2);
    }
}

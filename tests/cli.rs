use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;
use std::fs;
use std::path::{Path, PathBuf};

// Output names carry a timestamp, so locate artifacts by suffix.
fn find_artifact(dir: &Path, prefix: &str, suffix: &str) -> PathBuf {
    let mut matches: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            let name = p.file_name().unwrap().to_string_lossy().into_owned();
            name.starts_with(prefix) && name.ends_with(suffix)
        })
        .collect();
    assert_eq!(matches.len(), 1, "expected exactly one {}*{} in {:?}", prefix, suffix, dir);
    matches.remove(0)
}

#[test]
fn test_cli_creates_archive_and_checksum() -> Result<(), Box<dyn std::error::Error>> {
    let work_dir = tempdir()?;
    fs::write(work_dir.path().join("notes.txt"), "remember the milk")?;

    let mut cmd = Command::cargo_bin("satchel")?;
    cmd.current_dir(work_dir.path())
        .arg("--prefix")
        .arg("snap")
        .arg("notes.txt");
    cmd.assert().success();

    let archive = find_artifact(work_dir.path(), "snap-", ".tar.gz");
    let digest_file = find_artifact(work_dir.path(), "snap-", ".sha512");

    // Both names share one timestamp.
    let archive_stem = archive.file_name().unwrap().to_string_lossy().replace(".tar.gz", "");
    let digest_stem = digest_file.file_name().unwrap().to_string_lossy().replace(".sha512", "");
    assert_eq!(archive_stem, digest_stem);

    // The checksum file holds the digest of the archive, nothing more.
    let written = fs::read_to_string(&digest_file)?;
    let recomputed = satchel::checksum::compute(&archive)?;
    assert_eq!(written, recomputed);

    Ok(())
}

#[test]
fn test_cli_missing_path_fails() -> Result<(), Box<dyn std::error::Error>> {
    let work_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("satchel")?;
    cmd.current_dir(work_dir.path()).arg("does-not-exist.txt");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does-not-exist.txt"));

    // Failure before the checksum step: no digest file may exist.
    let leftovers: Vec<_> = fs::read_dir(work_dir.path())?
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().map_or(false, |e| e == "sha512"))
        .collect();
    assert!(leftovers.is_empty());

    Ok(())
}

#[test]
fn test_cli_env_password_encrypts_the_archive() -> Result<(), Box<dyn std::error::Error>> {
    let work_dir = tempdir()?;
    fs::write(work_dir.path().join("secret.txt"), "classified")?;

    let mut cmd = Command::cargo_bin("satchel")?;
    cmd.current_dir(work_dir.path())
        .env("SATCHEL_PASSWORD", "from-the-env")
        .arg("--encrypt")
        .arg("secret.txt");
    cmd.assert().success();

    let archive = find_artifact(work_dir.path(), "backup-", ".tar.gz");
    let bytes = fs::read(&archive)?;
    assert_eq!(&bytes[..satchel::crypto::MAGIC.len()], satchel::crypto::MAGIC);

    let plain = satchel::crypto::decrypt_file(&archive, "from-the-env")?;
    assert_eq!(&plain[..2], &[0x1f, 0x8b]); // gzip stream inside

    Ok(())
}

#[test]
fn test_cli_zero_paths_builds_an_empty_archive() -> Result<(), Box<dyn std::error::Error>> {
    let work_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("satchel")?;
    cmd.current_dir(work_dir.path());
    cmd.assert().success();

    let archive = find_artifact(work_dir.path(), "backup-", ".tar.gz");
    find_artifact(work_dir.path(), "backup-", ".sha512");

    let file = fs::File::open(&archive)?;
    let mut tar = tar::Archive::new(flate2::read::GzDecoder::new(file));
    assert!(tar.entries()?.next().is_none());

    Ok(())
}

#[test]
fn test_cli_rejects_out_of_range_level() -> Result<(), Box<dyn std::error::Error>> {
    let work_dir = tempdir()?;

    let mut cmd = Command::cargo_bin("satchel")?;
    cmd.current_dir(work_dir.path()).arg("--level").arg("12");
    cmd.assert().failure();

    Ok(())
}

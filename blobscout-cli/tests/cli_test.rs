use anyhow::Result;
use assert_cmd::Command;
use flate2::write::GzEncoder;
use flate2::Compression;
use predicates::prelude::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

// Lays out a "logs" bucket under a fresh root directory
fn create_bucket() -> Result<TempDir> {
    let root = tempdir()?;
    let bucket = root.path().join("logs");
    fs::create_dir_all(&bucket)?;
    fs::write(bucket.join("a.log"), "foo\nbar\n")?;
    fs::write(bucket.join("b.log.gz"), gzip(b"bar\nxfoo\n")?)?;
    fs::write(bucket.join("c.txt"), "foo\n")?;
    fs::write(bucket.join("d.log"), "nothing here\n")?;
    Ok(root)
}

fn blobscout(root: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("blobscout")?;
    cmd.current_dir(root)
        .env_remove("RUST_LOG")
        .arg("--root")
        .arg(root)
        .args(["--bucket", "logs"]);
    Ok(cmd)
}

#[test]
fn test_report_output() -> Result<()> {
    let root = create_bucket()?;
    blobscout(root.path())?
        .args(["--key-match", r"\.log", "--content-match", "foo"])
        .assert()
        .success()
        .stdout("a.log (1 matches):\nfoo\n\nb.log.gz (1 matches):\nxfoo\n\n");
    Ok(())
}

#[test]
fn test_bare_output() -> Result<()> {
    let root = create_bucket()?;
    blobscout(root.path())?
        .args(["--content-match", "foo", "--no-object-keys", "--no-extra-newlines"])
        .assert()
        .success()
        .stdout("foo\nxfoo\nfoo\n");
    Ok(())
}

#[test]
fn test_only_list_key_matches() -> Result<()> {
    let root = create_bucket()?;
    blobscout(root.path())?
        .args(["--key-match", r"\.log$", "--only-list-key-matches"])
        .assert()
        .success()
        .stdout("a.log\nd.log\n");
    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let root = create_bucket()?;
    let output = blobscout(root.path())?
        .args(["--content-match", "foo", "--json"])
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["objects_with_matches"], 3);
    assert_eq!(report["stats"]["tasks_completed"], 4);
    Ok(())
}

#[test]
fn test_colour_and_fit_to_tty_conflict() -> Result<()> {
    let root = create_bucket()?;
    blobscout(root.path())?
        .args(["--content-match", "foo", "--colour", "--fit-to-tty"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
    Ok(())
}

#[test]
fn test_invalid_regex_is_rejected() -> Result<()> {
    let root = create_bucket()?;
    blobscout(root.path())?
        .args(["--content-match", "foo("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("foo("));
    Ok(())
}

#[test]
fn test_missing_bucket_fails() -> Result<()> {
    let root = tempdir()?;
    blobscout(root.path())?
        .args(["--content-match", "foo"])
        .assert()
        .failure();
    Ok(())
}

#[test]
fn test_config_file_supplies_defaults() -> Result<()> {
    let root = create_bucket()?;
    let config = root.path().join("search.yaml");
    fs::write(&config, "content_pattern: \"^bar$\"\nshow_keys: false\n")?;

    blobscout(root.path())?
        .arg("--config")
        .arg(&config)
        .args(["--key-match", r"^a\.log$"])
        .assert()
        .success()
        .stdout("bar\n\n");
    Ok(())
}

//! End-to-end CLI tests for the playlist-dl binary.
//!
//! Runs that reach yt-dlp use a shell-script stand-in, so they are unix-only.

use assert_cmd::Command;
use predicates::prelude::*;

/// Command with a clean environment: no user config, no inherited log filter.
fn playlist_dl(config_home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("playlist-dl").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home)
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_binary_help_displays_usage() {
    let home = tempfile::tempdir().unwrap();
    playlist_dl(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("yt-dlp"))
        .stdout(predicate::str::contains("--workers"));
}

#[test]
fn test_binary_version_displays_version() {
    let home = tempfile::tempdir().unwrap();
    playlist_dl(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("playlist-dl"));
}

#[test]
fn test_binary_invalid_flag_returns_error() {
    let home = tempfile::tempdir().unwrap();
    playlist_dl(home.path())
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_worker_count_out_of_range_rejected() {
    let home = tempfile::tempdir().unwrap();
    playlist_dl(home.path())
        .args(["--workers", "0", "https://example.com"])
        .assert()
        .failure();
}

#[test]
fn test_binary_missing_ytdlp_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    playlist_dl(home.path())
        .args([
            "--yes",
            "--ytdlp-path",
            "/definitely/not/here/yt-dlp-missing",
            "https://www.youtube.com/playlist?list=PL1",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("yt-dlp"));
}

#[test]
fn test_binary_config_with_unknown_key_is_fatal() {
    let home = tempfile::tempdir().unwrap();
    let config_dir = home.path().join("playlist-dl");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "concurrency = 4\n").unwrap();

    playlist_dl(home.path())
        .args(["--yes", "https://www.youtube.com/playlist?list=PL1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("config.toml"));
}

#[cfg(unix)]
mod with_stub_backend {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};

    use predicates::prelude::*;
    use tempfile::TempDir;

    use super::playlist_dl;

    /// Stand-in for yt-dlp.
    ///
    /// Probing prints `$STUB_PROBE_FILE`, or fails when `$STUB_PROBE_FAIL` is
    /// set. Fetching appends the reference to `$STUB_CALLS_FILE` and fails
    /// for references containing `bbbbbbbbbbb`.
    const STUB_SCRIPT: &str = r#"#!/bin/sh
for arg in "$@"; do
  if [ "$arg" = "--dump-single-json" ]; then
    if [ -n "$STUB_PROBE_FAIL" ]; then
      echo "ERROR: [youtube:tab] PLgone: The playlist does not exist." >&2
      exit 1
    fi
    cat "$STUB_PROBE_FILE"
    exit 0
  fi
done
last=""
for arg in "$@"; do last="$arg"; done
echo "$last" >> "$STUB_CALLS_FILE"
case "$last" in
  *bbbbbbbbbbb*)
    echo "[youtube] Extracting URL: $last" >&2
    echo "ERROR: [youtube] bbbbbbbbbbb: Video unavailable" >&2
    exit 1
    ;;
esac
exit 0
"#;

    struct Stub {
        dir: TempDir,
        script: PathBuf,
        probe_file: PathBuf,
        calls_file: PathBuf,
    }

    impl Stub {
        fn new(probe_json: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let script = dir.path().join("yt-dlp");
            fs::write(&script, STUB_SCRIPT).unwrap();
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
            let probe_file = dir.path().join("probe.json");
            fs::write(&probe_file, probe_json).unwrap();
            let calls_file = dir.path().join("calls.txt");
            Self {
                dir,
                script,
                probe_file,
                calls_file,
            }
        }

        fn command(&self, out: &Path, url: &str) -> assert_cmd::Command {
            let mut cmd = playlist_dl(self.dir.path());
            cmd.env("STUB_PROBE_FILE", &self.probe_file)
                .env("STUB_CALLS_FILE", &self.calls_file)
                .arg("--yes")
                .arg("--ytdlp-path")
                .arg(&self.script)
                .arg("--output-dir")
                .arg(out)
                .args(["--workers", "2", "--quality", "720p"])
                .arg(url);
            cmd
        }

        fn calls(&self) -> Vec<String> {
            fs::read_to_string(&self.calls_file)
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    const THREE_ITEM_PLAYLIST: &str = r#"{
        "_type": "playlist",
        "title": "Road Trip: Mix",
        "entries": [
            {"url": "https://www.youtube.com/watch?v=aaaaaaaaaaa", "id": "aaaaaaaaaaa", "title": "One"},
            {"url": "https://www.youtube.com/watch?v=bbbbbbbbbbb", "id": "bbbbbbbbbbb", "title": "Two"},
            {"url": null, "id": "ccccccccccc", "title": "Three"}
        ]
    }"#;

    #[test]
    fn test_empty_collection_exits_nonzero_without_creating_folder() {
        let stub = Stub::new(r#"{"_type": "playlist", "title": "Nothing Here", "entries": []}"#);
        let out = TempDir::new().unwrap();

        stub.command(out.path(), "https://www.youtube.com/playlist?list=PLempty")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("no entries found"));

        assert!(!out.path().join("Nothing Here").exists());
        assert!(stub.calls().is_empty());
    }

    #[test]
    fn test_probe_failure_exits_nonzero() {
        let stub = Stub::new("{}");
        let out = TempDir::new().unwrap();

        stub.command(out.path(), "https://www.youtube.com/playlist?list=PLgone")
            .env("STUB_PROBE_FAIL", "1")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("The playlist does not exist"));

        assert_eq!(fs::read_dir(out.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_collection_run_reports_failures_and_exits_zero() {
        let stub = Stub::new(THREE_ITEM_PLAYLIST);
        let out = TempDir::new().unwrap();

        stub.command(out.path(), "https://www.youtube.com/playlist?list=PL1")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Road Trip Mix"))
            .stdout(predicate::str::contains("bv*[height<=720]+ba/b[height<=720]"))
            .stdout(predicate::str::contains("[001] done"))
            .stdout(predicate::str::contains(
                "[002] failed: ERROR: [youtube] bbbbbbbbbbb: Video unavailable",
            ))
            .stdout(predicate::str::contains("[003] done"))
            .stdout(predicate::str::contains("Succeeded:  2"))
            .stdout(predicate::str::contains("Failed:     1"))
            .stdout(predicate::str::contains("--merge-format mkv"));

        let target = out.path().join("Road Trip Mix");
        assert!(target.is_dir());
        let ledger = fs::read_to_string(target.join("_archive.txt")).unwrap();
        assert!(ledger.contains("youtube aaaaaaaaaaa"), "Expected key in: {ledger}");
        assert!(ledger.contains("youtube ccccccccccc"), "Expected key in: {ledger}");
        assert!(!ledger.contains("bbbbbbbbbbb"));

        let mut calls = stub.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                "https://www.youtube.com/watch?v=aaaaaaaaaaa",
                "https://www.youtube.com/watch?v=bbbbbbbbbbb",
                "https://www.youtube.com/watch?v=ccccccccccc",
            ]
        );
    }

    #[test]
    fn test_rerun_skips_recorded_items() {
        let stub = Stub::new(THREE_ITEM_PLAYLIST);
        let out = TempDir::new().unwrap();

        stub.command(out.path(), "https://www.youtube.com/playlist?list=PL1")
            .assert()
            .code(0);
        fs::remove_file(&stub.calls_file).unwrap();

        stub.command(out.path(), "https://www.youtube.com/playlist?list=PL1")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("[001] already satisfied"))
            .stdout(predicate::str::contains("[003] already satisfied"))
            .stdout(predicate::str::contains("[002] failed"));

        assert_eq!(
            stub.calls(),
            vec!["https://www.youtube.com/watch?v=bbbbbbbbbbb"]
        );
    }

    #[test]
    fn test_rerun_skips_recorded_items_from_other_sites() {
        let stub = Stub::new(
            r#"{
                "_type": "playlist",
                "title": "Staff Picks",
                "entries": [
                    {"_type": "url", "ie_key": "Vimeo", "id": "76979871", "url": "https://vimeo.com/76979871"},
                    {"_type": "url", "ie_key": "Vimeo", "id": "22439234", "url": "https://vimeo.com/22439234"}
                ]
            }"#,
        );
        let out = TempDir::new().unwrap();

        stub.command(out.path(), "https://vimeo.com/showcase/1")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("[001] done"))
            .stdout(predicate::str::contains("[002] done"));
        let ledger_path = out.path().join("Staff Picks").join("_archive.txt");
        let ledger = fs::read_to_string(ledger_path).unwrap();
        assert!(ledger.contains("vimeo 76979871"), "Expected key in: {ledger}");
        assert!(ledger.contains("vimeo 22439234"), "Expected key in: {ledger}");
        fs::remove_file(&stub.calls_file).unwrap();

        stub.command(out.path(), "https://vimeo.com/showcase/1")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("[001] already satisfied"))
            .stdout(predicate::str::contains("[002] already satisfied"));
        assert!(stub.calls().is_empty());
    }

    #[test]
    fn test_single_video_uses_title_folder() {
        let stub = Stub::new(
            r#"{
                "_type": "video",
                "id": "aaaaaaaaaaa",
                "title": "Conference Talk",
                "webpage_url": "https://www.youtube.com/watch?v=aaaaaaaaaaa",
                "formats": [
                    {"height": 1080, "vcodec": "avc1"},
                    {"height": 720, "vcodec": "avc1"},
                    {"height": null, "vcodec": "none"}
                ]
            }"#,
        );
        let out = TempDir::new().unwrap();

        stub.command(out.path(), "https://youtu.be/aaaaaaaaaaa")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("Video:"))
            .stdout(predicate::str::contains("[001] done"));

        assert!(out.path().join("Conference Talk").join("_archive.txt").is_file());
    }
}

//! Integration tests for Kitbag

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn kitbag() -> Command {
        cargo_bin_cmd!("kitbag")
    }

    /// Write a config into `dir` with its own cache directory, so tests
    /// never touch real user state.
    fn write_config(dir: &TempDir, origin: &str) -> PathBuf {
        let config_path = dir.path().join("config.toml");
        let cache_dir = dir.path().join("cache");
        let content = format!(
            "[deployment]\norigin = \"{}\"\n\n[cache]\ndir = \"{}\"\n",
            origin,
            cache_dir.display()
        );
        std::fs::write(&config_path, content).unwrap();
        config_path
    }

    #[test]
    fn help_displays() {
        kitbag()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline mirror"));
    }

    #[test]
    fn version_displays() {
        kitbag()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("kitbag"));
    }

    #[test]
    fn init_creates_config() {
        let temp = TempDir::new().unwrap();

        kitbag()
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .success();

        let content = std::fs::read_to_string(temp.path().join("kitbag.toml")).unwrap();
        assert!(content.contains("[deployment]"));
    }

    #[test]
    fn init_refuses_overwrite() {
        let temp = TempDir::new().unwrap();

        kitbag()
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .success();

        kitbag()
            .args(["init", "--path"])
            .arg(temp.path())
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let temp = TempDir::new().unwrap();

        kitbag()
            .arg("--config")
            .arg(temp.path().join("missing.toml"))
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[deployment]"));
    }

    #[test]
    fn config_set_writes_value() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .args(["config", "set", "deployment.origin", "https://app.example.com"])
            .assert()
            .success();

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("https://app.example.com"));
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        let temp = TempDir::new().unwrap();

        kitbag()
            .arg("--config")
            .arg(temp.path().join("config.toml"))
            .args(["config", "set", "nope.nothing", "1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Unknown config key"))
            .stderr(predicate::str::contains("deployment.origin"));
    }

    #[test]
    fn sync_requires_origin() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "");

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .arg("sync")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid deployment origin"));
    }

    #[test]
    fn sync_reports_unreachable_origin() {
        let temp = TempDir::new().unwrap();
        // Bind then drop to get a local port nothing listens on
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config_path = write_config(&temp, &format!("http://127.0.0.1:{}", port));

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .arg("sync")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Fetch failed"));
    }

    #[test]
    fn get_requires_baseline() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "https://app.example.com");

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .args(["get", "main.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("No manifest baseline"))
            .stderr(predicate::str::contains("kitbag sync"));
    }

    #[test]
    fn fill_requires_baseline() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "https://app.example.com");

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .arg("fill")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No manifest baseline"));
    }

    #[test]
    fn clear_when_cache_is_empty() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "https://app.example.com");

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing to clear"));
    }

    #[test]
    fn status_offline_without_baseline() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "https://app.example.com");

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .args(["status", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No manifest baseline cached"));
    }

    #[test]
    fn status_reports_missing_origin() {
        let temp = TempDir::new().unwrap();
        let config_path = write_config(&temp, "");

        kitbag()
            .arg("--config")
            .arg(&config_path)
            .args(["status", "--offline"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Origin not set"));
    }
}

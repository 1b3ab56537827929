//! Integration tests for Cachet

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    /// Command with config and local discovery pinned to a tempdir, so
    /// host configuration never leaks into a test
    fn cachet(dir: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("cachet");
        cmd.current_dir(dir.path());
        cmd.env("CACHET_CONFIG", dir.path().join("config.toml"));
        cmd.env_remove("CACHET_SECRET");
        cmd
    }

    fn write_project(dir: &TempDir) {
        let dist = dir.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("app.js"), "console.log('hello')").unwrap();
        std::fs::write(dist.join("style.css"), "body { margin: 0 }").unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
    }

    #[test]
    fn help_displays() {
        let dir = TempDir::new().unwrap();
        cachet(&dir)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("precache manifest engine"));
    }

    #[test]
    fn version_displays() {
        let dir = TempDir::new().unwrap();
        cachet(&dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cachet"));
    }

    #[test]
    fn build_writes_manifest() {
        let dir = TempDir::new().unwrap();
        write_project(&dir);

        cachet(&dir)
            .args(["build", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"framework\""));

        assert!(dir.path().join(".cachet/manifest.json").exists());
        assert!(dir.path().join(".cachet/version.json").exists());
    }

    #[test]
    fn second_build_reports_no_changes() {
        let dir = TempDir::new().unwrap();
        write_project(&dir);

        cachet(&dir).arg("build").assert().success();
        cachet(&dir)
            .args(["build", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn diff_reports_changes() {
        let dir = TempDir::new().unwrap();
        let old = dir.path().join("old.json");
        let new = dir.path().join("new.json");
        std::fs::write(
            &old,
            r#"[{"url": "/app.js", "revision": "aaa", "size": 10, "mtime": 0}]"#,
        )
        .unwrap();
        std::fs::write(
            &new,
            r#"[{"url": "/app.js", "revision": "bbb", "size": 12, "mtime": 0}]"#,
        )
        .unwrap();

        cachet(&dir)
            .args(["diff", "new.json", "old.json", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("modified\t/app.js"));
    }

    #[test]
    fn diff_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.json"), "[]").unwrap();

        cachet(&dir)
            .args(["diff", "a.json", "missing.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Manifest not found"));
    }

    #[test]
    fn plan_picks_strategy() {
        let dir = TempDir::new().unwrap();
        let manifest = r#"{
            "version": "v1",
            "timestamp": "2026-01-01T00:00:00Z",
            "assets": [
                {"path": "/app.js", "hash": "aaa", "size": 1000}
            ],
            "totalSize": 0,
            "criticalSize": 0
        }"#;
        std::fs::write(dir.path().join("current.json"), manifest).unwrap();
        std::fs::write(
            dir.path().join("previous.json"),
            r#"{"version": "v0", "timestamp": "2026-01-01T00:00:00Z", "assets": [], "totalSize": 0, "criticalSize": 0}"#,
        )
        .unwrap();

        cachet(&dir)
            .args(["plan", "current.json", "previous.json", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("add\t/app.js"));
    }

    #[test]
    fn plan_rejects_malformed_manifest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("bad.json"), r#"{"assets": "nope"}"#).unwrap();
        std::fs::write(
            dir.path().join("ok.json"),
            r#"{"version": "v1", "timestamp": "2026-01-01T00:00:00Z", "assets": [], "totalSize": 0, "criticalSize": 0}"#,
        )
        .unwrap();

        cachet(&dir)
            .args(["plan", "bad.json", "ok.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid manifest"));
    }

    #[test]
    fn cascade_follows_routes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".cachet.toml"),
            r#"
[[routes]]
key = "/checkout"
dependencies = ["/api/cart"]
"#,
        )
        .unwrap();

        cachet(&dir)
            .args(["cascade", "/api/cart"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("/api/cart")
                    .and(predicate::str::contains("/checkout")),
            );
    }

    #[test]
    fn verify_unsigned_manifest_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("manifest.json"), "[]").unwrap();

        cachet(&dir)
            .args(["verify", "manifest.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not signed"));
    }

    #[test]
    fn verify_signed_manifest_roundtrip() {
        let dir = TempDir::new().unwrap();
        let secret = "integration-test-secret";
        let body = r#"[{"url": "/a.js", "revision": "abc", "size": 1, "mtime": 0}]"#;
        let signature = cachet::integrity::IntegrityGuard::sign(
            body.as_bytes(),
            secret,
            cachet::integrity::SignatureAlgorithm::Sha256,
        )
        .unwrap();
        let signed = cachet::integrity::IntegrityGuard::attach(body, &signature);
        std::fs::write(dir.path().join("manifest.json"), &signed).unwrap();

        cachet(&dir)
            .args(["verify", "manifest.json"])
            .env("CACHET_SECRET", secret)
            .assert()
            .success();

        // Tampering flips the verdict
        std::fs::write(
            dir.path().join("manifest.json"),
            signed.replace("/a.js", "/b.js"),
        )
        .unwrap();
        cachet(&dir)
            .args(["verify", "manifest.json"])
            .env("CACHET_SECRET", secret)
            .assert()
            .failure()
            .stderr(predicate::str::contains("integrity check failed"));
    }

    #[test]
    fn verify_without_secret_fails() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("manifest.json"), "// HMAC: deadbeef\n[]").unwrap();

        cachet(&dir)
            .args(["verify", "manifest.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("secret not set"));
    }

    #[test]
    fn status_runs_without_manifest() {
        let dir = TempDir::new().unwrap();
        cachet(&dir)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No manifest yet"));
    }

    #[test]
    fn init_creates_local_config() {
        let dir = TempDir::new().unwrap();
        cachet(&dir).arg("init").assert().success();
        assert!(dir.path().join(".cachet.toml").exists());

        // Second init without --force refuses
        cachet(&dir)
            .arg("init")
            .assert()
            .failure()
            .stderr(predicate::str::contains("already exists"));

        cachet(&dir).args(["init", "--force"]).assert().success();
    }

    #[test]
    fn config_path_displays() {
        let dir = TempDir::new().unwrap();
        cachet(&dir)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_displays_sections() {
        let dir = TempDir::new().unwrap();
        cachet(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(
                predicate::str::contains("[build]").and(predicate::str::contains("[sync]")),
            );
    }

    #[test]
    fn local_config_overrides_patterns() {
        let dir = TempDir::new().unwrap();
        let public = dir.path().join("public");
        std::fs::create_dir_all(&public).unwrap();
        std::fs::write(public.join("app.js"), "x").unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        std::fs::write(
            dir.path().join(".cachet.toml"),
            "[build]\npatterns = [\"public/**\"]\n",
        )
        .unwrap();

        cachet(&dir)
            .args(["build", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("added\t/public/app.js"));
    }
}

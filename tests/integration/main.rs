//! Integration tests for swcache

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use httpmock::prelude::*;
use predicates::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// How long an offline origin stalls; longer than the client timeout
const OFFLINE_STALL: Duration = Duration::from_secs(4);

/// Mock origin serving a set of deployed files
struct Origin {
    server: MockServer,
    files: BTreeMap<String, String>,
}

impl Origin {
    fn start() -> Self {
        Self {
            server: MockServer::start(),
            files: BTreeMap::new(),
        }
    }

    fn url(&self) -> String {
        self.server.url("/")
    }

    fn put(&mut self, path: &str, body: &str) {
        self.files.insert(path.to_string(), body.to_string());
        self.redeploy();
    }

    fn publish(&mut self, version: &str) {
        self.put("version.json", &format!(r#"{{"version":"{}"}}"#, version));
    }

    /// Stall every request past the client timeout
    fn set_offline(&self) {
        self.server.reset();
        self.server.mock(|when, then| {
            when.method(GET);
            then.delay(OFFLINE_STALL).status(503);
        });
    }

    /// Replace all mocks with the current file set; anything else is a 404
    fn redeploy(&self) {
        self.server.reset();
        for (path, body) in &self.files {
            self.server.mock(|when, then| {
                when.method(GET).path(format!("/{}", path));
                then.status(200)
                    .header("content-type", "text/plain")
                    .body(body.as_str());
            });
        }
    }
}

/// Temp config pointing the stores into a temp directory
struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new(origin: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        let content = format!(
            r#"
[app]
origin = "{origin}"

[assets]
core = ["index.html", "main.dart.js", "flutter.js"]

[network]
timeout_secs = 5

[storage]
dir = '{storage}'
"#,
            origin = origin,
            storage = dir.path().join("caches").display()
        );
        std::fs::write(&config, content).unwrap();
        Self { dir, config }
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("swcache");
        cmd.env_remove("SWCACHE_CONFIG").arg("-c").arg(&self.config);
        cmd
    }

    fn storage(&self) -> PathBuf {
        self.dir.path().join("caches")
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// Origin with a deployed 1.0.0 build
fn deployed() -> (Origin, Workspace) {
    let mut origin = Origin::start();
    origin.put("index.html", "<html>shell v1</html>");
    origin.put("main.dart.js", "main v1");
    origin.put("flutter.js", "loader");
    origin.publish("1.0.0");
    let workspace = Workspace::new(&origin.url());
    (origin, workspace)
}

/// Origin address with nothing listening
const UNREACHABLE: &str = "http://127.0.0.1:9/";

mod cli_tests {
    use super::*;

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("swcache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("offline asset cache"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("swcache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("swcache"));
    }

    #[test]
    fn config_path_honors_flag() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_includes_sections() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("flutter-app-cache"));
    }

    #[test]
    fn config_set_persists_and_validates() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .args(["config", "set", "version.include_build_number", "true"])
            .assert()
            .success();
        let saved = std::fs::read_to_string(&ws.config).unwrap();
        assert!(saved.contains("include_build_number = true"));

        ws.cmd()
            .args(["config", "set", "cache.manifest_name", "flutter-app-cache-meta"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache settings"));

        ws.cmd()
            .args(["config", "set", "cache.size", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn config_init_refuses_overwrite() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .args(["config", "init"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--force"));
    }

    #[test]
    fn stores_empty_json() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .args(["stores", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn status_before_activation() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("never activated"));
    }

    #[test]
    fn install_fails_when_origin_unreachable() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn activate_without_version_descriptor_fails_with_hint() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to resolve version"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn unresolved_navigation_reports_failure() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .args(["fetch", "settings", "--navigate"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("unresolved"));
    }

    #[test]
    fn message_skip_waiting_is_recognized() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .args(["message", "skipWaiting"])
            .assert()
            .success()
            .stdout(predicate::str::contains("skipWaiting delivered"));

        ws.cmd()
            .args(["message", "reload"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ignored message 'reload'"));
    }

    #[test]
    fn clear_requires_confirmation() {
        let ws = Workspace::new(UNREACHABLE);
        ws.cmd()
            .arg("clear")
            .assert()
            .success()
            .stdout(predicate::str::contains("Nothing deleted"));

        ws.cmd()
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No stores to delete"));
    }

    #[test]
    fn invalid_settings_from_env_config() {
        let ws = Workspace::new(UNREACHABLE);
        let bad = ws.path().join("bad.toml");
        std::fs::write(&bad, "[cache]\nstaging_name = \"flutter-app-cache-tmp\"\n").unwrap();

        cargo_bin_cmd!("swcache")
            .env("SWCACHE_CONFIG", &bad)
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache settings"));
    }
}

mod lifecycle_tests {
    use super::*;

    fn plain_stores(ws: &Workspace) -> String {
        let output = ws
            .cmd()
            .args(["stores", "--format", "plain"])
            .output()
            .unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }

    #[test]
    fn update_activates_published_version() {
        let (_origin, ws) = deployed();

        ws.cmd()
            .arg("update")
            .assert()
            .success()
            .stdout(predicate::str::contains("Activated version 1.0.0"))
            .stdout(predicate::str::contains("first activation"));

        let stores = plain_stores(&ws);
        assert!(stores.contains("flutter-app-cache-1.0.0"));
        assert!(stores.contains("flutter-app-manifest"));
        assert!(!stores.contains("flutter-temp-cache"));

        let journal = std::fs::read_to_string(ws.storage().join("journal.log")).unwrap();
        assert!(journal.contains("install.completed"));
        assert!(journal.contains("activate.completed"));
    }

    #[test]
    fn install_then_activate_across_processes() {
        let (_origin, ws) = deployed();

        ws.cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Staged 3 assets"));
        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("run: swcache activate"));

        ws.cmd().arg("activate").assert().success();
        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("flutter-app-cache-1.0.0"));
    }

    #[test]
    fn version_bump_replaces_content_store() {
        let (mut origin, ws) = deployed();
        ws.cmd().arg("update").assert().success();

        origin.put("main.dart.js", "main v2");
        origin.publish("1.0.1");
        ws.cmd()
            .arg("update")
            .assert()
            .success()
            .stdout(predicate::str::contains("upgraded from 1.0.0"));

        let stores = plain_stores(&ws);
        assert!(stores.contains("flutter-app-cache-1.0.1"));
        assert!(!stores.contains("flutter-app-cache-1.0.0"));

        ws.cmd()
            .args(["fetch", "main.dart.js"])
            .assert()
            .success()
            .stdout("main v2")
            .stderr(predicate::str::contains("cache"));
    }

    #[test]
    fn offline_navigation_served_from_cache() {
        let (origin, ws) = deployed();
        ws.cmd().arg("update").assert().success();

        ws.cmd()
            .args(["config", "set", "network.timeout_secs", "1"])
            .assert()
            .success();
        origin.set_offline();
        ws.cmd()
            .args(["fetch", "index.html", "--navigate"])
            .assert()
            .success()
            .stdout("<html>shell v1</html>")
            .stderr(predicate::str::contains("cache"));
    }

    #[test]
    fn failed_activation_discards_stores() {
        let (mut origin, ws) = deployed();
        ws.cmd().arg("update").assert().success();

        origin.put("version.json", "not json");
        ws.cmd()
            .arg("update")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to resolve version"));

        ws.cmd()
            .args(["stores", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn degraded_cache_persists_until_next_update() {
        let (mut origin, ws) = deployed();
        ws.cmd().arg("update").assert().success();

        origin.put("version.json", "not json");
        ws.cmd().arg("update").assert().failure();
        assert!(ws.storage().join("worker.json").exists());

        // Later commands keep passing through and never recreate a store
        ws.cmd()
            .args(["fetch", "main.dart.js"])
            .assert()
            .success()
            .stdout("main v1")
            .stderr(predicate::str::contains("pass-through"));
        assert!(plain_stores(&ws).trim().is_empty());
        ws.cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("degraded"));

        origin.publish("1.0.2");
        ws.cmd()
            .arg("update")
            .assert()
            .success()
            .stdout(predicate::str::contains("Activated version 1.0.2"));
        assert!(!ws.storage().join("worker.json").exists());
        ws.cmd()
            .args(["fetch", "main.dart.js"])
            .assert()
            .success()
            .stderr(predicate::str::contains("cache"));
    }

    #[test]
    fn fetch_writes_output_file() {
        let (_origin, ws) = deployed();
        ws.cmd().arg("update").assert().success();

        let out = ws.path().join("flutter.js");
        ws.cmd()
            .args(["fetch", "flutter.js", "-o"])
            .arg(&out)
            .assert()
            .success();
        assert_eq!(std::fs::read_to_string(out).unwrap(), "loader");
    }

    #[test]
    fn clear_removes_managed_stores() {
        let (_origin, ws) = deployed();
        ws.cmd().arg("update").assert().success();

        ws.cmd()
            .args(["clear", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted 2 store(s)"));
        assert!(plain_stores(&ws).trim().is_empty());
    }
}

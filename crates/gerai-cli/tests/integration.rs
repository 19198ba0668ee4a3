#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn gerai(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("gerai").unwrap();
    cmd.current_dir(dir.path())
        .env("GERAI_CONFIG", dir.path().join("gerai.yaml"))
        .env_remove("GERAI_ADMINS")
        .env_remove("GERAI_FORCE_OPEN");
    cmd
}

fn init(dir: &TempDir) {
    gerai(dir).arg("init").assert().success();
}

// ---------------------------------------------------------------------------
// gerai init
// ---------------------------------------------------------------------------

#[test]
fn init_writes_default_config() {
    let dir = TempDir::new().unwrap();
    gerai(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created"));

    let yaml = std::fs::read_to_string(dir.path().join("gerai.yaml")).unwrap();
    assert!(yaml.contains("gerai11"));
    assert!(yaml.contains("start_hour: 7"));
    assert!(yaml.contains("subscribers_path: subscribers.json"));
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    std::fs::write(
        dir.path().join("gerai.yaml"),
        "stalls:\n  - id: kafe-a\n    name: Kafe A\n",
    )
    .unwrap();
    gerai(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("left untouched"));
    let yaml = std::fs::read_to_string(dir.path().join("gerai.yaml")).unwrap();
    assert!(yaml.contains("kafe-a"));
}

#[test]
fn missing_config_suggests_init() {
    let dir = TempDir::new().unwrap();
    gerai(&dir)
        .arg("stalls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("gerai init"));
}

// ---------------------------------------------------------------------------
// gerai stalls / hours
// ---------------------------------------------------------------------------

#[test]
fn stalls_table_lists_registry() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    gerai(&dir)
        .arg("stalls")
        .assert()
        .success()
        .stdout(predicate::str::contains("gerai11"))
        .stdout(predicate::str::contains("Kedai Runcit Medan"));
}

#[test]
fn stalls_json() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let out = gerai(&dir).args(["--json", "stalls"]).output().unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 5);
    assert_eq!(json[4]["id"], "gerai23");
}

#[test]
fn hours_json_reports_window() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let out = gerai(&dir).args(["hours", "--json"]).output().unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["window"]["start_hour"], 7);
    assert_eq!(json["window"]["end_hour"], 24);
    assert_eq!(json["label"], "7:00 AM - 12:00 AM");
    assert!(json["open_now"].is_boolean());
}

#[test]
fn force_open_env_is_honored() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let out = gerai(&dir)
        .env("GERAI_FORCE_OPEN", "1")
        .args(["hours", "--json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["force_open"], true);
    assert_eq!(json["open_now"], true);
}

// ---------------------------------------------------------------------------
// gerai subscribers
// ---------------------------------------------------------------------------

#[test]
fn subscribers_add_list_remove() {
    let dir = TempDir::new().unwrap();
    init(&dir);

    gerai(&dir)
        .args(["subscribers", "add", "12345"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Subscribed"));
    gerai(&dir)
        .args(["subscribers", "add", "12345"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already subscribed"));
    assert!(dir.path().join("subscribers.json").exists());

    gerai(&dir)
        .args(["subscribers", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("12345"));

    gerai(&dir)
        .args(["subscribers", "remove", "12345"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Unsubscribed"));
    gerai(&dir)
        .args(["subscribers", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No subscribers"));
}

#[test]
fn subscribers_need_a_path() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("gerai.yaml"), "version: 1\n").unwrap();
    gerai(&dir)
        .args(["subscribers", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("subscribers_path"));
}

// ---------------------------------------------------------------------------
// gerai config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_warns_without_admins() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    gerai(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[warning] no admins"));
}

#[test]
fn config_validate_passes_with_env_admins() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    gerai(&dir)
        .env("GERAI_ADMINS", "1001")
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_fails_on_duplicate_ids() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("gerai.yaml"),
        "admins: ['1']\nstalls:\n  - {id: a, name: A}\n  - {id: a, name: B}\n",
    )
    .unwrap();
    gerai(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("more than once"));
}

#[test]
fn config_show_merges_env() {
    let dir = TempDir::new().unwrap();
    init(&dir);
    let out = gerai(&dir)
        .env("GERAI_ADMINS", "@warden")
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["admins"], serde_json::json!(["@warden"]));
    assert_eq!(json["operating_hours"]["start_hour"], 7);
}

#[test]
fn serve_accepts_an_api_token() {
    let dir = TempDir::new().unwrap();
    gerai(&dir)
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--api-token"))
        .stdout(predicate::str::contains("GERAI_API_TOKEN"));
}

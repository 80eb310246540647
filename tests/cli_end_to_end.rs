use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

fn ventus(root: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ventus"));
    cmd.current_dir(root.path())
        .env_remove("VENTUS_CONFIG_FILE")
        .env("RUST_LOG", "warn")
        .arg("--content-path")
        .arg(root.path().join("content"));
    cmd
}

fn json(cmd: &mut Command) -> Value {
    let assert = cmd.assert().success();
    serde_json::from_slice(&assert.get_output().stdout).expect("stdout is json")
}

#[test]
fn create_update_and_browse_end_to_end() {
    let root = TempDir::new().expect("temp dir");

    let created = json(ventus(&root).args([
        "create",
        "--title",
        "Hello World",
        "--content",
        "# Hi\n\nFirst **post**",
        "--tags",
        "rust,go",
    ]));
    assert_eq!(created["slug"], "hello-world");
    assert_eq!(created["version"], 1);
    assert_eq!(created["status"], "draft");
    let id = created["id"].as_str().expect("id").to_string();

    let shown = json(ventus(&root).args(["show", "--slug", "hello-world"]));
    assert_eq!(shown["id"], id.as_str());

    let published = json(ventus(&root).args(["publish", id.as_str(), "--expected-version", "1"]));
    assert_eq!(published["status"], "published");
    assert_eq!(published["version"], 2);

    ventus(&root)
        .args(["update", id.as_str(), "--expected-version", "1", "--title", "Stale"])
        .assert()
        .failure()
        .stderr(contains("version_conflict"));

    let stats = json(ventus(&root).arg("stats"));
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["published"], 1);

    let tags = json(ventus(&root).args(["tags", "--counts"]));
    assert_eq!(tags["rust"], 1);

    let list = json(ventus(&root).args(["list", "--tag", "go"]));
    assert_eq!(list["total"], 1);
    assert_eq!(list["items"][0]["slug"], "hello-world");

    let archive = json(ventus(&root).arg("archive"));
    assert_eq!(archive[0]["count"], 1);

    json(ventus(&root).args(["delete", id.as_str()]));
    ventus(&root)
        .args(["show", id.as_str()])
        .assert()
        .failure()
        .stderr(contains("not_found"));
}

#![allow(missing_docs)]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

#[test]
fn profile_set_then_show_redacts_password() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("local.toml");

    cargo_bin_cmd!("cypher-tools")
        .env_remove("CYPHER_TOOLS_PASSWORD")
        .args(["profile", "set", "--server", "db.internal", "--user", "neo4j"])
        .args(["--password", "s3cret", "--database", "movies", "--path"])
        .arg(&path)
        .assert()
        .success();

    let written = fs::read_to_string(&path).expect("profile file");
    assert!(written.contains("[neo4j]"));
    assert!(written.contains("bolt://db.internal:7687"));

    let stdout = stdout_of(
        cargo_bin_cmd!("cypher-tools")
            .args(["profile", "show"])
            .arg(&path)
            .assert()
            .success(),
    );
    assert!(stdout.contains("bolt://db.internal:7687"));
    assert!(stdout.contains("movies"));
    assert!(!stdout.contains("s3cret"), "password leaked: {stdout}");
}

#[test]
fn profile_set_merges_into_existing_file() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("p.toml");
    fs::write(
        &path,
        "[neo4j]\nuri = \"bolt://a:7687\"\nuser = \"u\"\npassword = \"p\"\n",
    )
    .expect("seed profile");

    cargo_bin_cmd!("cypher-tools")
        .env_remove("CYPHER_TOOLS_PASSWORD")
        .args(["profile", "set", "--database", "analytics", "--path"])
        .arg(&path)
        .assert()
        .success();

    let written = fs::read_to_string(&path).expect("profile file");
    assert!(written.contains("bolt://a:7687"));
    assert!(written.contains("analytics"));
}

#[test]
fn unknown_profile_fails() {
    let home = TempDir::new().expect("tempdir");
    cargo_bin_cmd!("cypher-tools")
        .env("HOME", home.path())
        .args(["profile", "show", "nowhere"])
        .assert()
        .failure();
}

#[test]
fn named_profile_is_found_under_home() {
    let home = TempDir::new().expect("tempdir");
    cargo_bin_cmd!("cypher-tools")
        .env("HOME", home.path())
        .env_remove("CYPHER_TOOLS_PASSWORD")
        .args(["profile", "set", "--name", "staging", "--uri", "neo4j://s:7687"])
        .args(["--user", "neo4j", "--password", "pw"])
        .assert()
        .success();
    assert!(home.path().join(".cypher_tools/staging.toml").is_file());

    let stdout = stdout_of(
        cargo_bin_cmd!("cypher-tools")
            .env("HOME", home.path())
            .args(["profile", "show", "staging"])
            .assert()
            .success(),
    );
    assert!(stdout.contains("neo4j://s:7687"));
}

#[test]
fn render_index_prints_statement() {
    let stdout = stdout_of(
        cargo_bin_cmd!("cypher-tools")
            .args(["render", "index", "--label", "Person", "--prop", "name"])
            .assert()
            .success(),
    );
    assert_eq!(
        stdout.trim(),
        "CREATE INDEX ix_Person__name IF NOT EXISTS FOR (n:Person) ON (n.name)"
    );
}

#[test]
fn render_batched_delete_rejects_zero_size() {
    cargo_bin_cmd!("cypher-tools")
        .args(["render", "batched-delete", "--transaction-size", "0"])
        .assert()
        .failure();
}

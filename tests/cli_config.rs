use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn copy_fixture_project(name: &str) -> (tempfile::TempDir, PathBuf) {
    let src = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name);
    let tmp = tempdir().expect("tempdir");
    let root = tmp.path().join("project");
    fs::create_dir_all(root.join("dados")).expect("create project");
    fs::copy(&src, root.join("dados").join(name)).expect("copy fixture");
    (tmp, root)
}

#[test]
fn cli_search_uses_project_config_defaults_for_data_and_format() {
    let (_tmp, root) = copy_fixture_project("operadoras.csv");
    let config_dir = root.join(".operadoras");
    fs::create_dir_all(&config_dir).expect("create .operadoras directory");

    let config_toml = r#"
[data]
path = "dados/operadoras.csv"

[search]
format = "json"
"#;
    fs::write(config_dir.join("config.toml"), config_toml).expect("write config.toml");

    let nested = root.join("sub");
    fs::create_dir_all(&nested).expect("create nested dir");

    let mut cmd = cargo_bin_cmd!("operadoras");
    cmd.current_dir(&nested)
        .env_remove("OPERADORAS_DATA")
        .env_remove("OPERADORAS_SERVER_URL");
    cmd.args(["search", "gama"]);

    let assert = cmd.assert().success();
    let value: Value =
        serde_json::from_slice(&assert.get_output().stdout).expect("valid json output");

    assert_eq!(value["total"], 1);
    assert_eq!(value["resultados"][0]["Nome_Fantasia"], "Gama Sorrisos");
}

#[test]
fn cli_search_config_can_disable_server_even_with_env() {
    let (_tmp, root) = copy_fixture_project("operadoras.csv");
    let config_dir = root.join(".operadoras");
    fs::create_dir_all(&config_dir).expect("create .operadoras directory");

    let config_toml = r#"
[data]
path = "dados/operadoras.csv"

[search]
no_server = true
"#;
    fs::write(config_dir.join("config.toml"), config_toml).expect("write config.toml");

    let mut cmd = cargo_bin_cmd!("operadoras");
    cmd.current_dir(&root)
        .env_remove("OPERADORAS_DATA")
        .env("OPERADORAS_SERVER_URL", "http://127.0.0.1:9");
    cmd.args(["search", "alfa"]);

    let assert = cmd.assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).expect("utf-8");

    assert!(
        output.contains("Alfa Saude"),
        "expected local search output when config sets no_server = true"
    );
}

//! End-to-end tests for the typesift binary.
//!
//! Each test writes a module document (and optionally a config file) into a
//! temp directory, runs the binary there, and checks the JSON on stdout plus
//! the exit code.

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

const MODULE: &str = r#"{
    "name": "Shop",
    "types": [
        {"name": "OrderService", "namespace": "Shop.Services", "is_sealed": true,
         "dependencies": ["Shop.Data.OrderRepository"]},
        {"name": "BillingService", "namespace": "Shop.Services",
         "dependencies": ["Shop.Web.CheckoutController"]},
        {"name": "OrderRepository", "namespace": "Shop.Data"},
        {"name": "IOrderService", "namespace": "Shop.Contracts", "kind": "interface"},
        {"name": "CheckoutController", "namespace": "Shop.Web", "is_abstract": true}
    ]
}"#;

/// Run typesift in `dir` and return (stdout, stderr, exit_code).
fn run_typesift(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_typesift"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to execute typesift");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn workspace_with_module() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("module.json"), MODULE).unwrap();
    dir
}

fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, stdout))
}

// ============================================================================
// select
// ============================================================================

#[test]
fn select_prints_matching_types_in_group_order() {
    let dir = workspace_with_module();
    let (stdout, stderr, code) = run_typesift(
        dir.path(),
        &[
            "select",
            "--module",
            "module.json",
            "--filter",
            "name:*Service or abstract",
        ],
    );

    assert_eq!(code, 0, "stderr: {}", stderr);
    let json = parse_json(&stdout);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["schema_version"], "1");
    assert_eq!(json["module"], "Shop");
    assert_eq!(json["count"], 4);

    let names: Vec<&str> = json["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["full_name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "Shop.Services.OrderService",
            "Shop.Services.BillingService",
            "Shop.Contracts.IOrderService",
            "Shop.Web.CheckoutController",
        ]
    );
}

#[test]
fn select_with_bad_expression_is_invalid_arguments() {
    let dir = workspace_with_module();
    let (stdout, _, code) = run_typesift(
        dir.path(),
        &["select", "--module", "module.json", "--filter", "name:("],
    );

    assert_eq!(code, 2);
    let json = parse_json(&stdout);
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"]["code"], 2);
}

#[test]
fn select_or_lists_groups_in_order_and_repeats_shared_types() {
    let dir = workspace_with_module();
    let (stdout, stderr, code) = run_typesift(
        dir.path(),
        &[
            "select",
            "--module",
            "module.json",
            "--filter",
            "abstract or name:*Service",
        ],
    );

    assert_eq!(code, 0, "stderr: {}", stderr);
    let json = parse_json(&stdout);
    let names: Vec<&str> = json["types"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    // The abstract group comes first even though its type is last in the module.
    assert_eq!(
        names,
        vec![
            "CheckoutController",
            "OrderService",
            "BillingService",
            "IOrderService",
        ]
    );

    // Distinct group results are concatenated, so a shared type shows up twice.
    let (stdout, _, code) = run_typesift(
        dir.path(),
        &[
            "select",
            "--module",
            "module.json",
            "--filter",
            "name:*Service or sealed",
        ],
    );
    assert_eq!(code, 0);
    let json = parse_json(&stdout);
    assert_eq!(json["count"], 4);
    assert_eq!(json["types"][3]["full_name"], "Shop.Services.OrderService");
}

#[test]
fn select_with_deeply_nested_expression_is_invalid_arguments() {
    let dir = workspace_with_module();
    let filter = format!("{}sealed{}", "(".repeat(5_000), ")".repeat(5_000));
    let (stdout, _, code) = run_typesift(
        dir.path(),
        &["select", "--module", "module.json", "--filter", &filter],
    );

    assert_eq!(code, 2);
    let json = parse_json(&stdout);
    assert_eq!(json["status"], "error");
    assert!(json["error"]["message"]
        .as_str()
        .unwrap()
        .contains("levels deep"));
}

#[test]
fn missing_module_file_is_module_error() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_typesift(
        dir.path(),
        &["select", "--module", "absent.json", "--filter", "sealed"],
    );

    assert_eq!(code, 3);
    assert_eq!(parse_json(&stdout)["error"]["code"], 3);
}

#[test]
fn no_module_anywhere_is_invalid_arguments() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_typesift(dir.path(), &["select", "--filter", "sealed"]);

    assert_eq!(code, 2);
    assert_eq!(parse_json(&stdout)["status"], "error");
}

// ============================================================================
// check
// ============================================================================

#[test]
fn check_failing_rule_exits_one_and_lists_violators() {
    let dir = workspace_with_module();
    let (stdout, _, code) = run_typesift(
        dir.path(),
        &[
            "check",
            "--module",
            "module.json",
            "--that",
            "namespace:Shop.Services",
            "--should",
            "sealed",
        ],
    );

    assert_eq!(code, 1);
    let json = parse_json(&stdout);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["result"]["passed"], false);
    assert_eq!(json["result"]["checked"], 2);
    assert_eq!(
        json["result"]["failing"][0]["full_name"],
        "Shop.Services.BillingService"
    );
}

#[test]
fn check_negated_rule_passes() {
    let dir = workspace_with_module();
    let (stdout, _, code) = run_typesift(
        dir.path(),
        &[
            "check",
            "--module",
            "module.json",
            "--that",
            "namespace:Shop.Data",
            "--should",
            "depends:Shop.Web.*",
            "--negate",
        ],
    );

    assert_eq!(code, 0);
    assert_eq!(parse_json(&stdout)["result"]["passed"], true);
}

// ============================================================================
// rules
// ============================================================================

#[test]
fn rules_reads_typesift_toml_from_current_directory() {
    let dir = workspace_with_module();
    fs::write(
        dir.path().join("typesift.toml"),
        r#"
[module]
path = "module.json"

[[rule]]
name = "contracts are interfaces"
that = "namespace:Shop.Contracts"
should = "interface"

[[rule]]
name = "services stay off the web layer"
that = "namespace:Shop.Services"
should = "depends:Shop.Web.*"
negate = true
"#,
    )
    .unwrap();

    let (stdout, _, code) = run_typesift(dir.path(), &["rules"]);

    assert_eq!(code, 1);
    let json = parse_json(&stdout);
    assert_eq!(json["passed"], false);
    assert_eq!(json["rules"][0]["name"], "contracts are interfaces");
    assert_eq!(json["rules"][0]["passed"], true);
    assert_eq!(json["rules"][1]["passed"], false);
    assert_eq!(
        json["rules"][1]["failing"][0]["full_name"],
        "Shop.Services.BillingService"
    );
}

#[test]
fn rules_with_broken_config_is_config_error() {
    let dir = workspace_with_module();
    fs::write(dir.path().join("custom.toml"), "[[rule]]\nname = 1\n").unwrap();

    let (stdout, _, code) = run_typesift(
        dir.path(),
        &["rules", "--module", "module.json", "--config", "custom.toml"],
    );

    assert_eq!(code, 4);
    assert_eq!(parse_json(&stdout)["error"]["code"], 4);
}

#[test]
fn logs_go_to_stderr_not_stdout() {
    let dir = workspace_with_module();
    let (stdout, stderr, code) = run_typesift(
        dir.path(),
        &[
            "--log-level",
            "debug",
            "select",
            "--module",
            "module.json",
            "--filter",
            "sealed",
        ],
    );

    assert_eq!(code, 0);
    assert_eq!(parse_json(&stdout)["count"], 1);
    assert!(stderr.contains("loaded module"), "stderr: {}", stderr);
}

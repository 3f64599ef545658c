use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn synth_orders_stacks_by_dependency() {
    let output = Command::cargo_bin("croft")
        .unwrap()
        .args(["--prefix", "test", "synth"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let manifests: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> = manifests
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        ["test-DatabaseStack", "test-ApiStack", "test-FrontendStack"]
    );

    // The api stack's ordering dependency is declared explicitly.
    assert_eq!(manifests[1]["depends_on"][0], "test-DatabaseStack");
    assert_eq!(manifests[0]["depends_on"], serde_json::json!([]));
}

#[test]
fn synth_names_every_resource_with_the_prefix() {
    let output = Command::cargo_bin("croft")
        .unwrap()
        .args(["--prefix", "test", "synth"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let manifests: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    for manifest in manifests.as_array().unwrap() {
        for resource in manifest["resources"].as_array().unwrap() {
            let name = resource["name"]
                .as_str()
                .or_else(|| resource["spec"]["name"].as_str())
                .unwrap();
            assert!(name.starts_with("test-"), "unprefixed resource {name}");
        }
    }
}

#[test]
fn synth_injects_one_single_table_name_into_both_handlers() {
    let output = Command::cargo_bin("croft")
        .unwrap()
        .args(["--prefix", "test", "synth"])
        .output()
        .unwrap();
    let manifests: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();

    let api = &manifests[1];
    let mut table_names = Vec::new();
    for resource in api["resources"].as_array().unwrap() {
        if resource["kind"] == "function" {
            if let Some(table) = resource["environment"]["ITEM_TABLE"].as_str() {
                table_names.push(table.to_string());
            }
        }
    }
    assert_eq!(table_names, vec!["test-ItemsTable", "test-ItemsTable"]);
}

#[test]
fn rejects_an_invalid_prefix() {
    Command::cargo_bin("croft")
        .unwrap()
        .args(["--prefix", "not valid", "synth"])
        .assert()
        .failure();
}

#[test]
fn status_reports_an_empty_state_in_a_fresh_project() {
    let dir = tempfile::tempdir().unwrap();
    Command::cargo_bin("croft")
        .unwrap()
        .current_dir(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("no deployed stacks"));
}

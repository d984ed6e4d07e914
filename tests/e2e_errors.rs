mod common;

use common::cli::{FsWorkspace, run_formsync, run_formsync_with_env};
use common::fixtures::{WORKFLOW, WORKFLOW_TEXT, write_base_scenario};
use serde_json::json;

#[test]
fn e2e_missing_input_file() {
    let _log = common::test_log("e2e_missing_input_file");
    let workspace = FsWorkspace::new();

    let run = run_formsync(&workspace, ["report"], "missing_input");
    assert_eq!(run.code(), Some(8), "stderr: {}", run.stderr);

    let error = run.error();
    assert_eq!(error["code"], "FILE_NOT_FOUND");
    assert!(
        error["message"]
            .as_str()
            .unwrap_or_default()
            .contains("source_forms_library.json")
    );
}

#[test]
fn e2e_swapped_exports_are_rejected() {
    let _log = common::test_log("e2e_swapped_exports_are_rejected");
    let workspace = FsWorkspace::new();
    write_base_scenario(&workspace);

    let run = run_formsync(
        &workspace,
        ["report", "--source-forms", "source_questions_bank.json"],
        "swapped_exports",
    );
    assert_eq!(run.code(), Some(2), "stderr: {}", run.stderr);

    let error = run.error();
    assert_eq!(error["code"], "INVALID_SHAPE");
    assert_eq!(error["context"]["collection"], "source forms");
    assert_eq!(error["context"]["index"], 0);
}

#[test]
fn e2e_invalid_json_input() {
    let _log = common::test_log("e2e_invalid_json_input");
    let workspace = FsWorkspace::new();
    write_base_scenario(&workspace);
    workspace.write("target_questions_bank.json", "[{\"id\": 101,");

    let run = run_formsync(&workspace, ["report"], "invalid_json");
    assert_eq!(run.code(), Some(8), "stderr: {}", run.stderr);
    assert_eq!(run.error()["code"], "JSON_ERROR");
}

#[test]
fn e2e_target_form_with_fewer_questions() {
    let _log = common::test_log("e2e_target_form_with_fewer_questions");
    let workspace = FsWorkspace::new();
    write_base_scenario(&workspace);
    let mut forms = common::fixtures::target_forms();
    forms[0]["question_ids"] = json!([101, 102]);
    workspace.write_json("target_forms_library.json", &forms);

    let run = run_formsync(&workspace, ["sync"], "count_mismatch");
    assert_eq!(run.code(), Some(2), "stderr: {}", run.stderr);

    let error = run.error();
    assert_eq!(error["code"], "QUESTION_COUNT_MISMATCH");
    assert_eq!(error["context"]["form"], "Intake");
    assert_eq!(workspace.read(WORKFLOW), WORKFLOW_TEXT);
}

#[test]
fn e2e_ambiguous_target_questions() {
    let _log = common::test_log("e2e_ambiguous_target_questions");
    let workspace = FsWorkspace::new();
    write_base_scenario(&workspace);

    // Target Intake lists an extra copy of "Full name" ahead of the real one,
    // so the positional candidate fails and two content matches remain.
    let mut questions = common::fixtures::target_questions();
    questions
        .as_array_mut()
        .expect("questions array")
        .push(json!({"id": 199, "label": "Full name", "question_type": "text"}));
    workspace.write_json("target_questions_bank.json", &questions);
    let mut forms = common::fixtures::target_forms();
    forms[0]["question_ids"] = json!([102, 199, 101, 103]);
    workspace.write_json("target_forms_library.json", &forms);

    let run = run_formsync(&workspace, ["report"], "ambiguous");
    assert_eq!(run.code(), Some(3), "stderr: {}", run.stderr);

    let error = run.error();
    assert_eq!(error["code"], "AMBIGUOUS_MATCH");
    assert_eq!(error["context"]["source_id"], 1);
    assert_eq!(error["context"]["candidates"], json!([199, 101]));
}

#[test]
fn e2e_error_carries_hint() {
    let _log = common::test_log("e2e_error_carries_hint");
    let workspace = FsWorkspace::new();

    // Captured stdout is not a terminal, so errors are structured.
    let run = run_formsync(&workspace, ["sync"], "error_hint");
    assert!(!run.status.success());
    assert!(run.stderr.contains("Missing required file"));
    assert!(run.stderr.contains("\"hint\""));
}

#[test]
fn e2e_project_config_sets_paths() {
    let _log = common::test_log("e2e_project_config_sets_paths");
    let workspace = FsWorkspace::new();
    write_base_scenario(&workspace);
    workspace.write("flow.json", WORKFLOW_TEXT);
    workspace.write("formsync.yaml", "target_workflow: flow.json\n");

    let run = run_formsync(&workspace, ["sync", "--json"], "project_config");
    assert!(run.status.success(), "sync failed: {}", run.stderr);
    assert_eq!(run.json()["workflow"], "flow.json");
    assert_eq!(workspace.read(WORKFLOW), WORKFLOW_TEXT);
    assert_ne!(workspace.read("flow.json"), WORKFLOW_TEXT);
}

#[test]
fn e2e_env_overrides_project_config_and_flags_override_env() {
    let _log = common::test_log("e2e_env_overrides_project_config_and_flags_override_env");
    let workspace = FsWorkspace::new();
    write_base_scenario(&workspace);
    workspace.write("formsync.yaml", "target_workflow: from_yaml.json\n");
    workspace.write("from_env.json", WORKFLOW_TEXT);
    workspace.write("from_flag.json", WORKFLOW_TEXT);

    let env_run = run_formsync_with_env(
        &workspace,
        ["sync", "--dry-run", "--json"],
        [("FORMSYNC_TARGET_WORKFLOW", "from_env.json")],
        "env_override",
    );
    assert!(env_run.status.success(), "sync failed: {}", env_run.stderr);
    assert_eq!(env_run.json()["workflow"], "from_env.json");

    let flag_run = run_formsync_with_env(
        &workspace,
        [
            "sync",
            "--dry-run",
            "--json",
            "--target-workflow",
            "from_flag.json",
        ],
        [("FORMSYNC_TARGET_WORKFLOW", "from_env.json")],
        "flag_override",
    );
    assert!(flag_run.status.success(), "sync failed: {}", flag_run.stderr);
    assert_eq!(flag_run.json()["workflow"], "from_flag.json");
}

#[test]
fn e2e_explicit_config_must_exist() {
    let _log = common::test_log("e2e_explicit_config_must_exist");
    let workspace = FsWorkspace::new();
    write_base_scenario(&workspace);

    let run = run_formsync(
        &workspace,
        ["report", "--config", "nowhere.yaml"],
        "explicit_config",
    );
    assert_eq!(run.code(), Some(8), "stderr: {}", run.stderr);
    assert_eq!(run.error()["code"], "FILE_NOT_FOUND");
}

#[test]
fn e2e_invalid_boolean_config() {
    let _log = common::test_log("e2e_invalid_boolean_config");
    let workspace = FsWorkspace::new();
    write_base_scenario(&workspace);
    workspace.write("formsync.yaml", "allow_missing: perhaps\n");

    let run = run_formsync(&workspace, ["sync"], "invalid_boolean");
    assert_eq!(run.code(), Some(7), "stderr: {}", run.stderr);
    assert_eq!(run.error()["code"], "CONFIG_ERROR");
}

#[test]
fn e2e_completions() {
    let _log = common::test_log("e2e_completions");
    let workspace = FsWorkspace::new();

    let run = run_formsync(&workspace, ["completions", "bash"], "completions");
    assert!(run.status.success(), "completions failed: {}", run.stderr);
    assert!(run.stdout.contains("formsync"));
    assert!(run.stdout.contains("sync"));
}

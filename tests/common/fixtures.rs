//! Export fixtures shared by the end-to-end tests.
//!
//! The base scenario has two forms per side, "Intake" and "Exit", whose
//! questions were copied from source to target and renumbered:
//!
//! | source | target |
//! |--------|--------|
//! | form 10 | form 20 |
//! | form 11 | form 21 |
//! | questions 1..=4 | questions 101..=104 |

use super::cli::FsWorkspace;
use serde_json::{Value, json};

pub const WORKFLOW: &str = "target_workflow_config.json";
pub const UPDATED_FORMS: &str = "Updated_target_forms_library.json";
pub const UPDATED_QUESTIONS: &str = "Updated_target_questions_bank.json";
pub const PROFILE: &str = "target_profile_display.json";

/// Workflow written with deliberate, non-canonical formatting.
pub const WORKFLOW_TEXT: &str = r#"{
  "name": "Onboarding",
  "steps": [
    { "form_id": 10,   "question_ids": [1, "2"] },
    {
      "form_id": 11,
      "message": "Ask {{answer<3>}} then 4",
      "conditions": { "4": "yes" }
    }
  ]
}
"#;

/// `WORKFLOW_TEXT` with only the IDs changed.
pub const WORKFLOW_EXPECTED: &str = r#"{
  "name": "Onboarding",
  "steps": [
    { "form_id": 20,   "question_ids": [101, "102"] },
    {
      "form_id": 21,
      "message": "Ask {{answer<103>}} then 104",
      "conditions": { "104": "yes" }
    }
  ]
}
"#;

pub fn source_forms() -> Value {
    json!([
        {"id": 10, "display_name": "Intake", "question_ids": [1, 2, 3]},
        {"id": 11, "display_name": "Exit", "data_json": {"question_ids": [4]}}
    ])
}

pub fn target_forms() -> Value {
    json!([
        {
            "id": 20,
            "display_name": "Intake",
            "question_ids": [101, 102, 103],
            "rules": [{"show_if_question": 2}]
        },
        {"id": 21, "display_name": "Exit", "data_json": {"question_ids": [104]}}
    ])
}

fn question_bank(offset: u64) -> Value {
    json!([
        {"id": offset + 1, "label": "Full name", "question_type": "text"},
        {"id": offset + 2, "label": "Date of birth", "question_type": "date"},
        {
            "id": offset + 3,
            "label": "Consent",
            "question_type": "checkbox",
            "depends_on": 1
        },
        {"id": offset + 4, "label": "Reason for leaving", "question_type": "text"}
    ])
}

pub fn source_questions() -> Value {
    question_bank(0)
}

pub fn target_questions() -> Value {
    question_bank(100)
}

/// Write the four exports and the workflow under their default names.
pub fn write_base_scenario(workspace: &FsWorkspace) {
    workspace.write_json("source_forms_library.json", &source_forms());
    workspace.write_json("target_forms_library.json", &target_forms());
    workspace.write_json("source_questions_bank.json", &source_questions());
    workspace.write_json("target_questions_bank.json", &target_questions());
    workspace.write(WORKFLOW, WORKFLOW_TEXT);
}

/// Base scenario plus a source-only "Feedback" form whose question 5 has no
/// target counterpart.
pub fn write_unmatched_scenario(workspace: &FsWorkspace) {
    write_base_scenario(workspace);

    let mut forms = source_forms();
    forms
        .as_array_mut()
        .expect("forms array")
        .push(json!({"id": 12, "display_name": "Feedback", "question_ids": [5]}));
    workspace.write_json("source_forms_library.json", &forms);

    let mut questions = source_questions();
    questions
        .as_array_mut()
        .expect("questions array")
        .push(json!({"id": 5, "label": "Comments", "question_type": "textarea"}));
    workspace.write_json("source_questions_bank.json", &questions);

    let mut targets = target_forms();
    targets
        .as_array_mut()
        .expect("forms array")
        .push(json!({"id": 22, "display_name": "Feedback Form", "question_ids": []}));
    workspace.write_json("target_forms_library.json", &targets);
}

/// Field tables in both accepted shapes plus a profile to rewrite.
pub fn write_fields_scenario(workspace: &FsWorkspace) {
    workspace.write_json(
        "source_fields.json",
        &json!({"Employee Number": 501, "Start Date": 502, "Legacy Code": 503}),
    );
    workspace.write_json(
        "target_fields.json",
        &json!([
            {"Field Name": "Employee Number", "Field ID": "9001"},
            {"Field Name": "Start Date", "Field ID": 9002},
            {"Field Name": "Badge", "Field ID": 9003}
        ]),
    );
    workspace.write_json(
        PROFILE,
        &json!({
            "order": 501,
            "sections": [{
                "items": [
                    {"custom_field_id": 501, "label": "Employee"},
                    {"custom_field_id": "502"},
                    {"custom_field_id": 777}
                ]
            }]
        }),
    );
}

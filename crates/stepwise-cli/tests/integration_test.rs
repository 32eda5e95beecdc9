//! Fills in the first step across several invocations, the way a user
//! returning to the application would.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INTRODUCTION: &[(&str, &str)] = &[
    ("submitterName", "Jane Doe"),
    ("submitterFunction", "Compliance Officer"),
    ("submitterEmail", "jane@acme.example"),
    ("submitterPhone", "+971 4 000 0000"),
    ("instructionsConfirmed", "true"),
    ("disclosureAcknowledged", "true"),
    ("informationAccurate", "true"),
    ("authorizedToSubmit", "true"),
    ("difcaConsent", "true"),
];

fn stepwise_cmd(db_path: &Path) -> Command {
    let mut cmd = Command::cargo_bin("stepwise").expect("Failed to find stepwise binary");
    cmd.arg("--no-color").arg("--database-file").arg(db_path);
    cmd
}

fn answer_introduction(db_path: &Path) {
    for (path, value) in INTRODUCTION {
        stepwise_cmd(db_path)
            .args(["set", path, value])
            .assert()
            .success();
    }
}

#[test]
fn test_complete_first_step_across_invocations() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let db_path = temp_dir.path().join("drafts.db");

    answer_introduction(&db_path);

    stepwise_cmd(&db_path)
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Success: Step `step-1-1` is complete"));

    stepwise_cmd(&db_path)
        .arg("next")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Moved to step 2 of 13: Standing Data (`step-1-2`)",
        ));

    stepwise_cmd(&db_path)
        .arg("steps")
        .assert()
        .success()
        .stdout(predicate::str::contains("- ✓ 1. Introduction & Disclosure"))
        .stdout(predicate::str::contains("- ➤ 2. Standing Data (`step-1-2`)"))
        .stdout(predicate::str::contains("1 of 13 steps completed (8%)"));

    stepwise_cmd(&db_path)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("- **Progress**: 8%"))
        .stdout(predicate::str::contains("- **Last saved**: Saved"));
}

#[test]
fn test_navigate_back_and_forward_by_id() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let db_path = temp_dir.path().join("drafts.db");

    answer_introduction(&db_path);
    stepwise_cmd(&db_path).arg("next").assert().success();

    stepwise_cmd(&db_path)
        .arg("back")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Moved to step 1 of 13: Introduction & Disclosure (`step-1-1`)",
        ));

    stepwise_cmd(&db_path)
        .args(["goto", "step-1-2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved to step 2 of 13"));

    stepwise_cmd(&db_path)
        .args(["draft", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("`step-1-2` (position 2)"))
        .stdout(predicate::str::contains("- **Completed steps**: 1"));
}

#[test]
fn test_unknown_step_id_is_rejected() {
    let temp_dir = TempDir::new().expect("Failed to create temporary directory");
    let db_path = temp_dir.path().join("drafts.db");

    stepwise_cmd(&db_path)
        .args(["goto", "step-9-9"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Cannot navigate: Step 'step-9-9' is not applicable"));
}

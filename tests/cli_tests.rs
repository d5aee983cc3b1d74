use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains as str_contains;
use tempfile::{TempDir, tempdir};

#[allow(deprecated)]
fn run_cli_in(data_dir: &TempDir, script: &str) -> assert_cmd::assert::Assert {
    let mut cmd = Command::cargo_bin("cli").expect("cli binary");
    cmd.env("CLASS_SCHEDULE_DATA_DIR", data_dir.path())
        .env("CLASS_SCHEDULE_STORE", "file")
        .env("CLASS_SCHEDULE_LOG_LEVEL", "error")
        .env_remove("CLASS_SCHEDULE_CONFIG")
        .env_remove("CLASS_SCHEDULE_LOG_DIR")
        .write_stdin(script.to_string())
        .assert()
}

fn run_cli(script: &str) -> assert_cmd::assert::Assert {
    let dir = tempdir().expect("temp dir");
    run_cli_in(&dir, script)
}

#[test]
fn cli_starts_with_default_schedule() {
    run_cli("list\nquit\n")
        .success()
        .stdout(str_contains("My First Schedule"))
        .stdout(str_contains("no periods yet"));
}

#[test]
fn cli_rejects_inverted_period() {
    run_cli("add 09:00 08:00 Math\nshow\nquit\n")
        .success()
        .stdout(str_contains("End time must be after start time."))
        .stdout(str_contains("no periods yet"));
}

#[test]
fn cli_requires_a_period_name() {
    run_cli("add 08:00 09:00\nquit\n")
        .success()
        .stdout(str_contains("All fields are required."));
}

#[test]
fn cli_add_suggest_and_warn_on_overlap() {
    run_cli("add 08:00 09:00 Math\nsuggest\nadd 08:30 09:30 Art\nquit\n")
        .success()
        .stdout(str_contains("Added Math (8:00 AM - 9:00 AM)."))
        .stdout(str_contains("Suggested next period: 09:00 - 10:00"))
        .stdout(str_contains("Warning: Math (8:00 AM - 9:00 AM) overlaps Art"));
}

#[test]
fn cli_suggestion_follows_the_period_just_added() {
    run_cli("suggest\nadd 13:00 14:00 Lunch\nadd 08:00 09:00 Math\nsuggest\nquit\n")
        .success()
        .stdout(str_contains("Suggested next period: 08:00 - 09:00"))
        .stdout(str_contains("Suggested next period: 09:00 - 10:00"))
        .stdout(str_contains("Suggested next period: 14:00 - 15:00").not());
}

#[test]
fn cli_deleting_last_schedule_reseeds_default() {
    run_cli("schedule rename 1 Fall\nschedule delete 1\ny\nlist\nquit\n")
        .success()
        .stdout(str_contains("Deleted \"Fall\". Selected \"My First Schedule\"."));
}

#[test]
fn cli_schedule_delete_needs_confirmation() {
    let assert = run_cli(
        "schedule add Spring\nschedule delete 2\nn\nlist\nschedule delete 2\ny\nlist\nquit\n",
    )
    .success()
    .stdout(str_contains("Delete cancelled."))
    .stdout(str_contains("Deleted \"Spring\". Selected \"My First Schedule\"."));
    let output = String::from_utf8_lossy(&assert.get_output().stdout);
    let after_delete = output.split("Deleted \"Spring\"").last().unwrap_or_default();
    assert!(
        !after_delete.contains("| Spring"),
        "deleted schedule should not be listed:\n{after_delete}"
    );
}

#[test]
fn cli_edits_agenda_and_deletes_period() {
    run_cli("add 08:00 09:00 Math\nagenda 1 Chapter 4\nshow\ndelete 1\nshow\nquit\n")
        .success()
        .stdout(str_contains("Chapter 4"))
        .stdout(str_contains("Period deleted."));
}

#[test]
fn cli_changes_persist_between_runs() {
    let dir = tempdir().unwrap();
    run_cli_in(&dir, "schedule rename 1 Homeroom\nadd 10:00 11:00 History\nquit\n")
        .success()
        .stdout(str_contains("Schedule renamed to \"Homeroom\"."));
    run_cli_in(&dir, "list\nshow\nquit\n")
        .success()
        .stdout(str_contains("Homeroom"))
        .stdout(str_contains("History"));
}

#[test]
fn cli_export_and_import_json() {
    let data = tempdir().unwrap();
    let out = tempdir().unwrap();
    let script = format!(
        "add 08:00 09:00 Math\nexport json {}\nquit\n",
        out.path().display()
    );
    run_cli_in(&data, &script)
        .success()
        .stdout(str_contains("Schedule exported to"));

    let exported = std::fs::read_dir(out.path())
        .unwrap()
        .next()
        .expect("export file")
        .unwrap()
        .path();
    let script = format!("import json {}\nlist\nquit\n", exported.display());
    run_cli_in(&data, &script)
        .success()
        .stdout(str_contains("Imported \"My First Schedule (Imported)\" with 1 period(s)."));
}

#[test]
fn cli_status_reports_clock_and_schedule() {
    run_cli("status\nwatch 1\nquit\n")
        .success()
        .stdout(str_contains("Schedule: My First Schedule"));
}

#[test]
fn cli_unknown_command() {
    run_cli("frobnicate\nquit\n")
        .success()
        .stdout(str_contains("Unknown command. Type 'help'."));
}

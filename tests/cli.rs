#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const ROSTER: &str = r#"{
  "horizon": { "start": "2025-03-10", "days": 4 },
  "staff": [
    { "id": "ana", "seniority": "senior", "preferred_shifts": [ { "day": 1, "shift": "Night", "weight": 2 } ] },
    { "id": "bea", "seniority": "senior" },
    { "id": "cyr", "seniority": "senior" },
    { "id": "dan", "seniority": "senior" },
    { "id": "eli", "seniority": "junior", "preferred_days_off": [ { "day": 0, "weight": 3 } ] }
  ]
}"#;

fn cli(roster: &Path) -> Command {
    let mut cmd = Command::cargo_bin("garde-cli").unwrap();
    cmd.arg("--roster").arg(roster);
    cmd
}

#[test]
fn solve_then_check_and_score() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("roster.json");
    fs::write(&roster, ROSTER).unwrap();
    let out = dir.path().join("schedule.json");
    let csv = dir.path().join("schedule.csv");
    let report = dir.path().join("report.json");

    cli(&roster)
        .args(["solve", "--max-iterations", "30", "--out"])
        .arg(&out)
        .arg("--csv")
        .arg(&csv)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: score"));

    let report: serde_json::Value = serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(report["status"], "success");
    assert!(fs::read_to_string(&csv)
        .unwrap()
        .starts_with("staff_id,date,shift,time_range"));

    cli(&roster)
        .arg("check")
        .arg("--schedule")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: no violations"));

    cli(&roster)
        .arg("score")
        .arg("--schedule")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"satisfaction\""));
}

#[test]
fn check_flags_broken_schedule() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("roster.json");
    fs::write(&roster, ROSTER).unwrap();
    let schedule = dir.path().join("bad.json");
    fs::write(
        &schedule,
        r#"{ "eli": { "2025-03-10": "Night", "2025-03-11": "Morning" } }"#,
    )
    .unwrap();
    let report = dir.path().join("violations.csv");

    cli(&roster)
        .arg("check")
        .arg("--schedule")
        .arg(&schedule)
        .arg("--report")
        .arg(&report)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("rest_rule"));

    let csv = fs::read_to_string(&report).unwrap();
    assert!(csv.starts_with("kind,date,shift,staff_id,detail"));
    assert!(csv.contains("seniority_mix"));
}

#[test]
fn infeasible_roster_exits_with_code_two() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("roster.json");
    fs::write(
        &roster,
        r#"{ "horizon": { "start": "2025-03-10" }, "staff": [ { "id": "solo", "seniority": "senior" } ] }"#,
    )
    .unwrap();

    cli(&roster)
        .arg("solve")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Infeasible").and(predicate::str::contains("coverage_shortfall")));
}

#[test]
fn import_staff_creates_roster() {
    let dir = tempdir().unwrap();
    let roster = dir.path().join("roster.json");
    let staff = dir.path().join("staff.csv");
    fs::write(&staff, "id,seniority,name\nana,senior,Ana\neli,junior,\n").unwrap();

    cli(&roster)
        .args(["import-staff", "--start", "2025-03-10", "--days", "5", "--csv"])
        .arg(&staff)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 staff"));

    let saved = garde::io::load_roster_json(&roster).unwrap();
    assert_eq!(saved.horizon.days, 5);
    assert_eq!(saved.staff.len(), 2);

    // Un second import des mêmes identifiants est refusé.
    cli(&roster)
        .args(["import-staff", "--csv"])
        .arg(&staff)
        .assert()
        .failure()
        .stderr(predicate::str::contains("duplicate staff id"));
}

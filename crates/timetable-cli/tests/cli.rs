use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;

/// A fresh scratch directory per test under the system temp dir.
fn scratch(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "timetable-cli-{}-{}",
        std::process::id(),
        name
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn write(dir: &Path, file: &str, json: serde_json::Value) -> String {
    let path = dir.join(file);
    fs::write(&path, json.to_string()).unwrap();
    path.to_string_lossy().into_owned()
}

fn slot_json(teacher: &str, day: u8, start: &str, end: &str, room: &str) -> serde_json::Value {
    serde_json::json!({
        "timetableId": "tt-1",
        "unitId": "CS101",
        "teacherId": teacher,
        "dayOfWeek": day,
        "startTime": start,
        "endTime": end,
        "venue": { "building": "B", "room": room, "capacity": 60 },
    })
}

fn timetable(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("timetable").unwrap();
    cmd.arg("--store").arg(dir.join("store.json"));
    cmd
}

fn stdout_json(output: &[u8]) -> serde_json::Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn test_create_then_list() {
    let dir = scratch("create-list");
    let a = write(&dir, "a.json", slot_json("T1", 1, "09:00", "10:00", "101"));

    let out = timetable(&dir).args(["create", &a]).output().unwrap();
    assert!(out.status.success());
    let created = stdout_json(&out.stdout);
    assert_eq!(created["id"], "slot-1");
    assert_eq!(created["startTime"], "09:00");

    let out = timetable(&dir).arg("list").output().unwrap();
    assert!(out.status.success());
    let listed = stdout_json(&out.stdout);
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[test]
fn test_create_conflict_prints_report_and_fails() {
    let dir = scratch("create-conflict");
    let a = write(&dir, "a.json", slot_json("T1", 1, "09:00", "10:00", "101"));
    let c = write(&dir, "c.json", slot_json("T2", 1, "09:00", "10:00", "101"));

    timetable(&dir).args(["create", &a]).assert().success();
    timetable(&dir)
        .args(["create", &c])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Venue is already booked at this time"))
        .stdout(predicate::str::contains("\"conflictingSlotId\": \"slot-1\""))
        .stderr(predicate::str::contains("Scheduling conflict"));

    let out = timetable(&dir).arg("list").output().unwrap();
    assert_eq!(stdout_json(&out.stdout).as_array().unwrap().len(), 1);
}

#[test]
fn test_check_does_not_store() {
    let dir = scratch("check");
    let a = write(&dir, "a.json", slot_json("T1", 1, "09:00", "10:00", "101"));

    timetable(&dir)
        .args(["check", &a])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"teacher\": false"));
    assert!(!dir.join("store.json").exists());
}

#[test]
fn test_check_from_stdin_reports_teacher_conflict() {
    let dir = scratch("check-stdin");
    let a = write(&dir, "a.json", slot_json("T1", 1, "09:00", "10:00", "101"));
    timetable(&dir).args(["create", &a]).assert().success();

    timetable(&dir)
        .args(["check", "-"])
        .write_stdin(slot_json("T1", 1, "09:30", "10:30", "102").to_string())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"teacher\": true"))
        .stdout(predicate::str::contains("\"venue\": false"));
}

#[test]
fn test_move_keeps_duration() {
    let dir = scratch("move");
    let a = write(&dir, "a.json", slot_json("T1", 1, "09:00", "10:30", "101"));
    timetable(&dir).args(["create", &a]).assert().success();

    let out = timetable(&dir)
        .args(["move", "slot-1", "--day", "tue", "--start", "13:00"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let moved = stdout_json(&out.stdout);
    assert_eq!(moved["dayOfWeek"], 2);
    assert_eq!(moved["endTime"], "14:30");
}

#[test]
fn test_move_dry_run_leaves_store_alone() {
    let dir = scratch("move-dry-run");
    let a = write(&dir, "a.json", slot_json("T1", 1, "09:00", "10:00", "101"));
    let b = write(&dir, "b.json", slot_json("T2", 2, "09:00", "10:00", "101"));
    timetable(&dir).args(["create", &a]).assert().success();
    timetable(&dir).args(["create", &b]).assert().success();

    timetable(&dir)
        .args(["move", "slot-1", "--day", "2", "--start", "09:00", "--dry-run"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"venue\": true"));

    let out = timetable(&dir).arg("list").output().unwrap();
    let listed = stdout_json(&out.stdout);
    assert_eq!(listed[0]["dayOfWeek"], 1);
}

#[test]
fn test_update_with_patch_file() {
    let dir = scratch("update");
    let a = write(&dir, "a.json", slot_json("T1", 1, "09:00", "10:00", "101"));
    let patch = write(&dir, "patch.json", serde_json::json!({ "isOnline": true }));
    timetable(&dir).args(["create", &a]).assert().success();

    let out = timetable(&dir)
        .args(["update", "slot-1", &patch])
        .output()
        .unwrap();
    assert!(out.status.success());
    let updated = stdout_json(&out.stdout);
    assert_eq!(updated["isOnline"], true);
    assert!(updated.get("venue").is_none());
}

#[test]
fn test_unknown_slot_is_an_error() {
    let dir = scratch("not-found");
    timetable(&dir)
        .args(["delete", "slot-9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Slot not found: slot-9"));
}

#[test]
fn test_sunday_is_rejected() {
    let dir = scratch("sunday");
    timetable(&dir)
        .args(["move", "slot-1", "--day", "sunday", "--start", "09:00"])
        .assert()
        .failure();
}

#[test]
fn test_config_window_rejects_early_slot() {
    let dir = scratch("config");
    let config = write(&dir, "config.json", serde_json::json!({ "opensAt": "08:00" }));
    let early = write(&dir, "early.json", slot_json("T1", 1, "07:00", "08:00", "101"));

    timetable(&dir)
        .args(["--config", &config, "create", &early])
        .assert()
        .failure()
        .stderr(predicate::str::contains("before opening time 08:00"));
}

#[test]
fn test_audit_flags_stored_double_booking() {
    let dir = scratch("audit");
    let store = serde_json::json!([
        { "id": "x", "timetableId": "tt-1", "unitId": "U1", "teacherId": "T1",
          "dayOfWeek": 3, "startTime": "10:00", "endTime": "11:00",
          "venue": { "building": "B", "room": "101" } },
        { "id": "y", "timetableId": "tt-1", "unitId": "U2", "teacherId": "T2",
          "dayOfWeek": 3, "startTime": "10:30", "endTime": "11:30",
          "venue": { "building": "B", "room": "101" } }
    ]);
    write(&dir, "store.json", store);

    timetable(&dir)
        .args(["audit", "tt-1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"firstSlotId\": \"x\""))
        .stdout(predicate::str::contains("\"secondSlotId\": \"y\""));
}

#[test]
fn test_audit_flags_room_taken_by_another_timetable() {
    let dir = scratch("audit-cross");
    let store = serde_json::json!([
        { "id": "x", "timetableId": "tt-1", "unitId": "U1", "teacherId": "T1",
          "dayOfWeek": 1, "startTime": "09:00", "endTime": "10:00",
          "venue": { "building": "B", "room": "101" } },
        { "id": "y", "timetableId": "tt-2", "unitId": "U2", "teacherId": "T2",
          "dayOfWeek": 1, "startTime": "09:30", "endTime": "10:30",
          "venue": { "building": "B", "room": "101" } }
    ]);
    write(&dir, "store.json", store);

    timetable(&dir)
        .args(["audit", "tt-1"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"type\": \"venue\""))
        .stdout(predicate::str::contains("\"secondSlotId\": \"y\""));
}

#[test]
fn test_malformed_store_is_loaded_with_warnings() {
    let dir = scratch("malformed-store");
    let store = serde_json::json!([
        { "id": "x", "timetableId": "tt-1", "unitId": "U1", "teacherId": "T1",
          "dayOfWeek": 1, "startTime": "09:00", "endTime": "10:00", "isOnline": true,
          "venue": { "building": "B", "room": "101" } },
        { "id": "x", "timetableId": "tt-1", "unitId": "U1", "teacherId": "T1",
          "dayOfWeek": 2, "startTime": "09:00", "endTime": "10:00",
          "venue": { "building": "B", "room": "101" } }
    ]);
    write(&dir, "store.json", store);

    timetable(&dir)
        .env_remove("RUST_LOG")
        .arg("list")
        .assert()
        .success()
        .stderr(predicate::str::contains("stored slot is malformed"))
        .stderr(predicate::str::contains("an online slot cannot have a venue"))
        .stderr(predicate::str::contains("duplicate slot id in store"));
}

mod test_support;

use serde_json::json;
use std::io::BufReader;
use std::process::{ChildStdin, ChildStdout};
use test_support::{request_ok, spawn_sidecar, str_field, temp_dir};

fn open_fresh_class(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &std::path::Path,
) -> (String, String) {
    let _ = request_ok(
        stdin,
        reader,
        "open",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let created = request_ok(
        stdin,
        reader,
        "class",
        "classes.create",
        json!({ "name": "Conciencia Histórica 2" }),
    );
    let class_id = str_field(&created, "/class/id");
    let block_id = str_field(&created, "/class/blocks/0/id");
    let _ = request_ok(
        stdin,
        reader,
        "assignment",
        "assignments.create",
        json!({ "classId": class_id, "name": "Ensayo", "weight": 10, "blockId": block_id }),
    );
    let s = request_ok(
        stdin,
        reader,
        "student",
        "students.create",
        json!({ "classId": class_id, "name": "Díaz, Eduardo" }),
    );
    (class_id, str_field(&s, "/student/id"))
}

fn reasons(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    class_id: &str,
    student_id: &str,
) -> serde_json::Value {
    let risk = request_ok(
        stdin,
        reader,
        id,
        "analytics.studentRisk",
        json!({ "classId": class_id, "studentId": student_id }),
    );
    risk["student"]["riskReasons"].clone()
}

#[test]
fn absences_alone_flag_an_ungraded_student() {
    let workspace = temp_dir("maestro-risk-absences");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let (class_id, student_id) = open_fresh_class(&mut stdin, &mut reader, &workspace);

    for day in 1..=5 {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("att{day}"),
            "attendance.update",
            json!({
                "classId": class_id,
                "studentId": student_id,
                "date": format!("2025-09-0{day}"),
                "status": "absent"
            }),
        );
    }

    let r = reasons(&mut stdin, &mut reader, "r1", &class_id, &student_id);
    assert_eq!(r, json!(["highAbsences"]));

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "sum",
        "analytics.classSummary",
        json!({ "classId": class_id }),
    );
    assert_eq!(summary["summary"]["atRiskCount"], json!(1));
    assert_eq!(summary["summary"]["classAverage"], json!(0.0));
    assert_eq!(summary["summary"]["perStudent"][0]["absences"], json!(5));
    assert_eq!(summary["summary"]["perStudent"][0]["band"], json!("unset"));

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn tightening_the_conduct_threshold_flags_the_student() {
    let workspace = temp_dir("maestro-risk-conduct");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let (class_id, student_id) = open_fresh_class(&mut stdin, &mut reader, &workspace);

    for (i, points) in [-1, -2].iter().enumerate() {
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            &format!("c{i}"),
            "conduct.add",
            json!({
                "classId": class_id,
                "studentId": student_id,
                "type": "negative",
                "category": "Tardiness",
                "comment": "Llegó tarde.",
                "points": points
            }),
        );
    }
    let log = request_ok(
        &mut stdin,
        &mut reader,
        "log",
        "conduct.list",
        json!({ "classId": class_id, "studentId": student_id }),
    );
    assert_eq!(log["totalPoints"], json!(-3));
    assert_eq!(log["entries"][0]["points"], json!(-2));

    assert_eq!(
        reasons(&mut stdin, &mut reader, "r1", &class_id, &student_id),
        json!([])
    );

    let settings = request_ok(
        &mut stdin,
        &mut reader,
        "set",
        "classes.updateSettings",
        json!({ "classId": class_id, "atRiskThresholds": { "negConduct": -2 } }),
    );
    assert_eq!(settings["atRiskThresholds"]["negConduct"], json!(-2.0));
    assert_eq!(settings["atRiskThresholds"]["highAbsences"], json!(3.0));
    assert_eq!(settings["gradeThresholds"]["satisfactory"], json!(8.0));

    assert_eq!(
        reasons(&mut stdin, &mut reader, "r2", &class_id, &student_id),
        json!(["negativeConduct"])
    );

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn seeded_struggling_student_has_every_reason() {
    let workspace = temp_dir("maestro-risk-seed");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let r = reasons(&mut stdin, &mut reader, "2", "1", "3");
    assert_eq!(r, json!(["lowGrade", "highAbsences", "negativeConduct"]));

    let list = request_ok(&mut stdin, &mut reader, "3", "classes.list", json!({}));
    let history = &list["classes"][0];
    assert_eq!(history["id"], json!("1"));
    assert!(history["atRiskCount"].as_u64().unwrap_or(0) >= 1);

    let _ = std::fs::remove_dir_all(workspace);
}

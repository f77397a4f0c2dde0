mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, str_field, temp_dir};

fn names(list: &serde_json::Value) -> Vec<String> {
    list["students"]
        .as_array()
        .expect("students")
        .iter()
        .filter_map(|s| s["name"].as_str().map(|n| n.to_string()))
        .collect()
}

#[test]
fn imports_skip_blank_lines_and_keep_accent_insensitive_order() {
    let workspace = temp_dir("maestro-students-import");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "Inglés 2" }),
    );
    let class_id = str_field(&created, "/class/id");

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.import",
        json!({ "classId": class_id, "text": "Ortiz, Luis\n\n   \nÁvila, Rosa\n" }),
    );
    assert_eq!(first["created"], json!(2));

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "students.import",
        json!({ "classId": class_id, "names": ["Zamora, Iván", "  avendaño, Pablo  ", "Núñez, Elena"] }),
    );
    assert_eq!(second["created"], json!(3));
    assert_eq!(second["studentIds"].as_array().map(|a| a.len()), Some(3));

    let list = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({ "classId": class_id }));
    assert_eq!(
        names(&list),
        vec![
            "avendaño, Pablo",
            "Ávila, Rosa",
            "Núñez, Elena",
            "Ortiz, Luis",
            "Zamora, Iván",
        ]
    );
    assert_eq!(list["students"][4]["sortOrder"], json!(4));

    // Renames keep their slot until the next insertion.
    let ortiz = str_field(&list, "/students/3/id");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.update",
        json!({ "classId": class_id, "studentId": ortiz, "name": "Aguilar, Luis" }),
    );
    let list = request_ok(&mut stdin, &mut reader, "7", "students.list", json!({ "classId": class_id }));
    assert_eq!(names(&list)[3], "Aguilar, Luis");

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "students.create",
        json!({ "classId": class_id, "name": "Méndez, Jorge" }),
    );
    let list = request_ok(&mut stdin, &mut reader, "9", "students.list", json!({ "classId": class_id }));
    assert_eq!(names(&list)[0], "Aguilar, Luis");
    assert_eq!(names(&list).len(), 6);

    let code = request_err(
        &mut stdin,
        &mut reader,
        "10",
        "students.create",
        json!({ "classId": class_id, "name": "   " }),
    );
    assert_eq!(code, "bad_params");
    let code = request_err(
        &mut stdin,
        &mut reader,
        "11",
        "students.import",
        json!({ "classId": "missing", "names": ["A"] }),
    );
    assert_eq!(code, "not_found");

    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn deleting_a_student_takes_their_records_along() {
    let workspace = temp_dir("maestro-students-delete");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let before = request_ok(&mut stdin, &mut reader, "2", "students.list", json!({ "classId": "1" }));
    assert_eq!(names(&before).len(), 5);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "students.delete",
        json!({ "classId": "1", "studentId": "3" }),
    );
    let code = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "analytics.studentRisk",
        json!({ "classId": "1", "studentId": "3" }),
    );
    assert_eq!(code, "not_found");
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "analytics.classSummary",
        json!({ "classId": "1" }),
    );
    assert_eq!(summary["summary"]["perStudent"].as_array().map(|a| a.len()), Some(4));

    let code = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "students.delete",
        json!({ "classId": "1", "studentId": "3" }),
    );
    assert_eq!(code, "not_found");

    let _ = std::fs::remove_dir_all(workspace);
}

use crate::error::RepoError;
use crate::model::ClassRecord;
use anyhow::Context;
use chrono::NaiveDate;
use serde_json::Value;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub class_count: usize,
    pub byte_count: usize,
}

pub fn default_export_file_name(day: NaiveDate) -> String {
    format!("maestro-export-{}.json", day.format("%Y-%m-%d"))
}

/// Writes the whole collection as pretty JSON. The target is replaced only
/// once the new content is fully on disk.
pub fn export_classes_json(classes: &[ClassRecord], out_path: &Path) -> anyhow::Result<ExportSummary> {
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }

    let text = serde_json::to_string_pretty(classes).context("failed to serialize classes")?;

    let tmp_path = out_path.with_extension("json.exporting");
    {
        let mut f = std::fs::File::create(&tmp_path).with_context(|| {
            format!("failed to create output file {}", tmp_path.to_string_lossy())
        })?;
        f.write_all(text.as_bytes())
            .context("failed to write export")?;
        f.flush().context("failed to flush export")?;
    }
    std::fs::rename(&tmp_path, out_path).with_context(|| {
        format!("failed to move export to {}", out_path.to_string_lossy())
    })?;

    Ok(ExportSummary {
        class_count: classes.len(),
        byte_count: text.len(),
    })
}

pub fn read_import_file(in_path: &Path) -> Result<Vec<ClassRecord>, RepoError> {
    let text = std::fs::read_to_string(in_path)
        .with_context(|| format!("failed to read {}", in_path.to_string_lossy()))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| RepoError::ImportFormat(format!("not valid JSON: {e}")))?;
    parse_import_payload(value)
}

fn is_truthy(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

/// Validates a backup document before it may replace the collection.
///
/// Must be an array of class objects, each with a non-empty `id` and `name`.
pub fn parse_import_payload(value: Value) -> Result<Vec<ClassRecord>, RepoError> {
    let Some(items) = value.as_array() else {
        return Err(RepoError::ImportFormat(
            "expected an array of classes".to_string(),
        ));
    };
    for (i, item) in items.iter().enumerate() {
        if !item.is_object() {
            return Err(RepoError::ImportFormat(format!(
                "entry {i} is not an object"
            )));
        }
        if !is_truthy(item.get("id")) || !is_truthy(item.get("name")) {
            return Err(RepoError::ImportFormat(format!(
                "entry {i} is missing id or name"
            )));
        }
    }
    serde_json::from_value(value).map_err(|e| RepoError::ImportFormat(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> std::path::PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    #[test]
    fn export_file_name_uses_calendar_day() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 3).expect("date");
        assert_eq!(default_export_file_name(day), "maestro-export-2025-09-03.json");
    }

    #[test]
    fn export_then_read_back() {
        let dir = temp_dir("maestro-backup");
        let classes = crate::seed::initial_classes().expect("seed");
        let out = dir.join("nested").join("backup.json");

        let summary = export_classes_json(&classes, &out).expect("export");
        assert_eq!(summary.class_count, 3);
        assert!(summary.byte_count > 0);
        assert!(!dir.join("nested").join("backup.json.exporting").exists());

        let back = read_import_file(&out).expect("import");
        assert_eq!(back, classes);

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn rejects_malformed_payloads() {
        for bad in [
            json!({ "id": "c1", "name": "x" }),
            json!([{ "id": "c1" }]),
            json!([{ "id": "", "name": "Inglés" }]),
            json!([{ "id": 0, "name": "Inglés" }]),
            json!(["c1"]),
        ] {
            let e = parse_import_payload(bad.clone()).unwrap_err();
            assert_eq!(e.code(), "import_format", "{bad}");
        }
    }

    #[test]
    fn accepts_minimal_and_numeric_ids() {
        let classes = parse_import_payload(json!([
            { "id": 7, "name": "Química 1" },
            { "id": "c2", "name": "Física", "students": [] }
        ]))
        .expect("parse");
        assert_eq!(classes[0].id, "7");
        assert!(classes[0].blocks.is_empty());
        assert_eq!(classes[1].name, "Física");
        assert!(parse_import_payload(json!([])).expect("empty").is_empty());
    }

    #[test]
    fn invalid_json_file_is_import_format() {
        let dir = temp_dir("maestro-backup-bad");
        let p = dir.join("broken.json");
        std::fs::write(&p, "{ not json").expect("write");
        assert_eq!(read_import_file(&p).unwrap_err().code(), "import_format");
        assert_eq!(
            read_import_file(&dir.join("missing.json")).unwrap_err().code(),
            "persist_failed"
        );
        let _ = std::fs::remove_dir_all(dir);
    }
}

use crate::model::ClassRecord;
use anyhow::Context;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "maestro.sqlite3";
const CLASSES_KEY: &str = "classes";

/// Where the class collection lives between runs.
///
/// `save` always receives the complete collection; there is no merge.
pub trait ClassStore {
    fn load(&self) -> anyhow::Result<Option<Vec<ClassRecord>>>;
    fn save(&mut self, classes: &[ClassRecord]) -> anyhow::Result<()>;
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS app_state(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn state_get_text(conn: &Connection, key: &str) -> anyhow::Result<Option<String>> {
    let v = conn
        .query_row(
            "SELECT value_json FROM app_state WHERE key = ?",
            [key],
            |r| r.get::<_, String>(0),
        )
        .optional()?;
    Ok(v)
}

pub fn state_set_text(conn: &Connection, key: &str, value_json: &str) -> anyhow::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO app_state(key, value_json, updated_at) VALUES(?, ?, ?)
         ON CONFLICT(key) DO UPDATE SET
           value_json = excluded.value_json,
           updated_at = excluded.updated_at",
        (key, value_json, &now),
    )?;
    Ok(())
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(workspace: &Path) -> anyhow::Result<Self> {
        let conn = open_db(workspace)
            .with_context(|| format!("failed to open workspace {}", workspace.display()))?;
        Ok(Self { conn })
    }
}

impl ClassStore for SqliteStore {
    fn load(&self) -> anyhow::Result<Option<Vec<ClassRecord>>> {
        let Some(text) = state_get_text(&self.conn, CLASSES_KEY)? else {
            return Ok(None);
        };
        let classes: Vec<ClassRecord> =
            serde_json::from_str(&text).context("stored classes are not valid JSON")?;
        Ok(Some(classes))
    }

    fn save(&mut self, classes: &[ClassRecord]) -> anyhow::Result<()> {
        let text = serde_json::to_string(classes).context("failed to serialize classes")?;
        state_set_text(&self.conn, CLASSES_KEY, &text).context("failed to write classes")
    }
}

/// In-memory store for tests; can be told to fail saves.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub saved: Option<Vec<ClassRecord>>,
    pub save_count: usize,
    pub fail_saves: bool,
}

#[cfg(test)]
impl ClassStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<Vec<ClassRecord>>> {
        Ok(self.saved.clone())
    }

    fn save(&mut self, classes: &[ClassRecord]) -> anyhow::Result<()> {
        if self.fail_saves {
            anyhow::bail!("disk full");
        }
        self.saved = Some(classes.to_vec());
        self.save_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn empty_workspace_loads_nothing_then_round_trips() {
        let ws = temp_dir("maestro-db");
        let mut store = SqliteStore::open(&ws).expect("open");
        assert!(store.load().expect("load").is_none());

        let classes: Vec<ClassRecord> = serde_json::from_value(serde_json::json!([
            { "id": "c1", "name": "INGLÉS 1" }
        ]))
        .expect("classes");
        store.save(&classes).expect("save");
        store.save(&classes).expect("save again");

        let reopened = SqliteStore::open(&ws).expect("reopen");
        let loaded = reopened.load().expect("load").expect("some");
        assert_eq!(loaded, classes);
    }
}

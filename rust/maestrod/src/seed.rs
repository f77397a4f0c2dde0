use crate::model::ClassRecord;
use anyhow::Context;

const SEED_CLASSES_JSON: &str = include_str!("seed_classes.json");

/// Sample classes written to an empty workspace on first open.
pub fn initial_classes() -> anyhow::Result<Vec<ClassRecord>> {
    serde_json::from_str(SEED_CLASSES_JSON).context("built-in seed data is invalid")
}

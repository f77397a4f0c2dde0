use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Older exports carry numeric class/student ids; everything is a string here.
fn de_id<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(d)? {
        RawId::Text(s) => s,
        RawId::Int(n) => n.to_string(),
        RawId::Float(f) => f.to_string(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConductKind {
    Positive,
    Negative,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingPosition {
    #[serde(rename = "y")]
    pub row: u32,
    #[serde(rename = "x")]
    pub col: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatingChart {
    pub rows: u32,
    pub cols: u32,
}

impl Default for SeatingChart {
    fn default() -> Self {
        Self { rows: 5, cols: 6 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConductEntry {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// ISO-8601 timestamp (older data may carry a bare `YYYY-MM-DD`).
    pub date: String,
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "type")]
    pub kind: ConductKind,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    /// Sparse: a missing key means "not graded", never zero.
    #[serde(default)]
    pub grades: BTreeMap<String, f64>,
    #[serde(default)]
    pub attendance: BTreeMap<String, AttendanceStatus>,
    /// Newest first.
    #[serde(default)]
    pub conduct_log: Vec<ConductEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seating_position: Option<SeatingPosition>,
}

impl Student {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            grades: BTreeMap::new(),
            attendance: BTreeMap::new(),
            conduct_log: Vec::new(),
            seating_position: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    /// Percentage points; weights need not add up to 100.
    #[serde(default)]
    pub weight: f64,
    #[serde(deserialize_with = "de_id")]
    pub block_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlan {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// `YYYY-MM-DD`; at most one plan per date within a class.
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub activities: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeThresholds {
    /// Below this a grade is failing.
    pub needs_improvement: f64,
    /// Below this (and at/above `needs_improvement`) a grade is borderline.
    pub satisfactory: f64,
}

impl Default for GradeThresholds {
    fn default() -> Self {
        Self {
            needs_improvement: 6.0,
            satisfactory: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtRiskThresholds {
    pub low_grade: f64,
    pub high_absences: f64,
    /// Zero or negative; cumulative points at or below it flag the student.
    pub neg_conduct: f64,
}

impl Default for AtRiskThresholds {
    fn default() -> Self {
        Self {
            low_grade: 6.0,
            high_absences: 3.0,
            neg_conduct: -5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRecord {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub professor: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub assignments: Vec<Assignment>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub lesson_plans: Vec<LessonPlan>,
    #[serde(default)]
    pub grade_thresholds: GradeThresholds,
    #[serde(default)]
    pub at_risk_thresholds: AtRiskThresholds,
    #[serde(default)]
    pub seating_chart: SeatingChart,
}

impl ClassRecord {
    pub fn student(&self, student_id: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.id == student_id)
    }
}

// Request payloads.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassMeta {
    pub name: String,
    #[serde(default)]
    pub semester: String,
    #[serde(default)]
    pub professor: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssignment {
    pub name: String,
    #[serde(default)]
    pub weight: f64,
    pub block_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPatch {
    pub name: Option<String>,
    pub weight: Option<f64>,
    pub block_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewConductEntry {
    #[serde(default)]
    pub comment: String,
    #[serde(rename = "type")]
    pub kind: ConductKind,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub points: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonPlanInput {
    #[serde(default)]
    pub id: Option<String>,
    pub date: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default)]
    pub materials: String,
    #[serde(default)]
    pub activities: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeThresholdsPatch {
    pub needs_improvement: Option<f64>,
    pub satisfactory: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtRiskThresholdsPatch {
    pub low_grade: Option<f64>,
    pub high_absences: Option<f64>,
    pub neg_conduct: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSettingsPatch {
    pub grade_thresholds: Option<GradeThresholdsPatch>,
    pub at_risk_thresholds: Option<AtRiskThresholdsPatch>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSettings {
    pub grade_thresholds: GradeThresholds,
    pub at_risk_thresholds: AtRiskThresholds,
}

use crate::model::{
    Assignment, AtRiskThresholds, AttendanceStatus, ClassRecord, GradeThresholds, Student,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Fixed-point rounding to one decimal, half away from zero on the scaled
/// value: 3.55 becomes 3.6 even though its binary form sits just below the tie.
pub fn round_off_1_decimal(x: f64) -> f64 {
    (10.0 * x).round() / 10.0
}

fn effective_weight(a: &Assignment) -> f64 {
    if a.weight.is_nan() {
        0.0
    } else {
        a.weight
    }
}

fn finite_or_zero(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// Weighted average of a student's grades over the class assignments.
///
/// Only assignments that have a grade take part. When their weights add up to
/// zero the plain mean of every grade in the mapping is returned instead, and
/// that fallback is not rounded. Never returns a non-finite value.
pub fn weighted_average(grades: &BTreeMap<String, f64>, assignments: &[Assignment]) -> f64 {
    if assignments.is_empty() {
        return 0.0;
    }

    let relevant: Vec<(f64, f64)> = assignments
        .iter()
        .filter_map(|a| grades.get(&a.id).map(|g| (*g, effective_weight(a))))
        .collect();
    if relevant.is_empty() {
        return 0.0;
    }

    let total_weight: f64 = relevant.iter().map(|(_, w)| w).sum();
    if total_weight == 0.0 {
        if grades.is_empty() {
            return 0.0;
        }
        let sum: f64 = grades.values().sum();
        return finite_or_zero(sum / grades.len() as f64);
    }

    let weighted_sum: f64 = relevant.iter().map(|(g, w)| g * w).sum();
    let avg = weighted_sum / total_weight;
    if avg.is_finite() {
        round_off_1_decimal(avg)
    } else {
        0.0
    }
}

pub fn absence_count(student: &Student) -> usize {
    attendance_count(student, AttendanceStatus::Absent)
}

pub fn attendance_count(student: &Student, status: AttendanceStatus) -> usize {
    student
        .attendance
        .values()
        .filter(|s| **s == status)
        .count()
}

/// Sum of every conduct entry, positive and negative alike. Saturates at the
/// `i64` bounds.
pub fn conduct_points(student: &Student) -> i64 {
    student
        .conduct_log
        .iter()
        .fold(0i64, |acc, e| acc.saturating_add(e.points))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskReason {
    LowGrade,
    HighAbsences,
    NegativeConduct,
}

/// Every risk condition that currently holds for `student`.
///
/// A zero average means nothing has been graded yet and never counts as a
/// low grade.
pub fn at_risk_reasons(
    student: &Student,
    assignments: &[Assignment],
    thresholds: &AtRiskThresholds,
) -> BTreeSet<RiskReason> {
    let mut reasons = BTreeSet::new();

    let average = weighted_average(&student.grades, assignments);
    if average > 0.0 && average < thresholds.low_grade {
        reasons.insert(RiskReason::LowGrade);
    }
    if absence_count(student) as f64 >= thresholds.high_absences {
        reasons.insert(RiskReason::HighAbsences);
    }
    if conduct_points(student) as f64 <= thresholds.neg_conduct {
        reasons.insert(RiskReason::NegativeConduct);
    }

    reasons
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GradeBand {
    Unset,
    Fail,
    Satisfactory,
    Good,
}

/// Display band of a grade or average. A value equal to a threshold belongs to
/// the higher band.
pub fn classify(value: Option<f64>, thresholds: &GradeThresholds) -> GradeBand {
    let Some(v) = value.filter(|v| !v.is_nan()) else {
        return GradeBand::Unset;
    };
    if v < thresholds.needs_improvement {
        GradeBand::Fail
    } else if v < thresholds.satisfactory {
        GradeBand::Satisfactory
    } else {
        GradeBand::Good
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub student_id: String,
    pub name: String,
    pub average: f64,
    pub band: GradeBand,
    pub graded_count: usize,
    pub absences: usize,
    pub lates: usize,
    pub conduct_points: i64,
    pub risk_reasons: Vec<RiskReason>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentStats {
    pub assignment_id: String,
    pub name: String,
    pub block_id: String,
    pub weight: f64,
    pub mean: Option<f64>,
    pub graded_count: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandCounts {
    pub unset: usize,
    pub fail: usize,
    pub satisfactory: usize,
    pub good: usize,
}

impl BandCounts {
    fn add(&mut self, band: GradeBand) {
        match band {
            GradeBand::Unset => self.unset += 1,
            GradeBand::Fail => self.fail += 1,
            GradeBand::Satisfactory => self.satisfactory += 1,
            GradeBand::Good => self.good += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSummary {
    pub class_id: String,
    pub name: String,
    pub class_average: f64,
    pub at_risk_count: usize,
    pub band_counts: BandCounts,
    pub per_assignment: Vec<AssignmentStats>,
    pub per_student: Vec<StudentSummary>,
}

pub fn student_summary(class: &ClassRecord, student: &Student) -> StudentSummary {
    let average = weighted_average(&student.grades, &class.assignments);
    let graded_count = class
        .assignments
        .iter()
        .filter(|a| student.grades.contains_key(&a.id))
        .count();
    // An ungraded student has no band rather than a failing one.
    let band = if graded_count == 0 {
        GradeBand::Unset
    } else {
        classify(Some(average), &class.grade_thresholds)
    };
    StudentSummary {
        student_id: student.id.clone(),
        name: student.name.clone(),
        average,
        band,
        graded_count,
        absences: absence_count(student),
        lates: attendance_count(student, AttendanceStatus::Late),
        conduct_points: conduct_points(student),
        risk_reasons: at_risk_reasons(student, &class.assignments, &class.at_risk_thresholds)
            .into_iter()
            .collect(),
    }
}

/// Dashboard model for one class. Students keep their list order.
pub fn class_summary(class: &ClassRecord) -> ClassSummary {
    let per_student: Vec<StudentSummary> = class
        .students
        .iter()
        .map(|s| student_summary(class, s))
        .collect();

    let graded: Vec<f64> = per_student
        .iter()
        .filter(|s| s.graded_count > 0)
        .map(|s| s.average)
        .collect();
    let class_average = if graded.is_empty() {
        0.0
    } else {
        round_off_1_decimal(finite_or_zero(
            graded.iter().sum::<f64>() / graded.len() as f64,
        ))
    };

    let mut band_counts = BandCounts::default();
    for s in &per_student {
        band_counts.add(s.band);
    }

    let per_assignment = class
        .assignments
        .iter()
        .map(|a| {
            let values: Vec<f64> = class
                .students
                .iter()
                .filter_map(|s| s.grades.get(&a.id).copied())
                .collect();
            let mean = if values.is_empty() {
                None
            } else {
                Some(round_off_1_decimal(finite_or_zero(
                    values.iter().sum::<f64>() / values.len() as f64,
                )))
            };
            AssignmentStats {
                assignment_id: a.id.clone(),
                name: a.name.clone(),
                block_id: a.block_id.clone(),
                weight: a.weight,
                mean,
                graded_count: values.len(),
            }
        })
        .collect();

    ClassSummary {
        class_id: class.id.clone(),
        name: class.name.clone(),
        class_average,
        at_risk_count: per_student
            .iter()
            .filter(|s| !s.risk_reasons.is_empty())
            .count(),
        band_counts,
        per_assignment,
        per_student,
    }
}

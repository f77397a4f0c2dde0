use crate::db::ClassStore;
use crate::error::{RepoError, RepoResult};
use crate::model::{
    Assignment, AssignmentPatch, AttendanceStatus, Block, ClassMeta, ClassRecord, ClassSettings,
    ClassSettingsPatch, ConductEntry, LessonPlan, LessonPlanInput, NewAssignment,
    NewConductEntry, SeatingPosition, Student,
};
use crate::seed;
use chrono::{NaiveDate, SecondsFormat, Utc};
use tracing::{debug, info};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

const DEFAULT_BLOCK_NAME: &str = "BLOQUE 1";

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn required_name(raw: &str, what: &str) -> RepoResult<String> {
    let t = raw.trim();
    if t.is_empty() {
        return Err(RepoError::validation(format!("{what} must not be empty")));
    }
    Ok(t.to_string())
}

fn parse_date(raw: &str) -> RepoResult<String> {
    let t = raw.trim();
    NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| RepoError::validation(format!("date must be YYYY-MM-DD, got {t:?}")))
}

fn check_weight(weight: f64) -> RepoResult<f64> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(RepoError::validation(
            "weight must be a finite, non-negative number",
        ));
    }
    Ok(weight)
}

/// Accent- and case-insensitive key so that "Álvarez" sorts next to "Alvarez".
fn collation_key(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Ties break on accents first, then case with lowercase ahead of uppercase.
fn case_tiebreak_key(name: &str) -> String {
    name.chars()
        .flat_map(|c| {
            let swapped: Vec<char> = if c.is_uppercase() {
                c.to_lowercase().collect()
            } else {
                c.to_uppercase().collect()
            };
            swapped
        })
        .collect()
}

fn sort_students(students: &mut [Student]) {
    students.sort_by_cached_key(|s| {
        (
            collation_key(&s.name),
            s.name.to_lowercase(),
            case_tiebreak_key(&s.name),
        )
    });
}

fn student_mut<'a>(class: &'a mut ClassRecord, student_id: &str) -> RepoResult<&'a mut Student> {
    class
        .students
        .iter_mut()
        .find(|s| s.id == student_id)
        .ok_or_else(|| RepoError::not_found("student", student_id))
}

fn strip_grades(class: &mut ClassRecord, assignment_ids: &[String]) {
    for s in &mut class.students {
        for id in assignment_ids {
            s.grades.remove(id);
        }
    }
}

/// Owns the class collection. Every mutation works on a copy, persists the
/// whole copy, and only then replaces the in-memory state.
pub struct ClassRepository<S: ClassStore> {
    store: S,
    classes: Vec<ClassRecord>,
}

impl<S: ClassStore> ClassRepository<S> {
    /// Loads the collection, seeding (and persisting) the sample classes when
    /// the store is empty.
    pub fn open(mut store: S) -> RepoResult<Self> {
        let classes = match store.load()? {
            Some(classes) => {
                info!(classes = classes.len(), "loaded class collection");
                classes
            }
            None => {
                let seeded = seed::initial_classes()?;
                store.save(&seeded)?;
                info!(classes = seeded.len(), "seeded empty workspace");
                seeded
            }
        };
        Ok(Self { store, classes })
    }

    pub fn classes(&self) -> &[ClassRecord] {
        &self.classes
    }

    pub fn class(&self, class_id: &str) -> RepoResult<&ClassRecord> {
        self.classes
            .iter()
            .find(|c| c.id == class_id)
            .ok_or_else(|| RepoError::not_found("class", class_id))
    }

    pub fn student(&self, class_id: &str, student_id: &str) -> RepoResult<&Student> {
        self.class(class_id)?
            .student(student_id)
            .ok_or_else(|| RepoError::not_found("student", student_id))
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn commit(&mut self, next: Vec<ClassRecord>) -> RepoResult<()> {
        self.store.save(&next)?;
        self.classes = next;
        Ok(())
    }

    fn mutate_class<T>(
        &mut self,
        class_id: &str,
        f: impl FnOnce(&mut ClassRecord) -> RepoResult<T>,
    ) -> RepoResult<T> {
        let mut next = self.classes.clone();
        let class = next
            .iter_mut()
            .find(|c| c.id == class_id)
            .ok_or_else(|| RepoError::not_found("class", class_id))?;
        let out = f(class)?;
        self.commit(next)?;
        Ok(out)
    }

    fn mutate_student<T>(
        &mut self,
        class_id: &str,
        student_id: &str,
        f: impl FnOnce(&mut Student) -> RepoResult<T>,
    ) -> RepoResult<T> {
        self.mutate_class(class_id, |class| f(student_mut(class, student_id)?))
    }

    pub fn create_class(&mut self, meta: ClassMeta) -> RepoResult<ClassRecord> {
        let name = required_name(&meta.name, "class name")?;
        let class = ClassRecord {
            id: new_id(),
            name,
            semester: meta.semester.trim().to_string(),
            professor: meta.professor.trim().to_string(),
            blocks: vec![Block {
                id: new_id(),
                name: DEFAULT_BLOCK_NAME.to_string(),
            }],
            assignments: Vec::new(),
            students: Vec::new(),
            lesson_plans: Vec::new(),
            grade_thresholds: Default::default(),
            at_risk_thresholds: Default::default(),
            seating_chart: Default::default(),
        };
        let mut next = self.classes.clone();
        next.push(class.clone());
        self.commit(next)?;
        info!(class_id = %class.id, name = %class.name, "class created");
        Ok(class)
    }

    /// Returns whether a class was removed; an unknown id is a no-op.
    pub fn delete_class(&mut self, class_id: &str) -> RepoResult<bool> {
        if !self.classes.iter().any(|c| c.id == class_id) {
            debug!(class_id, "delete_class: unknown class, nothing to do");
            return Ok(false);
        }
        let next: Vec<ClassRecord> = self
            .classes
            .iter()
            .filter(|c| c.id != class_id)
            .cloned()
            .collect();
        self.commit(next)?;
        info!(class_id, "class deleted");
        Ok(true)
    }

    pub fn add_student(&mut self, class_id: &str, name: &str) -> RepoResult<Student> {
        let name = required_name(name, "student name")?;
        let student = Student::new(new_id(), name);
        let out = student.clone();
        self.mutate_class(class_id, |class| {
            class.students.push(student);
            sort_students(&mut class.students);
            Ok(())
        })?;
        debug!(class_id, student_id = %out.id, "student added");
        Ok(out)
    }

    /// Adds one student per non-blank name. Returns the new students in input order.
    pub fn import_students(&mut self, class_id: &str, names: &[String]) -> RepoResult<Vec<Student>> {
        let created: Vec<Student> = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(|n| Student::new(new_id(), n.to_string()))
            .collect();
        let to_insert = created.clone();
        self.mutate_class(class_id, |class| {
            class.students.extend(to_insert);
            sort_students(&mut class.students);
            Ok(())
        })?;
        info!(class_id, count = created.len(), "students imported");
        Ok(created)
    }

    pub fn update_student(&mut self, class_id: &str, student_id: &str, name: &str) -> RepoResult<()> {
        let name = required_name(name, "student name")?;
        self.mutate_student(class_id, student_id, |s| {
            s.name = name;
            Ok(())
        })
    }

    /// Grades, attendance and conduct are owned by the student and go with it.
    pub fn delete_student(&mut self, class_id: &str, student_id: &str) -> RepoResult<()> {
        self.mutate_class(class_id, |class| {
            let before = class.students.len();
            class.students.retain(|s| s.id != student_id);
            if class.students.len() == before {
                return Err(RepoError::not_found("student", student_id));
            }
            Ok(())
        })?;
        debug!(class_id, student_id, "student deleted");
        Ok(())
    }

    /// `None` clears the grade back to "not graded". Values are stored as given.
    pub fn update_grade(
        &mut self,
        class_id: &str,
        student_id: &str,
        assignment_id: &str,
        grade: Option<f64>,
    ) -> RepoResult<()> {
        if let Some(g) = grade {
            if !g.is_finite() {
                return Err(RepoError::validation("grade must be a finite number"));
            }
        }
        self.mutate_class(class_id, |class| {
            if !class.assignments.iter().any(|a| a.id == assignment_id) {
                return Err(RepoError::not_found("assignment", assignment_id));
            }
            let s = student_mut(class, student_id)?;
            match grade {
                Some(g) => {
                    s.grades.insert(assignment_id.to_string(), g);
                }
                None => {
                    s.grades.remove(assignment_id);
                }
            }
            Ok(())
        })
    }

    pub fn create_assignment(&mut self, class_id: &str, data: NewAssignment) -> RepoResult<Assignment> {
        let name = required_name(&data.name, "assignment name")?;
        let weight = check_weight(data.weight)?;
        self.mutate_class(class_id, |class| {
            if !class.blocks.iter().any(|b| b.id == data.block_id) {
                return Err(RepoError::validation(format!(
                    "unknown block: {}",
                    data.block_id
                )));
            }
            let a = Assignment {
                id: new_id(),
                name,
                weight,
                block_id: data.block_id,
            };
            class.assignments.push(a.clone());
            Ok(a)
        })
    }

    pub fn update_assignment(
        &mut self,
        class_id: &str,
        assignment_id: &str,
        patch: AssignmentPatch,
    ) -> RepoResult<Assignment> {
        let name = patch
            .name
            .as_deref()
            .map(|n| required_name(n, "assignment name"))
            .transpose()?;
        let weight = patch.weight.map(check_weight).transpose()?;
        self.mutate_class(class_id, |class| {
            if let Some(block_id) = &patch.block_id {
                if !class.blocks.iter().any(|b| &b.id == block_id) {
                    return Err(RepoError::validation(format!("unknown block: {block_id}")));
                }
            }
            let a = class
                .assignments
                .iter_mut()
                .find(|a| a.id == assignment_id)
                .ok_or_else(|| RepoError::not_found("assignment", assignment_id))?;
            if let Some(n) = name {
                a.name = n;
            }
            if let Some(w) = weight {
                a.weight = w;
            }
            if let Some(b) = patch.block_id {
                a.block_id = b;
            }
            Ok(a.clone())
        })
    }

    /// Removes the assignment and its grade from every student of the class.
    pub fn delete_assignment(&mut self, class_id: &str, assignment_id: &str) -> RepoResult<()> {
        self.mutate_class(class_id, |class| {
            let before = class.assignments.len();
            class.assignments.retain(|a| a.id != assignment_id);
            if class.assignments.len() == before {
                return Err(RepoError::not_found("assignment", assignment_id));
            }
            strip_grades(class, &[assignment_id.to_string()]);
            Ok(())
        })?;
        debug!(class_id, assignment_id, "assignment deleted");
        Ok(())
    }

    pub fn add_block(&mut self, class_id: &str, name: &str) -> RepoResult<Block> {
        let name = required_name(name, "block name")?;
        self.mutate_class(class_id, |class| {
            let b = Block { id: new_id(), name };
            class.blocks.push(b.clone());
            Ok(b)
        })
    }

    /// Removes the block, its assignments, and their grades. Returns the ids
    /// of the assignments that went with it.
    pub fn delete_block(&mut self, class_id: &str, block_id: &str) -> RepoResult<Vec<String>> {
        let removed = self.mutate_class(class_id, |class| {
            if !class.blocks.iter().any(|b| b.id == block_id) {
                return Err(RepoError::not_found("block", block_id));
            }
            let removed: Vec<String> = class
                .assignments
                .iter()
                .filter(|a| a.block_id == block_id)
                .map(|a| a.id.clone())
                .collect();
            class.blocks.retain(|b| b.id != block_id);
            class.assignments.retain(|a| a.block_id != block_id);
            strip_grades(class, &removed);
            Ok(removed)
        })?;
        info!(class_id, block_id, assignments = removed.len(), "block deleted");
        Ok(removed)
    }

    /// Field-level merge; threshold values are not range checked.
    pub fn update_class_settings(
        &mut self,
        class_id: &str,
        patch: ClassSettingsPatch,
    ) -> RepoResult<ClassSettings> {
        self.mutate_class(class_id, |class| {
            if let Some(g) = patch.grade_thresholds {
                let t = &mut class.grade_thresholds;
                t.needs_improvement = g.needs_improvement.unwrap_or(t.needs_improvement);
                t.satisfactory = g.satisfactory.unwrap_or(t.satisfactory);
            }
            if let Some(r) = patch.at_risk_thresholds {
                let t = &mut class.at_risk_thresholds;
                t.low_grade = r.low_grade.unwrap_or(t.low_grade);
                t.high_absences = r.high_absences.unwrap_or(t.high_absences);
                t.neg_conduct = r.neg_conduct.unwrap_or(t.neg_conduct);
            }
            Ok(ClassSettings {
                grade_thresholds: class.grade_thresholds,
                at_risk_thresholds: class.at_risk_thresholds,
            })
        })
    }

    /// Stamps a fresh id and the current time; the log stays newest first.
    pub fn add_conduct_entry(
        &mut self,
        class_id: &str,
        student_id: &str,
        entry: NewConductEntry,
    ) -> RepoResult<ConductEntry> {
        let e = ConductEntry {
            id: new_id(),
            date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            comment: entry.comment,
            kind: entry.kind,
            category: entry.category,
            points: entry.points,
        };
        let out = e.clone();
        self.mutate_student(class_id, student_id, |s| {
            s.conduct_log.insert(0, e);
            Ok(())
        })?;
        Ok(out)
    }

    pub fn update_attendance(
        &mut self,
        class_id: &str,
        student_id: &str,
        date: &str,
        status: AttendanceStatus,
    ) -> RepoResult<()> {
        let date = parse_date(date)?;
        self.mutate_student(class_id, student_id, |s| {
            s.attendance.insert(date, status);
            Ok(())
        })
    }

    /// Positions are not checked against the grid or against other students.
    pub fn update_seating_chart(
        &mut self,
        class_id: &str,
        student_id: &str,
        position: Option<SeatingPosition>,
    ) -> RepoResult<()> {
        self.mutate_student(class_id, student_id, |s| {
            s.seating_position = position;
            Ok(())
        })
    }

    /// Returns how many students lost their seat.
    pub fn clear_all_seats(&mut self, class_id: &str) -> RepoResult<usize> {
        self.mutate_class(class_id, |class| {
            let mut cleared = 0;
            for s in &mut class.students {
                if s.seating_position.take().is_some() {
                    cleared += 1;
                }
            }
            Ok(cleared)
        })
    }

    /// Upsert keyed by date: an existing plan for the same day is replaced
    /// wholesale (keeping its id unless one is supplied).
    pub fn update_lesson_plan(&mut self, class_id: &str, plan: LessonPlanInput) -> RepoResult<LessonPlan> {
        let date = parse_date(&plan.date)?;
        self.mutate_class(class_id, |class| {
            let existing = class.lesson_plans.iter().position(|p| p.date == date);
            let id = plan
                .id
                .filter(|id| !id.trim().is_empty())
                .or_else(|| existing.map(|i| class.lesson_plans[i].id.clone()))
                .unwrap_or_else(new_id);
            let lp = LessonPlan {
                id,
                date,
                title: plan.title,
                objective: plan.objective,
                materials: plan.materials,
                activities: plan.activities,
            };
            match existing {
                Some(i) => class.lesson_plans[i] = lp.clone(),
                None => class.lesson_plans.push(lp.clone()),
            }
            Ok(lp)
        })
    }

    /// Replaces the whole collection (backup restore).
    pub fn import_data(&mut self, classes: Vec<ClassRecord>) -> RepoResult<usize> {
        let count = classes.len();
        self.commit(classes)?;
        info!(classes = count, "class collection replaced");
        Ok(count)
    }
}

use std::sync::Arc;

use crate::error::{RecordError, ValidationError};
use crate::performance::Performance;
use crate::policy::GradingPolicy;
use crate::report::{ResultCard, SummaryReport, TopScorer, STUDENT_NOT_FOUND};
use crate::storage::RecordStore;
use crate::student::{Student, StudentChanges, StudentId};
use crate::validation::Validator;

/// Business layer over a `RecordStore`.
///
/// Holds no state besides the store handle and the grading policy, so it
/// can be shared across threads whenever the store can. Every call
/// re-reads from the store.
pub struct RecordManager<S: RecordStore> {
    store: Arc<S>,
    policy: GradingPolicy,
}

impl<S: RecordStore> Clone for RecordManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            policy: self.policy,
        }
    }
}

impl<S: RecordStore> RecordManager<S> {
    pub fn new(store: Arc<S>, policy: GradingPolicy) -> Self {
        Self { store, policy }
    }

    // --- Students ---

    /// Validate, check roll uniqueness and persist a new student.
    pub fn add_student(
        &self,
        name: &str,
        age: i64,
        course: &str,
        roll: &str,
    ) -> Result<Student, RecordError> {
        let new = Validator::validate_new_student(name, age, course, roll)
            .inspect_err(|e| tracing::warn!("Rejected new student: {}", e))?;

        if self.store.get_student_by_roll(&new.roll)?.is_some() {
            tracing::warn!("Roll {} already exists", new.roll);
            return Err(RecordError::DuplicateRoll(new.roll));
        }

        let student = self.store.insert_student(new)?;
        tracing::info!("Added student {} (roll {})", student.id, student.roll);
        Ok(student)
    }

    /// Apply a partial update. Returns Ok(false) if the student does not exist.
    pub fn update_student(
        &self,
        id: StudentId,
        changes: &StudentChanges,
    ) -> Result<bool, RecordError> {
        changes
            .validate()
            .inspect_err(|e| tracing::warn!("Rejected update of student {}: {}", id, e))?;

        let Some(current) = self.store.get_student_by_id(id)? else {
            tracing::debug!("Update skipped, student {} not found", id);
            return Ok(false);
        };

        if changes.is_empty() {
            tracing::debug!("Nothing to update for student {}", id);
            return Ok(true);
        }

        if let Some(roll) = changes.effective_roll() {
            if let Some(other) = self.store.get_student_by_roll(roll)? {
                if other.id != id {
                    tracing::warn!("Roll {} already belongs to student {}", roll, other.id);
                    return Err(RecordError::DuplicateRoll(roll.to_string()));
                }
            }
        }

        let updated = changes.apply(&current);
        let applied = self.store.update_student(&updated)?;
        if applied {
            tracing::info!("Updated student {}", id);
        }
        Ok(applied)
    }

    pub fn delete_student(&self, id: StudentId) -> Result<bool, RecordError> {
        let removed = self.store.delete_student(id)?;
        if removed {
            tracing::info!("Deleted student {}", id);
        }
        Ok(removed)
    }

    pub fn find_by_id(&self, id: StudentId) -> Result<Option<Student>, RecordError> {
        Ok(self.store.get_student_by_id(id)?)
    }

    pub fn find_by_roll(&self, roll: &str) -> Result<Option<Student>, RecordError> {
        Ok(self.store.get_student_by_roll(roll)?)
    }

    pub fn search_by_name(&self, query: &str) -> Result<Vec<Student>, RecordError> {
        Ok(self.store.search_students_by_name(query)?)
    }

    pub fn list_all_students(&self) -> Result<Vec<Student>, RecordError> {
        Ok(self.store.get_all_students()?)
    }

    // --- Subjects & marks ---

    pub fn list_subjects(&self) -> Result<Vec<String>, RecordError> {
        Ok(self.store.list_subjects()?)
    }

    /// Record a mark. Returns Ok(false) if the student does not exist.
    pub fn add_or_update_mark(
        &self,
        student_id: StudentId,
        subject: &str,
        mark: f64,
    ) -> Result<bool, RecordError> {
        let subject = Validator::require(subject, ValidationError::SubjectRequired)?;
        Validator::validate_mark(mark)?;

        if self.store.get_student_by_id(student_id)?.is_none() {
            tracing::debug!("Mark skipped, student {} not found", student_id);
            return Ok(false);
        }

        self.store.upsert_mark(student_id, &subject, mark)?;
        tracing::info!("Recorded {} = {} for student {}", subject, mark, student_id);
        Ok(true)
    }

    /// Performance from the student's current marks. Unknown students
    /// yield an empty performance.
    pub fn get_performance(&self, student_id: StudentId) -> Result<Performance, RecordError> {
        let marks = self.store.get_marks_for_student(student_id)?;
        Ok(Performance::evaluate(marks, &self.policy.scale))
    }

    /// Structured result card, or None for an unknown student.
    pub fn result_card(&self, student_id: StudentId) -> Result<Option<ResultCard>, RecordError> {
        let Some(student) = self.store.get_student_by_id(student_id)? else {
            return Ok(None);
        };
        let performance = self.get_performance(student_id)?;
        let attendance = self.store.get_attendance(student_id)?;
        let attendance_percentage = self.store.get_attendance_percentage(student_id)?;

        Ok(Some(ResultCard::new(
            student,
            performance,
            attendance,
            attendance_percentage,
            self.policy.attendance_warning_below,
        )))
    }

    /// Rendered result card, or "Student not found." for an unknown student.
    pub fn build_result_card(&self, student_id: StudentId) -> Result<String, RecordError> {
        tracing::debug!("Building result card for student {}", student_id);
        Ok(match self.result_card(student_id)? {
            Some(card) => card.to_string(),
            None => STUDENT_NOT_FOUND.to_string(),
        })
    }

    // --- Attendance ---

    /// Add days to the student's attendance. Returns Ok(false) if the
    /// student does not exist.
    pub fn update_attendance(
        &self,
        student_id: StudentId,
        add_present: i64,
        add_total: i64,
    ) -> Result<bool, RecordError> {
        let (present, total) = Validator::validate_attendance_delta(add_present, add_total)
            .inspect_err(|e| tracing::warn!("Rejected attendance update: {}", e))?;

        if self.store.get_student_by_id(student_id)?.is_none() {
            tracing::debug!("Attendance skipped, student {} not found", student_id);
            return Ok(false);
        }

        if self
            .store
            .get_attendance(student_id)?
            .accumulate(present, total)
            .is_none()
        {
            tracing::warn!("Attendance for student {} would overflow", student_id);
            return Err(ValidationError::AttendanceOverflow { add_total }.into());
        }

        self.store.add_attendance(student_id, present, total)?;
        tracing::info!(
            "Added attendance {}/{} for student {}",
            present,
            total,
            student_id
        );
        Ok(true)
    }

    // --- Ranking & summary ---

    pub fn get_ranked_students(&self) -> Result<Vec<Student>, RecordError> {
        Ok(self.store.get_ranked_students()?)
    }

    /// Class-wide statistics as computed by the store.
    pub fn summary_report(&self) -> Result<SummaryReport, RecordError> {
        let total_students = self.store.get_all_students()?.len();
        let class_average_percentage = self.store.get_class_average_percentage()?;
        let pass_count = self.store.get_pass_count(&self.policy)?;
        let highest_scorer = match self.store.get_highest_scorer()? {
            Some(top) => Some(TopScorer {
                percentage: self.store.get_percentage_for_student(top.id)?,
                id: top.id,
                name: top.name,
            }),
            None => None,
        };
        let average_attendance_percentage = self.store.get_average_attendance_percentage()?;

        Ok(SummaryReport {
            total_students,
            class_average_percentage,
            pass_count,
            fail_count: total_students.saturating_sub(pass_count),
            highest_scorer,
            average_attendance_percentage,
        })
    }

    pub fn build_summary_report(&self) -> Result<String, RecordError> {
        tracing::debug!("Building summary report");
        Ok(self.summary_report()?.to_string())
    }
}

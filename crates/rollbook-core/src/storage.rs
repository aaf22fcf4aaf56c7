use std::collections::BTreeMap;

use crate::attendance::Attendance;
use crate::error::StorageError;
use crate::performance;
use crate::policy::GradingPolicy;
use crate::student::{NewStudent, Student, StudentId};

/// Storage collaborator behind the `RecordManager`.
///
/// Implementations own all persisted state. Every call must reflect the
/// current stored state; the manager never caches.
pub trait RecordStore: Send + Sync {
    /// Persist a new student and return it with its assigned id.
    /// Fails with `StorageError::RollTaken` if the roll is in use.
    fn insert_student(&self, student: NewStudent) -> Result<Student, StorageError>;

    fn get_student_by_id(&self, id: StudentId) -> Result<Option<Student>, StorageError>;

    fn get_student_by_roll(&self, roll: &str) -> Result<Option<Student>, StorageError>;

    /// Case-insensitive substring match on name, ordered by id.
    fn search_students_by_name(&self, query: &str) -> Result<Vec<Student>, StorageError>;

    /// All students ordered by id.
    fn get_all_students(&self) -> Result<Vec<Student>, StorageError>;

    /// Replace the stored record with the same id.
    /// Returns Ok(false) if no such record exists.
    fn update_student(&self, student: &Student) -> Result<bool, StorageError>;

    /// Remove a student together with its marks and attendance.
    fn delete_student(&self, id: StudentId) -> Result<bool, StorageError>;

    /// Distinct subjects that have at least one mark, sorted.
    fn list_subjects(&self) -> Result<Vec<String>, StorageError>;

    /// Insert or replace the mark for (student, subject).
    fn upsert_mark(&self, id: StudentId, subject: &str, mark: f64) -> Result<(), StorageError>;

    fn get_marks_for_student(&self, id: StudentId) -> Result<BTreeMap<String, f64>, StorageError>;

    /// Add to the cumulative attendance counters.
    /// Fails with `StorageError::AttendanceOverflow` instead of wrapping.
    fn add_attendance(
        &self,
        id: StudentId,
        add_present: u32,
        add_total: u32,
    ) -> Result<(), StorageError>;

    /// Current counters, zero if nothing was recorded.
    fn get_attendance(&self, id: StudentId) -> Result<Attendance, StorageError>;

    fn get_attendance_percentage(&self, id: StudentId) -> Result<f64, StorageError> {
        Ok(self.get_attendance(id)?.percentage())
    }

    /// All students by descending percentage, ties broken by ascending id.
    fn get_ranked_students(&self) -> Result<Vec<Student>, StorageError>;

    /// Mean percentage over all students, 0 when there are none.
    fn get_class_average_percentage(&self) -> Result<f64, StorageError>;

    /// Number of students that pass under `policy`.
    fn get_pass_count(&self, policy: &GradingPolicy) -> Result<usize, StorageError>;

    /// First student of the ranking, if any.
    fn get_highest_scorer(&self) -> Result<Option<Student>, StorageError> {
        Ok(self.get_ranked_students()?.into_iter().next())
    }

    fn get_percentage_for_student(&self, id: StudentId) -> Result<f64, StorageError> {
        Ok(performance::percentage(&self.get_marks_for_student(id)?))
    }

    /// Mean attendance percentage over all students, 0 when there are none.
    fn get_average_attendance_percentage(&self) -> Result<f64, StorageError>;
}

/// Order scored students for ranking: percentage descending, then id.
pub fn rank_by_percentage(mut scored: Vec<(Student, f64)>) -> Vec<(Student, f64)> {
    scored.sort_by(|(a, pa), (b, pb)| pb.total_cmp(pa).then_with(|| a.id.cmp(&b.id)));
    scored
}

/// Arithmetic mean, 0 for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        return 0.0;
    }
    sum / count as f64
}

// In-memory implementation for testing
#[cfg(any(test, feature = "test-utils"))]
pub mod memory {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    #[derive(Default)]
    struct State {
        next_id: i64,
        students: BTreeMap<StudentId, Student>,
        marks: HashMap<StudentId, BTreeMap<String, f64>>,
        attendance: HashMap<StudentId, Attendance>,
    }

    impl State {
        fn roll_owner(&self, roll: &str) -> Option<StudentId> {
            self.students
                .values()
                .find(|s| s.roll == roll)
                .map(|s| s.id)
        }

        fn scored(&self) -> Vec<(Student, f64)> {
            self.students
                .values()
                .map(|s| {
                    let pct = self
                        .marks
                        .get(&s.id)
                        .map(performance::percentage)
                        .unwrap_or(0.0);
                    (s.clone(), pct)
                })
                .collect()
        }
    }

    /// In-memory record store for testing.
    #[derive(Default)]
    pub struct InMemoryRecordStore {
        state: RwLock<State>,
    }

    impl InMemoryRecordStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl RecordStore for InMemoryRecordStore {
        fn insert_student(&self, student: NewStudent) -> Result<Student, StorageError> {
            let mut state = self.state.write().unwrap();
            if state.roll_owner(&student.roll).is_some() {
                return Err(StorageError::RollTaken(student.roll));
            }
            state.next_id += 1;
            let student = student.with_id(StudentId(state.next_id));
            state.students.insert(student.id, student.clone());
            Ok(student)
        }

        fn get_student_by_id(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
            Ok(self.state.read().unwrap().students.get(&id).cloned())
        }

        fn get_student_by_roll(&self, roll: &str) -> Result<Option<Student>, StorageError> {
            let state = self.state.read().unwrap();
            Ok(state
                .roll_owner(roll)
                .and_then(|id| state.students.get(&id).cloned()))
        }

        fn search_students_by_name(&self, query: &str) -> Result<Vec<Student>, StorageError> {
            let query = query.to_lowercase();
            Ok(self
                .state
                .read()
                .unwrap()
                .students
                .values()
                .filter(|s| s.name.to_lowercase().contains(&query))
                .cloned()
                .collect())
        }

        fn get_all_students(&self) -> Result<Vec<Student>, StorageError> {
            Ok(self.state.read().unwrap().students.values().cloned().collect())
        }

        fn update_student(&self, student: &Student) -> Result<bool, StorageError> {
            let mut state = self.state.write().unwrap();
            if !state.students.contains_key(&student.id) {
                return Ok(false);
            }
            if let Some(owner) = state.roll_owner(&student.roll) {
                if owner != student.id {
                    return Err(StorageError::RollTaken(student.roll.clone()));
                }
            }
            state.students.insert(student.id, student.clone());
            Ok(true)
        }

        fn delete_student(&self, id: StudentId) -> Result<bool, StorageError> {
            let mut state = self.state.write().unwrap();
            state.marks.remove(&id);
            state.attendance.remove(&id);
            Ok(state.students.remove(&id).is_some())
        }

        fn list_subjects(&self) -> Result<Vec<String>, StorageError> {
            let state = self.state.read().unwrap();
            let mut subjects: Vec<String> = state
                .marks
                .values()
                .flat_map(|m| m.keys().cloned())
                .collect();
            subjects.sort();
            subjects.dedup();
            Ok(subjects)
        }

        fn upsert_mark(&self, id: StudentId, subject: &str, mark: f64) -> Result<(), StorageError> {
            self.state
                .write()
                .unwrap()
                .marks
                .entry(id)
                .or_default()
                .insert(subject.to_string(), mark);
            Ok(())
        }

        fn get_marks_for_student(
            &self,
            id: StudentId,
        ) -> Result<BTreeMap<String, f64>, StorageError> {
            Ok(self
                .state
                .read()
                .unwrap()
                .marks
                .get(&id)
                .cloned()
                .unwrap_or_default())
        }

        fn add_attendance(
            &self,
            id: StudentId,
            add_present: u32,
            add_total: u32,
        ) -> Result<(), StorageError> {
            let mut state = self.state.write().unwrap();
            let current = state.attendance.get(&id).copied().unwrap_or_default();
            let updated = current
                .accumulate(add_present, add_total)
                .ok_or(StorageError::AttendanceOverflow(id.0))?;
            state.attendance.insert(id, updated);
            Ok(())
        }

        fn get_attendance(&self, id: StudentId) -> Result<Attendance, StorageError> {
            Ok(self
                .state
                .read()
                .unwrap()
                .attendance
                .get(&id)
                .copied()
                .unwrap_or_default())
        }

        fn get_ranked_students(&self) -> Result<Vec<Student>, StorageError> {
            let scored = self.state.read().unwrap().scored();
            Ok(rank_by_percentage(scored)
                .into_iter()
                .map(|(s, _)| s)
                .collect())
        }

        fn get_class_average_percentage(&self) -> Result<f64, StorageError> {
            let scored = self.state.read().unwrap().scored();
            Ok(mean(scored.into_iter().map(|(_, pct)| pct)))
        }

        fn get_pass_count(&self, policy: &GradingPolicy) -> Result<usize, StorageError> {
            let scored = self.state.read().unwrap().scored();
            Ok(scored.iter().filter(|(_, pct)| policy.is_pass(*pct)).count())
        }

        fn get_average_attendance_percentage(&self) -> Result<f64, StorageError> {
            let state = self.state.read().unwrap();
            Ok(mean(state.students.keys().map(|id| {
                state
                    .attendance
                    .get(id)
                    .copied()
                    .unwrap_or_default()
                    .percentage()
            })))
        }
    }

}

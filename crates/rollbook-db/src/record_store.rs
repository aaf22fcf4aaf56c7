use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use redb::{Database, ReadTransaction, ReadableTable};

use rollbook_core::{
    mean, performance, rank_by_percentage, Attendance, GradingPolicy, NewStudent, RecordStore,
    StorageError, Student, StudentId,
};

use crate::db_err;
use crate::tables::{
    decode_mark_key, encode_mark_key, mark_key_range, ATTENDANCE_TABLE, COUNTERS_TABLE,
    MARKS_TABLE, ROLLS_TABLE, STUDENTS_TABLE, STUDENT_ID_COUNTER,
};

/// redb implementation of RecordStore.
///
/// Roll uniqueness is enforced inside the write transaction through the
/// `rolls` index, so concurrent inserts cannot both claim a roll.
pub struct RedbRecordStore {
    db: Arc<Database>,
}

impl RedbRecordStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Initialize the database tables.
    pub fn init_tables(db: &Database) -> Result<(), StorageError> {
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            // Create tables if they don't exist
            let _ = write_txn.open_table(STUDENTS_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(ROLLS_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(MARKS_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(ATTENDANCE_TABLE).map_err(db_err)?;
            let _ = write_txn.open_table(COUNTERS_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn read_students(txn: &ReadTransaction) -> Result<Vec<Student>, StorageError> {
        let table = txn.open_table(STUDENTS_TABLE).map_err(db_err)?;

        let mut students = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, value) = entry.map_err(db_err)?;
            let student: Student = serde_json::from_slice(value.value()).map_err(db_err)?;
            students.push(student);
        }
        Ok(students)
    }

    fn read_all_marks(
        txn: &ReadTransaction,
    ) -> Result<HashMap<i64, BTreeMap<String, f64>>, StorageError> {
        let table = txn.open_table(MARKS_TABLE).map_err(db_err)?;

        let mut marks: HashMap<i64, BTreeMap<String, f64>> = HashMap::new();
        for entry in table.iter().map_err(db_err)? {
            let (key, value) = entry.map_err(db_err)?;
            let (student_id, subject) = decode_mark_key(key.value())
                .ok_or_else(|| StorageError::Database("malformed mark key".to_string()))?;
            marks
                .entry(student_id)
                .or_default()
                .insert(subject, value.value());
        }
        Ok(marks)
    }

    /// Every student paired with its percentage, read from one snapshot.
    fn scored_students(&self) -> Result<Vec<(Student, f64)>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let students = Self::read_students(&read_txn)?;
        let marks = Self::read_all_marks(&read_txn)?;

        Ok(students
            .into_iter()
            .map(|s| {
                let pct = marks
                    .get(&s.id.0)
                    .map(performance::percentage)
                    .unwrap_or(0.0);
                (s, pct)
            })
            .collect())
    }
}

impl RecordStore for RedbRecordStore {
    fn insert_student(&self, student: NewStudent) -> Result<Student, StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;

        let stored;
        {
            let mut rolls = write_txn.open_table(ROLLS_TABLE).map_err(db_err)?;
            if rolls
                .get(student.roll.as_str())
                .map_err(db_err)?
                .is_some()
            {
                return Err(StorageError::RollTaken(student.roll));
            }

            let mut counters = write_txn.open_table(COUNTERS_TABLE).map_err(db_err)?;
            let next_id = counters
                .get(STUDENT_ID_COUNTER)
                .map_err(db_err)?
                .map(|v| v.value())
                .unwrap_or(0)
                + 1;
            counters
                .insert(STUDENT_ID_COUNTER, next_id)
                .map_err(db_err)?;

            stored = student.with_id(StudentId(next_id));
            let value = serde_json::to_vec(&stored).map_err(db_err)?;

            let mut students = write_txn.open_table(STUDENTS_TABLE).map_err(db_err)?;
            students
                .insert(next_id, value.as_slice())
                .map_err(db_err)?;
            rolls
                .insert(stored.roll.as_str(), next_id)
                .map_err(db_err)?;
        }

        write_txn.commit().map_err(db_err)?;
        Ok(stored)
    }

    fn get_student_by_id(&self, id: StudentId) -> Result<Option<Student>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(STUDENTS_TABLE).map_err(db_err)?;

        match table.get(id.0).map_err(db_err)? {
            Some(value) => {
                let student: Student = serde_json::from_slice(value.value()).map_err(db_err)?;
                Ok(Some(student))
            }
            None => Ok(None),
        }
    }

    fn get_student_by_roll(&self, roll: &str) -> Result<Option<Student>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let rolls = read_txn.open_table(ROLLS_TABLE).map_err(db_err)?;
        let Some(id) = rolls.get(roll).map_err(db_err)?.map(|v| v.value()) else {
            return Ok(None);
        };

        let students = read_txn.open_table(STUDENTS_TABLE).map_err(db_err)?;
        match students.get(id).map_err(db_err)? {
            Some(value) => {
                let student: Student = serde_json::from_slice(value.value()).map_err(db_err)?;
                Ok(Some(student))
            }
            None => Ok(None),
        }
    }

    fn search_students_by_name(&self, query: &str) -> Result<Vec<Student>, StorageError> {
        let query = query.to_lowercase();
        Ok(self
            .get_all_students()?
            .into_iter()
            .filter(|s| s.name.to_lowercase().contains(&query))
            .collect())
    }

    fn get_all_students(&self) -> Result<Vec<Student>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        Self::read_students(&read_txn)
    }

    fn update_student(&self, student: &Student) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;

        {
            let mut students = write_txn.open_table(STUDENTS_TABLE).map_err(db_err)?;
            let existing: Student = match students.get(student.id.0).map_err(db_err)? {
                Some(value) => serde_json::from_slice(value.value()).map_err(db_err)?,
                None => return Ok(false),
            };

            if existing.roll != student.roll {
                let mut rolls = write_txn.open_table(ROLLS_TABLE).map_err(db_err)?;
                let owner = rolls
                    .get(student.roll.as_str())
                    .map_err(db_err)?
                    .map(|v| v.value());
                if owner.is_some_and(|owner| owner != student.id.0) {
                    return Err(StorageError::RollTaken(student.roll.clone()));
                }
                rolls.remove(existing.roll.as_str()).map_err(db_err)?;
                rolls
                    .insert(student.roll.as_str(), student.id.0)
                    .map_err(db_err)?;
            }

            let value = serde_json::to_vec(student).map_err(db_err)?;
            students
                .insert(student.id.0, value.as_slice())
                .map_err(db_err)?;
        }

        write_txn.commit().map_err(db_err)?;
        Ok(true)
    }

    fn delete_student(&self, id: StudentId) -> Result<bool, StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;

        {
            let mut students = write_txn.open_table(STUDENTS_TABLE).map_err(db_err)?;
            let removed: Student = match students.remove(id.0).map_err(db_err)? {
                Some(value) => serde_json::from_slice(value.value()).map_err(db_err)?,
                None => return Ok(false),
            };

            let mut rolls = write_txn.open_table(ROLLS_TABLE).map_err(db_err)?;
            rolls.remove(removed.roll.as_str()).map_err(db_err)?;

            let mut attendance = write_txn.open_table(ATTENDANCE_TABLE).map_err(db_err)?;
            attendance.remove(id.0).map_err(db_err)?;

            let mut marks = write_txn.open_table(MARKS_TABLE).map_err(db_err)?;
            let (lo, hi) = mark_key_range(id.0);
            let mut keys = Vec::new();
            for entry in marks.range(lo.as_slice()..hi.as_slice()).map_err(db_err)? {
                let (key, _) = entry.map_err(db_err)?;
                keys.push(key.value().to_vec());
            }
            for key in keys {
                marks.remove(key.as_slice()).map_err(db_err)?;
            }
        }

        write_txn.commit().map_err(db_err)?;
        Ok(true)
    }

    fn list_subjects(&self) -> Result<Vec<String>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(MARKS_TABLE).map_err(db_err)?;

        let mut subjects = BTreeSet::new();
        for entry in table.iter().map_err(db_err)? {
            let (key, _) = entry.map_err(db_err)?;
            if let Some((_, subject)) = decode_mark_key(key.value()) {
                subjects.insert(subject);
            }
        }
        Ok(subjects.into_iter().collect())
    }

    fn upsert_mark(&self, id: StudentId, subject: &str, mark: f64) -> Result<(), StorageError> {
        let key = encode_mark_key(id.0, subject);
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(MARKS_TABLE).map_err(db_err)?;
            table.insert(key.as_slice(), mark).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn get_marks_for_student(&self, id: StudentId) -> Result<BTreeMap<String, f64>, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(MARKS_TABLE).map_err(db_err)?;

        let (lo, hi) = mark_key_range(id.0);
        let mut marks = BTreeMap::new();
        for entry in table.range(lo.as_slice()..hi.as_slice()).map_err(db_err)? {
            let (key, value) = entry.map_err(db_err)?;
            if let Some((_, subject)) = decode_mark_key(key.value()) {
                marks.insert(subject, value.value());
            }
        }
        Ok(marks)
    }

    fn add_attendance(
        &self,
        id: StudentId,
        add_present: u32,
        add_total: u32,
    ) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(ATTENDANCE_TABLE).map_err(db_err)?;
            let (present, total) = table
                .get(id.0)
                .map_err(db_err)?
                .map(|v| v.value())
                .unwrap_or((0, 0));
            let updated = Attendance::new(present, total)
                .accumulate(add_present, add_total)
                .ok_or(StorageError::AttendanceOverflow(id.0))?;
            table
                .insert(id.0, (updated.present, updated.total))
                .map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;
        Ok(())
    }

    fn get_attendance(&self, id: StudentId) -> Result<Attendance, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(ATTENDANCE_TABLE).map_err(db_err)?;

        let (present, total) = table
            .get(id.0)
            .map_err(db_err)?
            .map(|v| v.value())
            .unwrap_or((0, 0));
        Ok(Attendance::new(present, total))
    }

    fn get_ranked_students(&self) -> Result<Vec<Student>, StorageError> {
        Ok(rank_by_percentage(self.scored_students()?)
            .into_iter()
            .map(|(s, _)| s)
            .collect())
    }

    fn get_class_average_percentage(&self) -> Result<f64, StorageError> {
        Ok(mean(self.scored_students()?.into_iter().map(|(_, pct)| pct)))
    }

    fn get_pass_count(&self, policy: &GradingPolicy) -> Result<usize, StorageError> {
        Ok(self
            .scored_students()?
            .iter()
            .filter(|(_, pct)| policy.is_pass(*pct))
            .count())
    }

    fn get_average_attendance_percentage(&self) -> Result<f64, StorageError> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let students = Self::read_students(&read_txn)?;
        let table = read_txn.open_table(ATTENDANCE_TABLE).map_err(db_err)?;

        let mut percentages = Vec::with_capacity(students.len());
        for student in &students {
            let (present, total) = table
                .get(student.id.0)
                .map_err(db_err)?
                .map(|v| v.value())
                .unwrap_or((0, 0));
            percentages.push(Attendance::new(present, total).percentage());
        }
        Ok(mean(percentages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{tempdir, TempDir};

    fn create_test_store() -> (TempDir, RedbRecordStore) {
        let dir = tempdir().unwrap();
        let db = Database::create(dir.path().join("test.redb")).unwrap();
        RedbRecordStore::init_tables(&db).unwrap();
        (dir, RedbRecordStore::new(Arc::new(db)))
    }

    fn new_student(name: &str, roll: &str) -> NewStudent {
        NewStudent {
            name: name.to_string(),
            age: 20,
            course: "CS".to_string(),
            roll: roll.to_string(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, store) = create_test_store();

        let asha = store.insert_student(new_student("Asha", "R1")).unwrap();
        let ravi = store.insert_student(new_student("Ravi", "R2")).unwrap();
        assert_eq!(asha.id, StudentId(1));
        assert_eq!(ravi.id, StudentId(2));

        assert_eq!(store.get_student_by_id(asha.id).unwrap(), Some(asha.clone()));
        assert_eq!(store.get_student_by_roll("R2").unwrap(), Some(ravi));
        assert!(store.get_student_by_roll("R3").unwrap().is_none());
        assert!(store.get_student_by_id(StudentId(9)).unwrap().is_none());
    }

    #[test]
    fn test_insert_taken_roll() {
        let (_dir, store) = create_test_store();
        store.insert_student(new_student("Asha", "R1")).unwrap();

        let result = store.insert_student(new_student("Ravi", "R1"));
        assert!(matches!(result, Err(StorageError::RollTaken(r)) if r == "R1"));
        assert_eq!(store.get_all_students().unwrap().len(), 1);

        // The rejected insert did not consume an id
        let next = store.insert_student(new_student("Ravi", "R2")).unwrap();
        assert_eq!(next.id, StudentId(2));
    }

    #[test]
    fn test_update_moves_roll_index() {
        let (_dir, store) = create_test_store();
        let mut asha = store.insert_student(new_student("Asha", "R1")).unwrap();
        store.insert_student(new_student("Ravi", "R2")).unwrap();

        asha.roll = "R9".to_string();
        assert!(store.update_student(&asha).unwrap());
        assert!(store.get_student_by_roll("R1").unwrap().is_none());
        assert_eq!(store.get_student_by_roll("R9").unwrap().unwrap().id, asha.id);

        asha.roll = "R2".to_string();
        assert!(matches!(
            store.update_student(&asha),
            Err(StorageError::RollTaken(_))
        ));

        let ghost = Student {
            id: StudentId(99),
            ..asha
        };
        assert!(!store.update_student(&ghost).unwrap());
    }

    #[test]
    fn test_marks_upsert_and_isolation() {
        let (_dir, store) = create_test_store();
        let a = store.insert_student(new_student("Asha", "R1")).unwrap();
        let b = store.insert_student(new_student("Ravi", "R2")).unwrap();

        store.upsert_mark(a.id, "Math", 40.0).unwrap();
        store.upsert_mark(a.id, "Math", 90.0).unwrap();
        store.upsert_mark(a.id, "Phys", 80.0).unwrap();
        store.upsert_mark(b.id, "Art", 55.0).unwrap();

        let marks = store.get_marks_for_student(a.id).unwrap();
        assert_eq!(marks.len(), 2);
        assert_eq!(marks["Math"], 90.0);
        assert_eq!(marks["Phys"], 80.0);

        assert_eq!(store.get_percentage_for_student(a.id).unwrap(), 85.0);
        assert_eq!(store.list_subjects().unwrap(), vec!["Art", "Math", "Phys"]);
    }

    #[test]
    fn test_attendance_accumulates() {
        let (_dir, store) = create_test_store();
        let a = store.insert_student(new_student("Asha", "R1")).unwrap();

        assert_eq!(store.get_attendance(a.id).unwrap(), Attendance::default());
        store.add_attendance(a.id, 3, 5).unwrap();
        store.add_attendance(a.id, 3, 5).unwrap();

        assert_eq!(store.get_attendance(a.id).unwrap(), Attendance::new(6, 10));
        assert_eq!(store.get_attendance_percentage(a.id).unwrap(), 60.0);
    }

    #[test]
    fn test_attendance_overflow_is_rejected() {
        let (_dir, store) = create_test_store();
        let a = store.insert_student(new_student("Asha", "R1")).unwrap();
        store.add_attendance(a.id, 0, u32::MAX).unwrap();

        let result = store.add_attendance(a.id, u32::MAX, u32::MAX);
        assert!(matches!(
            result,
            Err(StorageError::AttendanceOverflow(id)) if id == a.id.0
        ));
        assert_eq!(
            store.get_attendance(a.id).unwrap(),
            Attendance::new(0, u32::MAX)
        );
    }

    #[test]
    fn test_delete_cascades() {
        let (_dir, store) = create_test_store();
        let a = store.insert_student(new_student("Asha", "R1")).unwrap();
        let b = store.insert_student(new_student("Ravi", "R2")).unwrap();
        store.upsert_mark(a.id, "Math", 70.0).unwrap();
        store.upsert_mark(b.id, "Math", 60.0).unwrap();
        store.add_attendance(a.id, 1, 2).unwrap();

        assert!(store.delete_student(a.id).unwrap());
        assert!(!store.delete_student(a.id).unwrap());

        assert!(store.get_marks_for_student(a.id).unwrap().is_empty());
        assert_eq!(store.get_attendance(a.id).unwrap(), Attendance::default());
        assert!(store.get_student_by_roll("R1").unwrap().is_none());
        assert_eq!(store.get_marks_for_student(b.id).unwrap().len(), 1);

        // Roll becomes available again
        store.insert_student(new_student("Meera", "R1")).unwrap();
    }

    #[test]
    fn test_search_by_name() {
        let (_dir, store) = create_test_store();
        store.insert_student(new_student("Asha", "R1")).unwrap();
        store.insert_student(new_student("Ravi", "R2")).unwrap();
        store.insert_student(new_student("Natasha", "R3")).unwrap();

        let names: Vec<String> = store
            .search_students_by_name("ASH")
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Asha", "Natasha"]);
    }

    #[test]
    fn test_aggregates() {
        let (_dir, store) = create_test_store();
        let a = store.insert_student(new_student("Asha", "R1")).unwrap();
        let b = store.insert_student(new_student("Ravi", "R2")).unwrap();
        let c = store.insert_student(new_student("Meera", "R3")).unwrap();

        store.upsert_mark(a.id, "Math", 50.0).unwrap();
        store.upsert_mark(b.id, "Math", 90.0).unwrap();
        store.upsert_mark(c.id, "Math", 50.0).unwrap();
        store.add_attendance(a.id, 10, 10).unwrap();
        store.add_attendance(b.id, 5, 10).unwrap();

        let ranked: Vec<StudentId> = store
            .get_ranked_students()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ranked, vec![b.id, a.id, c.id]);

        assert_eq!(store.get_highest_scorer().unwrap().unwrap().id, b.id);
        assert!((store.get_class_average_percentage().unwrap() - 190.0 / 3.0).abs() < 1e-9);
        let pass_at = |pass_percentage| GradingPolicy {
            pass_percentage,
            ..GradingPolicy::default()
        };
        assert_eq!(store.get_pass_count(&pass_at(50.0)).unwrap(), 3);
        assert_eq!(store.get_pass_count(&pass_at(60.0)).unwrap(), 1);
        assert!((store.get_average_attendance_percentage().unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_aggregates_empty() {
        let (_dir, store) = create_test_store();

        assert!(store.get_ranked_students().unwrap().is_empty());
        assert!(store.get_highest_scorer().unwrap().is_none());
        assert_eq!(store.get_class_average_percentage().unwrap(), 0.0);
        assert_eq!(store.get_pass_count(&GradingPolicy::default()).unwrap(), 0);
        assert_eq!(store.get_average_attendance_percentage().unwrap(), 0.0);
    }
}

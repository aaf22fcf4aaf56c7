//! Rollbook DB - redb implementation of the record store.

pub mod record_store;
pub mod tables;

pub use record_store::RedbRecordStore;

use std::path::Path;
use std::sync::Arc;

use redb::Database;

use rollbook_core::StorageError;

/// Initialize a database with all required tables.
pub fn init_database(path: impl AsRef<Path>) -> Result<Arc<Database>, StorageError> {
    let db = Database::create(path).map_err(db_err)?;

    RedbRecordStore::init_tables(&db)?;

    Ok(Arc::new(db))
}

/// Wrap a redb or serialization error.
pub(crate) fn db_err(e: impl std::fmt::Display) -> StorageError {
    StorageError::Database(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollbook_core::RecordStore;
    use tempfile::tempdir;

    #[test]
    fn test_init_database() {
        let dir = tempdir().unwrap();
        let db = init_database(dir.path().join("test.redb")).unwrap();

        let store = RedbRecordStore::new(db);
        assert!(store.get_all_students().unwrap().is_empty());
    }

    #[test]
    fn test_reopen_keeps_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.redb");

        {
            let store = RedbRecordStore::new(init_database(&path).unwrap());
            let student = rollbook_core::NewStudent {
                name: "Asha".to_string(),
                age: 20,
                course: "CS".to_string(),
                roll: "R1".to_string(),
            };
            store.insert_student(student).unwrap();
        }

        let store = RedbRecordStore::new(init_database(&path).unwrap());
        let students = store.get_all_students().unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].roll, "R1");
    }
}

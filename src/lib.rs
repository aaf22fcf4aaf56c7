pub mod config;
pub mod report;

pub use config::{Config, ConfigError};
pub use report::{render_reports, ReportError};
pub use rollbook_core::{
    Grade, GradingPolicy, Performance, RecordError, RecordManager, Student, StudentChanges,
    StudentId, SummaryReport, ValidationError,
};
pub use rollbook_db::{init_database, RedbRecordStore};

use std::sync::Arc;

use rollbook_core::StorageError;

/// Open (or create) the database at the configured path and build a
/// manager over it.
pub fn open_manager(config: &Config) -> Result<RecordManager<RedbRecordStore>, StorageError> {
    let db = init_database(&config.db_path)?;
    let store = Arc::new(RedbRecordStore::new(db));
    Ok(RecordManager::new(store, config.policy))
}

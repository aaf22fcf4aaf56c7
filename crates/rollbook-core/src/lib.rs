//! Rollbook Core - Student records, performance and reporting.
//!
//! This crate holds the business rules: validation, roll uniqueness,
//! derived performance and class reports. Persistence is delegated to a
//! `RecordStore` implementation.

pub mod attendance;
pub mod error;
pub mod manager;
pub mod performance;
pub mod policy;
pub mod report;
pub mod storage;
pub mod student;
pub mod validation;

// Re-exports for convenience
pub use attendance::Attendance;
pub use error::{RecordError, StorageError, ValidationError};
pub use manager::RecordManager;
pub use performance::{Grade, GradeScale, Performance};
pub use policy::GradingPolicy;
pub use report::{ResultCard, SummaryReport, TopScorer, STUDENT_NOT_FOUND};
pub use storage::{mean, rank_by_percentage, RecordStore};
pub use student::{NewStudent, Student, StudentChanges, StudentId};
pub use validation::Validator;

#[cfg(any(test, feature = "test-utils"))]
pub use storage::memory::InMemoryRecordStore;

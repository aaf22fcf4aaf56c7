use thiserror::Error;

/// Error returned by every `RecordManager` operation.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Roll already exists: {0}")]
    DuplicateRoll(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Name required")]
    NameRequired,

    #[error("Course required")]
    CourseRequired,

    #[error("Roll required")]
    RollRequired,

    #[error("Age must be positive, got {0}")]
    AgeNotPositive(i64),

    #[error("Age {0} is too large")]
    AgeOutOfRange(i64),

    #[error("Subject required")]
    SubjectRequired,

    #[error("Invalid mark {0}: must be between 0 and 100")]
    MarkOutOfRange(f64),

    #[error("Days cannot be negative")]
    NegativeDays,

    #[error("Present days ({present}) cannot exceed total days ({total})")]
    PresentExceedsTotal { present: i64, total: i64 },

    #[error("Day count {0} is too large")]
    DaysOutOfRange(i64),

    #[error("Adding {add_total} days would overflow the attendance counters")]
    AttendanceOverflow { add_total: i64 },
}

#[derive(Error, Debug)]
pub enum StorageError {
    /// The store's own unique-roll enforcement rejected a write.
    #[error("Roll already taken: {0}")]
    RollTaken(String),

    #[error("Attendance counters overflow for student {0}")]
    AttendanceOverflow(i64),

    #[error("Database error: {0}")]
    Database(String),
}

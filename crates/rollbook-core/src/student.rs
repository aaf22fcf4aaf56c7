use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::Validator;

/// Storage-assigned identifier of a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(pub i64);

impl std::fmt::Display for StudentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated student that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStudent {
    pub name: String,
    pub age: u32,
    pub course: String,
    pub roll: String,
}

impl NewStudent {
    /// Attach the id assigned by storage.
    pub fn with_id(self, id: StudentId) -> Student {
        Student {
            id,
            name: self.name,
            age: self.age,
            course: self.course,
            roll: self.roll,
        }
    }
}

/// A persisted student record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub age: u32,
    pub course: String,
    pub roll: String,
}

impl std::fmt::Display for Student {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Student[ID={}, Name={}, Age={}, Course={}, Roll={}]",
            self.id, self.name, self.age, self.course, self.roll
        )
    }
}

/// Partial update of a student.
///
/// Fields left as `None` keep their stored value. Supplied fields that are
/// blank (strings) or non-positive (age) are ignored as well. A positive
/// age too large for a record is rejected by `validate`, as on insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StudentChanges {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub course: Option<String>,
    pub roll: Option<String>,
}

impl StudentChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn age(mut self, age: i64) -> Self {
        self.age = Some(age);
        self
    }

    pub fn course(mut self, course: impl Into<String>) -> Self {
        self.course = Some(course.into());
        self
    }

    pub fn roll(mut self, roll: impl Into<String>) -> Self {
        self.roll = Some(roll.into());
        self
    }

    /// The trimmed roll, if one was supplied and is not blank.
    pub fn effective_roll(&self) -> Option<&str> {
        non_blank(&self.roll)
    }

    /// Reject supplied values that can never be stored.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(age) = self.age.filter(|a| *a > 0) {
            Validator::validate_age(age)?;
        }
        Ok(())
    }

    /// Produce the updated record. `student` itself is left untouched.
    pub fn apply(&self, student: &Student) -> Student {
        let mut updated = student.clone();
        if let Some(name) = non_blank(&self.name) {
            updated.name = name.to_string();
        }
        if let Some(age) = self.age.filter(|a| *a > 0).and_then(|a| u32::try_from(a).ok()) {
            updated.age = age;
        }
        if let Some(course) = non_blank(&self.course) {
            updated.course = course.to_string();
        }
        if let Some(roll) = self.effective_roll() {
            updated.roll = roll.to_string();
        }
        updated
    }

    /// True if applying these changes would alter nothing.
    pub fn is_empty(&self) -> bool {
        non_blank(&self.name).is_none()
            && self.age.filter(|a| *a > 0).is_none()
            && non_blank(&self.course).is_none()
            && self.effective_roll().is_none()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

use crate::error::ValidationError;
use crate::performance::MAX_MARK;
use crate::student::NewStudent;

/// Field-level checks applied before anything reaches storage.
pub struct Validator;

impl Validator {
    /// Return the trimmed value, or `err` if it is blank.
    pub fn require(value: &str, err: ValidationError) -> Result<String, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(err);
        }
        Ok(trimmed.to_string())
    }

    /// Validate age. Must be positive and fit in a u32.
    pub fn validate_age(age: i64) -> Result<u32, ValidationError> {
        if age <= 0 {
            return Err(ValidationError::AgeNotPositive(age));
        }
        u32::try_from(age).map_err(|_| ValidationError::AgeOutOfRange(age))
    }

    /// Validate and normalize the fields of a new student.
    pub fn validate_new_student(
        name: &str,
        age: i64,
        course: &str,
        roll: &str,
    ) -> Result<NewStudent, ValidationError> {
        let name = Self::require(name, ValidationError::NameRequired)?;
        let age = Self::validate_age(age)?;
        let course = Self::require(course, ValidationError::CourseRequired)?;
        let roll = Self::require(roll, ValidationError::RollRequired)?;
        Ok(NewStudent {
            name,
            age,
            course,
            roll,
        })
    }

    /// Validate a mark. Must be within [0, 100].
    pub fn validate_mark(mark: f64) -> Result<(), ValidationError> {
        if !(0.0..=MAX_MARK).contains(&mark) {
            return Err(ValidationError::MarkOutOfRange(mark));
        }
        Ok(())
    }

    /// Validate an attendance addition and convert it to counters.
    pub fn validate_attendance_delta(
        add_present: i64,
        add_total: i64,
    ) -> Result<(u32, u32), ValidationError> {
        if add_present < 0 || add_total < 0 {
            return Err(ValidationError::NegativeDays);
        }
        if add_present > add_total {
            return Err(ValidationError::PresentExceedsTotal {
                present: add_present,
                total: add_total,
            });
        }
        let total =
            u32::try_from(add_total).map_err(|_| ValidationError::DaysOutOfRange(add_total))?;
        let present = u32::try_from(add_present)
            .map_err(|_| ValidationError::DaysOutOfRange(add_present))?;
        Ok((present, total))
    }
}

use serde::{Deserialize, Serialize};

/// Cumulative attendance counters for one student.
///
/// Counters only ever grow; `present <= total` holds as long as every
/// addition respects it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendance {
    pub present: u32,
    pub total: u32,
}

impl Attendance {
    pub fn new(present: u32, total: u32) -> Self {
        Self { present, total }
    }

    /// Add a batch of days to the counters.
    /// Returns None if either counter would overflow.
    pub fn accumulate(self, add_present: u32, add_total: u32) -> Option<Self> {
        Some(Self {
            present: self.present.checked_add(add_present)?,
            total: self.total.checked_add(add_total)?,
        })
    }

    /// Attendance as a percentage, 0 when no days were recorded.
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.present) / f64::from(self.total) * 100.0
    }
}

use serde::{Deserialize, Serialize};

use crate::performance::GradeScale;

/// Tunable academic cut-offs used by the manager and its reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradingPolicy {
    pub scale: GradeScale,
    /// Minimum percentage counted as a pass.
    pub pass_percentage: f64,
    /// Result cards warn when attendance falls below this percentage.
    pub attendance_warning_below: f64,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            scale: GradeScale::default(),
            pass_percentage: 40.0,
            attendance_warning_below: 75.0,
        }
    }
}

impl GradingPolicy {
    pub fn is_pass(&self, percentage: f64) -> bool {
        percentage >= self.pass_percentage
    }
}

use std::fmt;

use serde::Serialize;

use crate::attendance::Attendance;
use crate::performance::Performance;
use crate::student::{Student, StudentId};

/// Text shown instead of a result card for an unknown student.
pub const STUDENT_NOT_FOUND: &str = "Student not found.";

/// Per-student report: identity, marks, performance and attendance.
#[derive(Debug, Clone, Serialize)]
pub struct ResultCard {
    pub student: Student,
    pub performance: Performance,
    pub attendance: Attendance,
    pub attendance_percentage: f64,
    /// Threshold that attendance fell below, if the card carries a warning.
    pub low_attendance_warning: Option<f64>,
}

impl ResultCard {
    pub fn new(
        student: Student,
        performance: Performance,
        attendance: Attendance,
        attendance_percentage: f64,
        warning_below: f64,
    ) -> Self {
        Self {
            student,
            performance,
            attendance,
            attendance_percentage,
            low_attendance_warning: (attendance_percentage < warning_below)
                .then_some(warning_below),
        }
    }
}

impl fmt::Display for ResultCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "===== Result Card =====")?;
        writeln!(f, "{}", self.student)?;
        writeln!(f, "Subjects & Marks:")?;
        if self.performance.has_marks() {
            for (subject, mark) in &self.performance.marks {
                writeln!(f, "  - {}: {:.2}", subject, mark)?;
            }
        } else {
            writeln!(f, "  No marks recorded.")?;
        }
        writeln!(
            f,
            "Total: {:.2} | Percentage: {:.2}% | Grade: {}",
            self.performance.total, self.performance.percentage, self.performance.grade
        )?;
        writeln!(
            f,
            "Attendance: {}/{} ({:.2}%)",
            self.attendance.present, self.attendance.total, self.attendance_percentage
        )?;
        if let Some(threshold) = self.low_attendance_warning {
            writeln!(f, "Warning: Attendance below {}%.", threshold)?;
        }
        writeln!(f, "=======================")
    }
}

/// The best performing student in a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopScorer {
    pub id: StudentId,
    pub name: String,
    pub percentage: f64,
}

/// Class-wide aggregate statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub total_students: usize,
    pub class_average_percentage: f64,
    pub pass_count: usize,
    pub fail_count: usize,
    pub highest_scorer: Option<TopScorer>,
    pub average_attendance_percentage: f64,
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "===== Summary Report =====")?;
        writeln!(f, "Total Registered Students  : {}", self.total_students)?;
        writeln!(
            f,
            "Average Class Percentage   : {:.2}%",
            self.class_average_percentage
        )?;
        writeln!(f, "Pass Count                 : {}", self.pass_count)?;
        writeln!(f, "Fail Count                 : {}", self.fail_count)?;
        match &self.highest_scorer {
            Some(top) => writeln!(
                f,
                "Highest Scorer             : {} (ID {}) - {:.2}%",
                top.name, top.id, top.percentage
            )?,
            None => writeln!(f, "Highest Scorer             : N/A")?,
        }
        writeln!(
            f,
            "Average Attendance         : {:.2}%",
            self.average_attendance_percentage
        )?;
        writeln!(f, "============================")
    }
}

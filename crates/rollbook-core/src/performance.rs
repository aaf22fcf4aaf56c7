use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Maximum mark for a single subject.
pub const MAX_MARK: f64 = 100.0;

/// Letter grade derived from a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let letter = match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        f.write_str(letter)
    }
}

/// Minimum percentage for each passing letter. Anything below `d` is an F.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeScale {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Default for GradeScale {
    fn default() -> Self {
        Self {
            a: 90.0,
            b: 75.0,
            c: 60.0,
            d: 40.0,
        }
    }
}

impl GradeScale {
    /// Build a scale from descending minimums for A, B, C and D.
    pub fn from_thresholds(thresholds: [f64; 4]) -> Option<Self> {
        let in_range = thresholds.iter().all(|t| (0.0..=100.0).contains(t));
        let descending = thresholds.windows(2).all(|w| w[0] > w[1]);
        if !in_range || !descending {
            return None;
        }
        let [a, b, c, d] = thresholds;
        Some(Self { a, b, c, d })
    }

    pub fn grade_for(&self, percentage: f64) -> Grade {
        if percentage >= self.a {
            Grade::A
        } else if percentage >= self.b {
            Grade::B
        } else if percentage >= self.c {
            Grade::C
        } else if percentage >= self.d {
            Grade::D
        } else {
            Grade::F
        }
    }
}

/// Sum of all marks, 0.0 for an empty mark set.
pub fn total(marks: &BTreeMap<String, f64>) -> f64 {
    // sum() of an empty f64 iterator is -0.0
    marks.values().fold(0.0, |acc, m| acc + m)
}

/// Total as a share of the maximum attainable, in percent.
/// Defined as 0 for an empty mark set.
pub fn percentage(marks: &BTreeMap<String, f64>) -> f64 {
    if marks.is_empty() {
        return 0.0;
    }
    total(marks) / (MAX_MARK * marks.len() as f64) * 100.0
}

/// Derived performance of one student.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Performance {
    pub marks: BTreeMap<String, f64>,
    pub total: f64,
    pub percentage: f64,
    pub grade: Grade,
}

impl Performance {
    pub fn evaluate(marks: BTreeMap<String, f64>, scale: &GradeScale) -> Self {
        let total = total(&marks);
        let percentage = percentage(&marks);
        Self {
            grade: scale.grade_for(percentage),
            marks,
            total,
            percentage,
        }
    }

    pub fn has_marks(&self) -> bool {
        !self.marks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries
            .iter()
            .map(|(s, m)| (s.to_string(), *m))
            .collect()
    }

    #[test]
    fn test_empty_marks() {
        let perf = Performance::evaluate(BTreeMap::new(), &GradeScale::default());

        assert_eq!(perf.total, 0.0);
        assert!(perf.total.is_sign_positive());
        assert_eq!(format!("{:.2}", perf.total), "0.00");
        assert_eq!(perf.percentage, 0.0);
        assert_eq!(perf.grade, Grade::F);
        assert!(!perf.has_marks());
    }

    #[test]
    fn test_all_full_marks() {
        let perf = Performance::evaluate(
            marks(&[("Math", 100.0), ("Phys", 100.0), ("Chem", 100.0)]),
            &GradeScale::default(),
        );

        assert_eq!(perf.total, 300.0);
        assert_eq!(perf.percentage, 100.0);
        assert_eq!(perf.grade, Grade::A);
    }

    #[test]
    fn test_two_subjects() {
        let perf = Performance::evaluate(
            marks(&[("Math", 90.0), ("Phys", 80.0)]),
            &GradeScale::default(),
        );

        assert_eq!(perf.total, 170.0);
        assert_eq!(perf.percentage, 85.0);
        assert_eq!(perf.grade, Grade::B);
    }

    #[test]
    fn test_grade_boundaries() {
        let scale = GradeScale::default();
        assert_eq!(scale.grade_for(90.0), Grade::A);
        assert_eq!(scale.grade_for(89.99), Grade::B);
        assert_eq!(scale.grade_for(75.0), Grade::B);
        assert_eq!(scale.grade_for(60.0), Grade::C);
        assert_eq!(scale.grade_for(40.0), Grade::D);
        assert_eq!(scale.grade_for(39.99), Grade::F);
        assert_eq!(scale.grade_for(0.0), Grade::F);
    }

    #[test]
    fn test_custom_scale() {
        let scale = GradeScale::from_thresholds([80.0, 70.0, 50.0, 33.0]).unwrap();
        assert_eq!(scale.grade_for(85.0), Grade::A);
        assert_eq!(scale.grade_for(35.0), Grade::D);
        assert_eq!(scale.grade_for(32.0), Grade::F);
    }

    #[test]
    fn test_invalid_scale() {
        assert!(GradeScale::from_thresholds([70.0, 80.0, 50.0, 33.0]).is_none());
        assert!(GradeScale::from_thresholds([90.0, 75.0, 60.0, 60.0]).is_none());
        assert!(GradeScale::from_thresholds([120.0, 75.0, 60.0, 40.0]).is_none());
        assert!(GradeScale::from_thresholds([90.0, 75.0, 60.0, -1.0]).is_none());
    }

    #[test]
    fn test_grade_display() {
        assert_eq!(Grade::A.to_string(), "A");
        assert_eq!(Grade::F.to_string(), "F");
    }
}

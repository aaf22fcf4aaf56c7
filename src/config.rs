use std::path::PathBuf;

use rollbook_core::{GradeScale, GradingPolicy};
use thiserror::Error;

/// Application configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub policy: GradingPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    /// ROLLBOOK_DB_PATH defaults to "./rollbook.redb"; grading settings
    /// default to `GradingPolicy::default()`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = GradingPolicy::default();

        let db_path = lookup("ROLLBOOK_DB_PATH")
            .unwrap_or_else(|| "./rollbook.redb".to_string())
            .into();

        let scale = match lookup("ROLLBOOK_GRADE_THRESHOLDS") {
            Some(raw) => parse_scale(&raw)?,
            None => defaults.scale,
        };

        let pass_percentage = match lookup("ROLLBOOK_PASS_PERCENTAGE") {
            Some(raw) => parse_percentage("ROLLBOOK_PASS_PERCENTAGE", &raw)?,
            None => defaults.pass_percentage,
        };

        let attendance_warning_below = match lookup("ROLLBOOK_ATTENDANCE_WARNING") {
            Some(raw) => parse_percentage("ROLLBOOK_ATTENDANCE_WARNING", &raw)?,
            None => defaults.attendance_warning_below,
        };

        Ok(Config {
            db_path,
            policy: GradingPolicy {
                scale,
                pass_percentage,
                attendance_warning_below,
            },
        })
    }
}

fn parse_percentage(var: &'static str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| (0.0..=100.0).contains(v))
        .ok_or(ConfigError::Invalid(var, "must be a number between 0 and 100"))
}

// Expected format: "a,b,c,d" e.g. "90,75,60,40"
fn parse_scale(raw: &str) -> Result<GradeScale, ConfigError> {
    const VAR: &str = "ROLLBOOK_GRADE_THRESHOLDS";

    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConfigError::Invalid(VAR, "thresholds must be numbers"))?;

    let thresholds: [f64; 4] = values
        .try_into()
        .map_err(|_| ConfigError::Invalid(VAR, "expected four thresholds for A,B,C,D"))?;

    GradeScale::from_thresholds(thresholds).ok_or(ConfigError::Invalid(
        VAR,
        "thresholds must be strictly descending and within 0..=100",
    ))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, &'static str),
}

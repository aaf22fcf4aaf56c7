use std::fmt::Write;

use rollbook_core::{RecordError, RecordManager, RecordStore};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to format report: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Render the class summary followed by the ranking, or the summary alone
/// as pretty JSON.
pub fn render_reports<S: RecordStore>(
    manager: &RecordManager<S>,
    json: bool,
) -> Result<String, ReportError> {
    if json {
        let summary = manager.summary_report()?;
        let mut out = serde_json::to_string_pretty(&summary)?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = manager.build_summary_report()?;

    let ranked = manager.get_ranked_students()?;
    if ranked.is_empty() {
        return Ok(out);
    }
    writeln!(out, "Ranking:")?;
    for (rank, student) in ranked.iter().enumerate() {
        let perf = manager.get_performance(student.id)?;
        writeln!(
            out,
            "  {}. {} (ID {}) - {:.2}% [{}]",
            rank + 1,
            student.name,
            student.id,
            perf.percentage,
            perf.grade
        )?;
    }
    Ok(out)
}

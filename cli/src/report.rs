//! Rendering reconciliation results for the terminal.

use crate::error::{AppError, Result};
use termsync_engine::ReconcileResult;

/// One line per term followed by a summary line.
pub fn render_text(result: &ReconcileResult) -> String {
    let mut out = String::new();
    for record in &result.records {
        out.push_str(&format!("Term {} has the {} Status", record.name, record.status));
        if record.is_unresolved_add() {
            out.push_str(" (unconfirmed)");
        }
        out.push('\n');
    }
    out.push_str(&format!("Summary: {}\n", result.summary()));
    out
}

/// Pretty-printed JSON with the records and their summary.
pub fn render_json(result: &ReconcileResult) -> Result<String> {
    let report = serde_json::json!({
        "records": result.records,
        "summary": result.summary(),
    });
    serde_json::to_string_pretty(&report).map_err(AppError::Render)
}

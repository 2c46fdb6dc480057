//! JSON output for run summaries.

use crate::summary::RunSummary;

/// Render a run summary as pretty-printed JSON.
pub fn render_json(summary: &RunSummary) -> String {
    serde_json::to_string_pretty(summary).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_json_empty() {
        let json: serde_json::Value =
            serde_json::from_str(&render_json(&RunSummary::default())).unwrap();
        assert_eq!(json["totals"]["processed"], 0);
        assert_eq!(json["directories"].as_array().unwrap().len(), 0);
    }
}

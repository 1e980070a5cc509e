//! Markdown summary generation
//!
//! This module renders the end-of-run analytics as a human-readable
//! markdown report.

use crate::output::analytics::RunAnalytics;
use crate::output::OutputResult;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of a run
///
/// # Arguments
///
/// * `analytics` - The finalized run analytics
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(analytics: &RunAnalytics, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(analytics);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats run analytics as markdown
pub fn format_markdown_summary(analytics: &RunAnalytics) -> String {
    let totals = &analytics.totals;
    let mut md = String::new();

    // Title
    md.push_str("# Contact-Miner Run Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", analytics.started_at));
    md.push_str(&format!("- **Finished**: {}\n", analytics.finished_at));
    md.push_str(&format!(
        "- **Duration**: {:.1} seconds ({:.2} minutes)\n",
        analytics.elapsed_secs,
        analytics.elapsed_secs / 60.0
    ));
    md.push_str(&format!(
        "- **Resumed**: {}\n",
        if analytics.resumed { "yes" } else { "no" }
    ));
    if analytics.interrupted {
        md.push_str("- **Status**: interrupted, resume to finish the remaining targets\n");
    } else {
        md.push_str("- **Status**: completed\n");
    }
    md.push('\n');

    // Input
    md.push_str("## Input\n\n");
    md.push_str(&format!("- **Rows Read**: {}\n", analytics.input.rows));
    md.push_str(&format!("- **Invalid Rows**: {}\n", analytics.input.invalid));
    md.push_str(&format!("- **Duplicate Sites**: {}\n", analytics.input.duplicates));
    md.push_str(&format!(
        "- **Already Completed**: {}\n",
        analytics.input.skipped_completed
    ));
    md.push_str(&format!("- **Dispatched**: {}\n\n", analytics.input.dispatched));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Targets Attempted**: {}\n", totals.attempted));
    md.push_str(&format!("- **Succeeded**: {}\n", totals.succeeded));
    md.push_str(&format!("- **Failed**: {}\n", totals.failed));
    md.push_str(&format!("- **Success Rate**: {:.2}%\n", analytics.success_rate));
    md.push_str(&format!("- **Emails Found**: {}\n", totals.emails_found));
    md.push_str(&format!("- **Pages Fetched**: {}\n", totals.pages_fetched));
    md.push_str(&format!(
        "- **Throughput**: {:.2} targets/sec ({} this run)\n",
        analytics.targets_per_second, analytics.processed
    ));
    md.push_str(&format!(
        "- **Average Time per Target**: {:.2} seconds\n\n",
        analytics.average_target_secs
    ));

    // Failure breakdown
    if !analytics.failure_breakdown.is_empty() {
        md.push_str("## Failure Breakdown\n\n");
        md.push_str("| Reason | Count | Percent |\n");
        md.push_str("|--------|-------|---------|\n");
        for bucket in &analytics.failure_breakdown {
            md.push_str(&format!(
                "| {} | {} | {:.2}% |\n",
                bucket.reason, bucket.count, bucket.percent
            ));
        }
        md.push('\n');
    }

    push_count_table(&mut md, "Emails by Source", "Source", &totals.emails_by_source);
    push_count_table(&mut md, "Site Types", "Type", &totals.site_types);
    push_count_table(
        &mut md,
        "Discovery Strategies",
        "Strategy",
        &totals.discovery_strategies,
    );

    md
}

fn push_count_table(md: &mut String, title: &str, label: &str, counts: &BTreeMap<String, u64>) {
    if counts.is_empty() {
        return;
    }

    md.push_str(&format!("## {}\n\n", title));
    md.push_str(&format!("| {} | Count |\n", label));
    md.push_str("|------|-------|\n");
    for (key, count) in counts {
        md.push_str(&format!("| {} | {} |\n", key, count));
    }
    md.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::analytics::{InputSummary, RunCounters};
    use chrono::Utc;
    use std::time::Duration;

    fn create_test_analytics() -> RunAnalytics {
        let mut totals = RunCounters {
            attempted: 10,
            succeeded: 6,
            failed: 4,
            emails_found: 9,
            pages_fetched: 31,
            ..RunCounters::default()
        };
        totals.failures_by_reason.insert("timeout".into(), 3);
        totals
            .failures_by_reason
            .insert("no_email_found_static".into(), 1);
        totals.emails_by_source.insert("homepage".into(), 9);
        totals.site_types.insert("static".into(), 10);

        RunAnalytics::finalize(
            totals,
            InputSummary {
                rows: 12,
                invalid: 1,
                duplicates: 1,
                skipped_completed: 0,
                dispatched: 10,
            },
            10,
            Utc::now(),
            Duration::from_secs(5),
            false,
            false,
        )
    }

    #[test]
    fn test_format_markdown_summary() {
        let md = format_markdown_summary(&create_test_analytics());

        assert!(md.contains("# Contact-Miner Run Summary"));
        assert!(md.contains("- **Success Rate**: 60.00%"));
        assert!(md.contains("- **Throughput**: 2.00 targets/sec (10 this run)"));
        assert!(md.contains("| timeout | 3 | 30.00% |"));
        assert!(md.contains("| homepage | 9 |"));
        assert!(md.contains("- **Status**: completed"));
    }

    #[test]
    fn test_empty_tables_are_omitted() {
        let md = format_markdown_summary(&create_test_analytics());
        assert!(!md.contains("## Discovery Strategies"));
    }

    #[test]
    fn test_generate_markdown_summary_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.md");

        generate_markdown_summary(&create_test_analytics(), &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("# Contact-Miner Run Summary"));
    }
}

//! Run counters and the end-of-run analytics record

use crate::model::TargetResult;
use crate::output::OutputResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

/// Running counters over completed targets
///
/// The counters are persisted inside the checkpoint, so a resumed run keeps
/// accumulating onto the totals of the interrupted one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunCounters {
    pub attempted: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub emails_found: u64,
    pub pages_fetched: u64,

    /// Wall-clock time spent inside the per-target pipeline, summed
    pub processing_ms: u64,

    /// Failure reason code -> count
    pub failures_by_reason: BTreeMap<String, u64>,

    /// Email source -> emails found
    pub emails_by_source: BTreeMap<String, u64>,

    /// Site type -> count
    pub site_types: BTreeMap<String, u64>,

    /// Discovery strategy -> count, for targets that were deep searched
    pub discovery_strategies: BTreeMap<String, u64>,
}

impl RunCounters {
    /// Folds one terminal result into the counters
    pub fn record(&mut self, result: &TargetResult) {
        self.attempted += 1;
        self.pages_fetched += u64::from(result.pages_fetched);
        self.processing_ms += result.elapsed.as_millis() as u64;
        *self
            .site_types
            .entry(result.site_type.as_str().to_string())
            .or_insert(0) += 1;

        if let Some(strategy) = result.discovery {
            *self
                .discovery_strategies
                .entry(strategy.as_str().to_string())
                .or_insert(0) += 1;
        }

        match &result.failure_reason {
            None => {
                self.succeeded += 1;
                let emails = result.email_count() as u64;
                if emails > 0 {
                    self.emails_found += emails;
                    *self
                        .emails_by_source
                        .entry(result.email_source.as_str().to_string())
                        .or_insert(0) += emails;
                }
            }
            Some(reason) => {
                self.failed += 1;
                *self.failures_by_reason.entry(reason.code()).or_insert(0) += 1;
            }
        }
    }

    /// Percentage of attempted targets that succeeded
    pub fn success_rate(&self) -> f64 {
        percent(self.succeeded, self.attempted)
    }
}

/// Input-side counts of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSummary {
    /// Data rows read from the input table
    pub rows: usize,

    /// Rows without a usable URL
    pub invalid: usize,

    /// Rows naming a site already listed earlier in the input
    pub duplicates: usize,

    /// Targets skipped because a previous run completed them
    pub skipped_completed: usize,

    /// Targets handed to the runner
    pub dispatched: usize,
}

/// Share of failures with one reason
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureBucket {
    pub reason: String,
    pub count: u64,

    /// Percentage of all attempted targets
    pub percent: f64,
}

/// Structured end-of-run summary written to `analytics.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunAnalytics {
    pub started_at: String,
    pub finished_at: String,
    pub resumed: bool,

    /// True when the run stopped on an interrupt before finishing its input
    pub interrupted: bool,

    pub input: InputSummary,

    /// Counters over every completed target, earlier resumed runs included
    pub totals: RunCounters,

    pub success_rate: f64,
    pub failure_breakdown: Vec<FailureBucket>,

    /// Targets completed by this invocation
    pub processed: u64,
    pub elapsed_secs: f64,
    pub targets_per_second: f64,
    pub average_target_secs: f64,
}

impl RunAnalytics {
    /// Finalizes the analytics of an invocation
    ///
    /// # Arguments
    ///
    /// * `totals` - Counters as persisted in the final checkpoint
    /// * `input` - Input-side counts
    /// * `processed` - Targets completed by this invocation
    /// * `started_at` - Start of this invocation
    /// * `elapsed` - Duration of this invocation
    /// * `resumed` - Whether this invocation resumed a checkpoint
    /// * `interrupted` - Whether it stopped on an interrupt
    #[allow(clippy::too_many_arguments)]
    pub fn finalize(
        totals: RunCounters,
        input: InputSummary,
        processed: u64,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        resumed: bool,
        interrupted: bool,
    ) -> Self {
        let elapsed_secs = elapsed.as_secs_f64();
        let targets_per_second = if elapsed_secs > 0.0 {
            processed as f64 / elapsed_secs
        } else {
            0.0
        };
        let average_target_secs = if totals.attempted > 0 {
            totals.processing_ms as f64 / 1000.0 / totals.attempted as f64
        } else {
            0.0
        };

        let mut failure_breakdown: Vec<FailureBucket> = totals
            .failures_by_reason
            .iter()
            .map(|(reason, count)| FailureBucket {
                reason: reason.clone(),
                count: *count,
                percent: percent(*count, totals.attempted),
            })
            .collect();
        failure_breakdown.sort_by(|a, b| b.count.cmp(&a.count).then(a.reason.cmp(&b.reason)));

        Self {
            started_at: started_at.to_rfc3339(),
            finished_at: Utc::now().to_rfc3339(),
            resumed,
            interrupted,
            input,
            success_rate: totals.success_rate(),
            totals,
            failure_breakdown,
            processed,
            elapsed_secs,
            targets_per_second,
            average_target_secs,
        }
    }
}

/// Writes the analytics record as pretty-printed JSON
pub fn write_analytics(analytics: &RunAnalytics, path: &Path) -> OutputResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, analytics)?;
    writer.flush()?;
    Ok(())
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

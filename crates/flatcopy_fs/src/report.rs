//! Copy report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::SpecCopyError;

/// Aggregate counters and diagnostics for one `copy_tree` run.
#[derive(Debug, Default, Clone)]
pub struct ReportCopy {
    /// Total files visited.
    pub cnt_scanned: u64,
    /// Files accepted by the selector.
    pub cnt_matched: u64,
    /// Files whose bytes and metadata were written to the destination.
    pub cnt_copied: u64,
    /// Matched files not written (conflict skip or dry run).
    pub cnt_skipped: u64,
    /// Copies that replaced an existing destination file.
    pub cnt_overwritten: u64,
    /// The run stopped early on a cancel request.
    pub if_interrupted: bool,
    /// Non-fatal warnings collected during traversal/copy.
    pub warnings: Vec<String>,
    /// Per-file failures.
    pub errors: Vec<SpecCopyError>,
}

impl ReportCopy {
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_matched".to_string(), self.cnt_matched);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_overwritten".to_string(), self.cnt_overwritten);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let mut txt = format!(
            "{prefix} scanned={} matched={} copied={} skipped={} overwritten={} errors={} warnings={}",
            self.cnt_scanned,
            self.cnt_matched,
            self.cnt_copied,
            self.cnt_skipped,
            self.cnt_overwritten,
            self.error_count(),
            self.warning_count()
        );
        if self.if_interrupted {
            txt.push_str(" (interrupted)");
        }
        txt
    }
}

impl fmt::Display for ReportCopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[COPY]"))
    }
}

/// Mutable accumulator for copy statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportCopyBuilder {
    report: ReportCopy,
}

impl ReportCopyBuilder {
    /// Increment scanned count by one.
    pub fn add_scanned(&mut self) {
        self.report.cnt_scanned += 1;
    }

    /// Increment matched count by one.
    pub fn add_matched(&mut self) {
        self.report.cnt_matched += 1;
    }

    /// Increment copied count by one.
    pub fn add_copied(&mut self) {
        self.report.cnt_copied += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.report.cnt_skipped += 1;
    }

    /// Increment overwritten count by one.
    pub fn add_overwritten(&mut self) {
        self.report.cnt_overwritten += 1;
    }

    /// Flag the run as stopped early.
    pub fn mark_interrupted(&mut self) {
        self.report.if_interrupted = true;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        tracing::warn!("{warning}");
        self.report.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        tracing::warn!(path = %path.display(), "{exception}");
        self.report.errors.push(SpecCopyError { path, exception });
    }

    /// Copied count so far.
    pub fn cnt_copied(&self) -> u64 {
        self.report.cnt_copied
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportCopy {
        self.report
    }
}

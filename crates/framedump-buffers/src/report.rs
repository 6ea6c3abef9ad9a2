//! Structured report channel for non-fatal findings.
//!
//! Parse-time structural problems abort a mesh through
//! [`DumpError`](crate::DumpError); everything advisory (missing UV channels,
//! 4D positions, experimental topologies, skipped files...) is collected here
//! so the core stays decoupled from whichever front end displays it. Entries
//! are mirrored to `tracing` at a matching level as they are recorded.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub severity: Severity,
    pub message: String,
}

/// Accumulates severity-tagged findings across one import/export operation.
#[derive(Debug, Default)]
pub struct Report {
    entries: Vec<ReportEntry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{message}");
        self.push(Severity::Info, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{message}");
        self.push(Severity::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!("{message}");
        self.push(Severity::Error, message);
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.entries.push(ReportEntry { severity, message });
    }

    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// True if anything at `Warning` level or above was recorded.
    pub fn has_warnings(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.severity >= Severity::Warning)
    }
}

//! Finding ordering and the human-readable findings report.

use std::fmt;

use serde::Serialize;

use modsort_core::{Finding, Severity};

/// Put findings into presentation order: errors before warnings, then by kind
/// and the identities involved. Nothing is added or removed.
pub fn summarize(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| a.identities.cmp(&b.identities))
            .then_with(|| a.paths.cmp(&b.paths))
            .then_with(|| a.cause.cmp(&b.cause))
            .then_with(|| a.detail.cmp(&b.detail))
    });
    findings
}

/// Every finding from one `check` or `sort` run.
#[derive(Debug, Default, Serialize)]
pub struct DiagnosticReport {
    pub findings: Vec<Finding>,
}

impl DiagnosticReport {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self {
            findings: summarize(findings),
        }
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.findings.is_empty() {
            return write!(f, "No problems found.");
        }
        writeln!(
            f,
            "Findings ({}): {} error(s), {} warning(s)",
            self.findings.len(),
            self.error_count(),
            self.warning_count()
        )?;
        for finding in &self.findings {
            writeln!(f, "  {finding}")?;
        }
        Ok(())
    }
}

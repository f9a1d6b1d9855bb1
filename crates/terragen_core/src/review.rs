//! Validation findings and verdicts.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Severity of a single finding.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// A single validation finding.
///
/// Produced by validators, consumed by the next generator invocation as
/// feedback. Messages are kept short so the feedback loop does not flood
/// later prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// File or resource the finding refers to
    pub file: String,
    /// Short description of the issue
    pub message: String,
    /// Suggested fix
    #[serde(default)]
    pub fix: String,
}

impl Finding {
    pub fn error(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            file: file.into(),
            message: message.into(),
            fix: String::new(),
        }
    }

    pub fn warning(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            file: file.into(),
            message: message.into(),
            fix: String::new(),
        }
    }

    pub fn with_fix(mut self, fix: impl Into<String>) -> Self {
        self.fix = fix.into();
        self
    }
}

/// Pass/Fail outcome of one validation attempt.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

/// Result of reviewing one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub verdict: Verdict,
    pub findings: Vec<Finding>,
    pub summary: Option<String>,
}

impl Review {
    /// Build a review from findings.
    ///
    /// The verdict is Pass only when no Error-severity finding is present.
    /// Warnings and informational findings never block a Pass.
    pub fn from_findings(findings: Vec<Finding>) -> Self {
        let verdict = if findings.iter().any(|f| f.severity == Severity::Error) {
            Verdict::Fail
        } else {
            Verdict::Pass
        };
        Self {
            verdict,
            findings,
            summary: None,
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// Count of Error-severity findings.
    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }
}

/// Options controlling how findings are rendered into feedback.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackOptions {
    /// Drop duplicate (severity, file, message) entries within one rendering
    pub dedupe: bool,
}

impl Default for FeedbackOptions {
    fn default() -> Self {
        Self { dedupe: true }
    }
}

/// Render findings into the feedback text handed to the next generator call.
///
/// Errors are listed before warnings, each with its suggested fix.
/// Informational findings are omitted.
pub fn render_feedback(findings: &[Finding], options: FeedbackOptions) -> String {
    let mut seen: HashSet<(Severity, &str, &str)> = HashSet::new();
    let selected: Vec<&Finding> = findings
        .iter()
        .filter(|f| f.severity != Severity::Info)
        .filter(|f| !options.dedupe || seen.insert((f.severity, f.file.as_str(), f.message.as_str())))
        .collect();

    let mut parts = vec!["The Terraform code has the following issues that need to be fixed:".to_string()];

    let errors: Vec<&&Finding> = selected
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .collect();
    if !errors.is_empty() {
        parts.push("\n**CRITICAL ERRORS:**".to_string());
        for finding in errors {
            parts.push(format!(
                "- [{}] {}\n  Fix: {}",
                finding.file, finding.message, finding.fix
            ));
        }
    }

    let warnings: Vec<&&Finding> = selected
        .iter()
        .filter(|f| f.severity == Severity::Warning)
        .collect();
    if !warnings.is_empty() {
        parts.push("\n**WARNINGS:**".to_string());
        for finding in warnings {
            parts.push(format!(
                "- [{}] {}\n  Suggestion: {}",
                finding.file, finding.message, finding.fix
            ));
        }
    }

    parts.join("\n")
}

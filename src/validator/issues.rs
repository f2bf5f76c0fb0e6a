use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// Machine-readable kind of a reported condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    /// Declared type is absent from the taxonomy
    UnknownType,
    /// Page root entity declares no type at all
    MissingType,
    MissingExpectedProperty,
    /// Nested entity type is outside the property's allowed range
    PropertyRangeMismatch,
    UnresolvedReference,
    /// Two writers disagreed on a property of a shared entity
    MergeConflict,
    /// A structured-data block failed to parse
    ParseError,
    /// The page stayed unschematized after synthesis failed
    SynthesisFailed,
    FetchFailed,
}

impl IssueCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownType => "unknown_type",
            Self::MissingType => "missing_type",
            Self::MissingExpectedProperty => "missing_expected_property",
            Self::PropertyRangeMismatch => "property_range_mismatch",
            Self::UnresolvedReference => "unresolved_reference",
            Self::MergeConflict => "merge_conflict",
            Self::ParseError => "parse_error",
            Self::SynthesisFailed => "synthesis_failed",
            Self::FetchFailed => "fetch_failed",
        }
    }

    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::UnknownType
            | Self::MissingType
            | Self::UnresolvedReference
            | Self::SynthesisFailed
            | Self::FetchFailed => Severity::Error,
            Self::MissingExpectedProperty
            | Self::PropertyRangeMismatch
            | Self::MergeConflict
            | Self::ParseError => Severity::Warning,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One non-fatal condition surfaced in the session report
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Entity identifier, or the page URL for page-level conditions
    pub subject: String,
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
}

impl ValidationIssue {
    /// Build an issue with the code's default severity
    pub fn new(subject: impl Into<String>, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            severity: code.severity(),
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{level}] {} {}: {}", self.code, self.subject, self.message)
    }
}

/// Sort by (subject, code, message) and drop exact duplicates
pub fn sort_issues(issues: &mut Vec<ValidationIssue>) {
    issues.sort_by(|a, b| {
        (&a.subject, a.code, &a.message).cmp(&(&b.subject, b.code, &b.message))
    });
    issues.dedup();
}

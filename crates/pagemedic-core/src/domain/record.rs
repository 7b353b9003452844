//! Typed failure taxonomy and classified error records.

use serde::{Deserialize, Serialize};

use crate::domain::probe::ProbeResult;
use crate::domain::target::PageTarget;

/// Closed taxonomy of page-level symptoms.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    ServerError,
    PermissionDenied,
    ComponentMissing,
    ConsoleError,
    NetworkError,
    BlankContent,
    /// Reserved for externally constructed records; the classifier never
    /// emits it.
    Other,
}

impl ErrorKind {
    /// All kinds in canonical severity order.
    pub const ALL: [ErrorKind; 8] = [
        ErrorKind::NotFound,
        ErrorKind::ServerError,
        ErrorKind::PermissionDenied,
        ErrorKind::ComponentMissing,
        ErrorKind::ConsoleError,
        ErrorKind::NetworkError,
        ErrorKind::BlankContent,
        ErrorKind::Other,
    ];

    /// Canonical urgency rank; lower is more urgent.
    pub fn severity(self) -> u8 {
        match self {
            ErrorKind::NotFound => 1,
            ErrorKind::ServerError => 2,
            ErrorKind::PermissionDenied => 3,
            ErrorKind::ComponentMissing => 4,
            ErrorKind::ConsoleError => 5,
            ErrorKind::NetworkError => 5,
            ErrorKind::BlankContent => 6,
            ErrorKind::Other => 7,
        }
    }

    /// Human-facing priority bucket used in report rendering.
    pub fn priority_label(self) -> &'static str {
        match self.severity() {
            1 | 2 => "critical",
            3 | 4 => "high",
            5 => "medium",
            _ => "low",
        }
    }

    /// Snake-case name matching the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::ServerError => "server_error",
            ErrorKind::PermissionDenied => "permission_denied",
            ErrorKind::ComponentMissing => "component_missing",
            ErrorKind::ConsoleError => "console_error",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::BlankContent => "blank_content",
            ErrorKind::Other => "other",
        }
    }

    /// One-line remediation hint surfaced in advisory notes and the report's
    /// recommendations section.
    pub fn remediation_hint(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "add the route to the router manifest or restore the page",
            ErrorKind::ServerError => "check backend service logs for the failing endpoint",
            ErrorKind::PermissionDenied => "verify the session role grants access to this page",
            ErrorKind::ComponentMissing => "restore or re-register the missing page components",
            ErrorKind::ConsoleError => "fix the script errors reported in the browser console",
            ErrorKind::NetworkError => "verify the failing API endpoints are deployed and reachable",
            ErrorKind::BlankContent => "check data loading and rendering for this page",
            ErrorKind::Other => "inspect the probe evidence manually",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified failure, derived from a [`ProbeResult`].
///
/// Many records may derive from one probe; none is ever mutated after
/// classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub target: PageTarget,
    pub kind: ErrorKind,
    pub message: String,
    /// The full probe the record was derived from.
    pub evidence: ProbeResult,
    pub severity: u8,
}

impl ErrorRecord {
    /// Build a record from its evidence; severity comes from the kind's
    /// canonical rank.
    pub fn from_evidence(kind: ErrorKind, message: impl Into<String>, evidence: &ProbeResult) -> Self {
        Self {
            target: evidence.target.clone(),
            kind,
            message: message.into(),
            evidence: evidence.clone(),
            severity: kind.severity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ranks_are_ordered() {
        assert_eq!(ErrorKind::NotFound.severity(), 1);
        assert_eq!(ErrorKind::ConsoleError.severity(), 5);
        assert_eq!(ErrorKind::NetworkError.severity(), 5);
        assert!(ErrorKind::BlankContent.severity() > ErrorKind::ComponentMissing.severity());
    }

    #[test]
    fn test_priority_labels() {
        assert_eq!(ErrorKind::NotFound.priority_label(), "critical");
        assert_eq!(ErrorKind::ServerError.priority_label(), "critical");
        assert_eq!(ErrorKind::ComponentMissing.priority_label(), "high");
        assert_eq!(ErrorKind::NetworkError.priority_label(), "medium");
        assert_eq!(ErrorKind::BlankContent.priority_label(), "low");
    }

    #[test]
    fn test_as_str_matches_serde_name() {
        for kind in ErrorKind::ALL {
            let json = serde_json::to_string(&kind).expect("serialize");
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }
}

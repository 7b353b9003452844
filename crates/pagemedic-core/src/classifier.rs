//! Rule-based classification of probe signals into typed error records.
//!
//! [`classify`] is a pure, total function: the same [`ProbeResult`] always
//! yields the same records. Rules are applied independently in a fixed
//! order and all matches are kept; downstream planning orders work by
//! severity, not by rule position.

use crate::domain::{ErrorKind, ErrorRecord, ProbeResult};

/// Map one probe's signals to zero or more error records.
///
/// An empty vec is the healthy case. Matching is case-insensitive
/// substring matching over title and captured body text.
pub fn classify(result: &ProbeResult) -> Vec<ErrorRecord> {
    let mut records = Vec::new();
    let title = result.title.to_lowercase();
    let body = result.body_excerpt.to_lowercase();

    // Rule 1: missing route.
    if result.http_status == 404 || title.contains("404") || title.contains("not found") {
        records.push(ErrorRecord::from_evidence(
            ErrorKind::NotFound,
            format!(
                "page not found: status {} for {}",
                result.http_status, result.target.path
            ),
            result,
        ));
    }

    // Rule 2: backend failure.
    if result.http_status >= 500 {
        records.push(ErrorRecord::from_evidence(
            ErrorKind::ServerError,
            format!("server error: status {}", result.http_status),
            result,
        ));
    }

    // Rule 3: access denied, detected from rendered text.
    if ["permission", "forbidden", "unauthorized"]
        .iter()
        .any(|needle| title.contains(needle) || body.contains(needle))
    {
        records.push(ErrorRecord::from_evidence(
            ErrorKind::PermissionDenied,
            "page reports a permission or authorization failure",
            result,
        ));
    }

    // Rule 4: expected UI absent on an otherwise blank render.
    if !result.missing_selectors.is_empty() && result.is_blank {
        let missing: Vec<&str> = result
            .missing_selectors
            .iter()
            .map(String::as_str)
            .collect();
        records.push(ErrorRecord::from_evidence(
            ErrorKind::ComponentMissing,
            format!("expected components missing: {}", missing.join(", ")),
            result,
        ));
    }

    // Rule 5: one record aggregating all error-level console messages.
    let console_errors: Vec<&str> = result
        .console_messages
        .iter()
        .filter(|m| m.level == crate::domain::ConsoleLevel::Error)
        .map(|m| m.text.as_str())
        .collect();
    if !console_errors.is_empty() {
        records.push(ErrorRecord::from_evidence(
            ErrorKind::ConsoleError,
            format!(
                "{} console error(s): {}",
                console_errors.len(),
                console_errors.join("; ")
            ),
            result,
        ));
    }

    // Rule 6: one record aggregating all failed requests.
    if !result.network_failures.is_empty() {
        let first = &result.network_failures[0];
        records.push(ErrorRecord::from_evidence(
            ErrorKind::NetworkError,
            format!(
                "{} failed request(s), first: {} ({})",
                result.network_failures.len(),
                first.url,
                first.reason
            ),
            result,
        ));
    }

    // Rule 7: blank page with no more specific explanation.
    if result.is_blank && records.is_empty() {
        records.push(ErrorRecord::from_evidence(
            ErrorKind::BlankContent,
            "page rendered no meaningful content",
            result,
        ));
    }

    records
}

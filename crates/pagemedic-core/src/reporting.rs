//! Report artifact persistence and Markdown rendering.
//!
//! Writes `<dir>/<run_id>/report.json` with a SHA-256 digest sidecar and
//! verifies the digest on read-back. Markdown rendering is a stateless
//! formatting step over the final [`Report`]; rendering the same report
//! twice yields byte-identical output.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::domain::{CoreError, CoreResult, ErrorKind};
use crate::report::Report;

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Persist `<dir>/<run_id>/report.json` and `<dir>/<run_id>/report.digest`.
pub fn write_report_json(dir: &Path, report: &Report) -> CoreResult<PathBuf> {
    let run_dir = dir.join(&report.run_id);
    std::fs::create_dir_all(&run_dir)?;

    let artifact_path = run_dir.join("report.json");
    let digest_path = run_dir.join("report.digest");
    let json = serde_json::to_vec_pretty(report)?;
    let digest = sha256_hex(&json);

    std::fs::write(&artifact_path, &json)?;
    std::fs::write(&digest_path, digest.as_bytes())?;

    Ok(artifact_path)
}

/// Read back `<dir>/<run_id>/report.json`, verifying the digest sidecar.
pub fn read_report_artifact(dir: &Path, run_id: &str) -> CoreResult<Report> {
    let run_dir = dir.join(run_id);
    let artifact_path = run_dir.join("report.json");
    let digest_path = run_dir.join("report.digest");

    if !artifact_path.exists() {
        return Err(CoreError::ArtifactMissing {
            path: artifact_path,
        });
    }

    let json = std::fs::read(&artifact_path)?;
    let digest = std::fs::read_to_string(&digest_path)?;
    let actual = sha256_hex(&json);
    if digest.trim() != actual {
        return Err(CoreError::DigestMismatch {
            expected: digest.trim().to_string(),
            actual,
        });
    }

    Ok(serde_json::from_slice(&json)?)
}

/// Render the report as a stable Markdown summary.
pub fn render_markdown(report: &Report) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Pagemedic Report: {}\n\n", report.run_id));
    out.push_str(&format!("Started: {}\n\n", report.started_at.to_rfc3339()));

    let s = &report.summary;
    out.push_str("## Summary\n\n");
    out.push_str(&format!("- targets probed: {}\n", s.total));
    out.push_str(&format!("- healthy: {}\n", s.successful));
    out.push_str(&format!("- failing: {}\n", s.failed));
    out.push_str(&format!("- success rate: {:.1}%\n", s.success_rate * 100.0));
    out.push_str(&format!(
        "- repairs attempted: {}, completed: {}, failed: {}\n\n",
        s.repairs_attempted, s.repairs_completed, s.repairs_failed
    ));

    out.push_str("## Errors by Kind\n\n");
    if s.by_kind.is_empty() {
        out.push_str("none\n");
    } else {
        for kind in ErrorKind::ALL {
            if let Some(count) = s.by_kind.get(kind.as_str()) {
                out.push_str(&format!(
                    "- `{}` ({}): {}\n",
                    kind.as_str(),
                    kind.priority_label(),
                    count
                ));
            }
        }
    }
    out.push('\n');

    out.push_str("## Targets\n\n");
    if report.probes.is_empty() {
        out.push_str("none\n");
    } else {
        for probe in &report.probes {
            out.push_str(&format!(
                "- `{}`: status {}, {} ms\n",
                probe.target.path, probe.http_status, probe.load_time_ms
            ));
        }
    }
    out.push('\n');

    out.push_str("## Failing Targets\n\n");
    if report.errors.is_empty() {
        out.push_str("none\n");
    } else {
        for error in &report.errors {
            out.push_str(&format!(
                "- `{}`: {} (severity {}): {}\n",
                error.target.path, error.kind, error.severity, error.message
            ));
        }
    }
    out.push('\n');

    out.push_str("## Repairs\n\n");
    if report.repairs.is_empty() {
        out.push_str("none\n");
    } else {
        for repair in &report.repairs {
            if repair.success {
                out.push_str(&format!(
                    "- `{}` [{}]: completed ({})\n",
                    repair.task.record.target.path,
                    repair.task.record.kind,
                    repair.action.as_deref().unwrap_or("-")
                ));
            } else {
                out.push_str(&format!(
                    "- `{}` [{}]: failed ({})\n",
                    repair.task.record.target.path,
                    repair.task.record.kind,
                    repair.reason.as_deref().unwrap_or("-")
                ));
            }
        }
    }
    out.push('\n');

    out.push_str("## Recommendations\n\n");
    let mut any = false;
    for kind in ErrorKind::ALL {
        if s.by_kind.contains_key(kind.as_str()) {
            out.push_str(&format!("- {}: {}\n", kind, kind.remediation_hint()));
            any = true;
        }
    }
    if !any {
        out.push_str("none\n");
    }

    out
}

/// Persist `<dir>/<run_id>/report.md`.
pub fn write_report_md(dir: &Path, report: &Report) -> CoreResult<PathBuf> {
    let run_dir = dir.join(&report.run_id);
    std::fs::create_dir_all(&run_dir)?;
    let path = run_dir.join("report.md");
    std::fs::write(&path, render_markdown(report))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorRecord, PageTarget, ProbeResult};
    use chrono::{DateTime, Utc};

    fn fixed_start() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .expect("parse RFC3339")
            .with_timezone(&Utc)
    }

    fn failing_report() -> Report {
        let mut report = Report::new("run-golden", fixed_start());
        let mut probe = ProbeResult::empty(PageTarget::new("missing", "/missing", "admin"));
        probe.http_status = 404;
        probe.load_time_ms = 120;
        report.add_probe(probe.clone());
        report.add_error(ErrorRecord::from_evidence(
            ErrorKind::NotFound,
            "page not found: status 404 for /missing",
            &probe,
        ));
        report
    }

    #[test]
    fn test_empty_report_markdown_golden() {
        let report = Report::new("run-empty", fixed_start());
        let actual = render_markdown(&report);
        let expected = "# Pagemedic Report: run-empty\n\n\
            Started: 2026-01-01T00:00:00+00:00\n\n\
            ## Summary\n\n\
            - targets probed: 0\n\
            - healthy: 0\n\
            - failing: 0\n\
            - success rate: 0.0%\n\
            - repairs attempted: 0, completed: 0, failed: 0\n\n\
            ## Errors by Kind\n\nnone\n\n\
            ## Targets\n\nnone\n\n\
            ## Failing Targets\n\nnone\n\n\
            ## Repairs\n\nnone\n\n\
            ## Recommendations\n\nnone\n";
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_markdown_render_is_stable() {
        let report = failing_report();
        let first = render_markdown(&report);
        let second = render_markdown(&report);
        assert_eq!(first, second);
        assert!(first.contains("- `not_found` (critical): 1"));
        assert!(first.contains("- `/missing`: status 404, 120 ms"));
        assert!(first.contains("- not_found: add the route to the router manifest"));
    }

    #[test]
    fn test_artifact_roundtrip_with_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = failing_report();

        let path = write_report_json(dir.path(), &report).expect("write artifact");
        assert!(path.ends_with("run-golden/report.json"));

        let back = read_report_artifact(dir.path(), "run-golden").expect("read artifact");
        assert_eq!(back, report);
    }

    #[test]
    fn test_corrupted_artifact_detected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let report = failing_report();
        let path = write_report_json(dir.path(), &report).expect("write artifact");

        let mut raw = std::fs::read_to_string(&path).expect("read");
        raw = raw.replace("/missing", "/tampered");
        std::fs::write(&path, raw).expect("tamper");

        let err = read_report_artifact(dir.path(), "run-golden").unwrap_err();
        assert!(matches!(err, CoreError::DigestMismatch { .. }));
    }

    #[test]
    fn test_missing_artifact_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_report_artifact(dir.path(), "run-nope").unwrap_err();
        assert!(matches!(err, CoreError::ArtifactMissing { .. }));
    }
}

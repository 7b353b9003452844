//! Built-in repair methods.
//!
//! Three advisory methods mirror what an operator would try first:
//! scaffold a stub page for a missing route, re-check the endpoints the
//! evidence says failed, and record a remediation note. All of them fold
//! their own failures into `success = false` outcomes.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use pagemedic_core::domain::{MethodOutcome, RepairTask};
use pagemedic_core::manifest::slug_from_path;

use crate::executor::{MethodRegistry, RepairMethod};

/// Creates `<pages_root>/<slug>.html` for a missing page or component.
///
/// Succeeds when the stub is freshly created; an already existing stub is
/// a failure (the chain should fall through to an advisory instead of
/// claiming the same fix twice).
pub struct StubPageScaffold {
    pages_root: PathBuf,
}

impl StubPageScaffold {
    pub fn new(pages_root: impl Into<PathBuf>) -> Self {
        Self {
            pages_root: pages_root.into(),
        }
    }
}

#[async_trait]
impl RepairMethod for StubPageScaffold {
    fn name(&self) -> &str {
        "stub_page_scaffold"
    }

    async fn attempt(&self, task: &RepairTask) -> MethodOutcome {
        let target = &task.record.target;
        let stub_path = self
            .pages_root
            .join(format!("{}.html", slug_from_path(&target.path)));

        if stub_path.exists() {
            return MethodOutcome::failure(format!(
                "page stub already exists: {}",
                stub_path.display()
            ));
        }

        let stub = format!(
            "<!DOCTYPE html>\n<html>\n<head><title>{path}</title></head>\n\
             <body>\n<!-- placeholder for {path} ({category}) -->\n\
             <h1>{path}</h1>\n<p>This page is under construction.</p>\n</body>\n</html>\n",
            path = target.path,
            category = target.category,
        );

        if let Err(e) = std::fs::create_dir_all(&self.pages_root) {
            return MethodOutcome::failure(format!("cannot create pages root: {e}"));
        }
        match std::fs::write(&stub_path, stub) {
            Ok(()) => MethodOutcome::success(format!("created {}", stub_path.display())),
            Err(e) => MethodOutcome::failure(format!("cannot write page stub: {e}")),
        }
    }
}

/// Re-issues HEAD requests against the endpoints the evidence recorded as
/// failing (falling back to the target's expected endpoints). Succeeds
/// when every endpoint now answers below 500.
pub struct EndpointRecheck {
    client: reqwest::Client,
    base_url: String,
}

impl EndpointRecheck {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn absolute(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), url)
        }
    }
}

#[async_trait]
impl RepairMethod for EndpointRecheck {
    fn name(&self) -> &str {
        "endpoint_recheck"
    }

    async fn attempt(&self, task: &RepairTask) -> MethodOutcome {
        let evidence = &task.record.evidence;
        let mut endpoints: Vec<String> = evidence
            .network_failures
            .iter()
            .map(|f| f.url.clone())
            .collect();
        if endpoints.is_empty() {
            endpoints = task.record.target.expected_endpoints.iter().cloned().collect();
        }
        if endpoints.is_empty() {
            return MethodOutcome::failure("no endpoints to recheck");
        }

        for endpoint in &endpoints {
            let url = self.absolute(endpoint);
            match self.client.head(&url).send().await {
                Ok(response) if response.status().as_u16() < 500 => {}
                Ok(response) => {
                    return MethodOutcome::failure(format!(
                        "endpoint {} still failing with status {}",
                        endpoint,
                        response.status().as_u16()
                    ));
                }
                Err(e) => {
                    return MethodOutcome::failure(format!(
                        "endpoint {endpoint} unreachable: {e}"
                    ));
                }
            }
        }

        MethodOutcome::success(format!(
            "{} endpoint(s) rechecked, all answering",
            endpoints.len()
        ))
    }
}

/// Appends a per-kind remediation hint to `<notes_dir>/advisories.md`.
/// The terminal advisory in every standard chain.
pub struct AdvisoryNote {
    notes_dir: PathBuf,
}

impl AdvisoryNote {
    pub fn new(notes_dir: impl Into<PathBuf>) -> Self {
        Self {
            notes_dir: notes_dir.into(),
        }
    }
}

#[async_trait]
impl RepairMethod for AdvisoryNote {
    fn name(&self) -> &str {
        "advisory_note"
    }

    async fn attempt(&self, task: &RepairTask) -> MethodOutcome {
        let record = &task.record;
        let line = format!(
            "- [{}] `{}`: {} ({})\n",
            record.kind,
            record.target.path,
            record.kind.remediation_hint(),
            record.message,
        );

        if let Err(e) = std::fs::create_dir_all(&self.notes_dir) {
            return MethodOutcome::failure(format!("cannot create notes dir: {e}"));
        }
        let path = self.notes_dir.join("advisories.md");
        let existing = std::fs::read_to_string(&path).unwrap_or_default();
        match std::fs::write(&path, existing + &line) {
            Ok(()) => MethodOutcome::success("advisory recorded"),
            Err(e) => MethodOutcome::failure(format!("cannot write advisory: {e}")),
        }
    }
}

/// The registry the CLI wires by default: all three built-in methods.
pub fn standard_registry(
    pages_root: impl Into<PathBuf>,
    notes_dir: impl Into<PathBuf>,
    base_url: impl Into<String>,
) -> MethodRegistry {
    let mut registry = MethodRegistry::new();
    registry.register(Arc::new(StubPageScaffold::new(pages_root)));
    registry.register(Arc::new(EndpointRecheck::new(base_url)));
    registry.register(Arc::new(AdvisoryNote::new(notes_dir)));
    registry
}

//! Route manifest loading and validation.
//!
//! The manifest is a JSON document listing every page the engine should
//! probe:
//!
//! ```json
//! {
//!   "targets": [
//!     { "path": "/dashboard", "category": "admin",
//!       "expected_selectors": [".sidebar", "#main-content"] }
//!   ]
//! }
//! ```
//!
//! `id` is optional and defaults to a slug derived from the path.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use serde::Deserialize;

use crate::domain::{CoreError, CoreResult, PageTarget};

#[derive(Debug, Deserialize)]
struct ManifestDoc {
    targets: Vec<ManifestTarget>,
}

#[derive(Debug, Deserialize)]
struct ManifestTarget {
    #[serde(default)]
    id: Option<String>,
    path: String,
    category: String,
    #[serde(default)]
    expected_selectors: BTreeSet<String>,
    #[serde(default)]
    expected_endpoints: BTreeSet<String>,
}

/// Derive a stable identifier from a path: `/admin/user-list` becomes
/// `admin-user-list`, `/` becomes `root`.
pub fn slug_from_path(path: &str) -> String {
    let slug: String = path
        .trim_matches('/')
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let slug = slug.trim_matches('-').to_string();
    if slug.is_empty() {
        "root".to_string()
    } else {
        slug
    }
}

/// Parse and validate a manifest document from a JSON string.
pub fn parse_manifest(json: &str) -> CoreResult<Vec<PageTarget>> {
    let doc: ManifestDoc = serde_json::from_str(json)?;

    if doc.targets.is_empty() {
        return Err(CoreError::InvalidManifest {
            reason: "manifest has no targets".to_string(),
        });
    }

    let mut seen_ids = HashSet::new();
    let mut targets = Vec::with_capacity(doc.targets.len());
    for entry in doc.targets {
        if entry.path.is_empty() || !entry.path.starts_with('/') {
            return Err(CoreError::InvalidManifest {
                reason: format!("path '{}' must start with '/'", entry.path),
            });
        }
        let id = entry.id.unwrap_or_else(|| slug_from_path(&entry.path));
        if !seen_ids.insert(id.clone()) {
            return Err(CoreError::InvalidManifest {
                reason: format!("duplicate target id '{id}'"),
            });
        }
        targets.push(PageTarget {
            id,
            path: entry.path,
            category: entry.category,
            expected_selectors: entry.expected_selectors,
            expected_endpoints: entry.expected_endpoints,
        });
    }

    Ok(targets)
}

/// Load and validate a manifest file.
pub fn load_manifest(path: &Path) -> CoreResult<Vec<PageTarget>> {
    let json = std::fs::read_to_string(path)?;
    parse_manifest(&json)
}

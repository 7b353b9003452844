//! Page targets as declared by the route manifest.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One page to probe, as declared by the route manifest.
///
/// Immutable once constructed; identity is `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageTarget {
    /// Stable identifier, unique within a manifest.
    pub id: String,
    /// Absolute path on the site under test (always starts with `/`).
    pub path: String,
    /// Grouping key for repair serialization (e.g. `"admin"`, `"portal"`).
    pub category: String,
    /// Selectors that must be present on a healthy render.
    pub expected_selectors: BTreeSet<String>,
    /// API endpoints the page is expected to call.
    pub expected_endpoints: BTreeSet<String>,
}

impl PageTarget {
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            category: category.into(),
            expected_selectors: BTreeSet::new(),
            expected_endpoints: BTreeSet::new(),
        }
    }

    /// Add an expected selector.
    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.expected_selectors.insert(selector.into());
        self
    }

    /// Add an expected endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.expected_endpoints.insert(endpoint.into());
        self
    }
}

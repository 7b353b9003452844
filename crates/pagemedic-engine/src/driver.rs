//! The abstract browser-driver collaborator.
//!
//! The engine never constructs or configures the underlying browser; a
//! pre-authenticated [`DriverFactory`] is handed in and asked for one
//! [`Driver`] session per concurrent probe, so no two probes ever share
//! page state. Any [`DriverError`] means the session itself is unusable
//! and aborts the whole run; page-level failures are observations,
//! returned as data.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use pagemedic_core::domain::{ConsoleMessage, NetworkFailure};

/// Result of the primary navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationOutcome {
    /// HTTP status of the primary response; `0` when no response arrived.
    pub status: u16,
    /// URL after redirects.
    pub final_url: String,
}

/// Fatal infrastructure failures. Every variant aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("driver session unusable: {0}")]
    Session(String),

    #[error("driver transport failed: {0}")]
    Transport(String),

    #[error("no recorded fixture for path '{path}'")]
    FixtureMissing { path: String },

    #[error("driver protocol error: {0}")]
    Protocol(String),
}

/// Result type for driver operations.
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// One authenticated browser-automation session.
///
/// Console and network events are buffered by the session during
/// navigation; `drain_*` hands them over and clears the buffer, so a probe
/// observes exactly the events of its own visit.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Navigate to an absolute path on the site under test.
    async fn navigate(&self, path: &str) -> DriverResult<NavigationOutcome>;

    /// Wait until the page has settled, bounded by `timeout`.
    async fn wait_for_network_idle(&self, timeout: Duration) -> DriverResult<()>;

    /// Whether the selector currently matches an element.
    async fn query_selector_exists(&self, selector: &str) -> DriverResult<bool>;

    /// Evaluate a script in page context. Sessions without a JS runtime
    /// return `Value::Null`.
    async fn evaluate(&self, script: &str) -> DriverResult<serde_json::Value>;

    /// Hand over buffered console messages, clearing the buffer.
    async fn drain_console_events(&self) -> DriverResult<Vec<ConsoleMessage>>;

    /// Hand over buffered failed requests, clearing the buffer.
    async fn drain_network_failures(&self) -> DriverResult<Vec<NetworkFailure>>;

    /// Rendered text content of the current page.
    async fn content(&self) -> DriverResult<String>;

    /// Title of the current page.
    async fn title(&self) -> DriverResult<String>;
}

/// Hands out one browser context per concurrent probe.
///
/// Sessions from the same factory share credentials and transport but
/// never page state, so signals observed by one probe cannot leak into
/// another's result.
#[async_trait]
pub trait DriverFactory: Send + Sync {
    /// Open a fresh session against the site under test.
    async fn session(&self) -> DriverResult<Arc<dyn Driver>>;
}

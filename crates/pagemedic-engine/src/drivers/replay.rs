//! Deterministic fixture-replay driver sessions.
//!
//! Feeds the engine from a JSON fixture mapping path -> recorded page
//! snapshot, for rehearsing runs offline and for tests. A navigated path
//! with no recorded snapshot is a fatal [`DriverError::FixtureMissing`].
//!
//! [`ReplayDriverFactory`] shares the parsed fixture across sessions;
//! every session keeps its own current page and event buffers.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use pagemedic_core::domain::{ConsoleMessage, NetworkFailure};

use crate::driver::{Driver, DriverError, DriverFactory, DriverResult, NavigationOutcome};

/// One recorded page visit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub status: u16,
    #[serde(default)]
    pub final_url: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body_text: String,
    #[serde(default)]
    pub selectors_present: BTreeSet<String>,
    #[serde(default)]
    pub console: Vec<ConsoleMessage>,
    #[serde(default)]
    pub network_failures: Vec<NetworkFailure>,
}

#[derive(Debug, Deserialize)]
struct FixtureDoc {
    pages: BTreeMap<String, PageSnapshot>,
}

/// Opens [`ReplayDriver`] sessions over one parsed fixture.
pub struct ReplayDriverFactory {
    pages: Arc<BTreeMap<String, PageSnapshot>>,
}

impl ReplayDriverFactory {
    pub fn new(pages: BTreeMap<String, PageSnapshot>) -> Self {
        Self {
            pages: Arc::new(pages),
        }
    }

    /// Load a fixture file: `{ "pages": { "/path": { ...snapshot } } }`.
    pub fn from_file(path: &Path) -> DriverResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Transport(format!("cannot read fixture {path:?}: {e}")))?;
        let doc: FixtureDoc = serde_json::from_str(&raw)
            .map_err(|e| DriverError::Protocol(format!("invalid fixture {path:?}: {e}")))?;
        Ok(Self::new(doc.pages))
    }
}

#[async_trait]
impl DriverFactory for ReplayDriverFactory {
    async fn session(&self) -> DriverResult<Arc<dyn Driver>> {
        Ok(Arc::new(ReplayDriver {
            pages: Arc::clone(&self.pages),
            state: Mutex::new(ReplayState::default()),
        }))
    }
}

#[derive(Default)]
struct ReplayState {
    current: Option<PageSnapshot>,
    console: Vec<ConsoleMessage>,
    network_failures: Vec<NetworkFailure>,
}

/// One session replaying recorded snapshots instead of driving a browser.
pub struct ReplayDriver {
    pages: Arc<BTreeMap<String, PageSnapshot>>,
    state: Mutex<ReplayState>,
}

#[async_trait]
impl Driver for ReplayDriver {
    async fn navigate(&self, path: &str) -> DriverResult<NavigationOutcome> {
        let snapshot = self
            .pages
            .get(path)
            .cloned()
            .ok_or_else(|| DriverError::FixtureMissing {
                path: path.to_string(),
            })?;

        let outcome = NavigationOutcome {
            status: snapshot.status,
            final_url: snapshot.final_url.clone().unwrap_or_else(|| path.to_string()),
        };

        let mut state = self.state.lock().expect("replay state poisoned");
        state.console = snapshot.console.clone();
        state.network_failures = snapshot.network_failures.clone();
        state.current = Some(snapshot);
        Ok(outcome)
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> DriverResult<()> {
        Ok(())
    }

    async fn query_selector_exists(&self, selector: &str) -> DriverResult<bool> {
        let state = self.state.lock().expect("replay state poisoned");
        Ok(state
            .current
            .as_ref()
            .is_some_and(|s| s.selectors_present.contains(selector)))
    }

    async fn evaluate(&self, _script: &str) -> DriverResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn drain_console_events(&self) -> DriverResult<Vec<ConsoleMessage>> {
        let mut state = self.state.lock().expect("replay state poisoned");
        Ok(std::mem::take(&mut state.console))
    }

    async fn drain_network_failures(&self) -> DriverResult<Vec<NetworkFailure>> {
        let mut state = self.state.lock().expect("replay state poisoned");
        Ok(std::mem::take(&mut state.network_failures))
    }

    async fn content(&self) -> DriverResult<String> {
        let state = self.state.lock().expect("replay state poisoned");
        Ok(state
            .current
            .as_ref()
            .map(|s| s.body_text.clone())
            .unwrap_or_default())
    }

    async fn title(&self) -> DriverResult<String> {
        let state = self.state.lock().expect("replay state poisoned");
        Ok(state
            .current
            .as_ref()
            .map(|s| s.title.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagemedic_core::domain::{ConsoleLevel, PageTarget};

    fn snapshot(status: u16, title: &str, body: &str) -> PageSnapshot {
        PageSnapshot {
            status,
            final_url: None,
            title: title.to_string(),
            body_text: body.to_string(),
            selectors_present: BTreeSet::new(),
            console: Vec::new(),
            network_failures: Vec::new(),
        }
    }

    async fn session_over(pages: BTreeMap<String, PageSnapshot>) -> Arc<dyn Driver> {
        ReplayDriverFactory::new(pages)
            .session()
            .await
            .expect("session")
    }

    #[tokio::test]
    async fn test_replay_serves_recorded_snapshot() {
        let mut pages = BTreeMap::new();
        let mut snap = snapshot(200, "Home", "welcome back");
        snap.selectors_present.insert(".app".to_string());
        snap.console
            .push(ConsoleMessage::new(ConsoleLevel::Error, "recorded error"));
        pages.insert("/home".to_string(), snap);
        let driver = session_over(pages).await;

        let outcome = driver.navigate("/home").await.expect("navigate");
        assert_eq!(outcome.status, 200);
        assert_eq!(outcome.final_url, "/home");
        assert!(driver.query_selector_exists(".app").await.expect("query"));
        assert!(!driver.query_selector_exists(".nope").await.expect("query"));
        assert_eq!(driver.title().await.expect("title"), "Home");

        let console = driver.drain_console_events().await.expect("drain");
        assert_eq!(console.len(), 1);
        assert!(driver.drain_console_events().await.expect("drain").is_empty());
    }

    #[tokio::test]
    async fn test_missing_fixture_is_fatal() {
        let driver = session_over(BTreeMap::new()).await;
        let err = driver.navigate("/unrecorded").await.unwrap_err();
        assert!(matches!(err, DriverError::FixtureMissing { path } if path == "/unrecorded"));
    }

    #[tokio::test]
    async fn test_interleaved_sessions_keep_signals_apart() {
        let mut pages = BTreeMap::new();
        pages.insert("/a".to_string(), snapshot(200, "A", "page a body"));
        let mut snap_b = snapshot(200, "B", "page b body");
        snap_b
            .console
            .push(ConsoleMessage::new(ConsoleLevel::Error, "b-only error"));
        pages.insert("/b".to_string(), snap_b);

        let factory = ReplayDriverFactory::new(pages);
        let a = factory.session().await.expect("session a");
        let b = factory.session().await.expect("session b");

        // Interleave the navigations, then read a's page last: b's visit
        // must not have replaced a's page or fed its console buffer.
        a.navigate("/a").await.expect("navigate a");
        b.navigate("/b").await.expect("navigate b");
        assert_eq!(a.title().await.expect("title"), "A");
        assert!(a.drain_console_events().await.expect("drain").is_empty());

        let console = b.drain_console_events().await.expect("drain");
        assert_eq!(console.len(), 1);
        assert_eq!(console[0].text, "b-only error");
    }

    #[tokio::test]
    async fn test_from_file_parses_fixture() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fixture.json");
        std::fs::write(
            &path,
            r#"{ "pages": { "/a": { "status": 404, "title": "404 Not Found" } } }"#,
        )
        .expect("write fixture");

        let factory = ReplayDriverFactory::from_file(&path).expect("parse fixture");
        let driver = factory.session().await.expect("session");
        let outcome = driver.navigate("/a").await.expect("navigate");
        assert_eq!(outcome.status, 404);

        // Probe integration smoke check: the snapshot drives classification
        // inputs end to end.
        let target = PageTarget::new("a", "/a", "misc");
        let result = crate::prober::probe(&target, &*driver, Duration::from_secs(1))
            .await
            .expect("probe");
        assert_eq!(result.http_status, 404);
        assert_eq!(result.title, "404 Not Found");
    }

    #[test]
    fn test_invalid_fixture_is_protocol_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("fixture.json");
        std::fs::write(&path, "not json").expect("write");
        let result = ReplayDriverFactory::from_file(&path);
        assert!(matches!(result, Err(DriverError::Protocol(_))));
    }
}

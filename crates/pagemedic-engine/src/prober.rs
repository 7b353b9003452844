//! One visit-and-observe pass against a single page target.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use tracing::instrument;

use pagemedic_core::domain::{PageTarget, ProbeResult, BLANK_TEXT_THRESHOLD, BODY_EXCERPT_MAX};

use crate::driver::{Driver, DriverError};

struct Inspection {
    status: u16,
    final_url: String,
    title: String,
    text: String,
    missing_selectors: BTreeSet<String>,
}

async fn inspect(target: &PageTarget, driver: &dyn Driver, timeout: Duration) -> Result<Inspection, DriverError> {
    let outcome = driver.navigate(&target.path).await?;
    driver.wait_for_network_idle(timeout).await?;

    let title = driver.title().await?;
    let text = driver.content().await?;

    let mut missing_selectors = BTreeSet::new();
    for selector in &target.expected_selectors {
        if !driver.query_selector_exists(selector).await? {
            missing_selectors.insert(selector.clone());
        }
    }

    Ok(Inspection {
        status: outcome.status,
        final_url: outcome.final_url,
        title,
        text,
        missing_selectors,
    })
}

/// Visit `target` and capture its signals.
///
/// Page-level failures (404s, script errors, timeouts) become data in the
/// returned [`ProbeResult`]; a probe that exceeds `timeout` yields a valid
/// result with `http_status = 0`, selectors unchecked, and `is_blank`
/// set. Only a [`DriverError`] propagates, and it is fatal for the run.
///
/// Console and network buffers are drained after the timed section so
/// late-arriving page errors are not lost.
#[instrument(skip(driver), fields(target_id = %target.id))]
pub async fn probe(
    target: &PageTarget,
    driver: &dyn Driver,
    timeout: Duration,
) -> Result<ProbeResult, DriverError> {
    let started = Instant::now();

    let inspected = tokio::time::timeout(timeout, inspect(target, driver, timeout)).await;
    let (http_status, final_url, title, text, missing_selectors, is_blank, load_time_ms) =
        match inspected {
            Ok(Ok(i)) => {
                let none_present = i.missing_selectors.len() == target.expected_selectors.len();
                let is_blank = i.text.chars().count() < BLANK_TEXT_THRESHOLD && none_present;
                (
                    i.status,
                    i.final_url,
                    i.title,
                    i.text,
                    i.missing_selectors,
                    is_blank,
                    started.elapsed().as_millis() as u64,
                )
            }
            Ok(Err(e)) => return Err(e),
            // Timed out: selectors are unchecked, not missing, so a pure
            // timeout classifies as blank content rather than a missing
            // component.
            Err(_elapsed) => (
                0,
                target.path.clone(),
                String::new(),
                String::new(),
                BTreeSet::new(),
                true,
                timeout.as_millis() as u64,
            ),
        };

    let console_messages = driver.drain_console_events().await?;
    let network_failures = driver.drain_network_failures().await?;

    Ok(ProbeResult {
        target: target.clone(),
        http_status,
        final_url,
        title,
        body_excerpt: text.chars().take(BODY_EXCERPT_MAX).collect(),
        console_messages,
        network_failures,
        missing_selectors,
        is_blank,
        load_time_ms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverResult, NavigationOutcome};
    use async_trait::async_trait;
    use pagemedic_core::domain::{ConsoleLevel, ConsoleMessage, NetworkFailure};
    use std::sync::Mutex;

    /// Scripted single-page session for prober tests.
    struct FakeDriver {
        status: u16,
        title: String,
        text: String,
        present_selectors: Vec<String>,
        console: Mutex<Vec<ConsoleMessage>>,
        failures: Mutex<Vec<NetworkFailure>>,
        idle_delay: Duration,
    }

    impl FakeDriver {
        fn healthy(text: &str) -> Self {
            Self {
                status: 200,
                title: "Page".to_string(),
                text: text.to_string(),
                present_selectors: vec![".app".to_string()],
                console: Mutex::new(Vec::new()),
                failures: Mutex::new(Vec::new()),
                idle_delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl Driver for FakeDriver {
        async fn navigate(&self, path: &str) -> DriverResult<NavigationOutcome> {
            Ok(NavigationOutcome {
                status: self.status,
                final_url: path.to_string(),
            })
        }

        async fn wait_for_network_idle(&self, _timeout: Duration) -> DriverResult<()> {
            tokio::time::sleep(self.idle_delay).await;
            Ok(())
        }

        async fn query_selector_exists(&self, selector: &str) -> DriverResult<bool> {
            Ok(self.present_selectors.iter().any(|s| s == selector))
        }

        async fn evaluate(&self, _script: &str) -> DriverResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }

        async fn drain_console_events(&self) -> DriverResult<Vec<ConsoleMessage>> {
            Ok(std::mem::take(&mut self.console.lock().unwrap()))
        }

        async fn drain_network_failures(&self) -> DriverResult<Vec<NetworkFailure>> {
            Ok(std::mem::take(&mut self.failures.lock().unwrap()))
        }

        async fn content(&self) -> DriverResult<String> {
            Ok(self.text.clone())
        }

        async fn title(&self) -> DriverResult<String> {
            Ok(self.title.clone())
        }
    }

    fn long_text() -> String {
        "lorem ipsum ".repeat(20)
    }

    #[tokio::test]
    async fn test_healthy_probe_captures_signals() {
        let driver = FakeDriver::healthy(&long_text());
        let target = PageTarget::new("home", "/home", "portal").with_selector(".app");

        let result = probe(&target, &driver, Duration::from_secs(1))
            .await
            .expect("probe");
        assert_eq!(result.http_status, 200);
        assert!(!result.is_blank);
        assert!(result.missing_selectors.is_empty());
        assert_eq!(result.title, "Page");
    }

    #[tokio::test]
    async fn test_missing_selector_recorded() {
        let driver = FakeDriver::healthy(&long_text());
        let target = PageTarget::new("home", "/home", "portal")
            .with_selector(".app")
            .with_selector("#absent");

        let result = probe(&target, &driver, Duration::from_secs(1))
            .await
            .expect("probe");
        assert_eq!(result.missing_selectors.len(), 1);
        assert!(result.missing_selectors.contains("#absent"));
        // One selector is still present, so the page is not blank.
        assert!(!result.is_blank);
    }

    #[tokio::test]
    async fn test_short_text_with_no_selectors_present_is_blank() {
        let mut driver = FakeDriver::healthy("tiny");
        driver.present_selectors.clear();
        let target = PageTarget::new("empty", "/empty", "portal").with_selector(".app");

        let result = probe(&target, &driver, Duration::from_secs(1))
            .await
            .expect("probe");
        assert!(result.is_blank);
        assert_eq!(result.body_excerpt, "tiny");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_yields_valid_result() {
        let mut driver = FakeDriver::healthy(&long_text());
        driver.idle_delay = Duration::from_secs(60);
        driver.console.lock().unwrap().push(ConsoleMessage::new(
            ConsoleLevel::Error,
            "late script error",
        ));
        let target = PageTarget::new("slow", "/slow", "portal").with_selector(".app");

        let result = probe(&target, &driver, Duration::from_millis(200))
            .await
            .expect("probe");
        assert_eq!(result.http_status, 0);
        assert_eq!(result.final_url, "/slow");
        assert!(result.is_blank);
        assert!(result.missing_selectors.is_empty());
        assert_eq!(result.load_time_ms, 200);
        // Buffers are still drained after the elapse.
        assert_eq!(result.console_messages.len(), 1);
    }

    struct BrokenDriver;

    #[async_trait]
    impl Driver for BrokenDriver {
        async fn navigate(&self, _path: &str) -> DriverResult<NavigationOutcome> {
            Err(DriverError::Session("browser process exited".to_string()))
        }
        async fn wait_for_network_idle(&self, _timeout: Duration) -> DriverResult<()> {
            Ok(())
        }
        async fn query_selector_exists(&self, _selector: &str) -> DriverResult<bool> {
            Ok(false)
        }
        async fn evaluate(&self, _script: &str) -> DriverResult<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
        async fn drain_console_events(&self) -> DriverResult<Vec<ConsoleMessage>> {
            Ok(Vec::new())
        }
        async fn drain_network_failures(&self) -> DriverResult<Vec<NetworkFailure>> {
            Ok(Vec::new())
        }
        async fn content(&self) -> DriverResult<String> {
            Ok(String::new())
        }
        async fn title(&self) -> DriverResult<String> {
            Ok(String::new())
        }
    }

    #[tokio::test]
    async fn test_driver_failure_propagates() {
        let target = PageTarget::new("any", "/any", "portal");
        let err = probe(&target, &BrokenDriver, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DriverError::Session(_)));
    }
}

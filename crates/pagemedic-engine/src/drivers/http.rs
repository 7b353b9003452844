//! Plain-HTTP driver sessions.
//!
//! A degraded but useful session for sites that render server-side: GETs
//! pages over reqwest, extracts title and text from the HTML, and answers
//! selector queries with naive `#id` / `.class` / tag-name matching. There
//! is no JS runtime, so the console buffer is always empty; request
//! failures land in the network-failure buffer instead of aborting the
//! probe.
//!
//! [`HttpDriverFactory`] carries the base URL, credentials, and a shared
//! connection pool; every session it opens gets its own page state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use pagemedic_core::domain::{ConsoleMessage, NetworkFailure};

use crate::driver::{Driver, DriverError, DriverFactory, DriverResult, NavigationOutcome};

/// Opens [`HttpDriver`] sessions against one base URL. Sessions share the
/// reqwest connection pool and auth header, nothing else.
pub struct HttpDriverFactory {
    base_url: String,
    auth_header: Option<(String, String)>,
    client: reqwest::Client,
}

impl HttpDriverFactory {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();
        Self {
            base_url: base_url.into(),
            auth_header: None,
            client,
        }
    }

    /// Attach a pre-acquired auth header, given as `"Name: value"`
    /// (e.g. `"Cookie: session=..."` or `"Authorization: Bearer ..."`).
    pub fn with_auth_header(mut self, header: &str) -> DriverResult<Self> {
        let (name, value) = header.split_once(':').ok_or_else(|| {
            DriverError::Protocol(format!("auth header '{header}' is not 'Name: value'"))
        })?;
        self.auth_header = Some((name.trim().to_string(), value.trim().to_string()));
        Ok(self)
    }
}

#[async_trait]
impl DriverFactory for HttpDriverFactory {
    async fn session(&self) -> DriverResult<Arc<dyn Driver>> {
        Ok(Arc::new(HttpDriver {
            base_url: self.base_url.clone(),
            auth_header: self.auth_header.clone(),
            client: self.client.clone(),
            state: Mutex::new(PageState::default()),
        }))
    }
}

#[derive(Default)]
struct PageState {
    body: String,
    network_failures: Vec<NetworkFailure>,
}

/// One HTTP probing session; holds the page state of a single probe.
pub struct HttpDriver {
    base_url: String,
    auth_header: Option<(String, String)>,
    client: reqwest::Client,
    state: Mutex<PageState>,
}

impl HttpDriver {
    fn absolute(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

/// Extract the `<title>` text from an HTML document.
pub(crate) fn extract_title(html: &str) -> String {
    // Ascii-only lowering keeps byte offsets aligned with `html`.
    let lower = html.to_ascii_lowercase();
    let Some(start) = lower.find("<title") else {
        return String::new();
    };
    let Some(open_end) = lower[start..].find('>') else {
        return String::new();
    };
    let content_start = start + open_end + 1;
    let Some(end) = lower[content_start..].find("</title") else {
        return String::new();
    };
    html[content_start..content_start + end].trim().to_string()
}

/// Strip scripts, styles, and tags; collapse whitespace. Deliberately
/// naive, only good enough for blank/keyword checks.
pub(crate) fn extract_text(html: &str) -> String {
    let mut cleaned = String::with_capacity(html.len());
    let mut rest = html;
    // Drop script/style blocks wholesale.
    loop {
        let lower = rest.to_ascii_lowercase();
        let Some((open_at, close_tag)) = ["<script", "<style"]
            .iter()
            .filter_map(|tag| lower.find(tag).map(|at| (at, format!("</{}>", &tag[1..]))))
            .min_by_key(|(at, _)| *at)
        else {
            cleaned.push_str(rest);
            break;
        };
        cleaned.push_str(&rest[..open_at]);
        match lower[open_at..].find(&close_tag) {
            Some(close_at) => rest = &rest[open_at + close_at + close_tag.len()..],
            None => break,
        }
    }

    let mut text = String::with_capacity(cleaned.len());
    let mut in_tag = false;
    for c in cleaned.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                text.push(' ');
            }
            c if !in_tag => text.push(c),
            _ => {}
        }
    }
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Answer a naive selector query over raw HTML: `#id`, `.class`, or a
/// bare tag name.
pub(crate) fn selector_matches(html: &str, selector: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    if let Some(id) = selector.strip_prefix('#') {
        let id = id.to_ascii_lowercase();
        lower.contains(&format!("id=\"{id}\"")) || lower.contains(&format!("id='{id}'"))
    } else if let Some(class) = selector.strip_prefix('.') {
        let class = class.to_ascii_lowercase();
        // Scan class attributes for the token.
        lower
            .match_indices("class=")
            .filter_map(|(at, _)| {
                let rest = &lower[at + 6..];
                let quote = rest.chars().next()?;
                if quote != '"' && quote != '\'' {
                    return None;
                }
                let end = rest[1..].find(quote)?;
                Some(rest[1..1 + end].to_string())
            })
            .any(|attr| attr.split_whitespace().any(|token| token == class))
    } else {
        lower.contains(&format!("<{}", selector.to_ascii_lowercase()))
    }
}

#[async_trait]
impl Driver for HttpDriver {
    async fn navigate(&self, path: &str) -> DriverResult<NavigationOutcome> {
        let url = self.absolute(path);
        let mut request = self.client.get(&url);
        if let Some((name, value)) = &self.auth_header {
            request = request.header(name, value);
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let final_url = response.url().to_string();
                let body = response.text().await.unwrap_or_default();
                let mut state = self.state.lock().expect("page state poisoned");
                state.body = body;
                state.network_failures.clear();
                Ok(NavigationOutcome { status, final_url })
            }
            Err(e) => {
                // The site being down is a page-level signal here, not a
                // broken driver: record it and let the probe continue.
                let mut state = self.state.lock().expect("page state poisoned");
                state.body.clear();
                state.network_failures = vec![NetworkFailure {
                    url: url.clone(),
                    status: None,
                    reason: e.to_string(),
                }];
                Ok(NavigationOutcome {
                    status: 0,
                    final_url: url,
                })
            }
        }
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> DriverResult<()> {
        // The response is fully buffered by navigate.
        Ok(())
    }

    async fn query_selector_exists(&self, selector: &str) -> DriverResult<bool> {
        let state = self.state.lock().expect("page state poisoned");
        Ok(selector_matches(&state.body, selector))
    }

    async fn evaluate(&self, _script: &str) -> DriverResult<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn drain_console_events(&self) -> DriverResult<Vec<ConsoleMessage>> {
        Ok(Vec::new())
    }

    async fn drain_network_failures(&self) -> DriverResult<Vec<NetworkFailure>> {
        let mut state = self.state.lock().expect("page state poisoned");
        Ok(std::mem::take(&mut state.network_failures))
    }

    async fn content(&self) -> DriverResult<String> {
        let state = self.state.lock().expect("page state poisoned");
        Ok(extract_text(&state.body))
    }

    async fn title(&self) -> DriverResult<String> {
        let state = self.state.lock().expect("page state poisoned");
        Ok(extract_title(&state.body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<html><head><title>User List</title>
        <style>body { color: red; }</style></head>
        <body><div id="app" class="layout admin-shell">
        <script>console.log("ignore me")</script>
        <nav class="sidebar"></nav>
        <h1>Users</h1><p>3 accounts registered.</p>
        </div></body></html>"#;

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title(SAMPLE), "User List");
        assert_eq!(extract_title("<html><body>no title</body></html>"), "");
    }

    #[test]
    fn test_extract_text_drops_scripts_and_styles() {
        let text = extract_text(SAMPLE);
        assert!(text.contains("Users"));
        assert!(text.contains("3 accounts registered."));
        assert!(!text.contains("ignore me"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_selector_matching_forms() {
        assert!(selector_matches(SAMPLE, "#app"));
        assert!(!selector_matches(SAMPLE, "#missing"));
        assert!(selector_matches(SAMPLE, ".sidebar"));
        assert!(selector_matches(SAMPLE, ".admin-shell"));
        // "admin" is not a whole class token.
        assert!(!selector_matches(SAMPLE, ".admin"));
        assert!(selector_matches(SAMPLE, "nav"));
        assert!(!selector_matches(SAMPLE, "table"));
    }

    #[test]
    fn test_auth_header_parsing() {
        let factory = HttpDriverFactory::new("http://localhost:5173")
            .with_auth_header("Cookie: session=abc")
            .expect("valid header");
        assert_eq!(
            factory.auth_header,
            Some(("Cookie".to_string(), "session=abc".to_string()))
        );

        let result = HttpDriverFactory::new("http://localhost:5173").with_auth_header("garbage");
        assert!(matches!(result, Err(DriverError::Protocol(_))));
    }

    #[tokio::test]
    async fn test_unreachable_site_becomes_network_failure() {
        // Nothing listens on this port.
        let factory = HttpDriverFactory::new("http://127.0.0.1:1");
        let driver = factory.session().await.expect("session");
        let outcome = driver.navigate("/home").await.expect("navigate");
        assert_eq!(outcome.status, 0);

        let failures = driver.drain_network_failures().await.expect("drain");
        assert_eq!(failures.len(), 1);
        assert!(failures[0].url.ends_with("/home"));

        // Buffer is cleared by the drain.
        assert!(driver.drain_network_failures().await.expect("drain").is_empty());
    }

    #[tokio::test]
    async fn test_sessions_keep_separate_page_state() {
        let factory = HttpDriverFactory::new("http://127.0.0.1:1");
        let a = factory.session().await.expect("session a");
        let b = factory.session().await.expect("session b");

        // Only session a navigates; its recorded failure must not be
        // visible from session b.
        a.navigate("/home").await.expect("navigate");
        assert!(b.drain_network_failures().await.expect("drain").is_empty());
        assert_eq!(a.drain_network_failures().await.expect("drain").len(), 1);
    }
}

//! Raw signals observed during one page probe.
//!
//! A [`ProbeResult`] carries observations only; judgment is deferred to the
//! classifier. Page-level failures (404s, console errors, timeouts) are data
//! here, never errors.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::target::PageTarget;

/// Rendered text shorter than this (with no expected selectors present)
/// marks a page as blank.
pub const BLANK_TEXT_THRESHOLD: usize = 100;

/// Maximum characters of rendered text captured into `body_excerpt`.
pub const BODY_EXCERPT_MAX: usize = 512;

/// Console message severity as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsoleLevel {
    Error,
    Warning,
    Info,
}

/// One console message recorded during navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleMessage {
    pub level: ConsoleLevel,
    pub text: String,
    pub location: Option<String>,
}

impl ConsoleMessage {
    pub fn new(level: ConsoleLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            location: None,
        }
    }
}

/// One failed network request recorded during navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFailure {
    pub url: String,
    /// HTTP status when a response arrived; `None` for transport failures.
    pub status: Option<u16>,
    pub reason: String,
}

/// Everything observed while visiting one target. Created once per probe
/// attempt and never mutated afterwards.
///
/// A timed-out probe is still a valid result: `http_status == 0`, empty
/// title and excerpt, `missing_selectors` empty (unchecked, not missing),
/// `is_blank == true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub target: PageTarget,
    /// Status of the primary navigation response; `0` when the probe timed out.
    pub http_status: u16,
    pub final_url: String,
    pub title: String,
    /// First [`BODY_EXCERPT_MAX`] characters of rendered text, captured so
    /// classification stays a pure function of this struct alone.
    pub body_excerpt: String,
    pub console_messages: Vec<ConsoleMessage>,
    pub network_failures: Vec<NetworkFailure>,
    /// Expected selectors that were checked and absent.
    pub missing_selectors: BTreeSet<String>,
    pub is_blank: bool,
    pub load_time_ms: u64,
}

impl ProbeResult {
    /// A healthy-looking baseline result for the given target, useful as a
    /// starting point in tests and for timed-out probes.
    pub fn empty(target: PageTarget) -> Self {
        let final_url = target.path.clone();
        Self {
            target,
            http_status: 0,
            final_url,
            title: String::new(),
            body_excerpt: String::new(),
            console_messages: Vec::new(),
            network_failures: Vec::new(),
            missing_selectors: BTreeSet::new(),
            is_blank: true,
            load_time_ms: 0,
        }
    }

    /// True when any console message was recorded at error level.
    pub fn has_console_errors(&self) -> bool {
        self.console_messages
            .iter()
            .any(|m| m.level == ConsoleLevel::Error)
    }
}

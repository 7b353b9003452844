//! Bundled driver sessions.
//!
//! Two concrete [`crate::driver::DriverFactory`] implementations ship with
//! the engine so the binary is usable without a real browser: plain HTTP
//! sessions and deterministic fixture replay sessions. Both expect to be
//! handed any required authentication up front.

pub mod http;
pub mod replay;

//! Domain data model for one probe-classify-repair run.
//!
//! All entities are created and consumed within a single run; the only
//! persisted state is the write-once report artifact.

pub mod error;
pub mod probe;
pub mod record;
pub mod repair;
pub mod target;

pub use error::{CoreError, CoreResult};
pub use probe::{
    ConsoleLevel, ConsoleMessage, NetworkFailure, ProbeResult, BLANK_TEXT_THRESHOLD,
    BODY_EXCERPT_MAX,
};
pub use record::{ErrorKind, ErrorRecord};
pub use repair::{MethodOutcome, RepairResult, RepairStrategy, RepairTask, TaskStatus};
pub use target::PageTarget;

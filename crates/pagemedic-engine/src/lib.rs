//! Pagemedic Engine
//!
//! The async half of the pipeline: the abstract browser [`Driver`], the
//! page prober, the repair executor with its method registry, bundled
//! driver sessions, and the orchestrator that wires
//! manifest -> probe -> classify -> plan -> execute -> report.

pub mod advisor;
pub mod driver;
pub mod drivers;
pub mod executor;
pub mod orchestrator;
pub mod prober;

pub use advisor::{standard_registry, AdvisoryNote, EndpointRecheck, StubPageScaffold};
pub use driver::{Driver, DriverError, DriverFactory, DriverResult, NavigationOutcome};
pub use drivers::http::{HttpDriver, HttpDriverFactory};
pub use drivers::replay::{PageSnapshot, ReplayDriver, ReplayDriverFactory};
pub use executor::{execute, execute_group, MethodRegistry, RepairMethod};
pub use orchestrator::{Orchestrator, RunConfig, RunError};
pub use prober::probe;

//! Core abstractions shared by every layer of the analysis pass.
//!
//! The agent contract defines how the surrounding review pipeline talks to
//! this crate, the configuration struct enumerates every recognized option
//! with its default, and findings are the only artifact that leaves the
//! core. Severity and confidence gradings follow the conventions of the
//! wider pipeline so findings from different agents sort together.

pub mod agent;
pub mod config;
pub mod error;
pub mod finding;
pub mod metrics;
pub mod mitigation;
pub mod severity;

pub use agent::{AgentOutcome, ChangedFile, FileStatus, ReviewAgent, ReviewContext};
pub use config::{AgentConfig, PatternOverride, UserPattern};
pub use error::AnalysisError;
pub use finding::Finding;
pub use metrics::ExecutionMetrics;
pub use mitigation::{Mitigation, MitigationKind};
pub use severity::{Confidence, Severity};

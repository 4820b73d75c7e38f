//! Kensa: deterministic control-flow and taint-path analysis for code review.
//!
//! One pass of a multi-agent review pipeline: given a batch of changed JS/TS
//! files, build a control-flow graph per function, tag recognized security
//! mitigations, and walk each graph from entry toward security-sensitive
//! sinks to report the paths no mitigation covers. The whole pass is
//! budget-bounded and bit-identical across repeated runs on the same input.

pub mod analysis;
pub mod cfg;
pub mod core;
pub mod runner;
pub mod source;

pub use crate::core::{
    AgentConfig, AgentOutcome, AnalysisError, ChangedFile, Confidence, ExecutionMetrics,
    FileStatus, Finding, Mitigation, MitigationKind, ReviewAgent, ReviewContext, Severity,
};

pub use crate::analysis::{
    AnalysisStatus, MitigationDetector, PathAnalysisResult, PathAnalyzer, PathLimits, SinkCategory,
};

pub use crate::cfg::{Cfg, CfgBuilder, EdgeKind, NodeId, NodeKind};

pub use crate::runner::{AnalysisBudget, BudgetSignal, TaintPathAgent};

pub use crate::source::{ParsedFile, SourceUnit, SourceUnitExtractor, UnitKind};

/// The `source_agent` value stamped on every finding.
pub const AGENT_NAME: &str = "taint-path";

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Analysis passes over built CFGs.
//!
//! Mitigation detection tags nodes with recognized defensive patterns, the
//! sink table names the call-site classes worth walking toward, and the path
//! explorer enumerates bounded simple paths between them. Everything here is
//! pure computation over the graph: no I/O, no clocks except the
//! cooperative pattern-timeout checks.

pub mod detector;
pub mod mitigations;
pub mod path_explorer;
pub mod sinks;

pub use detector::MitigationDetector;
pub use mitigations::{compile_rules, CompiledRule, MatchScope, PATTERN_TABLE_VERSION};
pub use path_explorer::{AnalysisStatus, Path, PathAnalysisResult, PathAnalyzer, PathLimits};
pub use sinks::{sink_category_exists, sink_category_names, SinkCategory};

//! Control-flow graph construction.
//!
//! The graph is an arena of densely-numbered nodes plus an index-based edge
//! list, built in a single deterministic pass per source unit. See
//! `builder::CfgBuilder` for the lowering rules.

pub mod builder;
pub mod graph;

pub use builder::CfgBuilder;
pub use graph::{Cfg, CfgEdge, CfgNode, EdgeKind, NodeId, NodeKind, SourceSpan};

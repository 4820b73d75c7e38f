//! Arena-based control-flow graph.
//!
//! Nodes live in a dense array indexed by `NodeId`; edges are index pairs.
//! Loop-back edges make the graph cyclic, but as indices they carry no
//! ownership, and the whole graph serializes by iterating the arena in id
//! order, which is also the deterministic construction order.

use crate::core::Mitigation;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Closed set of node shapes, fixed at build time. Downstream components
/// match exhaustively on this instead of probing syntax at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    Entry,
    Exit,
    Statement,
    Branch,
    LoopHeader,
    Catch,
    Finally,
    Return,
    Throw,
}

impl NodeKind {
    /// Exit-kind nodes terminate a path; they populate `exit_nodes`.
    pub fn is_exit(self) -> bool {
        matches!(self, Self::Exit | Self::Return | Self::Throw)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    Normal,
    TrueBranch,
    FalseBranch,
    ExceptionPath,
    LoopBack,
}

impl EdgeKind {
    /// Fixed successor-visitation rank. The path enumerator explores edges
    /// in this order (ties by target id); the golden determinism test locks
    /// it down.
    pub fn rank(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::TrueBranch => 1,
            Self::FalseBranch => 2,
            Self::ExceptionPath => 3,
            Self::LoopBack => 4,
        }
    }
}

/// 1-based source coordinates, matching what the reporting layer renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CfgNode {
    pub id: NodeId,

    pub kind: NodeKind,

    pub span: SourceSpan,

    /// First line of the originating statement, for messages.
    pub snippet: String,

    /// Callee texts of every call expression inside this node's statement,
    /// in source order (e.g. `db.query`, `sanitizeInput`).
    pub calls: Vec<String>,

    /// Empty until the mitigation detector runs; the only post-construction
    /// mutation this graph allows.
    pub mitigations: Vec<Mitigation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

/// One unit's control-flow graph. Built once, then read-only apart from
/// mitigation tagging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cfg {
    /// The owning `SourceUnit` id.
    pub unit_id: String,

    /// The unit's function name, used for same-batch call resolution.
    pub unit_name: String,

    pub nodes: Vec<CfgNode>,

    pub edges: Vec<CfgEdge>,

    pub entry: NodeId,

    /// Every `return`/`throw` node plus the implicit fall-through exit if
    /// the function has one. Never merged.
    pub exit_nodes: Vec<NodeId>,
}

impl Cfg {
    pub fn new(unit_id: impl Into<String>, unit_name: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            unit_name: unit_name.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            entry: NodeId(0),
            exit_nodes: Vec::new(),
        }
    }

    pub fn add_node(&mut self, kind: NodeKind, span: SourceSpan, snippet: String) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(CfgNode {
            id,
            kind,
            span,
            snippet,
            calls: Vec::new(),
            mitigations: Vec::new(),
        });
        if kind.is_exit() {
            self.exit_nodes.push(id);
        }
        id
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, kind: EdgeKind) {
        self.edges.push(CfgEdge { from, to, kind });
    }

    pub fn node(&self, id: NodeId) -> &CfgNode {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut CfgNode {
        &mut self.nodes[id.index()]
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Outgoing edges of `id` in the fixed visitation order: edge-kind rank,
    /// then ascending target id. A linear scan is cheap at CFG sizes and
    /// keeps no adjacency cache to fall out of sync.
    pub fn successors(&self, id: NodeId) -> Vec<(EdgeKind, NodeId)> {
        let mut out: Vec<(EdgeKind, NodeId)> = self
            .edges
            .iter()
            .filter(|edge| edge.from == id)
            .map(|edge| (edge.kind, edge.to))
            .collect();
        out.sort_by_key(|(kind, to)| (kind.rank(), *to));
        out
    }

    pub fn count_kind(&self, kind: NodeKind) -> usize {
        self.nodes.iter().filter(|node| node.kind == kind).count()
    }

    pub fn tag(&mut self, id: NodeId, mitigation: Mitigation) {
        self.nodes[id.index()].mitigations.push(mitigation);
    }
}

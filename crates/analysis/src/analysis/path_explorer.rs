//! Bounded path enumeration over a tagged CFG.
//!
//! Depth-first enumeration of simple paths (no repeated node) from the entry
//! node toward sink call-sites, visiting successors in the fixed order
//! defined by `EdgeKind::rank` with ties broken by target id. The bounds
//! exist to stop path-count blow-up on branch-heavy functions: hitting
//! `max_paths` ends enumeration, hitting `max_path_length` abandons the
//! current branch. Either marks the result truncated; neither is an error.

use crate::analysis::sinks::SinkCategory;
use crate::cfg::{Cfg, NodeId};
use crate::core::AgentConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisStatus {
    Complete,
    Truncated,
    NoSink,
}

pub type Path = Vec<NodeId>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathAnalysisResult {
    pub sink_category: String,

    pub paths_to_sink: Vec<Path>,

    pub mitigated_paths: Vec<Path>,

    pub unmitigated_paths: Vec<Path>,

    /// mitigated ÷ total × 100, clamped to [0, 100]; 0 when no sink.
    pub coverage_percent: f64,

    pub status: AnalysisStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct PathLimits {
    pub max_paths: usize,
    pub max_path_length: usize,
}

impl PathLimits {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            max_paths: config.max_paths,
            max_path_length: config.max_path_length,
        }
    }
}

pub struct PathAnalyzer<'a> {
    sink: &'a SinkCategory,
    limits: PathLimits,
}

struct Enumeration {
    paths: Vec<Path>,
    truncated: bool,
}

impl<'a> PathAnalyzer<'a> {
    pub fn new(sink: &'a SinkCategory, limits: PathLimits) -> Self {
        Self { sink, limits }
    }

    /// Walks the CFG from entry toward sink call-sites for this category. A
    /// discovered path ends at its sink-bearing node and is not extended
    /// further.
    pub fn analyze(&self, cfg: &Cfg) -> PathAnalysisResult {
        let mut state = Enumeration {
            paths: Vec::new(),
            truncated: false,
        };
        let mut current = Vec::new();
        self.dfs(cfg, cfg.entry, &mut current, &mut state, |cfg, id| {
            self.sink.is_sink_node(&cfg.node(id).calls)
        });

        let paths = state.paths;
        let mut mitigated = Vec::new();
        let mut unmitigated = Vec::new();
        for path in &paths {
            if self.path_is_mitigated(cfg, path) {
                mitigated.push(path.clone());
            } else {
                unmitigated.push(path.clone());
            }
        }

        let coverage = if paths.is_empty() {
            0.0
        } else {
            (mitigated.len() as f64 / paths.len() as f64 * 100.0).clamp(0.0, 100.0)
        };

        let status = if paths.is_empty() && !state.truncated {
            AnalysisStatus::NoSink
        } else if state.truncated {
            AnalysisStatus::Truncated
        } else {
            AnalysisStatus::Complete
        };

        PathAnalysisResult {
            sink_category: self.sink.name.to_string(),
            paths_to_sink: paths,
            mitigated_paths: mitigated,
            unmitigated_paths: unmitigated,
            coverage_percent: coverage,
            status,
        }
    }

    /// Enumerates simple entry→exit paths under the same bounds. Used by
    /// shape checks and coverage tooling; shares the visitation order with
    /// `analyze` so the two never disagree.
    pub fn enumerate_exit_paths(&self, cfg: &Cfg) -> (Vec<Path>, bool) {
        let mut state = Enumeration {
            paths: Vec::new(),
            truncated: false,
        };
        let mut current = Vec::new();
        self.dfs(cfg, cfg.entry, &mut current, &mut state, |cfg, id| {
            cfg.node(id).kind.is_exit()
        });
        (state.paths, state.truncated)
    }

    fn dfs<F>(
        &self,
        cfg: &Cfg,
        node: NodeId,
        current: &mut Path,
        state: &mut Enumeration,
        is_target: F,
    ) where
        F: Copy + Fn(&Cfg, NodeId) -> bool,
    {
        if state.paths.len() >= self.limits.max_paths {
            state.truncated = true;
            return;
        }
        if current.len() >= self.limits.max_path_length {
            state.truncated = true;
            return;
        }

        current.push(node);

        if is_target(cfg, node) {
            state.paths.push(current.clone());
        } else {
            for (_, successor) in cfg.successors(node) {
                if current.contains(&successor) {
                    continue;
                }
                if state.paths.len() >= self.limits.max_paths {
                    state.truncated = true;
                    break;
                }
                self.dfs(cfg, successor, current, state, is_target);
            }
        }

        current.pop();
    }

    fn path_is_mitigated(&self, cfg: &Cfg, path: &Path) -> bool {
        path.iter().any(|id| {
            cfg.node(*id)
                .mitigations
                .iter()
                .any(|m| self.sink.mitigation_is_relevant(m.kind))
        })
    }
}

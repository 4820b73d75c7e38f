//! Mitigation detection over a built CFG.
//!
//! A bounded, best-effort classifier, not a verifier: every per-node pattern
//! evaluation is checked against `pattern_timeout_ms` and skipped on overrun
//! rather than aborting the detector. Matching consults only node content
//! and the compiled rule table, so repeated runs over the same tree and
//! configuration are byte-identical, including across fresh detector
//! instances.

use crate::analysis::mitigations::{compile_rules, CompiledRule, MatchScope};
use crate::cfg::{Cfg, NodeId, NodeKind};
use crate::core::{AgentConfig, Mitigation};
use std::time::{Duration, Instant};

pub struct MitigationDetector {
    rules: Vec<CompiledRule>,
    pattern_timeout: Duration,
}

impl MitigationDetector {
    pub fn from_config(config: &AgentConfig) -> Self {
        Self {
            rules: compile_rules(config),
            pattern_timeout: Duration::from_millis(config.pattern_timeout_ms),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Tags the CFG in place and returns the flat `(node, mitigation)` list
    /// for reporting. Nodes are visited in id order, rules in table order.
    pub fn tag(&self, cfg: &mut Cfg) -> Vec<(NodeId, Mitigation)> {
        let mut found = Vec::new();

        for index in 0..cfg.node_count() {
            let id = NodeId(index as u32);
            for rule in &self.rules {
                let started = Instant::now();
                let matched = self.evaluate(rule, cfg, id);
                if started.elapsed() > self.pattern_timeout {
                    // Cooperative bound: the evaluation already ran, but an
                    // overrun pattern is skipped for this node and the run
                    // moves on.
                    tracing::warn!(
                        rule = %rule.id,
                        node = id.0,
                        "pattern exceeded timeout, skipped for node"
                    );
                    continue;
                }
                if matched {
                    let mitigation = Mitigation::new(rule.kind, rule.id.clone(), rule.confidence);
                    cfg.tag(id, mitigation.clone());
                    found.push((id, mitigation));
                }
            }
        }

        found
    }

    fn evaluate(&self, rule: &CompiledRule, cfg: &Cfg, id: NodeId) -> bool {
        let node = cfg.node(id);
        match rule.scope {
            MatchScope::Callee => node.calls.iter().any(|callee| rule.matches(callee)),
            MatchScope::BranchSnippet => {
                node.kind == NodeKind::Branch && rule.matches(&node.snippet)
            }
        }
    }
}

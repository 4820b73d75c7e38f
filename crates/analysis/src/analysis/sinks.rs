//! Sink categories: the security-sensitive call-site classes path analysis
//! targets. Static configuration, not user data: runs select categories by
//! name and may not invent new ones.

use crate::cfg::Cfg;
use crate::core::{Confidence, MitigationKind, Severity};
use regex::Regex;
use std::collections::BTreeSet;

struct SinkSpec {
    name: &'static str,
    base_severity: Severity,
    confidence: Confidence,
    relevant: &'static [MitigationKind],
    /// Matched against a node's callee texts.
    pattern: &'static str,
}

const BUILTIN_SINKS: &[SinkSpec] = &[
    SinkSpec {
        name: "injection",
        base_severity: Severity::High,
        confidence: Confidence::High,
        relevant: &[MitigationKind::Validation, MitigationKind::Sanitization],
        pattern: r"(?i)((^|\.)(query|execute|raw|exec|execsync|spawn|execfile)$)|^eval$|^new Function$",
    },
    SinkSpec {
        name: "xss",
        base_severity: Severity::Medium,
        confidence: Confidence::High,
        relevant: &[MitigationKind::Sanitization, MitigationKind::OutputEncoding],
        pattern: r"^document\.write(ln)?$|(^|\.)insertAdjacentHTML$|(^|\.)html$",
    },
];

pub fn sink_category_exists(name: &str) -> bool {
    BUILTIN_SINKS.iter().any(|sink| sink.name == name)
}

pub fn sink_category_names() -> Vec<&'static str> {
    BUILTIN_SINKS.iter().map(|sink| sink.name).collect()
}

/// One compiled category plus the same-batch transitive sink set.
pub struct SinkCategory {
    pub name: &'static str,
    pub base_severity: Severity,
    pub confidence: Confidence,
    pub relevant: &'static [MitigationKind],
    regex: Regex,
    /// Names of batch units that reach a sink within `max_call_depth` hops;
    /// calling one of them counts as reaching the sink.
    transitive_units: BTreeSet<String>,
}

impl SinkCategory {
    /// Compiles a category by name. `None` for unknown names; config
    /// validation already rejected those, so callers treat it as skip.
    pub fn compile(name: &str) -> Option<SinkCategory> {
        let spec = BUILTIN_SINKS.iter().find(|sink| sink.name == name)?;
        let regex = Regex::new(spec.pattern).ok()?;
        Some(SinkCategory {
            name: spec.name,
            base_severity: spec.base_severity,
            confidence: spec.confidence,
            relevant: spec.relevant,
            regex,
            transitive_units: BTreeSet::new(),
        })
    }

    pub fn direct_sink_call(&self, callee: &str) -> bool {
        self.regex.is_match(callee)
    }

    /// Whether `callee` resolves (by static name, same batch only) to a unit
    /// known to reach this sink.
    pub fn calls_sink_unit(&self, callee: &str) -> bool {
        let name = callee.strip_prefix("this.").unwrap_or(callee);
        self.transitive_units.contains(name)
    }

    pub fn is_sink_node(&self, calls: &[String]) -> bool {
        calls
            .iter()
            .any(|callee| self.direct_sink_call(callee) || self.calls_sink_unit(callee))
    }

    pub fn mitigation_is_relevant(&self, kind: MitigationKind) -> bool {
        self.relevant.contains(&kind)
    }

    /// Fixed-point over the batch: round 0 marks units with a direct sink
    /// call, each following round marks callers of already-marked units, up
    /// to `max_call_depth` rounds. Best-effort, never a soundness claim.
    pub fn resolve_batch(&mut self, cfgs: &[Cfg], max_call_depth: usize) {
        self.transitive_units.clear();
        if max_call_depth == 0 {
            return;
        }

        let mut marked: BTreeSet<String> = cfgs
            .iter()
            .filter(|cfg| {
                cfg.nodes
                    .iter()
                    .any(|node| node.calls.iter().any(|c| self.direct_sink_call(c)))
            })
            .map(|cfg| cfg.unit_name.clone())
            .collect();

        for _ in 1..max_call_depth {
            let before = marked.len();
            for cfg in cfgs {
                if marked.contains(&cfg.unit_name) {
                    continue;
                }
                let calls_marked = cfg.nodes.iter().any(|node| {
                    node.calls.iter().any(|callee| {
                        let name = callee.strip_prefix("this.").unwrap_or(callee);
                        marked.contains(name)
                    })
                });
                if calls_marked {
                    marked.insert(cfg.unit_name.clone());
                }
            }
            if marked.len() == before {
                break;
            }
        }

        self.transitive_units = marked;
    }
}

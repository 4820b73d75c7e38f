//! The versioned mitigation rule table.
//!
//! Each rule pairs an id with a matcher over a CFG node's syntactic surface:
//! either the node's callee list or, for guard-shaped rules, the condition
//! snippet of a branch node. Individual rules can be disabled or overridden
//! through configuration without touching the matching engine.

use crate::core::{AgentConfig, Confidence, MitigationKind};
use regex::Regex;
use std::time::Instant;

/// Bumped whenever a builtin rule is added, removed, or reworded. Downstream
/// caches key on this.
pub const PATTERN_TABLE_VERSION: u32 = 4;

/// What part of a node a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchScope {
    /// The callee texts collected at build time (`db.query`, `sanitizeInput`).
    Callee,
    /// The first-line snippet of a `Branch` node's condition.
    BranchSnippet,
}

struct RuleSpec {
    id: &'static str,
    kind: MitigationKind,
    confidence: Confidence,
    scope: MatchScope,
    pattern: &'static str,
}

/// Declaration order is evaluation order; keep new rules at the end of their
/// kind group so existing golden outputs only grow.
const BUILTIN_RULES: &[RuleSpec] = &[
    // Validation
    RuleSpec {
        id: "validation-call",
        kind: MitigationKind::Validation,
        confidence: Confidence::High,
        scope: MatchScope::Callee,
        pattern: r"(?i)(^|\.)(validate|isvalid)\w*$",
    },
    RuleSpec {
        id: "validation-schema",
        kind: MitigationKind::Validation,
        confidence: Confidence::High,
        scope: MatchScope::Callee,
        pattern: r"(?i)^(joi|yup|zod|ajv|validator|schema)\.",
    },
    RuleSpec {
        id: "validation-safe-parse",
        kind: MitigationKind::Validation,
        confidence: Confidence::Medium,
        scope: MatchScope::Callee,
        pattern: r"(^|\.)safeParse$",
    },
    RuleSpec {
        id: "validation-null-guard",
        kind: MitigationKind::Validation,
        confidence: Confidence::Low,
        scope: MatchScope::BranchSnippet,
        pattern: r"[!=]==?\s*(null|undefined)|typeof\s+\w+|^if\s*\(\s*!\w",
    },
    // Sanitization
    RuleSpec {
        id: "sanitization-call",
        kind: MitigationKind::Sanitization,
        confidence: Confidence::High,
        scope: MatchScope::Callee,
        pattern: r"(?i)(^|\.)sanitize\w*$",
    },
    RuleSpec {
        id: "sanitization-dompurify",
        kind: MitigationKind::Sanitization,
        confidence: Confidence::High,
        scope: MatchScope::Callee,
        pattern: r"^DOMPurify\.",
    },
    // Authentication / authorization checks
    RuleSpec {
        id: "auth-check-call",
        kind: MitigationKind::AuthCheck,
        confidence: Confidence::High,
        scope: MatchScope::Callee,
        pattern: r"(?i)(^|\.)(authenticate|authorize|isauthenticated|isauthorized|requireauth|checkauth|checkpermission|haspermission|verifytoken|requirerole)\w*$",
    },
    // Output encoding
    RuleSpec {
        id: "output-encoding-call",
        kind: MitigationKind::OutputEncoding,
        confidence: Confidence::High,
        scope: MatchScope::Callee,
        pattern: r"(?i)(^|\.)(escape\w*|encodeuricomponent|encodeuri|htmlencode)$",
    },
];

#[derive(Debug)]
pub struct CompiledRule {
    pub id: String,
    pub kind: MitigationKind,
    pub confidence: Confidence,
    pub scope: MatchScope,
    pub regex: Regex,
}

impl CompiledRule {
    pub fn matches(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

/// Compiles the effective rule set for one run: builtins minus
/// `disabled_patterns`, then user rules, then whitelist entries, with
/// `pattern_overrides` applied across all of them. User regexes that fail to
/// compile inside `validation_timeout_ms` are dropped with a warning: a bad
/// rule must never take the detector down.
pub fn compile_rules(config: &AgentConfig) -> Vec<CompiledRule> {
    let mut rules = Vec::new();

    for spec in BUILTIN_RULES {
        if config.disabled_patterns.iter().any(|id| id == spec.id) {
            continue;
        }
        // Builtin patterns are compile-tested; a failure here is a table bug.
        let Ok(regex) = Regex::new(spec.pattern) else {
            tracing::warn!(rule = spec.id, "builtin pattern failed to compile");
            continue;
        };
        rules.push(CompiledRule {
            id: spec.id.to_string(),
            kind: spec.kind,
            confidence: spec.confidence,
            scope: spec.scope,
            regex,
        });
    }

    for pattern in &config.mitigation_patterns {
        if config.disabled_patterns.iter().any(|id| *id == pattern.id) {
            continue;
        }
        let started = Instant::now();
        let compiled = Regex::new(&pattern.callee_pattern);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match compiled {
            Ok(regex) if elapsed_ms <= config.validation_timeout_ms => {
                rules.push(CompiledRule {
                    id: pattern.id.clone(),
                    kind: pattern.kind,
                    confidence: pattern.confidence,
                    scope: MatchScope::Callee,
                    regex,
                });
            }
            Ok(_) => {
                tracing::warn!(
                    rule = %pattern.id,
                    elapsed_ms,
                    "user pattern exceeded validation timeout, dropped"
                );
            }
            Err(e) => {
                tracing::warn!(rule = %pattern.id, error = %e, "user pattern rejected");
            }
        }
    }

    for name in &config.whitelisted_patterns {
        let Ok(regex) = Regex::new(&format!("^{}$", regex::escape(name))) else {
            continue;
        };
        rules.push(CompiledRule {
            id: format!("whitelist:{name}"),
            kind: MitigationKind::Sanitization,
            confidence: Confidence::High,
            scope: MatchScope::Callee,
            regex,
        });
    }

    for rule in &mut rules {
        if let Some(override_) = config.pattern_overrides.get(&rule.id) {
            if let Some(kind) = override_.kind {
                rule.kind = kind;
            }
            if let Some(confidence) = override_.confidence {
                rule.confidence = confidence;
            }
        }
    }
    rules.retain(|rule| {
        config
            .pattern_overrides
            .get(&rule.id)
            .and_then(|o| o.enabled)
            .unwrap_or(true)
    });

    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PatternOverride, UserPattern};

    #[test]
    fn builtins_all_compile() {
        let rules = compile_rules(&AgentConfig::default());
        assert_eq!(rules.len(), BUILTIN_RULES.len());
    }

    #[test]
    fn sanitize_call_matches() {
        let rules = compile_rules(&AgentConfig::default());
        let rule = rules.iter().find(|r| r.id == "sanitization-call").unwrap();
        assert!(rule.matches("sanitizeInput"));
        assert!(rule.matches("utils.sanitizeHtml"));
        assert!(!rule.matches("db.query"));
    }

    #[test]
    fn disabled_patterns_are_removed() {
        let config = AgentConfig {
            disabled_patterns: vec!["validation-null-guard".to_string()],
            ..AgentConfig::default()
        };
        let rules = compile_rules(&config);
        assert!(rules.iter().all(|r| r.id != "validation-null-guard"));
    }

    #[test]
    fn overrides_change_kind_and_confidence() {
        let mut config = AgentConfig::default();
        config.pattern_overrides.insert(
            "sanitization-call".to_string(),
            PatternOverride {
                kind: Some(MitigationKind::Validation),
                confidence: Some(Confidence::Low),
                enabled: None,
            },
        );
        let rules = compile_rules(&config);
        let rule = rules.iter().find(|r| r.id == "sanitization-call").unwrap();
        assert_eq!(rule.kind, MitigationKind::Validation);
        assert_eq!(rule.confidence, Confidence::Low);
    }

    #[test]
    fn override_can_disable_a_rule() {
        let mut config = AgentConfig::default();
        config.pattern_overrides.insert(
            "auth-check-call".to_string(),
            PatternOverride {
                enabled: Some(false),
                ..PatternOverride::default()
            },
        );
        let rules = compile_rules(&config);
        assert!(rules.iter().all(|r| r.id != "auth-check-call"));
    }

    #[test]
    fn invalid_user_pattern_is_dropped_not_fatal() {
        let config = AgentConfig {
            mitigation_patterns: vec![UserPattern {
                id: "broken".to_string(),
                kind: MitigationKind::Validation,
                callee_pattern: "([unclosed".to_string(),
                confidence: Confidence::Medium,
            }],
            ..AgentConfig::default()
        };
        let rules = compile_rules(&config);
        assert!(rules.iter().all(|r| r.id != "broken"));
    }

    #[test]
    fn whitelist_names_become_exact_sanitizer_rules() {
        let config = AgentConfig {
            whitelisted_patterns: vec!["ourCleaner".to_string()],
            ..AgentConfig::default()
        };
        let rules = compile_rules(&config);
        let rule = rules.iter().find(|r| r.id == "whitelist:ourCleaner").unwrap();
        assert!(rule.matches("ourCleaner"));
        assert!(!rule.matches("ourCleanerX"));
        assert_eq!(rule.kind, MitigationKind::Sanitization);
    }
}

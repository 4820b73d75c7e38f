//! Agent configuration.
//!
//! One explicit struct enumerating every recognized option with its default.
//! Constructed once per run and passed by reference; nothing re-derives
//! configuration mid-run.

use crate::core::{AnalysisError, Confidence, MitigationKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    /// A disabled agent returns success with zero findings immediately.
    pub enabled: bool,

    /// Wall-clock ceiling for the whole run, in milliseconds.
    pub time_budget_ms: u64,

    /// Ceiling on accumulated changed-line count across analyzed files.
    pub size_budget_lines: usize,

    /// Bound on following calls into other analyzed units (same batch only).
    pub max_call_depth: usize,

    /// Path-explosion limits for the path analyzer.
    pub max_paths: usize,
    pub max_path_length: usize,

    /// Sink categories to analyze, by name. Unknown names are a
    /// configuration fault.
    pub sink_categories: Vec<String>,

    /// Extra user-supplied mitigation rules, evaluated after the builtins in
    /// the order given here.
    pub mitigation_patterns: Vec<UserPattern>,

    /// Per-rule overrides keyed by pattern id. BTreeMap so iteration order
    /// never depends on hashing.
    pub pattern_overrides: BTreeMap<String, PatternOverride>,

    /// Builtin rule ids to switch off.
    pub disabled_patterns: Vec<String>,

    /// Callee names always trusted as sanitizers, e.g. an in-house wrapper
    /// the builtin table does not know about.
    pub whitelisted_patterns: Vec<String>,

    /// Ceiling for evaluating one pattern against one node, in milliseconds.
    pub pattern_timeout_ms: u64,

    /// Ceiling for validating one user-supplied rule at detector
    /// construction, in milliseconds.
    pub validation_timeout_ms: u64,

    /// Findings below this confidence are dropped: `low`, `medium`, `high`.
    pub rejection_threshold: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPattern {
    pub id: String,

    pub kind: MitigationKind,

    /// Regex matched against a call-site's callee text, e.g. `"^escapeHtml$"`
    /// or `"\\.sanitize$"`.
    pub callee_pattern: String,

    #[serde(default = "default_user_confidence")]
    pub confidence: Confidence,
}

fn default_user_confidence() -> Confidence {
    Confidence::Medium
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatternOverride {
    pub kind: Option<MitigationKind>,

    pub confidence: Option<Confidence>,

    pub enabled: Option<bool>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            time_budget_ms: 30_000,
            size_budget_lines: 5_000,
            max_call_depth: 3,
            max_paths: 100,
            max_path_length: 20,
            sink_categories: vec!["injection".to_string(), "xss".to_string()],
            mitigation_patterns: Vec::new(),
            pattern_overrides: BTreeMap::new(),
            disabled_patterns: Vec::new(),
            whitelisted_patterns: Vec::new(),
            pattern_timeout_ms: 100,
            validation_timeout_ms: 10,
            rejection_threshold: "medium".to_string(),
        }
    }
}

impl AgentConfig {
    /// Structural validation. The only path to `success: false` at the agent
    /// boundary, so every message must say which field is wrong.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        if self.max_paths == 0 {
            return Err(AnalysisError::invalid_config("maxPaths must be at least 1"));
        }
        if self.max_path_length == 0 {
            return Err(AnalysisError::invalid_config(
                "maxPathLength must be at least 1",
            ));
        }
        if self.pattern_timeout_ms == 0 {
            return Err(AnalysisError::invalid_config(
                "patternTimeoutMs must be at least 1",
            ));
        }
        if self.validation_timeout_ms == 0 {
            return Err(AnalysisError::invalid_config(
                "validationTimeoutMs must be at least 1",
            ));
        }
        if Confidence::parse_threshold(&self.rejection_threshold).is_none() {
            return Err(AnalysisError::invalid_config(format!(
                "rejectionThreshold must be low, medium or high, got {:?}",
                self.rejection_threshold
            )));
        }
        if self.sink_categories.is_empty() {
            return Err(AnalysisError::invalid_config(
                "sinkCategories must name at least one category",
            ));
        }
        for category in &self.sink_categories {
            if !crate::analysis::sink_category_exists(category) {
                return Err(AnalysisError::invalid_config(format!(
                    "unknown sink category {:?}",
                    category
                )));
            }
        }
        for pattern in &self.mitigation_patterns {
            if pattern.id.is_empty() {
                return Err(AnalysisError::invalid_config(
                    "mitigationPatterns entries need a non-empty id",
                ));
            }
        }
        Ok(())
    }

    pub fn rejection_threshold(&self) -> Confidence {
        // validate() runs before any use; fall back to the documented default
        // rather than panicking if it did not.
        Confidence::parse_threshold(&self.rejection_threshold).unwrap_or(Confidence::Medium)
    }
}

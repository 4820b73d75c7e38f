use crate::core::{Confidence, Severity};
use serde::{Deserialize, Serialize};

/// The only artifact that crosses the core boundary outward. The reporting
/// layer owns rendering; this type owns nothing but the facts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub severity: Severity,

    pub confidence: Confidence,

    pub file: String,

    pub line: usize,

    pub message: String,

    pub source_agent: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Finding {
    pub fn new(
        severity: Severity,
        confidence: Confidence,
        file: impl Into<String>,
        line: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            confidence,
            file: file.into(),
            line,
            message: message.into(),
            source_agent: crate::AGENT_NAME.to_string(),
            rule_id: None,
            suggestion: None,
        }
    }

    pub fn with_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Stable key used by the downstream dedup layer. Identical findings from
    /// repeated runs must produce identical keys.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.source_agent,
            self.rule_id.as_deref().unwrap_or("-"),
            self.file,
            self.line
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_is_stable() {
        let finding = Finding::new(
            Severity::High,
            Confidence::High,
            "src/db.ts",
            42,
            "unmitigated path to injection sink",
        )
        .with_rule_id("taint-path-injection");

        assert_eq!(
            finding.dedup_key(),
            format!("{}:taint-path-injection:src/db.ts:42", crate::AGENT_NAME)
        );
    }
}

use serde::{Deserialize, Serialize};

/// Per-run execution metrics, accumulated by the orchestrator and handed to
/// the reporting layer alongside the findings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub duration_ms: u64,

    pub files_processed: usize,

    /// Files skipped by the scheduler or by budget exhaustion.
    pub files_skipped: usize,

    /// Files that failed to parse. Each one is recorded here and the run
    /// moves on.
    pub parse_failures: usize,

    pub units_analyzed: usize,

    pub paths_explored: usize,

    pub findings_reported: usize,

    /// Present for agents that spend model tokens; this agent never does,
    /// but the field is part of the shared agent contract.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_fields_are_omitted_when_absent() {
        let json = serde_json::to_string(&ExecutionMetrics::default()).unwrap();
        assert!(!json.contains("inputTokens"));
        assert!(json.contains("filesProcessed"));
    }
}

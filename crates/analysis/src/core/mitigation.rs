use crate::core::Confidence;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The defensive-pattern categories the detector recognizes. Which kinds
/// neutralize which sink category is decided by the sink table, not here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MitigationKind {
    Validation,
    Sanitization,
    AuthCheck,
    OutputEncoding,
}

impl fmt::Display for MitigationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Sanitization => write!(f, "sanitization"),
            Self::AuthCheck => write!(f, "authCheck"),
            Self::OutputEncoding => write!(f, "outputEncoding"),
        }
    }
}

/// One recognized mitigation, attached in place to the CFG node it was found
/// on. Multiple mitigations may tag the same node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mitigation {
    pub kind: MitigationKind,

    /// Id of the rule that matched, for overrides and reporting.
    pub pattern_id: String,

    pub confidence: Confidence,
}

impl Mitigation {
    pub fn new(kind: MitigationKind, pattern_id: impl Into<String>, confidence: Confidence) -> Self {
        Self {
            kind,
            pattern_id: pattern_id.into(),
            confidence,
        }
    }
}

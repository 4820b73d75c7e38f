//! The external review-agent contract.
//!
//! The surrounding pipeline hands every agent the same changed-file context
//! and collects `AgentOutcome`s. `run` is async only because it sits inside
//! that pipeline's async execution loop; this agent's body is a synchronous
//! computation.

use crate::core::{ExecutionMetrics, Finding};
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Renamed,
    Deleted,
}

/// One changed file as delivered by the diff collaborator. `content` holds
/// the post-change file text when available, `patch` the unified diff;
/// analysis prefers `content` and falls back to the added lines of `patch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    pub status: FileStatus,
}

impl ChangedFile {
    pub fn with_content(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
            patch: None,
            status: FileStatus::Modified,
        }
    }

    /// The text this agent analyzes: full content when present, otherwise
    /// the `+` lines of the patch (context enough for syntax-level work).
    pub fn analyzable_text(&self) -> Option<String> {
        if let Some(content) = &self.content {
            return Some(content.clone());
        }
        let patch = self.patch.as_deref()?;
        let added: Vec<&str> = patch
            .lines()
            .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
            .map(|line| &line[1..])
            .collect();
        if added.is_empty() {
            None
        } else {
            Some(added.join("\n"))
        }
    }

    /// Changed-line count consumed from the size budget for this file.
    pub fn changed_lines(&self) -> usize {
        if let Some(patch) = &self.patch {
            patch
                .lines()
                .filter(|line| {
                    (line.starts_with('+') && !line.starts_with("+++"))
                        || (line.starts_with('-') && !line.starts_with("---"))
                })
                .count()
        } else {
            self.content
                .as_deref()
                .map(|text| text.lines().count())
                .unwrap_or(0)
        }
    }
}

/// Everything an agent receives for one review pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewContext {
    pub changed_files: Vec<ChangedFile>,
}

impl ReviewContext {
    pub fn new(changed_files: Vec<ChangedFile>) -> Self {
        Self { changed_files }
    }
}

/// What an agent returns. `success: false` means the agent itself faulted;
/// skipped files and per-file parse errors are still a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub success: bool,

    pub findings: Vec<Finding>,

    pub metrics: ExecutionMetrics,

    /// Human-readable fault description when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentOutcome {
    pub fn succeeded(findings: Vec<Finding>, metrics: ExecutionMetrics) -> Self {
        Self {
            success: true,
            findings,
            metrics,
            error: None,
        }
    }

    pub fn faulted(message: impl Into<String>, metrics: ExecutionMetrics) -> Self {
        Self {
            success: false,
            findings: Vec::new(),
            metrics,
            error: Some(message.into()),
        }
    }
}

#[async_trait]
pub trait ReviewAgent: Send + Sync {
    fn name(&self) -> &'static str;

    /// Cheap path-only filter the pipeline calls before building contexts.
    fn supports(&self, path: &str) -> bool;

    async fn run(&self, context: &ReviewContext) -> Result<AgentOutcome>;
}

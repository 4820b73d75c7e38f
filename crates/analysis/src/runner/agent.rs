//! The orchestrating agent.
//!
//! Wires extraction, CFG construction, mitigation detection and path
//! analysis together behind the external review-agent contract. Every
//! per-file failure is caught at its own boundary: one bad file never
//! prevents analysis of the rest, and budget exhaustion degrades the run
//! instead of failing it.

use crate::analysis::{MitigationDetector, PathAnalyzer, PathLimits, SinkCategory};
use crate::cfg::{Cfg, CfgBuilder};
use crate::core::{
    AgentConfig, AgentOutcome, ChangedFile, ExecutionMetrics, FileStatus, Finding, ReviewAgent,
    ReviewContext,
};
use crate::runner::budget::{AnalysisBudget, BudgetSignal};
use crate::runner::scheduler;
use crate::source::SourceUnitExtractor;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

pub struct TaintPathAgent {
    config: AgentConfig,
}

impl TaintPathAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(AgentConfig::default())
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// The whole run, synchronous by design: files strictly in priority
    /// order, budget checked between files, so exhaustion is reproducible.
    fn analyze(&self, context: &ReviewContext) -> AgentOutcome {
        let mut metrics = ExecutionMetrics::default();

        if let Err(fault) = self.config.validate() {
            tracing::warn!(error = %fault, "configuration rejected");
            return AgentOutcome::faulted(fault.to_string(), metrics);
        }

        if !self.config.enabled || context.changed_files.is_empty() {
            return AgentOutcome::succeeded(Vec::new(), metrics);
        }

        let mut budget =
            AnalysisBudget::new(self.config.time_budget_ms, self.config.size_budget_lines);
        let extractor = SourceUnitExtractor::new();
        let detector = MitigationDetector::from_config(&self.config);
        let mut sinks: Vec<SinkCategory> = self
            .config
            .sink_categories
            .iter()
            .filter_map(|name| SinkCategory::compile(name))
            .collect();
        let limits = PathLimits::from_config(&self.config);

        let mut files: Vec<ChangedFile> = Vec::new();
        for file in &context.changed_files {
            if file.status == FileStatus::Deleted || !scheduler::should_analyze_file(&file.path) {
                metrics.files_skipped += 1;
                continue;
            }
            files.push(file.clone());
        }
        scheduler::sort_files_by_priority(&mut files);

        budget.start();
        let mut findings = Vec::new();

        for (index, file) in files.iter().enumerate() {
            if budget.check() == BudgetSignal::Stop {
                metrics.files_skipped += files.len() - index;
                tracing::debug!(
                    skipped = files.len() - index,
                    "budget exhausted, remaining files skipped"
                );
                break;
            }

            budget.consume_lines(file.changed_lines());

            let Some(text) = file.analyzable_text() else {
                metrics.files_skipped += 1;
                continue;
            };

            self.analyze_file(
                file,
                &text,
                &extractor,
                &detector,
                &mut sinks,
                limits,
                &mut findings,
                &mut metrics,
            );

            budget.record_file();
            metrics.files_processed += 1;
        }

        budget.complete();
        metrics.duration_ms = budget.elapsed_ms();
        metrics.findings_reported = findings.len();
        tracing::debug!(
            files = metrics.files_processed,
            findings = findings.len(),
            duration_ms = metrics.duration_ms,
            "run finished"
        );

        AgentOutcome::succeeded(findings, metrics)
    }

    /// One file: parse, build, tag, walk. A parse failure is recorded and
    /// the run moves on.
    #[allow(clippy::too_many_arguments)]
    fn analyze_file(
        &self,
        file: &ChangedFile,
        text: &str,
        extractor: &SourceUnitExtractor,
        detector: &MitigationDetector,
        sinks: &mut [SinkCategory],
        limits: PathLimits,
        findings: &mut Vec<Finding>,
        metrics: &mut ExecutionMetrics,
    ) {
        let parsed = match extractor.parse(&file.path, text) {
            Ok(parsed) => parsed,
            Err(e) => {
                metrics.parse_failures += 1;
                tracing::warn!(file = %file.path, error = %e, "file skipped");
                return;
            }
        };

        let units = extractor.extract_units(&parsed);
        metrics.units_analyzed += units.len();

        let mut cfgs: Vec<Cfg> = units
            .iter()
            .map(|unit| CfgBuilder::build(&parsed, unit))
            .collect();
        for cfg in &mut cfgs {
            detector.tag(cfg);
        }

        let threshold = self.config.rejection_threshold();
        for sink in sinks.iter_mut() {
            sink.resolve_batch(&cfgs, self.config.max_call_depth);
            for cfg in &cfgs {
                let result = PathAnalyzer::new(sink, limits).analyze(cfg);
                metrics.paths_explored += result.paths_to_sink.len();
                if result.unmitigated_paths.is_empty() {
                    continue;
                }

                let confidence = match result.status {
                    crate::analysis::AnalysisStatus::Truncated => {
                        sink.confidence.capped_at(crate::core::Confidence::Medium)
                    }
                    _ => sink.confidence,
                };
                if confidence < threshold {
                    continue;
                }

                let severity = if result.coverage_percent == 0.0 {
                    sink.base_severity.escalated()
                } else {
                    sink.base_severity
                };

                // One finding per distinct sink node; several paths to the
                // same call-site are one observation.
                let mut reported: BTreeSet<_> = BTreeSet::new();
                let total = result.paths_to_sink.len();
                for path in &result.unmitigated_paths {
                    let Some(sink_node) = path.last() else { continue };
                    if !reported.insert(*sink_node) {
                        continue;
                    }
                    let node = cfg.node(*sink_node);
                    findings.push(
                        Finding::new(
                            severity,
                            confidence,
                            file.path.clone(),
                            node.span.start_line,
                            format!(
                                "`{}` reaches a {} sink (`{}`) on {} of {} execution path{} with no {} on the way",
                                cfg.unit_name,
                                sink.name,
                                node.snippet,
                                result.unmitigated_paths.len(),
                                total,
                                if total == 1 { "" } else { "s" },
                                relevant_kinds_label(sink),
                            ),
                        )
                        .with_rule_id(format!("taint-path-{}", sink.name))
                        .with_suggestion(suggestion_for(sink.name)),
                    );
                }
            }
        }
    }
}

fn relevant_kinds_label(sink: &SinkCategory) -> String {
    let names: Vec<String> = sink.relevant.iter().map(|kind| kind.to_string()).collect();
    names.join(" or ")
}

fn suggestion_for(category: &str) -> String {
    match category {
        "injection" => {
            "Validate or sanitize the input before it reaches the query/exec call, \
             or use a parameterized API."
                .to_string()
        }
        "xss" => {
            "Encode or sanitize the value before writing it into markup."
                .to_string()
        }
        _ => "Add a mitigation on every path that reaches this sink.".to_string(),
    }
}

#[async_trait]
impl ReviewAgent for TaintPathAgent {
    fn name(&self) -> &'static str {
        crate::AGENT_NAME
    }

    fn supports(&self, path: &str) -> bool {
        scheduler::should_analyze_file(path)
    }

    async fn run(&self, context: &ReviewContext) -> Result<AgentOutcome> {
        Ok(self.analyze(context))
    }
}

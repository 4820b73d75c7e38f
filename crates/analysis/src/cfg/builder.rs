//! Syntax-tree to CFG lowering.
//!
//! One pass over the unit's body, creating nodes in pre-order so ids are
//! dense and deterministic. Control flow is threaded through a "frontier" of
//! dangling edges: building a statement consumes the incoming frontier and
//! returns the frontier that falls through to whatever comes next.

use crate::cfg::graph::{Cfg, EdgeKind, NodeId, NodeKind, SourceSpan};
use crate::source::language::node_kinds as k;
use crate::source::{ParsedFile, SourceUnit};
use tree_sitter::Node;

const SNIPPET_MAX: usize = 120;

/// A dangling edge: source node plus the kind the edge will carry once its
/// target exists.
type Frontier = Vec<(NodeId, EdgeKind)>;

struct LoopCtx {
    breaks: Vec<NodeId>,
    continues: Vec<NodeId>,
}

pub struct CfgBuilder<'a> {
    source: &'a str,
    cfg: Cfg,
    loops: Vec<LoopCtx>,
}

impl<'a> CfgBuilder<'a> {
    /// Builds the CFG for one extracted unit. Extraction already vetted the
    /// syntax, so this has no failure mode of its own; a unit whose node
    /// cannot be recovered yields the degenerate entry-only graph.
    pub fn build(file: &'a ParsedFile, unit: &SourceUnit) -> Cfg {
        let mut builder = CfgBuilder {
            source: &file.source,
            cfg: Cfg::new(unit.id.clone(), unit.name.clone()),
            loops: Vec::new(),
        };

        let Some(node) = file.unit_node(unit) else {
            builder
                .cfg
                .add_node(NodeKind::Entry, SourceSpan::default(), String::new());
            return builder.cfg;
        };

        let entry = builder.add(NodeKind::Entry, node);
        let frontier = match node.child_by_field_name(k::FIELD_BODY) {
            Some(body) if body.kind() == k::STATEMENT_BLOCK => {
                builder.block(body, vec![(entry, EdgeKind::Normal)])
            }
            // Concise arrow body: a single expression statement.
            Some(body) => {
                let stmt = builder.add(NodeKind::Statement, body);
                builder.collect_calls(body, stmt);
                builder.connect(vec![(entry, EdgeKind::Normal)], stmt);
                vec![(stmt, EdgeKind::Normal)]
            }
            None => vec![(entry, EdgeKind::Normal)],
        };

        if !frontier.is_empty() {
            let exit = builder.add(NodeKind::Exit, node);
            builder.connect(frontier, exit);
        }

        builder.cfg
    }

    fn block(&mut self, block: Node<'a>, mut frontier: Frontier) -> Frontier {
        for i in 0..block.named_child_count() {
            if let Some(stmt) = block.named_child(i) {
                frontier = self.statement(stmt, frontier);
            }
        }
        frontier
    }

    fn statement(&mut self, stmt: Node<'a>, frontier: Frontier) -> Frontier {
        match stmt.kind() {
            k::COMMENT | k::EMPTY_STATEMENT => frontier,
            k::STATEMENT_BLOCK => self.block(stmt, frontier),
            k::IF_STATEMENT => self.if_statement(stmt, frontier),
            k::WHILE_STATEMENT => self.while_statement(stmt, frontier),
            k::DO_STATEMENT => self.do_statement(stmt, frontier),
            k::FOR_STATEMENT => self.for_statement(stmt, frontier),
            k::FOR_IN_STATEMENT => self.for_in_statement(stmt, frontier),
            k::TRY_STATEMENT => self.try_statement(stmt, frontier),
            k::RETURN_STATEMENT => self.terminator(stmt, NodeKind::Return, frontier),
            k::THROW_STATEMENT => self.terminator(stmt, NodeKind::Throw, frontier),
            k::BREAK_STATEMENT => {
                let node = self.add(NodeKind::Statement, stmt);
                self.connect(frontier, node);
                if let Some(ctx) = self.loops.last_mut() {
                    ctx.breaks.push(node);
                }
                Vec::new()
            }
            k::CONTINUE_STATEMENT => {
                let node = self.add(NodeKind::Statement, stmt);
                self.connect(frontier, node);
                if let Some(ctx) = self.loops.last_mut() {
                    ctx.continues.push(node);
                }
                Vec::new()
            }
            // Plain statements, declarations, switch (lowered flat; the
            // closed NodeKind set has no n-way branch), awaited expressions.
            _ => {
                let node = self.add(NodeKind::Statement, stmt);
                self.collect_calls(stmt, node);
                self.connect(frontier, node);
                vec![(node, EdgeKind::Normal)]
            }
        }
    }

    /// `if`: one Branch node; true/false arms reconverge on the statement
    /// after the `if`. A missing `else` sends the false edge straight there.
    fn if_statement(&mut self, stmt: Node<'a>, frontier: Frontier) -> Frontier {
        let branch = self.add(NodeKind::Branch, stmt);
        if let Some(condition) = stmt.child_by_field_name(k::FIELD_CONDITION) {
            self.collect_calls(condition, branch);
        }
        self.connect(frontier, branch);

        let mut out = match stmt.child_by_field_name(k::FIELD_CONSEQUENCE) {
            Some(consequence) => self.statement(consequence, vec![(branch, EdgeKind::TrueBranch)]),
            None => vec![(branch, EdgeKind::TrueBranch)],
        };

        match stmt
            .child_by_field_name(k::FIELD_ALTERNATIVE)
            .and_then(|alternative| {
                if alternative.kind() == k::ELSE_CLAUSE {
                    alternative.named_child(0)
                } else {
                    Some(alternative)
                }
            }) {
            Some(alternative) => {
                let false_frontier =
                    self.statement(alternative, vec![(branch, EdgeKind::FalseBranch)]);
                out.extend(false_frontier);
            }
            None => out.push((branch, EdgeKind::FalseBranch)),
        }
        out
    }

    fn while_statement(&mut self, stmt: Node<'a>, frontier: Frontier) -> Frontier {
        let header = self.add(NodeKind::LoopHeader, stmt);
        if let Some(condition) = stmt.child_by_field_name(k::FIELD_CONDITION) {
            self.collect_calls(condition, header);
        }
        self.connect(frontier, header);
        self.loop_body(stmt, header, vec![(header, EdgeKind::TrueBranch)], header)
    }

    /// `do` runs the body before the condition, so body nodes precede the
    /// header in id order; the back edge goes header → body entry.
    fn do_statement(&mut self, stmt: Node<'a>, frontier: Frontier) -> Frontier {
        let body_entry_id = NodeId(self.cfg.node_count() as u32);
        self.loops.push(LoopCtx {
            breaks: Vec::new(),
            continues: Vec::new(),
        });
        let body_frontier = match stmt.child_by_field_name(k::FIELD_BODY) {
            Some(body) => self.statement(body, frontier),
            None => frontier,
        };
        let ctx = self.loops.pop().expect("loop context pushed above");

        let header = self.add(NodeKind::LoopHeader, stmt);
        if let Some(condition) = stmt.child_by_field_name(k::FIELD_CONDITION) {
            self.collect_calls(condition, header);
        }
        self.connect(body_frontier, header);
        for cont in &ctx.continues {
            self.cfg.add_edge(*cont, header, EdgeKind::Normal);
        }
        // An empty body degenerates to the header looping on itself.
        let back_target = if body_entry_id.index() < header.index() {
            body_entry_id
        } else {
            header
        };
        self.cfg.add_edge(header, back_target, EdgeKind::LoopBack);

        let mut out = vec![(header, EdgeKind::FalseBranch)];
        out.extend(ctx.breaks.into_iter().map(|id| (id, EdgeKind::Normal)));
        out
    }

    fn for_statement(&mut self, stmt: Node<'a>, mut frontier: Frontier) -> Frontier {
        if let Some(init) = stmt.child_by_field_name("initializer") {
            if init.kind() != k::EMPTY_STATEMENT {
                let node = self.add(NodeKind::Statement, init);
                self.collect_calls(init, node);
                self.connect(frontier, node);
                frontier = vec![(node, EdgeKind::Normal)];
            }
        }

        let header = self.add(NodeKind::LoopHeader, stmt);
        if let Some(condition) = stmt.child_by_field_name(k::FIELD_CONDITION) {
            self.collect_calls(condition, header);
        }
        self.connect(frontier, header);

        self.loops.push(LoopCtx {
            breaks: Vec::new(),
            continues: Vec::new(),
        });
        let body_frontier = match stmt.child_by_field_name(k::FIELD_BODY) {
            Some(body) => self.statement(body, vec![(header, EdgeKind::TrueBranch)]),
            None => vec![(header, EdgeKind::TrueBranch)],
        };
        let ctx = self.loops.pop().expect("loop context pushed above");

        // The increment runs between the body and the next header check;
        // `continue` jumps to it when present.
        let back_source: Frontier = match stmt.child_by_field_name("increment") {
            Some(increment) => {
                let node = self.add(NodeKind::Statement, increment);
                self.collect_calls(increment, node);
                self.connect(body_frontier, node);
                for cont in &ctx.continues {
                    self.cfg.add_edge(*cont, node, EdgeKind::Normal);
                }
                vec![(node, EdgeKind::Normal)]
            }
            None => {
                let mut sources = body_frontier;
                sources.extend(ctx.continues.iter().map(|id| (*id, EdgeKind::Normal)));
                sources
            }
        };
        for (from, _) in back_source {
            self.cfg.add_edge(from, header, EdgeKind::LoopBack);
        }

        let mut out = vec![(header, EdgeKind::FalseBranch)];
        out.extend(ctx.breaks.into_iter().map(|id| (id, EdgeKind::Normal)));
        out
    }

    /// Covers both `for-in` and `for-of`; the grammar folds them into one
    /// node kind and the structure is identical.
    fn for_in_statement(&mut self, stmt: Node<'a>, frontier: Frontier) -> Frontier {
        let header = self.add(NodeKind::LoopHeader, stmt);
        if let Some(right) = stmt.child_by_field_name("right") {
            self.collect_calls(right, header);
        }
        self.connect(frontier, header);
        self.loop_body(stmt, header, vec![(header, EdgeKind::TrueBranch)], header)
    }

    /// Shared tail for condition-first loops: body, back edge, break and
    /// continue wiring, loop-exit frontier.
    fn loop_body(
        &mut self,
        stmt: Node<'a>,
        header: NodeId,
        body_entry: Frontier,
        continue_target: NodeId,
    ) -> Frontier {
        self.loops.push(LoopCtx {
            breaks: Vec::new(),
            continues: Vec::new(),
        });
        let body_frontier = match stmt.child_by_field_name(k::FIELD_BODY) {
            Some(body) => self.statement(body, body_entry),
            None => body_entry,
        };
        let ctx = self.loops.pop().expect("loop context pushed above");

        for (from, _) in body_frontier {
            self.cfg.add_edge(from, header, EdgeKind::LoopBack);
        }
        for cont in &ctx.continues {
            self.cfg.add_edge(*cont, continue_target, EdgeKind::LoopBack);
        }

        let mut out = vec![(header, EdgeKind::FalseBranch)];
        out.extend(ctx.breaks.into_iter().map(|id| (id, EdgeKind::Normal)));
        out
    }

    /// `try`/`catch`/`finally`. Every node lowered from the try body gets an
    /// exception edge to the catch node (or to finally when there is no
    /// handler); try and catch fall-throughs both feed finally.
    fn try_statement(&mut self, stmt: Node<'a>, frontier: Frontier) -> Frontier {
        let try_first = self.cfg.node_count();
        let try_frontier = match stmt.child_by_field_name(k::FIELD_BODY) {
            Some(body) => self.block(body, frontier),
            None => frontier,
        };
        let try_range: Vec<NodeId> =
            (try_first..self.cfg.node_count()).map(|i| NodeId(i as u32)).collect();

        let handler = stmt.child_by_field_name(k::FIELD_HANDLER);
        let finalizer = stmt.child_by_field_name(k::FIELD_FINALIZER);

        let (catch_frontier, catch_node) = match handler {
            Some(clause) => {
                let catch_node = self.add(NodeKind::Catch, clause);
                for id in &try_range {
                    self.cfg.add_edge(*id, catch_node, EdgeKind::ExceptionPath);
                }
                let catch_frontier = match clause.child_by_field_name(k::FIELD_BODY) {
                    Some(body) => self.block(body, vec![(catch_node, EdgeKind::Normal)]),
                    None => vec![(catch_node, EdgeKind::Normal)],
                };
                (catch_frontier, Some(catch_node))
            }
            None => (Vec::new(), None),
        };

        match finalizer {
            Some(clause) => {
                let finally_node = self.add(NodeKind::Finally, clause);
                if catch_node.is_none() {
                    for id in &try_range {
                        self.cfg.add_edge(*id, finally_node, EdgeKind::ExceptionPath);
                    }
                }
                self.connect(try_frontier, finally_node);
                self.connect(catch_frontier, finally_node);
                match clause.child_by_field_name(k::FIELD_BODY) {
                    Some(body) => self.block(body, vec![(finally_node, EdgeKind::Normal)]),
                    None => vec![(finally_node, EdgeKind::Normal)],
                }
            }
            None => {
                let mut out = try_frontier;
                out.extend(catch_frontier);
                out
            }
        }
    }

    fn terminator(&mut self, stmt: Node<'a>, kind: NodeKind, frontier: Frontier) -> Frontier {
        let node = self.add(kind, stmt);
        self.collect_calls(stmt, node);
        self.connect(frontier, node);
        Vec::new()
    }

    fn add(&mut self, kind: NodeKind, node: Node<'a>) -> NodeId {
        let span = SourceSpan {
            start_line: node.start_position().row + 1,
            start_column: node.start_position().column + 1,
            end_line: node.end_position().row + 1,
            end_column: node.end_position().column + 1,
        };
        self.cfg.add_node(kind, span, self.snippet(node))
    }

    fn snippet(&self, node: Node<'a>) -> String {
        let text = node
            .utf8_text(self.source.as_bytes())
            .unwrap_or_default()
            .lines()
            .next()
            .unwrap_or_default()
            .trim();
        text.chars().take(SNIPPET_MAX).collect()
    }

    fn connect(&mut self, frontier: Frontier, to: NodeId) {
        for (from, kind) in frontier {
            self.cfg.add_edge(from, to, kind);
        }
    }

    /// Collects callee texts from a statement's subtree in source order.
    /// Named function definitions and functions directly bound to a name are
    /// skipped; they are separate units, defined here but not executed.
    /// Inline callbacks stay in: the enclosing call runs them.
    fn collect_calls(&mut self, node: Node<'a>, target: NodeId) {
        let mut calls = Vec::new();
        self.walk_calls(node, &mut calls);
        self.cfg.node_mut(target).calls.extend(calls);
    }

    fn walk_calls(&self, node: Node<'a>, out: &mut Vec<String>) {
        match node.kind() {
            k::FUNCTION_DECLARATION
            | k::GENERATOR_FUNCTION_DECLARATION
            | k::METHOD_DEFINITION => return,
            k::ARROW_FUNCTION | k::FUNCTION_EXPRESSION => {
                if node
                    .parent()
                    .is_some_and(|parent| parent.kind() == k::VARIABLE_DECLARATOR)
                {
                    return;
                }
            }
            k::CALL_EXPRESSION => {
                if let Some(callee) = node.child_by_field_name(k::FIELD_FUNCTION) {
                    if let Ok(text) = callee.utf8_text(self.source.as_bytes()) {
                        out.push(text.split_whitespace().collect());
                    }
                }
            }
            k::NEW_EXPRESSION => {
                if let Some(ctor) = node.child_by_field_name("constructor") {
                    if let Ok(text) = ctor.utf8_text(self.source.as_bytes()) {
                        out.push(format!("new {}", text.trim()));
                    }
                }
            }
            _ => {}
        }
        for i in 0..node.named_child_count() {
            if let Some(child) = node.named_child(i) {
                self.walk_calls(child, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg::graph::NodeKind;
    use crate::source::SourceUnitExtractor;

    fn build_first(source: &str) -> Cfg {
        let extractor = SourceUnitExtractor::new();
        let file = extractor.parse("test.ts", source).unwrap();
        let units = extractor.extract_units(&file);
        assert!(!units.is_empty(), "no units in test source");
        CfgBuilder::build(&file, &units[0])
    }

    #[test]
    fn straight_line_has_one_entry_one_exit() {
        let cfg = build_first("function f() { const a = 1; const b = 2; }\n");
        assert_eq!(cfg.count_kind(NodeKind::Entry), 1);
        assert_eq!(cfg.exit_nodes.len(), 1);
        assert_eq!(cfg.count_kind(NodeKind::Statement), 2);
    }

    #[test]
    fn if_else_diamond() {
        let cfg = build_first(
            "function f(x: number) { if (x > 0) { use(x); } else { skip(x); } done(); }\n",
        );
        assert_eq!(cfg.count_kind(NodeKind::Branch), 1);
        // Both arms reconverge on done().
        let branch = cfg.nodes.iter().find(|n| n.kind == NodeKind::Branch).unwrap();
        let succ = cfg.successors(branch.id);
        assert_eq!(succ.len(), 2);
        assert_eq!(succ[0].0, EdgeKind::TrueBranch);
        assert_eq!(succ[1].0, EdgeKind::FalseBranch);
    }

    #[test]
    fn returns_become_distinct_exits() {
        let cfg = build_first(
            "function checkValue(x: number) { if (x > 0) return 'positive'; else if (x < 0) return 'negative'; return 'zero'; }\n",
        );
        assert_eq!(cfg.count_kind(NodeKind::Entry), 1);
        assert_eq!(cfg.count_kind(NodeKind::Branch), 2);
        assert_eq!(cfg.exit_nodes.len(), 3);
        assert_eq!(cfg.count_kind(NodeKind::Return), 3);
    }

    #[test]
    fn while_loop_has_back_edge() {
        let cfg = build_first("function f(n: number) { while (n > 0) { n -= 1; } return n; }\n");
        assert_eq!(cfg.count_kind(NodeKind::LoopHeader), 1);
        assert!(cfg.edges.iter().any(|e| e.kind == EdgeKind::LoopBack));
        let header = cfg
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::LoopHeader)
            .unwrap();
        let succ = cfg.successors(header.id);
        assert!(succ.iter().any(|(kind, _)| *kind == EdgeKind::TrueBranch));
        assert!(succ.iter().any(|(kind, _)| *kind == EdgeKind::FalseBranch));
    }

    #[test]
    fn do_loop_body_precedes_header() {
        let cfg = build_first("function f(n: number) { do { n -= 1; } while (n > 0); return n; }\n");
        let header = cfg
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::LoopHeader)
            .unwrap();
        let body = cfg
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Statement)
            .unwrap();
        assert!(body.id < header.id);
        assert!(cfg
            .edges
            .iter()
            .any(|e| e.from == header.id && e.to == body.id && e.kind == EdgeKind::LoopBack));
    }

    #[test]
    fn try_statements_get_exception_edges_to_catch() {
        let cfg = build_first(
            "function f() { try { one(); two(); } catch (e) { handle(e); } cleanup(); }\n",
        );
        let catch_node = cfg.nodes.iter().find(|n| n.kind == NodeKind::Catch).unwrap();
        let exception_edges: Vec<_> = cfg
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::ExceptionPath && e.to == catch_node.id)
            .collect();
        assert_eq!(exception_edges.len(), 2);
    }

    #[test]
    fn finally_joins_try_and_catch() {
        let cfg = build_first(
            "function f() { try { risky(); } catch (e) { handle(e); } finally { release(); } }\n",
        );
        let finally_node = cfg
            .nodes
            .iter()
            .find(|n| n.kind == NodeKind::Finally)
            .unwrap();
        let incoming: Vec<_> = cfg
            .edges
            .iter()
            .filter(|e| e.to == finally_node.id && e.kind == EdgeKind::Normal)
            .collect();
        assert!(incoming.len() >= 2, "try and catch must both reach finally");
    }

    #[test]
    fn break_exits_the_loop() {
        let cfg = build_first(
            "function f(items: number[]) { for (const item of items) { if (item < 0) break; use(item); } return 1; }\n",
        );
        // The break node's only forward edge lands after the loop, not back
        // at the header.
        assert!(cfg.edges.iter().any(|e| e.kind == EdgeKind::LoopBack));
        assert_eq!(cfg.exit_nodes.len(), 1);
    }

    #[test]
    fn calls_are_collected_in_source_order() {
        let cfg = build_first(
            "function f(input: string) { const clean = sanitizeInput(input); db.query(clean); }\n",
        );
        let calls: Vec<&str> = cfg
            .nodes
            .iter()
            .flat_map(|n| n.calls.iter().map(String::as_str))
            .collect();
        assert_eq!(calls, vec!["sanitizeInput", "db.query"]);
    }

    #[test]
    fn nested_function_definitions_do_not_leak_calls() {
        let cfg = build_first(
            "function outer() { const helper = () => db.query('x'); return helper; }\n",
        );
        let calls: Vec<&str> = cfg
            .nodes
            .iter()
            .flat_map(|n| n.calls.iter().map(String::as_str))
            .collect();
        assert!(calls.is_empty(), "bound arrow body must not leak: {calls:?}");
    }

    #[test]
    fn await_is_structurally_transparent() {
        let cfg = build_first(
            "async function f() { const data = await fetchData(); return data; }\n",
        );
        assert_eq!(cfg.count_kind(NodeKind::Statement), 1);
        assert_eq!(cfg.exit_nodes.len(), 1);
        let calls: Vec<&str> = cfg
            .nodes
            .iter()
            .flat_map(|n| n.calls.iter().map(String::as_str))
            .collect();
        assert_eq!(calls, vec!["fetchData"]);
    }
}

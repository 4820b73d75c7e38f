//! Per-run analysis budget.
//!
//! One instance per orchestrator invocation, owned by the run and passed by
//! reference. Never a process-wide singleton, never shared across runs.
//! `check` is called between files, potentially thousands of times, so it
//! does nothing but compare two counters against their ceilings.

use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetState {
    Idle,
    Running,
    Exhausted,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetSignal {
    Continue,
    Stop,
}

#[derive(Debug)]
pub struct AnalysisBudget {
    time_budget_ms: u64,
    size_budget_lines: usize,

    started: Option<Instant>,
    lines_consumed: usize,
    files_processed: usize,
    state: BudgetState,
}

impl AnalysisBudget {
    pub fn new(time_budget_ms: u64, size_budget_lines: usize) -> Self {
        Self {
            time_budget_ms,
            size_budget_lines,
            started: None,
            lines_consumed: 0,
            files_processed: 0,
            state: BudgetState::Idle,
        }
    }

    pub fn start(&mut self) {
        self.started = Some(Instant::now());
        self.state = BudgetState::Running;
    }

    /// Continue/stop signal. Never panics, never errors: exhaustion is a
    /// normal outcome, not a failure.
    pub fn check(&mut self) -> BudgetSignal {
        match self.state {
            BudgetState::Idle => BudgetSignal::Continue,
            BudgetState::Exhausted => BudgetSignal::Stop,
            BudgetState::Completed => BudgetSignal::Stop,
            BudgetState::Running => {
                if self.elapsed_ms() >= self.time_budget_ms
                    || self.lines_consumed >= self.size_budget_lines
                {
                    self.state = BudgetState::Exhausted;
                    tracing::debug!(
                        elapsed_ms = self.elapsed_ms(),
                        lines = self.lines_consumed,
                        "budget exhausted, entering degraded mode"
                    );
                    BudgetSignal::Stop
                } else {
                    BudgetSignal::Continue
                }
            }
        }
    }

    pub fn consume_lines(&mut self, lines: usize) {
        self.lines_consumed = self.lines_consumed.saturating_add(lines);
    }

    pub fn record_file(&mut self) {
        self.files_processed += 1;
    }

    pub fn complete(&mut self) {
        if self.state == BudgetState::Running {
            self.state = BudgetState::Completed;
        }
    }

    pub fn state(&self) -> BudgetState {
        self.state
    }

    pub fn files_processed(&self) -> usize {
        self.files_processed
    }

    pub fn lines_consumed(&self) -> usize {
        self.lines_consumed
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_budget_continues() {
        let mut budget = AnalysisBudget::new(10_000, 1_000);
        budget.start();
        assert_eq!(budget.check(), BudgetSignal::Continue);
        assert_eq!(budget.state(), BudgetState::Running);
    }

    #[test]
    fn line_exhaustion_stops_and_sticks() {
        let mut budget = AnalysisBudget::new(10_000, 100);
        budget.start();
        budget.consume_lines(100);
        assert_eq!(budget.check(), BudgetSignal::Stop);
        assert_eq!(budget.state(), BudgetState::Exhausted);
        // Exhaustion is terminal; completing does not resurrect the run.
        budget.complete();
        assert_eq!(budget.state(), BudgetState::Exhausted);
        assert_eq!(budget.check(), BudgetSignal::Stop);
    }

    #[test]
    fn zero_time_budget_exhausts_immediately() {
        let mut budget = AnalysisBudget::new(0, 1_000);
        budget.start();
        assert_eq!(budget.check(), BudgetSignal::Stop);
    }

    #[test]
    fn check_is_cheap() {
        let mut budget = AnalysisBudget::new(60_000, 1_000_000);
        budget.start();
        let started = Instant::now();
        for _ in 0..10_000 {
            let _ = budget.check();
        }
        let average = started.elapsed().as_micros() / 10_000;
        assert!(average < 1_000, "check averaged {average}µs");
    }
}

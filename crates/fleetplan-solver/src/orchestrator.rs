//! Solve Orchestrator.
//!
//! Submits a built model to a [`SolverBackend`] and classifies the outcome:
//!
//! ```text
//! BUILT → SUBMITTED → OPTIMAL | FEASIBLE_SUBOPTIMAL | INFEASIBLE
//!                   | TIME_LIMIT_NO_SOLUTION | SOLVER_ERROR
//! ```
//!
//! The backend call runs on the caller's thread. A scoped watchdog thread
//! relays the caller's cancellation token into the backend and cancels the
//! backend itself once the time limit plus a grace period has passed, so a
//! backend that ignores its own limit cannot hang the run.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use fleetplan_model::{
    BackendError, BackendOutcome, BackendSession, BackendStatus, CancellationToken, Model,
    SolveLimits, SolverBackend,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const WATCH_INTERVAL: Duration = Duration::from_millis(2);

/// Terminal status of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    /// Proven optimal within the gap tolerance.
    Optimal,
    /// A plan exists but optimality was not proven.
    FeasibleSuboptimal,
    /// The model admits no solution.
    Infeasible,
    /// The time limit was reached before any solution was found.
    TimeLimitNoSolution,
    /// The backend failed or the run was cancelled.
    SolverError,
}

impl SolveStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::FeasibleSuboptimal => "FEASIBLE_SUBOPTIMAL",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::TimeLimitNoSolution => "TIME_LIMIT_NO_SOLUTION",
            SolveStatus::SolverError => "SOLVER_ERROR",
        }
    }

    /// Returns true if the status carries a plan to decode.
    pub fn has_plan(self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::FeasibleSuboptimal)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one orchestrated solve.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveRun {
    pub status: SolveStatus,
    /// Variable values; present only when [`SolveStatus::has_plan`] holds.
    pub values: Option<Vec<f64>>,
    /// Objective value reported by the backend.
    pub reported_objective: Option<f64>,
    pub best_bound: Option<f64>,
    /// Raw backend status, when the backend returned at all.
    pub backend_status: Option<BackendStatus>,
    pub error: Option<BackendError>,
    pub message: Option<String>,
    pub backend: String,
    pub elapsed: Duration,
}

impl SolveRun {
    fn failed(backend: &str, message: impl Into<String>, error: Option<BackendError>) -> Self {
        Self {
            status: SolveStatus::SolverError,
            values: None,
            reported_objective: None,
            best_bound: None,
            backend_status: None,
            error,
            message: Some(message.into()),
            backend: backend.to_string(),
            elapsed: Duration::ZERO,
        }
    }
}

/// Runs one model through a backend under fixed limits.
///
/// # Example
///
/// ```
/// use fleetplan_model::{BackendOutcome, CancellationToken, Model, SolveLimits};
/// use fleetplan_solver::{SolveOrchestrator, SolveStatus};
/// use fleetplan_test::ScriptedBackend;
///
/// let mut model = Model::new("demo");
/// model.add_binary("x");
///
/// let backend = ScriptedBackend::new(BackendOutcome::optimal(vec![1.0], 0.0));
/// let run = SolveOrchestrator::new(&backend, SolveLimits::default())
///     .solve(&model, &CancellationToken::new());
///
/// assert_eq!(run.status, SolveStatus::Optimal);
/// assert_eq!(backend.sessions_closed(), 1);
/// ```
pub struct SolveOrchestrator<'a, B> {
    backend: &'a B,
    limits: SolveLimits,
    grace: Duration,
}

impl<'a, B: SolverBackend> SolveOrchestrator<'a, B> {
    pub fn new(backend: &'a B, limits: SolveLimits) -> Self {
        Self {
            backend,
            limits,
            grace: Duration::from_millis(100),
        }
    }

    /// Time granted past the limit before the backend is cancelled.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn limits(&self) -> &SolveLimits {
        &self.limits
    }

    /// Solves `model` once.
    ///
    /// Never panics on backend failure: every failure path yields a run
    /// with [`SolveStatus::SolverError`]. The backend session is dropped
    /// before this returns.
    pub fn solve(&self, model: &Model, cancel: &CancellationToken) -> SolveRun {
        let start = Instant::now();
        let backend = self.backend.name().to_string();

        info!(
            event = "solve_submitted",
            backend = %backend,
            variable_count = model.num_variables(),
            constraint_count = model.num_constraints(),
            time_limit_ms = self.limits.time_limit.map(|l| l.as_millis() as u64),
            optimality_gap = self.limits.optimality_gap,
        );

        let mut run = if cancel.is_cancelled() {
            SolveRun::failed(&backend, "cancelled before submission", None)
        } else {
            match self.backend.open_session(&self.limits) {
                Ok(session) => self.run_session(session, model, cancel, start, &backend),
                Err(e) => SolveRun::failed(&backend, e.to_string(), Some(e)),
            }
        };
        run.elapsed = start.elapsed();

        info!(
            event = "solve_finished",
            backend = %backend,
            status = run.status.as_str(),
            objective = run.reported_objective,
            duration_ms = run.elapsed.as_millis() as u64,
        );
        run
    }

    fn run_session(
        &self,
        mut session: B::Session,
        model: &Model,
        cancel: &CancellationToken,
        start: Instant,
        backend: &str,
    ) -> SolveRun {
        let inner = CancellationToken::new();
        let done = AtomicBool::new(false);
        let timed_out = AtomicBool::new(false);
        let deadline = self
            .limits
            .time_limit
            .and_then(|limit| limit.checked_add(self.grace))
            .and_then(|limit| start.checked_add(limit));

        let result = thread::scope(|scope| {
            scope.spawn(|| watch(cancel, &inner, &done, &timed_out, deadline));
            let result = session.solve(model, &self.limits, &inner);
            done.store(true, Ordering::SeqCst);
            result
        });
        drop(session);

        match result {
            Ok(outcome) => classify(
                outcome,
                model,
                backend,
                cancel.is_cancelled(),
                timed_out.load(Ordering::SeqCst),
            ),
            Err(e) => {
                warn!(event = "solver_failed", backend = %backend, error = %e);
                SolveRun::failed(backend, e.to_string(), Some(e))
            }
        }
    }
}

fn watch(
    external: &CancellationToken,
    inner: &CancellationToken,
    done: &AtomicBool,
    timed_out: &AtomicBool,
    deadline: Option<Instant>,
) {
    while !done.load(Ordering::SeqCst) {
        if external.is_cancelled() {
            inner.cancel();
            return;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            timed_out.store(true, Ordering::SeqCst);
            inner.cancel();
            return;
        }
        thread::sleep(WATCH_INTERVAL);
    }
}

fn classify(
    outcome: BackendOutcome,
    model: &Model,
    backend: &str,
    cancelled: bool,
    timed_out: bool,
) -> SolveRun {
    let BackendOutcome {
        status: raw,
        values,
        objective_value,
        best_bound,
        message,
    } = outcome;

    if let Some(values) = &values {
        if values.len() != model.num_variables() {
            let text = format!(
                "backend returned {} values for {} variables",
                values.len(),
                model.num_variables()
            );
            return SolveRun::failed(backend, text, None);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return SolveRun::failed(backend, "backend returned non-finite values", None);
        }
    }

    let status = match raw {
        BackendStatus::Optimal => SolveStatus::Optimal,
        BackendStatus::Feasible => SolveStatus::FeasibleSuboptimal,
        BackendStatus::Infeasible => SolveStatus::Infeasible,
        BackendStatus::TimeLimit => {
            if values.is_some() {
                SolveStatus::FeasibleSuboptimal
            } else {
                SolveStatus::TimeLimitNoSolution
            }
        }
        BackendStatus::Interrupted if timed_out && !cancelled => {
            if values.is_some() {
                SolveStatus::FeasibleSuboptimal
            } else {
                SolveStatus::TimeLimitNoSolution
            }
        }
        BackendStatus::Interrupted => {
            let text = if cancelled {
                "solve cancelled"
            } else {
                "backend interrupted without a cancellation request"
            };
            return SolveRun {
                backend_status: Some(raw),
                ..SolveRun::failed(backend, text, None)
            };
        }
    };

    if status.has_plan() && values.is_none() {
        return SolveRun {
            backend_status: Some(raw),
            ..SolveRun::failed(backend, "backend reported a solution without values", None)
        };
    }

    SolveRun {
        status,
        values: if status.has_plan() { values } else { None },
        reported_objective: if status.has_plan() { objective_value } else { None },
        best_bound,
        backend_status: Some(raw),
        error: None,
        message,
        backend: backend.to_string(),
        elapsed: Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(vars: usize) -> Model {
        let mut model = Model::new("t");
        for i in 0..vars {
            model.add_binary(format!("x{i}"));
        }
        model
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(SolveStatus::FeasibleSuboptimal.as_str(), "FEASIBLE_SUBOPTIMAL");
        assert_eq!(SolveStatus::TimeLimitNoSolution.to_string(), "TIME_LIMIT_NO_SOLUTION");
        assert!(SolveStatus::Optimal.has_plan());
        assert!(!SolveStatus::Infeasible.has_plan());
    }

    #[test]
    fn test_time_limit_with_incumbent() {
        let outcome = BackendOutcome::stopped(BackendStatus::TimeLimit, Some((vec![1.0], 3.0)));
        let run = classify(outcome, &model(1), "b", false, false);
        assert_eq!(run.status, SolveStatus::FeasibleSuboptimal);
        assert_eq!(run.reported_objective, Some(3.0));
    }

    #[test]
    fn test_time_limit_without_incumbent() {
        let outcome = BackendOutcome::stopped(BackendStatus::TimeLimit, None);
        let run = classify(outcome, &model(1), "b", false, false);
        assert_eq!(run.status, SolveStatus::TimeLimitNoSolution);
        assert!(run.values.is_none());
    }

    #[test]
    fn test_watchdog_interrupt_counts_as_time_limit() {
        let outcome = BackendOutcome::stopped(BackendStatus::Interrupted, None);
        let run = classify(outcome, &model(1), "b", false, true);
        assert_eq!(run.status, SolveStatus::TimeLimitNoSolution);
    }

    #[test]
    fn test_external_interrupt_is_error() {
        let outcome = BackendOutcome::stopped(BackendStatus::Interrupted, Some((vec![0.0], 0.0)));
        let run = classify(outcome, &model(1), "b", true, false);
        assert_eq!(run.status, SolveStatus::SolverError);
        assert!(run.values.is_none());
        assert_eq!(run.backend_status, Some(BackendStatus::Interrupted));
    }

    #[test]
    fn test_value_count_mismatch() {
        let outcome = BackendOutcome::optimal(vec![0.0, 1.0], 0.0);
        let run = classify(outcome, &model(1), "b", false, false);
        assert_eq!(run.status, SolveStatus::SolverError);
    }

    #[test]
    fn test_infeasible_drops_values() {
        let mut outcome = BackendOutcome::infeasible();
        outcome.values = Some(vec![1.0]);
        let run = classify(outcome, &model(1), "b", false, false);
        assert_eq!(run.status, SolveStatus::Infeasible);
        assert!(run.values.is_none());
    }

    #[test]
    fn test_status_serializes_screaming() {
        let text = serde_json::to_string(&SolveStatus::TimeLimitNoSolution).unwrap();
        assert_eq!(text, "\"TIME_LIMIT_NO_SOLUTION\"");
    }
}

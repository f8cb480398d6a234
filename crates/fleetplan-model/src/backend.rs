//! Abstract solver boundary.
//!
//! A concrete optimization engine plugs in by implementing [`SolverBackend`].
//! Engines that keep global state (environments, license handles) acquire it
//! in [`SolverBackend::open_session`] and release it when the returned
//! [`BackendSession`] is dropped, so nothing outlives a single solve.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fleetplan_config::SolverOptions;
use thiserror::Error;

use crate::lp::Model;

/// Limits passed to one solve call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveLimits {
    pub time_limit: Option<Duration>,
    /// Relative optimality gap at which the backend may stop.
    pub optimality_gap: f64,
    pub thread_count: Option<usize>,
}

impl SolveLimits {
    pub fn from_options(options: &SolverOptions) -> Self {
        Self {
            time_limit: options.time_limit(),
            optimality_gap: options.optimality_gap,
            thread_count: options.thread_count,
        }
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }
}

impl Default for SolveLimits {
    fn default() -> Self {
        Self::from_options(&SolverOptions::default())
    }
}

/// Raw status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendStatus {
    /// Proven optimal within the gap tolerance.
    Optimal,
    /// An incumbent exists but optimality was not proven.
    Feasible,
    /// No solution exists.
    Infeasible,
    /// The time or work limit was reached.
    TimeLimit,
    /// The cancellation token was observed.
    Interrupted,
}

/// What a backend returns from one solve.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendOutcome {
    pub status: BackendStatus,
    /// One value per model variable, when an incumbent exists.
    pub values: Option<Vec<f64>>,
    /// The backend's own objective value of `values`.
    pub objective_value: Option<f64>,
    pub best_bound: Option<f64>,
    pub message: Option<String>,
}

impl BackendOutcome {
    pub fn optimal(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: BackendStatus::Optimal,
            values: Some(values),
            objective_value: Some(objective_value),
            best_bound: Some(objective_value),
            message: None,
        }
    }

    pub fn feasible(values: Vec<f64>, objective_value: f64) -> Self {
        Self {
            status: BackendStatus::Feasible,
            values: Some(values),
            objective_value: Some(objective_value),
            best_bound: None,
            message: None,
        }
    }

    pub fn infeasible() -> Self {
        Self::without_solution(BackendStatus::Infeasible)
    }

    /// A stop before optimality, carrying the incumbent if one exists.
    pub fn stopped(status: BackendStatus, incumbent: Option<(Vec<f64>, f64)>) -> Self {
        match incumbent {
            Some((values, objective)) => Self {
                status,
                values: Some(values),
                objective_value: Some(objective),
                best_bound: None,
                message: None,
            },
            None => Self::without_solution(status),
        }
    }

    fn without_solution(status: BackendStatus) -> Self {
        Self {
            status,
            values: None,
            objective_value: None,
            best_bound: None,
            message: None,
        }
    }

    pub fn with_best_bound(mut self, bound: f64) -> Self {
        self.best_bound = Some(bound);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Backend failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The backend could not acquire its environment.
    #[error("failed to open solver session: {0}")]
    Session(String),

    /// The model uses a feature the backend cannot handle.
    #[error("unsupported model: {0}")]
    Unsupported(String),

    /// The backend failed while solving.
    #[error("solver failure: {0}")]
    Failure(String),
}

/// Cooperative cancellation flag shared between a caller and a solve.
///
/// # Example
///
/// ```
/// use fleetplan_model::CancellationToken;
///
/// let token = CancellationToken::new();
/// let handle = token.clone();
/// assert!(!token.is_cancelled());
///
/// handle.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A solver engine.
pub trait SolverBackend {
    type Session: BackendSession;

    fn name(&self) -> &str;

    /// Acquires the resources one solve needs.
    fn open_session(&self, limits: &SolveLimits) -> Result<Self::Session, BackendError>;
}

/// Resources held for one solve. Dropping the session releases them.
pub trait BackendSession {
    /// Solves `model` once.
    ///
    /// Implementations must return promptly with
    /// [`BackendStatus::Interrupted`] once `cancel` is set, and must not run
    /// past `limits.time_limit`.
    fn solve(
        &mut self,
        model: &Model,
        limits: &SolveLimits,
        cancel: &CancellationToken,
    ) -> Result<BackendOutcome, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_from_options() {
        let options = SolverOptions {
            time_limit_seconds: Some(2.5),
            optimality_gap: 0.01,
            thread_count: Some(4),
        };
        let limits = SolveLimits::from_options(&options);
        assert_eq!(limits.time_limit, Some(Duration::from_millis(2500)));
        assert_eq!(limits.optimality_gap, 0.01);
        assert_eq!(limits.thread_count, Some(4));
    }

    #[test]
    fn test_stopped_without_incumbent() {
        let outcome = BackendOutcome::stopped(BackendStatus::TimeLimit, None);
        assert_eq!(outcome.status, BackendStatus::TimeLimit);
        assert!(outcome.values.is_none());
    }

    #[test]
    fn test_token_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}

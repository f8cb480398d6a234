//! Backend returning canned outcomes.
//!
//! Records every session it opens and closes, so tests can check that the
//! orchestrator releases backend resources on every path.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use fleetplan_model::{
    BackendError, BackendOutcome, BackendSession, BackendStatus, CancellationToken, Model,
    SolveLimits, SolverBackend,
};

#[derive(Debug, Default)]
struct Ledger {
    opened: usize,
    closed: usize,
    limits: Vec<SolveLimits>,
}

/// A backend whose sessions return a fixed result.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    result: Result<BackendOutcome, BackendError>,
    open_error: Option<BackendError>,
    delay: Option<Duration>,
    ledger: Arc<Mutex<Ledger>>,
}

impl ScriptedBackend {
    pub fn new(outcome: BackendOutcome) -> Self {
        Self::with_result(Ok(outcome))
    }

    /// Every solve fails with `error`.
    pub fn failing(error: BackendError) -> Self {
        Self::with_result(Err(error))
    }

    fn with_result(result: Result<BackendOutcome, BackendError>) -> Self {
        Self {
            result,
            open_error: None,
            delay: None,
            ledger: Arc::new(Mutex::new(Ledger::default())),
        }
    }

    /// Opening a session fails with `error`.
    pub fn refusing_sessions(mut self, error: BackendError) -> Self {
        self.open_error = Some(error);
        self
    }

    /// Blocks each solve for `delay`, returning early as
    /// [`BackendStatus::Interrupted`] when cancelled.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn sessions_opened(&self) -> usize {
        self.ledger.lock().map(|l| l.opened).unwrap_or(0)
    }

    pub fn sessions_closed(&self) -> usize {
        self.ledger.lock().map(|l| l.closed).unwrap_or(0)
    }

    /// Limits received by each solve, in call order.
    pub fn seen_limits(&self) -> Vec<SolveLimits> {
        self.ledger
            .lock()
            .map(|l| l.limits.clone())
            .unwrap_or_default()
    }
}

impl SolverBackend for ScriptedBackend {
    type Session = ScriptedSession;

    fn name(&self) -> &str {
        "scripted"
    }

    fn open_session(&self, _limits: &SolveLimits) -> Result<Self::Session, BackendError> {
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.opened += 1;
        }
        Ok(ScriptedSession {
            result: self.result.clone(),
            delay: self.delay,
            ledger: Arc::clone(&self.ledger),
        })
    }
}

pub struct ScriptedSession {
    result: Result<BackendOutcome, BackendError>,
    delay: Option<Duration>,
    ledger: Arc<Mutex<Ledger>>,
}

impl BackendSession for ScriptedSession {
    fn solve(
        &mut self,
        _model: &Model,
        limits: &SolveLimits,
        cancel: &CancellationToken,
    ) -> Result<BackendOutcome, BackendError> {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.limits.push(*limits);
        }
        if let Some(delay) = self.delay {
            let until = Instant::now() + delay;
            while Instant::now() < until {
                if cancel.is_cancelled() {
                    return Ok(BackendOutcome::stopped(BackendStatus::Interrupted, None));
                }
                thread::sleep(Duration::from_millis(2));
            }
        }
        self.result.clone()
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        if let Ok(mut ledger) = self.ledger.lock() {
            ledger.closed += 1;
        }
    }
}

//! Schedule reports.

use std::fmt;

use fleetplan_model::PenaltyBreakdown;
use serde::Serialize;

use crate::orchestrator::SolveStatus;

/// The decoded outcome of one flight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightAssignment {
    pub flight_id: String,
    /// `None` for a cancelled flight.
    pub aircraft_id: Option<String>,
    pub crew_id: Option<String>,
    pub slot: Option<usize>,
    pub departure_minute: Option<i64>,
    pub delay_minutes: i64,
    pub sla_violation: bool,
    pub cancelled: bool,
    /// Delay, SLA and cancellation penalty charged to this flight.
    pub penalty: f64,
}

impl FlightAssignment {
    pub fn is_flown(&self) -> bool {
        !self.cancelled
    }
}

/// A flight that had no eligible combination at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnschedulableFlight {
    pub flight_id: String,
    /// The pruning rule that removed the last candidates.
    pub reason: Option<&'static str>,
}

/// Post-solve integrity findings. None of them discards the plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportWarning {
    /// A flight is not in exactly one of {assigned, cancelled}, or one of
    /// its binaries is fractional. The flight is left out of the plan.
    DecodingInconsistency { flight_id: String, detail: String },
    /// The realized penalty disagrees with the solver's objective.
    ReportingMismatch { reported: f64, realized: f64 },
    /// A model row is violated by the solver's values.
    ConstraintViolation {
        constraint: String,
        family: &'static str,
        violation: f64,
    },
}

impl fmt::Display for ReportWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportWarning::DecodingInconsistency { flight_id, detail } => {
                write!(f, "decoding inconsistency for flight '{flight_id}': {detail}")
            }
            ReportWarning::ReportingMismatch { reported, realized } => write!(
                f,
                "reporting mismatch: solver objective {reported}, realized penalty {realized}"
            ),
            ReportWarning::ConstraintViolation {
                constraint,
                family,
                violation,
            } => write!(f, "{family} row '{constraint}' violated by {violation}"),
        }
    }
}

/// Everything a planner run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub status: SolveStatus,
    /// One record per decodable flight, in catalog order. Empty when the
    /// status carries no plan.
    pub assignments: Vec<FlightAssignment>,
    /// Realized penalty of the decoded plan.
    pub penalties: PenaltyBreakdown,
    pub reported_objective: Option<f64>,
    pub warnings: Vec<ReportWarning>,
    pub unschedulable: Vec<UnschedulableFlight>,
    pub backend: String,
    pub solver_message: Option<String>,
    pub elapsed_ms: u64,
}

impl ScheduleReport {
    pub fn total_penalty(&self) -> f64 {
        self.penalties.total()
    }

    pub fn assignment(&self, flight_id: &str) -> Option<&FlightAssignment> {
        self.assignments.iter().find(|a| a.flight_id == flight_id)
    }

    pub fn cancelled(&self) -> impl Iterator<Item = &FlightAssignment> {
        self.assignments.iter().filter(|a| a.cancelled)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

//! fleetplan Solver - Solve orchestration and solution decoding
//!
//! This crate drives a built model through a solver backend and turns the
//! result into a schedule:
//! - `SolveOrchestrator`: limits, cancellation and status classification
//! - `SolutionInterpreter`: decoding, realized penalties, integrity warnings
//! - `ScheduleReport` and `PlanDiff` for consumers
//! - `Planner` and `Replanner`: the end-to-end pipeline

pub mod diff;
pub mod error;
pub mod interpreter;
pub mod orchestrator;
pub mod planner;
pub mod report;

pub use diff::{diff_reports, PlanChange, PlanDiff};
pub use error::PlanError;
pub use interpreter::SolutionInterpreter;
pub use orchestrator::{SolveOrchestrator, SolveRun, SolveStatus};
pub use planner::{Planner, Replan, Replanner};
pub use report::{FlightAssignment, ReportWarning, ScheduleReport, UnschedulableFlight};

//! fleetplan - Airline disruption re-planning
//!
//! Assigns aircraft and crew to flights across discrete time slots by
//! building a mixed-integer model, handing it to a pluggable solver backend
//! and decoding the result into a schedule report.
//!
//! # Example
//!
//! ```rust
//! use fleetplan::prelude::*;
//! use fleetplan_test::EnumerationBackend;
//!
//! let catalog = Catalog::new(
//!     Horizon::uniform(0, 60, 8).unwrap(),
//!     vec![Flight::new("F1", "SDF", "ORD", OriginalAssignment::new("A1", "C1", 1))
//!         .with_window(60, 240)],
//!     vec![Aircraft::new("A1", "B737", "STD", SlotRange::new(0, 8))],
//!     vec![Crew::new("C1", SlotRange::new(0, 8), 10.0).with_qualification("B737")],
//! )
//! .unwrap();
//!
//! let planner = Planner::new(EnumerationBackend::new(), PlannerConfig::default()).unwrap();
//! let report = planner.plan(&catalog).unwrap();
//!
//! assert_eq!(report.status, SolveStatus::Optimal);
//! assert_eq!(report.assignment("F1").unwrap().aircraft_id.as_deref(), Some("A1"));
//! ```

pub use fleetplan_config as config;
pub use fleetplan_core as catalog;
pub use fleetplan_model as model;
pub use fleetplan_solver as solver;

pub use fleetplan_config::{ConfigError, PenaltyWeights, PlannerConfig, SchedulingPolicy, SolverOptions};
pub use fleetplan_core::{
    Aircraft, Catalog, Crew, DataValidationError, Disruption, Flight, Horizon,
    OriginalAssignment, SlotRange, TimeSlot,
};
pub use fleetplan_model::{
    BackendError, BackendOutcome, BackendSession, BackendStatus, BuiltModel, CancellationToken,
    Model, ModelBuilder, PenaltyBreakdown, PenaltyCategory, SolveLimits, SolverBackend,
};
pub use fleetplan_solver::{
    diff_reports, FlightAssignment, PlanChange, PlanDiff, PlanError, Planner, Replan, Replanner,
    ReportWarning, ScheduleReport, SolveOrchestrator, SolveStatus,
};

#[cfg(feature = "console")]
pub mod console;

pub mod prelude {
    pub use super::{
        Aircraft, Catalog, Crew, Disruption, Flight, Horizon, OriginalAssignment, SlotRange,
    };
    pub use super::{CancellationToken, SolverBackend};
    pub use super::{PlanError, Planner, Replanner, ScheduleReport, SolveStatus};
    pub use super::PlannerConfig;
}

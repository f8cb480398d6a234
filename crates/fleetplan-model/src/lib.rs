//! fleetplan Model - Constraint model construction
//!
//! This crate turns a validated [`Catalog`](fleetplan_core::Catalog) into a
//! mixed-integer minimization model and defines the boundary a solver engine
//! implements:
//! - Linear primitives: variables, expressions, constraints, models
//! - Variable Factory with eligibility pruning
//! - Constraint Builder for uniqueness, linkage, overlap, rest and duty rules
//! - Objective Builder with configurable penalty weights
//! - CPLEX LP export
//! - The abstract `SolverBackend` / `BackendSession` interface

pub mod backend;
pub mod bigm;
pub mod builder;
pub mod constraints;
pub mod error;
pub mod lp;
mod lp_format;
pub mod objective;
pub mod variables;

pub use backend::{
    BackendError, BackendOutcome, BackendSession, BackendStatus, CancellationToken, SolveLimits,
    SolverBackend,
};
pub use bigm::BigM;
pub use builder::{BuildStats, BuiltModel, ModelBuilder};
pub use constraints::{ConstraintBuilder, ConstraintStats};
pub use error::{InfeasibleFlightError, ModelError};
pub use lp::{
    Constraint, ConstraintFamily, ConstraintId, LinearExpr, Model, Sense, VarId, VarKind, Variable,
};
pub use objective::{Objective, ObjectiveTerm, PenaltyBreakdown, PenaltyCategory};
pub use variables::{AssignmentVar, FlightVars, PruneCounts, PruneRule, VariableFactory, VariableSet};

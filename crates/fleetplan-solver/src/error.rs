//! Error types for planning runs

use fleetplan_config::ConfigError;
use fleetplan_core::DataValidationError;
use fleetplan_model::ModelError;
use thiserror::Error;

/// Failure before a model reaches the solver.
///
/// Solver outcomes such as infeasibility or a time limit without an
/// incumbent are not errors; they are reported through
/// [`SolveStatus`](crate::SolveStatus).
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("invalid input data: {0}")]
    DataValidation(#[from] DataValidationError),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("model construction failed: {0}")]
    Model(#[from] ModelError),
}

//! Error types for model construction

use fleetplan_config::ConfigError;
use thiserror::Error;

use crate::variables::{PruneCounts, PruneRule};

/// Model construction failed.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The configuration holds out-of-range values.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A constraint row received a NaN or infinite coefficient.
    #[error("constraint '{constraint}' has a non-finite coefficient")]
    NonFiniteCoefficient { constraint: String },

    /// An objective term received a NaN or infinite weight.
    #[error("objective term for '{variable}' has a non-finite weight")]
    NonFiniteObjective { variable: String },
}

/// A flight without any eligible (aircraft, crew, slot) combination.
///
/// Recorded on the built model and folded into the cancellation path; never
/// returned as `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("flight '{flight}' has no eligible (aircraft, crew, slot) combination")]
pub struct InfeasibleFlightError {
    pub flight: String,
    /// Excluded combinations per rule.
    pub pruned: PruneCounts,
}

impl InfeasibleFlightError {
    /// The rule that removed the last surviving candidates.
    ///
    /// Rules are checked in [`PruneRule::ALL`] order, so the last rule with a
    /// non-zero count is the one that rejected combinations every earlier
    /// rule had accepted. `None` when no combination existed at all (no
    /// aircraft or no crew).
    pub fn exhausted_by(&self) -> Option<PruneRule> {
        PruneRule::ALL
            .iter()
            .rev()
            .copied()
            .find(|&rule| self.pruned.get(rule) > 0)
    }
}

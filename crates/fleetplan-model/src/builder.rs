//! Model construction pipeline.

use std::collections::BTreeMap;
use std::time::Instant;

use fleetplan_config::PlannerConfig;
use fleetplan_core::Catalog;
use tracing::info;

use crate::constraints::ConstraintBuilder;
use crate::error::{InfeasibleFlightError, ModelError};
use crate::lp::{ConstraintFamily, Model};
use crate::objective::Objective;
use crate::variables::{PruneCounts, VariableFactory, VariableSet};

/// Size figures of a built model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildStats {
    pub variable_count: usize,
    pub assignment_variables: usize,
    pub constraint_count: usize,
    pub duplicates_skipped: usize,
    pub infeasible_flights: usize,
    pub pruned: PruneCounts,
    pub family_counts: BTreeMap<ConstraintFamily, usize>,
}

/// A model together with the metadata needed to decode its solutions.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltModel {
    pub model: Model,
    pub variables: VariableSet,
    pub objective: Objective,
    pub stats: BuildStats,
}

impl BuiltModel {
    /// Flights that were folded into the cancellation path at build time.
    pub fn infeasible_flights(&self) -> &[InfeasibleFlightError] {
        self.variables.infeasible()
    }
}

/// Runs Variable Factory, Constraint Builder and Objective Builder over one catalog.
///
/// The build is single-threaded and deterministic: the same catalog and
/// configuration always yield the same variables, rows and coefficients in
/// the same order.
///
/// # Example
///
/// ```
/// use fleetplan_config::PlannerConfig;
/// use fleetplan_core::{Aircraft, Catalog, Crew, Flight, Horizon, OriginalAssignment, SlotRange};
/// use fleetplan_model::ModelBuilder;
///
/// let catalog = Catalog::new(
///     Horizon::uniform(0, 60, 8).unwrap(),
///     vec![Flight::new("F1", "SDF", "ORD", OriginalAssignment::new("A1", "C1", 1))
///         .with_window(60, 240)],
///     vec![Aircraft::new("A1", "B737", "STD", SlotRange::new(0, 8))],
///     vec![Crew::new("C1", SlotRange::new(0, 8), 10.0).with_qualification("B737")],
/// )
/// .unwrap();
///
/// let built = ModelBuilder::new(&catalog, &PlannerConfig::default()).build().unwrap();
/// // Departure slots 1, 2, 3 and 4 fall inside the window.
/// assert_eq!(built.stats.assignment_variables, 4);
/// assert!(built.infeasible_flights().is_empty());
/// ```
pub struct ModelBuilder<'a> {
    catalog: &'a Catalog,
    config: &'a PlannerConfig,
    name: String,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a PlannerConfig) -> Self {
        Self {
            catalog,
            config,
            name: "fleetplan".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builds the model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] for out-of-range configuration values
    /// and [`ModelError::NonFiniteCoefficient`] or
    /// [`ModelError::NonFiniteObjective`] for numbers that overflow.
    pub fn build(&self) -> Result<BuiltModel, ModelError> {
        let start = Instant::now();
        self.config.validate()?;

        let mut model = Model::new(self.name.clone());
        let variables = VariableFactory::new(self.catalog).build(&mut model);
        let constraint_stats =
            ConstraintBuilder::new(self.catalog, &self.config.policy, &variables).build(&mut model)?;
        let objective = Objective::build(self.catalog, &self.config.weights, &variables)?;
        model.set_objective(objective.expr());

        let stats = BuildStats {
            variable_count: model.num_variables(),
            assignment_variables: variables.assignments().len(),
            constraint_count: model.num_constraints(),
            duplicates_skipped: constraint_stats.duplicates_skipped,
            infeasible_flights: variables.infeasible().len(),
            pruned: variables.pruned(),
            family_counts: model.family_counts(),
        };

        info!(
            event = "model_built",
            model = %model.name(),
            variable_count = stats.variable_count,
            constraint_count = stats.constraint_count,
            infeasible_flights = stats.infeasible_flights,
            duration_ms = start.elapsed().as_millis() as u64,
        );

        Ok(BuiltModel {
            model,
            variables,
            objective,
            stats,
        })
    }
}

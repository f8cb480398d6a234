//! End-to-end planning: build, solve, decode.

use fleetplan_config::PlannerConfig;
use fleetplan_core::{Catalog, Disruption};
use fleetplan_model::{CancellationToken, ModelBuilder, SolveLimits, SolverBackend};
use rayon::prelude::*;
use tracing::info;

use crate::diff::{diff_reports, PlanDiff};
use crate::error::PlanError;
use crate::interpreter::SolutionInterpreter;
use crate::orchestrator::SolveOrchestrator;
use crate::report::ScheduleReport;

/// Runs the full pipeline against one backend and configuration.
///
/// # Example
///
/// ```
/// use fleetplan_config::PlannerConfig;
/// use fleetplan_solver::{Planner, SolveStatus};
/// use fleetplan_test::fixtures::single_flight_catalog;
/// use fleetplan_test::EnumerationBackend;
///
/// let planner = Planner::new(EnumerationBackend::new(), PlannerConfig::default()).unwrap();
/// let report = planner.plan(&single_flight_catalog()).unwrap();
///
/// assert_eq!(report.status, SolveStatus::Optimal);
/// assert_eq!(report.assignment("F1").unwrap().slot, Some(1));
/// assert_eq!(report.total_penalty(), 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Planner<B> {
    backend: B,
    config: PlannerConfig,
}

impl<B: SolverBackend> Planner<B> {
    /// # Errors
    ///
    /// Returns [`PlanError::Config`] if `config` holds out-of-range values.
    pub fn new(backend: B, config: PlannerConfig) -> Result<Self, PlanError> {
        config.validate()?;
        Ok(Self { backend, config })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Plans one catalog.
    pub fn plan(&self, catalog: &Catalog) -> Result<ScheduleReport, PlanError> {
        self.plan_with_cancel(catalog, &CancellationToken::new())
    }

    /// Plans one catalog, aborting the solve once `cancel` is set.
    ///
    /// # Errors
    ///
    /// Only model construction can fail. Solver outcomes, including
    /// cancellation, are reported through the report's status.
    pub fn plan_with_cancel(
        &self,
        catalog: &Catalog,
        cancel: &CancellationToken,
    ) -> Result<ScheduleReport, PlanError> {
        let built = ModelBuilder::new(catalog, &self.config).build()?;
        let limits = SolveLimits::from_options(&self.config.solver);
        let run = SolveOrchestrator::new(&self.backend, limits).solve(&built.model, cancel);
        Ok(SolutionInterpreter::new(catalog, &built, &self.config).interpret(&run))
    }

    /// Plans independent scenarios in parallel.
    ///
    /// Each scenario builds its own model; results come back in input order.
    pub fn plan_scenarios(&self, catalogs: &[Catalog]) -> Vec<Result<ScheduleReport, PlanError>>
    where
        B: Sync,
    {
        info!(event = "scenarios_submitted", scenario_count = catalogs.len());
        catalogs.par_iter().map(|catalog| self.plan(catalog)).collect()
    }
}

/// A re-plan after disruptions.
#[derive(Debug, Clone, PartialEq)]
pub struct Replan {
    pub report: ScheduleReport,
    /// Changes against the previous plan, or against the original
    /// assignments when no previous plan exists.
    pub changes: PlanDiff,
}

/// Keeps the current catalog and plan, and re-optimizes as disruptions
/// arrive.
///
/// Every disruption batch derives a new catalog; earlier catalogs are never
/// modified.
pub struct Replanner<B> {
    planner: Planner<B>,
    catalog: Catalog,
    current: Option<ScheduleReport>,
}

impl<B: SolverBackend> Replanner<B> {
    pub fn new(planner: Planner<B>, catalog: Catalog) -> Self {
        Self {
            planner,
            catalog,
            current: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The latest plan, if any.
    pub fn current(&self) -> Option<&ScheduleReport> {
        self.current.as_ref()
    }

    /// Plans the current catalog and diffs it against the original
    /// assignments.
    pub fn plan(&mut self) -> Result<Replan, PlanError> {
        let report = self.planner.plan(&self.catalog)?;
        let changes = report.changes_from_original(&self.catalog);
        self.current = Some(report.clone());
        Ok(Replan { report, changes })
    }

    /// Applies `disruptions`, re-plans, and reports what moved.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::DataValidation`] if a disruption references an
    /// unknown entity or leaves the catalog inconsistent; the current
    /// catalog and plan are then kept.
    pub fn apply(&mut self, disruptions: &[Disruption]) -> Result<Replan, PlanError> {
        let catalog = self.catalog.with_disruptions(disruptions)?;
        let report = self.planner.plan(&catalog)?;

        let changes = match &self.current {
            Some(previous) if previous.status.has_plan() && report.status.has_plan() => {
                diff_reports(previous, &report)
            }
            _ => report.changes_from_original(&catalog),
        };

        info!(
            event = "replanned",
            disruptions = disruptions.len(),
            status = report.status.as_str(),
            changes = changes.len(),
        );

        self.catalog = catalog;
        self.current = Some(report.clone());
        Ok(Replan { report, changes })
    }
}

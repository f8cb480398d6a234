//! Solution Interpreter.
//!
//! Turns raw variable values back into flight assignments. Every flight must
//! decode to exactly one of {assigned, cancelled}; anything else is reported
//! as [`ReportWarning::DecodingInconsistency`] and the flight is left out of
//! the plan rather than resolved arbitrarily.
//!
//! Penalties are recomputed from the decoded plan and the catalog, not read
//! off the penalty variables, and cross-checked against the solver's
//! objective.

use fleetplan_config::PlannerConfig;
use fleetplan_core::Catalog;
use fleetplan_model::{AssignmentVar, BuiltModel, FlightVars, PenaltyBreakdown, VarId};
use tracing::{info, warn};

use crate::orchestrator::SolveRun;
use crate::report::{FlightAssignment, ReportWarning, ScheduleReport, UnschedulableFlight};

/// Decodes solve runs of one built model.
pub struct SolutionInterpreter<'a> {
    catalog: &'a Catalog,
    built: &'a BuiltModel,
    config: &'a PlannerConfig,
}

impl<'a> SolutionInterpreter<'a> {
    pub fn new(catalog: &'a Catalog, built: &'a BuiltModel, config: &'a PlannerConfig) -> Self {
        Self {
            catalog,
            built,
            config,
        }
    }

    /// Builds the report of `run`.
    ///
    /// Runs without a plan produce a report with the status, the solver
    /// message and the unschedulable flights only.
    pub fn interpret(&self, run: &SolveRun) -> ScheduleReport {
        let mut report = ScheduleReport {
            status: run.status,
            assignments: Vec::new(),
            penalties: PenaltyBreakdown::default(),
            reported_objective: run.reported_objective,
            warnings: Vec::new(),
            unschedulable: self.unschedulable(),
            backend: run.backend.clone(),
            solver_message: run.message.clone(),
            elapsed_ms: run.elapsed.as_millis() as u64,
        };

        let values = match &run.values {
            Some(values) if run.status.has_plan() => values.as_slice(),
            _ => return report,
        };

        self.decode(values, &mut report);
        self.check_rows(values, &mut report);
        self.check_objective(values, run.reported_objective, &mut report);

        info!(
            event = "plan_decoded",
            status = report.status.as_str(),
            flown = report.assignments.iter().filter(|a| a.is_flown()).count(),
            cancelled = report.cancelled().count(),
            warnings = report.warnings.len(),
            total_penalty = report.total_penalty(),
        );
        report
    }

    fn unschedulable(&self) -> Vec<UnschedulableFlight> {
        self.built
            .infeasible_flights()
            .iter()
            .map(|e| UnschedulableFlight {
                flight_id: e.flight.clone(),
                reason: e.exhausted_by().map(|rule| rule.as_str()),
            })
            .collect()
    }

    fn decode(&self, values: &[f64], report: &mut ScheduleReport) {
        let tol = self.config.policy.decode_tolerance;
        let weights = &self.config.weights;
        let vars = &self.built.variables;
        let value = |var: VarId| values.get(var.index()).copied().unwrap_or(0.0);

        let mut crew_hours = vec![0.0; self.catalog.crew().len()];
        let mut aircraft_hours = vec![0.0; self.catalog.aircraft().len()];

        for (fi, (flight, fv)) in self.catalog.flights().iter().zip(vars.flights()).enumerate() {
            let candidates = vars.assignments_of(fi);
            if let Some(detail) = fractional(candidates, fv, tol, &value) {
                inconsistent(report, &flight.id, detail);
                continue;
            }

            let active: Vec<&AssignmentVar> = candidates
                .iter()
                .filter(|a| value(a.var) > 1.0 - tol)
                .collect();
            let cancelled = value(fv.cancelled) > 1.0 - tol;

            let record = match (active.as_slice(), cancelled) {
                ([a], false) => {
                    let departure = a.departure_minute;
                    let delay = (departure - fv.scheduled_minute).max(0);
                    let late = flight.sla_deadline.is_some_and(|d| departure > d);
                    let delay_penalty = weights.delay_weight * flight.priority * delay as f64;
                    let sla_penalty = if late {
                        weights.sla_weight * flight.priority
                    } else {
                        0.0
                    };
                    report.penalties.delay += delay_penalty;
                    report.penalties.sla += sla_penalty;
                    crew_hours[a.crew] += flight.duration_hours();
                    aircraft_hours[a.aircraft] += flight.duration_hours();

                    FlightAssignment {
                        flight_id: flight.id.clone(),
                        aircraft_id: Some(self.catalog.aircraft()[a.aircraft].id.clone()),
                        crew_id: Some(self.catalog.crew()[a.crew].id.clone()),
                        slot: Some(a.slot),
                        departure_minute: Some(departure),
                        delay_minutes: delay,
                        sla_violation: late,
                        cancelled: false,
                        penalty: delay_penalty + sla_penalty,
                    }
                }
                ([], true) => {
                    let penalty = weights.cancellation_weight * flight.priority;
                    report.penalties.cancellation += penalty;
                    FlightAssignment {
                        flight_id: flight.id.clone(),
                        aircraft_id: None,
                        crew_id: None,
                        slot: None,
                        departure_minute: None,
                        delay_minutes: 0,
                        sla_violation: false,
                        cancelled: true,
                        penalty,
                    }
                }
                (active, cancelled) => {
                    let detail = format!(
                        "{} assignments active, cancellation {}",
                        active.len(),
                        if cancelled { "set" } else { "unset" }
                    );
                    inconsistent(report, &flight.id, detail);
                    continue;
                }
            };
            report.assignments.push(record);
        }

        for (crew, hours) in self.catalog.crew().iter().zip(&crew_hours) {
            let over = (crew.duty_hours_used + hours - crew.overtime_threshold()).max(0.0);
            report.penalties.overtime += weights.overtime_weight * over;
        }
        for (aircraft, hours) in self.catalog.aircraft().iter().zip(&aircraft_hours) {
            if let Some(remaining) = aircraft.hours_until_maintenance {
                let over = (hours - remaining).max(0.0);
                report.penalties.maintenance += weights.maintenance_weight * over;
            }
        }
    }

    fn check_rows(&self, values: &[f64], report: &mut ScheduleReport) {
        let model = &self.built.model;
        let tol = self.config.policy.decode_tolerance;
        for id in model.violated_constraints(values, tol) {
            if let Some(row) = model.constraint(id) {
                let violation = row.violation(values);
                warn!(
                    event = "constraint_violated",
                    constraint = %row.name,
                    family = row.family.as_str(),
                    violation,
                );
                report.warnings.push(ReportWarning::ConstraintViolation {
                    constraint: row.name.clone(),
                    family: row.family.as_str(),
                    violation,
                });
            }
        }
    }

    fn check_objective(&self, values: &[f64], reported: Option<f64>, report: &mut ScheduleReport) {
        let reference = reported.unwrap_or_else(|| self.built.model.objective_value(values));
        let realized = report.penalties.total();
        let tolerance = self.config.policy.reporting_tolerance * reference.abs().max(1.0);
        if (realized - reference).abs() > tolerance {
            warn!(
                event = "reporting_mismatch",
                reported = reference,
                realized,
            );
            report.warnings.push(ReportWarning::ReportingMismatch {
                reported: reference,
                realized,
            });
        }
    }
}

fn fractional(
    candidates: &[AssignmentVar],
    fv: &FlightVars,
    tol: f64,
    value: &impl Fn(VarId) -> f64,
) -> Option<String> {
    let count = candidates
        .iter()
        .map(|a| a.var)
        .chain([fv.cancelled, fv.sla])
        .filter(|&var| {
            let v = value(var);
            v > tol && v < 1.0 - tol
        })
        .count();
    (count > 0).then(|| format!("{count} fractional binaries"))
}

fn inconsistent(report: &mut ScheduleReport, flight_id: &str, detail: String) {
    warn!(event = "decoding_inconsistency", flight = flight_id, detail = %detail);
    report.warnings.push(ReportWarning::DecodingInconsistency {
        flight_id: flight_id.to_string(),
        detail,
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use fleetplan_model::ModelBuilder;
    use fleetplan_test::complete_values;
    use fleetplan_test::fixtures::single_flight_catalog;

    use super::*;
    use crate::orchestrator::SolveStatus;

    fn run(status: SolveStatus, values: Vec<f64>, reported: Option<f64>) -> SolveRun {
        SolveRun {
            status,
            values: Some(values),
            reported_objective: reported,
            best_bound: None,
            backend_status: None,
            error: None,
            message: None,
            backend: "test".to_string(),
            elapsed: Duration::from_millis(5),
        }
    }

    fn setup() -> (Catalog, PlannerConfig) {
        (single_flight_catalog(), PlannerConfig::default())
    }

    #[test]
    fn test_decodes_single_assignment() {
        let (catalog, config) = setup();
        let built = ModelBuilder::new(&catalog, &config).build().unwrap();
        let x = built.model.find_variable("x(F1,A1,C1,2)").unwrap();
        let values = complete_values(&built.model, &[(x, 1.0)]);
        let objective = built.model.objective_value(&values);

        let report = SolutionInterpreter::new(&catalog, &built, &config)
            .interpret(&run(SolveStatus::Optimal, values, Some(objective)));

        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
        let a = report.assignment("F1").unwrap();
        assert_eq!(a.aircraft_id.as_deref(), Some("A1"));
        assert_eq!(a.crew_id.as_deref(), Some("C1"));
        assert_eq!(a.slot, Some(2));
        assert_eq!(a.delay_minutes, 60);
        assert_eq!(report.penalties.delay, 60.0);
        assert_eq!(report.total_penalty(), objective);
        assert_eq!(report.elapsed_ms, 5);
    }

    #[test]
    fn test_two_active_assignments_reported() {
        let (catalog, config) = setup();
        let built = ModelBuilder::new(&catalog, &config).build().unwrap();
        let mut values = vec![0.0; built.model.num_variables()];
        for name in ["x(F1,A1,C1,1)", "x(F1,A1,C1,2)"] {
            values[built.model.find_variable(name).unwrap().index()] = 1.0;
        }

        let report = SolutionInterpreter::new(&catalog, &built, &config)
            .interpret(&run(SolveStatus::FeasibleSuboptimal, values, None));

        assert!(report.assignments.is_empty());
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            ReportWarning::DecodingInconsistency { flight_id, .. } if flight_id == "F1"
        )));
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            ReportWarning::ConstraintViolation { family: "uniqueness", .. }
        )));
    }

    #[test]
    fn test_fractional_binary_reported() {
        let (catalog, config) = setup();
        let built = ModelBuilder::new(&catalog, &config).build().unwrap();
        let mut values = vec![0.0; built.model.num_variables()];
        values[built.model.find_variable("x(F1,A1,C1,1)").unwrap().index()] = 0.5;
        values[built.variables.flights()[0].cancelled.index()] = 0.5;

        let report = SolutionInterpreter::new(&catalog, &built, &config)
            .interpret(&run(SolveStatus::FeasibleSuboptimal, values, None));

        match &report.warnings[0] {
            ReportWarning::DecodingInconsistency { detail, .. } => {
                assert_eq!(detail, "2 fractional binaries");
            }
            other => panic!("unexpected warning {other:?}"),
        }
    }

    #[test]
    fn test_reporting_mismatch() {
        let (catalog, config) = setup();
        let built = ModelBuilder::new(&catalog, &config).build().unwrap();
        let x = built.model.find_variable("x(F1,A1,C1,1)").unwrap();
        let values = complete_values(&built.model, &[(x, 1.0)]);

        let report = SolutionInterpreter::new(&catalog, &built, &config)
            .interpret(&run(SolveStatus::Optimal, values, Some(42.0)));

        assert_eq!(
            report.warnings,
            vec![ReportWarning::ReportingMismatch {
                reported: 42.0,
                realized: 0.0
            }]
        );
        assert_eq!(report.assignments.len(), 1);
    }

    #[test]
    fn test_no_plan_without_solution_status() {
        let (catalog, config) = setup();
        let built = ModelBuilder::new(&catalog, &config).build().unwrap();
        let mut infeasible = run(SolveStatus::Infeasible, Vec::new(), None);
        infeasible.values = None;

        let report = SolutionInterpreter::new(&catalog, &built, &config).interpret(&infeasible);
        assert_eq!(report.status, SolveStatus::Infeasible);
        assert!(report.assignments.is_empty());
        assert_eq!(report.total_penalty(), 0.0);
    }
}

//! End-to-end planning scenarios on small hourly catalogs.

use std::collections::HashMap;
use std::thread;
use std::time::Duration;

use fleetplan_config::PlannerConfig;
use fleetplan_core::{Catalog, Disruption, SlotRange};
use fleetplan_model::{
    BackendError, BackendOutcome, CancellationToken, Model, ModelBuilder, SolveLimits,
};
use fleetplan_solver::{
    PlanChange, PlanError, Planner, Replanner, ReportWarning, ScheduleReport, SolveOrchestrator,
    SolveStatus,
};
use fleetplan_test::fixtures::{aircraft, crew, flight, single_flight_catalog, ScenarioBuilder};
use fleetplan_test::{EnumerationBackend, ScriptedBackend};

fn planner() -> Planner<EnumerationBackend> {
    Planner::new(EnumerationBackend::new(), PlannerConfig::default()).unwrap()
}

fn plan(catalog: &Catalog) -> ScheduleReport {
    planner().plan(catalog).unwrap()
}

fn model_with(vars: usize) -> Model {
    let mut model = Model::new("scripted");
    for i in 0..vars {
        model.add_binary(format!("x{i}"));
    }
    model
}

#[test]
fn test_single_flight_assigned_without_delay() {
    let report = plan(&single_flight_catalog());

    assert_eq!(report.status, SolveStatus::Optimal);
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    let a = report.assignment("F1").unwrap();
    assert_eq!(a.aircraft_id.as_deref(), Some("A1"));
    assert_eq!(a.crew_id.as_deref(), Some("C1"));
    assert_eq!(a.slot, Some(1));
    assert_eq!(a.delay_minutes, 0);
    assert!(!a.cancelled);
    assert_eq!(report.penalties.delay, 0.0);
    assert_eq!(report.total_penalty(), 0.0);
    assert_eq!(report.reported_objective, Some(0.0));
}

#[test]
fn test_maintenance_forces_cancellation() {
    let catalog = ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 60))
        .aircraft(aircraft("A1").with_maintenance_window(SlotRange::new(1, 2)))
        .crew(crew("C1"))
        .build();
    let report = plan(&catalog);

    assert_eq!(report.status, SolveStatus::Optimal);
    let a = report.assignment("F1").unwrap();
    assert!(a.cancelled);
    assert_eq!(a.aircraft_id, None);
    assert_eq!(a.penalty, 5000.0);
    assert_eq!(report.penalties.cancellation, 5000.0);
    assert_eq!(report.unschedulable.len(), 1);
    assert_eq!(report.unschedulable[0].flight_id, "F1");
    assert_eq!(report.unschedulable[0].reason, Some("maintenance"));
    assert!(report.warnings.is_empty());
}

#[test]
fn test_duty_limit_routes_to_other_crew() {
    let catalog = ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 60))
        .aircraft(aircraft("A1"))
        .crew(crew("C1").with_duty_hours_used(9.5))
        .crew(crew("C2"))
        .build();
    let report = plan(&catalog);

    assert_eq!(report.status, SolveStatus::Optimal);
    let a = report.assignment("F1").unwrap();
    assert_eq!(a.crew_id.as_deref(), Some("C2"));
    assert_eq!(report.total_penalty(), 0.0);
}

#[test]
fn test_duty_limit_without_alternative_cancels() {
    let catalog = ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 60))
        .aircraft(aircraft("A1"))
        .crew(crew("C1").with_duty_hours_used(9.5))
        .build();
    let report = plan(&catalog);

    assert_eq!(report.status, SolveStatus::Optimal);
    assert!(report.assignment("F1").unwrap().cancelled);
    assert_eq!(report.total_penalty(), 5000.0);
}

#[test]
fn test_competing_flights_keep_higher_priority() {
    let catalog = ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 60))
        .flight(flight("F2", 1).with_window(60, 60).with_priority(2.0))
        .aircraft(aircraft("A1"))
        .crew(crew("C1"))
        .crew(crew("C2"))
        .build();
    let report = plan(&catalog);

    assert_eq!(report.status, SolveStatus::Optimal);
    assert!(report.assignment("F1").unwrap().cancelled);
    let f2 = report.assignment("F2").unwrap();
    assert_eq!(f2.aircraft_id.as_deref(), Some("A1"));
    assert_eq!(report.total_penalty(), 5000.0);
}

#[test]
fn test_aircraft_never_double_booked() {
    let catalog = ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 180))
        .flight(flight("F2", 1).with_window(60, 180))
        .flight(flight("F3", 2).with_window(60, 180))
        .aircraft(aircraft("A1"))
        .crew(crew("C1"))
        .crew(crew("C2"))
        .build();
    let report = plan(&catalog);
    assert!(report.status.has_plan());

    // One-hour flights plus a one-slot turnaround block two slots each.
    let mut slots: Vec<usize> = report
        .assignments
        .iter()
        .filter(|a| a.aircraft_id.as_deref() == Some("A1"))
        .filter_map(|a| a.slot)
        .collect();
    slots.sort_unstable();
    for pair in slots.windows(2) {
        assert!(pair[1] >= pair[0] + 2, "overlapping slots {slots:?}");
    }
}

#[test]
fn test_crew_duty_hours_respected() {
    let catalog = ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 60))
        .flight(flight("F2", 3).with_window(180, 180))
        .flight(flight("F3", 5).with_window(300, 300))
        .aircraft(aircraft("A1"))
        .crew(crew("C1").with_duty_hours_used(8.0))
        .build();
    let report = plan(&catalog);
    assert!(report.status.has_plan());

    let mut hours: HashMap<&str, f64> = HashMap::new();
    for a in report.assignments.iter().filter(|a| a.is_flown()) {
        *hours.entry(a.crew_id.as_deref().unwrap()).or_default() += 1.0;
    }
    assert_eq!(hours.get("C1").copied(), Some(2.0));
    assert_eq!(report.cancelled().count(), 1);
}

#[test]
fn test_report_serializes() {
    let report = plan(&single_flight_catalog());
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["status"], "OPTIMAL");
    assert_eq!(json["assignments"][0]["flight_id"], "F1");
    assert_eq!(json["assignments"][0]["slot"], 1);
    assert_eq!(json["penalties"]["cancellation"], 0.0);
    assert_eq!(json["backend"], "enumeration");
}

#[test]
fn test_node_limit_without_incumbent() {
    let planner = Planner::new(
        EnumerationBackend::new().with_node_limit(1),
        PlannerConfig::default(),
    )
    .unwrap();
    let report = planner.plan(&single_flight_catalog()).unwrap();

    assert_eq!(report.status, SolveStatus::TimeLimitNoSolution);
    assert!(report.assignments.is_empty());
    assert!(report.solver_message.unwrap().starts_with("node limit reached"));
}

#[test]
fn test_infeasible_model_reported() {
    let backend = ScriptedBackend::new(BackendOutcome::infeasible());
    let planner = Planner::new(backend.clone(), PlannerConfig::default()).unwrap();
    let report = planner.plan(&single_flight_catalog()).unwrap();

    assert_eq!(report.status, SolveStatus::Infeasible);
    assert!(report.assignments.is_empty());
    assert_eq!(backend.sessions_opened(), 1);
    assert_eq!(backend.sessions_closed(), 1);
}

#[test]
fn test_solver_options_reach_backend() {
    let mut config = PlannerConfig::default()
        .with_time_limit_seconds(2.5)
        .with_optimality_gap(0.01);
    config.solver.thread_count = Some(3);
    let backend = ScriptedBackend::new(BackendOutcome::infeasible());
    Planner::new(backend.clone(), config)
        .unwrap()
        .plan(&single_flight_catalog())
        .unwrap();

    let seen = backend.seen_limits();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].time_limit, Some(Duration::from_millis(2500)));
    assert_eq!(seen[0].optimality_gap, 0.01);
    assert_eq!(seen[0].thread_count, Some(3));
}

#[test]
fn test_wrong_value_count_is_solver_error() {
    let backend = ScriptedBackend::new(BackendOutcome::optimal(vec![1.0], 0.0));
    let planner = Planner::new(backend, PlannerConfig::default()).unwrap();
    let report = planner.plan(&single_flight_catalog()).unwrap();

    assert_eq!(report.status, SolveStatus::SolverError);
    assert!(report.assignments.is_empty());
}

#[test]
fn test_backend_failure_releases_session() {
    let backend = ScriptedBackend::failing(BackendError::Failure("license lost".to_string()));
    let run = SolveOrchestrator::new(&backend, SolveLimits::default())
        .solve(&model_with(1), &CancellationToken::new());

    assert_eq!(run.status, SolveStatus::SolverError);
    assert_eq!(
        run.error,
        Some(BackendError::Failure("license lost".to_string()))
    );
    assert_eq!(backend.sessions_opened(), 1);
    assert_eq!(backend.sessions_closed(), 1);
}

#[test]
fn test_session_refused() {
    let backend = ScriptedBackend::new(BackendOutcome::infeasible())
        .refusing_sessions(BackendError::Session("no license".to_string()));
    let run = SolveOrchestrator::new(&backend, SolveLimits::default())
        .solve(&model_with(1), &CancellationToken::new());

    assert_eq!(run.status, SolveStatus::SolverError);
    assert!(matches!(run.error, Some(BackendError::Session(_))));
    assert_eq!(backend.sessions_opened(), 0);
}

#[test]
fn test_cancelled_before_submission() {
    let backend = ScriptedBackend::new(BackendOutcome::infeasible());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let run = SolveOrchestrator::new(&backend, SolveLimits::default()).solve(&model_with(1), &cancel);

    assert_eq!(run.status, SolveStatus::SolverError);
    assert_eq!(backend.sessions_opened(), 0);
}

#[test]
fn test_cancellation_propagates_into_backend() {
    let backend = ScriptedBackend::new(BackendOutcome::infeasible()).with_delay(Duration::from_secs(10));
    let limits = SolveLimits {
        time_limit: None,
        ..SolveLimits::default()
    };
    let cancel = CancellationToken::new();
    let handle = cancel.clone();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        handle.cancel();
    });

    let run = SolveOrchestrator::new(&backend, limits).solve(&model_with(1), &cancel);
    canceller.join().unwrap();

    assert_eq!(run.status, SolveStatus::SolverError);
    assert_eq!(run.message.as_deref(), Some("solve cancelled"));
    assert!(run.elapsed < Duration::from_secs(5));
    assert_eq!(backend.sessions_closed(), 1);
}

#[test]
fn test_watchdog_stops_overrunning_backend() {
    let backend = ScriptedBackend::new(BackendOutcome::infeasible()).with_delay(Duration::from_secs(10));
    let limits = SolveLimits::default().with_time_limit(Duration::from_millis(50));

    let run = SolveOrchestrator::new(&backend, limits)
        .with_grace(Duration::from_millis(20))
        .solve(&model_with(1), &CancellationToken::new());

    assert_eq!(run.status, SolveStatus::TimeLimitNoSolution);
    assert!(run.elapsed < Duration::from_secs(5));
    assert_eq!(backend.sessions_closed(), 1);
}

#[test]
fn test_build_is_identical_across_runs() {
    let catalog = single_flight_catalog();
    let config = PlannerConfig::default();
    let first = ModelBuilder::new(&catalog, &config).build().unwrap();
    let second = ModelBuilder::new(&catalog, &config).build().unwrap();
    assert_eq!(first.model.write_lp(), second.model.write_lp());
}

#[test]
fn test_plan_scenarios_in_order() {
    let forced = ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 60))
        .aircraft(aircraft("A1").with_maintenance_window(SlotRange::new(1, 2)))
        .crew(crew("C1"))
        .build();
    let reports = planner().plan_scenarios(&[single_flight_catalog(), forced]);

    assert_eq!(reports.len(), 2);
    let first = reports[0].as_ref().unwrap();
    let second = reports[1].as_ref().unwrap();
    assert_eq!(first.total_penalty(), 0.0);
    assert_eq!(second.total_penalty(), 5000.0);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = PlannerConfig::default();
    config.weights.delay_weight = -1.0;
    let result = Planner::new(EnumerationBackend::new(), config);
    assert!(matches!(result, Err(PlanError::Config(_))));
}

fn replanner() -> Replanner<EnumerationBackend> {
    let catalog = ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 120))
        .aircraft(aircraft("A1"))
        .crew(crew("C1"))
        .build();
    Replanner::new(planner(), catalog)
}

#[test]
fn test_replan_reports_retiming_then_cancellation() {
    let mut replanner = replanner();

    let initial = replanner.plan().unwrap();
    assert!(initial.changes.is_empty());
    assert_eq!(initial.report.assignment("F1").unwrap().slot, Some(1));

    let retimed = replanner
        .apply(&[Disruption::AircraftMaintenance {
            aircraft: "A1".to_string(),
            window: SlotRange::new(1, 2),
        }])
        .unwrap();
    assert_eq!(
        retimed.changes.changes(),
        &[PlanChange::Retimed {
            flight_id: "F1".to_string(),
            from_minute: 60,
            to_minute: 120,
        }]
    );
    assert_eq!(retimed.report.penalties.delay, 60.0);

    let grounded = replanner
        .apply(&[Disruption::AircraftGrounded {
            aircraft: "A1".to_string(),
        }])
        .unwrap();
    assert_eq!(
        grounded.changes.changes(),
        &[PlanChange::Cancelled {
            flight_id: "F1".to_string()
        }]
    );
    assert_eq!(
        replanner.catalog().aircraft()[0].maintenance_windows,
        vec![SlotRange::new(0, 8)]
    );
}

#[test]
fn test_replan_rejects_unknown_entity() {
    let mut replanner = replanner();
    replanner.plan().unwrap();

    let result = replanner.apply(&[Disruption::CrewUnavailable {
        crew: "C9".to_string(),
    }]);
    assert!(matches!(result, Err(PlanError::DataValidation(_))));
    assert_eq!(replanner.current().unwrap().assignment("F1").unwrap().slot, Some(1));
}

#[test]
fn test_reporting_mismatch_surfaces_as_warning() {
    let catalog = single_flight_catalog();
    let config = PlannerConfig::default();
    let built = ModelBuilder::new(&catalog, &config).build().unwrap();
    let x = built.model.find_variable("x(F1,A1,C1,1)").unwrap();
    let values = fleetplan_test::complete_values(&built.model, &[(x, 1.0)]);

    let backend = ScriptedBackend::new(BackendOutcome::feasible(values, 17.0));
    let report = Planner::new(backend, config).unwrap().plan(&catalog).unwrap();

    assert_eq!(report.status, SolveStatus::FeasibleSuboptimal);
    assert_eq!(report.assignments.len(), 1);
    assert!(matches!(
        report.warnings.as_slice(),
        [ReportWarning::ReportingMismatch { .. }]
    ));
}

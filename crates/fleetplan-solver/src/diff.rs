//! Plan changes between two schedules.

use std::collections::HashMap;
use std::fmt;

use fleetplan_core::Catalog;
use serde::Serialize;

use crate::report::{FlightAssignment, ScheduleReport};

/// One difference for one flight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanChange {
    AircraftSwap {
        flight_id: String,
        from: String,
        to: String,
    },
    CrewSwap {
        flight_id: String,
        from: String,
        to: String,
    },
    Retimed {
        flight_id: String,
        from_minute: i64,
        to_minute: i64,
    },
    Cancelled {
        flight_id: String,
    },
    /// A previously cancelled flight flies again.
    Reinstated {
        flight_id: String,
    },
}

impl PlanChange {
    pub fn flight_id(&self) -> &str {
        match self {
            PlanChange::AircraftSwap { flight_id, .. }
            | PlanChange::CrewSwap { flight_id, .. }
            | PlanChange::Retimed { flight_id, .. }
            | PlanChange::Cancelled { flight_id }
            | PlanChange::Reinstated { flight_id } => flight_id,
        }
    }
}

impl fmt::Display for PlanChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanChange::AircraftSwap { flight_id, from, to } => {
                write!(f, "{flight_id}: aircraft {from} -> {to}")
            }
            PlanChange::CrewSwap { flight_id, from, to } => {
                write!(f, "{flight_id}: crew {from} -> {to}")
            }
            PlanChange::Retimed {
                flight_id,
                from_minute,
                to_minute,
            } => write!(f, "{flight_id}: departure {from_minute} -> {to_minute}"),
            PlanChange::Cancelled { flight_id } => write!(f, "{flight_id}: cancelled"),
            PlanChange::Reinstated { flight_id } => write!(f, "{flight_id}: reinstated"),
        }
    }
}

/// All changes between two plans, in flight order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanDiff {
    changes: Vec<PlanChange>,
}

impl PlanDiff {
    pub fn changes(&self) -> &[PlanChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlanChange> {
        self.changes.iter()
    }

    pub fn changes_for<'a>(&'a self, flight_id: &'a str) -> impl Iterator<Item = &'a PlanChange> {
        self.changes.iter().filter(move |c| c.flight_id() == flight_id)
    }
}

/// Where a flight stood in one plan.
struct Placement<'a> {
    aircraft: Option<&'a str>,
    crew: Option<&'a str>,
    departure: Option<i64>,
}

impl<'a> Placement<'a> {
    fn of(assignment: &'a FlightAssignment) -> Self {
        Self {
            aircraft: assignment.aircraft_id.as_deref(),
            crew: assignment.crew_id.as_deref(),
            departure: assignment.departure_minute,
        }
    }

    fn cancelled(&self) -> bool {
        self.departure.is_none()
    }
}

fn compare(flight_id: &str, before: &Placement<'_>, after: &Placement<'_>, out: &mut Vec<PlanChange>) {
    match (before.cancelled(), after.cancelled()) {
        (true, true) => {}
        (false, true) => out.push(PlanChange::Cancelled {
            flight_id: flight_id.to_string(),
        }),
        (true, false) => out.push(PlanChange::Reinstated {
            flight_id: flight_id.to_string(),
        }),
        (false, false) => {
            if let (Some(from), Some(to)) = (before.aircraft, after.aircraft) {
                if from != to {
                    out.push(PlanChange::AircraftSwap {
                        flight_id: flight_id.to_string(),
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
            }
            if let (Some(from), Some(to)) = (before.crew, after.crew) {
                if from != to {
                    out.push(PlanChange::CrewSwap {
                        flight_id: flight_id.to_string(),
                        from: from.to_string(),
                        to: to.to_string(),
                    });
                }
            }
            if let (Some(from), Some(to)) = (before.departure, after.departure) {
                if from != to {
                    out.push(PlanChange::Retimed {
                        flight_id: flight_id.to_string(),
                        from_minute: from,
                        to_minute: to,
                    });
                }
            }
        }
    }
}

/// Changes from `before` to `after`.
///
/// Flights missing from either plan (undecodable or unknown) are skipped.
pub fn diff_reports(before: &ScheduleReport, after: &ScheduleReport) -> PlanDiff {
    let previous: HashMap<&str, &FlightAssignment> = before
        .assignments
        .iter()
        .map(|a| (a.flight_id.as_str(), a))
        .collect();

    let mut changes = Vec::new();
    for current in &after.assignments {
        if let Some(prev) = previous.get(current.flight_id.as_str()) {
            compare(
                &current.flight_id,
                &Placement::of(prev),
                &Placement::of(current),
                &mut changes,
            );
        }
    }
    PlanDiff { changes }
}

impl ScheduleReport {
    /// Changes against the pre-disruption assignment recorded in `catalog`.
    pub fn changes_from_original(&self, catalog: &Catalog) -> PlanDiff {
        let mut changes = Vec::new();
        for current in &self.assignments {
            let Some(index) = catalog.flight_index(&current.flight_id) else {
                continue;
            };
            let flight = &catalog.flights()[index];
            let original = Placement {
                aircraft: Some(flight.original.aircraft_id.as_str()),
                crew: Some(flight.original.crew_id.as_str()),
                departure: catalog.scheduled_departure(index),
            };
            compare(
                &current.flight_id,
                &original,
                &Placement::of(current),
                &mut changes,
            );
        }
        PlanDiff { changes }
    }
}

#[cfg(test)]
mod tests {
    use fleetplan_model::PenaltyBreakdown;

    use super::*;
    use crate::orchestrator::SolveStatus;

    fn flown(id: &str, aircraft: &str, crew: &str, departure: i64) -> FlightAssignment {
        FlightAssignment {
            flight_id: id.to_string(),
            aircraft_id: Some(aircraft.to_string()),
            crew_id: Some(crew.to_string()),
            slot: Some((departure / 60) as usize),
            departure_minute: Some(departure),
            delay_minutes: 0,
            sla_violation: false,
            cancelled: false,
            penalty: 0.0,
        }
    }

    fn cancelled(id: &str) -> FlightAssignment {
        FlightAssignment {
            flight_id: id.to_string(),
            aircraft_id: None,
            crew_id: None,
            slot: None,
            departure_minute: None,
            delay_minutes: 0,
            sla_violation: false,
            cancelled: true,
            penalty: 5000.0,
        }
    }

    fn report(assignments: Vec<FlightAssignment>) -> ScheduleReport {
        ScheduleReport {
            status: SolveStatus::Optimal,
            assignments,
            penalties: PenaltyBreakdown::default(),
            reported_objective: None,
            warnings: Vec::new(),
            unschedulable: Vec::new(),
            backend: "test".to_string(),
            solver_message: None,
            elapsed_ms: 0,
        }
    }

    #[test]
    fn test_identical_plans() {
        let plan = report(vec![flown("F1", "A1", "C1", 60)]);
        assert!(diff_reports(&plan, &plan).is_empty());
    }

    #[test]
    fn test_swaps_and_retiming() {
        let before = report(vec![flown("F1", "A1", "C1", 60), flown("F2", "A2", "C2", 120)]);
        let after = report(vec![flown("F1", "A2", "C1", 60), flown("F2", "A2", "C3", 180)]);
        let diff = diff_reports(&before, &after);

        assert_eq!(diff.len(), 3);
        assert_eq!(
            diff.changes()[0],
            PlanChange::AircraftSwap {
                flight_id: "F1".to_string(),
                from: "A1".to_string(),
                to: "A2".to_string(),
            }
        );
        assert_eq!(diff.changes_for("F2").count(), 2);
        assert_eq!(diff.changes()[2].to_string(), "F2: departure 120 -> 180");
    }

    #[test]
    fn test_cancel_and_reinstate() {
        let before = report(vec![flown("F1", "A1", "C1", 60), cancelled("F2")]);
        let after = report(vec![cancelled("F1"), flown("F2", "A1", "C1", 120)]);
        let diff = diff_reports(&before, &after);

        assert_eq!(
            diff.changes(),
            &[
                PlanChange::Cancelled {
                    flight_id: "F1".to_string()
                },
                PlanChange::Reinstated {
                    flight_id: "F2".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_missing_flight_skipped() {
        let before = report(vec![flown("F1", "A1", "C1", 60)]);
        let after = report(vec![flown("F2", "A1", "C1", 60)]);
        assert!(diff_reports(&before, &after).is_empty());
    }
}

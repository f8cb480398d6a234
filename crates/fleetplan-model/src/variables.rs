//! Variable Factory.
//!
//! Enumerates the decision variables of a scenario:
//!
//! - one binary assignment variable per eligible (flight, aircraft, crew, slot)
//! - per flight: an integer departure minute bounded by the flight window,
//!   a non-negative delay, a binary SLA-violation indicator and a binary
//!   cancellation indicator
//! - per crew: non-negative overtime hours
//! - per aircraft with a maintenance-due budget: non-negative overrun hours
//!
//! Eligibility pruning drops combinations that can never be flown. Each
//! excluded combination is counted once, under the first [`PruneRule`] that
//! rejects it.

use std::ops::Range;

use fleetplan_core::{Catalog, SlotRange};
use tracing::{info, warn};

use crate::error::InfeasibleFlightError;
use crate::lp::{Model, VarId, VarKind};

/// A hard pre-filter rule, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PruneRule {
    /// Slot start lies outside the flight's departure window.
    Window,
    /// The flight would land after the horizon ends.
    Horizon,
    /// The aircraft lacks the route's certification class.
    Certification,
    /// The aircraft may not operate at the origin or destination airport.
    Gateway,
    /// The crew is not rated for the aircraft type.
    Qualification,
    /// The aircraft is unavailable during the flight.
    AircraftAvailability,
    /// The crew is unavailable during the flight.
    CrewAvailability,
    /// The flight intersects one of the aircraft's maintenance windows.
    Maintenance,
}

impl PruneRule {
    pub const ALL: [PruneRule; 8] = [
        PruneRule::Window,
        PruneRule::Horizon,
        PruneRule::Certification,
        PruneRule::Gateway,
        PruneRule::Qualification,
        PruneRule::AircraftAvailability,
        PruneRule::CrewAvailability,
        PruneRule::Maintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PruneRule::Window => "window",
            PruneRule::Horizon => "horizon",
            PruneRule::Certification => "certification",
            PruneRule::Gateway => "gateway",
            PruneRule::Qualification => "qualification",
            PruneRule::AircraftAvailability => "aircraft_availability",
            PruneRule::CrewAvailability => "crew_availability",
            PruneRule::Maintenance => "maintenance",
        }
    }
}

/// Excluded combinations per rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneCounts([usize; 8]);

impl PruneCounts {
    pub fn get(&self, rule: PruneRule) -> usize {
        self.0[rule as usize]
    }

    pub fn record(&mut self, rule: PruneRule) {
        self.0[rule as usize] += 1;
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn merge(&mut self, other: &PruneCounts) {
        for (mine, theirs) in self.0.iter_mut().zip(other.0) {
            *mine += theirs;
        }
    }

    /// Rules with a non-zero count, in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (PruneRule, usize)> + '_ {
        PruneRule::ALL
            .iter()
            .map(|&rule| (rule, self.get(rule)))
            .filter(|&(_, count)| count > 0)
    }
}

/// One binary assignment variable and the combination it stands for.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentVar {
    pub var: VarId,
    pub flight: usize,
    pub aircraft: usize,
    pub crew: usize,
    /// Departure slot.
    pub slot: usize,
    /// Slots the flight occupies when departing in `slot`.
    pub span: SlotRange,
    pub departure_minute: i64,
    pub arrival_minute: i64,
}

/// Per-flight variables.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightVars {
    pub departure: VarId,
    pub delay: VarId,
    pub sla: VarId,
    pub cancelled: VarId,
    /// Indices into [`VariableSet::assignments`].
    pub assignments: Range<usize>,
    /// Pre-disruption departure minute.
    pub scheduled_minute: i64,
    /// Departure pinned for a cancelled flight: the scheduled minute clamped
    /// into the window.
    pub anchor_minute: i64,
}

impl FlightVars {
    pub fn is_flyable(&self) -> bool {
        !self.assignments.is_empty()
    }
}

/// All variables of one build.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableSet {
    flights: Vec<FlightVars>,
    assignments: Vec<AssignmentVar>,
    overtime: Vec<VarId>,
    maintenance: Vec<Option<VarId>>,
    infeasible: Vec<InfeasibleFlightError>,
    pruned: PruneCounts,
}

impl VariableSet {
    pub fn flights(&self) -> &[FlightVars] {
        &self.flights
    }

    pub fn flight(&self, index: usize) -> Option<&FlightVars> {
        self.flights.get(index)
    }

    pub fn assignments(&self) -> &[AssignmentVar] {
        &self.assignments
    }

    /// Assignment variables of one flight.
    pub fn assignments_of(&self, flight: usize) -> &[AssignmentVar] {
        self.flights
            .get(flight)
            .map(|f| &self.assignments[f.assignments.clone()])
            .unwrap_or(&[])
    }

    /// Overtime variable of each crew, by crew index.
    pub fn overtime(&self) -> &[VarId] {
        &self.overtime
    }

    /// Maintenance overrun variable of each aircraft, by aircraft index.
    pub fn maintenance(&self) -> &[Option<VarId>] {
        &self.maintenance
    }

    /// Flights without any eligible combination.
    pub fn infeasible(&self) -> &[InfeasibleFlightError] {
        &self.infeasible
    }

    /// Excluded combinations across all flights.
    pub fn pruned(&self) -> PruneCounts {
        self.pruned
    }
}

/// Builds a [`VariableSet`] from a catalog.
pub struct VariableFactory<'a> {
    catalog: &'a Catalog,
}

impl<'a> VariableFactory<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Adds every variable to `model`, in a fixed order: per flight the
    /// departure, delay, SLA, cancellation and assignment variables, then
    /// crew overtime, then aircraft maintenance overrun.
    pub fn build(&self, model: &mut Model) -> VariableSet {
        let catalog = self.catalog;
        let horizon = catalog.horizon();

        let mut flights = Vec::with_capacity(catalog.flights().len());
        let mut assignments = Vec::new();
        let mut infeasible = Vec::new();
        let mut pruned = PruneCounts::default();

        for (fi, flight) in catalog.flights().iter().enumerate() {
            let scheduled = catalog
                .scheduled_departure(fi)
                .unwrap_or(flight.window_start);
            let anchor = scheduled.clamp(flight.window_start, flight.window_end);
            let latest_delay = flight.window_end.saturating_sub(scheduled).max(0);

            let departure = model.add_variable(
                format!("dep({})", flight.id),
                VarKind::Integer,
                flight.window_start as f64,
                flight.window_end as f64,
            );
            let delay = model.add_variable(
                format!("delay({})", flight.id),
                VarKind::Continuous,
                0.0,
                latest_delay as f64,
            );
            let sla = model.add_binary(format!("sla({})", flight.id));
            let cancelled = model.add_binary(format!("cancel({})", flight.id));

            let first = assignments.len();
            let mut flight_pruned = PruneCounts::default();
            let occupied = horizon.slots_for_minutes(flight.duration_minutes);

            let slot_rule: Vec<Option<PruneRule>> = horizon
                .slots()
                .iter()
                .map(|slot| {
                    if !flight.window_contains(slot.start_minute) {
                        Some(PruneRule::Window)
                    } else if slot.index + occupied > horizon.len() {
                        Some(PruneRule::Horizon)
                    } else {
                        None
                    }
                })
                .collect();

            for (ai, aircraft) in catalog.aircraft().iter().enumerate() {
                let aircraft_rule = if !aircraft.is_certified_for(flight.required_cert.as_deref()) {
                    Some(PruneRule::Certification)
                } else if !aircraft.can_operate(flight) {
                    Some(PruneRule::Gateway)
                } else {
                    None
                };

                for (ci, crew) in catalog.crew().iter().enumerate() {
                    for slot in horizon.slots() {
                        let span = SlotRange::starting_at(slot.index, occupied);
                        let rule = slot_rule[slot.index]
                            .or(aircraft_rule)
                            .or_else(|| {
                                (!crew.is_qualified_for(&aircraft.aircraft_type))
                                    .then_some(PruneRule::Qualification)
                            })
                            .or_else(|| {
                                (!aircraft.available.contains_range(&span))
                                    .then_some(PruneRule::AircraftAvailability)
                            })
                            .or_else(|| {
                                (!crew.available.contains_range(&span))
                                    .then_some(PruneRule::CrewAvailability)
                            })
                            .or_else(|| {
                                aircraft.in_maintenance(&span).then_some(PruneRule::Maintenance)
                            });

                        if let Some(rule) = rule {
                            flight_pruned.record(rule);
                            continue;
                        }

                        let var = model.add_binary(format!(
                            "x({},{},{},{})",
                            flight.id, aircraft.id, crew.id, slot.index
                        ));
                        assignments.push(AssignmentVar {
                            var,
                            flight: fi,
                            aircraft: ai,
                            crew: ci,
                            slot: slot.index,
                            span,
                            departure_minute: slot.start_minute,
                            arrival_minute: slot
                                .start_minute
                                .saturating_add(flight.duration_minutes),
                        });
                    }
                }
            }

            pruned.merge(&flight_pruned);
            let range = first..assignments.len();
            if range.is_empty() {
                let error = InfeasibleFlightError {
                    flight: flight.id.clone(),
                    pruned: flight_pruned,
                };
                warn!(
                    event = "flight_infeasible",
                    flight = %flight.id,
                    exhausted_by = error.exhausted_by().map(|r| r.as_str()).unwrap_or("none"),
                );
                infeasible.push(error);
            }

            flights.push(FlightVars {
                departure,
                delay,
                sla,
                cancelled,
                assignments: range,
                scheduled_minute: scheduled,
                anchor_minute: anchor,
            });
        }

        let overtime = catalog
            .crew()
            .iter()
            .enumerate()
            .map(|(ci, crew)| {
                let hours: f64 = assignments
                    .iter()
                    .filter(|a| a.crew == ci)
                    .map(|a| catalog.flights()[a.flight].duration_hours())
                    .sum();
                let upper = (crew.duty_hours_used + hours - crew.overtime_threshold()).max(0.0);
                model.add_variable(
                    format!("overtime({})", crew.id),
                    VarKind::Continuous,
                    0.0,
                    upper,
                )
            })
            .collect();

        let maintenance = catalog
            .aircraft()
            .iter()
            .enumerate()
            .map(|(ai, aircraft)| {
                let remaining = aircraft.hours_until_maintenance?;
                let hours: f64 = assignments
                    .iter()
                    .filter(|a| a.aircraft == ai)
                    .map(|a| catalog.flights()[a.flight].duration_hours())
                    .sum();
                Some(model.add_variable(
                    format!("maint({})", aircraft.id),
                    VarKind::Continuous,
                    0.0,
                    (hours - remaining).max(0.0),
                ))
            })
            .collect();

        info!(
            event = "variables_built",
            flight_count = flights.len(),
            assignment_variables = assignments.len(),
            variable_count = model.num_variables(),
            infeasible_flights = infeasible.len(),
            pruned_combinations = pruned.total(),
        );

        VariableSet {
            flights,
            assignments,
            overtime,
            maintenance,
            infeasible,
            pruned,
        }
    }
}

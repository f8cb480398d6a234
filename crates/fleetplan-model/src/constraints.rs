//! Constraint Builder.
//!
//! Emits the hard rules of a scenario as linear rows over a [`VariableSet`].
//! Every row belongs to one [`ConstraintFamily`] and is named after the
//! entity and slot it constrains, so a violated row identifies the broken
//! rule directly.
//!
//! Rows that can never bind are not emitted, and a row identical to one
//! already emitted in the same family is skipped.

use std::collections::HashSet;

use fleetplan_config::SchedulingPolicy;
use fleetplan_core::{Catalog, SlotRange};
use smallvec::SmallVec;
use tracing::{debug, info};

use crate::bigm::BigM;
use crate::error::ModelError;
use crate::lp::{Constraint, ConstraintFamily, LinearExpr, Model, Sense, VarId};
use crate::variables::{AssignmentVar, VariableSet};

/// Assignment variables (with their flight) active in one slot of a resource.
type Bucket = SmallVec<[(VarId, usize); 8]>;

type RowKey = (ConstraintFamily, Vec<(usize, u64)>, Sense, u64);

/// Counts reported by a constraint build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintStats {
    pub emitted: usize,
    pub duplicates_skipped: usize,
}

/// Builds every constraint row for a variable set.
pub struct ConstraintBuilder<'a> {
    catalog: &'a Catalog,
    policy: &'a SchedulingPolicy,
    vars: &'a VariableSet,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(catalog: &'a Catalog, policy: &'a SchedulingPolicy, vars: &'a VariableSet) -> Self {
        Self {
            catalog,
            policy,
            vars,
        }
    }

    /// Adds every row to `model`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::NonFiniteCoefficient`] if a row would carry a NaN
    /// or infinite number.
    pub fn build(&self, model: &mut Model) -> Result<ConstraintStats, ModelError> {
        let first = model.num_constraints();
        let mut rows = RowSink::new(model);

        self.flight_rows(&mut rows)?;
        self.aircraft_overlap(&mut rows)?;
        self.crew_rest(&mut rows)?;
        self.duty_windows(&mut rows)?;
        self.overtime(&mut rows)?;
        self.maintenance_hours(&mut rows)?;

        let duplicates_skipped = rows.duplicates;
        let emitted = model.num_constraints() - first;

        for family in ConstraintFamily::ALL {
            let count = model.constraints()[first..]
                .iter()
                .filter(|c| c.family == family)
                .count();
            debug!(event = "constraint_family", family = family.as_str(), count);
        }
        info!(
            event = "constraints_built",
            constraint_count = emitted,
            duplicates_skipped,
        );

        Ok(ConstraintStats {
            emitted,
            duplicates_skipped,
        })
    }

    /// Uniqueness (or forced cancellation), departure, delay and SLA rows.
    fn flight_rows(&self, rows: &mut RowSink<'_>) -> Result<(), ModelError> {
        for (fi, flight) in self.catalog.flights().iter().enumerate() {
            let Some(fv) = self.vars.flight(fi) else {
                continue;
            };
            let assignments = self.vars.assignments_of(fi);

            if fv.is_flyable() {
                // Σx + cancelled = 1
                let mut expr = LinearExpr::new();
                for a in assignments {
                    expr.add_term(a.var, 1.0);
                }
                expr.add_term(fv.cancelled, 1.0);
                rows.emit(
                    format!("uniqueness({})", flight.id),
                    ConstraintFamily::Uniqueness,
                    expr,
                    Sense::Eq,
                    1.0,
                )?;
            } else {
                rows.emit(
                    format!("forced_cancellation({})", flight.id),
                    ConstraintFamily::ForcedCancellation,
                    LinearExpr::from_terms([(fv.cancelled, 1.0)]),
                    Sense::Eq,
                    1.0,
                )?;
            }

            // dep = Σ start·x + anchor·cancelled
            let mut expr = LinearExpr::from_terms([(fv.departure, 1.0)]);
            for a in assignments {
                expr.add_term(a.var, -(a.departure_minute as f64));
            }
            expr.add_term(fv.cancelled, -(fv.anchor_minute as f64));
            rows.emit(
                format!("departure_link({})", flight.id),
                ConstraintFamily::DepartureLink,
                expr,
                Sense::Eq,
                0.0,
            )?;

            // delay ≥ dep − scheduled, with the anchor's share removed when cancelled
            if flight.window_end > fv.scheduled_minute {
                let mut expr = LinearExpr::from_terms([(fv.delay, 1.0), (fv.departure, -1.0)]);
                expr.add_term(
                    fv.cancelled,
                    fv.anchor_minute.saturating_sub(fv.scheduled_minute) as f64,
                );
                rows.emit(
                    format!("delay_link({})", flight.id),
                    ConstraintFamily::DelayLink,
                    expr,
                    Sense::Ge,
                    -(fv.scheduled_minute as f64),
                )?;
            }

            // dep − M·sla − K·cancelled ≤ deadline
            let Some(deadline) = flight.sla_deadline else {
                continue;
            };
            let bounds = (flight.window_start as f64, flight.window_end as f64);
            if let Some(m) = BigM::for_upper_threshold(bounds, deadline as f64) {
                let anchor_excess = fv.anchor_minute.saturating_sub(deadline).max(0) as f64;
                let mut expr = LinearExpr::from_terms([(fv.departure, 1.0), (fv.sla, -m.value())]);
                expr.add_term(fv.cancelled, -anchor_excess);
                rows.emit(
                    format!("sla_link({})", flight.id),
                    ConstraintFamily::SlaLink,
                    expr,
                    Sense::Le,
                    deadline as f64,
                )?;
            }
        }
        Ok(())
    }

    /// At most one flight per aircraft in every slot, counting turnaround.
    fn aircraft_overlap(&self, rows: &mut RowSink<'_>) -> Result<(), ModelError> {
        let horizon = self.catalog.horizon();
        let turnaround = horizon.slots_for_minutes(self.policy.turnaround_minutes);
        for (ai, aircraft) in self.catalog.aircraft().iter().enumerate() {
            let buckets = self.buckets(|a| a.aircraft == ai, |_| turnaround);
            for (slot, bucket) in buckets.iter().enumerate() {
                self.emit_at_most_one(
                    rows,
                    format!("aircraft_overlap({},{})", aircraft.id, slot),
                    ConstraintFamily::AircraftOverlap,
                    bucket,
                )?;
            }
        }
        Ok(())
    }

    /// At most one flight per crew in every slot, counting minimum rest.
    fn crew_rest(&self, rows: &mut RowSink<'_>) -> Result<(), ModelError> {
        let horizon = self.catalog.horizon();
        for (ci, crew) in self.catalog.crew().iter().enumerate() {
            let rest = horizon.slots_for_minutes(crew.min_rest_minutes);
            let buckets = self.buckets(|a| a.crew == ci, |_| rest);
            for (slot, bucket) in buckets.iter().enumerate() {
                self.emit_at_most_one(
                    rows,
                    format!("crew_rest({},{})", crew.id, slot),
                    ConstraintFamily::CrewRest,
                    bucket,
                )?;
            }
        }
        Ok(())
    }

    /// Crew flight hours inside every duty reference window stay under the limit.
    ///
    /// One window ends at every slot. Hours already worked before the horizon
    /// count against every window that reaches back before horizon start. A
    /// window is skipped when the window ending one slot later covers it with
    /// the same right-hand side, or when it cannot bind.
    fn duty_windows(&self, rows: &mut RowSink<'_>) -> Result<(), ModelError> {
        let horizon = self.catalog.horizon();
        let len = horizon.len();
        let window_minutes = self.policy.duty_window_hours * 60.0;
        let width = ((window_minutes / horizon.granularity() as f64).ceil() as usize).max(1);

        let lo_of = |end: usize| (end + 1).saturating_sub(width);
        let charged = |end: usize| end + 1 < width;

        for (ci, crew) in self.catalog.crew().iter().enumerate() {
            let own: Vec<&AssignmentVar> = self
                .vars
                .assignments()
                .iter()
                .filter(|a| a.crew == ci)
                .collect();
            if own.is_empty() {
                continue;
            }

            for end in 0..len {
                if end + 1 < len && lo_of(end + 1) == lo_of(end) && charged(end + 1) == charged(end)
                {
                    continue;
                }
                let window = SlotRange::new(lo_of(end), end + 1);
                let Some((start_minute, end_minute)) = horizon.minutes_of(window) else {
                    continue;
                };
                let rhs = crew.max_duty_hours
                    - if charged(end) {
                        crew.duty_hours_used
                    } else {
                        0.0
                    };

                let mut expr = LinearExpr::new();
                let mut per_flight_max: Vec<(usize, f64)> = Vec::new();
                for a in &own {
                    let overlap = a.arrival_minute.min(end_minute) - a.departure_minute.max(start_minute);
                    if overlap <= 0 {
                        continue;
                    }
                    let hours = overlap as f64 / 60.0;
                    expr.add_term(a.var, hours);
                    match per_flight_max.iter_mut().find(|(f, _)| *f == a.flight) {
                        Some((_, max)) => *max = max.max(hours),
                        None => per_flight_max.push((a.flight, hours)),
                    }
                }

                let worst_case: f64 = per_flight_max.iter().map(|(_, h)| h).sum();
                if expr.is_empty() || worst_case <= rhs + 1e-9 {
                    continue;
                }
                rows.emit(
                    format!("duty_window({},{})", crew.id, end),
                    ConstraintFamily::DutyWindow,
                    expr,
                    Sense::Le,
                    rhs,
                )?;
            }
        }
        Ok(())
    }

    /// overtime − Σ hours·x ≥ used − standard
    fn overtime(&self, rows: &mut RowSink<'_>) -> Result<(), ModelError> {
        for (ci, crew) in self.catalog.crew().iter().enumerate() {
            let Some(&overtime) = self.vars.overtime().get(ci) else {
                continue;
            };
            let mut expr = LinearExpr::from_terms([(overtime, 1.0)]);
            for a in self.vars.assignments().iter().filter(|a| a.crew == ci) {
                expr.add_term(a.var, -self.hours_of(a));
            }
            let rhs = crew.duty_hours_used - crew.overtime_threshold();
            if expr.len() == 1 && rhs <= 0.0 {
                continue;
            }
            rows.emit(
                format!("overtime({})", crew.id),
                ConstraintFamily::Overtime,
                expr,
                Sense::Ge,
                rhs,
            )?;
        }
        Ok(())
    }

    /// overrun − Σ hours·x ≥ −hours_until_maintenance
    fn maintenance_hours(&self, rows: &mut RowSink<'_>) -> Result<(), ModelError> {
        for (ai, aircraft) in self.catalog.aircraft().iter().enumerate() {
            let (Some(Some(overrun)), Some(remaining)) = (
                self.vars.maintenance().get(ai),
                aircraft.hours_until_maintenance,
            ) else {
                continue;
            };
            let mut expr = LinearExpr::from_terms([(*overrun, 1.0)]);
            for a in self.vars.assignments().iter().filter(|a| a.aircraft == ai) {
                expr.add_term(a.var, -self.hours_of(a));
            }
            if expr.len() == 1 {
                continue;
            }
            rows.emit(
                format!("maintenance_hours({})", aircraft.id),
                ConstraintFamily::MaintenanceHours,
                expr,
                Sense::Ge,
                -remaining,
            )?;
        }
        Ok(())
    }

    fn hours_of(&self, a: &AssignmentVar) -> f64 {
        (a.arrival_minute - a.departure_minute) as f64 / 60.0
    }

    /// Places each matching assignment in every slot of its blocked range:
    /// the flight's own slots plus `buffer(a)` slots after arrival.
    fn buckets(
        &self,
        matches: impl Fn(&AssignmentVar) -> bool,
        buffer: impl Fn(&AssignmentVar) -> usize,
    ) -> Vec<Bucket> {
        let len = self.catalog.horizon().len();
        let mut buckets = vec![Bucket::new(); len];
        for a in self.vars.assignments().iter().filter(|a| matches(a)) {
            let blocked = SlotRange::starting_at(a.slot, a.span.len() + buffer(a)).clip(len);
            for slot in blocked.iter() {
                buckets[slot].push((a.var, a.flight));
            }
        }
        buckets
    }

    fn emit_at_most_one(
        &self,
        rows: &mut RowSink<'_>,
        name: String,
        family: ConstraintFamily,
        bucket: &Bucket,
    ) -> Result<(), ModelError> {
        // Variables of a single flight are already exclusive through uniqueness.
        let Some(&(_, first_flight)) = bucket.first() else {
            return Ok(());
        };
        if bucket.iter().all(|&(_, f)| f == first_flight) {
            return Ok(());
        }
        let expr = LinearExpr::from_terms(bucket.iter().map(|&(var, _)| (var, 1.0)));
        rows.emit(name, family, expr, Sense::Le, 1.0)
    }
}

/// Adds rows to a model, skipping exact duplicates within a family.
struct RowSink<'m> {
    model: &'m mut Model,
    seen: HashSet<RowKey>,
    duplicates: usize,
}

impl<'m> RowSink<'m> {
    fn new(model: &'m mut Model) -> Self {
        Self {
            model,
            seen: HashSet::new(),
            duplicates: 0,
        }
    }

    fn emit(
        &mut self,
        name: String,
        family: ConstraintFamily,
        expr: LinearExpr,
        sense: Sense,
        rhs: f64,
    ) -> Result<(), ModelError> {
        if !rhs.is_finite() || expr.terms().any(|(_, coef)| !coef.is_finite()) {
            return Err(ModelError::NonFiniteCoefficient { constraint: name });
        }
        let key: RowKey = (
            family,
            expr.terms()
                .map(|(var, coef)| (var.index(), coef.to_bits()))
                .collect(),
            sense,
            rhs.to_bits(),
        );
        if !self.seen.insert(key) {
            self.duplicates += 1;
            return Ok(());
        }
        self.model
            .add_constraint(Constraint::new(name, family, expr, sense, rhs));
        Ok(())
    }
}

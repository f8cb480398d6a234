//! The entity catalog of one scenario run.
//!
//! A `Catalog` owns every flight, aircraft, crew and time slot of the
//! planning horizon. It is validated once on construction and never mutated
//! afterwards; disruptions derive a fresh catalog instead.

use std::collections::HashMap;

use tracing::info;

use crate::domain::{Aircraft, Crew, Flight};
use crate::error::DataValidationError;
use crate::time::{Horizon, SlotRange};

/// Validated, immutable entity records for one planning horizon.
///
/// # Example
///
/// ```
/// use fleetplan_core::{Aircraft, Catalog, Crew, Flight, Horizon, OriginalAssignment, SlotRange};
///
/// let horizon = Horizon::uniform(0, 60, 6).unwrap();
/// let flights = vec![
///     Flight::new("F1", "SDF", "ORD", OriginalAssignment::new("A1", "C1", 1)).with_window(60, 180),
/// ];
/// let aircraft = vec![Aircraft::new("A1", "B737", "STD", SlotRange::new(0, 6))];
/// let crew = vec![Crew::new("C1", SlotRange::new(0, 6), 10.0).with_qualification("B737")];
///
/// let catalog = Catalog::new(horizon, flights, aircraft, crew).unwrap();
/// assert_eq!(catalog.flights().len(), 1);
/// assert_eq!(catalog.scheduled_departure(0), Some(60));
/// assert_eq!(catalog.aircraft_index("A1"), Some(0));
/// ```
#[derive(Debug, Clone)]
pub struct Catalog {
    horizon: Horizon,
    flights: Vec<Flight>,
    aircraft: Vec<Aircraft>,
    crew: Vec<Crew>,
    flight_index: HashMap<String, usize>,
    aircraft_index: HashMap<String, usize>,
    crew_index: HashMap<String, usize>,
}

impl Catalog {
    /// Validates the entity records and builds the catalog.
    ///
    /// # Errors
    ///
    /// Returns the first [`DataValidationError`] found. Validation covers
    /// identifier uniqueness, flight windows, priorities and durations,
    /// availability ranges, maintenance-window disjointness, duty-hour
    /// consistency and the references of every original assignment.
    pub fn new(
        horizon: Horizon,
        flights: Vec<Flight>,
        aircraft: Vec<Aircraft>,
        crew: Vec<Crew>,
    ) -> Result<Self, DataValidationError> {
        let flight_index = index_ids("flight", flights.iter().map(|f| f.id.as_str()))?;
        let aircraft_index = index_ids("aircraft", aircraft.iter().map(|a| a.id.as_str()))?;
        let crew_index = index_ids("crew", crew.iter().map(|c| c.id.as_str()))?;

        for a in &aircraft {
            validate_aircraft(a, &horizon)?;
        }
        for c in &crew {
            validate_crew(c, &horizon)?;
        }
        for f in &flights {
            validate_flight(f, &horizon)?;
            if !aircraft_index.contains_key(&f.original.aircraft_id) {
                return Err(DataValidationError::UnknownReference {
                    kind: "aircraft",
                    id: f.original.aircraft_id.clone(),
                    referenced_by: format!("flight '{}'", f.id),
                });
            }
            if !crew_index.contains_key(&f.original.crew_id) {
                return Err(DataValidationError::UnknownReference {
                    kind: "crew",
                    id: f.original.crew_id.clone(),
                    referenced_by: format!("flight '{}'", f.id),
                });
            }
        }

        info!(
            event = "catalog_loaded",
            flight_count = flights.len(),
            aircraft_count = aircraft.len(),
            crew_count = crew.len(),
            slot_count = horizon.len(),
        );

        Ok(Self {
            horizon,
            flights,
            aircraft,
            crew,
            flight_index,
            aircraft_index,
            crew_index,
        })
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn aircraft(&self) -> &[Aircraft] {
        &self.aircraft
    }

    pub fn crew(&self) -> &[Crew] {
        &self.crew
    }

    pub fn flight_index(&self, id: &str) -> Option<usize> {
        self.flight_index.get(id).copied()
    }

    pub fn aircraft_index(&self, id: &str) -> Option<usize> {
        self.aircraft_index.get(id).copied()
    }

    pub fn crew_index(&self, id: &str) -> Option<usize> {
        self.crew_index.get(id).copied()
    }

    /// Pre-disruption departure minute of a flight: the start of its original slot.
    pub fn scheduled_departure(&self, flight: usize) -> Option<i64> {
        let flight = self.flights.get(flight)?;
        self.horizon
            .slot(flight.original.slot)
            .map(|slot| slot.start_minute)
    }

    pub(crate) fn into_parts(self) -> (Horizon, Vec<Flight>, Vec<Aircraft>, Vec<Crew>) {
        (self.horizon, self.flights, self.aircraft, self.crew)
    }
}

fn index_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>, DataValidationError> {
    let mut index = HashMap::new();
    for (i, id) in ids.enumerate() {
        if index.insert(id.to_string(), i).is_some() {
            return Err(DataValidationError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}

fn validate_range(
    kind: &'static str,
    id: &str,
    range: SlotRange,
    horizon: &Horizon,
) -> Result<(), DataValidationError> {
    if range.is_inverted() {
        return Err(DataValidationError::InvertedRange {
            kind,
            id: id.to_string(),
            range,
        });
    }
    if range.end > horizon.len() {
        return Err(DataValidationError::RangeOutsideHorizon {
            kind,
            id: id.to_string(),
            range,
            horizon_len: horizon.len(),
        });
    }
    Ok(())
}

fn validate_non_negative(
    kind: &'static str,
    id: &str,
    field: &'static str,
    value: f64,
) -> Result<(), DataValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DataValidationError::InvalidValue {
            kind,
            id: id.to_string(),
            field,
            value,
        });
    }
    Ok(())
}

fn validate_flight(flight: &Flight, horizon: &Horizon) -> Result<(), DataValidationError> {
    if flight.window_start > flight.window_end {
        return Err(DataValidationError::InvertedWindow {
            flight: flight.id.clone(),
            start: flight.window_start,
            end: flight.window_end,
        });
    }
    if !flight.priority.is_finite() || flight.priority <= 0.0 {
        return Err(DataValidationError::InvalidPriority {
            flight: flight.id.clone(),
            priority: flight.priority,
        });
    }
    if flight.duration_minutes <= 0 {
        return Err(DataValidationError::InvalidDuration {
            flight: flight.id.clone(),
            duration: flight.duration_minutes,
        });
    }
    if flight.duration_minutes > horizon.span_minutes() {
        return Err(DataValidationError::DurationExceedsHorizon {
            flight: flight.id.clone(),
            duration: flight.duration_minutes,
            span: horizon.span_minutes(),
        });
    }
    if flight.original.slot >= horizon.len() {
        return Err(DataValidationError::SlotOutOfHorizon {
            flight: flight.id.clone(),
            slot: flight.original.slot,
            horizon_len: horizon.len(),
        });
    }
    Ok(())
}

fn validate_aircraft(aircraft: &Aircraft, horizon: &Horizon) -> Result<(), DataValidationError> {
    validate_range("aircraft", &aircraft.id, aircraft.available, horizon)?;

    let mut windows = aircraft.maintenance_windows.clone();
    windows.sort();
    for window in &windows {
        validate_range("maintenance window of aircraft", &aircraft.id, *window, horizon)?;
    }
    for pair in windows.windows(2) {
        if pair[0].intersects(&pair[1]) {
            return Err(DataValidationError::OverlappingMaintenance {
                aircraft: aircraft.id.clone(),
                first: pair[0],
                second: pair[1],
            });
        }
    }

    if let Some(hours) = aircraft.hours_until_maintenance {
        validate_non_negative("aircraft", &aircraft.id, "hours_until_maintenance", hours)?;
    }
    Ok(())
}

fn validate_crew(crew: &Crew, horizon: &Horizon) -> Result<(), DataValidationError> {
    validate_range("crew", &crew.id, crew.available, horizon)?;
    validate_non_negative("crew", &crew.id, "duty_hours_used", crew.duty_hours_used)?;
    validate_non_negative("crew", &crew.id, "max_duty_hours", crew.max_duty_hours)?;
    if crew.min_rest_minutes < 0 {
        return Err(DataValidationError::InvalidValue {
            kind: "crew",
            id: crew.id.clone(),
            field: "min_rest_minutes",
            value: crew.min_rest_minutes as f64,
        });
    }
    if crew.duty_hours_used > crew.max_duty_hours {
        return Err(DataValidationError::DutyHoursExceeded {
            crew: crew.id.clone(),
            used: crew.duty_hours_used,
            max: crew.max_duty_hours,
        });
    }
    if let Some(standard) = crew.standard_duty_hours {
        validate_non_negative("crew", &crew.id, "standard_duty_hours", standard)?;
        if standard > crew.max_duty_hours {
            return Err(DataValidationError::StandardAboveMax {
                crew: crew.id.clone(),
                standard,
                max: crew.max_duty_hours,
            });
        }
    }
    Ok(())
}

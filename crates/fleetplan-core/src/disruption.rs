//! Operational disruptions.
//!
//! A disruption never mutates a catalog. [`Catalog::with_disruptions`]
//! rebuilds the affected records and validates the result as a new catalog.

use std::fmt;

use tracing::info;

use crate::catalog::Catalog;
use crate::error::DataValidationError;
use crate::time::SlotRange;

/// An event that changes resource availability or flight timing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Disruption {
    /// The crew cannot fly at all within the horizon.
    CrewUnavailable { crew: String },
    /// The crew's availability shrinks (or moves) to `available`.
    CrewAvailability { crew: String, available: SlotRange },
    /// Unplanned maintenance blocks the aircraft during `window`.
    AircraftMaintenance { aircraft: String, window: SlotRange },
    /// The aircraft is out of service for the whole horizon.
    AircraftGrounded { aircraft: String },
    /// The flight's departure window changes.
    FlightWindow {
        flight: String,
        window_start: i64,
        window_end: i64,
    },
}

impl Disruption {
    fn entity(&self) -> (&'static str, &str) {
        match self {
            Disruption::CrewUnavailable { crew } | Disruption::CrewAvailability { crew, .. } => {
                ("crew", crew)
            }
            Disruption::AircraftMaintenance { aircraft, .. }
            | Disruption::AircraftGrounded { aircraft } => ("aircraft", aircraft),
            Disruption::FlightWindow { flight, .. } => ("flight", flight),
        }
    }
}

impl fmt::Display for Disruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disruption::CrewUnavailable { crew } => write!(f, "crew {crew} unavailable"),
            Disruption::CrewAvailability { crew, available } => {
                write!(f, "crew {crew} available in {available}")
            }
            Disruption::AircraftMaintenance { aircraft, window } => {
                write!(f, "aircraft {aircraft} in maintenance during {window}")
            }
            Disruption::AircraftGrounded { aircraft } => write!(f, "aircraft {aircraft} grounded"),
            Disruption::FlightWindow {
                flight,
                window_start,
                window_end,
            } => write!(f, "flight {flight} window moved to [{window_start}, {window_end}]"),
        }
    }
}

impl Catalog {
    /// Applies disruptions in order and validates the resulting catalog.
    ///
    /// Maintenance windows added by a disruption are merged with any window
    /// they overlap or touch, so the disjointness invariant holds.
    ///
    /// # Errors
    ///
    /// Returns [`DataValidationError::UnknownReference`] if a disruption names
    /// an entity that is not in the catalog, or any validation error raised
    /// by the rebuilt catalog.
    ///
    /// # Example
    ///
    /// ```
    /// use fleetplan_core::{Aircraft, Catalog, Crew, Disruption, Flight, Horizon, OriginalAssignment, SlotRange};
    ///
    /// let catalog = Catalog::new(
    ///     Horizon::uniform(0, 60, 8).unwrap(),
    ///     vec![Flight::new("F1", "SDF", "ORD", OriginalAssignment::new("A1", "C1", 1))],
    ///     vec![Aircraft::new("A1", "B737", "STD", SlotRange::new(0, 8))
    ///         .with_maintenance_window(SlotRange::new(4, 6))],
    ///     vec![Crew::new("C1", SlotRange::new(0, 8), 10.0)],
    /// )
    /// .unwrap();
    ///
    /// let disrupted = catalog
    ///     .with_disruptions(&[Disruption::AircraftMaintenance {
    ///         aircraft: "A1".into(),
    ///         window: SlotRange::new(2, 5),
    ///     }])
    ///     .unwrap();
    ///
    /// assert_eq!(disrupted.aircraft()[0].maintenance_windows, vec![SlotRange::new(2, 6)]);
    /// assert_eq!(catalog.aircraft()[0].maintenance_windows, vec![SlotRange::new(4, 6)]);
    /// ```
    pub fn with_disruptions(&self, disruptions: &[Disruption]) -> Result<Catalog, DataValidationError> {
        let (horizon, mut flights, mut aircraft, mut crew) = self.clone().into_parts();

        for disruption in disruptions {
            let (kind, id) = disruption.entity();
            let index = match kind {
                "crew" => self.crew_index(id),
                "aircraft" => self.aircraft_index(id),
                _ => self.flight_index(id),
            }
            .ok_or_else(|| DataValidationError::UnknownReference {
                kind,
                id: id.to_string(),
                referenced_by: format!("disruption '{disruption}'"),
            })?;

            match disruption {
                Disruption::CrewUnavailable { .. } => {
                    crew[index].available = SlotRange::empty();
                }
                Disruption::CrewAvailability { available, .. } => {
                    crew[index].available = *available;
                }
                Disruption::AircraftMaintenance { window, .. } => {
                    let windows = &mut aircraft[index].maintenance_windows;
                    windows.push(*window);
                    merge_windows(windows);
                }
                Disruption::AircraftGrounded { .. } => {
                    aircraft[index].maintenance_windows = vec![horizon.full_range()];
                }
                Disruption::FlightWindow {
                    window_start,
                    window_end,
                    ..
                } => {
                    flights[index].window_start = *window_start;
                    flights[index].window_end = *window_end;
                }
            }

            info!(event = "disruption_applied", kind, id, detail = %disruption);
        }

        Catalog::new(horizon, flights, aircraft, crew)
    }
}

/// Sorts windows and merges any that overlap or touch. Empty windows are dropped.
fn merge_windows(windows: &mut Vec<SlotRange>) {
    windows.retain(|w| !w.is_empty());
    windows.sort();
    let mut merged: Vec<SlotRange> = Vec::with_capacity(windows.len());
    for window in windows.drain(..) {
        match merged.last_mut() {
            Some(last) if window.start <= last.end => *last = last.hull(&window),
            _ => merged.push(window),
        }
    }
    *windows = merged;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Aircraft, Crew, Flight, OriginalAssignment};
    use crate::time::Horizon;

    fn catalog() -> Catalog {
        Catalog::new(
            Horizon::uniform(0, 60, 8).unwrap(),
            vec![Flight::new("F1", "SDF", "ORD", OriginalAssignment::new("A1", "C1", 1))
                .with_window(60, 240)],
            vec![Aircraft::new("A1", "B737", "STD", SlotRange::new(0, 8))
                .with_maintenance_window(SlotRange::new(6, 8))],
            vec![Crew::new("C1", SlotRange::new(0, 8), 10.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_crew_unavailable() {
        let disrupted = catalog()
            .with_disruptions(&[Disruption::CrewUnavailable { crew: "C1".into() }])
            .unwrap();
        assert!(disrupted.crew()[0].available.is_empty());
    }

    #[test]
    fn test_grounded_covers_horizon() {
        let disrupted = catalog()
            .with_disruptions(&[Disruption::AircraftGrounded {
                aircraft: "A1".into(),
            }])
            .unwrap();
        assert_eq!(
            disrupted.aircraft()[0].maintenance_windows,
            vec![SlotRange::new(0, 8)]
        );
    }

    #[test]
    fn test_maintenance_merge_touching() {
        let disrupted = catalog()
            .with_disruptions(&[
                Disruption::AircraftMaintenance {
                    aircraft: "A1".into(),
                    window: SlotRange::new(1, 2),
                },
                Disruption::AircraftMaintenance {
                    aircraft: "A1".into(),
                    window: SlotRange::new(4, 6),
                },
            ])
            .unwrap();
        assert_eq!(
            disrupted.aircraft()[0].maintenance_windows,
            vec![SlotRange::new(1, 2), SlotRange::new(4, 8)]
        );
    }

    #[test]
    fn test_flight_window_revalidated() {
        let err = catalog()
            .with_disruptions(&[Disruption::FlightWindow {
                flight: "F1".into(),
                window_start: 300,
                window_end: 120,
            }])
            .unwrap_err();
        assert!(matches!(err, DataValidationError::InvertedWindow { .. }));
    }

    #[test]
    fn test_unknown_entity_rejected() {
        let err = catalog()
            .with_disruptions(&[Disruption::AircraftGrounded {
                aircraft: "A9".into(),
            }])
            .unwrap_err();
        assert!(matches!(
            err,
            DataValidationError::UnknownReference { kind: "aircraft", .. }
        ));
    }

    #[test]
    fn test_display() {
        let d = Disruption::CrewAvailability {
            crew: "C1".into(),
            available: SlotRange::new(2, 5),
        };
        assert_eq!(d.to_string(), "crew C1 available in [2, 5)");
    }
}

use std::collections::BTreeSet;

use crate::domain::Flight;
use crate::time::SlotRange;

/// An aircraft (tail) that can fly assigned flights.
///
/// # Example
///
/// ```
/// use fleetplan_core::{Aircraft, Flight, OriginalAssignment, SlotRange};
///
/// let aircraft = Aircraft::new("A101", "B767", "ETOPS", SlotRange::new(0, 24))
///     .with_location("SDF")
///     .with_maintenance_window(SlotRange::new(10, 14))
///     .with_restricted_airport("JFK");
///
/// let original = OriginalAssignment::new("A101", "C01", 0);
/// assert!(aircraft.in_maintenance(&SlotRange::new(13, 15)));
/// assert!(!aircraft.in_maintenance(&SlotRange::new(14, 16)));
/// assert!(!aircraft.can_operate(&Flight::new("UA1", "ORD", "JFK", original.clone())));
/// assert!(aircraft.can_operate(&Flight::new("UA2", "SDF", "ORD", original)));
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aircraft {
    pub id: String,
    /// Type rating crews must hold to operate this aircraft.
    pub aircraft_type: String,
    /// Route certification class of the airframe.
    pub cert_class: String,
    /// Slots in which the aircraft can fly.
    pub available: SlotRange,
    /// Disjoint blackout intervals, sorted by start.
    pub maintenance_windows: Vec<SlotRange>,
    /// Airport where the aircraft sits at horizon start.
    pub location: String,
    /// Airports the aircraft cannot operate at.
    pub restricted_airports: BTreeSet<String>,
    /// Flight hours remaining before maintenance is due.
    pub hours_until_maintenance: Option<f64>,
}

impl Aircraft {
    pub fn new(
        id: impl Into<String>,
        aircraft_type: impl Into<String>,
        cert_class: impl Into<String>,
        available: SlotRange,
    ) -> Self {
        Self {
            id: id.into(),
            aircraft_type: aircraft_type.into(),
            cert_class: cert_class.into(),
            available,
            maintenance_windows: Vec::new(),
            location: String::new(),
            restricted_airports: BTreeSet::new(),
            hours_until_maintenance: None,
        }
    }

    pub fn with_location(mut self, airport: impl Into<String>) -> Self {
        self.location = airport.into();
        self
    }

    pub fn with_maintenance_window(mut self, window: SlotRange) -> Self {
        self.maintenance_windows.push(window);
        self.maintenance_windows.sort();
        self
    }

    pub fn with_restricted_airport(mut self, airport: impl Into<String>) -> Self {
        self.restricted_airports.insert(airport.into());
        self
    }

    pub fn with_hours_until_maintenance(mut self, hours: f64) -> Self {
        self.hours_until_maintenance = Some(hours);
        self
    }

    /// Returns true if any maintenance window intersects `span`.
    pub fn in_maintenance(&self, span: &SlotRange) -> bool {
        self.maintenance_windows.iter().any(|w| w.intersects(span))
    }

    /// Returns true if neither end of `flight` is a restricted airport.
    pub fn can_operate(&self, flight: &Flight) -> bool {
        !self
            .restricted_airports
            .iter()
            .any(|airport| flight.touches(airport))
    }

    /// Returns true if the airframe satisfies a route certification requirement.
    pub fn is_certified_for(&self, required: Option<&str>) -> bool {
        required.map_or(true, |cert| cert == self.cert_class)
    }
}

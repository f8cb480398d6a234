//! Catalog fixtures on an hourly horizon.
//!
//! Defaults: every flight flies SDF → ORD for one hour, every aircraft is a
//! B737 of class STD parked at SDF and available for the whole horizon, every crew is rated
//! for the B737 with a ten-hour duty limit.

use fleetplan_core::{Aircraft, Catalog, Crew, Flight, Horizon, OriginalAssignment, SlotRange};

/// Minutes per slot.
pub const GRANULARITY: i64 = 60;

/// Slots in the default horizon.
pub const SLOTS: usize = 8;

pub fn hourly_horizon(slots: usize) -> Horizon {
    Horizon::uniform(0, GRANULARITY, slots).expect("valid hourly horizon")
}

/// A one-hour flight originally flown by A1 and C1 in `original_slot`.
pub fn flight(id: &str, original_slot: usize) -> Flight {
    Flight::new(
        id,
        "SDF",
        "ORD",
        OriginalAssignment::new("A1", "C1", original_slot),
    )
}

pub fn aircraft(id: &str) -> Aircraft {
    Aircraft::new(id, "B737", "STD", SlotRange::new(0, SLOTS)).with_location("SDF")
}

pub fn crew(id: &str) -> Crew {
    Crew::new(id, SlotRange::new(0, SLOTS), 10.0).with_qualification("B737")
}

/// Collects entities and validates them into a [`Catalog`].
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    slots: usize,
    flights: Vec<Flight>,
    aircraft: Vec<Aircraft>,
    crew: Vec<Crew>,
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::hourly(SLOTS)
    }
}

impl ScenarioBuilder {
    pub fn hourly(slots: usize) -> Self {
        Self {
            slots,
            flights: Vec::new(),
            aircraft: Vec::new(),
            crew: Vec::new(),
        }
    }

    pub fn flight(mut self, flight: Flight) -> Self {
        self.flights.push(flight);
        self
    }

    pub fn aircraft(mut self, aircraft: Aircraft) -> Self {
        self.aircraft.push(aircraft);
        self
    }

    pub fn crew(mut self, crew: Crew) -> Self {
        self.crew.push(crew);
        self
    }

    /// Builds the catalog, panicking on invalid fixture data.
    pub fn build(self) -> Catalog {
        Catalog::new(
            hourly_horizon(self.slots),
            self.flights,
            self.aircraft,
            self.crew,
        )
        .expect("valid fixture catalog")
    }
}

/// One flight with window [60, 240], one aircraft, one crew.
pub fn single_flight_catalog() -> Catalog {
    ScenarioBuilder::default()
        .flight(flight("F1", 1).with_window(60, 240))
        .aircraft(aircraft("A1"))
        .crew(crew("C1"))
        .build()
}

/// The pre-disruption resources and slot of a flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OriginalAssignment {
    pub aircraft_id: String,
    pub crew_id: String,
    pub slot: usize,
}

impl OriginalAssignment {
    pub fn new(aircraft_id: impl Into<String>, crew_id: impl Into<String>, slot: usize) -> Self {
        Self {
            aircraft_id: aircraft_id.into(),
            crew_id: crew_id.into(),
            slot,
        }
    }
}

/// A flight leg to be (re)assigned.
///
/// Departure is allowed in any slot whose start minute lies inside
/// `[window_start, window_end]`.
///
/// # Example
///
/// ```
/// use fleetplan_core::{Flight, OriginalAssignment};
///
/// let flight = Flight::new("UA100", "SDF", "ORD", OriginalAssignment::new("A101", "C01", 2))
///     .with_window(120, 300)
///     .with_duration(90)
///     .with_sla_deadline(240)
///     .with_priority(2.5);
///
/// assert!(flight.window_contains(120));
/// assert!(!flight.window_contains(301));
/// assert_eq!(flight.duration_hours(), 1.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Flight {
    pub id: String,
    pub origin: String,
    pub destination: String,
    /// Earliest allowed departure minute.
    pub window_start: i64,
    /// Latest allowed departure minute.
    pub window_end: i64,
    /// Block time in minutes.
    pub duration_minutes: i64,
    /// Departures strictly after this minute violate the SLA.
    pub sla_deadline: Option<i64>,
    /// Multiplier applied to delay, SLA and cancellation penalties.
    pub priority: f64,
    /// Aircraft certification class required by the route, if any.
    pub required_cert: Option<String>,
    pub original: OriginalAssignment,
}

impl Flight {
    /// Creates a one-hour flight with priority 1 and a zero-width window at minute 0.
    pub fn new(
        id: impl Into<String>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        original: OriginalAssignment,
    ) -> Self {
        Self {
            id: id.into(),
            origin: origin.into(),
            destination: destination.into(),
            window_start: 0,
            window_end: 0,
            duration_minutes: 60,
            sla_deadline: None,
            priority: 1.0,
            required_cert: None,
            original,
        }
    }

    pub fn with_window(mut self, start: i64, end: i64) -> Self {
        self.window_start = start;
        self.window_end = end;
        self
    }

    pub fn with_duration(mut self, minutes: i64) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn with_sla_deadline(mut self, minute: i64) -> Self {
        self.sla_deadline = Some(minute);
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_required_cert(mut self, cert_class: impl Into<String>) -> Self {
        self.required_cert = Some(cert_class.into());
        self
    }

    pub fn window_contains(&self, minute: i64) -> bool {
        self.window_start <= minute && minute <= self.window_end
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes as f64 / 60.0
    }

    /// Returns true if the flight departs from or arrives at `airport`.
    pub fn touches(&self, airport: &str) -> bool {
        self.origin == airport || self.destination == airport
    }
}

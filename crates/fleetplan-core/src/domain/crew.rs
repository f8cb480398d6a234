use std::collections::BTreeSet;

use crate::time::SlotRange;

/// A crew pairing that can be assigned to flights.
///
/// # Example
///
/// ```
/// use fleetplan_core::{Crew, SlotRange};
///
/// let crew = Crew::new("C01", SlotRange::new(0, 16), 10.0)
///     .with_qualification("B737")
///     .with_duty_hours_used(6.5)
///     .with_standard_duty_hours(8.0);
///
/// assert!(crew.is_qualified_for("B737"));
/// assert_eq!(crew.overtime_threshold(), 8.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Crew {
    pub id: String,
    /// Aircraft type ratings held by the crew.
    pub qualifications: BTreeSet<String>,
    /// Slots in which the crew can fly.
    pub available: SlotRange,
    /// Duty hours accumulated before the horizon starts.
    pub duty_hours_used: f64,
    /// Hard duty-hour limit per reference window.
    pub max_duty_hours: f64,
    /// Hours above which duty counts as overtime; defaults to the hard limit.
    pub standard_duty_hours: Option<f64>,
    /// Minimum rest between two consecutive flights.
    pub min_rest_minutes: i64,
}

impl Crew {
    pub fn new(id: impl Into<String>, available: SlotRange, max_duty_hours: f64) -> Self {
        Self {
            id: id.into(),
            qualifications: BTreeSet::new(),
            available,
            duty_hours_used: 0.0,
            max_duty_hours,
            standard_duty_hours: None,
            min_rest_minutes: 0,
        }
    }

    pub fn with_qualification(mut self, aircraft_type: impl Into<String>) -> Self {
        self.qualifications.insert(aircraft_type.into());
        self
    }

    pub fn with_duty_hours_used(mut self, hours: f64) -> Self {
        self.duty_hours_used = hours;
        self
    }

    pub fn with_standard_duty_hours(mut self, hours: f64) -> Self {
        self.standard_duty_hours = Some(hours);
        self
    }

    pub fn with_min_rest_minutes(mut self, minutes: i64) -> Self {
        self.min_rest_minutes = minutes;
        self
    }

    pub fn is_qualified_for(&self, aircraft_type: &str) -> bool {
        self.qualifications.contains(aircraft_type)
    }

    pub fn overtime_threshold(&self) -> f64 {
        self.standard_duty_hours.unwrap_or(self.max_duty_hours)
    }
}

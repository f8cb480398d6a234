//! Error types for catalog construction

use thiserror::Error;

use crate::time::SlotRange;

/// Malformed or inconsistent input data.
///
/// Raised while building a [`Catalog`](crate::Catalog); model construction
/// never starts on a catalog that failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataValidationError {
    /// The horizon has no time slots.
    #[error("planning horizon has no time slots")]
    EmptyHorizon,

    /// A slot's index does not match its position.
    #[error("time slot at position {position} has index {index}")]
    SlotIndexMismatch { position: usize, index: usize },

    /// A slot ends at or before its start.
    #[error("time slot {index} has invalid interval [{start}, {end})")]
    InvalidSlot { index: usize, start: i64, end: i64 },

    /// A slot does not start where the previous one ended.
    #[error("time slot {index} is not contiguous with its predecessor")]
    NonContiguousSlots { index: usize },

    /// Slot lengths differ across the horizon.
    #[error("time slot {index} lasts {found} minutes, expected {expected}")]
    NonUniformGranularity {
        index: usize,
        expected: i64,
        found: i64,
    },

    /// Uniform slots would run past the largest representable minute.
    #[error("{count} slots of {granularity} minutes starting at minute {start_minute} overflow the time axis")]
    HorizonOverflow {
        start_minute: i64,
        granularity: i64,
        count: usize,
    },

    /// Two entities of the same kind share an identifier.
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    /// A flight's earliest departure is after its latest departure.
    #[error("flight '{flight}' has inverted window [{start}, {end}]")]
    InvertedWindow { flight: String, start: i64, end: i64 },

    /// A flight priority is not a positive finite number.
    #[error("flight '{flight}' has invalid priority {priority}")]
    InvalidPriority { flight: String, priority: f64 },

    /// A flight duration is not positive.
    #[error("flight '{flight}' has non-positive duration {duration} minutes")]
    InvalidDuration { flight: String, duration: i64 },

    /// A flight lasts longer than the whole horizon.
    #[error("flight '{flight}' lasts {duration} minutes, longer than the {span}-minute horizon")]
    DurationExceedsHorizon {
        flight: String,
        duration: i64,
        span: i64,
    },

    /// A slot range ends before it starts.
    #[error("{kind} '{id}' has inverted slot range {range}")]
    InvertedRange {
        kind: &'static str,
        id: String,
        range: SlotRange,
    },

    /// A slot range reaches past the end of the horizon.
    #[error("{kind} '{id}' range {range} falls outside a horizon of {horizon_len} slots")]
    RangeOutsideHorizon {
        kind: &'static str,
        id: String,
        range: SlotRange,
        horizon_len: usize,
    },

    /// Two maintenance windows of the same aircraft intersect.
    #[error("aircraft '{aircraft}' has overlapping maintenance windows {first} and {second}")]
    OverlappingMaintenance {
        aircraft: String,
        first: SlotRange,
        second: SlotRange,
    },

    /// A numeric field is negative or not finite.
    #[error("{kind} '{id}' has invalid {field} {value}")]
    InvalidValue {
        kind: &'static str,
        id: String,
        field: &'static str,
        value: f64,
    },

    /// Duty hours already worked exceed the crew limit.
    #[error("crew '{crew}' has worked {used} hours, above the limit of {max}")]
    DutyHoursExceeded { crew: String, used: f64, max: f64 },

    /// Standard (overtime-free) duty hours exceed the hard limit.
    #[error("crew '{crew}' has standard duty hours {standard} above the limit of {max}")]
    StandardAboveMax {
        crew: String,
        standard: f64,
        max: f64,
    },

    /// A record refers to an entity that is not in the catalog.
    #[error("{referenced_by} references unknown {kind} '{id}'")]
    UnknownReference {
        kind: &'static str,
        id: String,
        referenced_by: String,
    },

    /// A flight's original slot is not part of the horizon.
    #[error("flight '{flight}' was originally scheduled in slot {slot}, outside a horizon of {horizon_len} slots")]
    SlotOutOfHorizon {
        flight: String,
        slot: usize,
        horizon_len: usize,
    },
}

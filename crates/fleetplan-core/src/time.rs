//! Discrete planning horizon.
//!
//! Time is measured in whole minutes from an arbitrary origin (typically
//! midnight of the planning day). The horizon is a contiguous sequence of
//! equally long time slots; every scheduling decision is made at slot
//! granularity.

use std::fmt;
use std::ops::Range;

use crate::error::DataValidationError;

/// A half-open range of slot indices `[start, end)`.
///
/// Empty ranges (`start == end`) are valid and describe "no slots", e.g. a
/// crew member who is unavailable for the whole horizon.
///
/// # Example
///
/// ```
/// use fleetplan_core::SlotRange;
///
/// let maintenance = SlotRange::new(4, 7);
/// assert_eq!(maintenance.len(), 3);
/// assert!(maintenance.contains(6));
/// assert!(!maintenance.contains(7));
/// assert!(maintenance.intersects(&SlotRange::new(6, 9)));
/// assert!(!maintenance.intersects(&SlotRange::new(7, 9)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotRange {
    /// First slot in the range (inclusive).
    pub start: usize,
    /// One past the last slot in the range (exclusive).
    pub end: usize,
}

impl SlotRange {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The empty range.
    pub const fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    /// A range covering `len` slots starting at `start`.
    pub const fn starting_at(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start.saturating_add(len),
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns true if `end < start`.
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.start <= slot && slot < self.end
    }

    /// Returns true if every slot of `other` lies in `self`.
    ///
    /// The empty range is contained in every range.
    pub fn contains_range(&self, other: &SlotRange) -> bool {
        other.is_empty() || (self.start <= other.start && other.end <= self.end)
    }

    /// Returns true if the two ranges share at least one slot.
    pub fn intersects(&self, other: &SlotRange) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }

    /// Smallest range covering both ranges.
    pub fn hull(&self, other: &SlotRange) -> SlotRange {
        SlotRange::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Clips the range so that it ends no later than `len`.
    pub fn clip(&self, len: usize) -> SlotRange {
        SlotRange::new(self.start.min(len), self.end.min(len))
    }

    pub fn iter(&self) -> Range<usize> {
        self.start..self.end.max(self.start)
    }
}

impl fmt::Display for SlotRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// One discrete time slot `[start_minute, end_minute)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSlot {
    pub index: usize,
    pub start_minute: i64,
    pub end_minute: i64,
}

impl TimeSlot {
    pub fn new(index: usize, start_minute: i64, end_minute: i64) -> Self {
        Self {
            index,
            start_minute,
            end_minute,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end_minute.saturating_sub(self.start_minute)
    }
}

/// The ordered, contiguous, uniformly sized slots of one planning run.
///
/// # Example
///
/// ```
/// use fleetplan_core::Horizon;
///
/// // Eight one-hour slots starting at 06:00.
/// let horizon = Horizon::uniform(360, 60, 8).unwrap();
/// assert_eq!(horizon.len(), 8);
/// assert_eq!(horizon.granularity(), 60);
/// assert_eq!(horizon.slot_at(425), Some(1));
/// assert_eq!(horizon.slots_for_minutes(90), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<TimeSlot>", into = "Vec<TimeSlot>")
)]
pub struct Horizon {
    slots: Vec<TimeSlot>,
    granularity: i64,
}

impl Horizon {
    /// Validates and wraps a list of time slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, if slot indices do not match
    /// their positions, or if slots are not contiguous and uniformly sized.
    pub fn new(slots: Vec<TimeSlot>) -> Result<Self, DataValidationError> {
        let first = slots.first().ok_or(DataValidationError::EmptyHorizon)?;
        let granularity = first.duration_minutes();

        for (position, slot) in slots.iter().enumerate() {
            if slot.index != position {
                return Err(DataValidationError::SlotIndexMismatch {
                    position,
                    index: slot.index,
                });
            }
            if slot.end_minute <= slot.start_minute {
                return Err(DataValidationError::InvalidSlot {
                    index: slot.index,
                    start: slot.start_minute,
                    end: slot.end_minute,
                });
            }
            if slot.duration_minutes() != granularity {
                return Err(DataValidationError::NonUniformGranularity {
                    index: slot.index,
                    expected: granularity,
                    found: slot.duration_minutes(),
                });
            }
            if position > 0 && slots[position - 1].end_minute != slot.start_minute {
                return Err(DataValidationError::NonContiguousSlots { index: slot.index });
            }
        }

        Ok(Self { slots, granularity })
    }

    /// Builds `count` slots of `granularity` minutes starting at `start_minute`.
    ///
    /// # Errors
    ///
    /// Returns [`DataValidationError::HorizonOverflow`] if the last slot would
    /// end past `i64::MAX`, plus every error of [`Horizon::new`].
    pub fn uniform(
        start_minute: i64,
        granularity: i64,
        count: usize,
    ) -> Result<Self, DataValidationError> {
        let overflow = || DataValidationError::HorizonOverflow {
            start_minute,
            granularity,
            count,
        };
        let slots = (0..count)
            .map(|i| {
                let start = i64::try_from(i)
                    .ok()
                    .and_then(|i| granularity.checked_mul(i))
                    .and_then(|offset| start_minute.checked_add(offset))
                    .ok_or_else(overflow)?;
                let end = start.checked_add(granularity).ok_or_else(overflow)?;
                Ok(TimeSlot::new(i, start, end))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(slots)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false for a validated horizon.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&TimeSlot> {
        self.slots.get(index)
    }

    /// Length of every slot in minutes.
    pub fn granularity(&self) -> i64 {
        self.granularity
    }

    /// First minute of the horizon.
    pub fn start_minute(&self) -> i64 {
        self.slots[0].start_minute
    }

    /// Minute at which the horizon ends (exclusive).
    pub fn end_minute(&self) -> i64 {
        self.slots[self.slots.len() - 1].end_minute
    }

    /// Minutes between horizon start and horizon end.
    pub fn span_minutes(&self) -> i64 {
        self.end_minute().saturating_sub(self.start_minute())
    }

    /// Range covering every slot.
    pub fn full_range(&self) -> SlotRange {
        SlotRange::new(0, self.slots.len())
    }

    /// Returns the slot containing `minute`, if it lies inside the horizon.
    pub fn slot_at(&self, minute: i64) -> Option<usize> {
        if minute < self.start_minute() || minute >= self.end_minute() {
            return None;
        }
        Some(((minute - self.start_minute()) / self.granularity) as usize)
    }

    /// Number of whole slots needed to cover `minutes` (rounded up), capped
    /// at the horizon length.
    ///
    /// Non-positive durations need no slots.
    pub fn slots_for_minutes(&self, minutes: i64) -> usize {
        if minutes <= 0 {
            return 0;
        }
        let g = self.granularity;
        let whole = minutes / g + i64::from(minutes % g != 0);
        usize::try_from(whole).map_or(self.slots.len(), |n| n.min(self.slots.len()))
    }

    /// Minute interval `[start, end)` spanned by a non-empty slot range.
    ///
    /// Returns `None` for empty ranges or ranges outside the horizon.
    pub fn minutes_of(&self, range: SlotRange) -> Option<(i64, i64)> {
        if range.is_empty() || range.end > self.slots.len() {
            return None;
        }
        Some((
            self.slots[range.start].start_minute,
            self.slots[range.end - 1].end_minute,
        ))
    }
}

impl TryFrom<Vec<TimeSlot>> for Horizon {
    type Error = DataValidationError;

    fn try_from(slots: Vec<TimeSlot>) -> Result<Self, Self::Error> {
        Horizon::new(slots)
    }
}

impl From<Horizon> for Vec<TimeSlot> {
    fn from(horizon: Horizon) -> Self {
        horizon.slots
    }
}

//! Tests for horizon and slot ranges

use super::error::DataValidationError;
use super::time::*;

#[test]
fn test_uniform_horizon() {
    let horizon = Horizon::uniform(0, 30, 4).unwrap();
    assert_eq!(horizon.len(), 4);
    assert_eq!(horizon.granularity(), 30);
    assert_eq!(horizon.start_minute(), 0);
    assert_eq!(horizon.end_minute(), 120);
    assert_eq!(horizon.full_range(), SlotRange::new(0, 4));
}

#[test]
fn test_empty_horizon_rejected() {
    assert_eq!(Horizon::new(vec![]), Err(DataValidationError::EmptyHorizon));
}

#[test]
fn test_gap_between_slots_rejected() {
    let slots = vec![TimeSlot::new(0, 0, 60), TimeSlot::new(1, 70, 130)];
    assert_eq!(
        Horizon::new(slots),
        Err(DataValidationError::NonContiguousSlots { index: 1 })
    );
}

#[test]
fn test_non_uniform_slots_rejected() {
    let slots = vec![TimeSlot::new(0, 0, 60), TimeSlot::new(1, 60, 90)];
    assert_eq!(
        Horizon::new(slots),
        Err(DataValidationError::NonUniformGranularity {
            index: 1,
            expected: 60,
            found: 30
        })
    );
}

#[test]
fn test_out_of_order_index_rejected() {
    let slots = vec![TimeSlot::new(1, 0, 60), TimeSlot::new(0, 60, 120)];
    assert!(matches!(
        Horizon::new(slots),
        Err(DataValidationError::SlotIndexMismatch {
            position: 0,
            index: 1
        })
    ));
}

#[test]
fn test_slot_lookup() {
    let horizon = Horizon::uniform(120, 60, 3).unwrap();
    assert_eq!(horizon.slot_at(119), None);
    assert_eq!(horizon.slot_at(120), Some(0));
    assert_eq!(horizon.slot_at(299), Some(2));
    assert_eq!(horizon.slot_at(300), None);
    assert_eq!(horizon.minutes_of(SlotRange::new(1, 3)), Some((180, 300)));
    assert_eq!(horizon.minutes_of(SlotRange::new(1, 1)), None);
}

#[test]
fn test_slots_for_minutes_rounds_up() {
    let horizon = Horizon::uniform(0, 60, 4).unwrap();
    assert_eq!(horizon.slots_for_minutes(0), 0);
    assert_eq!(horizon.slots_for_minutes(1), 1);
    assert_eq!(horizon.slots_for_minutes(60), 1);
    assert_eq!(horizon.slots_for_minutes(61), 2);
}

#[test]
fn test_slots_for_minutes_capped_at_horizon() {
    let horizon = Horizon::uniform(0, 60, 4).unwrap();
    assert_eq!(horizon.slots_for_minutes(240), 4);
    assert_eq!(horizon.slots_for_minutes(241), 4);
    assert_eq!(horizon.slots_for_minutes(i64::MAX), 4);
    assert_eq!(horizon.slots_for_minutes(i64::MIN), 0);
    assert_eq!(horizon.span_minutes(), 240);
}

#[test]
fn test_uniform_horizon_overflow() {
    let err = Horizon::uniform(i64::MAX - 100, 60, 4).unwrap_err();
    assert_eq!(
        err,
        DataValidationError::HorizonOverflow {
            start_minute: i64::MAX - 100,
            granularity: 60,
            count: 4,
        }
    );
    assert!(Horizon::uniform(i64::MAX - 120, 60, 2).is_ok());
}

#[test]
fn test_range_relations() {
    let outer = SlotRange::new(2, 8);
    assert!(outer.contains_range(&SlotRange::new(2, 8)));
    assert!(outer.contains_range(&SlotRange::new(3, 3)));
    assert!(!outer.contains_range(&SlotRange::new(7, 9)));
    assert!(!SlotRange::new(3, 3).intersects(&outer));
    assert_eq!(outer.hull(&SlotRange::new(9, 10)), SlotRange::new(2, 10));
    assert_eq!(outer.clip(5), SlotRange::new(2, 5));
    assert!(SlotRange::new(4, 2).is_inverted());
    assert_eq!(SlotRange::new(4, 2).iter().count(), 0);
}

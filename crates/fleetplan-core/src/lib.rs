//! fleetplan Core - Entity catalog for airline disruption re-planning
//!
//! This crate provides the immutable input side of the planner:
//! - Time slots and the discrete planning horizon
//! - Flights, aircraft and crew with availability, maintenance and duty data
//! - The validated `Catalog` that owns every entity for one scenario run
//! - Disruptions that derive a new catalog from an existing one

pub mod catalog;
pub mod disruption;
pub mod domain;
pub mod error;
pub mod time;

#[cfg(test)]
mod time_tests;

pub use catalog::Catalog;
pub use disruption::Disruption;
pub use domain::{Aircraft, Crew, Flight, OriginalAssignment};
pub use error::DataValidationError;
pub use time::{Horizon, SlotRange, TimeSlot};

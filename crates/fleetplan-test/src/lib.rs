//! Shared test fixtures for fleetplan crates.
//!
//! - [`fixtures`] - Hourly horizons and catalog builders
//! - [`enumeration`] - Exhaustive backend for small models
//! - [`scripted`] - Backend returning canned outcomes
//!
//! # Usage
//!
//! Add as a dev-dependency in your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! fleetplan-test = { workspace = true }
//! ```
//!
//! Then import the fixtures you need:
//!
//! ```ignore
//! use fleetplan_test::fixtures::{aircraft, crew, flight, ScenarioBuilder};
//! use fleetplan_test::EnumerationBackend;
//! ```

pub mod enumeration;
pub mod fixtures;
pub mod scripted;

pub use enumeration::{complete_values, EnumerationBackend};
pub use fixtures::ScenarioBuilder;
pub use scripted::ScriptedBackend;

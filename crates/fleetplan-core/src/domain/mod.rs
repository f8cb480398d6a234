//! Planning entities
//!
//! These types are the immutable inputs of one scenario run:
//! - `Flight`: a leg to be flown inside a departure window
//! - `Aircraft`: a tail with certification, availability and maintenance data
//! - `Crew`: a crew pairing with qualifications and duty-hour limits

mod aircraft;
mod crew;
mod flight;

pub use aircraft::Aircraft;
pub use crew::Crew;
pub use flight::{Flight, OriginalAssignment};

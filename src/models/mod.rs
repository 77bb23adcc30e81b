//! Defines the data structures and models used throughout the application.
//!
//! This includes the static region catalog, structures representing data fetched
//! from the weather API, and the rows stored in the raw and curated tables.

mod region;
mod weather;

pub use region::*;
pub use weather::*;

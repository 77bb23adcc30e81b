//! The two batch stages of the pipeline.
//!
//! - `extract`: weather API -> raw store, isolating failures per region.
//! - `transform`: raw store -> curated store, all-or-nothing per run.
//!
//! Neither stage triggers the other.

mod extract;
mod transform;

pub use extract::*;
pub use transform::*;

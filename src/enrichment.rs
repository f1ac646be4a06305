//! Boundary to the slow, fallible collaborators: geocoding and editorial copy.
//!
//! Nothing here may fail a run. Every error is logged and the event keeps what it had.

pub mod cache;
pub mod editorial;
pub mod enricher;
pub mod location;
pub mod model;

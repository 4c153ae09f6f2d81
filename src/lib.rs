//! indent-router core
//!
//! Geocodes an indent's stops, orders them into a single-vehicle tour from
//! the pickup depot, and projects estimated arrival times.

pub mod traits;
pub mod model;
pub mod config;
pub mod nominatim;
pub mod geocode;
pub mod haversine;
pub mod solver;
pub mod schedule;
pub mod maps;
pub mod store;
pub mod orchestrator;

//! Test fixtures for indent-router.
//!
//! Provides in-memory collaborators:
//! - A geocoder backed by a fixed address book
//! - An indent source over a Vec
//! - Trip recorders that keep or reject summaries

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;

use indent_router::haversine::EARTH_RADIUS_KM;
use indent_router::model::{DueWindow, GeocodeCandidate, Indent, TripSummary};
use indent_router::nominatim::GeocodeError;
use indent_router::store::StoreError;
use indent_router::traits::{Geocoder, IndentSource, TripRecorder};
use jiff::Timestamp;

/// Latitude/longitude `km` kilometers due north of `origin`.
pub fn north_of(origin: (f64, f64), km: f64) -> (f64, f64) {
    let degrees = (km / EARTH_RADIUS_KM).to_degrees();
    (origin.0 + degrees, origin.1)
}

pub const BENGALURU: (f64, f64) = (12.9716, 77.5946);

/// Answers lookups from a fixed table; unknown addresses get no candidates.
#[derive(Default)]
pub struct AddressBook {
    entries: HashMap<String, (f64, f64)>,
    queries: RefCell<Vec<String>>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, address: &str, location: (f64, f64)) -> Self {
        self.entries.insert(address.to_string(), location);
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl Geocoder for AddressBook {
    fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        self.queries.borrow_mut().push(query.to_string());
        Ok(self
            .entries
            .get(query)
            .map(|(lat, lon)| GeocodeCandidate {
                lat: lat.to_string(),
                lon: lon.to_string(),
                display_name: Some(query.to_string()),
            })
            .into_iter()
            .collect())
    }
}

/// Serves indents in the given order and remembers the requested windows.
#[derive(Default)]
pub struct VecSource {
    pub indents: Vec<Indent>,
    pub windows: RefCell<Vec<DueWindow>>,
}

impl VecSource {
    pub fn new(indents: Vec<Indent>) -> Self {
        Self {
            indents,
            windows: RefCell::new(Vec::new()),
        }
    }
}

impl IndentSource for VecSource {
    fn fetch_due(&self, window: &DueWindow) -> Result<Vec<Indent>, StoreError> {
        self.windows.borrow_mut().push(*window);
        Ok(self.indents.iter().take(window.limit).cloned().collect())
    }
}

/// Keeps every saved summary.
#[derive(Default)]
pub struct MemoryRecorder {
    pub saved: RefCell<Vec<TripSummary>>,
}

impl TripRecorder for MemoryRecorder {
    fn save(&self, summary: &TripSummary) -> Result<(), StoreError> {
        self.saved.borrow_mut().push(summary.clone());
        Ok(())
    }
}

/// Rejects every write.
#[derive(Default)]
pub struct FailingRecorder {
    pub attempts: RefCell<usize>,
}

impl TripRecorder for FailingRecorder {
    fn save(&self, _summary: &TripSummary) -> Result<(), StoreError> {
        *self.attempts.borrow_mut() += 1;
        Err(StoreError::Corrupt("disk full".to_string()))
    }
}

pub fn indent(id: &str, pickup: &str, drops: &[&str], exit_time: Option<Timestamp>) -> Indent {
    Indent {
        indent_id: id.to_string(),
        vehicle: "KA01AB1234".to_string(),
        pickup: pickup.to_string(),
        drops: drops.iter().map(|d| d.to_string()).collect(),
        exit_time,
    }
}

pub fn exit_time() -> Timestamp {
    "2026-03-02T03:30:00Z".parse().expect("valid timestamp")
}

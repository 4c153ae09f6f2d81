//! Collaborator seams for the routing pipeline.
//!
//! These are intentionally narrow. The geocoding service, the indent store and
//! the trip log are all external; concrete apps plug in their own backends.

use std::time::Duration;

use crate::haversine::DistanceMatrix;
use crate::model::{Coordinate, DueWindow, GeocodeCandidate, Indent, TripSummary};
use crate::nominatim::GeocodeError;
use crate::store::StoreError;

/// Free-text address lookup against a geocoding service.
pub trait Geocoder {
    /// Runs one lookup for `query`, limited to a single candidate.
    ///
    /// An empty result set is `Ok(vec![])`, not an error.
    fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError>;
}

/// Provides a distance matrix for a set of possibly unresolved coordinates.
///
/// The matrix is indexed by the provided coordinate order.
pub trait DistanceMatrixProvider {
    fn matrix_for(&self, coords: &[Option<Coordinate>]) -> DistanceMatrix;
}

/// Storage read contract: indents that are due for planning.
pub trait IndentSource {
    /// Returns up to `window.limit` indents dated within the window, newest first.
    fn fetch_due(&self, window: &DueWindow) -> Result<Vec<Indent>, StoreError>;
}

/// Storage write contract: one summary row per planned indent.
pub trait TripRecorder {
    fn save(&self, summary: &TripSummary) -> Result<(), StoreError>;
}

/// Blocking pause between geocoding calls.
pub trait Delay {
    fn wait(&self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleep;

impl Delay for ThreadSleep {
    fn wait(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Returns immediately. Used for tests and dry runs against a local geocoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Delay for NoDelay {
    fn wait(&self, _duration: Duration) {}
}

impl<T: Geocoder + ?Sized> Geocoder for &T {
    fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        (**self).search(query)
    }
}

impl<T: Delay + ?Sized> Delay for &T {
    fn wait(&self, duration: Duration) {
        (**self).wait(duration);
    }
}

impl<T: IndentSource + ?Sized> IndentSource for &T {
    fn fetch_due(&self, window: &DueWindow) -> Result<Vec<Indent>, StoreError> {
        (**self).fetch_due(window)
    }
}

impl<T: TripRecorder + ?Sized> TripRecorder for &T {
    fn save(&self, summary: &TripSummary) -> Result<(), StoreError> {
        (**self).save(summary)
    }
}

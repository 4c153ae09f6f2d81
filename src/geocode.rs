//! Address resolution with bounded retries.
//!
//! Geocoding failures never reach the caller as errors: an address that cannot
//! be resolved within the attempt budget comes back as `None` and is logged.

use std::time::Duration;

use tracing::{debug, warn};

use crate::model::Coordinate;
use crate::traits::{Delay, Geocoder, ThreadSleep};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Lookup attempts per address.
    pub max_retries: u32,
    /// Pause after each failed attempt.
    pub retry_delay: Duration,
    /// Pause after each address, resolved or not, to stay under the
    /// upstream rate limit.
    pub courtesy_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
            courtesy_delay: Duration::from_secs(1),
        }
    }
}

pub struct GeoResolver<G, D = ThreadSleep> {
    geocoder: G,
    delay: D,
    policy: RetryPolicy,
}

impl<G: Geocoder> GeoResolver<G> {
    pub fn new(geocoder: G, policy: RetryPolicy) -> Self {
        Self::with_delay(geocoder, ThreadSleep, policy)
    }
}

impl<G: Geocoder, D: Delay> GeoResolver<G, D> {
    pub fn with_delay(geocoder: G, delay: D, policy: RetryPolicy) -> Self {
        Self {
            geocoder,
            delay,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Resolves one address, taking the first usable candidate.
    ///
    /// Worst case wall-clock cost is `max_retries * retry_delay` plus the
    /// lookups themselves.
    pub fn resolve(&self, address: &str) -> Option<Coordinate> {
        if address.trim().is_empty() {
            warn!("geocode skipped for empty address");
            return None;
        }

        for attempt in 1..=self.policy.max_retries {
            match self.geocoder.search(address) {
                Ok(candidates) => {
                    if let Some(coord) = candidates.first().and_then(|c| c.coordinate()) {
                        debug!(address, attempt, lat = coord.lat(), lon = coord.lon(), "geocoded");
                        return Some(coord);
                    }
                    debug!(address, attempt, "geocode attempt returned no usable result");
                }
                Err(err) => {
                    debug!(address, attempt, error = %err, "geocode attempt failed");
                }
            }
            self.delay.wait(self.policy.retry_delay);
        }

        warn!(address, attempts = self.policy.max_retries, "geocode failed");
        None
    }

    /// Resolves every address in order, pausing after each one.
    pub fn resolve_all(&self, addresses: &[String]) -> Vec<Option<Coordinate>> {
        addresses
            .iter()
            .map(|address| {
                let coord = self.resolve(address);
                self.delay.wait(self.policy.courtesy_delay);
                coord
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use super::*;
    use crate::model::GeocodeCandidate;
    use crate::nominatim::GeocodeError;

    /// Replays scripted responses and counts calls.
    struct ScriptedGeocoder {
        responses: RefCell<VecDeque<Result<Vec<GeocodeCandidate>, GeocodeError>>>,
        calls: RefCell<usize>,
    }

    impl ScriptedGeocoder {
        fn new(responses: Vec<Result<Vec<GeocodeCandidate>, GeocodeError>>) -> Self {
            Self {
                responses: RefCell::new(responses.into()),
                calls: RefCell::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.borrow()
        }
    }

    impl Geocoder for ScriptedGeocoder {
        fn search(&self, _query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
            *self.calls.borrow_mut() += 1;
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    #[derive(Default)]
    struct RecordingDelay {
        waits: RefCell<Vec<Duration>>,
    }

    impl Delay for RecordingDelay {
        fn wait(&self, duration: Duration) {
            self.waits.borrow_mut().push(duration);
        }
    }

    fn candidate(lat: &str, lon: &str) -> GeocodeCandidate {
        GeocodeCandidate {
            lat: lat.to_string(),
            lon: lon.to_string(),
            display_name: None,
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            retry_delay: Duration::from_millis(10),
            courtesy_delay: Duration::from_millis(20),
        }
    }

    #[test]
    fn test_first_valid_result_wins() {
        let geocoder = ScriptedGeocoder::new(vec![Ok(vec![candidate("19.07", "72.87")])]);
        let delay = RecordingDelay::default();
        let resolver = GeoResolver::with_delay(&geocoder, &delay, policy());

        let coord = resolver.resolve("Mumbai").expect("resolved");
        assert_eq!(coord.lat(), 19.07);
        assert_eq!(geocoder.calls(), 1);
        assert!(delay.waits.borrow().is_empty(), "success should not wait");
    }

    #[test]
    fn test_retries_after_failure_then_succeeds() {
        let geocoder = ScriptedGeocoder::new(vec![
            Err(GeocodeError::Status(reqwest::StatusCode::SERVICE_UNAVAILABLE)),
            Ok(vec![]),
            Ok(vec![candidate("12.97", "77.59")]),
        ]);
        let delay = RecordingDelay::default();
        let resolver = GeoResolver::with_delay(&geocoder, &delay, policy());

        assert!(resolver.resolve("Bengaluru").is_some());
        assert_eq!(geocoder.calls(), 3);
        assert_eq!(*delay.waits.borrow(), vec![Duration::from_millis(10); 2]);
    }

    #[test]
    fn test_out_of_range_result_is_retried() {
        let geocoder = ScriptedGeocoder::new(vec![
            Ok(vec![candidate("95.0", "10.0")]),
            Ok(vec![candidate("45.0", "10.0")]),
        ]);
        let resolver = GeoResolver::with_delay(&geocoder, crate::traits::NoDelay, policy());

        let coord = resolver.resolve("Somewhere").expect("second attempt is valid");
        assert_eq!(coord.lat(), 45.0);
        assert_eq!(geocoder.calls(), 2);
    }

    #[test]
    fn test_exhausted_attempts_yield_none() {
        let geocoder = ScriptedGeocoder::new(vec![]);
        let delay = RecordingDelay::default();
        let resolver = GeoResolver::with_delay(&geocoder, &delay, policy());

        assert!(resolver.resolve("Nowhere").is_none());
        assert_eq!(geocoder.calls(), 3);
        assert_eq!(delay.waits.borrow().len(), 3);
    }

    #[test]
    fn test_empty_address_skips_lookup() {
        let geocoder = ScriptedGeocoder::new(vec![]);
        let resolver = GeoResolver::with_delay(&geocoder, crate::traits::NoDelay, policy());

        assert!(resolver.resolve("   ").is_none());
        assert_eq!(geocoder.calls(), 0);
    }

    #[test]
    fn test_resolve_all_pauses_after_every_address() {
        let geocoder = ScriptedGeocoder::new(vec![
            Ok(vec![candidate("1.0", "1.0")]),
            Ok(vec![candidate("2.0", "2.0")]),
        ]);
        let delay = RecordingDelay::default();
        let resolver = GeoResolver::with_delay(&geocoder, &delay, policy());

        let coords = resolver.resolve_all(&["A".to_string(), "B".to_string()]);
        assert_eq!(coords.len(), 2);
        assert!(coords.iter().all(Option::is_some));
        assert_eq!(*delay.waits.borrow(), vec![Duration::from_millis(20); 2]);
    }
}

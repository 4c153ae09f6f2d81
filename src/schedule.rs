//! Estimated-arrival projection for a planned route.
//!
//! Travel time is distance over a constant average speed. Arrivals are
//! cumulative from the exit time and expressed in the target time zone.

use jiff::tz::TimeZone;
use jiff::{SignedDuration, Timestamp, Zoned};

use crate::haversine::DistanceMatrix;
use crate::solver::Tour;

/// Average driving speed assumption for time estimation.
pub const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Zone used for arrival times unless configured otherwise.
pub const DEFAULT_TIME_ZONE: &str = "Asia/Kolkata";

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("unknown time zone {name:?}: {source}")]
    UnknownTimeZone {
        name: String,
        #[source]
        source: jiff::Error,
    },

    #[error("average speed must be positive, got {0} km/h")]
    InvalidSpeed(f64),

    #[error("arrival time out of range: {0}")]
    OutOfRange(#[from] jiff::Error),
}

/// Arrival times for a route plus its length.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    /// One entry per visited position, depot first.
    pub arrivals: Vec<Zoned>,
    /// Sum of leg distances, rounded to 2 decimals.
    pub total_distance_km: f64,
}

#[derive(Debug, Clone)]
pub struct ScheduleProjector {
    avg_speed_kmh: f64,
    zone: TimeZone,
}

impl ScheduleProjector {
    pub fn new(avg_speed_kmh: f64, zone: TimeZone) -> Result<Self, ScheduleError> {
        if !(avg_speed_kmh.is_finite() && avg_speed_kmh > 0.0) {
            return Err(ScheduleError::InvalidSpeed(avg_speed_kmh));
        }
        Ok(Self { avg_speed_kmh, zone })
    }

    /// Looks the zone up by IANA name, e.g. `Asia/Kolkata`.
    pub fn for_zone_name(avg_speed_kmh: f64, name: &str) -> Result<Self, ScheduleError> {
        let zone = TimeZone::get(name).map_err(|source| ScheduleError::UnknownTimeZone {
            name: name.to_string(),
            source,
        })?;
        Self::new(avg_speed_kmh, zone)
    }

    pub fn zone(&self) -> &TimeZone {
        &self.zone
    }

    pub fn avg_speed_kmh(&self) -> f64 {
        self.avg_speed_kmh
    }

    pub fn localize(&self, timestamp: Timestamp) -> Zoned {
        timestamp.to_zoned(self.zone.clone())
    }

    /// Walks the tour leg by leg, accumulating travel hours.
    ///
    /// Offsets are rounded to whole seconds before they are added to `start`.
    pub fn project(
        &self,
        tour: &Tour,
        matrix: &DistanceMatrix,
        start: Timestamp,
    ) -> Result<Projection, ScheduleError> {
        let mut arrivals = Vec::with_capacity(tour.len());
        if tour.is_empty() {
            return Ok(Projection {
                arrivals,
                total_distance_km: 0.0,
            });
        }

        arrivals.push(self.localize(start));
        let mut cumulative_hours = 0.0;

        for (from, to) in tour.legs() {
            let km = matrix.get(from, to);
            if km > 0.0 {
                cumulative_hours += km / self.avg_speed_kmh;
            }
            let offset = SignedDuration::from_secs((cumulative_hours * 3600.0).round() as i64);
            arrivals.push(self.localize(start.checked_add(offset)?));
        }

        Ok(Projection {
            arrivals,
            total_distance_km: round2(tour.distance_km(matrix)),
        })
    }

    /// Every stop "arrives" at `start`. Used when the route is not optimized.
    pub fn flat(&self, stops: usize, start: Timestamp) -> Vec<Zoned> {
        vec![self.localize(start); stops]
    }

    /// Trip duration in hours at the average speed, rounded to 2 decimals.
    pub fn duration_hours(&self, total_distance_km: f64) -> f64 {
        round2(total_distance_km / self.avg_speed_kmh)
    }
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

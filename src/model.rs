//! Data carried through the per-indent pipeline.

use jiff::civil::Date;
use jiff::{Timestamp, ToSpan, Zoned};
use serde::{Deserialize, Serialize};

/// Driver name recorded for trips planned by this engine.
pub const AUTO_DRIVER: &str = "AUTO-DRIVER";

/// A resolved location. Construct through [`Coordinate::new`] so the range
/// checks always hold; unresolved locations are `None`, never `(0.0, 0.0)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Returns `None` unless both values are finite and within
    /// latitude [-90, 90] and longitude [-180, 180].
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        valid.then_some(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// One match from the geocoding service. Values arrive as numeric text.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl GeocodeCandidate {
    /// Parses the candidate into a range-checked coordinate.
    pub fn coordinate(&self) -> Option<Coordinate> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Coordinate::new(lat, lon)
    }
}

/// A transport request: one pickup (the depot) and its drops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indent {
    pub indent_id: String,
    pub vehicle: String,
    pub pickup: String,
    pub drops: Vec<String>,
    /// Departure from the pickup. `None` means "now" at planning time.
    pub exit_time: Option<Timestamp>,
}

impl Indent {
    /// Splits a comma-separated drop list, trimming and skipping blanks.
    pub fn parse_drops(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|drop| !drop.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// The node list: pickup at index 0, then drops in their original order.
    pub fn addresses(&self) -> Vec<String> {
        std::iter::once(self.pickup.clone())
            .chain(self.drops.iter().cloned())
            .collect()
    }
}

/// Date range and cap for the "due indents" query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    pub from: Date,
    pub to: Date,
    pub limit: usize,
}

impl DueWindow {
    /// A window of `days` calendar days ending on (and including) `today`.
    ///
    /// `days` of 2 gives [yesterday, today]; 0 is treated as 1.
    pub fn ending(today: Date, days: u32, limit: usize) -> Self {
        let back = i64::from(days.max(1) - 1);
        let from = today.checked_sub(back.days()).unwrap_or(Date::MIN);
        Self {
            from,
            to: today,
            limit,
        }
    }
}

/// Why an indent was planned without the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Degraded {
    /// At most one address could be geocoded.
    UnresolvedAddresses { unresolved: usize, total: usize },
    /// The solver returned no tour.
    NoSolution,
}

/// The persisted summary for one planned indent.
///
/// Written once by the planner; `actual_arrival` and `pod_url` belong to the
/// trip-tracking side and stay empty here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripSummary {
    pub indent_id: String,
    pub vehicle: String,
    pub driver_name: String,
    pub pickup: String,
    /// Drops in their original order, joined with ", ".
    pub drop_location: String,
    pub total_drops: usize,
    pub exit_time: Timestamp,
    pub eta_arrival: Zoned,
    pub actual_arrival: Option<Timestamp>,
    pub total_distance_km: f64,
    pub duration_hours: f64,
    pub pod_url: Option<String>,
    pub created_at: Timestamp,
}

/// The per-indent payload handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndentResult {
    pub indent_id: String,
    pub vehicle: String,
    pub pickup: String,
    pub realized_route: Vec<String>,
    pub total_distance_km: f64,
    pub estimated_arrivals: Vec<Zoned>,
    pub map_link: String,
    pub exit_time: Zoned,
    /// Geocoding outcome per node, pickup first.
    pub coordinates: Vec<Option<Coordinate>>,
    pub degraded: Option<Degraded>,
}

/// A single indent that could not be planned.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndentFailure {
    pub indent_id: String,
    pub error: String,
}

/// Outcome of one orchestration pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub results: Vec<IndentResult>,
    pub failures: Vec<IndentFailure>,
}

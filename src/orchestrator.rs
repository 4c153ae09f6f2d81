//! Per-indent route planning pipeline.
//!
//! For each due indent: resolve addresses, build the distance matrix, solve the
//! tour, project arrival times, persist a trip summary and hand back the
//! presentation payload. Indents run one after another; a failure in one is
//! recorded and the batch moves on.

use jiff::civil::Date;
use jiff::Timestamp;
use tracing::{error, info, info_span, warn};

use crate::geocode::GeoResolver;
use crate::haversine::HaversineMatrix;
use crate::maps::directions_link;
use crate::model::{
    AUTO_DRIVER, BatchReport, Degraded, DueWindow, Indent, IndentFailure, IndentResult, TripSummary,
};
use crate::schedule::{DEFAULT_SPEED_KMH, DEFAULT_TIME_ZONE, ScheduleError, ScheduleProjector};
use crate::solver::{SolveOptions, solve};
use crate::store::StoreError;
use crate::traits::{Delay, DistanceMatrixProvider, Geocoder, IndentSource, ThreadSleep, TripRecorder};

#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Maximum indents per pass.
    pub batch_size: usize,
    /// Calendar days, ending today, an indent's date must fall in.
    pub window_days: u32,
    pub avg_speed_kmh: f64,
    /// IANA zone for arrival times and for deciding what "today" is.
    pub time_zone: String,
    pub solve: SolveOptions,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            batch_size: 5,
            window_days: 2,
            avg_speed_kmh: DEFAULT_SPEED_KMH,
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            solve: SolveOptions::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndentError {
    #[error("indent {indent_id} has no pickup address")]
    MissingPickup { indent_id: String },

    #[error("indent {indent_id}: {source}")]
    Schedule {
        indent_id: String,
        #[source]
        source: ScheduleError,
    },
}

/// Route, distance and arrivals before they are persisted.
struct PlannedRoute {
    route: Vec<String>,
    total_distance_km: f64,
    arrivals: Vec<jiff::Zoned>,
    degraded: Option<Degraded>,
}

pub struct RouteOrchestrator<G, S, R, D = ThreadSleep> {
    resolver: GeoResolver<G, D>,
    source: S,
    recorder: R,
    matrix: HaversineMatrix,
    projector: ScheduleProjector,
    options: OrchestratorOptions,
}

impl<G, S, R, D> RouteOrchestrator<G, S, R, D>
where
    G: Geocoder,
    S: IndentSource,
    R: TripRecorder,
    D: Delay,
{
    /// Fails only when the configured zone or speed is unusable.
    pub fn new(
        resolver: GeoResolver<G, D>,
        source: S,
        recorder: R,
        options: OrchestratorOptions,
    ) -> Result<Self, ScheduleError> {
        let projector = ScheduleProjector::for_zone_name(options.avg_speed_kmh, &options.time_zone)?;
        Ok(Self {
            resolver,
            source,
            recorder,
            matrix: HaversineMatrix,
            projector,
            options,
        })
    }

    /// Plans every indent due as of today in the configured zone.
    pub fn run_batch(&self) -> Result<BatchReport, StoreError> {
        let today = self.projector.localize(Timestamp::now()).date();
        self.run_batch_on(today)
    }

    /// Plans every indent due as of `today`.
    ///
    /// Only a failing read aborts the pass; per-indent errors land in
    /// [`BatchReport::failures`].
    pub fn run_batch_on(&self, today: Date) -> Result<BatchReport, StoreError> {
        let window = DueWindow::ending(today, self.options.window_days, self.options.batch_size);
        let indents = self.source.fetch_due(&window)?;
        info!(count = indents.len(), from = %window.from, to = %window.to, "fetched due indents");

        let mut report = BatchReport::default();
        for indent in &indents {
            match self.process(indent) {
                Ok(result) => report.results.push(result),
                Err(err) => {
                    error!(indent_id = %indent.indent_id, error = %err, "indent planning failed");
                    report.failures.push(IndentFailure {
                        indent_id: indent.indent_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Ok(report)
    }

    /// Runs the full pipeline for one indent and records its trip summary.
    pub fn process(&self, indent: &Indent) -> Result<IndentResult, IndentError> {
        let _span = info_span!("indent", indent_id = %indent.indent_id).entered();

        if indent.pickup.trim().is_empty() {
            return Err(IndentError::MissingPickup {
                indent_id: indent.indent_id.clone(),
            });
        }

        let exit_time = indent.exit_time.unwrap_or_else(Timestamp::now);
        let addresses = indent.addresses();
        let coordinates = self.resolver.resolve_all(&addresses);
        let unresolved = coordinates.iter().filter(|coord| coord.is_none()).count();

        // A lone pickup falls through to the solver's no-solution path.
        let too_few_resolved = addresses.len() >= 2 && unresolved >= addresses.len() - 1;

        let planned = if too_few_resolved {
            warn!(unresolved, total = addresses.len(), "too few resolved addresses, keeping input order");
            self.unoptimized(
                &addresses,
                exit_time,
                Degraded::UnresolvedAddresses {
                    unresolved,
                    total: addresses.len(),
                },
            )
        } else {
            let matrix = self.matrix.matrix_for(&coordinates);
            match solve(&matrix, &self.options.solve) {
                Some(tour) => {
                    let projection = self
                        .projector
                        .project(&tour, &matrix, exit_time)
                        .map_err(|source| IndentError::Schedule {
                            indent_id: indent.indent_id.clone(),
                            source,
                        })?;
                    PlannedRoute {
                        route: tour.nodes().iter().map(|&node| addresses[node].clone()).collect(),
                        total_distance_km: projection.total_distance_km,
                        arrivals: projection.arrivals,
                        degraded: None,
                    }
                }
                None => {
                    warn!("no tour found, keeping input order");
                    self.unoptimized(&addresses, exit_time, Degraded::NoSolution)
                }
            }
        };

        info!(
            total_distance_km = planned.total_distance_km,
            stops = planned.route.len(),
            degraded = planned.degraded.is_some(),
            "route planned"
        );

        let exit_local = self.projector.localize(exit_time);
        let summary = TripSummary {
            indent_id: indent.indent_id.clone(),
            vehicle: indent.vehicle.clone(),
            driver_name: AUTO_DRIVER.to_string(),
            pickup: indent.pickup.clone(),
            drop_location: indent.drops.join(", "),
            total_drops: indent.drops.len(),
            exit_time,
            eta_arrival: planned.arrivals.last().cloned().unwrap_or_else(|| exit_local.clone()),
            actual_arrival: None,
            total_distance_km: planned.total_distance_km,
            duration_hours: self.projector.duration_hours(planned.total_distance_km),
            pod_url: None,
            created_at: Timestamp::now(),
        };
        if let Err(err) = self.recorder.save(&summary) {
            error!(error = %err, "failed to save trip summary");
        }

        Ok(IndentResult {
            indent_id: indent.indent_id.clone(),
            vehicle: indent.vehicle.clone(),
            pickup: indent.pickup.clone(),
            map_link: directions_link(&planned.route),
            realized_route: planned.route,
            total_distance_km: planned.total_distance_km,
            estimated_arrivals: planned.arrivals,
            exit_time: exit_local,
            coordinates,
            degraded: planned.degraded,
        })
    }

    /// Input order, zero distance, every arrival at the exit time.
    fn unoptimized(&self, addresses: &[String], exit_time: Timestamp, reason: Degraded) -> PlannedRoute {
        PlannedRoute {
            route: addresses.to_vec(),
            total_distance_km: 0.0,
            arrivals: self.projector.flat(addresses.len(), exit_time),
            degraded: Some(reason),
        }
    }
}

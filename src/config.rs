//! Runtime configuration from the environment.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::geocode::RetryPolicy;
use crate::nominatim::NominatimConfig;
use crate::orchestrator::OrchestratorOptions;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub nominatim: NominatimConfig,
    pub retry: RetryPolicy,
    pub orchestrator: OrchestratorOptions,
    pub database_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            nominatim: NominatimConfig::default(),
            retry: RetryPolicy::default(),
            orchestrator: OrchestratorOptions::default(),
            database_path: PathBuf::from("indent-router.sqlite"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup. Unset keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let nominatim = NominatimConfig {
            base_url: lookup("NOMINATIM_URL").unwrap_or(defaults.nominatim.base_url),
            user_agent: lookup("NOMINATIM_USER_AGENT").unwrap_or(defaults.nominatim.user_agent),
            timeout_secs: parse_or(&lookup, "NOMINATIM_TIMEOUT_SECS", defaults.nominatim.timeout_secs)?,
        };

        let retry = RetryPolicy {
            max_retries: parse_or(&lookup, "GEOCODE_MAX_RETRIES", defaults.retry.max_retries)?,
            retry_delay: millis_or(&lookup, "GEOCODE_RETRY_DELAY_MS", defaults.retry.retry_delay)?,
            courtesy_delay: millis_or(
                &lookup,
                "GEOCODE_COURTESY_DELAY_MS",
                defaults.retry.courtesy_delay,
            )?,
        };

        let mut orchestrator = defaults.orchestrator;
        orchestrator.avg_speed_kmh = parse_or(&lookup, "ROUTE_AVG_SPEED_KMH", orchestrator.avg_speed_kmh)?;
        orchestrator.time_zone = lookup("ROUTE_TIME_ZONE").unwrap_or(orchestrator.time_zone);
        orchestrator.batch_size = parse_or(&lookup, "ROUTE_BATCH_SIZE", orchestrator.batch_size)?;
        orchestrator.window_days = parse_or(&lookup, "ROUTE_WINDOW_DAYS", orchestrator.window_days)?;
        orchestrator.solve.local_search_iterations = parse_or(
            &lookup,
            "ROUTE_LOCAL_SEARCH_ITERATIONS",
            orchestrator.solve.local_search_iterations,
        )?;

        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        Ok(Self {
            nominatim,
            retry,
            orchestrator,
            database_path,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        None => Ok(default),
    }
}

fn millis_or<F>(lookup: &F, key: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    parse_or(lookup, key, default_ms).map(Duration::from_millis)
}

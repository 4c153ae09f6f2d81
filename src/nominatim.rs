//! Nominatim HTTP adapter for address lookups.

use crate::model::GeocodeCandidate;
use crate::traits::Geocoder;

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("geocoding service returned {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Clone)]
pub struct NominatimConfig {
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying agent.
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: concat!("indent-router/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimClient {
    config: NominatimConfig,
    client: reqwest::blocking::Client,
}

impl NominatimClient {
    pub fn new(config: NominatimConfig) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self { config, client })
    }

    fn search_url(&self) -> String {
        format!("{}/search", self.config.base_url.trim_end_matches('/'))
    }
}

impl Geocoder for NominatimClient {
    fn search(&self, query: &str) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        let response = self
            .client
            .get(self.search_url())
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status));
        }

        Ok(response.json::<Vec<GeocodeCandidate>>()?)
    }
}

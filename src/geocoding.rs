//! Reverse geocoding client
//!
//! Resolves coordinates into a postal address through the Geoapify reverse
//! geocoding API. Without an API key the geocoder is disabled and never
//! resolves anything.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::GeocodingConfig;
use crate::errors::FleetError;

/// Resolve coordinates into an address
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Address at the given point, `None` when nothing is known there
    async fn reverse(&self, lat: f64, lng: f64) -> Result<Option<String>, FleetError>;
}

/// Geocoder used when no API key is configured
#[derive(Debug, Default, Clone)]
pub struct DisabledGeocoder;

#[async_trait]
impl ReverseGeocoder for DisabledGeocoder {
    async fn reverse(&self, _lat: f64, _lng: f64) -> Result<Option<String>, FleetError> {
        Ok(None)
    }
}

/// Builder for [`GeoapifyClient`]
pub struct GeoapifyClientBuilder {
    api_key: String,
    base_url: Option<String>,
    timeout: Option<Duration>,
}

pub struct GeoapifyClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeoapifyClientBuilder {
    const DEFAULT_BASE_URL: &'static str = "https://api.geoapify.com/v1/geocode/reverse";
    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            timeout: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Timeout of a whole request, connection included
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<GeoapifyClient, FleetError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(Self::DEFAULT_TIMEOUT))
            .build()?;
        Ok(GeoapifyClient {
            client,
            base_url: self
                .base_url
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string()),
            api_key: self.api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    formatted: Option<String>,
}

impl ReverseResponse {
    /// Formatted address of the first feature
    fn into_address(self) -> Option<String> {
        self.features
            .into_iter()
            .next()
            .and_then(|f| f.properties.formatted)
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
    }
}

#[async_trait]
impl ReverseGeocoder for GeoapifyClient {
    async fn reverse(&self, lat: f64, lng: f64) -> Result<Option<String>, FleetError> {
        debug!("Reverse geocoding lat={}, lng={}", lat, lng);
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("apiKey", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FleetError::Geocoding(format!(
                "geocoding service responded with {status}"
            )));
        }

        let body: ReverseResponse = response.json().await?;
        Ok(body.into_address())
    }
}

/// Geocoder for the configuration, disabled when no API key is set
pub fn from_config(config: &GeocodingConfig) -> Result<Arc<dyn ReverseGeocoder>, FleetError> {
    match config.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(api_key) => {
            info!("Reverse geocoding through {}", config.base_url);
            let client = GeoapifyClientBuilder::new(api_key)
                .base_url(config.base_url.clone())
                .timeout(config.timeout)
                .build()?;
            Ok(Arc::new(client))
        }
        None => {
            info!("No geocoding API key configured, reverse geocoding disabled");
            Ok(Arc::new(DisabledGeocoder))
        }
    }
}

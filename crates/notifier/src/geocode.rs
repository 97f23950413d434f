//! Reverse geocoding behind a trait seam.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

/// Budget for one reverse lookup; past it we fall back to raw coordinates.
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(3);

/// Turns coordinates into a "City, Country" label.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// `None` on any failure; the caller renders coordinates instead.
    async fn reverse(&self, lat: f64, lon: f64) -> Option<String>;
}

/// A geocoder that never resolves; renders coordinates only.
#[derive(Debug, Default)]
pub struct NoopGeocoder;

#[async_trait]
impl Geocoder for NoopGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Option<String> {
        None
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Address,
}

#[derive(Debug, Default, Deserialize)]
struct Address {
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
    #[serde(default)]
    municipality: Option<String>,
    #[serde(default)]
    county: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

/// Nominatim-backed reverse geocoder (OpenStreetMap; no API key).
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_base_url("https://nominatim.openstreetmap.org")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(GEOCODE_TIMEOUT)
            .user_agent("verilens-bot/0.1")
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, lat: f64, lon: f64) -> Option<String> {
        let url = format!(
            "{}/reverse?lat={lat}&lon={lon}&format=json&zoom=10&accept-language=en",
            self.base_url
        );
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("reverse geocoding failed: {e}");
                return None;
            }
        };
        let decoded: ReverseResponse = match response.json().await {
            Ok(d) => d,
            Err(e) => {
                warn!("reverse geocoding decode failed: {e}");
                return None;
            }
        };

        let a = decoded.address;
        let city = a
            .city
            .or(a.town)
            .or(a.village)
            .or(a.municipality)
            .or(a.county);
        match (city, a.country) {
            (Some(city), Some(country)) => Some(format!("{city}, {country}")),
            (Some(city), None) => Some(city),
            (None, Some(country)) => Some(country),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
pub(crate) struct FixedGeocoder(pub &'static str);

#[cfg(test)]
#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Option<String> {
        Some(self.0.to_string())
    }
}

//! Geocoding client and distance computation
//!
//! Provides:
//! - The [`Geocoder`] trait: place name in, coordinates out
//! - A Nominatim-compatible HTTP implementation
//! - A fixed-table implementation for tests and offline runs
//! - Great-circle distance in kilometers

use crate::config::GeocodingConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// WGS84 coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Great-circle distance between two points in kilometers (haversine)
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;

    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Geocoding capability consumed by the resolution engine
///
/// `Ok(None)` means the place is unknown; `Err` means the service failed,
/// which is fatal for a cycle that needs distance-based results.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a place name to coordinates
    async fn resolve(&self, place: &str) -> Result<Option<Coordinates>>;
}

/// Nominatim-compatible geocoding client
pub struct NominatimGeocoder {
    config: GeocodingConfig,
    client: reqwest::Client,
}

impl NominatimGeocoder {
    pub fn new(config: GeocodingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn resolve(&self, place: &str) -> Result<Option<Coordinates>> {
        #[derive(Deserialize)]
        struct NominatimHit {
            lat: String,
            lon: String,
        }

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("q", place),
                ("countrycodes", "fr"),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Geocoding {
                message: format!("geocoding request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Geocoding {
                message: format!("geocoding error {}", response.status()),
            });
        }

        let hits: Vec<NominatimHit> =
            response.json().await.map_err(|e| AppError::Geocoding {
                message: format!("failed to parse geocoding response: {}", e),
            })?;

        let Some(hit) = hits.first() else {
            tracing::debug!(place = %place, "geocoder found no match");
            return Ok(None);
        };

        let latitude = hit.lat.parse().map_err(|_| AppError::Geocoding {
            message: format!("invalid latitude in geocoding response: {}", hit.lat),
        })?;
        let longitude = hit.lon.parse().map_err(|_| AppError::Geocoding {
            message: format!("invalid longitude in geocoding response: {}", hit.lon),
        })?;

        Ok(Some(Coordinates::new(latitude, longitude)))
    }
}

/// Geocoder backed by a fixed place table
pub struct FixedGeocoder {
    places: HashMap<String, Coordinates>,
}

impl FixedGeocoder {
    pub fn new<I, S>(places: I) -> Self
    where
        I: IntoIterator<Item = (S, Coordinates)>,
        S: Into<String>,
    {
        Self {
            places: places
                .into_iter()
                .map(|(name, coords)| (crate::text::normalize(&name.into()), coords))
                .collect(),
        }
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    async fn resolve(&self, place: &str) -> Result<Option<Coordinates>> {
        Ok(self.places.get(&crate::text::normalize(place)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_lyon_paris() {
        let lyon = Coordinates::new(45.7640, 4.8357);
        let paris = Coordinates::new(48.8566, 2.3522);
        let d = distance_km(lyon, paris);
        // Roughly 390 km as the crow flies
        assert!((380.0..=410.0).contains(&d), "unexpected distance {}", d);
    }

    #[test]
    fn test_distance_zero_for_same_point() {
        let p = Coordinates::new(45.0, 4.0);
        assert!(distance_km(p, p) < 1e-9);
    }

    #[tokio::test]
    async fn test_fixed_geocoder_normalizes_names() {
        let geocoder = FixedGeocoder::new([("Lyon", Coordinates::new(45.7640, 4.8357))]);
        assert!(geocoder.resolve("LYON").await.unwrap().is_some());
        assert!(geocoder.resolve("Bordeaux").await.unwrap().is_none());
    }
}

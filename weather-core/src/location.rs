//! Geolocation sources and the startup location bootstrap.

use std::{fmt, fmt::Debug, sync::Arc, time::Duration};

use anyhow::anyhow;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{
    config::{GeolocationConfig, GeolocationMode},
    error::GeolocationError,
    storage::LocationStore,
};

/// A position in decimal degrees.
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

/// Formats as the `"<lat>, <lon>"` location string the backend understands.
impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.latitude, self.longitude)
    }
}

/// Single-shot position source.
#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// Ask the user for consent. Not bounded by the geolocation timeout.
    async fn request_permission(&self) -> Result<(), GeolocationError> {
        Ok(())
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always answers with the configured coordinates.
#[derive(Debug, Clone)]
pub struct FixedGeolocator {
    coordinates: Coordinates,
}

impl FixedGeolocator {
    pub fn new(coordinates: Coordinates) -> Self {
        Self { coordinates }
    }
}

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.coordinates)
    }
}

/// For hosts without any position source.
#[derive(Debug, Clone, Default)]
pub struct UnsupportedGeolocator;

#[async_trait]
impl Geolocator for UnsupportedGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Approximate position from an IP lookup service speaking the ip-api.com format.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), http: Client::new() }
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| GeolocationError::Lookup(e.to_string()))?;

        if !res.status().is_success() {
            return Err(GeolocationError::Lookup(format!(
                "lookup service answered {}",
                res.status()
            )));
        }

        let body: IpLookupResponse =
            res.json().await.map_err(|e| GeolocationError::Lookup(e.to_string()))?;

        match (body.status.as_str(), body.lat, body.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(GeolocationError::Lookup(
                body.message.unwrap_or_else(|| format!("lookup status '{}'", body.status)),
            )),
        }
    }
}

/// Construct the geolocator selected by `config.mode`.
pub fn geolocator_from_config(config: &GeolocationConfig) -> anyhow::Result<Arc<dyn Geolocator>> {
    let geolocator: Arc<dyn Geolocator> = match config.mode {
        GeolocationMode::Ip => Arc::new(IpGeolocator::new(config.ip_lookup_url.clone())),
        GeolocationMode::Fixed => {
            let coordinates = config.fixed_coordinates().ok_or_else(|| {
                anyhow!(
                    "Geolocation mode is 'fixed' but no coordinates are configured.\n\
                     Hint: run `weather configure` and enter a latitude and longitude."
                )
            })?;
            Arc::new(FixedGeolocator::new(coordinates))
        }
        GeolocationMode::None => Arc::new(UnsupportedGeolocator),
    };

    Ok(geolocator)
}

/// Result of [`bootstrap_location`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bootstrap {
    /// A location was already cached; geolocation was not consulted.
    Cached(String),
    /// A fresh position was acquired and cached.
    Acquired(String),
}

impl Bootstrap {
    pub fn location(&self) -> &str {
        match self {
            Bootstrap::Cached(l) | Bootstrap::Acquired(l) => l,
        }
    }

    pub fn was_cached(&self) -> bool {
        matches!(self, Bootstrap::Cached(_))
    }
}

/// Make sure a session location is cached, acquiring one if needed.
pub async fn bootstrap_location(
    store: &dyn LocationStore,
    geolocator: &dyn Geolocator,
    timeout: Duration,
) -> Result<Bootstrap, GeolocationError> {
    if let Some(cached) = store.get() {
        tracing::debug!(location = %cached, "Using cached location");
        return Ok(Bootstrap::Cached(cached));
    }

    acquire_location(store, geolocator, timeout).await.map(Bootstrap::Acquired)
}

/// Ask the geolocator for a position and cache it as `"<lat>, <lon>"`.
///
/// `timeout` starts once permission is granted. Storage is only written on success.
pub async fn acquire_location(
    store: &dyn LocationStore,
    geolocator: &dyn Geolocator,
    timeout: Duration,
) -> Result<String, GeolocationError> {
    geolocator.request_permission().await?;

    let position = tokio::time::timeout(timeout, geolocator.current_position())
        .await
        .map_err(|_| GeolocationError::Timeout)??;

    let location = position.to_string();
    store
        .set(&location)
        .map_err(|e| GeolocationError::Storage(e.to_string()))?;

    tracing::info!(%location, "Cached current location");
    Ok(location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLocationStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingGeolocator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geolocator for CountingGeolocator {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Coordinates::new(48.8566, 2.3522))
        }
    }

    #[derive(Debug)]
    struct NeverAnswers;

    #[async_trait]
    impl Geolocator for NeverAnswers {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            std::future::pending().await
        }
    }

    #[test]
    fn coordinates_format_as_location_string() {
        assert_eq!(Coordinates::new(51.5074, -0.1278).to_string(), "51.5074, -0.1278");
        assert_eq!(Coordinates::new(10.0, 20.5).to_string(), "10, 20.5");
    }

    #[tokio::test]
    async fn cached_location_skips_geolocation() {
        let store = MemoryLocationStore::with_location("Berlin");
        let geo = CountingGeolocator::default();

        let outcome = bootstrap_location(&store, &geo, Duration::from_secs(1)).await.unwrap();

        assert_eq!(outcome, Bootstrap::Cached("Berlin".into()));
        assert!(outcome.was_cached());
        assert_eq!(outcome.location(), "Berlin");
        assert_eq!(geo.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_cache_acquires_and_stores_position() {
        let store = MemoryLocationStore::with_location("");
        let geo = CountingGeolocator::default();

        let outcome = bootstrap_location(&store, &geo, Duration::from_secs(1)).await.unwrap();

        assert_eq!(outcome, Bootstrap::Acquired("48.8566, 2.3522".into()));
        assert!(!outcome.was_cached());
        assert_eq!(store.get().as_deref(), Some("48.8566, 2.3522"));
        assert_eq!(geo.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsupported_geolocation_leaves_store_untouched() {
        let store = MemoryLocationStore::new();

        let err = bootstrap_location(&store, &UnsupportedGeolocator, Duration::from_secs(1))
            .await
            .unwrap_err();

        assert_eq!(err, GeolocationError::Unsupported);
        assert_eq!(store.get(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_geolocation_times_out_without_writing() {
        let store = MemoryLocationStore::new();

        let err = acquire_location(&store, &NeverAnswers, Duration::from_secs(30))
            .await
            .unwrap_err();

        assert_eq!(err, GeolocationError::Timeout);
        assert_eq!(store.get(), None);
    }

    /// Takes a minute to grant permission, then answers at once.
    #[derive(Debug)]
    struct SlowConsent;

    #[async_trait]
    impl Geolocator for SlowConsent {
        async fn request_permission(&self) -> Result<(), GeolocationError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }

        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            Ok(Coordinates::new(1.0, 2.0))
        }
    }

    #[derive(Debug)]
    struct Refuses;

    #[async_trait]
    impl Geolocator for Refuses {
        async fn request_permission(&self) -> Result<(), GeolocationError> {
            Err(GeolocationError::Denied)
        }

        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            panic!("position must not be requested without permission")
        }
    }

    #[tokio::test(start_paused = true)]
    async fn consent_time_does_not_count_against_timeout() {
        let store = MemoryLocationStore::new();

        let location = acquire_location(&store, &SlowConsent, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(location, "1, 2");
        assert_eq!(store.get().as_deref(), Some("1, 2"));
    }

    #[tokio::test]
    async fn denied_permission_skips_position_lookup() {
        let store = MemoryLocationStore::new();

        let err = acquire_location(&store, &Refuses, Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(err, GeolocationError::Denied);
        assert_eq!(store.get(), None);
    }

    #[test]
    fn fixed_mode_without_coordinates_is_rejected() {
        let config = GeolocationConfig { mode: GeolocationMode::Fixed, ..Default::default() };
        let err = geolocator_from_config(&config).unwrap_err();
        assert!(err.to_string().contains("no coordinates are configured"));
    }

    #[tokio::test]
    async fn fixed_mode_answers_configured_position() {
        let config = GeolocationConfig {
            mode: GeolocationMode::Fixed,
            latitude: Some(1.5),
            longitude: Some(-2.25),
            ..Default::default()
        };
        let geo = geolocator_from_config(&config).unwrap();
        assert_eq!(geo.current_position().await.unwrap(), Coordinates::new(1.5, -2.25));
    }
}

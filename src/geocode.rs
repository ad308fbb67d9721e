use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::GeocoderConfig;
use crate::error::HazardPulseError;

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, HazardPulseError>;
}

/// Tries each whitespace-separated word of `text` in order and returns the
/// first one the geocoder resolves. Lookup failures skip to the next word.
pub async fn extract_location(geocoder: &dyn Geocoder, text: &str) -> Option<Coordinates> {
    for word in text.split_whitespace() {
        match geocoder.lookup(word).await {
            Ok(Some(coords)) => {
                debug!("Resolved '{}' to {:?}", word, coords);
                return Some(coords);
            }
            Ok(None) => continue,
            Err(e) => {
                warn!("Geocoding '{}' failed: {}", word, e);
                continue;
            }
        }
    }
    None
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

pub struct NominatimGeocoder {
    client: reqwest::Client,
    search_url: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, HazardPulseError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            search_url: format!("{}/search", config.base_url),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, HazardPulseError> {
        let results: Vec<NominatimResult> = self
            .client
            .get(&self.search_url)
            .query(&[("q", query), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(first) = results.into_iter().next() else {
            return Ok(None);
        };

        let latitude: f64 = first.lat.parse().map_err(|_| {
            HazardPulseError::Error(format!("Invalid latitude '{}' for '{}'", first.lat, query))
        })?;
        let longitude: f64 = first.lon.parse().map_err(|_| {
            HazardPulseError::Error(format!("Invalid longitude '{}' for '{}'", first.lon, query))
        })?;

        Ok(Some(Coordinates::new(latitude, longitude)))
    }
}

/// Memoizes lookups, misses included, for the lifetime of the process.
/// Errors are not cached so a transient failure can be retried on the next refresh.
pub struct CachingGeocoder<G> {
    inner: G,
    cache: Mutex<HashMap<String, Option<Coordinates>>>,
}

impl<G: Geocoder> CachingGeocoder<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, query: &str) -> Option<Option<Coordinates>> {
        self.cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(query).copied())
    }
}

#[async_trait]
impl<G: Geocoder> Geocoder for CachingGeocoder<G> {
    async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, HazardPulseError> {
        if let Some(hit) = self.cached(query) {
            return Ok(hit);
        }

        let result = self.inner.lookup(query).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(query.to_owned(), result);
        }
        Ok(result)
    }
}

/// Used when geocoding is switched off in the configuration.
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn lookup(&self, _query: &str) -> Result<Option<Coordinates>, HazardPulseError> {
        Ok(None)
    }
}

pub fn geocoder_from_config(config: &GeocoderConfig) -> Result<Box<dyn Geocoder>, HazardPulseError> {
    if config.enabled {
        Ok(Box::new(CachingGeocoder::new(NominatimGeocoder::new(config)?)))
    } else {
        Ok(Box::new(DisabledGeocoder))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// In-memory geocoder keyed by exact word
    pub(crate) struct FixedGeocoder {
        pub places: HashMap<&'static str, Coordinates>,
        pub failing: Vec<&'static str>,
        pub calls: AtomicUsize,
    }

    impl FixedGeocoder {
        pub fn new(places: &[(&'static str, f64, f64)]) -> Self {
            Self {
                places: places
                    .iter()
                    .map(|(name, lat, lon)| (*name, Coordinates::new(*lat, *lon)))
                    .collect(),
                failing: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn lookup(&self, query: &str) -> Result<Option<Coordinates>, HazardPulseError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|f| *f == query) {
                return Err(HazardPulseError::Error("lookup failed".to_string()));
            }
            Ok(self.places.get(query).copied())
        }
    }

    #[tokio::test]
    async fn test_extract_location_first_match_wins() {
        let geocoder = FixedGeocoder::new(&[("Chile", -31.7, -71.0), ("Peru", -9.2, -75.0)]);
        let coords = extract_location(&geocoder, "Earthquake in Chile near Peru").await;
        assert_eq!(coords, Some(Coordinates::new(-31.7, -71.0)));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_extract_location_skips_failures() {
        let mut geocoder = FixedGeocoder::new(&[("Kenya", 1.0, 38.0)]);
        geocoder.failing.push("Drought");
        let coords = extract_location(&geocoder, "Drought Kenya").await;
        assert_eq!(coords, Some(Coordinates::new(1.0, 38.0)));
    }

    #[tokio::test]
    async fn test_extract_location_none() {
        let geocoder = FixedGeocoder::new(&[]);
        assert_eq!(extract_location(&geocoder, "nothing here").await, None);
        assert_eq!(extract_location(&geocoder, "").await, None);
    }

    #[tokio::test]
    async fn test_caching_geocoder_memoizes_misses() {
        let cache = CachingGeocoder::new(FixedGeocoder::new(&[("Italy", 42.8, 12.8)]));
        for _ in 0..3 {
            assert_eq!(cache.lookup("Italy").await.unwrap(), Some(Coordinates::new(42.8, 12.8)));
            assert_eq!(cache.lookup("alert").await.unwrap(), None);
        }
        assert_eq!(cache.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_disabled_geocoder() {
        let config = GeocoderConfig {
            enabled: false,
            ..GeocoderConfig::default()
        };
        let geocoder = geocoder_from_config(&config).unwrap();
        assert_eq!(extract_location(geocoder.as_ref(), "Tonga").await, None);
    }

    fn config_for(server: &MockServer) -> GeocoderConfig {
        GeocoderConfig {
            base_url: server.uri(),
            ..GeocoderConfig::default()
        }
    }

    #[tokio::test]
    async fn test_nominatim_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "Tonga"))
            .and(query_param("format", "json"))
            .and(query_param("limit", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "lat": "-21.1790", "lon": "-175.1982", "display_name": "Tonga" }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(&server)).unwrap();
        assert_eq!(
            geocoder.lookup("Tonga").await.unwrap(),
            Some(Coordinates::new(-21.1790, -175.1982))
        );
        assert_eq!(geocoder.lookup("of").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_nominatim_bad_coordinates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "lat": "north", "lon": "0" }
            ])))
            .mount(&server)
            .await;

        let geocoder = NominatimGeocoder::new(&config_for(&server)).unwrap();
        assert!(geocoder.lookup("Somewhere").await.is_err());
    }
}

use super::cache::KeyValueStore;
use super::model::{Confidence, EnrichmentError, LocationQuery, LocationVerdict};
use crate::http::REST_CLIENT;
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, instrument, trace};

#[async_trait]
pub trait LocationVerifier: Send + Sync {
    async fn verify(&self, query: &LocationQuery) -> Result<LocationVerdict, EnrichmentError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

/// Keeps at most one request in flight and starts requests at least `interval` apart.
pub struct RateLimiter {
    interval: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_start: Mutex::new(None),
        }
    }

    pub async fn run<F, T>(&self, request: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut last_start = self.last_start.lock().await;

        if let Some(previous) = *last_start {
            trace!("Waiting for rate limit");
            sleep_until(previous + self.interval).await;
        }

        *last_start = Some(Instant::now());
        request.await
    }
}

/// Geocodes venue/address pairs against a Nominatim-compatible search endpoint.
pub struct NominatimVerifier {
    base_url: String,
    limiter: RateLimiter,
}

impl NominatimVerifier {
    pub fn new(base_url: &str, interval: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            limiter: RateLimiter::new(interval),
        }
    }

    fn search_text(query: &LocationQuery) -> Option<String> {
        let parts: Vec<&str> = [query.venue_name.as_deref(), query.address.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            return None;
        }

        Some(format!("{}, {}", parts.join(", "), query.city.metro_name()))
    }
}

#[async_trait]
impl LocationVerifier for NominatimVerifier {
    #[instrument(skip(self))]
    async fn verify(&self, query: &LocationQuery) -> Result<LocationVerdict, EnrichmentError> {
        let Some(text) = Self::search_text(query) else {
            return Ok(unverified(query, "Nothing to search for"));
        };

        let url = Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[("q", text.as_str()), ("format", "jsonv2"), ("limit", "1")],
        )
        .map_err(|err| EnrichmentError::InvalidResponse(format!("Invalid geocoder URL: {}", err)))?;

        let json_response = self
            .limiter
            .run(async {
                let response = REST_CLIENT.get(url).send().await?.error_for_status()?;

                Ok::<_, EnrichmentError>(response.text().await?)
            })
            .await?;
        let places = serde_json::from_str::<Vec<NominatimPlace>>(&json_response)?;

        let Some(place) = places.into_iter().next() else {
            return Ok(unverified(query, "No geocoding match"));
        };

        let lat = place.lat.parse::<f64>().map_err(|_| {
            EnrichmentError::InvalidResponse(format!("Invalid latitude '{}'", place.lat))
        })?;
        let lng = place.lon.parse::<f64>().map_err(|_| {
            EnrichmentError::InvalidResponse(format!("Invalid longitude '{}'", place.lon))
        })?;

        debug!("Geocoded to {}", place.display_name);

        Ok(LocationVerdict {
            lat,
            lng,
            confidence: confidence_for(query, &place.display_name),
            reasoning: format!("Matched '{}'", place.display_name),
        })
    }
}

fn unverified(query: &LocationQuery, reasoning: &str) -> LocationVerdict {
    LocationVerdict {
        lat: query.lat.unwrap_or_default(),
        lng: query.lng.unwrap_or_default(),
        confidence: Confidence::Unverified,
        reasoning: reasoning.to_string(),
    }
}

fn confidence_for(query: &LocationQuery, display_name: &str) -> Confidence {
    let display_name = display_name.to_lowercase();
    let venue_matches = query
        .venue_name
        .as_deref()
        .map(|venue| display_name.contains(&venue.trim().to_lowercase()))
        .unwrap_or(false);

    if venue_matches {
        Confidence::High
    } else if query.address.is_some() {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Answers repeated queries from the store; only successful lookups are cached.
pub struct CachedLocationVerifier<V> {
    inner: V,
    store: Arc<dyn KeyValueStore>,
}

impl<V: LocationVerifier> CachedLocationVerifier<V> {
    pub fn new(inner: V, store: Arc<dyn KeyValueStore>) -> Self {
        Self { inner, store }
    }

    fn cache_key(query: &LocationQuery) -> String {
        format!(
            "{}|{}|{}",
            query.venue_name.as_deref().unwrap_or_default().trim().to_lowercase(),
            query.address.as_deref().unwrap_or_default().trim().to_lowercase(),
            query.city
        )
    }
}

#[async_trait]
impl<V: LocationVerifier> LocationVerifier for CachedLocationVerifier<V> {
    async fn verify(&self, query: &LocationQuery) -> Result<LocationVerdict, EnrichmentError> {
        let key = Self::cache_key(query);

        if let Some(verdict) = self
            .store
            .get(&key)
            .and_then(|value| serde_json::from_value::<LocationVerdict>(value).ok())
        {
            return Ok(verdict);
        }

        let verdict = self.inner.verify(query).await?;
        self.store.set(&key, serde_json::to_value(&verdict)?);

        Ok(verdict)
    }
}

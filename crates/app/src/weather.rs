//! Current-conditions client for the Open-Meteo forecast API.
//!
//! Responses are cached per rounded location for a short TTL, and
//! concurrent requests for the same location share one in-flight fetch.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use mood_core::Condition;
use mood_core::weather_code::{condition_from_code, summary_from_code};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

pub const OPEN_METEO_ENDPOINT: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

const CURRENT_FIELDS: &str = "temperature_2m,apparent_temperature,is_day,precipitation,rain,\
showers,snowfall,weather_code,cloud_cover,wind_speed_10m,wind_direction_10m,relative_humidity_2m";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP {0}")]
    Status(u16),
    #[error("unexpected weather response")]
    UnexpectedResponse,
}

/// Normalized current conditions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherNow {
    pub temp_c: f64,
    pub feels_like_c: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_kmh: Option<f64>,
    pub wind_deg: Option<f64>,
    pub is_day: bool,
    pub precip_mm: Option<f64>,
    pub cloud_cover: Option<f64>,
    pub code: u16,
    pub condition: Condition,
    pub summary: String,
    /// Observation time as reported by the provider (local ISO 8601).
    pub at: String,
}

/// Raw forecast payload; only the `current` block is read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    pub current: Option<CurrentConditions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentConditions {
    #[serde(default)]
    pub time: String,
    pub temperature_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub is_day: Option<u8>,
    pub precipitation: Option<f64>,
    pub rain: Option<f64>,
    pub showers: Option<f64>,
    pub snowfall: Option<f64>,
    pub weather_code: Option<u16>,
    pub cloud_cover: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
    pub relative_humidity_2m: Option<f64>,
}

/// Fails when the weather code or the temperature is missing.
pub fn normalize(response: ForecastResponse) -> Result<WeatherNow, WeatherError> {
    let c = response.current.ok_or(WeatherError::UnexpectedResponse)?;
    let (Some(code), Some(temp_c)) = (c.weather_code, c.temperature_2m) else {
        return Err(WeatherError::UnexpectedResponse);
    };
    Ok(WeatherNow {
        temp_c,
        feels_like_c: c.apparent_temperature,
        humidity: c.relative_humidity_2m,
        wind_kmh: c.wind_speed_10m,
        wind_deg: c.wind_direction_10m,
        is_day: c.is_day == Some(1),
        precip_mm: c.precipitation.or(c.rain).or(c.showers).or(c.snowfall),
        cloud_cover: c.cloud_cover,
        code,
        condition: condition_from_code(code),
        summary: summary_from_code(code).to_string(),
        at: c.time,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherQuery {
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone name, or `auto` to let the provider resolve it.
    pub timezone: String,
}

impl WeatherQuery {
    pub fn new(latitude: f64, longitude: f64, timezone: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            timezone: timezone.into(),
        }
    }

    /// Cache key; coordinates rounded to three decimals (about 100 m).
    pub fn key(&self) -> String {
        format!(
            "{:.3},{:.3}@{}",
            self.latitude, self.longitude, self.timezone
        )
    }
}

/// Transport for forecast requests.
pub trait ForecastSource: Send + Sync + 'static {
    fn fetch(
        &self,
        query: &WeatherQuery,
    ) -> impl Future<Output = Result<ForecastResponse, WeatherError>> + Send;
}

/// Open-Meteo over HTTPS.
pub struct OpenMeteo {
    endpoint: String,
    client: reqwest::Client,
}

impl Default for OpenMeteo {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteo {
    pub fn new() -> Self {
        Self {
            endpoint: OPEN_METEO_ENDPOINT.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl ForecastSource for OpenMeteo {
    fn fetch(
        &self,
        query: &WeatherQuery,
    ) -> impl Future<Output = Result<ForecastResponse, WeatherError>> + Send {
        let params = [
            ("latitude", query.latitude.to_string()),
            ("longitude", query.longitude.to_string()),
            ("timezone", query.timezone.clone()),
            ("current", CURRENT_FIELDS.to_string()),
            ("temperature_unit", "celsius".to_string()),
            ("wind_speed_unit", "kmh".to_string()),
            ("precipitation_unit", "mm".to_string()),
        ];
        let request = self.client.get(&self.endpoint).query(&params);

        async move {
            let response = request
                .send()
                .await
                .map_err(|e| WeatherError::Network(e.to_string()))?;
            if !response.status().is_success() {
                return Err(WeatherError::Status(response.status().as_u16()));
            }
            response
                .json::<ForecastResponse>()
                .await
                .map_err(|_| WeatherError::UnexpectedResponse)
        }
    }
}

#[derive(Debug, Clone)]
struct CachedWeather {
    fetched_at: Instant,
    data: WeatherNow,
}

/// TTL cache keyed by [`WeatherQuery::key`].
#[derive(Debug)]
pub struct WeatherCache {
    ttl: Duration,
    entries: HashMap<String, CachedWeather>,
}

impl WeatherCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Returns a fresh entry; a stale one is evicted.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<WeatherNow> {
        let entry = self.entries.get(key)?;
        if now.saturating_duration_since(entry.fetched_at) < self.ttl {
            return Some(entry.data.clone());
        }
        self.entries.remove(key);
        None
    }

    pub fn insert(&mut self, key: String, data: WeatherNow, now: Instant) {
        self.entries.insert(
            key,
            CachedWeather {
                fetched_at: now,
                data,
            },
        );
    }
}

type PendingFetch = Shared<BoxFuture<'static, Result<WeatherNow, WeatherError>>>;

/// Cached, de-duplicating weather client.
pub struct WeatherClient<S> {
    source: Arc<S>,
    cache: Mutex<WeatherCache>,
    pending: Mutex<HashMap<String, PendingFetch>>,
}

impl<S: ForecastSource> WeatherClient<S> {
    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source: Arc::new(source),
            cache: Mutex::new(WeatherCache::new(ttl)),
            pending: Mutex::new(HashMap::new()),
        }
    }

    pub async fn current(&self, query: &WeatherQuery) -> Result<WeatherNow, WeatherError> {
        let key = query.key();
        let started = Instant::now();

        if let Some(hit) = self.cache.lock().await.get(&key, started) {
            debug!("Weather cache hit for {}", key);
            return Ok(hit);
        }

        let fetch = {
            let mut pending = self.pending.lock().await;
            match pending.get(&key) {
                Some(in_flight) => {
                    debug!("Joining in-flight weather request for {}", key);
                    in_flight.clone()
                }
                None => {
                    let source = Arc::clone(&self.source);
                    let query = query.clone();
                    let fetch = async move { normalize(source.fetch(&query).await?) }
                        .boxed()
                        .shared();
                    pending.insert(key.clone(), fetch.clone());
                    fetch
                }
            }
        };

        let result = fetch.clone().await;
        self.release(&key, &fetch).await;
        if let Ok(data) = &result {
            self.cache.lock().await.insert(key, data.clone(), started);
        }
        result
    }

    /// Drops the pending entry only if it is still the fetch that settled.
    async fn release(&self, key: &str, fetch: &PendingFetch) {
        let mut pending = self.pending.lock().await;
        if pending.get(key).is_some_and(|current| current.ptr_eq(fetch)) {
            pending.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn current(code: Option<u16>, temp: Option<f64>) -> ForecastResponse {
        ForecastResponse {
            current: Some(CurrentConditions {
                time: "2024-07-15T14:00".to_string(),
                temperature_2m: temp,
                is_day: Some(1),
                weather_code: code,
                rain: Some(0.4),
                ..Default::default()
            }),
        }
    }

    struct FakeSource {
        calls: AtomicUsize,
        response: Result<ForecastResponse, WeatherError>,
    }

    impl FakeSource {
        fn new(response: Result<ForecastResponse, WeatherError>) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                response,
            }
        }
    }

    impl ForecastSource for FakeSource {
        fn fetch(
            &self,
            _query: &WeatherQuery,
        ) -> impl Future<Output = Result<ForecastResponse, WeatherError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                response
            }
        }
    }

    #[test]
    fn test_normalize_maps_fields() {
        let now = normalize(current(Some(61), Some(12.5))).unwrap();
        assert_eq!(now.condition, Condition::Rain);
        assert_eq!(now.summary, "Light rain");
        assert!(now.is_day);
        assert_eq!(now.precip_mm, Some(0.4));
        assert_eq!(now.at, "2024-07-15T14:00");
    }

    #[test]
    fn test_normalize_rejects_incomplete_payloads() {
        assert_eq!(
            normalize(current(None, Some(10.0))),
            Err(WeatherError::UnexpectedResponse)
        );
        assert_eq!(
            normalize(current(Some(0), None)),
            Err(WeatherError::UnexpectedResponse)
        );
        assert_eq!(
            normalize(ForecastResponse::default()),
            Err(WeatherError::UnexpectedResponse)
        );
    }

    #[test]
    fn test_response_parses_from_json() {
        let json = r#"{"current":{"time":"2024-01-01T08:00","temperature_2m":21.3,
            "is_day":0,"weather_code":3,"relative_humidity_2m":55}}"#;
        let response: ForecastResponse = serde_json::from_str(json).unwrap();
        let now = normalize(response).unwrap();
        assert_eq!(now.condition, Condition::Cloudy);
        assert!(!now.is_day);
        assert_eq!(now.humidity, Some(55.0));
    }

    #[test]
    fn test_query_key_rounds_coordinates() {
        let q = WeatherQuery::new(-31.42014, -64.18876, "auto");
        assert_eq!(q.key(), "-31.420,-64.189@auto");
    }

    #[test]
    fn test_cache_expires_and_evicts() {
        let mut cache = WeatherCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        let data = normalize(current(Some(0), Some(20.0))).unwrap();
        cache.insert("k".to_string(), data.clone(), t0);

        assert_eq!(cache.get("k", t0 + Duration::from_secs(299)), Some(data));
        assert_eq!(cache.get("k", t0 + Duration::from_secs(300)), None);
        assert!(cache.entries.is_empty());
    }

    #[tokio::test]
    async fn test_client_caches_successful_fetch() {
        let client = WeatherClient::new(
            FakeSource::new(Ok(current(Some(0), Some(25.0)))),
            DEFAULT_TTL,
        );
        let q = WeatherQuery::new(10.0, 20.0, "auto");
        let first = client.current(&q).await.unwrap();
        let second = client.current(&q).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(client.source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_fetch() {
        let client = WeatherClient::new(
            FakeSource::new(Ok(current(Some(95), Some(18.0)))),
            DEFAULT_TTL,
        );
        let q = WeatherQuery::new(1.0, 2.0, "auto");
        let (a, b) = tokio::join!(client.current(&q), client.current(&q));
        assert_eq!(a.unwrap().condition, Condition::Thunder);
        assert_eq!(b.unwrap().condition, Condition::Thunder);
        assert_eq!(client.source.calls.load(Ordering::SeqCst), 1);
        assert!(client.pending.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let client = WeatherClient::new(FakeSource::new(Err(WeatherError::Status(503))), DEFAULT_TTL);
        let q = WeatherQuery::new(1.0, 2.0, "UTC");
        assert_eq!(client.current(&q).await, Err(WeatherError::Status(503)));
        assert_eq!(client.current(&q).await, Err(WeatherError::Status(503)));
        assert_eq!(client.source.calls.load(Ordering::SeqCst), 2);
        assert!(client.cache.lock().await.entries.is_empty());
    }

    #[tokio::test]
    async fn test_settled_request_keeps_newer_fetch_pending() {
        let client = WeatherClient::new(
            FakeSource::new(Err(WeatherError::Status(503))),
            Duration::from_secs(60),
        );
        let settled: PendingFetch = async { Err::<WeatherNow, _>(WeatherError::Status(503)) }
            .boxed()
            .shared();
        let newer: PendingFetch = async { Err::<WeatherNow, _>(WeatherError::UnexpectedResponse) }
            .boxed()
            .shared();
        client
            .pending
            .lock()
            .await
            .insert("0.000,0.000@UTC".to_string(), newer.clone());

        client.release("0.000,0.000@UTC", &settled).await;
        assert!(client.pending.lock().await.contains_key("0.000,0.000@UTC"));

        client.release("0.000,0.000@UTC", &newer).await;
        assert!(client.pending.lock().await.is_empty());
    }
}

mod api;
mod location;
mod prefs;
mod runtime;
mod weather;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::serve;
use backdrop::engine::RenderLoop;
use backdrop::layers::BackdropKind;
use backdrop::params::SharedPalette;
use backdrop::surface::SurfaceSize;
use chrono::Local;
use mood_core::clock::ClockFace;
use mood_core::engine::MoodEngine;
use mood_core::events::Event;
use mood_core::state::{DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use tokio::net::TcpListener;
use tokio::sync::{RwLock, mpsc, watch};
use tracing::{error, info, warn};

use crate::api::AppState;
use crate::location::{LocationProvider, ManualLocation};
use crate::prefs::PreferenceStore;
use crate::runtime::{
    start_clock_task, start_mood_task, start_palette_task, start_render_task, start_weather_task,
};
use crate::weather::{OpenMeteo, WeatherClient};

#[derive(Debug)]
struct Config {
    port: u16,
    frame_hz: f64,
    backdrop: BackdropKind,
    surface_width: u32,
    surface_height: u32,
    device_pixel_ratio: f32,
    reduced_motion: bool,
    location_enabled: bool,
    latitude: f64,
    longitude: f64,
    timezone: String,
    weather_ttl: Duration,
    weather_refresh: Duration,
    prefs_path: String,
    clock_hour12: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            frame_hz: 60.0,
            backdrop: BackdropKind::Smoke,
            surface_width: 1280,
            surface_height: 720,
            device_pixel_ratio: 1.0,
            reduced_motion: false,
            location_enabled: true,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            timezone: "auto".to_string(),
            weather_ttl: Duration::from_secs(300),
            weather_refresh: Duration::from_secs(600),
            prefs_path: "palette-choice.json".to_string(),
            clock_hour12: false,
        }
    }
}

impl Config {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_or("PORT", defaults.port),
            frame_hz: frame_rate(env_or("FRAME_HZ", defaults.frame_hz), defaults.frame_hz),
            backdrop: env_or("BACKDROP", defaults.backdrop),
            surface_width: env_or("SURFACE_WIDTH", defaults.surface_width),
            surface_height: env_or("SURFACE_HEIGHT", defaults.surface_height),
            device_pixel_ratio: env_or("DEVICE_PIXEL_RATIO", defaults.device_pixel_ratio),
            reduced_motion: env_flag("REDUCED_MOTION", defaults.reduced_motion),
            location_enabled: env_flag("LOCATION_ENABLED", defaults.location_enabled),
            latitude: env_or("LATITUDE", defaults.latitude),
            longitude: env_or("LONGITUDE", defaults.longitude),
            timezone: std::env::var("TIMEZONE").unwrap_or(defaults.timezone),
            weather_ttl: Duration::from_secs(env_or(
                "WEATHER_TTL_SECS",
                defaults.weather_ttl.as_secs(),
            )),
            weather_refresh: Duration::from_secs(
                env_or("WEATHER_REFRESH_SECS", defaults.weather_refresh.as_secs()).max(1),
            ),
            prefs_path: std::env::var("PREFS_PATH").unwrap_or(defaults.prefs_path),
            clock_hour12: env_flag("CLOCK_HOUR12", defaults.clock_hour12),
        }
    }
}

const MAX_FRAME_HZ: f64 = 240.0;

/// Clamps to [1, 240] Hz; non-finite rates use the default.
fn frame_rate(hz: f64, default: f64) -> f64 {
    if hz.is_finite() {
        hz.clamp(1.0, MAX_FRAME_HZ)
    } else {
        warn!("Ignoring non-finite frame rate {}", hz);
        default
    }
}

/// A saved manual position wins over the configured one.
fn initial_location(prefs: &PreferenceStore, config: &Config) -> ManualLocation {
    if let Some(saved) = prefs.load_location() {
        info!("Restored saved location {:.4}, {:.4}", saved.latitude, saved.longitude);
        return ManualLocation::new(saved);
    }
    if !config.location_enabled {
        return ManualLocation::disabled();
    }
    ManualLocation::from_coordinates(config.latitude, config.longitude)
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {}={:?}", key, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => matches!(
            raw.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup tracing with timestamped logs
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("Starting...");

    let config = Config::from_env();
    info!("{:?}", config);

    let prefs = PreferenceStore::new(&config.prefs_path);
    let choice = prefs.load();
    info!("Palette choice {} (from {})", choice, prefs.path().display());

    let location = Arc::new(initial_location(&prefs, &config));
    info!("Location permission: {}", location.permission_state());

    let face = ClockFace {
        hour12: config.clock_hour12,
        with_seconds: true,
    };
    let mut engine = MoodEngine::new(Local::now().naive_local(), face, config.timezone.clone());
    match location.request_location() {
        Ok(position) => engine.apply(Event::Location {
            latitude: position.latitude,
            longitude: position.longitude,
        }),
        Err(e) => info!("{}, using default location", e),
    }
    engine.apply(Event::Palette { choice });
    let initial_snapshot = engine.get_snapshot();

    // Create channels
    let (event_tx, event_rx) = mpsc::channel(100);
    let (state_tx, state_rx) = watch::channel(initial_snapshot.clone());
    let (weather_tx, weather_rx) = watch::channel(None);
    let (render_tx, render_rx) = mpsc::channel(32);

    let shared_palette = Arc::new(SharedPalette::new(initial_snapshot.mood.colors));
    let size = SurfaceSize::new(
        config.surface_width,
        config.surface_height,
        config.device_pixel_ratio,
    );
    let render = RenderLoop::new(
        config.backdrop.build(),
        size,
        Arc::clone(&shared_palette),
        config.reduced_motion,
        0.0,
    )?;

    // Spawn tasks
    tokio::spawn(start_mood_task(engine, event_rx, state_tx));
    tokio::spawn(start_clock_task(event_tx.clone()));
    tokio::spawn(start_palette_task(
        state_rx.clone(),
        Arc::clone(&shared_palette),
        prefs.clone(),
    ));
    tokio::spawn(start_render_task(render, render_rx, config.frame_hz));

    let weather = Arc::new(WeatherClient::new(OpenMeteo::new(), config.weather_ttl));
    tokio::spawn(start_weather_task(
        weather,
        state_rx.clone(),
        event_tx.clone(),
        weather_tx,
        config.timezone.clone(),
        config.weather_refresh,
    ));

    // Keep the API snapshot updated
    let current_snapshot = Arc::new(RwLock::new(initial_snapshot));
    tokio::spawn(api::start_snapshot_task(
        state_rx.clone(),
        Arc::clone(&current_snapshot),
    ));

    let app = api::create_router(AppState {
        event_tx,
        render_tx,
        location,
        prefs,
        current_snapshot,
        state_rx,
        weather_rx,
    });
    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("API server listening on http://localhost:{}", config.port);
    tokio::spawn(async move {
        if let Err(e) = serve(listener, app).await {
            error!("API server stopped: {}", e);
        }
    });

    // Keep the main task alive
    tokio::signal::ctrl_c().await?;
    info!("Shutting down...");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::{GeoPosition, PermissionState};

    #[test]
    fn test_frame_rate_is_bounded() {
        assert_eq!(frame_rate(30.0, 60.0), 30.0);
        assert_eq!(frame_rate(0.0, 60.0), 1.0);
        assert_eq!(frame_rate(-5.0, 60.0), 1.0);
        assert_eq!(frame_rate(1e12, 60.0), MAX_FRAME_HZ);
        assert_eq!(frame_rate(f64::INFINITY, 60.0), 60.0);
        assert_eq!(frame_rate(f64::NAN, 60.0), 60.0);
    }

    #[test]
    fn test_saved_location_wins_over_config() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = PreferenceStore::new(dir.path().join("prefs.json"));
        let config = Config {
            latitude: 10.0,
            longitude: 20.0,
            ..Config::default()
        };
        let position = initial_location(&prefs, &config).request_location().unwrap();
        assert_eq!((position.latitude, position.longitude), (10.0, 20.0));

        prefs
            .save_location(&GeoPosition::new(-33.87, 151.21).unwrap())
            .unwrap();
        let position = initial_location(&prefs, &config).request_location().unwrap();
        assert_eq!((position.latitude, position.longitude), (-33.87, 151.21));
    }

    #[test]
    fn test_invalid_saved_location_falls_back_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, r#"{"location": {"latitude": -95.0, "longitude": 0.0}}"#).unwrap();
        let prefs = PreferenceStore::new(&path);

        let config = Config {
            latitude: 10.0,
            longitude: 20.0,
            ..Config::default()
        };
        let position = initial_location(&prefs, &config).request_location().unwrap();
        assert_eq!(position.latitude, 10.0);

        let disabled = Config {
            location_enabled: false,
            ..Config::default()
        };
        let location = initial_location(&prefs, &disabled);
        assert_eq!(location.permission_state(), PermissionState::Unsupported);
    }
}

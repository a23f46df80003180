use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use backdrop::surface::{MAX_SURFACE_SIDE, SurfaceSize};
use futures_util::StreamExt;
use mood_core::PaletteChoice;
use mood_core::events::Event;
use mood_core::state::MoodSnapshot;
use mood_core::weather_code::condition_from_code;
use serde::{Deserialize, Serialize};
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio_stream::wrappers::WatchStream;
use tower_http::cors::CorsLayer;
use tracing::{debug, warn};

use crate::location::{GeoPosition, LocationProvider, ManualLocation, PermissionState};
use crate::prefs::PreferenceStore;
use crate::runtime::RenderCommand;
use crate::weather::WeatherNow;

/// Task that keeps the current snapshot updated from the watch channel.
/// This allows async handlers to read the latest snapshot without blocking.
pub async fn start_snapshot_task(
    mut state_rx: watch::Receiver<MoodSnapshot>,
    current_snapshot: Arc<RwLock<MoodSnapshot>>,
) {
    while state_rx.changed().await.is_ok() {
        let snapshot = state_rx.borrow_and_update().clone();
        *current_snapshot.write().await = snapshot;
    }
}

#[derive(Clone)]
pub struct AppState {
    pub event_tx: mpsc::Sender<Event>,
    pub render_tx: mpsc::Sender<RenderCommand>,
    pub location: Arc<ManualLocation>,
    pub prefs: PreferenceStore,
    pub current_snapshot: Arc<RwLock<MoodSnapshot>>,
    pub state_rx: watch::Receiver<MoodSnapshot>,
    pub weather_rx: watch::Receiver<Option<WeatherNow>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EventRequest {
    /// Raw WMO code as reported by a forecast provider.
    Weather { code: u16, is_day: bool },
    Location { latitude: f64, longitude: f64 },
    Visibility { visible: bool },
    Resize {
        width: u32,
        height: u32,
        #[serde(default = "default_dpr")]
        dpr: f32,
    },
}

fn default_dpr() -> f32 {
    1.0
}

fn requested_size(width: u32, height: u32, dpr: f32) -> Result<SurfaceSize, String> {
    if width == 0 || height == 0 {
        return Err("Surface must have a drawable size".to_string());
    }
    if width > MAX_SURFACE_SIDE || height > MAX_SURFACE_SIDE {
        return Err(format!(
            "Surface sides are limited to {} logical pixels",
            MAX_SURFACE_SIDE
        ));
    }
    Ok(SurfaceSize::new(width, height, dpr))
}

#[derive(Debug, Deserialize)]
pub struct PaletteRequest {
    pub choice: String,
}

#[derive(Debug, Serialize)]
pub struct LocationResponse {
    pub permission: PermissionState,
    pub position: Option<GeoPosition>,
}

#[derive(Debug, Serialize)]
pub struct PaletteResponse {
    pub choice: PaletteChoice,
    pub options: [PaletteChoice; 6],
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/mood", get(get_mood))
        .route("/weather", get(get_weather))
        .route("/location", get(get_location))
        .route("/palette", get(get_palette).post(set_palette))
        .route("/event", axum::routing::post(event))
        .route("/frame.png", get(frame_png))
        .route("/ws", get(ws))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    "ok"
}

#[axum::debug_handler]
async fn get_state(State(app_state): State<AppState>) -> impl IntoResponse {
    let snapshot = app_state.current_snapshot.read().await.clone();
    Json(snapshot)
}

async fn get_mood(State(app_state): State<AppState>) -> impl IntoResponse {
    let mood = app_state.current_snapshot.read().await.mood.clone();
    Json(mood)
}

async fn get_weather(State(app_state): State<AppState>) -> impl IntoResponse {
    let latest = app_state.weather_rx.borrow().clone();
    match latest {
        Some(now) => Json(now).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

async fn get_location(State(app_state): State<AppState>) -> impl IntoResponse {
    let location = &app_state.location;
    Json(LocationResponse {
        permission: location.permission_state(),
        position: location.request_location().ok(),
    })
}

async fn get_palette(State(app_state): State<AppState>) -> impl IntoResponse {
    let choice = app_state.current_snapshot.read().await.choice;
    Json(PaletteResponse {
        choice,
        options: PaletteChoice::ALL,
    })
}

async fn set_palette(
    State(app_state): State<AppState>,
    Json(req): Json<PaletteRequest>,
) -> impl IntoResponse {
    let choice = match req.choice.parse::<PaletteChoice>() {
        Ok(choice) => choice,
        Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    };
    send_event(&app_state, Event::Palette { choice }).await
}

async fn event(
    State(app_state): State<AppState>,
    Json(req): Json<EventRequest>,
) -> impl IntoResponse {
    debug!("Event request: {:?}", req);
    match req {
        EventRequest::Weather { code, is_day } => {
            let event = Event::Weather {
                condition: condition_from_code(code),
                is_day,
            };
            send_event(&app_state, event).await
        }
        EventRequest::Location {
            latitude,
            longitude,
        } => match GeoPosition::new(latitude, longitude) {
            Ok(position) => {
                let event = Event::Location {
                    latitude: position.latitude,
                    longitude: position.longitude,
                };
                if let Err(e) = app_state.prefs.save_location(&position) {
                    warn!("Failed to save location: {:#}", e);
                }
                app_state.location.set(position);
                send_event(&app_state, event).await
            }
            Err(e) => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
        },
        EventRequest::Visibility { visible } => {
            send_render(&app_state, RenderCommand::Visibility(visible)).await
        }
        EventRequest::Resize {
            width,
            height,
            dpr,
        } => match requested_size(width, height, dpr) {
            Ok(size) => send_render(&app_state, RenderCommand::Resize(size)).await,
            Err(reason) => (StatusCode::UNPROCESSABLE_ENTITY, reason).into_response(),
        },
    }
}

async fn send_event(app_state: &AppState, event: Event) -> axum::response::Response {
    match app_state.event_tx.send(event).await {
        Ok(_) => (StatusCode::OK, "Event sent").into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to send event: channel closed",
        )
            .into_response(),
    }
}

async fn send_render(app_state: &AppState, command: RenderCommand) -> axum::response::Response {
    match app_state.render_tx.send(command).await {
        Ok(_) => (StatusCode::OK, "Render command sent").into_response(),
        Err(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to send render command: channel closed",
        )
            .into_response(),
    }
}

async fn frame_png(State(app_state): State<AppState>) -> impl IntoResponse {
    let (reply_tx, reply_rx) = oneshot::channel();
    if app_state
        .render_tx
        .send(RenderCommand::Capture(reply_tx))
        .await
        .is_err()
    {
        return (StatusCode::SERVICE_UNAVAILABLE, "Renderer stopped").into_response();
    }
    match reply_rx.await {
        Ok(Ok(png)) => ([(header::CONTENT_TYPE, "image/png")], png).into_response(),
        Ok(Err(e)) => {
            warn!("Frame capture failed: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Frame capture failed").into_response()
        }
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "Renderer stopped").into_response(),
    }
}

async fn ws(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> impl IntoResponse {
    let state_rx = app_state.state_rx.clone();
    ws.on_upgrade(move |socket| push_snapshots(socket, state_rx))
}

/// Sends the current snapshot, then every change, until the client leaves.
async fn push_snapshots(mut socket: WebSocket, state_rx: watch::Receiver<MoodSnapshot>) {
    let mut updates = WatchStream::new(state_rx);
    while let Some(snapshot) = updates.next().await {
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode snapshot: {}", e);
                continue;
            }
        };
        if socket.send(Message::Text(json.into())).await.is_err() {
            debug!("WebSocket client disconnected");
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_request_wire_format() {
        let req: EventRequest =
            serde_json::from_str(r#"{"type":"resize","width":800,"height":600}"#).unwrap();
        assert!(matches!(
            req,
            EventRequest::Resize {
                width: 800,
                height: 600,
                dpr
            } if dpr == 1.0
        ));

        let req: EventRequest =
            serde_json::from_str(r#"{"type":"weather","code":95,"is_day":false}"#).unwrap();
        assert!(matches!(
            req,
            EventRequest::Weather {
                code: 95,
                is_day: false
            }
        ));

        assert!(serde_json::from_str::<EventRequest>(r#"{"type":"perform"}"#).is_err());
    }

    #[test]
    fn test_resize_bounds() {
        let size = requested_size(1920, 1080, 2.0).unwrap();
        assert_eq!(size.backing_width(), 3840);
        assert!(requested_size(MAX_SURFACE_SIDE, MAX_SURFACE_SIDE, 1.0).is_ok());

        assert!(requested_size(0, 600, 1.0).is_err());
        assert!(requested_size(60_000, 60_000, 2.0).is_err());
        assert!(requested_size(800, MAX_SURFACE_SIDE + 1, 1.0).is_err());
    }

    #[test]
    fn test_palette_response_lists_options() {
        let json = serde_json::to_value(PaletteResponse {
            choice: PaletteChoice::Warm,
            options: PaletteChoice::ALL,
        })
        .unwrap();
        assert_eq!(json["choice"], "warm");
        assert_eq!(json["options"][0], "auto");
        assert_eq!(json["options"].as_array().unwrap().len(), 6);
    }
}

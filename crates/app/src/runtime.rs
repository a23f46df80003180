use std::sync::Arc;

use backdrop::engine::RenderLoop;
use backdrop::layers::Backdrop;
use backdrop::params::SharedPalette;
use backdrop::surface::SurfaceSize;
use chrono::{Local, Timelike};
use mood_core::engine::MoodEngine;
use mood_core::events::Event;
use mood_core::state::MoodSnapshot;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{Duration, Instant, MissedTickBehavior, interval, sleep};
use tracing::{debug, info, warn};

use crate::prefs::PreferenceStore;
use crate::weather::{ForecastSource, WeatherClient, WeatherNow, WeatherQuery};

/// Commands handled by the render task between frames.
#[derive(Debug)]
pub enum RenderCommand {
    Resize(SurfaceSize),
    Visibility(bool),
    Capture(oneshot::Sender<anyhow::Result<Vec<u8>>>),
}

/// Starts the mood task that applies events and publishes snapshots.
///
/// Exits when the event channel closes.
pub async fn start_mood_task(
    mut engine: MoodEngine,
    mut event_rx: mpsc::Receiver<Event>,
    state_tx: watch::Sender<MoodSnapshot>,
) -> anyhow::Result<()> {
    info!("Mood task started: {}", engine.mood().name);

    while let Some(event) = event_rx.recv().await {
        engine.apply(event);
        state_tx.send(engine.get_snapshot())?;
    }

    info!("Event channel closed, exiting mood task");
    Ok(())
}

/// Starts the clock task, sending a local-time tick at the top of every second.
pub async fn start_clock_task(event_tx: mpsc::Sender<Event>) -> anyhow::Result<()> {
    let until_next_second = 1_000 - Local::now().nanosecond() / 1_000_000 % 1_000;
    sleep(Duration::from_millis(until_next_second as u64)).await;

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("Clock task started");

    loop {
        ticker.tick().await;
        let event = Event::Tick {
            now: Local::now().naive_local(),
        };
        if event_tx.send(event).await.is_err() {
            info!("Event channel closed, stopping clock task");
            break;
        }
    }

    Ok(())
}

/// Starts the palette task that pushes the active mood's colors into the
/// shared slot the render loop reads, and persists palette choices.
pub async fn start_palette_task(
    mut state_rx: watch::Receiver<MoodSnapshot>,
    shared_palette: Arc<SharedPalette>,
    prefs: PreferenceStore,
) -> anyhow::Result<()> {
    let mut choice = {
        let snapshot = state_rx.borrow_and_update();
        shared_palette.set(snapshot.mood.colors);
        snapshot.choice
    };
    info!("Palette task started with choice {}", choice);

    while state_rx.changed().await.is_ok() {
        let (colors, latest) = {
            let snapshot = state_rx.borrow_and_update();
            (snapshot.mood.colors, snapshot.choice)
        };
        shared_palette.set(colors);

        if latest != choice {
            choice = latest;
            if let Err(e) = prefs.save(choice) {
                warn!("Failed to persist palette choice: {:#}", e);
            }
        }
    }

    info!("State channel closed, stopping palette task");
    Ok(())
}

/// Starts the weather task.
///
/// Fetches on a fixed interval and whenever the location changes, feeding
/// the condition back to the mood task as an event.
pub async fn start_weather_task<S: ForecastSource>(
    client: Arc<WeatherClient<S>>,
    mut state_rx: watch::Receiver<MoodSnapshot>,
    event_tx: mpsc::Sender<Event>,
    weather_tx: watch::Sender<Option<WeatherNow>>,
    timezone: String,
    refresh: Duration,
) -> anyhow::Result<()> {
    let mut ticker = interval(refresh);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_key: Option<String> = None;
    info!("Weather task started (refresh every {}s)", refresh.as_secs());

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if last_key == Some(current_query(&mut state_rx, &timezone).key()) {
                    continue;
                }
            }
        }

        let query = current_query(&mut state_rx, &timezone);
        last_key = Some(query.key());

        match client.current(&query).await {
            Ok(now) => {
                debug!("Weather for {}: {} ({:.1}°C)", query.key(), now.summary, now.temp_c);
                let event = Event::Weather {
                    condition: now.condition,
                    is_day: now.is_day,
                };
                weather_tx.send_replace(Some(now));
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Weather fetch failed for {}: {}", query.key(), e),
        }
    }

    info!("Weather task stopped");
    Ok(())
}

fn current_query(state_rx: &mut watch::Receiver<MoodSnapshot>, timezone: &str) -> WeatherQuery {
    let snapshot = state_rx.borrow_and_update();
    WeatherQuery::new(snapshot.latitude, snapshot.longitude, timezone)
}

/// Starts the render task.
///
/// Frames are requested at `hz`; while the backdrop is hidden the task stops
/// ticking and only waits for commands.
pub async fn start_render_task<B: Backdrop + Send>(
    mut render: RenderLoop<B>,
    mut cmd_rx: mpsc::Receiver<RenderCommand>,
    hz: f64,
) -> anyhow::Result<()> {
    let origin = Instant::now();
    let mut ticker = interval(Duration::from_secs_f64(1.0 / hz));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!("Render task started at {:.0} Hz", hz);

    loop {
        let command = if render.is_running() {
            tokio::select! {
                _ = ticker.tick() => {
                    let ts_ms = origin.elapsed().as_secs_f64() * 1000.0;
                    if let Err(e) = render.frame(ts_ms) {
                        warn!("Frame failed: {:#}", e);
                    }
                    continue;
                }
                command = cmd_rx.recv() => command,
            }
        } else {
            cmd_rx.recv().await
        };

        let Some(command) = command else {
            break;
        };
        let now_ms = origin.elapsed().as_secs_f64() * 1000.0;
        match command {
            RenderCommand::Resize(size) => render.request_resize(size),
            RenderCommand::Visibility(visible) => {
                render.set_visible(visible, now_ms);
                if visible {
                    ticker.reset();
                }
            }
            RenderCommand::Capture(reply) => {
                let _ = reply.send(render.encode_png());
            }
        }
    }

    info!("Render command channel closed, stopping render task");
    Ok(())
}

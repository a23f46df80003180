use chrono::NaiveDateTime;

use crate::clock::ClockFace;
use crate::events::Event;
use crate::mood::{Mood, compute_mood};
use crate::palette::apply_override;
use crate::state::{AmbientState, MoodSnapshot};

/// The engine that keeps the mood in step with incoming signals.
pub struct MoodEngine {
    state: AmbientState,
    face: ClockFace,
    timezone: String,
    computed: Mood,
    active: Mood,
}

impl MoodEngine {
    /// Initializes the engine with default inputs at `now`.
    pub fn new(now: NaiveDateTime, face: ClockFace, timezone: impl Into<String>) -> Self {
        Self::with_state(AmbientState::new(now), face, timezone)
    }

    pub fn with_state(state: AmbientState, face: ClockFace, timezone: impl Into<String>) -> Self {
        let computed = Self::derive(&state);
        let active = apply_override(computed.clone(), state.choice());
        Self {
            state,
            face,
            timezone: timezone.into(),
            computed,
            active,
        }
    }

    /// Apply event.
    pub fn apply(&mut self, event: Event) {
        match event {
            Event::Tick { now } => self.state.set_now(now),
            Event::Weather { condition, is_day } => {
                tracing::debug!("Weather update: {} (day={})", condition, is_day);
                self.state.set_weather(condition, is_day);
            }
            Event::Location {
                latitude,
                longitude,
            } => {
                tracing::debug!("Location update: {:.4}, {:.4}", latitude, longitude);
                self.state.set_location(latitude, longitude);
            }
            Event::Palette { choice } => {
                tracing::info!("Palette choice: {}", choice);
                self.state.set_choice(choice);
            }
        }
        self.recompute();
    }

    /// Inputs are cheap to re-derive, so every event recomputes from scratch.
    fn recompute(&mut self) {
        let computed = Self::derive(&self.state);
        let active = apply_override(computed.clone(), self.state.choice());
        if active.name != self.active.name {
            tracing::info!("Mood changed: {} -> {}", self.active.name, active.name);
        }
        self.computed = computed;
        self.active = active;
    }

    fn derive(state: &AmbientState) -> Mood {
        compute_mood(
            state.condition(),
            state.is_day(),
            state.now(),
            state.latitude(),
        )
    }

    pub fn state(&self) -> &AmbientState {
        &self.state
    }

    /// The mood renderers should use, after the palette choice.
    pub fn mood(&self) -> &Mood {
        &self.active
    }

    /// Retrieves the current snapshot.
    pub fn get_snapshot(&self) -> MoodSnapshot {
        MoodSnapshot {
            clock: self.face.read(self.state.now(), &self.timezone),
            condition: self.state.condition(),
            is_day: self.state.is_day(),
            weather_known: self.state.weather_known(),
            latitude: self.state.latitude(),
            longitude: self.state.longitude(),
            choice: self.state.choice(),
            computed: self.computed.clone(),
            mood: self.active.clone(),
        }
    }
}

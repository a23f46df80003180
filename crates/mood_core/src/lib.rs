//! Domain core for the ambient display: noise field, mood model, clock and
//! the engine that keeps them in sync with incoming signals.

pub mod clock;
pub mod color;
pub mod engine;
pub mod error;
pub mod events;
pub mod mood;
pub mod noise;
pub mod palette;
pub mod state;
pub mod weather_code;

pub use color::{Palette, Rgb};
pub use error::MoodError;
pub use mood::{Condition, DayPeriod, Mood, MoodMeta, Season};
pub use palette::PaletteChoice;

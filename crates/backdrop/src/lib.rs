//! Animated backdrops drawn offscreen with tiny-skia, paced by a shared
//! frame clock and tinted from a lock-free palette slot.

pub mod blobs;
pub mod engine;
pub mod layers;
pub mod params;
pub mod smoke;
pub mod surface;

pub use engine::{Frame, FramePacer, RenderLoop};
pub use layers::{Backdrop, BackdropKind, FrameContext};
pub use params::SharedPalette;
pub use surface::{RenderSurface, SurfaceSize};

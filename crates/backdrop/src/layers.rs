use std::fmt;
use std::str::FromStr;

use mood_core::Palette;

use crate::blobs::GradientBlobs;
use crate::smoke::SmokeFlow;
use crate::surface::RenderSurface;

/// Per-frame timing handed to a backdrop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    /// Seconds since the previous frame, clamped.
    pub dt: f64,
    /// Accumulated, speed-scaled animation time.
    pub time: f64,
    pub reduced_motion: bool,
}

/// Trait for animated backgrounds that paint onto a render surface.
pub trait Backdrop {
    fn name(&self) -> &'static str;

    /// Called when the surface is created or reallocated. Implementations
    /// paint a full-opacity background here.
    fn mount(&mut self, surface: &mut RenderSurface, palette: &Palette);

    /// Draws one frame with the palette read for this frame.
    fn draw(&mut self, surface: &mut RenderSurface, palette: &Palette, frame: &FrameContext);
}

impl<B: Backdrop + ?Sized> Backdrop for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn mount(&mut self, surface: &mut RenderSurface, palette: &Palette) {
        (**self).mount(surface, palette)
    }

    fn draw(&mut self, surface: &mut RenderSurface, palette: &Palette, frame: &FrameContext) {
        (**self).draw(surface, palette, frame)
    }
}

/// Selects one of the available backdrops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackdropKind {
    Blobs,
    Smoke,
}

impl BackdropKind {
    pub fn build(self) -> Box<dyn Backdrop + Send> {
        match self {
            BackdropKind::Blobs => Box::new(GradientBlobs::new()),
            BackdropKind::Smoke => Box::new(SmokeFlow::new()),
        }
    }
}

impl fmt::Display for BackdropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackdropKind::Blobs => f.write_str("blobs"),
            BackdropKind::Smoke => f.write_str("smoke"),
        }
    }
}

impl FromStr for BackdropKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blobs" | "gradient" => Ok(BackdropKind::Blobs),
            "smoke" | "flow" => Ok(BackdropKind::Smoke),
            other => Err(anyhow::anyhow!("unknown backdrop: {other}")),
        }
    }
}

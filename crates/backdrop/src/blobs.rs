//! Gradient Blobs: a diagonal two-color background with three accent lights
//! orbiting the center.

use mood_core::Palette;
use tiny_skia::BlendMode;

use crate::layers::{Backdrop, FrameContext};
use crate::surface::RenderSurface;

/// Orbit amplitude as a fraction of the surface size.
const ORBIT: f64 = 0.35;
/// Accent alpha at the blob core (0xCC).
const CORE_ALPHA: f32 = 0.8;

#[derive(Debug, Clone, Copy)]
struct Blob {
    radius: f32,
    speed: f64,
    phase: f64,
}

const BLOBS: [Blob; 3] = [
    Blob {
        radius: 220.0,
        speed: 0.12,
        phase: 0.0,
    },
    Blob {
        radius: 260.0,
        speed: 0.09,
        phase: 1.3,
    },
    Blob {
        radius: 180.0,
        speed: 0.15,
        phase: 2.1,
    },
];

#[derive(Debug, Default)]
pub struct GradientBlobs;

impl GradientBlobs {
    pub fn new() -> Self {
        Self
    }

    /// Centers of the blobs at animation time `time`.
    pub fn blob_centers(width: f32, height: f32, time: f64) -> [(f32, f32); 3] {
        BLOBS.map(|b| {
            let x = width as f64 * (0.5 + ORBIT * (b.phase + time * b.speed).sin());
            let y = height as f64 * (0.5 + ORBIT * (b.phase + time * b.speed * 1.2).cos());
            (x as f32, y as f32)
        })
    }
}

impl Backdrop for GradientBlobs {
    fn name(&self) -> &'static str {
        "blobs"
    }

    fn mount(&mut self, surface: &mut RenderSurface, palette: &Palette) {
        surface.fill_linear_gradient(palette.bg1, palette.bg2, 1.0);
    }

    fn draw(&mut self, surface: &mut RenderSurface, palette: &Palette, frame: &FrameContext) {
        surface.fill_linear_gradient(palette.bg1, palette.bg2, 1.0);
        if frame.reduced_motion {
            return;
        }

        let centers = Self::blob_centers(surface.width(), surface.height(), frame.time);
        for (blob, (x, y)) in BLOBS.iter().zip(centers) {
            surface.fill_radial_glow(x, y, blob.radius, palette.accent, CORE_ALPHA, BlendMode::Plus);
        }
    }
}

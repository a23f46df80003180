//! Smoke Flow: particles advected through curl noise, drawn as faint
//! additive strokes over a slowly re-painted background so trails decay
//! instead of vanishing.

use mood_core::noise::NoiseField;
use mood_core::{Palette, Rgb};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tiny_skia::BlendMode;

use crate::layers::{Backdrop, FrameContext};
use crate::surface::RenderSurface;

/// Spatial scale of the flow field; smaller means larger swirls.
pub const NOISE_SCALE: f64 = 0.0012;
/// Base particle speed in logical px/s.
pub const FLOW_SPEED: f64 = 52.0;
pub const SUBSTEPS: usize = 3;
pub const SMOKE_ALPHA: f32 = 0.045;
pub const LINE_WIDTH: f32 = 1.1;
/// Softening added to the stroke width in place of a blur filter.
pub const BLUR_PX: f32 = 0.7;
/// Opacity of the per-frame background wash.
pub const FADE_ALPHA: f32 = 0.055;
/// Particles may drift this far past an edge before wrapping.
pub const OVERSCAN: f64 = 2.0;
/// Logical px² per particle.
pub const DENSITY: f64 = 12_000.0;
pub const MIN_PARTICLES: usize = 250;
pub const MAX_PARTICLES: usize = 1600;

const DRIFT_X: f64 = 0.10;
const DRIFT_Y: f64 = -0.07;
const SMOKE: Rgb = Rgb::hex(0xffffff);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    pub px: f64,
    pub py: f64,
    pub speed: f64,
    pub life: f64,
}

pub struct SmokeFlow<R = StdRng> {
    noise: NoiseField,
    particles: Vec<Particle>,
    rng: R,
    /// Palette last painted at full opacity.
    painted: Option<Palette>,
    trails: [Vec<[f32; 4]>; SUBSTEPS],
}

impl Default for SmokeFlow<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl SmokeFlow<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_rng(&mut rand::rng()))
    }
}

impl<R: Rng> SmokeFlow<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            noise: NoiseField::new(),
            particles: Vec::new(),
            rng,
            painted: None,
            trails: Default::default(),
        }
    }

    /// Population for a logical surface: one particle per [`DENSITY`] px²,
    /// clamped.
    pub fn population_for(width: f64, height: f64) -> usize {
        let target = (width * height / DENSITY).round() as usize;
        target.clamp(MIN_PARTICLES, MAX_PARTICLES)
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Replaces the whole population with fresh particles.
    pub fn spawn(&mut self, width: f64, height: f64) {
        let count = Self::population_for(width, height);
        self.particles.clear();
        self.particles.reserve(count);
        for _ in 0..count {
            let particle = self.fresh_particle(width, height);
            self.particles.push(particle);
        }
        tracing::debug!("Spawned {} smoke particles for {}x{}", count, width, height);
    }

    fn fresh_particle(&mut self, width: f64, height: f64) -> Particle {
        let x = self.rng.random::<f64>() * width;
        let y = self.rng.random::<f64>() * height;
        Particle {
            x,
            y,
            px: x,
            py: y,
            speed: FLOW_SPEED * (0.7 + self.rng.random::<f64>() * 0.6),
            life: 200.0 + self.rng.random::<f64>() * 250.0,
        }
    }

    /// Moves every particle through the flow field and records the segment
    /// each sub-step travelled, grouped by sub-step.
    pub fn advance(&mut self, width: f64, height: f64, dt: f64, time: f64) {
        for trail in &mut self.trails {
            trail.clear();
        }
        let drift_x = time * DRIFT_X;
        let drift_y = time * DRIFT_Y;

        for i in 0..self.particles.len() {
            let mut p = self.particles[i];
            let (mut x, mut y) = (p.x, p.y);
            let step = p.speed * dt / SUBSTEPS as f64;

            for trail in &mut self.trails {
                let (vx, vy) = self
                    .noise
                    .curl(x * NOISE_SCALE + drift_x, y * NOISE_SCALE + drift_y);
                let (nx, ny) = (x + vx * step, y + vy * step);
                trail.push([x as f32, y as f32, nx as f32, ny as f32]);
                x = nx;
                y = ny;
            }

            p.px = p.x;
            p.py = p.y;
            p.x = x;
            p.y = y;

            if p.x < -OVERSCAN {
                p.x = width + OVERSCAN;
            }
            if p.x > width + OVERSCAN {
                p.x = -OVERSCAN;
            }
            if p.y < -OVERSCAN {
                p.y = height + OVERSCAN;
            }
            if p.y > height + OVERSCAN {
                p.y = -OVERSCAN;
            }

            p.life -= dt;
            if p.life <= 0.0 {
                p = self.fresh_particle(width, height);
            }
            self.particles[i] = p;
        }
    }

    fn paint_background(&mut self, surface: &mut RenderSurface, palette: &Palette, alpha: f32) {
        surface.fill_linear_gradient(palette.bg1, palette.bg2, alpha);
        if alpha >= 1.0 {
            self.painted = Some(*palette);
        }
    }
}

impl<R: Rng> Backdrop for SmokeFlow<R> {
    fn name(&self) -> &'static str {
        "smoke"
    }

    fn mount(&mut self, surface: &mut RenderSurface, palette: &Palette) {
        self.spawn(surface.width() as f64, surface.height() as f64);
        self.paint_background(surface, palette, 1.0);
    }

    fn draw(&mut self, surface: &mut RenderSurface, palette: &Palette, frame: &FrameContext) {
        if self.painted != Some(*palette) {
            tracing::debug!("Palette changed, repainting smoke background");
            self.paint_background(surface, palette, 1.0);
        }
        self.paint_background(surface, palette, FADE_ALPHA);

        if frame.reduced_motion {
            return;
        }

        let (w, h) = (surface.width() as f64, surface.height() as f64);
        self.advance(w, h, frame.dt, frame.time);
        for trail in &self.trails {
            surface.stroke_segments(
                trail,
                SMOKE,
                SMOKE_ALPHA,
                LINE_WIDTH + BLUR_PX,
                BlendMode::Screen,
            );
        }
    }
}

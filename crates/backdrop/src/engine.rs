use std::sync::Arc;

use tracing::{debug, info};

use crate::layers::{Backdrop, FrameContext};
use crate::params::SharedPalette;
use crate::surface::{RenderSurface, SurfaceSize};

/// Draw ceiling, independent of how often frames are requested.
pub const FPS_CAP: f64 = 45.0;
/// Longest step the animation will take after a stall, in seconds.
pub const MAX_FRAME_DT: f64 = 0.05;
/// Scales real time into animation time.
pub const MOTION_SCALE: f64 = 0.35;

/// What the pacer decided for a requested frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Frame {
    /// Hidden; the caller should stop requesting frames.
    Paused,
    /// Too soon after the last draw. Keep requesting.
    Skipped,
    Draw { dt: f64 },
}

/// Running/Paused state machine plus frame-rate ceiling.
///
/// Timestamps are milliseconds from any monotonic origin. Reduced motion
/// freezes animation time but frames keep flowing so resize and visibility
/// handling stay alive.
#[derive(Debug, Clone)]
pub struct FramePacer {
    running: bool,
    reduced_motion: bool,
    frame_min_ms: f64,
    last_ms: f64,
    last_draw_ms: f64,
    motion_time: f64,
}

impl FramePacer {
    pub fn new(now_ms: f64, reduced_motion: bool) -> Self {
        Self {
            running: true,
            reduced_motion,
            frame_min_ms: 1000.0 / FPS_CAP,
            last_ms: now_ms,
            last_draw_ms: now_ms,
            motion_time: 0.0,
        }
    }

    pub fn frame(&mut self, ts_ms: f64) -> Frame {
        if !self.running {
            return Frame::Paused;
        }

        let dt = ((ts_ms - self.last_ms) / 1000.0).clamp(0.0, MAX_FRAME_DT);
        self.last_ms = ts_ms;
        if !self.reduced_motion {
            self.motion_time += dt * MOTION_SCALE;
        }

        if ts_ms - self.last_draw_ms < self.frame_min_ms {
            return Frame::Skipped;
        }
        self.last_draw_ms = ts_ms;
        Frame::Draw { dt }
    }

    /// Resuming re-anchors both clocks to `now_ms` so time spent hidden is
    /// not simulated.
    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        self.running = visible;
        if visible {
            self.last_ms = now_ms;
            self.last_draw_ms = now_ms;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn motion_time(&self) -> f64 {
        self.motion_time
    }
}

/// Render loop that owns a surface and drives a backdrop frame by frame.
pub struct RenderLoop<B: Backdrop> {
    surface: RenderSurface,
    pacer: FramePacer,
    backdrop: B,
    palette: Arc<SharedPalette>,
    pending_resize: Option<SurfaceSize>,
    frames_drawn: u64,
}

impl<B: Backdrop> RenderLoop<B> {
    /// Fails if the surface cannot be allocated; the embedding view must
    /// provide a drawable size.
    pub fn new(
        mut backdrop: B,
        size: SurfaceSize,
        palette: Arc<SharedPalette>,
        reduced_motion: bool,
        now_ms: f64,
    ) -> anyhow::Result<Self> {
        let mut surface = RenderSurface::new(size)?;
        backdrop.mount(&mut surface, &palette.get());
        info!(
            "Render loop '{}' mounted at {}x{} (dpr {:.2}, reduced motion: {})",
            backdrop.name(),
            size.width,
            size.height,
            size.dpr,
            reduced_motion
        );
        Ok(Self {
            surface,
            pacer: FramePacer::new(now_ms, reduced_motion),
            backdrop,
            palette,
            pending_resize: None,
            frames_drawn: 0,
        })
    }

    /// Queues a resize for the next frame. Later requests replace earlier
    /// ones, so a burst costs a single reallocation.
    pub fn request_resize(&mut self, size: SurfaceSize) {
        self.pending_resize = Some(size);
    }

    pub fn set_visible(&mut self, visible: bool, now_ms: f64) {
        if visible != self.pacer.is_running() {
            debug!("Render loop visibility: {}", visible);
        }
        self.pacer.set_visible(visible, now_ms);
    }

    pub fn frame(&mut self, ts_ms: f64) -> anyhow::Result<Frame> {
        if !self.pacer.is_running() {
            return Ok(Frame::Paused);
        }

        if let Some(size) = self.pending_resize.take() {
            self.surface.resize(size)?;
            self.backdrop.mount(&mut self.surface, &self.palette.get());
            debug!("Surface resized to {}x{} (dpr {:.2})", size.width, size.height, size.dpr);
        }

        let frame = self.pacer.frame(ts_ms);
        if let Frame::Draw { dt } = frame {
            let palette = self.palette.get();
            let ctx = FrameContext {
                dt,
                time: self.pacer.motion_time(),
                reduced_motion: self.pacer.reduced_motion(),
            };
            self.backdrop.draw(&mut self.surface, &palette, &ctx);
            self.frames_drawn += 1;
        }
        Ok(frame)
    }

    pub fn is_running(&self) -> bool {
        self.pacer.is_running()
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    pub fn surface(&self) -> &RenderSurface {
        &self.surface
    }

    pub fn backdrop(&self) -> &B {
        &self.backdrop
    }

    pub fn encode_png(&self) -> anyhow::Result<Vec<u8>> {
        self.surface.encode_png()
    }
}

//! Offscreen drawing surface: a tiny-skia pixmap behind a device-pixel-ratio
//! transform, addressed in logical pixels.

use anyhow::anyhow;
use mood_core::Rgb;
use tiny_skia::{
    BlendMode, Color, FillRule, GradientStop, LineCap, LineJoin, LinearGradient, Paint,
    PathBuilder, Pixmap, Point, RadialGradient, Rect, Shader, SpreadMode, Stroke, Transform,
};

/// Largest logical width or height a surface may take.
pub const MAX_SURFACE_SIDE: u32 = 8192;

/// Logical size plus device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
    pub dpr: f32,
}

impl SurfaceSize {
    /// Sides are capped at [`MAX_SURFACE_SIDE`]. The ratio is clamped to
    /// [1, 2]; anything non-finite counts as 1.
    pub fn new(width: u32, height: u32, dpr: f32) -> Self {
        let dpr = if dpr.is_finite() { dpr.clamp(1.0, 2.0) } else { 1.0 };
        Self {
            width: width.min(MAX_SURFACE_SIDE),
            height: height.min(MAX_SURFACE_SIDE),
            dpr,
        }
    }

    pub fn backing_width(&self) -> u32 {
        (self.width as f32 * self.dpr).floor() as u32
    }

    pub fn backing_height(&self) -> u32 {
        (self.height as f32 * self.dpr).floor() as u32
    }
}

pub struct RenderSurface {
    pixmap: Pixmap,
    size: SurfaceSize,
    transform: Transform,
}

impl RenderSurface {
    pub fn new(size: SurfaceSize) -> anyhow::Result<Self> {
        let pixmap = Pixmap::new(size.backing_width(), size.backing_height()).ok_or_else(|| {
            anyhow!(
                "cannot allocate {}x{} surface",
                size.backing_width(),
                size.backing_height()
            )
        })?;
        Ok(Self {
            pixmap,
            size,
            transform: Transform::from_scale(size.dpr, size.dpr),
        })
    }

    /// Reallocates the backing store; contents are not preserved.
    pub fn resize(&mut self, size: SurfaceSize) -> anyhow::Result<()> {
        *self = Self::new(size)?;
        Ok(())
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Logical width.
    pub fn width(&self) -> f32 {
        self.size.width as f32
    }

    /// Logical height.
    pub fn height(&self) -> f32 {
        self.size.height as f32
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Device pixel, un-premultiplied.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        self.pixmap.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Rgb::new(c.red(), c.green(), c.blue())
        })
    }

    pub fn encode_png(&self) -> anyhow::Result<Vec<u8>> {
        Ok(self.pixmap.encode_png()?)
    }

    /// Diagonal gradient over the whole surface, top-left to bottom-right,
    /// composited source-over at `alpha`.
    pub fn fill_linear_gradient(&mut self, from: Rgb, to: Rgb, alpha: f32) {
        let (w, h) = (self.width(), self.height());
        let shader = LinearGradient::new(
            Point::from_xy(0.0, 0.0),
            Point::from_xy(w, h),
            vec![
                GradientStop::new(0.0, color(from, alpha)),
                GradientStop::new(1.0, color(to, alpha)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        )
        .unwrap_or(Shader::SolidColor(color(from, alpha)));

        let mut paint = Paint::default();
        paint.shader = shader;
        paint.blend_mode = BlendMode::SourceOver;
        paint.anti_alias = false;

        if let Some(rect) = Rect::from_xywh(0.0, 0.0, w, h) {
            self.pixmap.fill_rect(rect, &paint, self.transform, None);
        }
    }

    /// Soft disc: opaque-ish at the inner 10% of `radius`, fading to nothing
    /// at the rim.
    pub fn fill_radial_glow(
        &mut self,
        cx: f32,
        cy: f32,
        radius: f32,
        tint: Rgb,
        alpha: f32,
        blend_mode: BlendMode,
    ) {
        let center = Point::from_xy(cx, cy);
        let Some(shader) = RadialGradient::new(
            center,
            center,
            radius,
            vec![
                GradientStop::new(0.1, color(tint, alpha)),
                GradientStop::new(1.0, color(tint, 0.0)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };

        let mut paint = Paint::default();
        paint.shader = shader;
        paint.blend_mode = blend_mode;
        paint.anti_alias = true;

        if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
            self.pixmap
                .fill_path(&path, &paint, FillRule::Winding, self.transform, None);
        }
    }

    /// Strokes independent segments `(x0, y0, x1, y1)` in one pass.
    pub fn stroke_segments(
        &mut self,
        segments: &[[f32; 4]],
        tint: Rgb,
        alpha: f32,
        width: f32,
        blend_mode: BlendMode,
    ) {
        if segments.is_empty() {
            return;
        }
        let mut pb = PathBuilder::new();
        for &[x0, y0, x1, y1] in segments {
            pb.move_to(x0, y0);
            pb.line_to(x1, y1);
        }
        let Some(path) = pb.finish() else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(color(tint, alpha));
        paint.blend_mode = blend_mode;
        paint.anti_alias = true;

        let mut stroke = Stroke::default();
        stroke.width = width;
        stroke.line_cap = LineCap::Round;
        stroke.line_join = LineJoin::Round;

        self.pixmap
            .stroke_path(&path, &paint, &stroke, self.transform, None);
    }
}

fn color(c: Rgb, alpha: f32) -> Color {
    let mut color = Color::from_rgba8(c.r, c.g, c.b, 255);
    color.set_alpha(alpha.clamp(0.0, 1.0));
    color
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_store_follows_dpr() {
        let size = SurfaceSize::new(101, 50, 1.5);
        assert_eq!(size.backing_width(), 151);
        assert_eq!(size.backing_height(), 75);

        let surface = RenderSurface::new(size).unwrap();
        assert_eq!(surface.pixmap().width(), 151);
        assert_eq!(surface.width(), 101.0);
    }

    #[test]
    fn test_dpr_is_clamped() {
        assert_eq!(SurfaceSize::new(10, 10, 3.0).dpr, 2.0);
        assert_eq!(SurfaceSize::new(10, 10, 0.5).dpr, 1.0);
        assert_eq!(SurfaceSize::new(10, 10, f32::NAN).dpr, 1.0);
    }

    #[test]
    fn test_sides_are_capped() {
        let size = SurfaceSize::new(60_000, 600, 2.0);
        assert_eq!(size.width, MAX_SURFACE_SIDE);
        assert_eq!(size.height, 600);
        assert_eq!(size.backing_width(), 2 * MAX_SURFACE_SIDE);
        assert_eq!(SurfaceSize::new(800, u32::MAX, 1.0).height, MAX_SURFACE_SIDE);
    }

    #[test]
    fn test_zero_area_surface_is_an_error() {
        assert!(RenderSurface::new(SurfaceSize::new(0, 10, 1.0)).is_err());
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut surface = RenderSurface::new(SurfaceSize::new(64, 64, 1.0)).unwrap();
        let red = Rgb::hex(0xff0000);
        let blue = Rgb::hex(0x0000ff);
        surface.fill_linear_gradient(red, blue, 1.0);

        let top_left = surface.pixel(0, 0).unwrap();
        let bottom_right = surface.pixel(63, 63).unwrap();
        assert!(top_left.r > 240 && top_left.b < 15);
        assert!(bottom_right.b > 240 && bottom_right.r < 15);
    }

    #[test]
    fn test_plus_glow_brightens() {
        let mut surface = RenderSurface::new(SurfaceSize::new(64, 64, 1.0)).unwrap();
        let base = Rgb::hex(0x202020);
        surface.fill_linear_gradient(base, base, 1.0);
        surface.fill_radial_glow(32.0, 32.0, 30.0, Rgb::hex(0x808080), 0.8, BlendMode::Plus);

        let center = surface.pixel(32, 32).unwrap();
        let corner = surface.pixel(0, 0).unwrap();
        assert!(center.r > base.r + 64);
        assert_eq!(corner, base);
    }

    #[test]
    fn test_low_alpha_repaint_moves_toward_target() {
        let mut surface = RenderSurface::new(SurfaceSize::new(8, 8, 1.0)).unwrap();
        surface.fill_linear_gradient(Rgb::hex(0xffffff), Rgb::hex(0xffffff), 1.0);
        let black = Rgb::hex(0x000000);
        surface.fill_linear_gradient(black, black, 0.055);
        let once = surface.pixel(4, 4).unwrap();
        assert!(once.r < 255 && once.r > 200);
        for _ in 0..200 {
            surface.fill_linear_gradient(black, black, 0.055);
        }
        assert!(surface.pixel(4, 4).unwrap().r < once.r);
    }

    #[test]
    fn test_png_encoding() {
        let surface = RenderSurface::new(SurfaceSize::new(4, 4, 1.0)).unwrap();
        let png = surface.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}

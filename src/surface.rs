//! Drawing surface seam between the particle simulations and the browser canvas.
//!
//! Snow and tree only ever talk to [`Surface`]; [`CanvasSurface`] is the
//! `CanvasRenderingContext2d` implementation used in the page, tests use a
//! recording surface instead.

use web_sys::CanvasRenderingContext2d;

/// 8-bit sRGB colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const GOLD: Rgb = Rgb::new(255, 215, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// `h` in degrees, `s` and `l` in 0..=1.
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let h = h.rem_euclid(360.0) / 360.0;
        let s = s.clamp(0.0, 1.0);
        let l = l.clamp(0.0, 1.0);
        if s == 0.0 {
            let v = (l * 255.0).round() as u8;
            return Self::new(v, v, v);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        let channel = |t: f64| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        };
        Self::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
    }

    pub fn to_css(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn to_css_alpha(self, alpha: f64) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }
}

/// One colour stop of a radial gradient; `offset` in 0..=1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GradientStop {
    pub offset: f64,
    pub color: Rgb,
    pub alpha: f64,
}

/// Logical viewport / surface size in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Minimal 2D drawing contract used by the render loops.
pub trait Surface {
    fn clear(&mut self, width: f64, height: f64);
    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgb, opacity: f64);
    /// Fill a circle of `radius` at (x, y) with a radial gradient from its centre.
    fn fill_radial_gradient(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        stops: &[GradientStop],
        opacity: f64,
    );
    fn set_glow(&mut self, blur: f64, color: Rgb);
    fn clear_glow(&mut self);
}

/// Canvas 2D implementation of [`Surface`].
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }

    fn circle_path(&self, x: f64, y: f64, radius: f64) {
        self.ctx.begin_path();
        self.ctx
            .arc(x, y, radius.max(0.0), 0.0, std::f64::consts::TAU)
            .ok();
    }
}

impl Surface for CanvasSurface {
    fn clear(&mut self, width: f64, height: f64) {
        self.ctx.clear_rect(0.0, 0.0, width, height);
    }

    fn fill_circle(&mut self, x: f64, y: f64, radius: f64, color: Rgb, opacity: f64) {
        self.ctx.set_global_alpha(opacity.clamp(0.0, 1.0));
        self.ctx.set_fill_style_str(&color.to_css());
        self.circle_path(x, y, radius);
        self.ctx.fill();
    }

    fn fill_radial_gradient(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        stops: &[GradientStop],
        opacity: f64,
    ) {
        let Ok(gradient) = self.ctx.create_radial_gradient(x, y, 0.0, x, y, radius.max(0.0))
        else {
            return;
        };
        for stop in stops {
            gradient
                .add_color_stop(stop.offset.clamp(0.0, 1.0) as f32, &stop.color.to_css_alpha(stop.alpha))
                .ok();
        }
        self.ctx.set_global_alpha(opacity.clamp(0.0, 1.0));
        self.ctx.set_fill_style_canvas_gradient(&gradient);
        self.circle_path(x, y, radius);
        self.ctx.fill();
    }

    fn set_glow(&mut self, blur: f64, color: Rgb) {
        self.ctx.set_shadow_blur(blur.max(0.0));
        self.ctx.set_shadow_color(&color.to_css());
    }

    fn clear_glow(&mut self) {
        self.ctx.set_shadow_blur(0.0);
        self.ctx.set_shadow_color("rgba(0,0,0,0)");
    }
}

//! Ambient snowfall overlay.
//!
//! A fixed array of flakes is allocated once; flakes that fall past the bottom
//! edge are recycled in place above the top edge, so the field never grows or
//! reallocates while the page is open.

use rand::Rng;
use rand::rngs::SmallRng;

use crate::surface::{Rgb, Surface, Viewport};

/// One snow flake. Velocities are in px per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SnowParticle {
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    pub size: f64,
    pub alpha: f64,
}

impl SnowParticle {
    /// Fresh flake somewhere above the visible area.
    fn spawn(rng: &mut impl Rng, bounds: Viewport) -> Self {
        let mut p = Self {
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            size: 0.0,
            alpha: 0.0,
        };
        p.reset(rng, bounds);
        p
    }

    fn reset(&mut self, rng: &mut impl Rng, bounds: Viewport) {
        self.x = rng.r#gen::<f64>() * bounds.width.max(0.0);
        // strictly negative so a recycled flake never starts on screen
        self.y = -rng.gen_range(1.0..=bounds.height.max(1.0));
        self.vx = rng.gen_range(-1.0..1.0);
        self.vy = rng.gen_range(1.0..3.0);
        self.size = rng.gen_range(1.0..4.0);
        self.alpha = rng.gen_range(0.3..0.8);
    }
}

pub struct SnowField {
    particles: Vec<SnowParticle>,
    bounds: Viewport,
    rng: SmallRng,
}

impl SnowField {
    pub fn new(count: usize, bounds: Viewport, mut rng: SmallRng) -> Self {
        let particles = (0..count)
            .map(|_| SnowParticle::spawn(&mut rng, bounds))
            .collect();
        Self {
            particles,
            bounds,
            rng,
        }
    }

    pub fn particles(&self) -> &[SnowParticle] {
        &self.particles
    }

    /// Direct access for tests and tooling that want to place flakes by hand.
    pub fn particles_mut(&mut self) -> &mut [SnowParticle] {
        &mut self.particles
    }

    pub fn bounds(&self) -> Viewport {
        self.bounds
    }

    /// Advance one frame. A flake that was already below the viewport is
    /// recycled instead of moved, every other flake is translated by its velocity.
    pub fn tick(&mut self) {
        let bounds = self.bounds;
        for p in self.particles.iter_mut() {
            if p.y > bounds.height {
                p.reset(&mut self.rng, bounds);
            } else {
                p.x += p.vx;
                p.y += p.vy;
            }
        }
    }

    pub fn draw(&self, surface: &mut impl Surface) {
        surface.clear(self.bounds.width, self.bounds.height);
        for p in &self.particles {
            surface.fill_circle(p.x, p.y, p.size, Rgb::WHITE, p.alpha);
        }
    }

    /// Only the stored bounds change; existing flakes keep their state.
    pub fn resize(&mut self, bounds: Viewport) {
        self.bounds = bounds;
    }
}

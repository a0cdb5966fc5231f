// Per-frame spin, painter sort, perspective projection and draw of the tree.
use super::{TreeParticleField, TreePoint};
use crate::config::Projection;
use crate::surface::{GradientStop, Rgb, Surface, Viewport};

/// Screen-space result of projecting one point.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub depth: f64,
}

pub struct TreeRenderer {
    field: TreeParticleField,
    projection: Projection,
    size: Viewport,
    rotation_angle: f64,
    time: f64,
}

impl TreeRenderer {
    /// `size` is the logical (pre device-pixel-ratio) surface size.
    pub fn new(field: TreeParticleField, size: Viewport, projection: Projection) -> Self {
        Self {
            field,
            projection,
            size,
            rotation_angle: 0.0,
            time: 0.0,
        }
    }

    pub fn points(&self) -> &[TreePoint] {
        self.field.points()
    }

    pub fn rotation_angle(&self) -> f64 {
        self.rotation_angle
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Rotate every point by the current angle and store the depth key.
    pub fn update_depth(&mut self) {
        let (sin, cos) = self.rotation_angle.sin_cos();
        for p in self.field.points_mut() {
            p.rotated_z = p.rotate(cos, sin).1;
        }
    }

    /// Farthest first.
    pub fn sort_by_depth(&mut self) {
        self.field
            .points_mut()
            .sort_unstable_by(|a, b| b.rotated_z.total_cmp(&a.rotated_z));
    }

    pub fn project(&self, point: &TreePoint) -> Projected {
        let (sin, cos) = self.rotation_angle.sin_cos();
        self.project_with(point, cos, sin)
    }

    fn project_with(&self, point: &TreePoint, cos: f64, sin: f64) -> Projected {
        let (rx, rz) = point.rotate(cos, sin);
        let Projection {
            focal_length,
            camera_offset,
            center_y_offset,
            ..
        } = self.projection;
        let scale = focal_length / (focal_length + rz + camera_offset);
        Projected {
            x: rx * scale + self.size.width / 2.0,
            y: point.y * scale + self.size.height / 2.0 + center_y_offset,
            scale,
            depth: rz,
        }
    }

    /// Depth fade, then twinkle modulation; never below the visibility floor.
    pub fn alpha_for(&self, point: &TreePoint, depth: f64) -> f64 {
        let offset = self.projection.camera_offset;
        let floor = self.projection.min_alpha;
        let mut alpha = ((offset - depth) / (2.0 * offset) + 0.2).clamp(floor, 1.0);
        if point.is_twinkling {
            alpha *= 0.55 + 0.45 * (self.time * 3.0 + point.twinkle_phase).sin();
        }
        alpha.max(floor)
    }

    /// Star halo blur radius for the current time.
    pub fn star_glow(&self) -> f64 {
        20.0 + 12.0 * (self.time * 2.0).sin()
    }

    pub fn render_frame(&mut self, surface: &mut impl Surface) {
        surface.clear(self.size.width, self.size.height);
        self.update_depth();
        self.sort_by_depth();

        let (sin, cos) = self.rotation_angle.sin_cos();
        let glow = self.star_glow();
        for point in self.field.points() {
            let proj = self.project_with(point, cos, sin);
            let alpha = self.alpha_for(point, proj.depth);
            let radius = point.size * proj.scale;

            if point.is_star {
                surface.set_glow(glow, Rgb::GOLD);
                surface.fill_circle(proj.x, proj.y, radius * 1.5, Rgb::GOLD, alpha);
                surface.clear_glow();
                continue;
            }

            surface.fill_circle(proj.x, proj.y, radius, point.color, alpha);
            if point.is_ornament {
                let shine = [
                    GradientStop {
                        offset: 0.0,
                        color: Rgb::WHITE,
                        alpha: 0.9,
                    },
                    GradientStop {
                        offset: 1.0,
                        color: point.color,
                        alpha: 0.0,
                    },
                ];
                surface.fill_radial_gradient(
                    proj.x - radius * 0.3,
                    proj.y - radius * 0.3,
                    radius * 0.6,
                    &shine,
                    alpha,
                );
            }
        }

        self.advance();
    }

    pub fn advance(&mut self) {
        self.rotation_angle += self.projection.rotation_step;
        self.time += self.projection.time_step;
    }
}

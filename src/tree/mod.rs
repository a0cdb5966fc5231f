//! Rotating particle tree.
//!
//! A spiral cone of points is generated once when the tree scene is entered
//! (`tree_field`) and then spun, projected and painter-sorted every frame
//! (`tree_render`). Points are plain value structs in one `Vec`; the renderer
//! reorders that vec in place each frame and never reallocates it.

use crate::surface::Rgb;

mod tree_field;
mod tree_render;

pub use tree_field::{Palette, Swatch, TreeParticleField};
pub use tree_render::{Projected, TreeRenderer};

/// One point of the tree in model space (y grows downwards, apex at negative y).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TreePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: Rgb,
    pub size: f64,
    pub is_ornament: bool,
    pub is_twinkling: bool,
    /// Offset into the shared twinkle sinusoid, radians.
    pub twinkle_phase: f64,
    pub is_star: bool,
    /// Depth after this frame's rotation; sort key for the painter pass.
    /// Starts out as the unrotated `z`.
    pub rotated_z: f64,
}

impl TreePoint {
    /// (x, z) rotated about the vertical axis, given the angle's cos/sin.
    #[inline]
    pub fn rotate(&self, cos: f64, sin: f64) -> (f64, f64) {
        (self.x * cos - self.z * sin, self.x * sin + self.z * cos)
    }
}

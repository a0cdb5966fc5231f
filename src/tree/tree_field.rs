// Tree point cloud generation: spiral cone + weighted palette + star.
use rand::Rng;
use rand::distributions::{Distribution, WeightedError, WeightedIndex};

use super::TreePoint;
use crate::config::TreeShape;
use crate::surface::Rgb;

/// What a palette draw produces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Swatch {
    /// Foliage green; lightness is drawn per point from `min_l..max_l`.
    Foliage { hue: f64, saturation: f64, min_l: f64, max_l: f64 },
    /// White / silver snow highlights.
    Frost(Rgb),
    /// Rare coloured ornament accents.
    Accent(Rgb),
}

impl Swatch {
    fn pick(&self, rng: &mut impl Rng) -> Rgb {
        match *self {
            Swatch::Foliage {
                hue,
                saturation,
                min_l,
                max_l,
            } => Rgb::from_hsl(hue, saturation, rng.gen_range(min_l..max_l)),
            Swatch::Frost(c) | Swatch::Accent(c) => c,
        }
    }
}

const DEFAULT_SWATCHES: [(Swatch, u32); 6] = [
    (
        Swatch::Foliage {
            hue: 140.0,
            saturation: 0.8,
            min_l: 0.3,
            max_l: 0.6,
        },
        60,
    ),
    (Swatch::Frost(Rgb::WHITE), 14),
    (Swatch::Frost(Rgb::new(0xc0, 0xc8, 0xd0)), 14),
    (Swatch::Accent(Rgb::new(0xf8, 0xb2, 0x29)), 5),
    (Swatch::Accent(Rgb::new(0xe6, 0x39, 0x46)), 4),
    (Swatch::Accent(Rgb::new(0x4c, 0xc9, 0xf0)), 3),
];

/// Weighted categorical colour table.
#[derive(Clone, Debug)]
pub struct Palette {
    swatches: Vec<Swatch>,
    index: WeightedIndex<u32>,
}

impl Palette {
    pub fn new(entries: &[(Swatch, u32)]) -> Result<Self, WeightedError> {
        let index = WeightedIndex::new(entries.iter().map(|(_, w)| *w))?;
        Ok(Self {
            swatches: entries.iter().map(|(s, _)| *s).collect(),
            index,
        })
    }

    pub fn swatches(&self) -> &[Swatch] {
        &self.swatches
    }

    /// Draw a swatch index, then the concrete colour.
    pub fn draw(&self, rng: &mut impl Rng) -> (usize, Rgb) {
        let i = self.index.sample(rng);
        (i, self.swatches[i].pick(rng))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new(&DEFAULT_SWATCHES).expect("default swatch weights are positive")
    }
}

/// Generated point cloud; the last point is always the star.
#[derive(Clone, Debug)]
pub struct TreeParticleField {
    points: Vec<TreePoint>,
    scale: f64,
}

impl TreeParticleField {
    /// `count` spiral points plus the star, using the default shape and palette.
    pub fn generate(
        count: usize,
        container_width: f64,
        container_height: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let shape = TreeShape {
            point_count: count,
            ..TreeShape::default()
        };
        Self::generate_with(&shape, &Palette::default(), container_width, container_height, rng)
    }

    pub fn generate_with(
        shape: &TreeShape,
        palette: &Palette,
        container_width: f64,
        _container_height: f64,
        rng: &mut impl Rng,
    ) -> Self {
        let scale = if container_width < shape.narrow_width {
            shape.narrow_scale
        } else {
            1.0
        };
        let count = shape.point_count;
        let half = shape.half_height * scale;
        let sweep = shape.turns * std::f64::consts::TAU;

        let mut points = Vec::with_capacity(count + 1);
        for i in 0..count {
            let p = i as f64 / count as f64;
            let angle = p * sweep;
            // apex (-half) at p = 0, base (+half) at p -> 1
            let h = p * 2.0 * half - half;
            let norm_h = (h + half) / (2.0 * half);
            let radius = norm_h * shape.base_radius * scale;

            // [0, jitter); a zero jitter gives an exact spiral
            let mut jitter = || rng.r#gen::<f64>() * shape.jitter;
            let x = angle.cos() * (radius + jitter());
            let y = h + jitter();
            let z = angle.sin() * (radius + jitter());

            let (_, color) = palette.draw(rng);
            let is_ornament = rng.gen_bool(shape.ornament_chance);
            let size = if is_ornament {
                rng.gen_range(3.0..5.0)
            } else {
                rng.gen_range(0.5..2.5)
            };
            let is_twinkling = rng.gen_bool(shape.twinkle_chance);
            let twinkle_phase = if is_twinkling {
                rng.gen_range(0.0..std::f64::consts::TAU)
            } else {
                0.0
            };

            points.push(TreePoint {
                x,
                y,
                z,
                color,
                size,
                is_ornament,
                is_twinkling,
                twinkle_phase,
                is_star: false,
                rotated_z: z,
            });
        }

        points.push(TreePoint {
            x: 0.0,
            y: -(shape.half_height + 10.0) * scale,
            z: 0.0,
            color: Rgb::GOLD,
            size: shape.star_size,
            is_ornament: false,
            is_twinkling: false,
            twinkle_phase: 0.0,
            is_star: true,
            rotated_z: 0.0,
        });

        Self { points, scale }
    }

    pub fn points(&self) -> &[TreePoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [TreePoint] {
        &mut self.points
    }

    /// Responsive factor applied to the geometry (1.0 or the narrow scale).
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

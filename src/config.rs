//! Tunables for the whole greeting sequence.
//!
//! Everything that used to be a magic number in the page script lives here so the
//! core components can be driven with alternative timings in tests. With the
//! `serde` feature the config can be deserialized (missing fields fall back to
//! the defaults below).

use chrono::NaiveDate;
use std::fmt;

/// Calendar tear-off timing. All durations are milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalendarTiming {
    pub initial_delay_ms: f64,
    /// Geometric factor applied to the delay after every step (< 1 accelerates).
    pub decay: f64,
    pub floor_ms: f64,
    /// Tear visuals are only spawned while the delay is above this.
    pub tear_threshold_ms: f64,
    pub initial_pause_ms: f64,
    pub completion_pause_ms: f64,
    pub tear_display_ms: f64,
}

impl Default for CalendarTiming {
    fn default() -> Self {
        Self {
            initial_delay_ms: 800.0,
            decay: 0.92,
            floor_ms: 10.0,
            tear_threshold_ms: 30.0,
            initial_pause_ms: 1000.0,
            completion_pause_ms: 1500.0,
            tear_display_ms: 600.0,
        }
    }
}

/// Scene switching delays (ms).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SceneTiming {
    /// Gift lid animation time before the calendar scene is entered.
    pub unwrap_delay_ms: f64,
    /// Gap between deactivating one scene and activating the next.
    pub crossfade_ms: f64,
}

impl Default for SceneTiming {
    fn default() -> Self {
        Self {
            unwrap_delay_ms: 1500.0,
            crossfade_ms: 500.0,
        }
    }
}

/// Spiral cone geometry in model units.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TreeShape {
    pub point_count: usize,
    pub half_height: f64,
    pub base_radius: f64,
    pub turns: f64,
    pub jitter: f64,
    /// Containers narrower than this get `narrow_scale` applied.
    pub narrow_width: f64,
    pub narrow_scale: f64,
    pub ornament_chance: f64,
    pub twinkle_chance: f64,
    pub star_size: f64,
    /// Logical (CSS pixel) size of the tree canvas.
    pub surface_width: f64,
    pub surface_height: f64,
}

impl Default for TreeShape {
    fn default() -> Self {
        Self {
            point_count: 1200,
            half_height: 200.0,
            base_radius: 160.0,
            turns: 20.0,
            jitter: 10.0,
            narrow_width: 350.0,
            narrow_scale: 0.7,
            ornament_chance: 0.06,
            twinkle_chance: 0.18,
            star_size: 10.0,
            surface_width: 400.0,
            surface_height: 500.0,
        }
    }
}

/// Fixed-focal perspective and per-frame increments of the tree renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Projection {
    pub focal_length: f64,
    pub camera_offset: f64,
    /// The tree sits slightly below the canvas centre.
    pub center_y_offset: f64,
    pub rotation_step: f64,
    pub time_step: f64,
    pub min_alpha: f64,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            focal_length: 350.0,
            camera_offset: 250.0,
            center_y_offset: 30.0,
            rotation_step: 0.015,
            time_step: 1.0 / 60.0,
            min_alpha: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GreetingConfig {
    pub start_date: NaiveDate,
    pub target_date: NaiveDate,
    pub calendar: CalendarTiming,
    pub scenes: SceneTiming,
    pub tree: TreeShape,
    pub projection: Projection,
    pub snow_count: usize,
    pub counter_refresh_ms: f64,
}

impl Default for GreetingConfig {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap_or_default(),
            target_date: NaiveDate::from_ymd_opt(2025, 12, 25).unwrap_or_default(),
            calendar: CalendarTiming::default(),
            scenes: SceneTiming::default(),
            tree: TreeShape::default(),
            projection: Projection::default(),
            snow_count: 100,
            counter_refresh_ms: 100.0,
        }
    }
}

/// Reasons a config cannot drive the sequence.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    TargetBeforeStart { start: NaiveDate, target: NaiveDate },
    DecayOutOfRange(f64),
    NonPositiveDuration(&'static str),
    EmptyParticleSet(&'static str),
    ChanceOutOfRange(&'static str, f64),
    NegativeLength(&'static str, f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::TargetBeforeStart { start, target } => {
                write!(f, "target date {target} is before start date {start}")
            }
            ConfigError::DecayOutOfRange(d) => write!(f, "calendar decay {d} must be in (0, 1)"),
            ConfigError::NonPositiveDuration(name) => write!(f, "{name} must be positive"),
            ConfigError::EmptyParticleSet(name) => write!(f, "{name} must be at least 1"),
            ConfigError::ChanceOutOfRange(name, p) => {
                write!(f, "{name} = {p} is not a probability")
            }
            ConfigError::NegativeLength(name, v) => {
                write!(f, "{name} = {v} must be zero or more")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl GreetingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_date < self.start_date {
            return Err(ConfigError::TargetBeforeStart {
                start: self.start_date,
                target: self.target_date,
            });
        }
        let decay = self.calendar.decay;
        if !(decay > 0.0 && decay < 1.0) {
            return Err(ConfigError::DecayOutOfRange(decay));
        }
        let durations = [
            ("calendar.initial_delay_ms", self.calendar.initial_delay_ms),
            ("calendar.floor_ms", self.calendar.floor_ms),
            ("projection.focal_length", self.projection.focal_length),
            ("counter_refresh_ms", self.counter_refresh_ms),
        ];
        for (name, value) in durations {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveDuration(name));
            }
        }
        if self.tree.point_count == 0 {
            return Err(ConfigError::EmptyParticleSet("tree.point_count"));
        }
        if self.snow_count == 0 {
            return Err(ConfigError::EmptyParticleSet("snow_count"));
        }
        let chances = [
            ("tree.ornament_chance", self.tree.ornament_chance),
            ("tree.twinkle_chance", self.tree.twinkle_chance),
        ];
        for (name, p) in chances {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::ChanceOutOfRange(name, p));
            }
        }
        let jitter = self.tree.jitter;
        if !(jitter >= 0.0 && jitter.is_finite()) {
            return Err(ConfigError::NegativeLength("tree.jitter", jitter));
        }
        Ok(())
    }
}

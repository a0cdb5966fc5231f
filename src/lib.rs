//! Holiday greeting core crate.
//!
//! A gift is clicked open, a desk calendar tears itself off day by day (faster
//! and faster) until it lands on the target date, and then a spinning particle
//! tree with falling snow takes over together with a running elapsed counter.
//!
//! The simulation pieces (`snow`, `tree`, `calendar`, `counter`, `scene`) are
//! plain Rust and run under `cargo test` on the host. `web` and `schedule` wire
//! them to the DOM, canvases and browser timers.

use wasm_bindgen::prelude::*;

pub mod calendar;
pub mod config;
pub mod counter;
pub mod scene;
pub mod schedule;
pub mod snow;
pub mod surface;
pub mod tree;
mod web;

pub use calendar::{CalendarFace, CalendarSequencer, SequencerState, StepOutcome, TearVisual};
pub use config::{ConfigError, GreetingConfig};
pub use counter::{Elapsed, ElapsedCounter};
pub use scene::{PlaybackError, Scene, SceneController, Stage};
pub use snow::{SnowField, SnowParticle};
pub use surface::{Rgb, Surface, Viewport};
pub use tree::{TreeParticleField, TreePoint, TreeRenderer};

// Optional small allocator for size (feature gated)
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    // a second init (e.g. module re-instantiated) is harmless
    console_log::init_with_level(log::Level::Info).ok();
}

/// Start the greeting with the built-in dates and timings.
#[wasm_bindgen]
pub fn start_greeting() -> Result<(), JsValue> {
    launch(GreetingConfig::default())
}

/// Start the greeting with a JSON config; omitted fields keep their defaults.
#[cfg(feature = "serde_json")]
#[wasm_bindgen]
pub fn start_greeting_with_config(json: &str) -> Result<(), JsValue> {
    let config: GreetingConfig =
        serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("config: {e}")))?;
    launch(config)
}

fn launch(config: GreetingConfig) -> Result<(), JsValue> {
    config
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    web::start(config)
}

//! Gift -> Calendar -> Tree sequencing.
//!
//! [`SceneController`] is a small state machine driven by a single external
//! clock: the page feeds it clicks and `tick(now)` calls, and it talks back to
//! the page exclusively through [`Stage`]. Scenes only ever move forward.

use std::fmt;

use crate::calendar::{CalendarFace, CalendarSequencer, SequencerState};
use crate::config::{GreetingConfig, SceneTiming};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scene {
    Gift,
    Calendar,
    Tree,
}

impl Scene {
    /// DOM id of the scene container.
    pub fn element_id(self) -> &'static str {
        match self {
            Scene::Gift => "scene-gift",
            Scene::Calendar => "scene-calendar",
            Scene::Tree => "scene-tree",
        }
    }

    pub fn next(self) -> Option<Scene> {
        match self {
            Scene::Gift => Some(Scene::Calendar),
            Scene::Calendar => Some(Scene::Tree),
            Scene::Tree => None,
        }
    }
}

/// Audio start rejected by the platform (autoplay policy, missing element...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlaybackError(pub String);

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "audio playback failed: {}", self.0)
    }
}

impl std::error::Error for PlaybackError {}

/// Everything the controller needs from the page.
pub trait Stage: CalendarFace {
    fn activate(&mut self, scene: Scene);
    fn deactivate(&mut self, scene: Scene);
    /// Start the gift's opening animation.
    fn open_gift(&mut self);
    fn play_audio(&mut self) -> Result<(), PlaybackError>;
    fn start_counter(&mut self);
    /// Build the tree field, renderer and snow field and start their loops.
    fn start_tree(&mut self);
}

pub struct SceneController {
    timing: SceneTiming,
    current: Scene,
    gift_opened: bool,
    unwrap_at: Option<f64>,
    pending_activation: Option<(Scene, f64)>,
    sequencer: CalendarSequencer,
    tree_started: bool,
}

impl SceneController {
    pub fn new(config: &GreetingConfig) -> Self {
        Self {
            timing: config.scenes,
            current: Scene::Gift,
            gift_opened: false,
            unwrap_at: None,
            pending_activation: None,
            sequencer: CalendarSequencer::new(
                config.start_date,
                config.target_date,
                config.calendar,
            ),
            tree_started: false,
        }
    }

    /// Show the gift scene.
    pub fn mount(&mut self, stage: &mut impl Stage) {
        stage.activate(Scene::Gift);
    }

    pub fn current_scene(&self) -> Scene {
        self.current
    }

    pub fn sequencer(&self) -> &CalendarSequencer {
        &self.sequencer
    }

    pub fn is_tree_started(&self) -> bool {
        self.tree_started
    }

    /// Tree running and nothing left to schedule; the driver may stop ticking.
    pub fn is_settled(&self) -> bool {
        self.tree_started && self.pending_activation.is_none()
    }

    /// Only the first click counts.
    pub fn on_gift_click(&mut self, now: f64, stage: &mut impl Stage) {
        if self.gift_opened {
            log::debug!("gift already opened, ignoring click");
            return;
        }
        self.gift_opened = true;
        if let Err(err) = stage.play_audio() {
            log::warn!("{err}");
        }
        stage.open_gift();
        self.unwrap_at = Some(now + self.timing.unwrap_delay_ms);
    }

    pub fn tick(&mut self, now: f64, stage: &mut impl Stage) {
        if let Some(at) = self.unwrap_at {
            if now >= at {
                self.unwrap_at = None;
                self.advance_scene(now, stage);
                self.sequencer.start(now);
            }
        }

        if let Some((scene, at)) = self.pending_activation {
            if now >= at {
                self.pending_activation = None;
                stage.activate(scene);
            }
        }

        if self.current == Scene::Calendar
            && self.sequencer.state() != SequencerState::Idle
            && self.sequencer.tick(now, stage)
        {
            stage.start_counter();
            self.advance_scene(now, stage);
            stage.start_tree();
            self.tree_started = true;
        }
    }

    /// Deactivate the current scene now, activate the next after the cross-fade gap.
    fn advance_scene(&mut self, now: f64, stage: &mut impl Stage) {
        let Some(next) = self.current.next() else {
            return;
        };
        log::info!("scene {:?} -> {:?}", self.current, next);
        stage.deactivate(self.current);
        self.current = next;
        self.pending_activation = Some((next, now + self.timing.crossfade_ms));
    }
}

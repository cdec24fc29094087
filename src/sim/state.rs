//! Simulation entities and lifecycle bookkeeping

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::config::{DifficultyKey, GameConfig};
use crate::events::EngineEvent;
use crate::scores::BestScores;

/// Lifecycle of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    /// Title screen, nothing moves except ambient scenery
    #[default]
    Idle,
    /// Active simulation
    Play,
    /// Frozen, resumable back into `Play`
    Paused,
    /// Score locked, restartable after the reset delay
    Dead,
}

impl GameState {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Idle => "idle",
            GameState::Play => "play",
            GameState::Paused => "paused",
            GameState::Dead => "dead",
        }
    }
}

/// The player
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bird {
    /// Top edge, pixels from the top of the canvas
    pub y: f32,
    /// Vertical velocity, px/tick (positive is down)
    pub vy: f32,
    /// Visual tilt in degrees
    pub rot: f32,
}

impl Bird {
    /// Start position: slightly above the vertical centre, at rest
    pub fn spawn(config: &GameConfig) -> Self {
        Self {
            y: config.height / 2.0 - 30.0,
            vy: 0.0,
            rot: 0.0,
        }
    }

    pub fn flap(&mut self, config: &GameConfig) {
        self.vy = config.flap_force;
    }
}

/// One obstacle column: a top segment of height `top_h`, then the gap
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pipe {
    pub x: f32,
    pub top_h: f32,
    /// Set once the bird has passed the trailing edge
    pub scored: bool,
}

/// A drifting cloud
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cloud {
    pub pos: Vec2,
    pub w: f32,
    /// Absolute px/tick for foreground clouds, fraction of pipe speed for parallax layers
    pub speed: f32,
}

/// Score, best scores, lifecycle and spawn timing
///
/// Every observable change is queued as an `EngineEvent`; the engine drains
/// the queue and fans it out to listeners after each command or frame.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub state: GameState,
    pub score: u32,
    pub best_scores: BestScores,
    pub difficulty: DifficultyKey,
    /// Timestamp (ms) of the last pipe spawn
    pub last_pipe_time: f64,
    /// Delay (ms) until the next spawn; 0 means "use the config interval"
    pub next_spawn_delay: f64,
    pub dead_time: f64,
    pub paused_time: f64,
    pub prev_state_before_pause: Option<GameState>,
    events: Vec<EngineEvent>,
}

impl EngineState {
    pub fn new(best_scores: BestScores, difficulty: DifficultyKey) -> Self {
        Self {
            state: GameState::Idle,
            score: 0,
            best_scores,
            difficulty,
            last_pipe_time: 0.0,
            next_spawn_delay: 0.0,
            dead_time: 0.0,
            paused_time: 0.0,
            prev_state_before_pause: None,
            events: Vec::new(),
        }
    }

    pub fn set_state(&mut self, state: GameState) {
        if self.state == state {
            return;
        }
        self.state = state;
        self.events.push(EngineEvent::StateChange(state));
    }

    pub fn set_score(&mut self, score: u32) {
        if self.score == score {
            return;
        }
        self.score = score;
        self.events.push(EngineEvent::ScoreChange(score));
    }

    pub fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    /// Enter `Dead`. Returns true when the run set a new best for the active difficulty.
    pub fn die(&mut self, now: f64) -> bool {
        self.set_state(GameState::Dead);
        self.dead_time = now;
        if self.best_scores.record(self.difficulty, self.score) {
            self.events
                .push(EngineEvent::BestScoreChange(self.best_scores));
            return true;
        }
        false
    }

    /// Clear transient run state and return to `Idle`
    pub fn reset(&mut self) {
        self.set_score(0);
        self.set_state(GameState::Idle);
        self.last_pipe_time = 0.0;
        self.next_spawn_delay = 0.0;
        self.dead_time = 0.0;
        self.prev_state_before_pause = None;
    }

    /// Start spawn timing for a fresh run
    pub fn begin_run(&mut self, now: f64) {
        self.set_state(GameState::Play);
        self.last_pipe_time = now;
        self.next_spawn_delay = 0.0;
    }

    /// Take all queued events, oldest first
    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }
}

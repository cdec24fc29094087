//! Flappy Nature - a flap-to-avoid-obstacles arcade simulation
//!
//! Core modules:
//! - `sim`: Fixed-tick simulation (physics, pooled pipes, parallax background, patterns)
//! - `difficulty`: Static difficulty profiles, phases and milestones
//! - `engine`: Lifecycle state machine and fixed-timestep frame loop
//! - `platform`: Clock and key-value storage abstractions (browser/native)
//! - `persistence`: Best scores and difficulty preference load/save
//! - `render`: Contract between the simulation and an external renderer

pub mod config;
pub mod difficulty;
pub mod engine;
pub mod events;
pub mod persistence;
pub mod platform;
pub mod render;
pub mod sanitize;
pub mod scores;
pub mod settings;
pub mod sim;

pub use config::{DifficultyKey, GameConfig, apply_difficulty};
pub use engine::Engine;
pub use events::{EngineEvent, ListenerId};
pub use scores::BestScores;
pub use settings::Settings;
pub use sim::GameState;

/// Loop and pool constants
pub mod consts {
    /// Wall-clock duration of one simulation tick (60 Hz)
    pub const TICK_MS: f64 = 1000.0 / 60.0;
    /// Logical step handed to the simulation per tick
    pub const FIXED_DT: f32 = 1.0;
    /// Maximum ticks per frame; any remainder past this is dropped
    pub const MAX_TICKS: u32 = 4;

    /// Preallocated pipe slots
    pub const PIPE_POOL_SIZE: usize = 5;
    /// Preallocated banner-plane slots
    pub const PLANE_POOL_SIZE: usize = 3;
    /// Planes allowed on screen at once
    pub const MAX_ACTIVE_PLANES: usize = 2;

    /// Pipes never leave less than this much solid above or below the gap
    pub const PIPE_EDGE_MARGIN: f32 = 60.0;

    /// Rotation target is `vy * BIRD_ROT_SCALE`, clamped to this range (degrees)
    pub const BIRD_ROT_MIN: f32 = -20.0;
    pub const BIRD_ROT_MAX: f32 = 55.0;
    pub const BIRD_ROT_SCALE: f32 = 3.2;
    /// Per-tick rotation smoothing, intentionally not scaled by dt
    pub const BIRD_ROT_LERP: f32 = 0.12;
}

pub const TAU: f32 = std::f32::consts::TAU;

/// Maximum of `f(item)` over `items`, `-inf` when empty
#[inline]
pub fn max_of<T>(items: &[T], f: impl Fn(&T) -> f32) -> f32 {
    items.iter().map(f).fold(f32::NEG_INFINITY, f32::max)
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Uniform draw in `[lo, hi)`; collapses to `lo` when the range is empty or inverted
#[inline]
pub fn random_between<R: rand::Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        return lo;
    }
    lo + rng.random::<f32>() * (hi - lo)
}

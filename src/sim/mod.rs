//! Simulation module
//!
//! All gameplay logic lives here:
//! - Fixed timestep only (`dt` is one logical tick)
//! - Randomness comes from the caller's RNG
//! - Fixed-capacity pools for pipes and planes, recycled in place
//! - No rendering or platform dependencies

pub mod background;
pub mod patterns;
pub mod physics;
pub mod progression;
pub mod state;
pub mod tick;

pub use background::{Background, BackgroundDeps, BgLayers, Plane};
pub use patterns::{PatternGenerator, PipePlan};
pub use physics::{
    PipeUpdate, check_ground_collision, check_near_miss, check_pipe_collision, check_pipe_score,
    spawn_pipe, update_bird, update_clouds, update_pipes,
};
pub use progression::{PhaseChange, Progression, ScoreOutcome};
pub use state::{Bird, Cloud, EngineState, GameState, Pipe};
pub use tick::{World, tick};

//! Renderer contract
//!
//! The engine hands a renderer one borrowed `Frame` per display refresh.
//! Nothing flows back into the simulation.

use crate::config::GameConfig;
use crate::sanitize::{Fonts, GameColors};
use crate::sim::{Background, Bird, Cloud, GameState, Pipe};

/// Snapshot of everything visible this frame
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub config: &'a GameConfig,
    pub background: &'a Background,
    pub clouds: &'a [Cloud],
    pub pipes: &'a [Pipe],
    /// Interpolated between the last two ticks
    pub bird: Bird,
    pub score: u32,
    pub best: u32,
    pub state: GameState,
    /// Fraction of a tick left in the accumulator, `[0, 1)`
    pub alpha: f32,
    /// Clock time in ms
    pub now: f64,
    pub fps: Option<u32>,
    pub colors: &'a GameColors,
    pub fonts: &'a Fonts,
}

pub trait Renderer {
    fn draw(&mut self, frame: &Frame<'_>);
}

/// Discards frames; counts them for headless runs
#[derive(Debug, Default)]
pub struct NullRenderer {
    pub frames: u64,
}

impl Renderer for NullRenderer {
    fn draw(&mut self, _frame: &Frame<'_>) {
        self.frames += 1;
    }
}

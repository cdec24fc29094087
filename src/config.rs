//! Tunable game parameters and difficulty presets
//!
//! `GameConfig` is owned by the engine and replaced field-wise when the
//! difficulty changes or a new phase kicks in. Subsystems only ever see it
//! through a shared borrow for the duration of a tick.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::PIPE_EDGE_MARGIN;
use crate::difficulty::get_difficulty_profile;

/// Logical canvas width
pub const BASE_W: f32 = 380.0;
/// Logical canvas height
pub const BASE_H: f32 = 520.0;

/// Difficulty selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyKey {
    Easy,
    #[default]
    Normal,
    Hard,
    Souls,
}

impl DifficultyKey {
    pub const ALL: [DifficultyKey; 4] = [
        DifficultyKey::Easy,
        DifficultyKey::Normal,
        DifficultyKey::Hard,
        DifficultyKey::Souls,
    ];

    /// Storage/wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyKey::Easy => "easy",
            DifficultyKey::Normal => "normal",
            DifficultyKey::Hard => "hard",
            DifficultyKey::Souls => "souls",
        }
    }

    /// Display name
    pub fn label(&self) -> &'static str {
        match self {
            DifficultyKey::Easy => "Easy",
            DifficultyKey::Normal => "Normal",
            DifficultyKey::Hard => "Hard",
            DifficultyKey::Souls => "Souls",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "easy" => Some(DifficultyKey::Easy),
            "normal" => Some(DifficultyKey::Normal),
            "hard" => Some(DifficultyKey::Hard),
            "souls" => Some(DifficultyKey::Souls),
            _ => None,
        }
    }
}

/// Per-difficulty physics overrides
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyPreset {
    pub gravity: f32,
    pub flap_force: f32,
    pub terminal_vel: f32,
    pub pipe_gap: f32,
    pub pipe_speed: f32,
    /// Milliseconds between pipe spawns
    pub pipe_spawn: f64,
    pub hitbox_pad: f32,
}

pub const EASY_PRESET: DifficultyPreset = DifficultyPreset {
    gravity: 0.38,
    flap_force: -6.6,
    terminal_vel: 9.0,
    pipe_gap: 175.0,
    pipe_speed: 2.0,
    pipe_spawn: 1700.0,
    hitbox_pad: 7.0,
};

pub const NORMAL_PRESET: DifficultyPreset = DifficultyPreset {
    gravity: 0.45,
    flap_force: -7.2,
    terminal_vel: 10.0,
    pipe_gap: 155.0,
    pipe_speed: 2.4,
    pipe_spawn: 1500.0,
    hitbox_pad: 5.0,
};

pub const HARD_PRESET: DifficultyPreset = DifficultyPreset {
    gravity: 0.52,
    flap_force: -7.8,
    terminal_vel: 11.0,
    pipe_gap: 135.0,
    pipe_speed: 2.9,
    pipe_spawn: 1300.0,
    hitbox_pad: 3.0,
};

pub const SOULS_PRESET: DifficultyPreset = DifficultyPreset {
    gravity: 0.58,
    flap_force: -8.2,
    terminal_vel: 12.0,
    pipe_gap: 118.0,
    pipe_speed: 3.4,
    pipe_spawn: 1150.0,
    hitbox_pad: 2.0,
};

/// Preset lookup
pub fn difficulty_preset(key: DifficultyKey) -> &'static DifficultyPreset {
    match key {
        DifficultyKey::Easy => &EASY_PRESET,
        DifficultyKey::Normal => &NORMAL_PRESET,
        DifficultyKey::Hard => &HARD_PRESET,
        DifficultyKey::Souls => &SOULS_PRESET,
    }
}

/// Flat set of simulation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub width: f32,
    pub height: f32,
    /// Downward acceleration, px/tick²
    pub gravity: f32,
    /// Velocity set on flap (negative is up)
    pub flap_force: f32,
    /// Maximum downward velocity
    pub terminal_vel: f32,
    pub pipe_width: f32,
    pub pipe_gap: f32,
    /// Scroll speed in px/tick
    pub pipe_speed: f32,
    /// Milliseconds between spawns
    pub pipe_spawn: f64,
    /// Maximum +/- jitter applied to each spawn delay (ms)
    pub pipe_spawn_variation: f64,
    /// Inward shrink of the bird hitbox on every side
    pub hitbox_pad: f32,
    /// Distance from a gap edge that still counts as a near miss
    pub near_miss_margin: f32,
    pub ground_h: f32,
    pub bird_size: f32,
    pub bird_x: f32,
    pub cloud_count: usize,
    /// Milliseconds after death before a flap restarts the run
    pub reset_delay: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: BASE_W,
            height: BASE_H,
            gravity: NORMAL_PRESET.gravity,
            flap_force: NORMAL_PRESET.flap_force,
            terminal_vel: NORMAL_PRESET.terminal_vel,
            pipe_width: 52.0,
            pipe_gap: NORMAL_PRESET.pipe_gap,
            pipe_speed: NORMAL_PRESET.pipe_speed,
            pipe_spawn: NORMAL_PRESET.pipe_spawn,
            pipe_spawn_variation: 0.0,
            hitbox_pad: NORMAL_PRESET.hitbox_pad,
            near_miss_margin: 8.0,
            ground_h: 50.0,
            bird_size: 26.0,
            bird_x: 70.0,
            cloud_count: 4,
            reset_delay: 600.0,
        }
    }
}

impl GameConfig {
    /// Y coordinate of the ground surface
    #[inline]
    pub fn ground_y(&self) -> f32 {
        self.height - self.ground_h
    }

    /// Largest top-pipe height that still leaves the bottom margin
    #[inline]
    pub fn max_top_h(&self) -> f32 {
        self.height - self.ground_h - self.pipe_gap - PIPE_EDGE_MARGIN
    }
}

/// Overwrite the difficulty-dependent fields of `config`
pub fn apply_difficulty(key: DifficultyKey, config: &mut GameConfig) {
    let preset = difficulty_preset(key);
    let profile = get_difficulty_profile(key);

    config.gravity = preset.gravity;
    config.flap_force = preset.flap_force;
    config.terminal_vel = preset.terminal_vel;
    config.pipe_gap = preset.pipe_gap;
    config.pipe_speed = preset.pipe_speed;
    config.pipe_spawn = preset.pipe_spawn;
    config.hitbox_pad = preset.hitbox_pad;
    config.near_miss_margin = profile.near_miss_margin;
    config.pipe_spawn_variation = if profile.has_timing_variation {
        profile.timing_variation_amount
    } else {
        0.0
    };
}

/// Reasons a config cannot drive the simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("canvas dimensions must be positive (got {width}x{height})")]
    Dimensions { width: f32, height: f32 },
    #[error("ground height {ground_h} does not fit a canvas of height {height}")]
    Ground { ground_h: f32, height: f32 },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("hitbox padding {pad} must be less than half the bird size {bird_size}")]
    HitboxPad { pad: f32, bird_size: f32 },
    #[error("pipe gap {gap} leaves no room for pipes between the {margin}px margins")]
    GapTooLarge { gap: f32, margin: f32 },
}

/// Check that `config` describes a playable field
pub fn validate_config(config: &GameConfig) -> Result<(), ConfigError> {
    if config.width <= 0.0 || config.height <= 0.0 {
        return Err(ConfigError::Dimensions {
            width: config.width,
            height: config.height,
        });
    }
    if config.ground_h < 0.0 || config.ground_h >= config.height {
        return Err(ConfigError::Ground {
            ground_h: config.ground_h,
            height: config.height,
        });
    }

    let positive: [(&'static str, f64); 7] = [
        ("gravity", config.gravity as f64),
        ("terminal_vel", config.terminal_vel as f64),
        ("pipe_width", config.pipe_width as f64),
        ("pipe_gap", config.pipe_gap as f64),
        ("pipe_speed", config.pipe_speed as f64),
        ("pipe_spawn", config.pipe_spawn),
        ("bird_size", config.bird_size as f64),
    ];
    for (field, value) in positive {
        if value <= 0.0 {
            return Err(ConfigError::NonPositive { field, value });
        }
    }

    if config.hitbox_pad < 0.0 || config.hitbox_pad * 2.0 >= config.bird_size {
        return Err(ConfigError::HitboxPad {
            pad: config.hitbox_pad,
            bird_size: config.bird_size,
        });
    }
    if config.max_top_h() < PIPE_EDGE_MARGIN {
        return Err(ConfigError::GapTooLarge {
            gap: config.pipe_gap,
            margin: PIPE_EDGE_MARGIN,
        });
    }
    Ok(())
}

/// Parallax speed factors (relative to `pipe_speed`) and layer size ranges
#[derive(Debug, Clone, Copy)]
pub struct BackgroundTuning {
    pub far_speed: f32,
    pub mid_speed: f32,
    pub near_speed: f32,
    pub plane_speed: f32,
    pub skyline_seg_w: f32,
    pub building_min_w: f32,
    pub building_max_w: f32,
    pub tree_min_w: f32,
    pub tree_max_w: f32,
}

pub const BG: BackgroundTuning = BackgroundTuning {
    far_speed: 0.08,
    mid_speed: 0.2,
    near_speed: 0.45,
    plane_speed: 0.25,
    skyline_seg_w: 120.0,
    building_min_w: 25.0,
    building_max_w: 55.0,
    tree_min_w: 14.0,
    tree_max_w: 30.0,
};

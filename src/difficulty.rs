//! Difficulty profiles: phase progressions, pattern weights and milestones
//!
//! Pure static data. A profile lists phases by ascending score threshold; the
//! active phase for a score is the last one whose threshold is <= the score.

use serde::Serialize;

use crate::config::DifficultyKey;

/// Obstacle pattern families the pattern generator can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PatternType {
    Scatter,
    StairUp,
    StairDown,
    SineWave,
    Zigzag,
    Tunnel,
    Squeeze,
    Rapids,
    Drift,
}

impl PatternType {
    /// Order used by `PatternWeights`
    pub const ALL: [PatternType; 9] = [
        PatternType::Scatter,
        PatternType::StairUp,
        PatternType::StairDown,
        PatternType::SineWave,
        PatternType::Zigzag,
        PatternType::Tunnel,
        PatternType::Squeeze,
        PatternType::Rapids,
        PatternType::Drift,
    ];
}

/// Spawn weight per pattern, indexed in `PatternType::ALL` order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternWeights(pub [u32; 9]);

impl PatternWeights {
    pub fn get(&self, pattern: PatternType) -> u32 {
        let idx = PatternType::ALL
            .iter()
            .position(|p| *p == pattern)
            .unwrap_or(0);
        self.0[idx]
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Map `roll` in `[0, total)` to a pattern; Scatter when every weight is zero
    pub fn pick(&self, roll: u32) -> PatternType {
        let mut acc = 0;
        for (pattern, weight) in PatternType::ALL.iter().zip(self.0) {
            acc += weight;
            if roll < acc {
                return *pattern;
            }
        }
        PatternType::Scatter
    }
}

// [scatter, stairUp, stairDown, sineWave, zigzag, tunnel, squeeze, rapids, drift]
const W_WARMUP: PatternWeights = PatternWeights([3, 0, 0, 0, 0, 0, 0, 0, 2]);
const W_BASIC: PatternWeights = PatternWeights([3, 2, 2, 2, 0, 0, 0, 0, 1]);
const W_MID: PatternWeights = PatternWeights([2, 2, 2, 2, 0, 2, 0, 0, 1]);
const W_VARIED: PatternWeights = PatternWeights([2, 2, 2, 2, 1, 2, 0, 0, 1]);
const W_INTENSE: PatternWeights = PatternWeights([2, 2, 2, 2, 2, 2, 2, 0, 1]);
const W_FULL: PatternWeights = PatternWeights([2, 2, 2, 2, 3, 2, 2, 2, 1]);
const W_AGGRO: PatternWeights = PatternWeights([1, 2, 2, 1, 4, 2, 3, 3, 1]);

/// One difficulty sub-tier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseConfig {
    pub name: &'static str,
    pub score_threshold: u32,
    pub gap_multiplier: f32,
    pub speed_multiplier: f32,
    pub spawn_multiplier: f64,
    /// Completed pattern runs between breathers
    pub breather_frequency: u32,
    /// Min/max pattern intensity in `[0, 1]`
    pub intensity_range: (f32, f32),
    pub pattern_weights: PatternWeights,
}

#[allow(clippy::too_many_arguments)]
const fn ph(
    name: &'static str,
    score: u32,
    gap: f32,
    speed: f32,
    spawn: f64,
    breather: u32,
    intensity: (f32, f32),
    patterns: PatternWeights,
) -> PhaseConfig {
    PhaseConfig {
        name,
        score_threshold: score,
        gap_multiplier: gap,
        speed_multiplier: speed,
        spawn_multiplier: spawn,
        breather_frequency: breather,
        intensity_range: intensity,
        pattern_weights: patterns,
    }
}

/// Celebration size for a milestone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Celebration {
    Minor,
    Major,
    Epic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Milestone {
    pub score: u32,
    pub label: &'static str,
    pub celebration: Celebration,
}

const fn ms(score: u32, label: &'static str, celebration: Celebration) -> Milestone {
    Milestone {
        score,
        label,
        celebration,
    }
}

/// Shared by every profile, ascending by score
pub const MILESTONES: [Milestone; 13] = [
    ms(10, "Getting Started", Celebration::Minor),
    ms(25, "Warmed Up", Celebration::Minor),
    ms(50, "Half Century", Celebration::Major),
    ms(100, "Century", Celebration::Major),
    ms(250, "Quarter K", Celebration::Major),
    ms(500, "Half K", Celebration::Epic),
    ms(1000, "Thousand Club", Celebration::Epic),
    ms(2000, "Double K", Celebration::Epic),
    ms(3000, "Triple K", Celebration::Epic),
    ms(5000, "Five Thousand", Celebration::Epic),
    ms(7000, "Seven K", Celebration::Epic),
    ms(8001, "The Final Stretch", Celebration::Epic),
    ms(9000, "It's Over 9000", Celebration::Epic),
];

/// Immutable per-difficulty progression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    pub key: DifficultyKey,
    pub name: &'static str,
    /// Extra gap (fraction of base gap) granted at score 0, fading out over phase 0
    pub grace_factor: f32,
    /// Gap never shrinks below this
    pub gap_floor: f32,
    /// Pipe speed never exceeds this
    pub speed_ceiling: f32,
    pub near_miss_margin: f32,
    pub has_gap_variation: bool,
    pub gap_variation_amount: f32,
    pub has_timing_variation: bool,
    pub timing_variation_amount: f64,
    pub milestones: &'static [Milestone],
    pub phases: &'static [PhaseConfig],
}

const EASY_PHASES: [PhaseConfig; 10] = [
    ph("Warmup", 0, 1.0, 1.0, 1.0, 3, (0.1, 0.3), W_WARMUP),
    ph("Rising", 10, 1.0, 1.0, 1.0, 3, (0.15, 0.35), W_BASIC),
    ph("Development", 30, 0.95, 1.04, 0.97, 3, (0.2, 0.45), W_MID),
    ph("Intensification", 60, 0.9, 1.08, 0.94, 4, (0.25, 0.55), W_VARIED),
    ph("Mastery", 150, 0.85, 1.12, 0.9, 4, (0.3, 0.6), W_INTENSE),
    ph("Endurance", 400, 0.8, 1.16, 0.87, 5, (0.35, 0.65), W_FULL),
    ph("Marathon", 1000, 0.77, 1.22, 0.83, 5, (0.4, 0.7), W_FULL),
    ph("Legendary", 2500, 0.73, 1.28, 0.8, 6, (0.45, 0.75), W_FULL),
    ph("Mythic", 5000, 0.68, 1.34, 0.77, 7, (0.5, 0.8), W_FULL),
    ph("Final", 8001, 0.62, 1.42, 0.73, 8, (0.55, 0.85), W_FULL),
];

const NORMAL_PHASES: [PhaseConfig; 10] = [
    ph("Warmup", 0, 1.0, 1.0, 1.0, 3, (0.15, 0.35), W_WARMUP),
    ph("Rising", 5, 1.0, 1.0, 1.0, 3, (0.2, 0.45), W_BASIC),
    ph("Development", 12, 0.95, 1.06, 0.96, 4, (0.25, 0.55), W_MID),
    ph("Intensification", 28, 0.88, 1.12, 0.92, 4, (0.35, 0.65), W_INTENSE),
    ph("Mastery", 50, 0.82, 1.18, 0.88, 5, (0.45, 0.75), W_FULL),
    ph("Endurance", 120, 0.77, 1.24, 0.84, 5, (0.55, 0.82), W_FULL),
    ph("Marathon", 400, 0.73, 1.3, 0.8, 6, (0.65, 0.88), W_FULL),
    ph("Legendary", 1500, 0.68, 1.36, 0.77, 7, (0.75, 0.92), W_FULL),
    ph("Mythic", 4000, 0.64, 1.4, 0.74, 8, (0.82, 0.96), W_FULL),
    ph("Final", 8001, 0.6, 1.45, 0.7, 9, (0.9, 1.0), W_FULL),
];

const HARD_PHASES: [PhaseConfig; 10] = [
    ph("Warmup", 0, 1.0, 1.0, 1.0, 4, (0.3, 0.55), W_VARIED),
    ph("Rising", 3, 0.96, 1.04, 0.97, 4, (0.35, 0.65), W_VARIED),
    ph("Development", 7, 0.91, 1.09, 0.94, 4, (0.4, 0.7), W_INTENSE),
    ph("Intensification", 14, 0.85, 1.15, 0.9, 5, (0.5, 0.78), W_INTENSE),
    ph("Mastery", 25, 0.8, 1.22, 0.86, 5, (0.6, 0.85), W_FULL),
    ph("Endurance", 60, 0.75, 1.28, 0.82, 5, (0.65, 0.88), W_AGGRO),
    ph("Marathon", 200, 0.7, 1.34, 0.78, 6, (0.72, 0.92), W_AGGRO),
    ph("Legendary", 600, 0.65, 1.4, 0.75, 6, (0.8, 0.95), W_AGGRO),
    ph("Mythic", 2000, 0.6, 1.46, 0.72, 7, (0.87, 0.98), W_AGGRO),
    ph("Final", 8001, 0.55, 1.52, 0.68, 8, (0.92, 1.0), W_AGGRO),
];

const SOULS_PHASES: [PhaseConfig; 10] = [
    ph("Warmup", 0, 1.0, 1.0, 1.0, 5, (0.5, 0.75), W_AGGRO),
    ph("Rising", 2, 0.94, 1.06, 0.96, 5, (0.55, 0.82), W_AGGRO),
    ph("Development", 5, 0.88, 1.12, 0.92, 5, (0.6, 0.87), W_AGGRO),
    ph("Intensification", 10, 0.82, 1.18, 0.88, 6, (0.65, 0.9), W_AGGRO),
    ph("Mastery", 18, 0.77, 1.24, 0.85, 6, (0.7, 0.93), W_AGGRO),
    ph("Endurance", 40, 0.72, 1.3, 0.82, 6, (0.75, 0.95), W_AGGRO),
    ph("Marathon", 120, 0.67, 1.36, 0.78, 7, (0.82, 0.97), W_AGGRO),
    ph("Legendary", 400, 0.62, 1.42, 0.75, 7, (0.88, 0.98), W_AGGRO),
    ph("Mythic", 1500, 0.57, 1.48, 0.72, 7, (0.92, 0.99), W_AGGRO),
    ph("Final", 8001, 0.52, 1.55, 0.68, 8, (0.96, 1.0), W_AGGRO),
];

pub const EASY: DifficultyProfile = DifficultyProfile {
    key: DifficultyKey::Easy,
    name: "Easy",
    grace_factor: 0.35,
    gap_floor: 120.0,
    speed_ceiling: 3.2,
    near_miss_margin: 12.0,
    has_gap_variation: false,
    gap_variation_amount: 0.0,
    has_timing_variation: false,
    timing_variation_amount: 0.0,
    milestones: &MILESTONES,
    phases: &EASY_PHASES,
};

pub const NORMAL: DifficultyProfile = DifficultyProfile {
    key: DifficultyKey::Normal,
    name: "Normal",
    grace_factor: 0.2,
    gap_floor: 118.0,
    speed_ceiling: 3.8,
    near_miss_margin: 8.0,
    has_gap_variation: false,
    gap_variation_amount: 0.0,
    has_timing_variation: false,
    timing_variation_amount: 0.0,
    milestones: &MILESTONES,
    phases: &NORMAL_PHASES,
};

pub const HARD: DifficultyProfile = DifficultyProfile {
    key: DifficultyKey::Hard,
    name: "Hard",
    grace_factor: 0.1,
    gap_floor: 100.0,
    speed_ceiling: 4.8,
    near_miss_margin: 5.0,
    has_gap_variation: false,
    gap_variation_amount: 0.0,
    has_timing_variation: false,
    timing_variation_amount: 0.0,
    milestones: &MILESTONES,
    phases: &HARD_PHASES,
};

pub const SOULS: DifficultyProfile = DifficultyProfile {
    key: DifficultyKey::Souls,
    name: "Souls",
    grace_factor: 0.04,
    gap_floor: 82.0,
    speed_ceiling: 5.8,
    near_miss_margin: 3.0,
    has_gap_variation: true,
    gap_variation_amount: 15.0,
    has_timing_variation: true,
    timing_variation_amount: 200.0,
    milestones: &MILESTONES,
    phases: &SOULS_PHASES,
};

pub fn get_difficulty_profile(key: DifficultyKey) -> &'static DifficultyProfile {
    match key {
        DifficultyKey::Easy => &EASY,
        DifficultyKey::Normal => &NORMAL,
        DifficultyKey::Hard => &HARD,
        DifficultyKey::Souls => &SOULS,
    }
}

impl DifficultyProfile {
    /// Index of the last phase whose threshold is <= `score`
    ///
    /// Thresholds are ascending and the first is 0, so a binary search over
    /// "threshold <= score" gives the same answer as a linear scan.
    pub fn phase_index(&self, score: u32) -> usize {
        self.phases
            .partition_point(|p| p.score_threshold <= score)
            .saturating_sub(1)
    }

    pub fn phase_for_score(&self, score: u32) -> &'static PhaseConfig {
        &self.phases[self.phase_index(score)]
    }

    /// Milestones with `from < score <= to`
    pub fn milestones_between(&self, from: u32, to: u32) -> impl Iterator<Item = &'static Milestone> {
        let milestones: &'static [Milestone] = self.milestones;
        milestones
            .iter()
            .filter(move |m| m.score > from && m.score <= to)
    }
}

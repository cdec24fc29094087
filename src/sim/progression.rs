//! Score-driven phase progression
//!
//! Rewrites the live gap/speed/spawn fields of the config from the difficulty
//! baseline whenever the score crosses into a new phase, and reports
//! milestones as they are reached.

use rand::Rng;

use crate::config::{DifficultyKey, GameConfig};
use crate::difficulty::{DifficultyProfile, Milestone, PhaseConfig, get_difficulty_profile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    pub index: usize,
    pub name: &'static str,
}

/// What changed after a score update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreOutcome {
    pub phase_change: Option<PhaseChange>,
    pub milestones: Vec<&'static Milestone>,
}

#[derive(Debug, Clone)]
pub struct Progression {
    profile: &'static DifficultyProfile,
    phase_index: usize,
    /// Highest score already reported; milestones at or below it are spent
    last_score: u32,
}

impl Progression {
    pub fn new(key: DifficultyKey) -> Self {
        Self {
            profile: get_difficulty_profile(key),
            phase_index: 0,
            last_score: 0,
        }
    }

    pub fn profile(&self) -> &'static DifficultyProfile {
        self.profile
    }

    pub fn phase_index(&self) -> usize {
        self.phase_index
    }

    pub fn phase(&self) -> &'static PhaseConfig {
        &self.profile.phases[self.phase_index]
    }

    /// Back to phase 0 with full grace
    pub fn reset(&mut self, base: &GameConfig, config: &mut GameConfig) {
        self.phase_index = 0;
        self.last_score = 0;
        self.apply_phase(base, config, 0.0);
        self.apply_grace(0, config, base);
    }

    pub fn on_score<R: Rng + ?Sized>(
        &mut self,
        score: u32,
        base: &GameConfig,
        config: &mut GameConfig,
        rng: &mut R,
    ) -> ScoreOutcome {
        let milestones = self
            .profile
            .milestones_between(self.last_score, score)
            .collect();
        self.last_score = self.last_score.max(score);

        let idx = self.profile.phase_index(score);
        let mut phase_change = None;
        if idx != self.phase_index {
            self.phase_index = idx;
            let variation = if self.profile.has_gap_variation {
                (rng.random::<f32>() * 2.0 - 1.0) * self.profile.gap_variation_amount
            } else {
                0.0
            };
            self.apply_phase(base, config, variation);
            let phase = self.phase();
            log::info!("Phase {} ({}) at score {score}", idx, phase.name);
            phase_change = Some(PhaseChange {
                index: idx,
                name: phase.name,
            });
        }
        if self.phase_index == 0 {
            self.apply_grace(score, config, base);
        }

        ScoreOutcome {
            phase_change,
            milestones,
        }
    }

    fn apply_phase(&self, base: &GameConfig, config: &mut GameConfig, gap_variation: f32) {
        let phase = self.phase();
        let profile = self.profile;
        config.pipe_gap = (base.pipe_gap * phase.gap_multiplier + gap_variation).max(profile.gap_floor);
        config.pipe_speed = (base.pipe_speed * phase.speed_multiplier).min(profile.speed_ceiling);
        config.pipe_spawn = base.pipe_spawn * phase.spawn_multiplier;
    }

    /// Early-game widening that fades out as the score approaches phase 1
    fn apply_grace(&self, score: u32, config: &mut GameConfig, base: &GameConfig) {
        let Some(next) = self.profile.phases.get(1) else {
            return;
        };
        if next.score_threshold == 0 {
            return;
        }
        let remaining = 1.0 - (score as f32 / next.score_threshold as f32).min(1.0);
        let ungraced = (base.pipe_gap * self.phase().gap_multiplier).max(self.profile.gap_floor);
        config.pipe_gap = ungraced + base.pipe_gap * self.profile.grace_factor * remaining;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::apply_difficulty;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn setup(key: DifficultyKey) -> (Progression, GameConfig, GameConfig) {
        let mut base = GameConfig::default();
        apply_difficulty(key, &mut base);
        let mut live = base;
        let mut p = Progression::new(key);
        p.reset(&base, &mut live);
        (p, base, live)
    }

    #[test]
    fn test_reset_applies_full_grace() {
        let (p, base, live) = setup(DifficultyKey::Normal);
        assert_eq!(p.phase_index(), 0);
        let expected = base.pipe_gap + base.pipe_gap * p.profile().grace_factor;
        assert!((live.pipe_gap - expected).abs() < 1e-4);
    }

    #[test]
    fn test_grace_fades_toward_phase_one() {
        let (mut p, base, mut live) = setup(DifficultyKey::Normal);
        let mut rng = Pcg32::seed_from_u64(1);
        let mut prev = live.pipe_gap;
        let threshold = p.profile().phases[1].score_threshold;
        for score in 1..threshold {
            p.on_score(score, &base, &mut live, &mut rng);
            assert!(live.pipe_gap < prev);
            assert!(live.pipe_gap >= base.pipe_gap);
            prev = live.pipe_gap;
        }
    }

    #[test]
    fn test_phase_change_at_threshold() {
        let (mut p, base, mut live) = setup(DifficultyKey::Normal);
        let mut rng = Pcg32::seed_from_u64(2);
        let phase1 = p.profile().phases[1];
        let phase2 = p.profile().phases[2];

        let out = p.on_score(phase1.score_threshold, &base, &mut live, &mut rng);
        assert_eq!(out.phase_change, Some(PhaseChange { index: 1, name: phase1.name }));
        assert_eq!(live.pipe_gap, (base.pipe_gap * phase1.gap_multiplier).max(p.profile().gap_floor));

        let out = p.on_score(phase2.score_threshold, &base, &mut live, &mut rng);
        assert_eq!(out.phase_change.map(|c| c.index), Some(2));
        assert_eq!(live.pipe_spawn, base.pipe_spawn * phase2.spawn_multiplier);

        let out = p.on_score(phase2.score_threshold + 1, &base, &mut live, &mut rng);
        assert!(out.phase_change.is_none());
    }

    #[test]
    fn test_floor_and_ceiling_hold_in_final_phase() {
        for key in DifficultyKey::ALL {
            let (mut p, base, mut live) = setup(key);
            let mut rng = Pcg32::seed_from_u64(3);
            p.on_score(10_000, &base, &mut live, &mut rng);
            assert_eq!(p.phase_index(), p.profile().phases.len() - 1);
            assert!(live.pipe_gap >= p.profile().gap_floor);
            assert!(live.pipe_speed <= p.profile().speed_ceiling);
        }
    }

    #[test]
    fn test_gap_variation_bounded() {
        let (mut p, base, mut live) = setup(DifficultyKey::Souls);
        let amount = p.profile().gap_variation_amount;
        let phase1 = p.profile().phases[1];
        for seed in 0..30 {
            let mut rng = Pcg32::seed_from_u64(seed);
            p.reset(&base, &mut live);
            p.on_score(phase1.score_threshold, &base, &mut live, &mut rng);
            let nominal = base.pipe_gap * phase1.gap_multiplier;
            assert!(live.pipe_gap >= p.profile().gap_floor);
            assert!(live.pipe_gap <= nominal + amount + 1e-3);
        }
    }

    #[test]
    fn test_milestones_reported_once() {
        let (mut p, base, mut live) = setup(DifficultyKey::Easy);
        let mut rng = Pcg32::seed_from_u64(4);

        let out = p.on_score(10, &base, &mut live, &mut rng);
        assert_eq!(out.milestones.len(), 1);
        assert_eq!(out.milestones[0].score, 10);

        assert!(p.on_score(10, &base, &mut live, &mut rng).milestones.is_empty());
        assert!(p.on_score(11, &base, &mut live, &mut rng).milestones.is_empty());

        // Jumping past several thresholds reports each of them
        let out = p.on_score(120, &base, &mut live, &mut rng);
        let scores: Vec<u32> = out.milestones.iter().map(|m| m.score).collect();
        assert_eq!(scores, vec![25, 50, 100]);
    }

    #[test]
    fn test_reset_rearms_milestones() {
        let (mut p, base, mut live) = setup(DifficultyKey::Normal);
        let mut rng = Pcg32::seed_from_u64(5);
        p.on_score(30, &base, &mut live, &mut rng);
        p.reset(&base, &mut live);
        assert_eq!(p.on_score(10, &base, &mut live, &mut rng).milestones.len(), 1);
    }
}

//! Obstacle pattern generator
//!
//! Pipes are placed in short runs that share one pattern family. The phase
//! decides which families are likely and how intense they get; every few
//! runs a centred breather pipe is inserted.

use rand::Rng;

use super::physics::random_top_h;
use crate::config::GameConfig;
use crate::consts::PIPE_EDGE_MARGIN;
use crate::difficulty::{PatternType, PhaseConfig};
use crate::{TAU, random_between};

const RUN_MIN: u32 = 3;
const RUN_MAX: u32 = 5;
const BREATHER_SPAWN_SCALE: f64 = 1.2;

/// Placement for the next pipe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipePlan {
    pub top_h: f32,
    /// Multiplier on the spawn interval that follows this pipe
    pub spawn_scale: f64,
    pub breather: bool,
}

#[derive(Debug, Clone)]
pub struct PatternGenerator {
    pattern: PatternType,
    intensity: f32,
    run_len: u32,
    step: u32,
    runs_completed: u32,
    breather_pending: bool,
    prev_top: Option<f32>,
}

impl Default for PatternGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternGenerator {
    pub fn new() -> Self {
        Self {
            pattern: PatternType::Scatter,
            intensity: 0.0,
            run_len: 0,
            step: 0,
            runs_completed: 0,
            breather_pending: false,
            prev_top: None,
        }
    }

    pub fn pattern(&self) -> PatternType {
        self.pattern
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn start_run<R: Rng + ?Sized>(&mut self, phase: &PhaseConfig, rng: &mut R) {
        let total = phase.pattern_weights.total();
        self.pattern = if total == 0 {
            PatternType::Scatter
        } else {
            phase.pattern_weights.pick(rng.random_range(0..total))
        };
        let (lo, hi) = phase.intensity_range;
        self.intensity = random_between(rng, lo, hi).clamp(0.0, 1.0);
        self.run_len = rng.random_range(RUN_MIN..=RUN_MAX);
        self.step = 0;
    }

    /// Plan the next pipe for the given phase
    pub fn next_plan<R: Rng + ?Sized>(
        &mut self,
        phase: &PhaseConfig,
        config: &GameConfig,
        rng: &mut R,
    ) -> PipePlan {
        let lo = PIPE_EDGE_MARGIN;
        let hi = config.max_top_h().max(lo);
        let span = hi - lo;
        let centre = lo + span * 0.5;

        if self.breather_pending {
            self.breather_pending = false;
            self.prev_top = Some(centre);
            return PipePlan {
                top_h: centre,
                spawn_scale: BREATHER_SPAWN_SCALE,
                breather: true,
            };
        }

        if self.step >= self.run_len {
            self.start_run(phase, rng);
        }

        let i = self.intensity;
        let prev = self.prev_top.unwrap_or(centre);
        let mut spawn_scale = 1.0;
        let top_h = match self.pattern {
            PatternType::Scatter => random_top_h(config, rng),
            PatternType::StairUp => prev - span * (0.08 + 0.17 * i),
            PatternType::StairDown => prev + span * (0.08 + 0.17 * i),
            PatternType::SineWave => {
                let phase_angle = self.step as f32 * TAU / self.run_len as f32;
                centre + 0.5 * span * i * phase_angle.sin()
            }
            PatternType::Zigzag => {
                let amp = span * (0.15 + 0.35 * i);
                let sign = if self.step % 2 == 0 { 1.0 } else { -1.0 };
                let target = prev + sign * amp;
                if (lo..=hi).contains(&target) {
                    target
                } else {
                    prev - sign * amp
                }
            }
            PatternType::Tunnel => prev + (rng.random::<f32>() * 2.0 - 1.0) * 0.04 * span,
            PatternType::Squeeze => prev + (centre - prev) * (0.4 + 0.4 * i),
            PatternType::Rapids => {
                spawn_scale = 1.0 - 0.25 * i as f64;
                random_top_h(config, rng)
            }
            PatternType::Drift => prev + (rng.random::<f32>() * 2.0 - 1.0) * 0.12 * span * i,
        }
        .clamp(lo, hi);

        self.prev_top = Some(top_h);
        self.step += 1;
        if self.step >= self.run_len {
            self.runs_completed += 1;
            if phase.breather_frequency > 0 && self.runs_completed % phase.breather_frequency == 0 {
                self.breather_pending = true;
            }
        }

        PipePlan {
            top_h,
            spawn_scale,
            breather: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::difficulty::{PatternWeights, get_difficulty_profile};
    use crate::config::DifficultyKey;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn only(pattern: PatternType, breather_frequency: u32) -> PhaseConfig {
        let mut weights = [0u32; 9];
        let idx = PatternType::ALL.iter().position(|p| *p == pattern).unwrap();
        weights[idx] = 1;
        PhaseConfig {
            name: "Test",
            score_threshold: 0,
            gap_multiplier: 1.0,
            speed_multiplier: 1.0,
            spawn_multiplier: 1.0,
            breather_frequency,
            intensity_range: (0.5, 0.5),
            pattern_weights: PatternWeights(weights),
        }
    }

    #[test]
    fn test_zero_weights_scatter() {
        let cfg = GameConfig::default();
        let mut phase = only(PatternType::Zigzag, 0);
        phase.pattern_weights = PatternWeights([0; 9]);
        let mut generator = PatternGenerator::new();
        let mut rng = Pcg32::seed_from_u64(1);
        generator.next_plan(&phase, &cfg, &mut rng);
        assert_eq!(generator.pattern(), PatternType::Scatter);
    }

    #[test]
    fn test_breather_after_runs() {
        let cfg = GameConfig::default();
        let phase = only(PatternType::Tunnel, 2);
        let mut generator = PatternGenerator::new();
        let mut rng = Pcg32::seed_from_u64(2);

        let plans: Vec<PipePlan> = (0..40).map(|_| generator.next_plan(&phase, &cfg, &mut rng)).collect();
        let breathers: Vec<usize> = plans
            .iter()
            .enumerate()
            .filter(|(_, p)| p.breather)
            .map(|(i, _)| i)
            .collect();

        // Two runs of 3..=5 pipes precede the first breather
        assert!(!breathers.is_empty());
        assert!((6..=10).contains(&breathers[0]));
        let centre = PIPE_EDGE_MARGIN + (cfg.max_top_h() - PIPE_EDGE_MARGIN) * 0.5;
        for &i in &breathers {
            assert_eq!(plans[i].top_h, centre);
            assert_eq!(plans[i].spawn_scale, BREATHER_SPAWN_SCALE);
        }
    }

    #[test]
    fn test_no_breathers_when_frequency_zero() {
        let cfg = GameConfig::default();
        let phase = only(PatternType::Scatter, 0);
        let mut generator = PatternGenerator::new();
        let mut rng = Pcg32::seed_from_u64(3);
        assert!((0..100).all(|_| !generator.next_plan(&phase, &cfg, &mut rng).breather));
    }

    #[test]
    fn test_tunnel_stays_close() {
        let cfg = GameConfig::default();
        let phase = only(PatternType::Tunnel, 0);
        let span = cfg.max_top_h() - PIPE_EDGE_MARGIN;
        let mut generator = PatternGenerator::new();
        let mut rng = Pcg32::seed_from_u64(4);

        let mut prev = generator.next_plan(&phase, &cfg, &mut rng).top_h;
        for _ in 0..50 {
            let next = generator.next_plan(&phase, &cfg, &mut rng).top_h;
            assert!((next - prev).abs() <= 0.04 * span + 1e-3);
            prev = next;
        }
    }

    #[test]
    fn test_stair_up_rises() {
        let cfg = GameConfig::default();
        let phase = only(PatternType::StairUp, 0);
        let mut generator = PatternGenerator::new();
        let mut rng = Pcg32::seed_from_u64(5);
        let a = generator.next_plan(&phase, &cfg, &mut rng).top_h;
        let b = generator.next_plan(&phase, &cfg, &mut rng).top_h;
        assert!(b < a || b == PIPE_EDGE_MARGIN);
    }

    #[test]
    fn test_rapids_shortens_interval() {
        let cfg = GameConfig::default();
        let phase = only(PatternType::Rapids, 0);
        let mut generator = PatternGenerator::new();
        let mut rng = Pcg32::seed_from_u64(6);
        let plan = generator.next_plan(&phase, &cfg, &mut rng);
        assert_eq!(plan.spawn_scale, 1.0 - 0.25 * 0.5);
    }

    #[test]
    fn test_reset_clears_runs() {
        let cfg = GameConfig::default();
        let phase = only(PatternType::Zigzag, 1);
        let mut generator = PatternGenerator::new();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..3 {
            generator.next_plan(&phase, &cfg, &mut rng);
        }
        generator.reset();
        assert_eq!(generator.pattern(), PatternType::Scatter);
        assert!(!generator.next_plan(&phase, &cfg, &mut rng).breather);
    }

    proptest! {
        #[test]
        fn prop_plans_within_bounds(seed in any::<u64>(), key_idx in 0usize..4, phase_idx in 0usize..10) {
            let key = DifficultyKey::ALL[key_idx];
            let mut cfg = GameConfig::default();
            crate::config::apply_difficulty(key, &mut cfg);
            let profile = get_difficulty_profile(key);
            let phase = &profile.phases[phase_idx.min(profile.phases.len() - 1)];
            let mut generator = PatternGenerator::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            for _ in 0..60 {
                let plan = generator.next_plan(phase, &cfg, &mut rng);
                prop_assert!(plan.top_h >= PIPE_EDGE_MARGIN);
                prop_assert!(plan.top_h <= cfg.max_top_h());
                prop_assert!(plan.spawn_scale > 0.0);
            }
        }
    }
}

//! Bird kinematics, collision tests and pipe pool management
//!
//! Pools are plain slices with a separate live count: entries `[0, count)`
//! are active. Removal swaps with the last active slot and shrinks the count.

use rand::Rng;

use super::state::{Bird, Cloud, Pipe};
use crate::config::GameConfig;
use crate::consts::*;
use crate::random_between;

/// Outcome of advancing the pipe pool by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PipeUpdate {
    pub active_count: usize,
    pub score_inc: u32,
    pub near_misses: u32,
    pub died: bool,
}

/// Integrate gravity and smooth the visual tilt
pub fn update_bird(bird: &mut Bird, config: &GameConfig, dt: f32) {
    let dt = dt.max(0.0);

    bird.vy += config.gravity * dt;
    if bird.vy > config.terminal_vel {
        bird.vy = config.terminal_vel;
    }
    bird.y += bird.vy * dt;

    let target_rot = (bird.vy * BIRD_ROT_SCALE).clamp(BIRD_ROT_MIN, BIRD_ROT_MAX);
    bird.rot += (target_rot - bird.rot) * BIRD_ROT_LERP;

    // Ceiling
    if bird.y < 0.0 {
        bird.y = 0.0;
        bird.vy = 0.0;
    }
}

pub fn check_ground_collision(bird: &Bird, config: &GameConfig) -> bool {
    bird.y + config.bird_size > config.height - config.ground_h
}

/// Padded bird box vs the pipe's x-span, then a single gap test on y
pub fn check_pipe_collision(bird: &Bird, pipe: &Pipe, config: &GameConfig) -> bool {
    let pad = config.hitbox_pad;
    let bx = config.bird_x + pad;
    let by = bird.y + pad;
    let bs = config.bird_size - pad * 2.0;

    let overlaps_x = bx + bs > pipe.x && bx < pipe.x + config.pipe_width;
    overlaps_x && (by < pipe.top_h || by + bs > pipe.top_h + config.pipe_gap)
}

pub fn check_pipe_score(pipe: &Pipe, config: &GameConfig) -> bool {
    !pipe.scored && pipe.x + config.pipe_width < config.bird_x
}

/// Padded bird box ended up within `near_miss_margin` of either gap edge
pub fn check_near_miss(bird: &Bird, pipe: &Pipe, config: &GameConfig) -> bool {
    if config.near_miss_margin <= 0.0 {
        return false;
    }
    let pad = config.hitbox_pad;
    let top = bird.y + pad;
    let bottom = bird.y + config.bird_size - pad;
    let gap_top = pipe.top_h;
    let gap_bottom = pipe.top_h + config.pipe_gap;

    let top_clearance = top - gap_top;
    let bottom_clearance = gap_bottom - bottom;
    top_clearance.min(bottom_clearance) < config.near_miss_margin
}

/// Uniform top-segment height leaving `PIPE_EDGE_MARGIN` above and below the gap
pub fn random_top_h<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> f32 {
    random_between(rng, PIPE_EDGE_MARGIN, config.max_top_h())
}

/// Activate the next free slot with a random height; no-op when the pool is full
pub fn spawn_pipe<R: Rng + ?Sized>(
    pool: &mut [Pipe],
    active_count: usize,
    config: &GameConfig,
    rng: &mut R,
) -> usize {
    if active_count >= pool.len() {
        return active_count;
    }
    let top_h = random_top_h(config, rng);
    spawn_pipe_at(pool, active_count, config, top_h)
}

/// Activate the next free slot with an explicit height; no-op when the pool is full
pub fn spawn_pipe_at(pool: &mut [Pipe], active_count: usize, config: &GameConfig, top_h: f32) -> usize {
    let Some(p) = pool.get_mut(active_count) else {
        return active_count;
    };
    p.x = config.width;
    p.top_h = top_h;
    p.scored = false;
    active_count + 1
}

/// Scroll, recycle, score and collide the active pipes
///
/// Walks right-to-left so swap-with-last removal never skips an entry. The
/// first collision ends the walk; pipes left of it are not scored this tick.
pub fn update_pipes(
    pool: &mut [Pipe],
    active_count: usize,
    bird: &Bird,
    config: &GameConfig,
    dt: f32,
) -> PipeUpdate {
    let dt = dt.max(0.0);
    let mut result = PipeUpdate {
        active_count: active_count.min(pool.len()),
        ..Default::default()
    };

    for i in (0..result.active_count).rev() {
        pool[i].x -= config.pipe_speed * dt;

        if pool[i].x + config.pipe_width < 0.0 {
            let last = result.active_count - 1;
            pool.swap(i, last);
            result.active_count -= 1;
            continue;
        }

        let pipe = &mut pool[i];
        if check_pipe_score(pipe, config) {
            pipe.scored = true;
            result.score_inc += 1;
            if check_near_miss(bird, pipe, config) {
                result.near_misses += 1;
            }
        }

        if check_pipe_collision(bird, pipe, config) {
            result.died = true;
            return result;
        }
    }

    result
}

/// Foreground clouds: constant drift, respawn past the right edge
pub fn update_clouds<R: Rng + ?Sized>(clouds: &mut [Cloud], config: &GameConfig, dt: f32, rng: &mut R) {
    let dt = dt.max(0.0);
    for c in clouds {
        c.pos.x -= c.speed * dt;
        if c.pos.x + c.w < 0.0 {
            c.pos.x = config.width + 10.0;
            c.pos.y = 30.0 + rng.random::<f32>() * (config.height * 0.35);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn bird(y: f32, vy: f32) -> Bird {
        Bird { y, vy, rot: 0.0 }
    }

    fn pipe(x: f32, top_h: f32) -> Pipe {
        Pipe {
            x,
            top_h,
            scored: false,
        }
    }

    fn cfg_no_pad() -> GameConfig {
        GameConfig {
            hitbox_pad: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_gravity_one_tick() {
        let cfg = GameConfig::default();
        let mut b = bird(200.0, 0.0);
        update_bird(&mut b, &cfg, 1.0);
        assert!((b.vy - cfg.gravity).abs() < 1e-6);
        assert!((b.y - (200.0 + cfg.gravity)).abs() < 1e-4);
    }

    #[test]
    fn test_terminal_velocity_clamp() {
        let cfg = GameConfig::default();
        let mut b = bird(200.0, 100.0);
        update_bird(&mut b, &cfg, 1.0);
        assert_eq!(b.vy, cfg.terminal_vel);
    }

    #[test]
    fn test_ceiling_clamp() {
        let mut b = bird(-5.0, -3.0);
        update_bird(&mut b, &GameConfig::default(), 1.0);
        assert_eq!(b.y, 0.0);
        assert_eq!(b.vy, 0.0);
    }

    #[test]
    fn test_rotation_lerp_is_per_tick() {
        let cfg = GameConfig::default();
        let mut a = bird(200.0, 5.0);
        let mut b = bird(200.0, 5.0);
        update_bird(&mut a, &cfg, 1.0);
        update_bird(&mut b, &cfg, 0.5);
        assert!(a.rot != 0.0);
        // Smoothing factor ignores dt; only the velocity-driven target differs
        let target_a = ((5.0 + cfg.gravity) * BIRD_ROT_SCALE).clamp(BIRD_ROT_MIN, BIRD_ROT_MAX);
        assert!((a.rot - target_a * BIRD_ROT_LERP).abs() < 1e-4);
        let target_b = ((5.0 + cfg.gravity * 0.5) * BIRD_ROT_SCALE).clamp(BIRD_ROT_MIN, BIRD_ROT_MAX);
        assert!((b.rot - target_b * BIRD_ROT_LERP).abs() < 1e-4);
    }

    #[test]
    fn test_ground_collision() {
        let cfg = GameConfig::default();
        let b = bird(cfg.ground_y() - cfg.bird_size + 1.0, 0.0);
        assert!(check_ground_collision(&b, &cfg));
        assert!(!check_ground_collision(&bird(100.0, 0.0), &cfg));
    }

    #[test]
    fn test_pipe_collision_top() {
        let cfg = cfg_no_pad();
        let p = pipe(cfg.bird_x, 50.0);
        assert!(check_pipe_collision(&bird(0.0, 0.0), &p, &cfg));
    }

    #[test]
    fn test_pipe_collision_bottom() {
        let cfg = cfg_no_pad();
        let p = pipe(cfg.bird_x, 100.0);
        let b = bird(100.0 + cfg.pipe_gap - cfg.bird_size + 1.0, 0.0);
        assert!(check_pipe_collision(&b, &p, &cfg));
    }

    #[test]
    fn test_pipe_collision_through_gap() {
        let cfg = cfg_no_pad();
        let p = pipe(cfg.bird_x, 100.0);
        assert!(!check_pipe_collision(&bird(110.0, 0.0), &p, &cfg));
    }

    #[test]
    fn test_pipe_collision_no_horizontal_overlap() {
        let cfg = GameConfig::default();
        assert!(!check_pipe_collision(&bird(200.0, 0.0), &pipe(400.0, 100.0), &cfg));
    }

    #[test]
    fn test_pipe_collision_half_open_x() {
        let cfg = cfg_no_pad();
        // Pipe's left edge exactly at the bird's right edge: no overlap
        let p = pipe(cfg.bird_x + cfg.bird_size, 300.0);
        assert!(!check_pipe_collision(&bird(0.0, 0.0), &p, &cfg));
    }

    #[test]
    fn test_pipe_score() {
        let cfg = GameConfig::default();
        assert!(check_pipe_score(&pipe(cfg.bird_x - cfg.pipe_width - 1.0, 100.0), &cfg));

        let scored = Pipe {
            x: 0.0,
            top_h: 100.0,
            scored: true,
        };
        assert!(!check_pipe_score(&scored, &cfg));
        assert!(!check_pipe_score(&pipe(cfg.bird_x + 10.0, 100.0), &cfg));
    }

    #[test]
    fn test_spawn_pipe() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut pool = [pipe(200.0, 100.0), pipe(200.0, 100.0)];
        pool[0].scored = true;

        let next = spawn_pipe(&mut pool, 0, &cfg, &mut rng);
        assert_eq!(next, 1);
        assert_eq!(pool[0].x, cfg.width);
        assert!(!pool[0].scored);
        assert!(pool[0].top_h >= PIPE_EDGE_MARGIN && pool[0].top_h <= cfg.max_top_h());
    }

    #[test]
    fn test_spawn_pipe_full_pool() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(7);
        let mut pool = [pipe(123.0, 45.0)];
        let before = pool;
        assert_eq!(spawn_pipe(&mut pool, 1, &cfg, &mut rng), 1);
        assert_eq!(pool, before);
    }

    #[test]
    fn test_update_pipes_scores() {
        let cfg = cfg_no_pad();
        let mut pool = [Pipe {
            x: cfg.bird_x - cfg.pipe_width - 1.0,
            top_h: 0.0,
            scored: false,
        }];
        let r = update_pipes(&mut pool, 1, &bird(200.0, 0.0), &cfg, 0.0);
        assert_eq!(r.score_inc, 1);
        assert!(pool[0].scored);
        assert!(!r.died);
    }

    #[test]
    fn test_update_pipes_removes_offscreen() {
        let cfg = GameConfig::default();
        let mut pool = [pipe(-cfg.pipe_width - 10.0, 100.0)];
        let r = update_pipes(&mut pool, 1, &bird(200.0, 0.0), &cfg, 1.0);
        assert_eq!(r.active_count, 0);
    }

    #[test]
    fn test_update_pipes_swap_compaction_keeps_order() {
        let cfg = GameConfig::default();
        let gone = pipe(-cfg.pipe_width - 10.0, 100.0);
        let a = pipe(200.0, 100.0);
        let b = pipe(300.0, 120.0);
        let mut pool = [gone, a, b, pipe(0.0, 0.0)];
        let r = update_pipes(&mut pool, 3, &bird(200.0, 0.0), &cfg, 0.0);
        assert_eq!(r.active_count, 2);
        // Leftmost removed; the survivors stay within the live prefix
        let live: Vec<f32> = pool[..2].iter().map(|p| p.x).collect();
        assert!(live.contains(&200.0) && live.contains(&300.0));
    }

    #[test]
    fn test_update_pipes_collision() {
        let cfg = cfg_no_pad();
        let mut pool = [pipe(cfg.bird_x, 300.0)];
        let r = update_pipes(&mut pool, 1, &bird(0.0, 0.0), &cfg, 0.0);
        assert!(r.died);
    }

    #[test]
    fn test_update_pipes_collision_short_circuits_scoring() {
        let cfg = cfg_no_pad();
        // Index 1 collides (walked first), index 0 would score but is never reached
        let passed = pipe(cfg.bird_x - cfg.pipe_width - 1.0, 0.0);
        let blocking = pipe(cfg.bird_x, 300.0);
        let mut pool = [passed, blocking];
        let r = update_pipes(&mut pool, 2, &bird(0.0, 0.0), &cfg, 0.0);
        assert!(r.died);
        assert_eq!(r.score_inc, 0);
        assert!(!pool[0].scored);
    }

    #[test]
    fn test_update_pipes_empty_and_negative_dt() {
        let cfg = GameConfig::default();
        let mut pool: [Pipe; 0] = [];
        assert_eq!(update_pipes(&mut pool, 0, &bird(0.0, 0.0), &cfg, 1.0), PipeUpdate::default());

        let mut pool = [pipe(200.0, 100.0)];
        update_pipes(&mut pool, 1, &bird(200.0, 0.0), &cfg, -5.0);
        assert_eq!(pool[0].x, 200.0);
    }

    #[test]
    fn test_near_miss() {
        let cfg = GameConfig {
            hitbox_pad: 0.0,
            near_miss_margin: 8.0,
            ..Default::default()
        };
        let p = pipe(0.0, 100.0);
        // 3px below the gap top
        assert!(check_near_miss(&bird(103.0, 0.0), &p, &cfg));
        // Dead centre
        let mid = 100.0 + (cfg.pipe_gap - cfg.bird_size) / 2.0;
        assert!(!check_near_miss(&bird(mid, 0.0), &p, &cfg));
    }

    #[test]
    fn test_update_clouds_respawn() {
        let cfg = GameConfig::default();
        let mut rng = Pcg32::seed_from_u64(3);
        let mut clouds = [Cloud {
            pos: Vec2::new(-60.0, 40.0),
            w: 50.0,
            speed: 0.2,
        }];
        update_clouds(&mut clouds, &cfg, 1.0, &mut rng);
        assert_eq!(clouds[0].pos.x, cfg.width + 10.0);
        assert!(clouds[0].pos.y >= 30.0 && clouds[0].pos.y <= 30.0 + cfg.height * 0.35);
    }

    proptest! {
        #[test]
        fn prop_bird_stays_in_bounds(
            y in -100.0f32..600.0,
            vy in -50.0f32..50.0,
            dt in 0.0f32..4.0,
        ) {
            let cfg = GameConfig::default();
            let mut b = bird(y, vy);
            update_bird(&mut b, &cfg, dt);
            prop_assert!(b.vy <= cfg.terminal_vel);
            prop_assert!(b.y >= 0.0);
        }

        #[test]
        fn prop_centered_bird_never_collides(
            pad_frac in 0.0f32..0.5,
            top_h in 60.0f32..250.0,
            x_offset in -20.0f32..20.0,
        ) {
            let base = GameConfig::default();
            let cfg = GameConfig {
                hitbox_pad: base.bird_size * pad_frac,
                ..base
            };
            let centre = top_h + cfg.pipe_gap / 2.0;
            let b = bird(centre - cfg.bird_size / 2.0, 0.0);
            let p = pipe(cfg.bird_x + x_offset, top_h);
            prop_assert!(!check_pipe_collision(&b, &p, &cfg));
        }

        #[test]
        fn prop_offscreen_pipes_are_removed(n_gone in 0usize..=3, n_live in 0usize..=2) {
            let cfg = GameConfig::default();
            let mut pool = [Pipe::default(); 5];
            for (i, slot) in pool.iter_mut().take(n_gone + n_live).enumerate() {
                *slot = if i < n_gone {
                    pipe(-cfg.pipe_width - 5.0 - i as f32, 100.0)
                } else {
                    pipe(250.0 + i as f32 * 10.0, 100.0)
                };
            }
            let r = update_pipes(&mut pool, n_gone + n_live, &bird(100.0, 0.0), &cfg, 0.0);
            prop_assert_eq!(r.active_count, n_live);
            for p in &pool[..r.active_count] {
                prop_assert!(p.x >= 250.0);
            }
        }
    }
}

//! Fixed timestep simulation tick
//!
//! `World` owns every piece of simulation state. `tick` advances it by one
//! fixed step; the engine decides how many steps a frame gets.

use glam::Vec2;
use rand::Rng;

use super::background::{Background, BackgroundDeps};
use super::patterns::PatternGenerator;
use super::physics::{
    check_ground_collision, spawn_pipe_at, update_bird, update_clouds, update_pipes,
};
use super::progression::Progression;
use super::state::{Bird, Cloud, EngineState, GameState, Pipe};
use crate::config::{DifficultyKey, GameConfig};
use crate::consts::{PIPE_POOL_SIZE, TICK_MS};
use crate::events::EngineEvent;
use crate::random_between;
use crate::scores::BestScores;

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct World {
    /// Difficulty baseline before phase multipliers
    pub base_config: GameConfig,
    /// Live values, rewritten by phase progression
    pub config: GameConfig,
    pub bird: Bird,
    /// Bird at the start of the last tick, for render interpolation
    pub prev_bird: Bird,
    pub pipes: [Pipe; PIPE_POOL_SIZE],
    pub pipe_count: usize,
    pub clouds: Vec<Cloud>,
    pub background: Background,
    pub patterns: PatternGenerator,
    pub progression: Progression,
    pub state: EngineState,
    /// Near misses this run
    pub near_misses: u32,
    pub reduced_motion: bool,
    banner_texts: Vec<String>,
}

impl World {
    pub fn new<R: Rng + ?Sized>(
        base_config: GameConfig,
        difficulty: DifficultyKey,
        best_scores: BestScores,
        banner_texts: Vec<String>,
        reduced_motion: bool,
        now: f64,
        rng: &mut R,
    ) -> Self {
        let mut world = Self {
            base_config,
            config: base_config,
            bird: Bird::spawn(&base_config),
            prev_bird: Bird::spawn(&base_config),
            pipes: [Pipe::default(); PIPE_POOL_SIZE],
            pipe_count: 0,
            clouds: Vec::new(),
            background: Background::new(background_deps(
                &base_config,
                banner_texts.clone(),
                reduced_motion,
            )),
            patterns: PatternGenerator::new(),
            progression: Progression::new(difficulty),
            state: EngineState::new(best_scores, difficulty),
            near_misses: 0,
            reduced_motion,
            banner_texts,
        };
        world.init_scenery(now, rng);
        world.reset_run();
        world
    }

    /// Foreground clouds and every background layer
    pub fn init_scenery<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) {
        let cfg = &self.config;
        self.clouds = (0..cfg.cloud_count)
            .map(|_| Cloud {
                pos: Vec2::new(
                    rng.random::<f32>() * cfg.width,
                    30.0 + rng.random::<f32>() * cfg.height * 0.35,
                ),
                w: random_between(rng, 40.0, 90.0),
                speed: random_between(rng, 0.15, 0.4),
            })
            .collect();
        self.background.init(now, rng);
    }

    /// Clear the transient run state: bird, pipes, patterns and phase
    pub fn reset_run(&mut self) {
        self.bird = Bird::spawn(&self.config);
        self.prev_bird = self.bird;
        self.pipes = [Pipe::default(); PIPE_POOL_SIZE];
        self.pipe_count = 0;
        self.near_misses = 0;
        self.patterns.reset();
        self.config = self.base_config;
        self.progression.reset(&self.base_config, &mut self.config);
        self.background.set_pipe_speed(self.config.pipe_speed);
    }

    /// Swap in a new difficulty baseline and rebuild the background against it
    pub fn rebuild_for_difficulty<R: Rng + ?Sized>(
        &mut self,
        base_config: GameConfig,
        difficulty: DifficultyKey,
        now: f64,
        rng: &mut R,
    ) {
        self.base_config = base_config;
        self.config = base_config;
        self.progression = Progression::new(difficulty);
        self.state.difficulty = difficulty;
        self.background = Background::new(background_deps(
            &base_config,
            self.banner_texts.clone(),
            self.reduced_motion,
        ));
        self.init_scenery(now, rng);
        self.reset_run();
    }

    pub fn active_pipes(&self) -> &[Pipe] {
        &self.pipes[..self.pipe_count]
    }

    /// Bird blended between the last two ticks
    pub fn interpolated_bird(&self, alpha: f32) -> Bird {
        let a = alpha.clamp(0.0, 1.0);
        Bird {
            y: crate::lerp(self.prev_bird.y, self.bird.y, a),
            vy: self.bird.vy,
            rot: crate::lerp(self.prev_bird.rot, self.bird.rot, a),
        }
    }

    /// Spawn a pipe once the current spawn delay has elapsed
    ///
    /// The timer restarts even when the pool is full, so a freed slot waits
    /// a whole interval before it is reused.
    fn try_spawn_pipe<R: Rng + ?Sized>(&mut self, now: f64, rng: &mut R) {
        let delay = if self.state.next_spawn_delay > 0.0 {
            self.state.next_spawn_delay
        } else {
            self.config.pipe_spawn
        };
        if now - self.state.last_pipe_time <= delay {
            return;
        }

        let spawn_scale = if self.pipe_count < self.pipes.len() {
            let plan = self
                .patterns
                .next_plan(self.progression.phase(), &self.config, rng);
            self.pipe_count = spawn_pipe_at(&mut self.pipes, self.pipe_count, &self.config, plan.top_h);
            plan.spawn_scale
        } else {
            1.0
        };
        self.state.last_pipe_time = now;

        let variation = self.config.pipe_spawn_variation;
        let jitter = if variation > 0.0 {
            (rng.random::<f64>() * 2.0 - 1.0) * variation
        } else {
            0.0
        };
        self.state.next_spawn_delay = (self.config.pipe_spawn * spawn_scale + jitter).max(TICK_MS);
    }
}

fn background_deps(config: &GameConfig, banner_texts: Vec<String>, reduced_motion: bool) -> BackgroundDeps {
    BackgroundDeps {
        width: config.width,
        height: config.height,
        ground_h: config.ground_h,
        pipe_speed: config.pipe_speed,
        banner_texts,
        reduced_motion,
    }
}

/// Advance the world by one fixed timestep
///
/// Scenery always moves (at the ambient rate outside of play). Bird, pipes
/// and score only advance in `Play`; a collision ends the tick in `Dead`.
pub fn tick<R: Rng + ?Sized>(world: &mut World, now: f64, dt: f32, rng: &mut R) {
    let playing = world.state.state == GameState::Play;

    world.prev_bird = world.bird;
    world.background.update(dt, now, playing, rng);
    if playing || !world.reduced_motion {
        update_clouds(&mut world.clouds, &world.config, dt, rng);
    }

    if !playing {
        return;
    }

    update_bird(&mut world.bird, &world.config, dt);
    if check_ground_collision(&world.bird, &world.config) {
        world.bird.y = world.config.ground_y() - world.config.bird_size;
        world.bird.vy = 0.0;
        world.state.die(now);
        return;
    }

    world.try_spawn_pipe(now, rng);

    let result = update_pipes(
        &mut world.pipes,
        world.pipe_count,
        &world.bird,
        &world.config,
        dt,
    );
    world.pipe_count = result.active_count;

    if result.near_misses > 0 {
        world.near_misses += result.near_misses;
        world.state.emit(EngineEvent::NearMiss(world.near_misses));
    }

    if result.score_inc > 0 {
        let score = world.state.score + result.score_inc;
        world.state.set_score(score);
        let outcome = world
            .progression
            .on_score(score, &world.base_config, &mut world.config, rng);
        if let Some(change) = outcome.phase_change {
            world.background.set_pipe_speed(world.config.pipe_speed);
            world.state.emit(EngineEvent::PhaseChange {
                index: change.index,
                name: change.name,
            });
        }
        for m in outcome.milestones {
            log::info!("Milestone reached: {} ({})", m.label, m.score);
            world.state.emit(EngineEvent::Milestone {
                score: m.score,
                label: m.label,
                celebration: m.celebration,
            });
        }
    }

    if result.died {
        world.state.die(now);
    }
}

//! Game engine: lifecycle state machine and fixed-timestep frame loop
//!
//! The host calls `frame` once per display refresh. Elapsed clock time is
//! accumulated and consumed in fixed ticks (at most `MAX_TICKS` per frame,
//! any excess is dropped), then one `Frame` is drawn with the leftover
//! fraction as interpolation alpha. Commands and ticks queue events on the
//! world state; they are dispatched to listeners right after.

use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::config::{ConfigError, DifficultyKey, GameConfig, apply_difficulty, validate_config};
use crate::consts::{FIXED_DT, MAX_TICKS, TICK_MS};
use crate::difficulty::PhaseConfig;
use crate::events::{EngineEvent, ListenerId, Listeners};
use crate::persistence::{load_best_scores, load_difficulty, save_best_scores, save_difficulty};
use crate::platform::{Clock, KeyValueStore};
use crate::render::{Frame, Renderer};
use crate::sanitize::{EngineOptions, ResolvedOptions, resolve_options};
use crate::scores::BestScores;
use crate::settings::Settings;
use crate::sim::{Background, Bird, GameState, Pipe, World, tick};

const FPS_WINDOW_MS: f64 = 1000.0;

/// Frame counter with exponential smoothing
#[derive(Debug, Clone, Default)]
struct FpsCounter {
    frames: u32,
    last_time: f64,
    display: f64,
}

impl FpsCounter {
    fn reset(&mut self, now: f64) {
        self.frames = 0;
        self.last_time = now;
    }

    /// Count a frame; returns the smoothed rate once per window
    fn frame(&mut self, now: f64) -> Option<u32> {
        self.frames += 1;
        let elapsed = now - self.last_time;
        if elapsed < FPS_WINDOW_MS {
            return None;
        }
        let raw = self.frames as f64 * 1000.0 / elapsed;
        self.display = if self.display > 0.0 {
            self.display * 0.7 + raw * 0.3
        } else {
            raw
        };
        self.frames = 0;
        self.last_time = now;
        Some(self.display.round() as u32)
    }
}

pub struct Engine<C: Clock, S: KeyValueStore> {
    clock: C,
    store: S,
    rng: Pcg32,
    /// Canvas and geometry before any difficulty is applied
    template: GameConfig,
    world: World,
    options: ResolvedOptions,
    settings: Settings,
    listeners: Listeners,
    running: bool,
    destroyed: bool,
    frame_time: f64,
    accumulator: f64,
    alpha: f32,
    global_time: f64,
    fps: FpsCounter,
}

impl<C: Clock, S: KeyValueStore> Engine<C, S> {
    /// Engine on the default 380x520 field
    pub fn new(clock: C, store: S, options: EngineOptions) -> Result<Self, ConfigError> {
        Self::with_config(clock, store, options, GameConfig::default())
    }

    /// Engine on a custom field; difficulty fields of `template` are overwritten
    pub fn with_config(
        clock: C,
        mut store: S,
        options: EngineOptions,
        template: GameConfig,
    ) -> Result<Self, ConfigError> {
        let resolved = resolve_options(&options);

        let mut settings = Settings::load(&store);
        if let Some(reduced_motion) = options.reduced_motion {
            settings.reduced_motion = reduced_motion;
        }
        if let Some(show_fps) = options.show_fps {
            settings.show_fps = show_fps;
        }

        let best_scores = load_best_scores(&mut store);
        let difficulty = options
            .difficulty
            .unwrap_or_else(|| load_difficulty(&store));

        let mut config = template;
        apply_difficulty(difficulty, &mut config);
        validate_config(&config)?;

        let seed = options.seed.unwrap_or_else(rand::random);
        let mut rng = Pcg32::seed_from_u64(seed);
        let now = clock.now_ms();
        let world = World::new(
            config,
            difficulty,
            best_scores,
            resolved.banner_texts.clone(),
            settings.reduced_motion,
            now,
            &mut rng,
        );

        log::info!(
            "Engine ready: difficulty={}, best={}, seed={seed}",
            difficulty.as_str(),
            best_scores.get(difficulty)
        );

        Ok(Self {
            clock,
            store,
            rng,
            template,
            world,
            options: resolved,
            settings,
            listeners: Listeners::default(),
            running: false,
            destroyed: false,
            frame_time: now,
            accumulator: 0.0,
            alpha: 0.0,
            global_time: now,
            fps: FpsCounter::default(),
        })
    }

    // === Lifecycle ===

    pub fn start(&mut self) {
        if self.destroyed {
            log::warn!("start() on a destroyed engine ignored");
            return;
        }
        let now = self.clock.now_ms();
        self.frame_time = now;
        self.accumulator = 0.0;
        self.fps.reset(now);
        self.running = true;
        log::info!("Engine started");
    }

    /// Withhold further frames; state is kept
    pub fn stop(&mut self) {
        if self.running {
            log::info!("Engine stopped");
        }
        self.running = false;
    }

    /// Stop and drop every listener
    pub fn destroy(&mut self) {
        self.stop();
        self.listeners.clear();
        self.destroyed = true;
        log::info!("Engine destroyed");
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run one display refresh: zero or more ticks, then one draw.
    /// Returns false once the engine is stopped.
    pub fn frame<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> bool {
        if !self.running {
            return false;
        }

        let now = self.clock.now_ms();
        let delta = (now - self.frame_time).max(0.0);
        self.frame_time = now;
        self.global_time = now;

        self.accumulator += delta;
        let mut ticks = 0;
        while self.accumulator >= TICK_MS && ticks < MAX_TICKS {
            tick(&mut self.world, now, FIXED_DT, &mut self.rng);
            self.accumulator -= TICK_MS;
            ticks += 1;
        }
        if ticks >= MAX_TICKS {
            self.accumulator = 0.0;
        }
        self.alpha = (self.accumulator / TICK_MS) as f32;
        self.flush_events();

        renderer.draw(&self.snapshot());

        if let Some(fps) = self.fps.frame(now) {
            self.world.state.emit(EngineEvent::FpsUpdate(fps));
            self.flush_events();
        }
        true
    }

    fn snapshot(&self) -> Frame<'_> {
        let w = &self.world;
        Frame {
            config: &w.config,
            background: &w.background,
            clouds: &w.clouds,
            pipes: w.active_pipes(),
            bird: w.interpolated_bird(self.alpha),
            score: w.state.score,
            best: w.state.best_scores.get(w.state.difficulty),
            state: w.state.state,
            alpha: self.alpha,
            now: self.global_time,
            fps: self.settings.show_fps.then_some(self.fps.display.round() as u32),
            colors: &self.options.colors,
            fonts: &self.options.fonts,
        }
    }

    /// Hand queued events to listeners, persisting new bests on the way
    fn flush_events(&mut self) {
        for event in self.world.state.drain_events() {
            if let EngineEvent::BestScoreChange(scores) = &event {
                save_best_scores(&mut self.store, scores);
            }
            self.listeners.dispatch(&event);
        }
    }

    // === Commands ===

    pub fn flap(&mut self) {
        let now = self.clock.now_ms();
        match self.world.state.state {
            GameState::Paused => return,
            GameState::Idle => {
                self.world.state.begin_run(now);
                self.world.bird.flap(&self.world.config);
            }
            GameState::Play => self.world.bird.flap(&self.world.config),
            GameState::Dead => {
                if now - self.world.state.dead_time <= self.world.config.reset_delay {
                    return;
                }
                self.reset_game_state();
                self.world.state.begin_run(now);
                self.world.bird.flap(&self.world.config);
            }
        }
        self.flush_events();
    }

    pub fn pause(&mut self) {
        if self.world.state.state != GameState::Play {
            return;
        }
        self.world.state.prev_state_before_pause = Some(GameState::Play);
        self.world.state.paused_time = self.clock.now_ms();
        self.world.state.set_state(GameState::Paused);
        self.flush_events();
    }

    pub fn resume(&mut self) {
        let state = &mut self.world.state;
        if state.state == GameState::Paused && state.prev_state_before_pause == Some(GameState::Play) {
            let now = self.clock.now_ms();
            state.last_pipe_time += now - state.paused_time;
            self.frame_time = now;
            self.accumulator = 0.0;
            state.set_state(GameState::Play);
        }
        self.world.state.prev_state_before_pause = None;
        self.flush_events();
    }

    pub fn reset(&mut self) {
        self.reset_game_state();
        self.flush_events();
    }

    /// Switch difficulty, rebuild the scenery for its speed and return to idle.
    /// Selecting the active difficulty again does nothing.
    pub fn set_difficulty(&mut self, key: DifficultyKey) {
        if key == self.world.state.difficulty {
            return;
        }
        let mut config = self.template;
        apply_difficulty(key, &mut config);
        save_difficulty(&mut self.store, key);

        let now = self.clock.now_ms();
        self.world
            .rebuild_for_difficulty(config, key, now, &mut self.rng);
        self.world.state.reset();
        self.world.state.emit(EngineEvent::DifficultyChange(key));
        log::info!("Difficulty set to {}", key.as_str());
        self.flush_events();
    }

    fn reset_game_state(&mut self) {
        self.world.reset_run();
        self.world.state.reset();
    }

    // === Settings ===

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn set_show_fps(&mut self, show_fps: bool) {
        self.settings.show_fps = show_fps;
        self.settings.save(&mut self.store);
    }

    pub fn set_reduced_motion(&mut self, reduced_motion: bool) {
        self.settings.reduced_motion = reduced_motion;
        self.world.reduced_motion = reduced_motion;
        self.world.background.set_reduced_motion(reduced_motion);
        self.settings.save(&mut self.store);
    }

    // === Listeners ===

    pub fn on(&mut self, listener: impl FnMut(&EngineEvent) + 'static) -> ListenerId {
        self.listeners.add(Box::new(listener))
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    // === Getters ===

    pub fn state(&self) -> GameState {
        self.world.state.state
    }

    pub fn score(&self) -> u32 {
        self.world.state.score
    }

    pub fn best_scores(&self) -> BestScores {
        self.world.state.best_scores
    }

    pub fn difficulty(&self) -> DifficultyKey {
        self.world.state.difficulty
    }

    pub fn phase(&self) -> &'static PhaseConfig {
        self.world.progression.phase()
    }

    pub fn fps(&self) -> u32 {
        self.fps.display.round() as u32
    }

    pub fn bird(&self) -> &Bird {
        &self.world.bird
    }

    pub fn pipes(&self) -> &[Pipe] {
        self.world.active_pipes()
    }

    pub fn background(&self) -> &Background {
        &self.world.background
    }

    pub fn config(&self) -> &GameConfig {
        &self.world.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{BEST_KEY, DIFFICULTY_KEY};
    use crate::platform::{ManualClock, MemoryStore};
    use crate::render::NullRenderer;
    use std::cell::RefCell;
    use std::rc::Rc;

    type TestEngine = Engine<ManualClock, MemoryStore>;

    fn engine() -> (TestEngine, ManualClock, MemoryStore) {
        let clock = ManualClock::new(1000.0);
        let store = MemoryStore::new();
        let options = EngineOptions {
            seed: Some(42),
            ..Default::default()
        };
        let mut e = Engine::new(clock.clone(), store.clone(), options).unwrap();
        e.start();
        (e, clock, store)
    }

    fn record(e: &mut TestEngine) -> Rc<RefCell<Vec<EngineEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        e.on(move |ev| sink.borrow_mut().push(ev.clone()));
        seen
    }

    /// Step the clock one tick at a time until `done` or `limit` frames
    fn run_until(e: &mut TestEngine, clock: &ManualClock, limit: usize, done: impl Fn(&TestEngine) -> bool) {
        let mut r = NullRenderer::default();
        for _ in 0..limit {
            clock.advance(TICK_MS);
            e.frame(&mut r);
            if done(e) {
                return;
            }
        }
    }

    #[test]
    fn test_idle_flap_starts_play() {
        let (mut e, _, _) = engine();
        let seen = record(&mut e);
        e.flap();
        assert_eq!(e.state(), GameState::Play);
        assert_eq!(e.bird().vy, e.config().flap_force);
        assert_eq!(*seen.borrow(), vec![EngineEvent::StateChange(GameState::Play)]);
    }

    #[test]
    fn test_fixed_ticks_per_frame() {
        let (mut e, clock, _) = engine();
        let mut r = NullRenderer::default();
        e.flap();
        let vy0 = e.bird().vy;

        clock.advance(TICK_MS * 3.0 + 1.0);
        assert!(e.frame(&mut r));
        assert!((e.bird().vy - (vy0 + 3.0 * e.config().gravity)).abs() < 1e-4);
        assert_eq!(r.frames, 1);
    }

    #[test]
    fn test_stall_caps_ticks_and_drops_remainder() {
        let (mut e, clock, _) = engine();
        let mut r = NullRenderer::default();
        e.flap();
        let vy0 = e.bird().vy;

        clock.advance(1000.0);
        e.frame(&mut r);
        assert!((e.bird().vy - (vy0 + MAX_TICKS as f32 * e.config().gravity)).abs() < 1e-4);
        assert_eq!(e.alpha, 0.0);
        assert_eq!(e.accumulator, 0.0);
    }

    #[test]
    fn test_dead_flap_respects_reset_delay() {
        let (mut e, clock, _) = engine();
        e.flap();
        run_until(&mut e, &clock, 2000, |e| e.state() == GameState::Dead);
        assert_eq!(e.state(), GameState::Dead);

        clock.advance(e.config().reset_delay * 0.5);
        e.flap();
        assert_eq!(e.state(), GameState::Dead);

        clock.advance(e.config().reset_delay);
        e.flap();
        assert_eq!(e.state(), GameState::Play);
        assert_eq!(e.score(), 0);
        assert_eq!(e.pipes().len(), 0);
        assert_eq!(e.bird().vy, e.config().flap_force);
    }

    #[test]
    fn test_new_best_persisted_on_death() {
        let (mut e, clock, store) = engine();
        let seen = record(&mut e);
        e.flap();
        e.world.state.set_score(3);
        run_until(&mut e, &clock, 2000, |e| e.state() == GameState::Dead);

        assert_eq!(e.best_scores().normal, 3);
        let saved = store.get(BEST_KEY).unwrap().unwrap();
        assert!(saved.contains("\"normal\":3"));
        assert!(seen
            .borrow()
            .iter()
            .any(|ev| matches!(ev, EngineEvent::BestScoreChange(b) if b.normal == 3)));
    }

    #[test]
    fn test_pause_blocks_flap_and_shifts_spawn_timer() {
        let (mut e, clock, _) = engine();
        e.flap();
        let last = e.world.state.last_pipe_time;

        e.pause();
        assert_eq!(e.state(), GameState::Paused);
        e.flap();
        assert_eq!(e.state(), GameState::Paused);

        clock.advance(5000.0);
        e.resume();
        assert_eq!(e.state(), GameState::Play);
        assert_eq!(e.world.state.last_pipe_time, last + 5000.0);
        assert_eq!(e.accumulator, 0.0);
    }

    #[test]
    fn test_pause_only_from_play() {
        let (mut e, _, _) = engine();
        e.pause();
        assert_eq!(e.state(), GameState::Idle);
        e.resume();
        assert_eq!(e.state(), GameState::Idle);
    }

    #[test]
    fn test_paused_bird_frozen() {
        let (mut e, clock, _) = engine();
        let mut r = NullRenderer::default();
        e.flap();
        e.pause();
        let bird = *e.bird();
        clock.advance(200.0);
        e.frame(&mut r);
        assert_eq!(e.bird().y, bird.y);
    }

    #[test]
    fn test_set_difficulty_resets_and_persists() {
        let (mut e, _, store) = engine();
        let seen = record(&mut e);
        e.flap();
        e.set_difficulty(DifficultyKey::Hard);

        assert_eq!(e.state(), GameState::Idle);
        assert_eq!(e.difficulty(), DifficultyKey::Hard);
        assert_eq!(e.config().gravity, crate::config::HARD_PRESET.gravity);
        assert_eq!(e.background().pipe_speed(), e.config().pipe_speed);
        assert_eq!(store.get(DIFFICULTY_KEY).unwrap().as_deref(), Some("hard"));
        assert!(seen.borrow().contains(&EngineEvent::DifficultyChange(DifficultyKey::Hard)));

        let count = seen.borrow().len();
        e.set_difficulty(DifficultyKey::Hard);
        assert_eq!(seen.borrow().len(), count);
    }

    #[test]
    fn test_stored_difficulty_used_without_option() {
        let clock = ManualClock::new(0.0);
        let mut store = MemoryStore::new();
        store.set(DIFFICULTY_KEY, "easy").unwrap();
        let e = Engine::new(clock, store, EngineOptions::default()).unwrap();
        assert_eq!(e.difficulty(), DifficultyKey::Easy);
    }

    #[test]
    fn test_fps_update_about_once_a_second() {
        let (mut e, clock, _) = engine();
        let seen = record(&mut e);
        run_until(&mut e, &clock, 130, |_| false);
        let fps: Vec<u32> = seen
            .borrow()
            .iter()
            .filter_map(|ev| match ev {
                EngineEvent::FpsUpdate(f) => Some(*f),
                _ => None,
            })
            .collect();
        assert_eq!(fps.len(), 2);
        assert!(fps.iter().all(|f| (59..=61).contains(f)));
        assert_eq!(e.fps(), fps[1]);
    }

    #[test]
    fn test_fps_smooths_across_windows() {
        let mut counter = FpsCounter::default();
        counter.reset(0.0);

        let mut emitted = Vec::new();
        for i in 1..=60 {
            emitted.extend(counter.frame(i as f64 * 1000.0 / 60.0));
        }
        assert_eq!(emitted, vec![60]);

        for i in 1..=30 {
            emitted.extend(counter.frame(1000.0 + i as f64 * 1000.0 / 30.0));
        }
        // 0.7 * 60 + 0.3 * 30
        assert_eq!(emitted, vec![60, 51]);
    }

    #[test]
    fn test_destroy_stops_and_clears() {
        let (mut e, clock, _) = engine();
        let seen = record(&mut e);
        e.destroy();
        assert!(!e.is_running());
        clock.advance(100.0);
        assert!(!e.frame(&mut NullRenderer::default()));
        e.flap();
        assert!(seen.borrow().is_empty());
        e.start();
        assert!(!e.is_running());
    }

    #[test]
    fn test_off_removes_listener() {
        let (mut e, _, _) = engine();
        let seen = Rc::new(RefCell::new(0));
        let sink = seen.clone();
        let id = e.on(move |_| *sink.borrow_mut() += 1);
        assert!(e.off(id));
        e.flap();
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn test_invalid_template_rejected() {
        let template = GameConfig {
            height: 100.0,
            ..GameConfig::default()
        };
        let result = Engine::with_config(ManualClock::new(0.0), MemoryStore::new(), EngineOptions::default(), template);
        assert!(matches!(result, Err(ConfigError::GapTooLarge { .. })));
    }

    #[test]
    fn test_storage_failure_does_not_stop_play() {
        let (mut e, clock, store) = engine();
        store.set_failing(true);
        e.flap();
        e.world.state.set_score(2);
        run_until(&mut e, &clock, 2000, |e| e.state() == GameState::Dead);
        assert_eq!(e.best_scores().normal, 2);
    }

    #[test]
    fn test_reduced_motion_keeps_run_state() {
        let (mut e, _, store) = engine();
        e.set_reduced_motion(true);
        assert!(e.settings().reduced_motion);
        assert!(e.world().reduced_motion);
        assert_eq!(e.state(), GameState::Idle);
        assert!(Settings::load(&store).reduced_motion);
    }
}

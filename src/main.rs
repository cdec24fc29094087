//! Flappy Nature entry point
//!
//! Browser: wires DOM input and a HUD to the engine and drives it from
//! `requestAnimationFrame`. Native: runs a headless autopilot demo on a
//! manual clock.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, KeyboardEvent, MouseEvent, TouchEvent};

    use flappy_nature::Engine;
    use flappy_nature::events::EngineEvent;
    use flappy_nature::platform::{LocalStorage, SystemClock};
    use flappy_nature::render::{Frame, Renderer};
    use flappy_nature::sanitize::EngineOptions;
    use flappy_nature::sim::GameState;

    type Game = Engine<SystemClock, LocalStorage>;

    /// Writes score/best/fps into the page HUD when they change
    struct DomHud {
        document: Document,
        last: Option<(u32, u32, GameState, Option<u32>)>,
    }

    impl DomHud {
        fn set_text(&self, selector: &str, text: &str) {
            if let Some(el) = self.document.query_selector(selector).ok().flatten() {
                el.set_text_content(Some(text));
            }
        }
    }

    impl Renderer for DomHud {
        fn draw(&mut self, frame: &Frame<'_>) {
            let key = (frame.score, frame.best, frame.state, frame.fps);
            if self.last == Some(key) {
                return;
            }
            self.last = Some(key);
            self.set_text("#hud-score .hud-value", &frame.score.to_string());
            self.set_text("#hud-best .hud-value", &frame.best.to_string());
            self.set_text("#hud-state .hud-value", frame.state.as_str());
            if let Some(fps) = frame.fps {
                self.set_text("#hud-fps .hud-value", &fps.to_string());
            }
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::error_1(&format!("logger init failed: {e}").into());
        }

        log::info!("Flappy Nature starting...");

        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let mut engine = match Engine::new(SystemClock::new(), LocalStorage, EngineOptions::default()) {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("Engine init failed: {e}");
                return;
            }
        };

        // Banner announcements for milestones and phase changes
        {
            let document = document.clone();
            engine.on(move |event| {
                let text = match event {
                    EngineEvent::Milestone { label, .. } => label.to_string(),
                    EngineEvent::PhaseChange { name, .. } => name.to_string(),
                    EngineEvent::DifficultyChange(key) => key.label().to_string(),
                    _ => return,
                };
                if let Some(el) = document.get_element_by_id("hud-banner") {
                    el.set_text_content(Some(&text));
                }
            });
        }

        engine.start();
        let game = Rc::new(RefCell::new(engine));
        let hud = Rc::new(RefCell::new(DomHud {
            document: document.clone(),
            last: None,
        }));

        setup_input_handlers(&window, &document, game.clone());
        setup_auto_pause(&window, &document, game.clone());

        request_animation_frame(game, hud);
    }

    fn setup_input_handlers(window: &web_sys::Window, document: &Document, game: Rc<RefCell<Game>>) {
        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    " " | "ArrowUp" | "w" | "W" => {
                        event.prevent_default();
                        g.flap();
                    }
                    "Escape" | "p" | "P" => match g.state() {
                        GameState::Play => g.pause(),
                        GameState::Paused => g.resume(),
                        _ => {}
                    },
                    "1" => g.set_difficulty(flappy_nature::DifficultyKey::Easy),
                    "2" => g.set_difficulty(flappy_nature::DifficultyKey::Normal),
                    "3" => g.set_difficulty(flappy_nature::DifficultyKey::Hard),
                    "4" => g.set_difficulty(flappy_nature::DifficultyKey::Souls),
                    _ => {}
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Click
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().flap();
            });
            let _ = document.add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().flap();
            });
            let _ = document.add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(window: &web_sys::Window, document: &Document, game: Rc<RefCell<Game>>) {
        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut g = game.borrow_mut();
                    if g.state() == GameState::Play {
                        g.pause();
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                if g.state() == GameState::Play {
                    g.pause();
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>, hud: Rc<RefCell<DomHud>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |_time: f64| {
            game_loop(game, hud);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, hud: Rc<RefCell<DomHud>>) {
        let running = game.borrow_mut().frame(&mut *hud.borrow_mut());
        if running {
            request_animation_frame(game, hud);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flappy Nature (native) starting...");
    log::info!("Native mode runs a headless autopilot - build for wasm32 to play");

    let seconds: u32 = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(60);
    let summary = headless::run(seconds);
    println!(
        "\n{} frames, {} runs, best score {} (phase {})",
        summary.frames, summary.runs, summary.best, summary.phase
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use flappy_nature::Engine;
    use flappy_nature::consts::TICK_MS;
    use flappy_nature::events::EngineEvent;
    use flappy_nature::platform::{Clock, KeyValueStore, ManualClock, MemoryStore};
    use flappy_nature::render::NullRenderer;
    use flappy_nature::sanitize::EngineOptions;
    use flappy_nature::sim::GameState;

    pub struct Summary {
        pub frames: u64,
        pub runs: u32,
        pub best: u32,
        pub phase: &'static str,
    }

    /// Flap when the bird sinks below the lower part of the next gap
    fn autopilot<C: Clock, S: KeyValueStore>(engine: &mut Engine<C, S>) {
        match engine.state() {
            GameState::Idle | GameState::Dead => engine.flap(),
            GameState::Play => {
                let cfg = *engine.config();
                let bird = *engine.bird();
                let target = engine
                    .pipes()
                    .iter()
                    .filter(|p| p.x + cfg.pipe_width > cfg.bird_x)
                    .min_by(|a, b| a.x.total_cmp(&b.x))
                    .map(|p| p.top_h + cfg.pipe_gap * 0.65)
                    .unwrap_or(cfg.height * 0.5);
                if bird.y + cfg.bird_size > target && bird.vy >= 0.0 {
                    engine.flap();
                }
            }
            GameState::Paused => engine.resume(),
        }
    }

    pub fn run(seconds: u32) -> Summary {
        let clock = ManualClock::new(0.0);
        let options = EngineOptions {
            seed: Some(0x5eed),
            show_fps: Some(true),
            ..Default::default()
        };
        let mut engine = match Engine::new(clock.clone(), MemoryStore::new(), options) {
            Ok(engine) => engine,
            Err(e) => {
                log::error!("Engine init failed: {e}");
                return Summary {
                    frames: 0,
                    runs: 0,
                    best: 0,
                    phase: "-",
                };
            }
        };

        let runs = std::rc::Rc::new(std::cell::Cell::new(0u32));
        {
            let runs = runs.clone();
            engine.on(move |event| match event {
                EngineEvent::StateChange(GameState::Play) => runs.set(runs.get() + 1),
                EngineEvent::StateChange(GameState::Dead) => log::info!("Run ended"),
                EngineEvent::ScoreChange(0) | EngineEvent::FpsUpdate(_) => {}
                other => log::info!("{}: {:?}", other.name(), other),
            });
        }

        engine.start();
        let mut renderer = NullRenderer::default();
        let total_frames = seconds as u64 * 60;
        for _ in 0..total_frames {
            clock.advance(TICK_MS);
            autopilot(&mut engine);
            engine.frame(&mut renderer);
        }
        engine.destroy();

        Summary {
            frames: renderer.frames,
            runs: runs.get(),
            best: engine.best_scores().get(engine.difficulty()),
            phase: engine.phase().name,
        }
    }
}

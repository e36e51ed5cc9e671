//! Tens & Trails entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;

    use tens_trails::audio::{AudioEngine, AudioStatus};
    use tens_trails::consts::MAX_FRAME_DT;
    use tens_trails::input::{Action, InputState};
    use tens_trails::settings::Settings;
    use tens_trails::sim::{GameEvent, GameState, TickInput, tick};
    use tens_trails::snapshot::{HudState, RenderSnapshot};

    // The renderer is plain canvas JS; frames are handed over as JSON
    #[wasm_bindgen(inline_js = "
        export function render_frame(snapshot) {
            if (window.renderFrame) {
                window.renderFrame(JSON.parse(snapshot));
            }
        }
    ")]
    extern "C" {
        fn render_frame(snapshot: &str);
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        input: InputState,
        tick_input: TickInput,
        audio: AudioEngine,
        settings: Settings,
        last_time: f64,
        last_hud: Option<HudState>,
        audio_failure_reported: bool,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let audio = AudioEngine::new(&settings);
            Self {
                state: GameState::new(seed),
                input: InputState::new(),
                tick_input: TickInput::default(),
                audio,
                settings,
                last_time: 0.0,
                last_hud: None,
                audio_failure_reported: false,
            }
        }

        /// One frame: sim tick, event drain, audio, HUD, render handoff
        fn update(&mut self, dt: f32) {
            self.tick_input.dir = self.input.direction();
            let input = self.tick_input.clone();
            tick(&mut self.state, &input, dt);

            // Clear one-shot inputs after processing
            self.tick_input.attempt_gate = false;
            self.tick_input.drop_one = false;
            self.tick_input.drop_ten = false;
            self.tick_input.toggle_help = false;

            let now = self.state.time;
            for event in self.state.drain_events() {
                self.audio.on_event(&event, now);
                self.handle_event(&event);
            }
            self.audio.tick(now);

            if !self.audio_failure_reported && self.audio.status() == AudioStatus::Unavailable {
                self.audio_failure_reported = true;
                narrate("Audio is unavailable in this browser. Playing silently.");
            }
        }

        /// Narration and logging for the notable events
        fn handle_event(&self, event: &GameEvent) {
            match event {
                GameEvent::ItemPicked(kind) => {
                    narrate(&format!(
                        "Picked up a {}. Total {}.",
                        kind.noun(),
                        self.state.player.total()
                    ));
                }
                GameEvent::GateOpened { target, tens, ones } => {
                    log::info!("Gate {target} opened with {tens} tens + {ones} ones");
                    narrate(&format!("Gate opened! {tens} tens and {ones} ones made {target}."));
                }
                GameEvent::GateMismatch { diff } => {
                    if *diff > 0 {
                        narrate(&format!("Not yet. You need {diff} more."));
                    } else {
                        narrate(&format!("Too many by {}. Drop some items.", -diff));
                    }
                }
                GameEvent::NpcHint { name, hint } => {
                    narrate(&format!("{name} says: {hint}"));
                }
                GameEvent::ShardCollected => narrate("Star shard collected."),
                GameEvent::Won => {
                    log::info!("All gates opened, session won");
                    narrate("You opened every gate. You win! Press R to explore a new world.");
                }
                _ => {}
            }
        }

        fn restart(&mut self, seed: u64) {
            self.state = GameState::new(seed);
            self.tick_input = TickInput::default();
            log::info!("Restarted with seed: {seed}");
        }

        /// Update HUD elements in the DOM, only when the digest changed
        fn update_hud(&mut self) {
            let hud = HudState::capture(&self.state, self.audio.is_muted());
            if self.last_hud.as_ref() == Some(&hud) {
                return;
            }

            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let set = |id: &str, text: &str| {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(text));
                }
            };
            set("hud-tens", &hud.tens.to_string());
            set("hud-ones", &hud.ones.to_string());
            set("hud-total", &hud.total.to_string());
            set("hud-gates", &format!("{}/{}", hud.solved, hud.goal));
            set("hud-message", hud.message.as_deref().unwrap_or(""));
            set("hud-mute", if hud.muted { "muted" } else { "" });

            if let Some(el) = document.get_element_by_id("help-overlay") {
                let _ = el.set_attribute("class", if hud.show_help { "" } else { "hidden" });
            }
            if let Some(el) = document.get_element_by_id("win-banner") {
                let _ = el.set_attribute("class", if hud.won { "" } else { "hidden" });
            }

            self.last_hud = Some(hud);
        }

        fn render(&self) {
            let snapshot = RenderSnapshot::capture(&self.state, self.settings.reduced_motion);
            if let Ok(json) = serde_json::to_string(&snapshot) {
                render_frame(&json);
            }
        }
    }

    /// Push text into the aria-live region for screen readers
    fn narrate(text: &str) {
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("narration"))
        {
            el.set_text_content(Some(text));
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Tens & Trails starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {seed}");

        setup_keyboard(game.clone());
        setup_focus_handling(game.clone());

        request_animation_frame(game);

        log::info!("Tens & Trails running!");
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();

        // Keydown: movement keys land in InputState, discrete actions map
        // once per press. The first press of anything also unlocks audio.
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                let code = event.code();

                // Browsers only allow audio after a user gesture
                let now = g.state.time;
                let settings = g.settings.clone();
                g.audio.start(now, &settings);

                let action = g.input.key_down(&code);
                match action {
                    Some(Action::AttemptGate) => g.tick_input.attempt_gate = true,
                    Some(Action::DropOne) => g.tick_input.drop_one = true,
                    Some(Action::DropTen) => g.tick_input.drop_ten = true,
                    Some(Action::ToggleHelp) => g.tick_input.toggle_help = true,
                    Some(Action::ToggleMute) => {
                        let muted = g.audio.toggle_mute();
                        g.settings.muted = muted;
                        g.settings.save();
                        log::info!("Muted: {muted}");
                        narrate(if muted { "Sound off." } else { "Sound on." });
                    }
                    Some(Action::Reset) => {
                        let seed = js_sys::Date::now() as u64;
                        g.restart(seed);
                        narrate("New world generated.");
                    }
                    None => {}
                }
                if action.is_some() || g.input.direction() != glam::Vec2::ZERO {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyup
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                game.borrow_mut().input.key_up(&event.code());
            });
            let _ =
                window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_focus_handling(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Tab hidden/shown
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut g = game.borrow_mut();
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    g.input.clear();
                    if g.settings.mute_on_blur {
                        g.audio.suspend();
                        log::info!("Audio suspended (tab hidden)");
                    }
                } else {
                    g.audio.resume();
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur: release held keys so they do not stick
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.input.clear();
                if g.settings.mute_on_blur {
                    g.audio.suspend();
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Window focus
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().audio.resume();
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                (((time - g.last_time) / 1000.0) as f32).min(MAX_FRAME_DT)
            } else {
                1.0 / 60.0
            };
            g.last_time = time;

            g.update(dt);
            g.render();
            g.update_hud();
        }

        request_animation_frame(game);
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
    log::info!("Tens & Trails (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    println!("\nRunning headless smoke scenario...");
    smoke_scenario();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Walk a fresh world toward its first gate and force it open, exercising
/// generation, movement, pickups and the gate path end to end
#[cfg(not(target_arch = "wasm32"))]
fn smoke_scenario() {
    use tens_trails::sim::{GameState, TickInput, tick};

    let mut state = GameState::new(2024);
    let gate_pos = state.world.gates[0].pos;
    let dt = 1.0 / 60.0;

    // Walk toward the gate for up to two simulated minutes
    for _ in 0..7200 {
        let to_gate = gate_pos - state.player.pos;
        if to_gate.length() < 10.0 {
            break;
        }
        let input = TickInput {
            dir: to_gate.normalize(),
            ..Default::default()
        };
        tick(&mut state, &input, dt);
    }
    assert!(
        (gate_pos - state.player.pos).length() < 20.0,
        "player never reached the gate"
    );

    // Grant a matching inventory and open it
    state.player.tens = state.world.gates[0].target / 10;
    state.player.ones = state.world.gates[0].target % 10;
    let input = TickInput {
        attempt_gate: true,
        ..Default::default()
    };
    tick(&mut state, &input, dt);
    assert!(state.world.gates[0].open, "gate did not open on exact match");

    let drained = state.drain_events().len();
    println!(
        "✓ Smoke scenario passed (gate target {}, {} events drained)",
        state.world.gates[0].target, drained
    );
}

//! Clown Suika entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement, HtmlInputElement,
        KeyboardEvent, MouseEvent, TouchEvent,
    };

    use clown_suika::consts::*;
    use clown_suika::leaderboard::{
        FirestoreConfig, FirestoreStore, Leaderboard, LeaderboardPanel, LeaderboardRow, PanelStatus, format_date,
    };
    use clown_suika::persistence::{KeyValueStore, LocalStorage, MemoryStore};
    use clown_suika::sim::{ArcadeWorld, GameEvent, GamePhase, GameSession, PhysicsAdapter, TickInput, tick};
    use clown_suika::tiers::tier;
    use clown_suika::{PlayerName, TIERS, Tuning};

    const DEFAULT_PROJECT_ID: &str = "clown-suika-game";
    const CANVAS_WIDTH: u32 = 450;
    const CANVAS_HEIGHT: u32 = 650;

    type Board = Rc<Leaderboard<FirestoreStore>>;

    /// Game instance holding all state
    struct Game {
        session: GameSession<ArcadeWorld>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        show_hitboxes: bool,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let store: Box<dyn KeyValueStore> = match LocalStorage::open() {
                Some(storage) => Box::new(storage),
                None => {
                    log::warn!("LocalStorage unavailable, progress will not persist");
                    Box::new(MemoryStore::new())
                }
            };
            let tuning = Tuning::load(store.as_ref());
            let physics = ArcadeWorld::new(tuning.play_area, tuning.gravity);
            Self {
                session: GameSession::new(physics, store, tuning, seed),
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                show_hitboxes: true,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                tick(&mut self.session, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.drop = false;
            }
        }

        /// Draw clowns as their collision circles plus the danger line
        fn render(&self, ctx: &CanvasRenderingContext2d) {
            let tuning = self.session.tuning();
            let area = tuning.play_area;
            ctx.clear_rect(0.0, 0.0, CANVAS_WIDTH as f64, CANVAS_HEIGHT as f64);

            ctx.set_stroke_style_str("#ff4d4d");
            ctx.set_line_width(2.0);
            ctx.begin_path();
            ctx.move_to(area.left as f64, tuning.danger_line_y as f64);
            ctx.line_to(area.right as f64, tuning.danger_line_y as f64);
            ctx.stroke();

            ctx.set_stroke_style_str("#444");
            ctx.stroke_rect(
                area.left as f64,
                0.0,
                area.width() as f64,
                area.floor as f64,
            );

            let physics = self.session.physics();
            for body in self.session.bodies().iter() {
                let (Some(pos), Some(radius)) = (physics.position(body.handle), physics.radius(body.handle)) else {
                    continue;
                };
                draw_clown(ctx, body.tier, pos.x, pos.y, radius, 1.0, self.show_hitboxes);
            }

            if let Some(preview) = self.session.preview() {
                let radius = tuning.hitbox_radius(&TIERS[preview.tier]);
                draw_clown(ctx, preview.tier, preview.x, preview.y, radius, 0.6, self.show_hitboxes);
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            if let Some(el) = document.get_element_by_id("scoreValue") {
                el.set_text_content(Some(&self.session.score().to_string()));
            }
            if let Some(el) = document.get_element_by_id("bestScore") {
                el.set_text_content(Some(&self.session.best_score().to_string()));
            }
        }
    }

    fn tier_color(tier: usize) -> String {
        let hue = (tier * 360 / TIERS.len()) as u32;
        format!("hsl({}, 70%, 60%)", hue)
    }

    fn draw_clown(
        ctx: &CanvasRenderingContext2d,
        tier: usize,
        x: f32,
        y: f32,
        radius: f32,
        alpha: f64,
        outline: bool,
    ) {
        ctx.set_global_alpha(alpha);
        ctx.begin_path();
        let _ = ctx.arc(x as f64, y as f64, radius as f64, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(&tier_color(tier));
        ctx.fill();
        if outline {
            ctx.set_stroke_style_str("#00ff00");
            ctx.set_line_width(1.0);
            ctx.stroke();
        }
        ctx.set_fill_style_str("#000");
        ctx.set_text_align("center");
        let _ = ctx.fill_text(TIERS[tier].name, x as f64, y as f64 + 4.0);
        ctx.set_global_alpha(1.0);
    }

    fn set_visible(document: &Document, id: &str, display: &str) {
        if let Some(el) = document
            .get_element_by_id(id)
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        {
            let _ = el.style().set_property("display", display);
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    fn show_next_tier(document: &Document, rank: usize) {
        let name = tier(rank).map_or("", |t| t.name);
        set_text(document, "nextClownPreview", name);
    }

    /// Render leaderboard rows as child elements (text only, names are user input)
    fn fill_rows(document: &Document, container: &Element, rows: &[LeaderboardRow]) {
        for row in rows {
            let Ok(item) = document.create_element("div") else {
                continue;
            };
            item.set_class_name(if row.highlight {
                "leaderboard-item current-user"
            } else {
                "leaderboard-item"
            });
            let cells = [
                ("leaderboard-rank", format!("#{}", row.rank)),
                ("leaderboard-name", row.name.clone()),
                ("leaderboard-score", row.score.to_string()),
                (
                    "leaderboard-date",
                    row.submitted_at.map(format_date).unwrap_or_default(),
                ),
            ];
            for (class, text) in cells {
                if let Ok(span) = document.create_element("span") {
                    span.set_class_name(class);
                    span.set_text_content(Some(&text));
                    let _ = item.append_child(&span);
                }
            }
            let _ = container.append_child(&item);
        }
    }

    fn render_panel(document: &Document, panel: &LeaderboardPanel, player: Option<&str>) {
        let Some(list) = document.get_element_by_id("leaderboardList") else {
            return;
        };
        list.set_text_content(None);
        let message = match (panel.status(), panel.error()) {
            (PanelStatus::Loading, _) => Some("Loading..."),
            (PanelStatus::Empty, None) => Some("No scores yet. Be the first!"),
            (_, Some(_)) if panel.entries().is_empty() => Some("Error loading scores"),
            _ => None,
        };
        if let Some(message) = message {
            if let Ok(div) = document.create_element("div") {
                div.set_class_name("loading");
                div.set_text_content(Some(message));
                let _ = list.append_child(&div);
            }
            return;
        }
        fill_rows(document, &list, &panel.rows(player));
        if panel.error().is_some() {
            if let Ok(div) = document.create_element("div") {
                div.set_class_name("loading");
                div.set_text_content(Some("Error loading scores"));
                let _ = list.append_child(&div);
            }
        }
    }

    fn refresh_leaderboard(board: Board, panel: Rc<RefCell<LeaderboardPanel>>, player: Option<String>) {
        panel.borrow_mut().mark_refresh(js_sys::Date::now());
        wasm_bindgen_futures::spawn_local(async move {
            let result = board.fetch_top(LEADERBOARD_TOP_N).await;
            let mut panel = panel.borrow_mut();
            panel.apply(result);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                render_panel(&document, &panel, player.as_deref());
            }
        });
    }

    fn submit_score(board: Board, panel: Rc<RefCell<LeaderboardPanel>>, player: PlayerName, score: u64) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        set_text(&document, "finalScoreValue", &score.to_string());
        set_text(&document, "rankDisplay", "Submitting score...");
        if let Some(el) = document.get_element_by_id("gameOverLeaderboard") {
            el.set_text_content(None);
        }
        set_visible(&document, "gameOverModal", "flex");

        wasm_bindgen_futures::spawn_local(async move {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            match board.submit(&player, score).await {
                Ok(result) => {
                    let rank_text = match result.rank {
                        Some(rank) => format!("You ranked #{} out of {} players!", rank, result.total),
                        None => format!("{} players on the board", result.total),
                    };
                    set_text(&document, "rankDisplay", &rank_text);
                    if let Some(container) = document.get_element_by_id("gameOverLeaderboard") {
                        if let Ok(heading) = document.create_element("h3") {
                            heading.set_text_content(Some("Top 10 Global"));
                            let _ = container.append_child(&heading);
                        }
                        fill_rows(&document, &container, &result.rows(player.as_str(), score));
                    }
                }
                Err(err) => {
                    log::warn!("{}", err);
                    set_text(&document, "rankDisplay", "Error submitting score. Please try again!");
                }
            }
            refresh_leaderboard(board, panel, Some(player.to_string()));
        });
    }

    fn firestore_config(document: &Document) -> FirestoreConfig {
        let body = document.body();
        let project = body
            .as_ref()
            .and_then(|b| b.get_attribute("data-firestore-project"))
            .unwrap_or_else(|| DEFAULT_PROJECT_ID.to_string());
        let api_key = body.and_then(|b| b.get_attribute("data-firestore-api-key"));
        FirestoreConfig::new(project, api_key)
    }

    fn game_canvas(document: &Document) -> Result<HtmlCanvasElement, JsValue> {
        let container = document
            .get_element_by_id("gameCanvas")
            .ok_or_else(|| JsValue::from_str("no #gameCanvas container"))?;
        let canvas: HtmlCanvasElement = match container.clone().dyn_into::<HtmlCanvasElement>() {
            Ok(canvas) => canvas,
            Err(_) => {
                let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
                container.append_child(&canvas)?;
                canvas
            }
        };
        canvas.set_width(CANVAS_WIDTH);
        canvas.set_height(CANVAS_HEIGHT);
        Ok(canvas)
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        if let Err(e) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&JsValue::from_str(&e.to_string()));
        }

        log::info!("Clown Suika starting...");

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas = game_canvas(&document)?;
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("no 2d context"))?
            .dyn_into()?;

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        let board: Board = Rc::new(Leaderboard::new(FirestoreStore::new(firestore_config(&document))));
        let panel = Rc::new(RefCell::new(LeaderboardPanel::new()));

        {
            let g = game.borrow();
            g.update_hud(&document);
            show_next_tier(&document, g.session.next_tier());
            if let Some(name) = g.session.remembered_name() {
                if let Some(input) = document
                    .get_element_by_id("playerName")
                    .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
                {
                    input.set_value(name.as_str());
                }
            }
        }
        set_visible(&document, "nameModal", "flex");
        set_visible(&document, "gameOverModal", "none");

        setup_name_prompt(&document, game.clone())?;
        setup_restart_button(&document, game.clone())?;
        setup_input_handlers(&canvas, game.clone())?;

        request_animation_frame(Frame {
            game,
            ctx,
            board,
            panel,
        });
        log::info!("Clown Suika running!");
        Ok(())
    }

    fn try_start(game: &Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let raw = document
            .get_element_by_id("playerName")
            .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
            .map(|input| input.value())
            .unwrap_or_default();

        let mut g = game.borrow_mut();
        match g.session.start(&raw) {
            Ok(()) => {
                set_visible(&document, "nameModal", "none");
                g.accumulator = 0.0;
            }
            Err(err) => {
                log::info!("Name rejected: {}", err);
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(&err.to_string());
                }
            }
        }
    }

    fn setup_name_prompt(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        if let Some(btn) = document.get_element_by_id("startButton") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| try_start(&game));
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        if let Some(input) = document.get_element_by_id("playerName") {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.key() == "Enter" {
                    try_start(&game);
                }
            });
            input.add_event_listener_with_callback("keypress", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    fn setup_restart_button(document: &Document, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        if let Some(btn) = document.get_element_by_id("restartButton") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                if g.session.restart() {
                    g.accumulator = 0.0;
                    g.input = TickInput::default();
                    if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                        set_visible(&document, "gameOverModal", "none");
                    }
                }
            });
            btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// Pointer x in world units
    fn canvas_x(canvas: &HtmlCanvasElement, client_x: f64) -> f32 {
        let rect = canvas.get_bounding_client_rect();
        if rect.width() <= 0.0 {
            return 0.0;
        }
        ((client_x - rect.left()) * canvas.width() as f64 / rect.width()) as f32
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) -> Result<(), JsValue> {
        // Mouse move: aim
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let x = canvas_x(&canvas_clone, event.client_x() as f64);
                game.borrow_mut().input.aim_x = Some(x);
            });
            canvas.add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Click: aim and drop
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let x = canvas_x(&canvas_clone, event.client_x() as f64);
                let mut g = game.borrow_mut();
                g.input.aim_x = Some(x);
                g.input.drop = true;
            });
            canvas.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch move: aim
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let x = canvas_x(&canvas_clone, touch.client_x() as f64);
                    game.borrow_mut().input.aim_x = Some(x);
                }
            });
            canvas.add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Touch end: drop at the last touch point
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                if let Some(touch) = event.changed_touches().get(0) {
                    g.input.aim_x = Some(canvas_x(&canvas_clone, touch.client_x() as f64));
                }
                g.input.drop = true;
            });
            canvas.add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                if g.session.phase() == GamePhase::AwaitingName {
                    return;
                }
                match event.key().as_str() {
                    " " => g.input.drop = true,
                    "h" | "H" => {
                        g.show_hitboxes = !g.show_hitboxes;
                        log::info!("Hitbox overlay: {}", g.show_hitboxes);
                    }
                    _ => {}
                }
            });
            window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())?;
            closure.forget();
        }
        Ok(())
    }

    /// Everything the animation frame callback needs
    struct Frame {
        game: Rc<RefCell<Game>>,
        ctx: CanvasRenderingContext2d,
        board: Board,
        panel: Rc<RefCell<LeaderboardPanel>>,
    }

    fn request_animation_frame(frame: Frame) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(frame, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(frame: Frame, time: f64) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        let mut submission = None;
        let player;
        {
            let mut g = frame.game.borrow_mut();

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;
            g.update(dt);

            for event in g.session.drain_events() {
                match event {
                    GameEvent::PreviewSpawned { .. } | GameEvent::NextTier { .. } => {
                        show_next_tier(&document, g.session.next_tier());
                    }
                    GameEvent::GameOver { score } => {
                        if let Some(player) = g.session.player() {
                            submission = Some((player.clone(), score));
                        }
                    }
                    _ => {}
                }
            }

            g.render(&frame.ctx);
            g.update_hud(&document);
            player = g.session.remembered_name().map(|p| p.to_string());
        }

        if let Some((name, score)) = submission {
            submit_score(frame.board.clone(), frame.panel.clone(), name, score);
        }

        let due = frame.panel.borrow().refresh_due(js_sys::Date::now());
        if due {
            refresh_leaderboard(frame.board.clone(), frame.panel.clone(), player);
        }

        request_animation_frame(frame);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    //! Scripted native run: drops clowns at random columns until the board
    //! overflows, then submits the score to an in-memory leaderboard.

    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use clown_suika::consts::{SIM_DT, TICKS_PER_SECOND};
    use clown_suika::leaderboard::{Leaderboard, MemoryLeaderboard};
    use clown_suika::persistence::MemoryStore;
    use clown_suika::sim::{ArcadeWorld, GameEvent, GameSession, TickInput, tick};
    use clown_suika::{TIERS, Tuning};

    /// Give up after ten simulated minutes
    const MAX_TICKS: u64 = 10 * 60 * TICKS_PER_SECOND as u64;

    pub fn run(seed: u64) {
        let tuning = Tuning::default();
        let area = tuning.play_area;
        let physics = ArcadeWorld::new(area, tuning.gravity);
        let mut session = GameSession::new(physics, Box::new(MemoryStore::new()), tuning, seed);
        let mut rng = Pcg32::seed_from_u64(seed ^ 0x5eed);

        if let Err(e) = session.start("Headless") {
            log::error!("Could not start session: {}", e);
            return;
        }

        let mut merges = 0u32;
        while !session.is_game_over() && session.time_ticks() < MAX_TICKS {
            let input = TickInput {
                aim_x: Some(rng.random_range(area.left..=area.right)),
                drop: session.preview().is_some(),
            };
            tick(&mut session, &input, SIM_DT);

            for event in session.drain_events() {
                if let GameEvent::Merged { tier, points, .. } = event {
                    merges += 1;
                    log::debug!("Merged into {} (+{})", TIERS[tier].name, points);
                }
            }
        }

        let seconds = session.time_ticks() as f32 * SIM_DT;
        log::info!(
            "Run finished after {:.1}s: score {}, {} merges, highest tier {}",
            seconds,
            session.score(),
            merges,
            session
                .bodies()
                .highest_tier()
                .map(|t| TIERS[t].name)
                .unwrap_or("none")
        );

        let Some((player, score)) = session.final_result() else {
            log::warn!("Board never overflowed; nothing to submit");
            return;
        };

        let board = Leaderboard::new(MemoryLeaderboard::with_entries([("Bozo", 120), ("Pennywise", 45)]));
        match pollster::block_on(board.submit(player, score)) {
            Ok(result) => {
                for (i, entry) in result.top_entries.iter().enumerate() {
                    println!("#{:<2} {:<20} {}", i + 1, entry.name, entry.score);
                }
            }
            Err(e) => log::warn!("{}", e),
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Clown Suika (native) starting...");
    log::info!("Native mode runs a headless game - run with `trunk serve` for the web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    headless::run(seed);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

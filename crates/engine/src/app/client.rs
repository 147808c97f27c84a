use std::path::PathBuf;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::screenshots::{
    cleanup_collection, split_prefix, AUTO_SCREENSHOT_PREFIX, AUTO_STAT_SCREENSHOT_PREFIX,
    SCREENSHOT_EXTENSION,
};

use super::graph::{GraphRect, RingGraph};
use super::tools::draw_text;
use super::{
    ClientState, Clock, Collaborators, EditorContext, FocusTracker, FramePacer, GraphicsError,
    InputHistory, InputPayload, Key, MouseMode, StateMachine, SystemClock,
};

pub const GAME_TICK_SPEED: u32 = 50;
/// Latency recorded with every predicted input.
pub const PREDICTION_MARGIN: Duration = Duration::from_millis(10);
pub const UNKNOWN_VERSION: &str = "0";

const FPS_GRAPH_RANGE: (f32, f32) = (0.0, 120.0);
const MARGIN_GRAPH_RANGE: (f32, f32) = (-20.0, 20.0);
const IDLE_SLEEP: Duration = Duration::from_millis(5);
const STRESS_RENDER_INTERVAL: u64 = 10;
const MIN_RENDER_FRAME_TIME: f64 = 0.0001;
const SOUND_DISTANCE_SCREEN_FACTOR: f32 = 1.5;
const NANOS_PER_SEC: u64 = 1_000_000_000;
const CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];
const DEBUG_TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("couldn't init graphics: {0}")]
    GraphicsInit(#[source] GraphicsError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// The client runtime: owns the state machine, the frame pacer, the input
/// history and the timing graphs, and drives every collaborator once per loop
/// iteration.
pub struct Client<C: Clock = SystemClock> {
    clock: C,
    config: ClientConfig,
    state: StateMachine,
    pacer: FramePacer,
    focus: FocusTracker,
    inputs: InputHistory,
    input_margin_graph: RingGraph,
    gametime_margin_graph: RingGraph,
    fps_graph: RingGraph,
    collaborators: Collaborators,
    screenshots_dir: PathBuf,
    latest_version: String,
    local_start: Instant,
    local_time: f64,
    render_frame_time: f64,
    render_frame_time_low: f64,
    render_frame_time_high: f64,
    render_frames: u64,
    frame_time_avg: f64,
    game_tick_speed: u32,
    cursor_target: (f32, f32),
    sound_available: bool,
    auto_screenshot_recycle: bool,
    auto_stat_screenshot_recycle: bool,
}

impl Client<SystemClock> {
    pub fn new(
        config: ClientConfig,
        collaborators: Collaborators,
        screenshots_dir: PathBuf,
    ) -> Self {
        Self::with_clock(SystemClock, config, collaborators, screenshots_dir)
    }
}

impl<C: Clock> Client<C> {
    pub fn with_clock(
        clock: C,
        config: ClientConfig,
        collaborators: Collaborators,
        screenshots_dir: PathBuf,
    ) -> Self {
        let now = clock.now();
        Self {
            clock,
            config,
            state: StateMachine::new(),
            pacer: FramePacer::new(now),
            focus: FocusTracker::new(),
            inputs: InputHistory::new(),
            input_margin_graph: RingGraph::new(MARGIN_GRAPH_RANGE.0, MARGIN_GRAPH_RANGE.1),
            gametime_margin_graph: RingGraph::new(MARGIN_GRAPH_RANGE.0, MARGIN_GRAPH_RANGE.1),
            fps_graph: RingGraph::new(FPS_GRAPH_RANGE.0, FPS_GRAPH_RANGE.1),
            collaborators,
            screenshots_dir,
            latest_version: UNKNOWN_VERSION.to_string(),
            local_start: now,
            local_time: 0.0,
            render_frame_time: MIN_RENDER_FRAME_TIME,
            render_frame_time_low: 1.0,
            render_frame_time_high: 0.0,
            render_frames: 0,
            frame_time_avg: 0.0,
            game_tick_speed: GAME_TICK_SPEED,
            cursor_target: (0.0, 0.0),
            sound_available: false,
            auto_screenshot_recycle: false,
            auto_stat_screenshot_recycle: false,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state.state()
    }

    pub fn set_state(&mut self, next: ClientState) -> bool {
        self.state.set_state(next, self.config.debug)
    }

    pub fn quit(&mut self) {
        self.set_state(ClientState::Quitting);
    }

    /// Input recorded for the latest tick not after `tick`.
    pub fn get_input(&self, tick: i32) -> Option<&InputPayload> {
        self.inputs.lookup(tick)
    }

    pub fn latest_version(&self) -> &str {
        &self.latest_version
    }

    pub fn local_time(&self) -> f64 {
        self.local_time
    }

    pub fn render_frame_time(&self) -> f64 {
        self.render_frame_time
    }

    /// Shortest and longest render frame times seen so far, in seconds.
    pub fn render_frame_time_range(&self) -> (f64, f64) {
        (self.render_frame_time_low, self.render_frame_time_high)
    }

    pub fn render_frames(&self) -> u64 {
        self.render_frames
    }

    pub fn sound_available(&self) -> bool {
        self.sound_available
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ClientConfig {
        &mut self.config
    }

    pub fn into_config(self) -> ClientConfig {
        self.config
    }

    pub fn tick_start_time(&self, tick: i32) -> Instant {
        let offset = Duration::from_nanos(
            u64::from(tick.unsigned_abs()) * NANOS_PER_SEC / u64::from(self.game_tick_speed),
        );
        if tick >= 0 {
            self.local_start + offset
        } else {
            self.local_start
                .checked_sub(offset)
                .unwrap_or(self.local_start)
        }
    }

    pub fn current_tick(&self, now: Instant) -> i32 {
        let elapsed = now.saturating_duration_since(self.local_start).as_nanos();
        let tick = elapsed * u128::from(self.game_tick_speed) / u128::from(NANOS_PER_SEC);
        i32::try_from(tick).unwrap_or(i32::MAX)
    }

    /// Initializes every collaborator. Graphics failure aborts; sound may fail.
    pub fn start(&mut self) -> Result<(), ClientError> {
        self.local_start = self.clock.now();
        self.pacer = FramePacer::new(self.local_start);

        self.collaborators
            .graphics
            .init()
            .map_err(ClientError::GraphicsInit)?;

        match self.collaborators.sound.init() {
            Ok(()) => self.sound_available = true,
            Err(error) => {
                self.sound_available = false;
                warn!(error = %error, "sound_init_failed");
            }
        }
        let (screen_width, screen_height) = self.collaborators.graphics.screen_size();
        self.collaborators
            .sound
            .set_max_distance(SOUND_DISTANCE_SCREEN_FACTOR * screen_width as f32 / 2.0);

        self.collaborators.text.init();
        self.collaborators.input.init();
        self.fps_graph.init(FPS_GRAPH_RANGE.0, FPS_GRAPH_RANGE.1);
        self.collaborators
            .editor
            .init((screen_width, screen_height));

        let settings = self.config.pacer_settings();
        info!(
            screen_width,
            screen_height,
            max_fps = settings.max_fps,
            limit_fps = settings.limit_fps,
            vsync = settings.vsync,
            sound = self.sound_available,
            "client_started"
        );
        Ok(())
    }

    pub fn run(&mut self) -> Result<(), ClientError> {
        self.run_with(|_| {})
    }

    /// `run` with a step between start and the first iteration, where the
    /// window and collaborators are live.
    pub fn run_with(&mut self, after_start: impl FnOnce(&mut Self)) -> Result<(), ClientError> {
        self.start()?;
        after_start(self);
        self.run_loop();
        self.shutdown();
        Ok(())
    }

    pub fn run_loop(&mut self) {
        while self.run_iteration() == LoopControl::Continue {}
    }

    pub fn shutdown(&mut self) {
        self.collaborators.graphics.shutdown();
        self.collaborators.sound.shutdown();
        self.collaborators.text.shutdown();
        info!(
            render_frames = self.render_frames,
            local_time_s = self.local_time,
            "shutdown"
        );
    }

    pub fn run_iteration(&mut self) -> LoopControl {
        if self.collaborators.input.update() {
            info!(reason = "os_quit", "shutdown_requested");
            self.quit();
            return LoopControl::Exit;
        }

        self.collaborators.sound.update();
        self.update_focus();
        self.handle_hotkeys();

        if self.focus.is_settled() {
            self.collaborators.input.mouse_mode_relative();
        }
        self.collaborators.text.update();

        let (dx, dy) = self.collaborators.input.cursor_delta();
        self.cursor_target.0 += dx;
        self.cursor_target.1 += dy;

        let decision = self.pacer.decide(&self.clock, self.config.pacer_settings());
        if decision.should_render()
            && (!self.config.gfx_async_render || self.collaborators.graphics.is_idle())
        {
            self.render_frame();
        }

        self.auto_screenshot_cleanup();

        if self.state().is_terminal() {
            return LoopControl::Exit;
        }

        self.be_nice();
        self.local_time = self
            .clock
            .now()
            .saturating_duration_since(self.local_start)
            .as_secs_f64();
        LoopControl::Continue
    }

    fn update_focus(&mut self) {
        let window_active = self.collaborators.graphics.window_active();
        let release_requested =
            self.config.dbg_focus && self.collaborators.input.key_press(Key::Escape);
        let left_click = self.collaborators.input.key_press(Key::MouseLeft);

        let outcome = self
            .focus
            .update(window_active, release_requested, left_click);
        match outcome.mouse_mode {
            Some(MouseMode::Absolute) => self.collaborators.input.mouse_mode_absolute(),
            Some(MouseMode::Relative) => self.collaborators.input.mouse_mode_relative(),
            None => {}
        }

        if outcome.recaptured {
            if let Some(screen) = self.collaborators.graphics.window_screen() {
                if screen != self.config.gfx_screen {
                    debug!(from = self.config.gfx_screen, to = screen, "window_screen_changed");
                    self.config.gfx_screen = screen;
                }
            }
        }
    }

    fn handle_hotkeys(&mut self) {
        let input = &self.collaborators.input;
        if !(input.key_is_pressed(Key::LeftCtrl) && input.key_is_pressed(Key::LeftShift)) {
            return;
        }
        let quit = input.key_press(Key::Q);
        let toggle_debug = input.key_press(Key::D);
        let toggle_graphs = input.key_press(Key::G);

        if quit {
            info!(reason = "panic_hotkey", "shutdown_requested");
            self.quit();
        }
        if toggle_debug {
            self.config.debug = !self.config.debug;
            info!(debug = self.config.debug, "debug_toggled");
        }
        if toggle_graphs {
            self.config.dbg_graphs = !self.config.dbg_graphs;
            info!(dbg_graphs = self.config.dbg_graphs, "debug_graphs_toggled");
        }
    }

    fn render_frame(&mut self) {
        self.render_frames += 1;

        let now = self.clock.now();
        self.render_frame_time = now
            .saturating_duration_since(self.pacer.last_render())
            .as_secs_f64()
            .max(MIN_RENDER_FRAME_TIME);
        self.render_frame_time_low = self.render_frame_time_low.min(self.render_frame_time);
        self.render_frame_time_high = self.render_frame_time_high.max(self.render_frame_time);
        self.fps_graph
            .add((1.0 / self.render_frame_time) as f32, 1.0, 1.0, 1.0);
        self.pacer.record_render(now);

        self.record_input(now);

        if !self.config.dbg_stress || self.render_frames % STRESS_RENDER_INTERVAL == 0 {
            self.render();
            if let Err(error) = self.collaborators.graphics.swap() {
                warn!(error = %error, "swap_failed");
                self.quit();
            }
        }
    }

    /// Records the input for the predicted tick and feeds the margin graphs.
    /// Renders inside one tick each record their own slot for that tick.
    fn record_input(&mut self, now: Instant) {
        let current_tick = self.current_tick(now);
        let predicted_tick = current_tick + 1;

        let intra_tick_ms = now
            .saturating_duration_since(self.tick_start_time(current_tick))
            .as_secs_f64()
            * 1000.0;
        self.gametime_margin_graph
            .add(intra_tick_ms as f32, 1.0, 1.0, 1.0);

        let until_tick = self.tick_start_time(predicted_tick);
        let margin_ms = signed_millis(until_tick, now) - PREDICTION_MARGIN.as_secs_f64() * 1000.0;
        if margin_ms >= 0.0 {
            self.input_margin_graph
                .add(margin_ms as f32, 0.0, 1.0, 0.0);
        } else {
            self.input_margin_graph
                .add(margin_ms as f32, 1.0, 0.0, 0.0);
        }

        let payload = InputPayload::from_words(&self.sample_input_words());
        self.inputs
            .record(predicted_tick, payload, PREDICTION_MARGIN, now);
    }

    fn sample_input_words(&self) -> [i32; 6] {
        let input = &self.collaborators.input;
        let held = |key| i32::from(input.key_is_pressed(key));
        [
            held(Key::D) - held(Key::A),
            self.cursor_target.0.round() as i32,
            self.cursor_target.1.round() as i32,
            held(Key::Space),
            held(Key::MouseLeft),
            held(Key::MouseRight),
        ]
    }

    fn render(&mut self) {
        let local_time = self.local_time;
        let render_frame_time = self.render_frame_time;
        {
            let Collaborators {
                graphics,
                input,
                editor,
                ..
            } = &mut self.collaborators;
            let mut target = graphics.frame();
            target.clear(CLEAR_COLOR);
            editor.update_and_render(EditorContext {
                target,
                input: &**input,
                local_time,
                render_frame_time,
            });
        }

        if self.config.debug {
            self.debug_render();
        }
    }

    fn debug_render(&mut self) {
        self.frame_time_avg = self.frame_time_avg * 0.9 + self.render_frame_time * 0.1;
        let fps = (1.0 / self.frame_time_avg + 0.5) as u32;

        let mut target = self.collaborators.graphics.frame();
        draw_text(&mut target, 2, 2, &format!("fps: {fps:3}"), DEBUG_TEXT_COLOR);

        if !self.config.dbg_graphs {
            return;
        }

        let screen_w = target.width as f32;
        let screen_h = target.height as f32;
        let w = screen_w / 4.0;
        let h = screen_h / 6.0;
        let sp = screen_w / 100.0;
        let x = screen_w - w - sp;

        let graphs = [
            (&mut self.fps_graph, "FPS"),
            (&mut self.input_margin_graph, "Prediction Margin"),
            (&mut self.gametime_margin_graph, "Gametime Margin"),
        ];
        for (row, (graph, description)) in graphs.into_iter().enumerate() {
            graph.scale();
            let y = sp * 5.0 + row as f32 * (h + sp);
            graph.render(&mut target, GraphRect { x, y, w, h }, description);
        }
    }

    fn be_nice(&mut self) {
        if self.config.cl_cpu_throttle > 0 {
            self.clock
                .sleep(Duration::from_millis(self.config.cl_cpu_throttle));
        } else if self.config.dbg_stress || !self.collaborators.graphics.window_active() {
            self.clock.sleep(IDLE_SLEEP);
        }

        if self.config.dbg_hitch > 0 {
            self.clock.sleep(Duration::from_millis(self.config.dbg_hitch));
            self.config.dbg_hitch = 0;
        }
    }

    pub fn minimize(&mut self) {
        self.collaborators.graphics.minimize();
    }

    pub fn screenshot(&mut self) {
        self.take_screenshot(None);
    }

    fn take_screenshot(&mut self, name: Option<&str>) -> bool {
        match self.collaborators.graphics.take_screenshot(name) {
            Ok(path) => {
                info!(path = %path.display(), "screenshot_saved");
                true
            }
            Err(error) => {
                warn!(error = %error, "screenshot_failed");
                false
            }
        }
    }

    pub fn auto_screenshot_start(&mut self) {
        if self.config.cl_auto_screenshot {
            self.take_screenshot(Some(AUTO_SCREENSHOT_PREFIX));
            self.auto_screenshot_recycle = true;
        }
    }

    pub fn auto_stat_screenshot_start(&mut self) {
        if self.config.cl_auto_statscreenshot {
            self.take_screenshot(Some(AUTO_STAT_SCREENSHOT_PREFIX));
            self.auto_stat_screenshot_recycle = true;
        }
    }

    pub fn auto_screenshot_cleanup(&mut self) {
        if self.auto_screenshot_recycle {
            self.recycle_screenshots(AUTO_SCREENSHOT_PREFIX);
            self.auto_screenshot_recycle = false;
        }
        if self.auto_stat_screenshot_recycle {
            self.recycle_screenshots(AUTO_STAT_SCREENSHOT_PREFIX);
            self.auto_stat_screenshot_recycle = false;
        }
    }

    fn recycle_screenshots(&self, prefix: &str) {
        let (dir, file_prefix) = split_prefix(&self.screenshots_dir, prefix);
        if let Err(error) = cleanup_collection(
            &dir,
            &file_prefix,
            SCREENSHOT_EXTENSION,
            self.config.cl_auto_screenshot_max,
        ) {
            warn!(dir = %dir.display(), error = %error, "auto_screenshot_cleanup_failed");
        }
    }

    pub fn switch_window_screen(&mut self, index: usize) {
        if self.config.gfx_fullscreen {
            self.toggle_fullscreen();
            self.move_to_screen(index);
            self.toggle_fullscreen();
        } else {
            self.move_to_screen(index);
        }
    }

    fn move_to_screen(&mut self, index: usize) {
        if self.collaborators.graphics.set_window_screen(index) {
            self.config.gfx_screen = index;
        } else {
            warn!(index, "window_screen_switch_failed");
        }
    }

    pub fn toggle_fullscreen(&mut self) -> bool {
        let next = !self.config.gfx_fullscreen;
        if self.collaborators.graphics.set_fullscreen(next) {
            self.config.gfx_fullscreen = next;
            true
        } else {
            false
        }
    }

    pub fn toggle_window_bordered(&mut self) {
        self.config.gfx_borderless = !self.config.gfx_borderless;
        self.collaborators
            .graphics
            .set_window_bordered(!self.config.gfx_borderless);
    }

    pub fn toggle_window_vsync(&mut self) -> bool {
        let next = !self.config.gfx_vsync;
        if self.collaborators.graphics.set_vsync(next) {
            self.config.gfx_vsync = next;
            true
        } else {
            false
        }
    }
}

fn signed_millis(later: Instant, earlier: Instant) -> f64 {
    match later.checked_duration_since(earlier) {
        Some(ahead) => ahead.as_secs_f64() * 1000.0,
        None => -(earlier.duration_since(later).as_secs_f64() * 1000.0),
    }
}

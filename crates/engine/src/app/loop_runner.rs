use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use pixels::Error as PixelsError;
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;

use crate::content::ContentLoadError;
use crate::puzzle::{GameSession, SessionCommand, SessionError, SessionEvent, Vec2};
use crate::StartupError;

use super::input::{InputAction, InputCollector};
use super::rendering::{PanelShake, Renderer};
use super::walker::Walker;

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub target_tps: u32,
    pub max_frame_delta: Duration,
    pub max_ticks_per_frame: u32,
    pub max_render_fps: Option<u32>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Escape Room".to_string(),
            window_width: 960,
            window_height: 540,
            target_tps: 60,
            max_frame_delta: Duration::from_millis(250),
            max_ticks_per_frame: 5,
            max_render_fps: Some(60),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to load room definitions: {0}")]
    Content(#[from] ContentLoadError),
    #[error("failed to start puzzle session: {0}")]
    Session(#[from] SessionError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Everything one tick mutates. Kept apart from the window so ticks can be
/// driven without an event loop.
struct PuzzleRuntime {
    session: GameSession,
    walker: Walker,
    spawn: Vec2,
    shake: PanelShake,
    last_panel: Option<(String, String)>,
}

impl PuzzleRuntime {
    fn new(session: GameSession, walker: Walker) -> Self {
        let mut runtime = Self {
            session,
            spawn: walker.position(),
            walker,
            shake: PanelShake::default(),
            last_panel: None,
        };
        for event in runtime.session.drain_events() {
            runtime.on_session_event(&event);
        }
        runtime
    }

    /// Applies at most one queued action, then advances the walker.
    fn tick(&mut self, input: &mut InputCollector) -> SessionCommand {
        let mut command = SessionCommand::None;
        if let Some(action) = input.next_action() {
            command = self.apply(action);
        }

        for event in self.session.drain_events() {
            self.on_session_event(&event);
        }
        self.walker.update(self.session.obstacles());
        self.shake.tick();
        command
    }

    fn apply(&mut self, action: InputAction) -> SessionCommand {
        match action {
            InputAction::Pointer(position) => {
                let room_click = self.is_room_click(position);
                self.session.pointer_down(position);
                if room_click {
                    self.walker.set_target(position);
                }
                SessionCommand::None
            }
            InputAction::Key(key) => {
                self.last_panel = self.open_panel_text();
                self.session.key_down(key)
            }
            InputAction::DumpState => {
                match self.session.snapshot().to_json_pretty() {
                    Ok(json) => info!(snapshot = %json, "session_state_dump"),
                    Err(error) => warn!(error = %error, "session_state_dump_failed"),
                }
                SessionCommand::None
            }
        }
    }

    /// A click the walker should follow: on the room floor, with no modal or
    /// win screen in front of it.
    fn is_room_click(&self, position: Vec2) -> bool {
        !self.session.won()
            && self.session.focus().room_has_focus()
            && self.session.inventory().slot_at(position).is_none()
            && position.y < self.session.inventory().layout().origin_y as f32
    }

    fn open_panel_text(&self) -> Option<(String, String)> {
        let lock = self.session.code_lock()?;
        let title = self
            .session
            .active_room()
            .object(lock.target())
            .map(|object| object.name.clone())
            .unwrap_or_else(|| lock.target().to_string());
        Some((title, lock.display_text()))
    }

    fn on_session_event(&mut self, event: &SessionEvent) {
        debug!(event = ?event, "session_event");
        match event {
            SessionEvent::CodeRejected(_) => {
                if let Some((title, display)) = self.last_panel.take() {
                    self.shake.trigger(title, display);
                }
            }
            SessionEvent::RoomEntered(_) => self.walker.teleport(self.spawn),
            _ => {}
        }
    }
}

pub fn run_app(
    config: LoopConfig,
    session: GameSession,
    walker: Walker,
    asset_root: PathBuf,
) -> Result<(), AppError> {
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .with_min_inner_size(LogicalSize::new(320.0, 180.0))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let window_for_loop = Arc::clone(&window);
    let mut renderer = Renderer::new(window, asset_root).map_err(AppError::CreateRenderer)?;

    event_loop.set_control_flow(ControlFlow::Poll);

    let target_tps = config.target_tps.max(1);
    let max_frame_delta =
        normalize_non_zero_duration(config.max_frame_delta, Duration::from_millis(250));
    let max_ticks_per_frame = config.max_ticks_per_frame.max(1);
    let fixed_dt = Duration::from_secs_f64(1.0 / target_tps as f64);
    let effective_render_cap = normalize_render_fps_cap(config.max_render_fps);
    let render_frame_target = target_frame_duration(effective_render_cap);
    let mut input_collector = InputCollector::new();
    let mut runtime = PuzzleRuntime::new(session, walker);

    info!(
        room = %runtime.session.active_room().id,
        rooms = runtime.session.rooms().len(),
        "session_started"
    );
    info!(
        target_tps,
        max_frame_delta_ms = max_frame_delta.as_millis() as u64,
        max_ticks_per_frame,
        render_fps_cap = %format_render_cap(effective_render_cap),
        "loop_config"
    );

    let mut accumulator = Duration::ZERO;
    let mut last_frame_instant = Instant::now();
    let mut last_present_instant = Instant::now();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window_for_loop.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        info!(reason = "window_close", "shutdown_requested");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        if let Err(error) = renderer.resize(new_size.width, new_size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::ScaleFactorChanged { .. } => {
                        let size = window_for_loop.inner_size();
                        if let Err(error) = renderer.resize(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        input_collector.set_cursor_position(
                            renderer.window_to_screen(position.x as f32, position.y as f32),
                        );
                    }
                    WindowEvent::CursorLeft { .. } => {
                        input_collector.set_cursor_position(None);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        input_collector.handle_mouse_input(button, state);
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        input_collector.handle_key(event.physical_key, event.state);
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        let raw_frame_dt = now.saturating_duration_since(last_frame_instant);
                        last_frame_instant = now;

                        let clamped_frame_dt = clamp_frame_delta(raw_frame_dt, max_frame_delta);
                        accumulator = accumulator.saturating_add(clamped_frame_dt);

                        let step_plan = plan_sim_steps(accumulator, fixed_dt, max_ticks_per_frame);
                        for _ in 0..step_plan.ticks_to_run {
                            if runtime.tick(&mut input_collector) == SessionCommand::Quit {
                                info!(reason = "escape_key", "shutdown_requested");
                                window_target.exit();
                                return;
                            }
                        }
                        accumulator = step_plan.remaining_accumulator;

                        if step_plan.dropped_backlog > Duration::ZERO {
                            warn!(
                                dropped_backlog_ms = step_plan.dropped_backlog.as_millis() as u64,
                                max_ticks_per_frame, "sim_clamp_triggered"
                            );
                        }

                        let elapsed_since_last_present =
                            Instant::now().saturating_duration_since(last_present_instant);
                        let cap_sleep =
                            compute_cap_sleep(elapsed_since_last_present, render_frame_target);
                        if cap_sleep > Duration::ZERO {
                            thread::sleep(cap_sleep);
                        }

                        if let Err(error) = renderer.render(
                            &runtime.session,
                            &runtime.walker,
                            input_collector.cursor_position(),
                            &runtime.shake,
                        ) {
                            warn!(error = %error, "renderer_draw_failed");
                            window_target.exit();
                        }
                        last_present_instant = Instant::now();
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                window_for_loop.request_redraw();
            }
            Event::LoopExiting => {
                info!(
                    won = runtime.session.won(),
                    room = %runtime.session.active_room().id,
                    "shutdown"
                );
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

#[derive(Debug, Clone, Copy)]
struct StepPlan {
    ticks_to_run: u32,
    remaining_accumulator: Duration,
    dropped_backlog: Duration,
}

fn plan_sim_steps(
    mut accumulator: Duration,
    fixed_dt: Duration,
    max_ticks_per_frame: u32,
) -> StepPlan {
    let mut ticks_to_run = 0u32;

    while accumulator >= fixed_dt && ticks_to_run < max_ticks_per_frame {
        accumulator = accumulator.saturating_sub(fixed_dt);
        ticks_to_run = ticks_to_run.saturating_add(1);
    }

    let dropped_backlog = if accumulator >= fixed_dt {
        std::mem::take(&mut accumulator)
    } else {
        Duration::ZERO
    };
    StepPlan {
        ticks_to_run,
        remaining_accumulator: accumulator,
        dropped_backlog,
    }
}

fn clamp_frame_delta(frame_dt: Duration, max_frame_delta: Duration) -> Duration {
    frame_dt.min(max_frame_delta)
}

fn normalize_non_zero_duration(value: Duration, fallback: Duration) -> Duration {
    if value.is_zero() {
        fallback
    } else {
        value
    }
}

fn normalize_render_fps_cap(cap: Option<u32>) -> Option<u32> {
    cap.filter(|value| *value > 0)
}

fn target_frame_duration(max_render_fps: Option<u32>) -> Option<Duration> {
    max_render_fps.map(|fps| Duration::from_secs_f64(1.0 / fps as f64))
}

fn compute_cap_sleep(elapsed: Duration, target: Option<Duration>) -> Duration {
    match target {
        Some(frame_target) if elapsed < frame_target => frame_target - elapsed,
        _ => Duration::ZERO,
    }
}

fn format_render_cap(cap: Option<u32>) -> String {
    match cap {
        Some(value) => value.to_string(),
        None => "off".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use winit::event::{ElementState, MouseButton};
    use winit::keyboard::{KeyCode, PhysicalKey};

    use super::*;
    use crate::puzzle::{
        BehaviorKind, ExitTarget, Inventory, InteractiveObject, Rect, Room, SessionCommand,
    };

    fn runtime() -> PuzzleRuntime {
        let room = Room::new("study", "Study", "Locked in.")
            .with_object(
                InteractiveObject::new(
                    "drawer",
                    "Drawer",
                    Rect::new(180, 300, 160, 100),
                    BehaviorKind::CodeContainer,
                )
                .locked(true)
                .with_code("314"),
            )
            .with_object(InteractiveObject::new(
                "door",
                "Door",
                Rect::new(800, 120, 120, 240),
                BehaviorKind::Exit {
                    key: None,
                    leads_to: ExitTarget::Escape,
                },
            ));
        PuzzleRuntime::new(
            GameSession::new(vec![room], Inventory::new(7)).expect("session"),
            Walker::new(Vec2::new(480.0, 250.0), 2.0),
        )
    }

    fn press(input: &mut InputCollector, code: KeyCode) {
        input.handle_key(PhysicalKey::Code(code), ElementState::Pressed);
        input.handle_key(PhysicalKey::Code(code), ElementState::Released);
    }

    fn click(input: &mut InputCollector, x: f32, y: f32) {
        input.set_cursor_position(Some(Vec2::new(x, y)));
        input.handle_mouse_input(MouseButton::Left, ElementState::Pressed);
        input.handle_mouse_input(MouseButton::Left, ElementState::Released);
    }

    #[test]
    fn clamp_frame_delta_caps_large_frame() {
        let max_frame_delta = Duration::from_millis(250);
        assert_eq!(
            clamp_frame_delta(Duration::from_millis(600), max_frame_delta),
            max_frame_delta
        );
    }

    #[test]
    fn plan_sim_steps_runs_expected_ticks_without_drop() {
        let result = plan_sim_steps(Duration::from_millis(48), Duration::from_millis(16), 5);
        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::ZERO);
    }

    #[test]
    fn plan_sim_steps_drops_backlog_when_tick_cap_hit() {
        let result = plan_sim_steps(Duration::from_millis(120), Duration::from_millis(16), 3);
        assert_eq!(result.ticks_to_run, 3);
        assert_eq!(result.remaining_accumulator, Duration::ZERO);
        assert_eq!(result.dropped_backlog, Duration::from_millis(72));
    }

    #[test]
    fn compute_cap_sleep_respects_budget() {
        let target = target_frame_duration(Some(60));
        assert_eq!(compute_cap_sleep(Duration::from_millis(20), target), Duration::ZERO);
        assert!(compute_cap_sleep(Duration::from_millis(5), target) > Duration::ZERO);
        assert_eq!(compute_cap_sleep(Duration::from_millis(5), None), Duration::ZERO);
    }

    #[test]
    fn normalize_render_fps_cap_disables_zero() {
        assert_eq!(normalize_render_fps_cap(Some(0)), None);
        assert_eq!(normalize_render_fps_cap(Some(60)), Some(60));
    }

    #[test]
    fn one_action_is_applied_per_tick() {
        let mut runtime = runtime();
        let mut input = InputCollector::new();
        click(&mut input, 200.0, 320.0);
        press(&mut input, KeyCode::Digit3);
        press(&mut input, KeyCode::Digit1);

        runtime.tick(&mut input);
        assert!(runtime.session.code_lock().is_some());
        assert_eq!(input.pending(), 2);

        runtime.tick(&mut input);
        assert_eq!(runtime.session.code_lock().map(|lock| lock.buffer()), Some("3"));
        runtime.tick(&mut input);
        assert_eq!(runtime.session.code_lock().map(|lock| lock.buffer()), Some("31"));
    }

    #[test]
    fn rejected_code_starts_panel_shake() {
        let mut runtime = runtime();
        let mut input = InputCollector::new();
        click(&mut input, 200.0, 320.0);
        for code in [KeyCode::Digit9, KeyCode::Digit9, KeyCode::Digit9, KeyCode::Enter] {
            press(&mut input, code);
        }
        for _ in 0..5 {
            runtime.tick(&mut input);
        }
        assert!(runtime.shake.is_active());
        assert!(runtime.session.code_lock().is_none());
        assert!(runtime.session.active_room().objects()[0].locked);
    }

    #[test]
    fn escape_without_modal_requests_quit() {
        let mut runtime = runtime();
        let mut input = InputCollector::new();
        press(&mut input, KeyCode::Escape);
        assert_eq!(runtime.tick(&mut input), SessionCommand::Quit);
    }

    #[test]
    fn escape_inside_code_panel_only_closes_it() {
        let mut runtime = runtime();
        let mut input = InputCollector::new();
        click(&mut input, 200.0, 320.0);
        press(&mut input, KeyCode::Escape);
        runtime.tick(&mut input);
        assert_eq!(runtime.tick(&mut input), SessionCommand::None);
        assert!(runtime.session.code_lock().is_none());
    }

    #[test]
    fn floor_clicks_steer_the_walker_but_ui_clicks_do_not() {
        let mut runtime = runtime();
        let mut input = InputCollector::new();
        click(&mut input, 600.0, 250.0);
        runtime.tick(&mut input);
        assert!(runtime.walker.is_walking());

        let mut runtime = self::runtime();
        let slot = runtime.session.inventory().slot_rect(0).center();
        click(&mut input, slot.x, slot.y);
        runtime.tick(&mut input);
        assert!(!runtime.walker.is_walking());
    }

    #[test]
    fn dump_state_leaves_session_untouched() {
        let mut runtime = runtime();
        let mut input = InputCollector::new();
        press(&mut input, KeyCode::F2);
        let before = runtime.session.snapshot();
        runtime.tick(&mut input);
        assert_eq!(runtime.session.snapshot(), before);
    }
}

use anyhow::Result;
use perivis_core::{Answer, Phase, Shape};
use perivis_experiment::{ExperimentConfig, ExperimentEvent, ExperimentMode, ExperimentStateMachine};
use perivis_render::ShapeRenderer;
use perivis_timing::{FrameStats, MonotonicClock};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::ThreadRng;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Fullscreen, Window, WindowId},
};

const RESULTS_FILE: &str = "experiment_results.json";

/// Keys for the shapes in `Shape::ALL` order.
const PERIPHERAL_KEYS: [char; 5] = ['1', '2', '3', '4', '5'];
const FIXATION_KEYS: [char; 5] = ['A', 'S', 'D', 'F', 'G'];

fn key_legend(keys: &[char; 5]) -> String {
    keys.iter()
        .zip(Shape::ALL)
        .map(|(key, shape)| format!("{key} {}", shape.label()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    machine: ExperimentStateMachine<MonotonicClock, ThreadRng>,
    renderer: Option<ShapeRenderer>,
    frame_stats: FrameStats,
    last_frame: Option<Instant>,
    current_size: Option<PhysicalSize<u32>>,
    scale_factor: f64,
    refresh_rate: Option<f64>,
    results_written: bool,
    should_exit: bool,
}

impl App {
    pub fn new() -> Result<Self> {
        let config = config_from_env();
        let machine = ExperimentStateMachine::new(config, MonotonicClock::new(), rand::rng());

        Ok(Self {
            window: None,
            pixels: None,
            machine,
            renderer: None,
            frame_stats: FrameStats::default(),
            last_frame: None,
            current_size: None,
            scale_factor: 1.0,
            refresh_rate: None,
            results_written: false,
            should_exit: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            platform = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "peripheral vision test"
        );
        info!("SPACE starts the test, ESC exits");
        info!("choice keys: {}, 0 don't know", key_legend(&PERIPHERAL_KEYS));
        if self.machine.config().mode == ExperimentMode::Dual {
            info!(
                "central shape keys: {}, H don't know",
                key_legend(&FIXATION_KEYS)
            );
        }

        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let primary_monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow::anyhow!("no monitor available"))?;

        self.refresh_rate = primary_monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let window_attributes = Window::default_attributes()
            .with_title("Perivis")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(primary_monitor.clone()))))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attributes)?);
        let physical_size = window.inner_size();
        self.current_size = Some(physical_size);
        self.scale_factor = window.scale_factor();

        info!(
            width = physical_size.width,
            height = physical_size.height,
            scale = self.scale_factor,
            refresh_hz = self.refresh_rate,
            "display configured"
        );

        let surface_texture =
            SurfaceTexture::new(physical_size.width, physical_size.height, window.clone());
        self.pixels = Some(Pixels::new(
            physical_size.width,
            physical_size.height,
            surface_texture,
        )?);
        self.renderer = Some(ShapeRenderer::new(physical_size.width, physical_size.height));

        window.set_cursor_visible(false);
        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn render(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let snapshot = self.machine.snapshot();
        renderer.render_frame(snapshot.phase, snapshot.trial.as_ref(), pixels.frame_mut())?;
        pixels.render()?;

        let now = Instant::now();
        if let Some(last) = self.last_frame.replace(now) {
            self.frame_stats.record(now - last);
        }
        Ok(())
    }

    fn update(&mut self) {
        for event in self.machine.update() {
            if let Err(err) = self.machine.handle_event(event) {
                warn!(%err, "event dropped");
            }
        }

        if self.machine.phase().is_terminal() {
            if !self.results_written {
                self.results_written = true;
                self.report_results();
            }
        } else {
            self.results_written = false;
        }
    }

    fn report_results(&self) {
        let summary = self.machine.summary();
        info!(
            trials = summary.trials,
            correct = summary.correct,
            accuracy = format!("{:.1}%", summary.accuracy() * 100.0),
            retries = summary.retries,
            "test finished, SPACE restarts"
        );

        match std::fs::File::create(RESULTS_FILE) {
            Ok(file) => {
                if let Err(err) = serde_json::to_writer_pretty(file, self.machine.results()) {
                    error!(%err, "failed to write results");
                } else {
                    info!(file = RESULTS_FILE, "results saved");
                }
            }
            Err(err) => error!(%err, file = RESULTS_FILE, "failed to create results file"),
        }
    }

    fn handle_input(&mut self, key: winit::keyboard::PhysicalKey, event_loop: &ActiveEventLoop) {
        use winit::keyboard::{KeyCode, PhysicalKey};
        let PhysicalKey::Code(code) = key else {
            return;
        };

        let dual = self.machine.config().mode == ExperimentMode::Dual;
        let event = match code {
            KeyCode::Escape => {
                self.cleanup_and_exit(event_loop);
                return;
            }
            KeyCode::Space
                if self.machine.phase() == Phase::Intro
                    || self.machine.phase().is_terminal() =>
            {
                Some(ExperimentEvent::StartPressed)
            }
            KeyCode::Digit1 => Some(ExperimentEvent::PeripheralChosen(Answer::Shape(Shape::Circle))),
            KeyCode::Digit2 => Some(ExperimentEvent::PeripheralChosen(Answer::Shape(Shape::Square))),
            KeyCode::Digit3 => Some(ExperimentEvent::PeripheralChosen(Answer::Shape(Shape::Triangle))),
            KeyCode::Digit4 => Some(ExperimentEvent::PeripheralChosen(Answer::Shape(Shape::Star))),
            KeyCode::Digit5 => Some(ExperimentEvent::PeripheralChosen(Answer::Shape(Shape::Cross))),
            KeyCode::Digit0 => Some(ExperimentEvent::PeripheralChosen(Answer::Unknown)),
            KeyCode::KeyA if dual => Some(ExperimentEvent::FixationChosen(Answer::Shape(Shape::Circle))),
            KeyCode::KeyS if dual => Some(ExperimentEvent::FixationChosen(Answer::Shape(Shape::Square))),
            KeyCode::KeyD if dual => Some(ExperimentEvent::FixationChosen(Answer::Shape(Shape::Triangle))),
            KeyCode::KeyF if dual => Some(ExperimentEvent::FixationChosen(Answer::Shape(Shape::Star))),
            KeyCode::KeyG if dual => Some(ExperimentEvent::FixationChosen(Answer::Shape(Shape::Cross))),
            KeyCode::KeyH if dual => Some(ExperimentEvent::FixationChosen(Answer::Unknown)),
            _ => None,
        };

        if let Some(event) = event {
            if let Err(err) = self.machine.handle_event(event) {
                warn!(%err, "input ignored");
            }
        }
    }

    fn handle_resize(&mut self, new_size: PhysicalSize<u32>) {
        self.current_size = Some(new_size);
        if let Some(pixels) = &mut self.pixels {
            if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                error!(%err, "failed to resize surface");
            }
            if let Err(err) = pixels.resize_buffer(new_size.width, new_size.height) {
                error!(%err, "failed to resize buffer");
            }
        }
        if let Some(renderer) = &mut self.renderer {
            renderer.resize(new_size.width, new_size.height);
        }
    }

    fn cleanup_and_exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        if !self.frame_stats.is_empty() {
            info!(
                frames = self.frame_stats.len(),
                avg_ms = format!("{:.3}", self.frame_stats.average_ms()),
                jitter_ms = format!("{:.3}", self.frame_stats.jitter_ms()),
                fps = format!("{:.1}", self.frame_stats.effective_fps()),
                "presentation loop stats"
            );
        }
        self.should_exit = true;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(err) = self.create_window_and_surface(event_loop) {
                error!(%err, "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.cleanup_and_exit(event_loop),
            WindowEvent::RedrawRequested => {
                self.update();
                if let Err(err) = self.render() {
                    error!(%err, "render error");
                }
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => {
                self.handle_input(event.physical_key, event_loop);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    self.handle_resize(window.inner_size());
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.should_exit {
            return;
        }
        // Between redraws, yield to the pending phase deadline instead
        // of spinning.
        if let Some(due) = self.machine.due_in() {
            if !due.is_zero() {
                perivis_timing::precise_sleep(due.min(std::time::Duration::from_millis(4)));
            }
        }
    }
}

/// Configuration knobs, read once at startup. A change takes effect on
/// the next launch, matching the next-start semantics of the machine.
fn config_from_env() -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    if let Ok(mode) = std::env::var("PERIVIS_MODE") {
        config.mode = if mode.eq_ignore_ascii_case("dual") {
            ExperimentMode::Dual
        } else {
            ExperimentMode::Single
        };
    }
    if let Some(ms) = env_ms("PERIVIS_BLANK_MS") {
        config.blank_ms = ms;
    }
    if let Some(ms) = env_ms("PERIVIS_DISPLAY_MS") {
        config.display_ms = ms;
    }
    config
}

fn env_ms(name: &str) -> Option<u64> {
    match std::env::var(name) {
        Ok(raw) => match raw.parse() {
            Ok(ms) => Some(ms),
            Err(_) => {
                warn!(name, raw, "ignoring unparsable duration");
                None
            }
        },
        Err(_) => None,
    }
}

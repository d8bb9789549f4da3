use std::sync::Arc;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::chrome::{ChromeFrame, ChromeOverlay};
use crate::clock::ClockSample;
use crate::config::Settings;
use crate::error::FlowerError;
use crate::fall::{FallController, FallPhase};
use crate::flower::{self, FlowerLayout};
use crate::render::petal::{Petal, PetalShape, PetalVertex};
use crate::render::{FrameContext, GpuState};

/// Physics tick rate (seconds per tick). Fall velocities are per tick.
const TICK_RATE: f64 = 1.0 / 60.0;
/// Max accumulated time before we clamp (prevents spiral of death).
const MAX_ACCUMULATOR: f64 = 0.25;
/// How often to log FPS (seconds).
const FPS_LOG_INTERVAL: f64 = 5.0;
/// Initial window size (logical pixels).
const WINDOW_SIZE: (f64, f64) = (960.0, 860.0);

// ---------------------------------------------------------------------------
// Frame timing
// ---------------------------------------------------------------------------

struct FrameStats {
    frame_count: u64,
    last_log_time: Instant,
    frame_time_sum: f64,
    frame_time_min: f64,
    frame_time_max: f64,
    frames_since_log: u32,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            frame_count: 0,
            last_log_time: Instant::now(),
            frame_time_sum: 0.0,
            frame_time_min: f64::MAX,
            frame_time_max: 0.0,
            frames_since_log: 0,
        }
    }

    fn record_frame(&mut self, dt: f64) {
        self.frame_count += 1;
        self.frames_since_log += 1;
        self.frame_time_sum += dt;
        self.frame_time_min = self.frame_time_min.min(dt);
        self.frame_time_max = self.frame_time_max.max(dt);

        let elapsed = self.last_log_time.elapsed().as_secs_f64();
        if elapsed >= FPS_LOG_INTERVAL {
            let avg_ms = (self.frame_time_sum / self.frames_since_log as f64) * 1000.0;
            let fps = self.frames_since_log as f64 / elapsed;
            log::info!(
                "FPS: {:.0} | avg: {:.2}ms | min: {:.2}ms | max: {:.2}ms | total frames: {}",
                fps,
                avg_ms,
                self.frame_time_min * 1000.0,
                self.frame_time_max * 1000.0,
                self.frame_count,
            );
            self.last_log_time = Instant::now();
            self.frame_time_sum = 0.0;
            self.frame_time_min = f64::MAX;
            self.frame_time_max = 0.0;
            self.frames_since_log = 0;
        }
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Top-level application state.
struct App {
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    chrome: Option<ChromeOverlay>,

    settings: Settings,
    shape: PetalShape,

    // Midnight fall
    fall: FallController,
    fall_phase: FallPhase,
    rehearsal_pending: bool,

    // Monotonic clock origin for ClockSample::now_ms
    epoch: Instant,

    // Fixed timestep
    last_frame_time: Option<Instant>,
    accumulator: f64,

    // Frame timing
    frame_stats: FrameStats,

    // Reusable per-frame buffers (avoid per-frame allocation)
    petal_buf: Vec<Petal>,
    outline_buf: Vec<Vec2>,
    vertex_buf: Vec<PetalVertex>,

    // Start-up failure raised inside the event loop
    error: Option<FlowerError>,
}

impl App {
    fn new(settings: Settings) -> Self {
        Self {
            window: None,
            gpu: None,
            chrome: None,
            shape: PetalShape::new(settings.petal_radius, settings.petal_width),
            fall: FallController::new(settings.rng()),
            fall_phase: FallPhase::Idle,
            rehearsal_pending: settings.rehearse,
            settings,
            epoch: Instant::now(),
            last_frame_time: None,
            accumulator: 0.0,
            frame_stats: FrameStats::new(),
            petal_buf: Vec::with_capacity(2 * flower::NUM_HOURS),
            outline_buf: Vec::new(),
            vertex_buf: Vec::new(),
            error: None,
        }
    }

    fn init_graphics(&mut self, event_loop: &ActiveEventLoop) -> Result<(), FlowerError> {
        let attrs = WindowAttributes::default()
            .with_title("Flower clock")
            .with_inner_size(winit::dpi::LogicalSize::new(WINDOW_SIZE.0, WINDOW_SIZE.1));

        let window = Arc::new(event_loop.create_window(attrs)?);
        let size = window.inner_size();
        log::info!(
            "Window created: {}x{} (scale {:.2})",
            size.width,
            size.height,
            window.scale_factor()
        );

        let gpu = GpuState::new(window.clone())?;
        log::info!("wgpu + petal pipeline initialized");

        self.chrome = Some(ChromeOverlay::new(&window, &gpu, &self.settings));
        self.gpu = Some(gpu);
        self.window = Some(window);
        Ok(())
    }

    /// Run fixed-timestep physics ticks.
    fn run_fixed_update(&mut self, dt: f64, now_ms: f64, layout: &FlowerLayout) {
        self.accumulator += dt;

        if self.accumulator > MAX_ACCUMULATOR {
            self.accumulator = MAX_ACCUMULATOR;
        }

        while self.accumulator >= TICK_RATE {
            if self.fall.is_active() {
                self.fall.tick(now_ms, layout.floor_y, layout.petal_radius);
            }
            self.accumulator -= TICK_RATE;
        }
    }

    /// Advance the simulation and draw one frame.
    fn frame(&mut self) {
        let (Some(window), Some(gpu)) = (self.window.clone(), self.gpu.as_ref()) else {
            return;
        };
        let (width, height) = gpu.logical_size();
        let size_in_pixels = [gpu.surface_config.width, gpu.surface_config.height];

        let clock = ClockSample::sample(self.epoch);
        let layout = FlowerLayout::for_screen(width, height, &self.settings);

        // --- Midnight trigger (or a requested rehearsal) ---
        if self.rehearsal_pending {
            self.rehearsal_pending = false;
            log::info!("Rehearsing the midnight fall");
            self.fall.start(layout.center, clock.now_ms);
        }
        self.fall.check_trigger(&clock, layout.center);

        // --- Timing + physics ---
        let now = Instant::now();
        if let Some(last) = self.last_frame_time {
            let dt = now.duration_since(last).as_secs_f64();
            self.frame_stats.record_frame(dt);
            self.run_fixed_update(dt, clock.now_ms, &layout);
        }
        self.last_frame_time = Some(now);
        self.fall.advance(clock.now_ms);

        let phase = self.fall.phase(clock.now_ms);
        if phase != self.fall_phase {
            log::debug!(
                "Fall phase: {:?} -> {:?} ({} petals, dissolve start {:?}, trigger day {:?})",
                self.fall_phase,
                phase,
                self.fall.petals().len(),
                self.fall.dissolve_start_ms(),
                self.fall.trigger_day(),
            );
            self.fall_phase = phase;
        }

        // --- Petals: ghosts behind, live flower in hour order ---
        self.petal_buf.clear();
        self.fall
            .build_petals(clock.now_ms, layout.petal_radius, &mut self.petal_buf);
        flower::build_petals(&clock, &layout, &mut self.petal_buf);

        self.vertex_buf.clear();
        for petal in &self.petal_buf {
            self.shape
                .tessellate(petal, &mut self.outline_buf, &mut self.vertex_buf);
        }

        let labels = flower::hour_labels(layout.center, layout.label_radius, clock.hour);

        // --- Render ---
        let (Some(gpu), Some(chrome)) = (self.gpu.as_mut(), self.chrome.as_mut()) else {
            return;
        };
        gpu.update_petals(&self.vertex_buf);

        let Some(FrameContext {
            output,
            view,
            mut encoder,
        }) = gpu.begin_frame()
        else {
            return;
        };

        gpu.draw_petals(&mut encoder, &view);

        let chrome_frame = ChromeFrame {
            clock: &clock,
            labels: &labels,
            width,
            height,
        };
        let (primitives, textures_delta, screen_descriptor) =
            chrome.run_frame(&window, &chrome_frame, size_in_pixels);
        let cmd_bufs = chrome.prepare(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &primitives,
            &textures_delta,
            &screen_descriptor,
        );
        {
            let mut pass = GpuState::begin_overlay_pass(&mut encoder, &view);
            chrome.render(&mut pass, &primitives, &screen_descriptor);
        }

        gpu.finish_frame(encoder, output, cmd_bufs);
        chrome.free_textures(&textures_delta);
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(e) = self.init_graphics(event_loop) {
            log::error!("Start-up failed: {e}");
            self.error = Some(e);
            event_loop.exit();
            return;
        }

        // Continuous animation loop
        event_loop.set_control_flow(ControlFlow::Poll);
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(window), Some(chrome)) = (&self.window, &mut self.chrome) {
            chrome.on_window_event(window, &event);
        }

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let (Some(gpu), Some(window)) = (&mut self.gpu, &self.window) {
                    gpu.resize(
                        new_size.width,
                        new_size.height,
                        window.scale_factor() as f32,
                    );
                    log::debug!("Resized to {}x{}", new_size.width, new_size.height);
                }
            }
            WindowEvent::RedrawRequested => self.frame(),
            _ => {}
        }
    }
}

/// Entry point — create event loop and run.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    log::debug!("Settings: {settings:?}");

    let event_loop = EventLoop::new().map_err(FlowerError::from)?;
    let mut app = App::new(settings);
    event_loop.run_app(&mut app).map_err(FlowerError::from)?;

    match app.error.take() {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

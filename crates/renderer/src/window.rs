use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, error, info, warn};
use wave::{DrawableSize, FrameInput, PointerState, Scene, WaveParams};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowBuilder};

use crate::gpu::GpuState;
use crate::runtime::{
    time_source_for_policy, BoxedTimeSource, FrameScheduler, RenderPolicy, TimeSample,
};
use crate::types::{AdapterProfile, RenderMode, RendererConfig};

const SOFTWARE_FPS_CAP: f32 = 15.0;

/// Scene plus the GPU resources that draw it into the preview window.
///
/// `gpu` is declared before `window` so the surface is dropped first.
pub(crate) struct WindowState {
    gpu: Option<GpuState>,
    scene: Scene,
    mouse: MouseState,
    window: Arc<Window>,
}

impl WindowState {
    pub(crate) fn new(window: Arc<Window>, config: &RendererConfig) -> Result<Self> {
        let size = window.inner_size();
        let scene = Scene::wave(
            &config.params,
            DrawableSize::from_pixels(size.width, size.height).aspect(),
        );
        let mesh = scene
            .mesh()
            .ok_or_else(|| anyhow!("wave scene has no mesh to upload"))?;
        let gpu = GpuState::new(window.as_ref(), size, &config.surface, mesh)?;

        Ok(Self {
            gpu: Some(gpu),
            scene,
            mouse: MouseState {
                pointer: config.pointer,
            },
            window,
        })
    }

    pub(crate) fn adapter_profile(&self) -> Option<&AdapterProfile> {
        self.gpu.as_ref().map(GpuState::adapter_profile)
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.gpu
            .as_ref()
            .map(GpuState::size)
            .unwrap_or_else(|| self.window.inner_size())
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Some(gpu) = self.gpu.as_mut() {
            gpu.resize(new_size);
        }
    }

    pub(crate) fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        let size = self.window.inner_size();
        self.mouse.handle_cursor_moved(position, size);
    }

    /// Refreshes the dynamic uniforms from the live drawable and draws.
    pub(crate) fn render_frame(&mut self, time: TimeSample) -> Result<(), wgpu::SurfaceError> {
        let size = self.window.inner_size();
        self.scene.update(&frame_input(time, self.mouse.pointer, size));
        match self.gpu.as_mut() {
            Some(gpu) => gpu.render(&self.scene),
            None => Ok(()),
        }
    }

    /// Detaches the mesh and frees its GPU resources ahead of teardown.
    pub(crate) fn dispose(&mut self) {
        self.scene.detach();
        if let Some(gpu) = self.gpu.take() {
            gpu.dispose();
        }
    }
}

/// Per-frame host inputs for a drawable of `size` physical pixels.
pub(crate) fn frame_input(
    time: TimeSample,
    pointer: PointerState,
    size: PhysicalSize<u32>,
) -> FrameInput {
    FrameInput {
        elapsed: time.seconds,
        pointer,
        drawable: DrawableSize::from_pixels(size.width, size.height),
    }
}

pub(crate) struct RenderPolicyDriver {
    scheduler: FrameScheduler,
    time_source: BoxedTimeSource,
}

impl RenderPolicyDriver {
    pub(crate) fn new(policy: RenderPolicy) -> Self {
        let time_source = time_source_for_policy(&policy);
        Self::with_time_source(policy, time_source)
    }

    pub(crate) fn with_time_source(policy: RenderPolicy, time_source: BoxedTimeSource) -> Self {
        Self {
            scheduler: FrameScheduler::new(policy),
            time_source,
        }
    }

    pub(crate) fn sample(&mut self) -> TimeSample {
        self.time_source.sample()
    }

    pub(crate) fn mark_rendered(&mut self, now: Instant) {
        self.scheduler.mark_rendered(now);
    }

    pub(crate) fn ready_for_frame(&self, now: Instant) -> bool {
        self.scheduler.ready_for_frame(now)
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Makes the next frame due immediately, e.g. after the swapchain was rebuilt.
    pub(crate) fn invalidate(&mut self) {
        self.scheduler.reset();
    }
}

/// Software rasterizers get a frame cap unless the caller already chose one.
fn effective_policy(policy: &RenderPolicy, profile: Option<&AdapterProfile>) -> RenderPolicy {
    let software = profile.is_some_and(AdapterProfile::is_software);
    match policy {
        RenderPolicy::Animate { target_fps: None } if software => {
            if let Some(profile) = profile {
                warn!(
                    adapter = %profile.name,
                    backend = ?profile.backend,
                    cap = SOFTWARE_FPS_CAP,
                    "software rasterizer detected; capping preview to {SOFTWARE_FPS_CAP} FPS (override with --fps)"
                );
            }
            RenderPolicy::Animate {
                target_fps: Some(SOFTWARE_FPS_CAP),
            }
        }
        other => other.clone(),
    }
}

/// Opens the window and drives the `winit` event loop until it is closed.
pub(crate) fn run(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let mut builder = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .with_transparent(config.surface.transparent);
    if config.mode == RenderMode::Fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = builder
        .build(&event_loop)
        .context("failed to create preview window")?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, config)?;
    let policy = effective_policy(&config.policy, state.adapter_profile());
    let mut driver = RenderPolicyDriver::new(policy);
    info!(
        width = config.surface_size.0,
        height = config.surface_size.1,
        mode = ?config.mode,
        "wave window ready"
    );
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        elwt.exit();
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        state.handle_cursor_moved(position);
                    }
                    WindowEvent::Resized(new_size) => {
                        state.resize(new_size);
                        driver.invalidate();
                        state.window().request_redraw();
                    }
                    WindowEvent::ScaleFactorChanged {
                        mut inner_size_writer,
                        ..
                    } => {
                        // The drawable tracks physical pixels at a 1:1 ratio.
                        let _ = inner_size_writer.request_inner_size(state.size());
                    }
                    WindowEvent::RedrawRequested => {
                        let now = Instant::now();
                        if !has_area(state.window().inner_size()) || !driver.ready_for_frame(now)
                        {
                            return;
                        }
                        match state.render_frame(driver.sample()) {
                            Ok(()) => driver.mark_rendered(now),
                            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.resize(state.size());
                            }
                            Err(wgpu::SurfaceError::OutOfMemory) => {
                                error!("surface out of memory; exiting");
                                elwt.exit();
                            }
                            Err(wgpu::SurfaceError::Timeout) => {
                                warn!("surface timeout; retrying next frame");
                            }
                            Err(other) => {
                                warn!("surface error: {other:?}; retrying next frame");
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let (redraw, flow) =
                    next_control_flow(&driver, state.window().inner_size(), Instant::now());
                if redraw {
                    state.window().request_redraw();
                }
                elwt.set_control_flow(flow);
            }
            Event::LoopExiting => {
                debug!("event loop exiting; releasing scene");
                state.dispose();
            }
            _ => {}
        })
        .map_err(|err| anyhow!("event loop error: {err}"))
}

/// A minimised window reports a zero side; nothing is drawn until it grows back.
fn has_area(size: PhysicalSize<u32>) -> bool {
    size.width > 0 && size.height > 0
}

/// Whether to request a redraw once events are drained, and how long to sleep.
fn next_control_flow(
    driver: &RenderPolicyDriver,
    size: PhysicalSize<u32>,
    now: Instant,
) -> (bool, ControlFlow) {
    if !has_area(size) {
        return (false, ControlFlow::Wait);
    }
    if driver.ready_for_frame(now) {
        return (true, ControlFlow::Wait);
    }
    match driver.next_deadline() {
        Some(deadline) => (false, ControlFlow::WaitUntil(deadline)),
        None => (false, ControlFlow::Wait),
    }
}

/// Last pointer position, normalized against the window size at move time.
#[derive(Debug, Default)]
struct MouseState {
    pointer: PointerState,
}

impl MouseState {
    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        self.pointer = PointerState::from_physical(position.x, position.y, size.width, size.height);
    }
}

/// Scene state a headless caller sees after one frame; used by tests and
/// the still exporter to share the update path with the window.
pub(crate) fn headless_frame(
    params: &WaveParams,
    driver: &mut RenderPolicyDriver,
    pointer: PointerState,
    size: PhysicalSize<u32>,
) -> Scene {
    let drawable = DrawableSize::from_pixels(size.width, size.height);
    let mut scene = Scene::wave(params, drawable.aspect());
    scene.update(&frame_input(driver.sample(), pointer, size));
    driver.mark_rendered(Instant::now());
    scene
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::ManualTimeSource;

    fn software_profile() -> AdapterProfile {
        AdapterProfile {
            name: "llvmpipe".into(),
            backend: wgpu::Backend::Vulkan,
            device_type: wgpu::DeviceType::Cpu,
            max_texture_dimension: 8192,
        }
    }

    #[test]
    fn cursor_positions_map_to_pointer_coordinates() {
        let mut mouse = MouseState::default();
        assert_eq!(mouse.pointer, PointerState::new(0.0, 0.0));
        mouse.handle_cursor_moved(PhysicalPosition::new(0.0, 0.0), PhysicalSize::new(200, 100));
        assert_eq!(mouse.pointer, PointerState::new(-1.0, 1.0));
        mouse.handle_cursor_moved(PhysicalPosition::new(150.0, 75.0), PhysicalSize::new(200, 100));
        assert_eq!(mouse.pointer, PointerState::new(0.5, -0.5));
        mouse.handle_cursor_moved(PhysicalPosition::new(10.0, 10.0), PhysicalSize::new(0, 0));
        assert_eq!(mouse.pointer, PointerState::new(0.5, -0.5));
    }

    #[test]
    fn software_adapters_get_a_frame_cap() {
        let profile = software_profile();
        let capped = effective_policy(&RenderPolicy::default(), Some(&profile));
        assert_eq!(
            capped,
            RenderPolicy::Animate {
                target_fps: Some(SOFTWARE_FPS_CAP)
            }
        );
        let explicit = RenderPolicy::Animate {
            target_fps: Some(60.0),
        };
        assert_eq!(effective_policy(&explicit, Some(&profile)), explicit);
        assert_eq!(
            effective_policy(&RenderPolicy::default(), None),
            RenderPolicy::default()
        );
    }

    #[test]
    fn still_driver_renders_a_single_frame() {
        let mut driver = RenderPolicyDriver::new(RenderPolicy::Still { time: Some(2.0) });
        let now = Instant::now();
        assert!(driver.ready_for_frame(now));
        assert_eq!(driver.sample().seconds, 2.0);
        driver.mark_rendered(now);
        assert!(!driver.ready_for_frame(now));
        assert_eq!(driver.next_deadline(), None);
    }

    #[test]
    fn headless_frame_uses_manual_clock() {
        let mut clock = ManualTimeSource::new();
        clock.set(0.5);
        let mut driver =
            RenderPolicyDriver::with_time_source(RenderPolicy::default(), Box::new(clock));
        let scene = headless_frame(
            &WaveParams::default(),
            &mut driver,
            PointerState::default(),
            PhysicalSize::new(320, 240),
        );
        let uniforms = scene.uniforms().unwrap();
        assert_eq!(uniforms.float(wave::names::TIME).unwrap(), 0.5);
        assert_eq!(uniforms.vec2(wave::names::RESOLUTION).unwrap(), [320.0, 240.0]);
        assert!((scene.camera.aspect - 320.0 / 240.0).abs() < 1e-6);
    }

    #[test]
    fn minimised_window_sleeps_until_resized() {
        let driver = RenderPolicyDriver::new(RenderPolicy::default());
        let now = Instant::now();
        assert_eq!(
            next_control_flow(&driver, PhysicalSize::new(0, 0), now),
            (false, ControlFlow::Wait)
        );
        assert_eq!(
            next_control_flow(&driver, PhysicalSize::new(800, 0), now),
            (false, ControlFlow::Wait)
        );
        assert_eq!(
            next_control_flow(&driver, PhysicalSize::new(800, 600), now),
            (true, ControlFlow::Wait)
        );
    }

    #[test]
    fn capped_driver_waits_for_its_deadline() {
        let mut driver = RenderPolicyDriver::new(RenderPolicy::Animate {
            target_fps: Some(10.0),
        });
        let now = Instant::now();
        driver.mark_rendered(now);
        let (redraw, flow) = next_control_flow(&driver, PhysicalSize::new(640, 480), now);
        assert!(!redraw);
        assert!(matches!(flow, ControlFlow::WaitUntil(deadline) if deadline > now));
    }
}

//! Particle Life
//!
//! Species of particles attract and repel each other according to an
//! interaction matrix, simulated on the GPU.

mod driver;
mod presets;

use anyhow::Context;
use driver::{DriverEvent, FrameDriver};
use glam::Vec2;
use particle_simulation::{gpu, CapabilityDetector, EngineConfig, PhysicsParameters, Preset};
use std::sync::Arc;
use std::time::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

const PAN_STEP: f32 = 0.05;
const ZOOM_STEP: f32 = 0.1;
const WORLD_SCALE_STEP: f32 = 1.25;
const POINT_SIZE_STEP: f32 = 0.5;

struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    config: wgpu::SurfaceConfiguration,
    driver: FrameDriver,
    start: Instant,
}

impl GpuState {
    async fn new(window: Arc<Window>, engine_config: EngineConfig) -> anyhow::Result<Self> {
        let size = window.inner_size();

        let instance = gpu::create_instance();
        let surface = gpu::create_surface(&instance, window.clone())?;
        let adapter = gpu::request_adapter(&instance, Some(&surface)).await?;
        let (device, queue) = gpu::request_device(&adapter).await?;

        // Configure surface
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoNoVsync,
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let detector = CapabilityDetector::new(engine_config.calibration.clone());
        let tier = detector.detect(&device, &queue);

        let driver = FrameDriver::new(
            device.clone(),
            queue,
            config.format,
            [config.width, config.height],
            tier,
            engine_config,
        );

        Ok(Self {
            surface,
            device,
            config,
            driver,
            start: Instant::now(),
        })
    }

    fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.driver.resize(new_size.width, new_size.height);
        }
    }

    fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let now = self.start.elapsed().as_secs_f64();
        self.driver.frame(now, &view);

        output.present();
        Ok(())
    }

    fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.driver.tier().target_frame_rate.max(1) as f64)
    }
}

struct App {
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    engine_config: EngineConfig,
    presets: Vec<Preset>,
    preset_index: usize,
    next_frame: Instant,

    cursor: Option<Vec2>,
    left_pressed: bool,
    right_pressed: bool,
    middle_pressed: bool,
}

impl App {
    fn new(engine_config: EngineConfig) -> Self {
        Self {
            window: None,
            gpu_state: None,
            engine_config,
            presets: presets::builtin(),
            preset_index: 0,
            next_frame: Instant::now(),
            cursor: None,
            left_pressed: false,
            right_pressed: false,
            middle_pressed: false,
        }
    }

    fn select_preset(&mut self, index: usize) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        if let Some(preset) = self.presets.get(index) {
            self.preset_index = index;
            gpu_state.driver.apply_preset(preset);
        }
    }

    fn handle_key(&mut self, key_code: KeyCode) {
        if let Some(index) = preset_slot(key_code) {
            self.select_preset(index);
            return;
        }
        if key_code == KeyCode::KeyN {
            self.select_preset((self.preset_index + 1) % self.presets.len().max(1));
            return;
        }

        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        let driver = &mut gpu_state.driver;
        let pan = PAN_STEP / driver.view().zoom;

        match key_code {
            KeyCode::Space => driver.toggle_paused(),
            KeyCode::ArrowLeft | KeyCode::KeyA => driver.pan(Vec2::new(-pan, 0.0)),
            KeyCode::ArrowRight | KeyCode::KeyD => driver.pan(Vec2::new(pan, 0.0)),
            KeyCode::ArrowUp | KeyCode::KeyW => driver.pan(Vec2::new(0.0, pan)),
            KeyCode::ArrowDown | KeyCode::KeyS => driver.pan(Vec2::new(0.0, -pan)),
            KeyCode::Equal | KeyCode::NumpadAdd => driver.zoom_in(ZOOM_STEP),
            KeyCode::Minus | KeyCode::NumpadSubtract => driver.zoom_out(ZOOM_STEP),
            KeyCode::KeyC => driver.reset_pan_zoom(),
            KeyCode::KeyR => driver.reseed(),
            KeyCode::KeyM => driver.cycle_matrix_archetype(),
            KeyCode::KeyG => driver.cycle_distribution(),
            KeyCode::KeyP => driver.cycle_palette(),
            KeyCode::KeyE => driver.cycle_color_effect(),
            KeyCode::KeyO => driver.rotate_species_colors(),
            KeyCode::BracketLeft => {
                let world_size = driver.store().physics().world_size / WORLD_SCALE_STEP;
                driver.set_world_size(world_size);
            }
            KeyCode::BracketRight => {
                let world_size = driver.store().physics().world_size * WORLD_SCALE_STEP;
                driver.set_world_size(world_size);
            }
            KeyCode::Comma | KeyCode::Period => {
                let physics = *driver.store().physics();
                let delta = if key_code == KeyCode::Period {
                    POINT_SIZE_STEP
                } else {
                    -POINT_SIZE_STEP
                };
                driver.update_physics(&PhysicsParameters {
                    point_size: (physics.point_size + delta).max(1.0),
                    ..physics
                });
            }
            KeyCode::KeyF => dump_snapshot(driver),
            _ => {}
        }
    }

    fn handle_driver_events(&mut self) {
        let Some(gpu_state) = &mut self.gpu_state else {
            return;
        };
        for event in gpu_state.driver.drain_events() {
            match event {
                DriverEvent::PresetApplied {
                    name,
                    particle_count,
                    species_count,
                } => {
                    log::debug!(
                        "Scene '{name}': {particle_count} particles, {species_count} species"
                    );
                }
                DriverEvent::WorldResized(world_size) => {
                    log::info!("World size {world_size:.3}");
                }
                DriverEvent::PauseChanged(paused) => {
                    log::debug!("Paused: {paused}");
                }
                DriverEvent::FrameRateDeficit { fps, target } if fps < target as f32 * 0.5 => {
                    log::info!("Far below {target} fps, try a smaller preset or press [");
                }
                DriverEvent::FrameRateDeficit { .. } => {}
            }
        }
    }

    fn update_title(&self) {
        let (Some(window), Some(gpu_state)) = (&self.window, &self.gpu_state) else {
            return;
        };
        let driver = &gpu_state.driver;
        let stats = driver.stats();
        window.set_title(&format!(
            "Particle Life - {:.0} FPS ({:.2}ms) - dt {:.1}ms - {} particles - {}{}",
            stats.fps(),
            stats.avg_frame_time_ms(),
            driver.store().params().dt * 1000.0,
            driver.store().particle_count(),
            driver.preset().name,
            if driver.is_paused() { " [paused]" } else { "" }
        ));
    }
}

/// Number row 1-9 to a preset index.
fn preset_slot(key_code: KeyCode) -> Option<usize> {
    let index = match key_code {
        KeyCode::Digit1 => 0,
        KeyCode::Digit2 => 1,
        KeyCode::Digit3 => 2,
        KeyCode::Digit4 => 3,
        KeyCode::Digit5 => 4,
        KeyCode::Digit6 => 5,
        KeyCode::Digit7 => 6,
        KeyCode::Digit8 => 7,
        KeyCode::Digit9 => 8,
        _ => return None,
    };
    Some(index)
}

fn dump_snapshot(driver: &FrameDriver) {
    log::info!("{:#?}", driver.snapshot_preset());
    match driver.read_particles() {
        Ok(particles) if !particles.is_empty() => {
            let mean_speed = particles.iter().map(|p| p.velocity().length()).sum::<f32>()
                / particles.len() as f32;
            log::info!(
                "Read back {} particles, mean speed {mean_speed:.4}",
                particles.len()
            );
        }
        Ok(_) => {}
        Err(err) => log::error!("Particle readback failed: {err}"),
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("Particle Life")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("Failed to create window: {err}");
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuState::new(window.clone(), self.engine_config.clone())) {
            Ok(gpu_state) => {
                let tier = gpu_state.driver.tier();
                log::info!(
                    "Tier: {} cores, {} fps, {} particles max",
                    tier.gpu_core_class,
                    tier.target_frame_rate,
                    tier.max_particle_count
                );
                self.window = Some(window);
                self.gpu_state = Some(gpu_state);
                self.select_preset(0);
            }
            Err(err) => {
                log::error!("Failed to initialize GPU: {err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => event_loop.exit(),

            WindowEvent::Resized(physical_size) => {
                if let Some(gpu_state) = &mut self.gpu_state {
                    gpu_state.resize(physical_size);
                }
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        repeat,
                        ..
                    },
                ..
            } => {
                // Held keys only repeat for continuous controls
                let continuous = matches!(
                    key_code,
                    KeyCode::ArrowLeft
                        | KeyCode::ArrowRight
                        | KeyCode::ArrowUp
                        | KeyCode::ArrowDown
                        | KeyCode::KeyW
                        | KeyCode::KeyA
                        | KeyCode::KeyS
                        | KeyCode::KeyD
                        | KeyCode::Equal
                        | KeyCode::Minus
                        | KeyCode::NumpadAdd
                        | KeyCode::NumpadSubtract
                );
                if !repeat || continuous {
                    self.handle_key(key_code);
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.left_pressed = pressed,
                    MouseButton::Right => self.right_pressed = pressed,
                    MouseButton::Middle => self.middle_pressed = pressed,
                    _ => {}
                }

                if pressed && matches!(button, MouseButton::Left | MouseButton::Right) {
                    if let (Some(cursor), Some(gpu_state)) = (self.cursor, &mut self.gpu_state) {
                        gpu_state
                            .driver
                            .click_at_pixel(cursor, button == MouseButton::Right);
                    }
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                let last = self.cursor.replace(position);

                if let Some(gpu_state) = &mut self.gpu_state {
                    if self.middle_pressed {
                        if let Some(last) = last {
                            gpu_state.driver.drag(position - last);
                        }
                    } else if self.left_pressed || self.right_pressed {
                        // Keep the impulse alive under a held button
                        gpu_state
                            .driver
                            .click_at_pixel(position, self.right_pressed);
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_x, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.02,
                };

                if let Some(gpu_state) = &mut self.gpu_state {
                    if scroll > 0.0 {
                        gpu_state.driver.zoom_in(ZOOM_STEP * scroll);
                    } else if scroll < 0.0 {
                        gpu_state.driver.zoom_out(ZOOM_STEP * -scroll);
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                let Some(gpu_state) = &mut self.gpu_state else {
                    return;
                };
                self.next_frame = Instant::now() + gpu_state.frame_interval();

                match gpu_state.render() {
                    Ok(()) => {}
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        let size = winit::dpi::PhysicalSize::new(
                            gpu_state.config.width,
                            gpu_state.config.height,
                        );
                        gpu_state.resize(size);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Surface out of memory");
                        event_loop.exit();
                    }
                    Err(e) => log::warn!("Render error: {e:?}"),
                }

                self.handle_driver_events();
                self.update_title();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let Some(window) = &self.window else {
            return;
        };
        if Instant::now() >= self.next_frame {
            window.request_redraw();
        } else {
            event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting particle life...");

    let engine_config = EngineConfig::from_env();
    if !engine_config.calibration.enabled {
        log::info!("GPU calibration disabled");
    }

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(engine_config);
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_row_maps_to_presets() {
        assert_eq!(preset_slot(KeyCode::Digit1), Some(0));
        assert_eq!(preset_slot(KeyCode::Digit9), Some(8));
        assert_eq!(preset_slot(KeyCode::Digit0), None);
        assert_eq!(preset_slot(KeyCode::KeyQ), None);
    }
}

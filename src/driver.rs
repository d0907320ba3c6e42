//! Per-frame orchestration and the command surface the window shell drives.
//!
//! Each frame: tick the clock (or reset it while paused), submit the compute
//! step when running, age the click impulse, submit the render pass. The
//! caller presents right after.

use glam::Vec2;
use particle_physics::{generate, DistributionPattern, MatrixArchetype, MatrixSource, Particle};
use particle_renderer::{screen_delta_to_world, screen_to_world, Palette, ParticleRenderer};
use particle_simulation::{
    BufferSlot, CapabilityTier, ComputeStage, EngineConfig, ParticleStore,
    PhysicsParameters, Preset, SimulationClock, SimulationError, ViewSeed, ViewState,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::VecDeque;

const FRAME_WINDOW: usize = 100;
/// Running below this fraction of the target rate counts as a deficit.
const DEFICIT_RATIO: f32 = 0.8;
/// Consecutive deficit frames before a warning is raised.
const DEFICIT_FRAMES: u32 = 180;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
}

impl RunState {
    pub fn toggled(self) -> Self {
        match self {
            RunState::Running => RunState::Paused,
            RunState::Paused => RunState::Running,
        }
    }
}

/// Pause state and the dt source it gates.
#[derive(Debug)]
pub struct Playback {
    run_state: RunState,
    clock: SimulationClock,
}

impl Playback {
    pub fn new(clock: SimulationClock) -> Self {
        Self {
            run_state: RunState::Running,
            clock,
        }
    }

    /// Flip between running and paused. Either way the clock forgets its last
    /// timestamp, so time spent paused never reaches the step.
    pub fn toggle(&mut self) -> RunState {
        self.run_state = self.run_state.toggled();
        self.clock.reset();
        self.run_state
    }

    /// New step to upload, if it changed. Paused frames keep the clock reset.
    pub fn tick(&mut self, now: f64) -> Option<f32> {
        match self.run_state {
            RunState::Running => self.clock.tick(now),
            RunState::Paused => {
                self.clock.reset();
                None
            }
        }
    }

    pub fn restart_clock(&mut self) {
        self.clock.reset();
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }
}

/// Notifications for the shell, drained once per frame in order.
#[derive(Clone, Debug, PartialEq)]
pub enum DriverEvent {
    PresetApplied {
        name: String,
        particle_count: usize,
        species_count: usize,
    },
    PauseChanged(bool),
    WorldResized(f32),
    FrameRateDeficit {
        fps: f32,
        target: u32,
    },
}

/// Rolling frame-time statistics.
#[derive(Debug)]
pub struct FrameStats {
    frame_times: VecDeque<f32>,
    last_time: Option<f64>,
    deficit_frames: u32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self {
            frame_times: VecDeque::with_capacity(FRAME_WINDOW),
            last_time: None,
            deficit_frames: 0,
        }
    }

    /// Record a frame at `now` seconds. Returns the current fps once a
    /// sustained deficit against `target_fps` is detected.
    pub fn record(&mut self, now: f64, target_fps: u32) -> Option<f32> {
        if let Some(last) = self.last_time.replace(now) {
            self.frame_times.push_back(((now - last) * 1000.0) as f32);
            if self.frame_times.len() > FRAME_WINDOW {
                self.frame_times.pop_front();
            }
        }

        let fps = self.fps();
        if fps > 0.0 && fps < target_fps as f32 * DEFICIT_RATIO {
            self.deficit_frames += 1;
            if self.deficit_frames == DEFICIT_FRAMES {
                return Some(fps);
            }
        } else {
            self.deficit_frames = 0;
        }
        None
    }

    pub fn avg_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.frame_times.iter().sum::<f32>() / self.frame_times.len() as f32
    }

    pub fn fps(&self) -> f32 {
        let avg = self.avg_frame_time_ms();
        if avg > 0.0 {
            1000.0 / avg
        } else {
            0.0
        }
    }

    /// Forget the previous timestamp so a pause gap is not recorded.
    pub fn reset_timer(&mut self) {
        self.last_time = None;
        self.deficit_frames = 0;
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FrameDriver {
    store: ParticleStore,
    compute: ComputeStage,
    renderer: ParticleRenderer,
    playback: Playback,

    config: EngineConfig,
    tier: CapabilityTier,
    view: ViewState,
    palette: Palette,
    preset: Preset,

    frame: u32,
    stats: FrameStats,
    events: VecDeque<DriverEvent>,
    rng: StdRng,
}

impl FrameDriver {
    pub fn new(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        window_size: [u32; 2],
        tier: CapabilityTier,
        config: EngineConfig,
    ) -> Self {
        let compute = ComputeStage::new(&device);
        let renderer = ParticleRenderer::new(&device, format);
        let store = ParticleStore::new(device, queue, &config);
        let clock = SimulationClock::new(config.clock, tier.smoothing_factor);

        let view = ViewState {
            window_size,
            ..Default::default()
        };

        Self {
            store,
            compute,
            renderer,
            playback: Playback::new(clock),
            palette: Palette::resolve(view.palette_index),
            view,
            config,
            tier,
            preset: Preset::default(),
            frame: 0,
            stats: FrameStats::new(),
            events: VecDeque::new(),
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    /// Advance and draw one frame into `target`. `now` is in seconds.
    pub fn frame(&mut self, now: f64, target: &wgpu::TextureView) {
        // Step 1: Clock
        if let Some(dt) = self.playback.tick(now) {
            log::debug!("dt -> {dt:.4}");
            self.store.set_dt(dt);
        }

        // Step 2: Compute
        if self.playback.is_running() && self.store.is_ready() {
            self.frame = self.frame.wrapping_add(1);
            self.store.set_frame(self.frame);
            self.compute.dispatch(&self.store);
        }

        // Step 3: Click lifetime
        self.store.tick_click();

        // Step 4: Render
        self.renderer.render(target, &self.store);

        if self.playback.is_running() {
            if let Some(fps) = self.stats.record(now, self.tier.target_frame_rate) {
                log::warn!(
                    "Running at {fps:.0} fps, target is {} fps",
                    self.tier.target_frame_rate
                );
                self.events.push_back(DriverEvent::FrameRateDeficit {
                    fps,
                    target: self.tier.target_frame_rate,
                });
            }
        }
    }

    /// Seed a fresh population from `preset`, capped at the tier ceiling.
    pub fn apply_preset(&mut self, preset: &Preset) {
        let request =
            preset.distribution_request(self.tier.max_particle_count, self.view.aspect_ratio());
        if request.particle_count < preset.particle_count {
            log::warn!(
                "Preset '{}' asks for {} particles, capped at {}",
                preset.name,
                preset.particle_count,
                request.particle_count
            );
        }

        let particles = generate(&request, &mut self.rng);
        let matrix = preset.matrix.resolve(request.species_count, &mut self.rng);

        self.store.update_physics_parameters(&preset.physics);
        self.store
            .regenerate(&particles, &matrix, request.species_count);

        self.view.palette_index = preset.view.palette_index;
        self.view.species_color_offset = preset.view.species_color_offset;
        self.view.color_effect = preset.view.color_effect;
        self.palette = Palette::resolve(self.view.palette_index);
        self.view
            .reset_pan_zoom(preset.physics.world_size, &self.config.zoom);
        self.push_view();

        self.playback.restart_clock();
        self.stats.reset_timer();
        self.preset = preset.clone();

        log::info!(
            "Applied preset '{}': {} particles, {} species, {} / {}",
            preset.name,
            request.particle_count,
            request.species_count,
            preset.distribution.name(),
            preset.matrix.name()
        );
        self.events.push_back(DriverEvent::PresetApplied {
            name: preset.name.clone(),
            particle_count: request.particle_count,
            species_count: request.species_count,
        });
    }

    /// Regenerate the current preset with fresh randomness.
    pub fn reseed(&mut self) {
        let preset = self.preset.clone();
        self.apply_preset(&preset);
    }

    pub fn cycle_matrix_archetype(&mut self) {
        let next = match &self.preset.matrix {
            MatrixSource::Archetype(current) => {
                let index = MatrixArchetype::ALL
                    .iter()
                    .position(|a| a == current)
                    .unwrap_or(0);
                MatrixArchetype::ALL[(index + 1) % MatrixArchetype::ALL.len()]
            }
            MatrixSource::Custom(_) => MatrixArchetype::ALL[0],
        };
        self.preset.matrix = MatrixSource::Archetype(next);
        self.reseed();
    }

    pub fn cycle_distribution(&mut self) {
        let index = DistributionPattern::ALL
            .iter()
            .position(|&p| p == self.preset.distribution)
            .unwrap_or(0);
        self.preset.distribution =
            DistributionPattern::ALL[(index + 1) % DistributionPattern::ALL.len()];
        self.reseed();
    }

    pub fn update_physics(&mut self, physics: &PhysicsParameters) {
        let point_size_changed = physics.point_size != self.store.physics().point_size;
        self.store.update_physics_parameters(physics);
        self.preset.physics = *physics;
        if point_size_changed {
            self.push_view();
        }
    }

    /// Change the world extent, refitting zoom and recentering.
    pub fn set_world_size(&mut self, world_size: f32) {
        let world_size = world_size.max(f32::EPSILON);
        let physics = PhysicsParameters {
            world_size,
            ..*self.store.physics()
        };
        self.store.update_physics_parameters(&physics);
        self.preset.physics = physics;

        self.view.reset_pan_zoom(world_size, &self.config.zoom);
        self.push_view();
        self.events.push_back(DriverEvent::WorldResized(world_size));
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.view.pan(delta);
        self.push_view();
    }

    /// Pan so the scene follows a pointer drag of `delta` pixels.
    pub fn drag(&mut self, delta: Vec2) {
        let world = screen_delta_to_world(&self.view, delta);
        self.pan(-world);
    }

    pub fn zoom_in(&mut self, step: f32) {
        self.view.zoom_in(step, &self.config.zoom);
        self.push_view();
    }

    pub fn zoom_out(&mut self, step: f32) {
        self.view.zoom_out(step, &self.config.zoom);
        self.push_view();
    }

    pub fn reset_pan_zoom(&mut self) {
        self.view
            .reset_pan_zoom(self.store.physics().world_size, &self.config.zoom);
        self.push_view();
    }

    /// Impulse at a world position; secondary clicks pull instead of push.
    pub fn click(&mut self, world_position: Vec2, is_secondary: bool) {
        let force = if is_secondary {
            -self.config.click.force
        } else {
            self.config.click.force
        };
        log::debug!("Click at {world_position} with force {force}");
        self.store.apply_click(world_position, force);
    }

    pub fn click_at_pixel(&mut self, pixel: Vec2, is_secondary: bool) {
        let world = screen_to_world(&self.view, pixel);
        self.click(world, is_secondary);
    }

    pub fn toggle_paused(&mut self) {
        let paused = self.playback.toggle() == RunState::Paused;
        if !paused {
            self.stats.reset_timer();
        }
        log::info!("{}", if paused { "Paused" } else { "Resumed" });
        self.events.push_back(DriverEvent::PauseChanged(paused));
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.view.window_size = [width, height];
        self.push_view();
    }

    pub fn cycle_palette(&mut self) {
        self.view.palette_index = self.view.palette_index.wrapping_add(1);
        self.palette = Palette::resolve(self.view.palette_index);
        log::info!("Palette: {}", self.palette.name);
        self.push_view();
    }

    pub fn cycle_color_effect(&mut self) {
        self.view.color_effect = self.view.color_effect.next();
        log::info!("Color effect: {}", self.view.color_effect.name());
        self.push_view();
    }

    pub fn rotate_species_colors(&mut self) {
        self.view.species_color_offset =
            (self.view.species_color_offset + 1) % self.palette.len().max(1) as u32;
        self.push_view();
    }

    /// Current scene as a preset, with the live matrix as a custom payload.
    pub fn snapshot_preset(&self) -> Preset {
        Preset {
            name: format!("{} (snapshot)", self.preset.name),
            species_count: self.store.species_count(),
            particle_count: self.store.particle_count() as usize,
            distribution: self.preset.distribution,
            species_weights: self.preset.species_weights.clone(),
            matrix: MatrixSource::Custom(self.store.matrix().clone()),
            physics: *self.store.physics(),
            view: ViewSeed {
                palette_index: self.view.palette_index,
                species_color_offset: self.view.species_color_offset,
                color_effect: self.view.color_effect,
            },
        }
    }

    /// Blocking copy of the live particles.
    pub fn read_particles(&self) -> Result<Vec<Particle>, SimulationError> {
        self.store.read_particles(BufferSlot::Active)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = DriverEvent> + '_ {
        self.events.drain(..)
    }

    pub fn is_paused(&self) -> bool {
        !self.playback.is_running()
    }

    pub fn tier(&self) -> &CapabilityTier {
        &self.tier
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn store(&self) -> &ParticleStore {
        &self.store
    }

    fn push_view(&self) {
        let uniform = self
            .view
            .to_uniform(self.store.physics().point_size, &self.palette.colors);
        self.store.update_view_state(&uniform);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_simulation::{gpu, ClockConfig, SimParams, TierTable};

    #[test]
    fn run_state_toggles_both_ways() {
        assert_eq!(RunState::Running.toggled(), RunState::Paused);
        assert_eq!(RunState::Paused.toggled(), RunState::Running);
    }

    fn playback() -> Playback {
        Playback::new(SimulationClock::new(ClockConfig::default(), 0.5))
    }

    #[test]
    fn steady_frames_report_no_new_step() {
        let mut playback = playback();
        // Slower than max_dt, so every raw interval clamps to the initial step
        for i in 0..120 {
            assert_eq!(playback.tick(i as f64 / 60.0), None, "frame {i}");
        }
    }

    #[test]
    fn resume_does_not_see_time_spent_paused() {
        let mut playback = playback();
        let mut now = 0.0;
        for _ in 0..200 {
            playback.tick(now);
            now += 0.002;
        }

        // Pause and resume between two frames
        assert_eq!(playback.toggle(), RunState::Paused);
        assert_eq!(playback.toggle(), RunState::Running);

        now += 5.0;
        assert_eq!(playback.tick(now), None);
        assert_eq!(playback.tick(now + 0.002), None);
    }

    #[test]
    fn paused_ticks_never_report() {
        let mut playback = playback();
        playback.tick(0.0);
        playback.toggle();
        assert!(!playback.is_running());
        for i in 1..50 {
            assert_eq!(playback.tick(i as f64 * 0.001), None);
        }
    }

    #[test]
    fn stats_average_recent_frames() {
        let mut stats = FrameStats::new();
        let mut now = 0.0;
        for _ in 0..10 {
            stats.record(now, 60);
            now += 0.010;
        }
        assert!((stats.avg_frame_time_ms() - 10.0).abs() < 1e-3);
        assert!((stats.fps() - 100.0).abs() < 0.1);
    }

    #[test]
    fn sustained_deficit_is_reported_once() {
        let mut stats = FrameStats::new();
        let mut now = 0.0;
        let mut reports = 0;
        for _ in 0..(DEFICIT_FRAMES * 2) {
            if stats.record(now, 60).is_some() {
                reports += 1;
            }
            now += 0.05;
        }
        assert_eq!(reports, 1);
    }

    fn driver() -> Option<FrameDriver> {
        let (device, queue) = pollster::block_on(gpu::request_headless_device()).ok()?;
        Some(FrameDriver::new(
            device,
            queue,
            wgpu::TextureFormat::Rgba8Unorm,
            [320, 240],
            TierTable::default().floor_tier(),
            EngineConfig::default(),
        ))
    }

    fn target(driver: &FrameDriver) -> wgpu::TextureView {
        driver
            .store()
            .device()
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("Test Target"),
                size: wgpu::Extent3d {
                    width: 320,
                    height: 240,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    #[test]
    fn paused_frames_leave_particles_alone() {
        let Some(mut driver) = driver() else { return };
        let target = target(&driver);
        driver.apply_preset(&Preset {
            particle_count: 256,
            ..Default::default()
        });

        driver.toggle_paused();
        let before = driver.read_particles().unwrap();
        for i in 0..5 {
            driver.frame(i as f64 * 0.016, &target);
        }
        assert!(driver.is_paused());
        assert_eq!(driver.read_particles().unwrap(), before);

        driver.toggle_paused();
        for i in 5..10 {
            driver.frame(i as f64 * 0.016, &target);
        }
        assert!(!driver.is_paused());
        assert_ne!(driver.read_particles().unwrap(), before);

        let events: Vec<_> = driver.drain_events().collect();
        assert!(matches!(events[0], DriverEvent::PresetApplied { .. }));
        assert_eq!(events[1], DriverEvent::PauseChanged(true));
        assert_eq!(events[2], DriverEvent::PauseChanged(false));
    }

    #[test]
    fn steady_frames_only_advance_the_counter() {
        let Some(mut driver) = driver() else { return };
        let target = target(&driver);
        driver.apply_preset(&Preset {
            particle_count: 64,
            ..Default::default()
        });
        let before = *driver.store().params();

        for i in 0..30 {
            driver.frame(i as f64 / 60.0, &target);
        }

        let after = *driver.store().params();
        assert_eq!(after.frame, before.frame + 30);
        assert_eq!(
            SimParams {
                frame: before.frame,
                ..after
            },
            before
        );
    }

    #[test]
    fn preset_is_capped_by_tier() {
        let Some(mut driver) = driver() else { return };
        let ceiling = driver.tier().max_particle_count;
        driver.apply_preset(&Preset {
            particle_count: ceiling * 4,
            ..Default::default()
        });
        assert_eq!(driver.store().particle_count() as usize, ceiling);
    }

    #[test]
    fn world_resize_refits_view() {
        let Some(mut driver) = driver() else { return };
        driver.pan(Vec2::new(1.0, 1.0));
        driver.set_world_size(2.0);
        assert_eq!(driver.view().camera, Vec2::ZERO);
        assert!((driver.view().zoom - 0.5).abs() < 1e-6);
        assert!(driver
            .drain_events()
            .any(|e| e == DriverEvent::WorldResized(2.0)));
    }

    #[test]
    fn snapshot_carries_live_matrix() {
        let Some(mut driver) = driver() else { return };
        driver.apply_preset(&Preset {
            species_count: 4,
            particle_count: 128,
            matrix: MatrixSource::Archetype(MatrixArchetype::Snake),
            ..Default::default()
        });
        let snapshot = driver.snapshot_preset();
        assert_eq!(snapshot.species_count, 4);
        assert_eq!(snapshot.particle_count, 128);
        assert_eq!(
            snapshot.matrix,
            MatrixSource::Custom(driver.store().matrix().clone())
        );
    }
}

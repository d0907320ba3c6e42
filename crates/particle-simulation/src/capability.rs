//! Hardware calibration
//!
//! A fixed all-pairs workload is timed on the device and the average latency
//! per iteration is bucketed into a tier that sizes the simulation. Anything
//! that goes wrong on the way yields the floor tier instead of an error.

use crate::error::{Result, SimulationError};
use particle_physics::WORKGROUP_SIZE;
use std::time::{Duration, Instant};
use wgpu::util::DeviceExt;

/// Sizing decisions derived from calibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapabilityTier {
    /// Rough GPU core count class the measured latency corresponds to.
    pub gpu_core_class: u32,
    pub target_frame_rate: u32,
    pub smoothing_factor: f32,
    pub max_particle_count: usize,
}

/// One latency bucket: devices at or below `max_latency` seconds per
/// iteration land here.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TierBucket {
    pub max_latency: f64,
    pub gpu_core_class: u32,
    pub target_frame_rate: u32,
    pub max_particle_count: usize,
}

/// Ordered latency thresholds, fastest bucket first.
#[derive(Clone, Debug, PartialEq)]
pub struct TierTable {
    pub buckets: Vec<TierBucket>,
    /// Used above every threshold and whenever calibration fails.
    pub floor: TierBucket,
    /// Smoothing at 60 fps; slower targets scale it up proportionally.
    pub base_smoothing: f32,
}

impl Default for TierTable {
    fn default() -> Self {
        let bucket = |max_latency: f64,
                      gpu_core_class: u32,
                      target_frame_rate: u32,
                      max_particle_count: usize| TierBucket {
            max_latency,
            gpu_core_class,
            target_frame_rate,
            max_particle_count,
        };
        Self {
            buckets: vec![
                bucket(0.000_20, 40, 60, 32_768),
                bucket(0.000_30, 32, 60, 24_576),
                bucket(0.000_40, 24, 60, 16_384),
                bucket(0.000_60, 16, 30, 12_288),
                bucket(0.000_75, 10, 30, 8_192),
            ],
            floor: bucket(f64::INFINITY, 8, 20, 4_096),
            base_smoothing: 0.1,
        }
    }
}

impl TierTable {
    pub fn classify(&self, average_latency: f64) -> CapabilityTier {
        let bucket = self
            .buckets
            .iter()
            .find(|b| average_latency <= b.max_latency)
            .unwrap_or(&self.floor);
        self.tier(bucket)
    }

    pub fn floor_tier(&self) -> CapabilityTier {
        self.tier(&self.floor)
    }

    fn tier(&self, bucket: &TierBucket) -> CapabilityTier {
        let fps = bucket.target_frame_rate.max(1);
        CapabilityTier {
            gpu_core_class: bucket.gpu_core_class,
            target_frame_rate: fps,
            smoothing_factor: (self.base_smoothing * 60.0 / fps as f32).min(1.0),
            max_particle_count: bucket.max_particle_count,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationConfig {
    /// When false, `detect` skips measuring and returns the fallback tier.
    pub enabled: bool,
    pub workload_particles: u32,
    /// Dispatches recorded per timed run.
    pub iterations: u32,
    pub runs: u32,
    /// Upper bound on each wait for the device.
    pub poll_timeout: Duration,
    pub tiers: TierTable,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            workload_particles: 4096,
            iterations: 10,
            runs: 3,
            poll_timeout: Duration::from_secs(2),
            tiers: TierTable::default(),
        }
    }
}

impl CalibrationConfig {
    pub fn fallback_tier(&self) -> CapabilityTier {
        self.tiers.floor_tier()
    }
}

pub struct CapabilityDetector {
    config: CalibrationConfig,
}

impl CapabilityDetector {
    pub fn new(config: CalibrationConfig) -> Self {
        Self { config }
    }

    /// Time the calibration workload on `device` and pick a tier.
    pub fn detect(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> CapabilityTier {
        if !self.config.enabled {
            log::info!("Calibration disabled, using fallback tier");
            return self.config.fallback_tier();
        }

        match self.measure(device, queue) {
            Ok(latency) => {
                let tier = self.config.tiers.classify(latency);
                log::info!(
                    "Calibration: {:.3} ms/iteration -> {} cores class, {} fps, {} particles max",
                    latency * 1000.0,
                    tier.gpu_core_class,
                    tier.target_frame_rate,
                    tier.max_particle_count
                );
                tier
            }
            Err(err) => {
                log::warn!("Calibration failed, using fallback tier: {err}");
                self.config.fallback_tier()
            }
        }
    }

    /// Like `detect`, acquiring a throwaway device first.
    pub fn detect_headless(&self) -> CapabilityTier {
        if !self.config.enabled {
            return self.config.fallback_tier();
        }
        match pollster::block_on(crate::gpu::request_headless_device()) {
            Ok((device, queue)) => self.detect(&device, &queue),
            Err(err) => {
                log::warn!("No device for calibration, using fallback tier: {err}");
                self.config.fallback_tier()
            }
        }
    }

    /// Average wall time per calibration iteration, in seconds.
    pub fn measure(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> Result<f64> {
        let count = self.config.workload_particles.max(1);

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let workload = CalibrationWorkload::new(device, count);
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(SimulationError::Calibration(err.to_string()));
        }

        let workgroups = count.div_ceil(WORKGROUP_SIZE);

        // Warm-up: pipeline compilation and first-use costs stay out of the timing.
        self.run(device, queue, &workload, workgroups, 1)?;

        let mut total = Duration::ZERO;
        let mut iterations = 0u32;
        for _ in 0..self.config.runs {
            let start = Instant::now();
            self.run(device, queue, &workload, workgroups, self.config.iterations)?;
            total += start.elapsed();
            iterations += self.config.iterations;
        }

        if iterations == 0 {
            return Err(SimulationError::Calibration(
                "no iterations were measured".into(),
            ));
        }
        Ok(total.as_secs_f64() / iterations as f64)
    }

    fn run(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        workload: &CalibrationWorkload,
        workgroups: u32,
        iterations: u32,
    ) -> Result<()> {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Calibration Encoder"),
        });
        for _ in 0..iterations {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("Calibration Pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&workload.pipeline);
            pass.set_bind_group(0, &workload.bind_group, &[]);
            pass.dispatch_workgroups(workgroups, 1, 1);
        }
        let submission = queue.submit(std::iter::once(encoder.finish()));

        device.poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: Some(self.config.poll_timeout),
        })?;
        Ok(())
    }
}

struct CalibrationWorkload {
    pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
}

impl CalibrationWorkload {
    fn new(device: &wgpu::Device, count: u32) -> Self {
        // Golden-angle lattice: deterministic and evenly spread.
        let positions: Vec<[f32; 2]> = (0..count)
            .map(|i| {
                let t = i as f32 / count as f32;
                let angle = i as f32 * 2.399_963;
                [t.sqrt() * angle.cos(), t.sqrt() * angle.sin()]
            })
            .collect();

        let position_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Calibration Positions"),
            contents: bytemuck::cast_slice(&positions),
            usage: wgpu::BufferUsages::STORAGE,
        });
        let sum_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Calibration Sums"),
            size: std::mem::size_of_val(positions.as_slice()) as u64,
            usage: wgpu::BufferUsages::STORAGE,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Calibration Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/calibration.wgsl").into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Calibration Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Calibration Pipeline Layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("Calibration Pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some("main"),
            compilation_options: Default::default(),
            cache: None,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Calibration Bind Group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: position_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: sum_buffer.as_entire_binding(),
                },
            ],
        });

        Self {
            pipeline,
            bind_group,
        }
    }
}

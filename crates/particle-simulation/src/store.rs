//! GPU-resident particle state
//!
//! Particles and the interaction matrix are double-buffered: regeneration
//! writes the inactive allocation and then publishes it. The params, view and
//! click uniforms are single-buffered and written in place from the control
//! thread before the dispatch that reads them.

use crate::click::ClickPerturbation;
use crate::config::EngineConfig;
use crate::double_buffer::{BufferSlot, DoubleBuffer};
use crate::error::{Result, SimulationError};
use crate::params::{PhysicsParameters, SimParams};
use crate::view::ViewUniform;
use glam::Vec2;
use particle_physics::{clamp_species, InteractionMatrix, Particle};
use wgpu::util::DeviceExt;

/// A storage buffer and how many elements the last write put in it.
#[derive(Debug)]
struct GpuArray {
    buffer: wgpu::Buffer,
    len: u32,
}

pub struct ParticleStore {
    device: wgpu::Device,
    queue: wgpu::Queue,

    // Double-buffered
    particles: DoubleBuffer<GpuArray>,
    matrices: DoubleBuffer<GpuArray>,

    // Single-buffered uniforms
    params_buffer: wgpu::Buffer,
    view_buffer: wgpu::Buffer,
    click_buffer: wgpu::Buffer,

    params: SimParams,
    physics: PhysicsParameters,
    click: ClickPerturbation,
    matrix: InteractionMatrix,
}

impl ParticleStore {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, config: &EngineConfig) -> Self {
        let physics = PhysicsParameters::default();
        let mut params = SimParams {
            dt: config.clock.max_dt,
            ..Default::default()
        };
        params.apply(&physics);

        let params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Sim Params Buffer"),
            contents: bytemuck::cast_slice(&[params]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let view_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("View Buffer"),
            contents: bytemuck::cast_slice(&[ViewUniform::default()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let click = ClickPerturbation::new(&config.click);
        let click_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Click Buffer"),
            contents: bytemuck::cast_slice(&[click.to_uniform()]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        log::info!("Particle store created");

        Self {
            device,
            queue,
            particles: DoubleBuffer::new(),
            matrices: DoubleBuffer::new(),
            params_buffer,
            view_buffer,
            click_buffer,
            params,
            physics,
            click,
            matrix: InteractionMatrix::zeros(1),
        }
    }

    /// Replace the whole population and matrix.
    ///
    /// The new data lands in the inactive allocations, which are then
    /// published together. The previously active allocations are left alone
    /// until the regeneration after this one.
    pub fn regenerate(
        &mut self,
        particles: &[Particle],
        matrix: &InteractionMatrix,
        species_count: usize,
    ) {
        let species_count = clamp_species(species_count);
        let matrix = if matrix.size() == species_count {
            matrix.clone()
        } else {
            matrix.resized(species_count)
        };

        write_inactive(
            &self.device,
            &self.queue,
            &mut self.particles,
            "Particle Buffer",
            bytemuck::cast_slice(particles),
            particles.len() as u32,
        );
        write_inactive(
            &self.device,
            &self.queue,
            &mut self.matrices,
            "Matrix Buffer",
            bytemuck::cast_slice(matrix.as_slice()),
            matrix.as_slice().len() as u32,
        );

        self.particles.publish();
        self.matrices.publish();

        self.params.particle_count = particles.len() as u32;
        self.params.species_count = species_count as u32;
        self.write_params();
        self.matrix = matrix;

        log::info!(
            "Regenerated {} particles, {} species (generation {})",
            particles.len(),
            species_count,
            self.generation()
        );
    }

    pub fn update_physics_parameters(&mut self, physics: &PhysicsParameters) {
        self.physics = *physics;
        self.params.apply(physics);
        self.write_params();
    }

    pub fn set_dt(&mut self, dt: f32) {
        self.params.dt = dt;
        self.write_params();
    }

    /// Upload the frame counter alone; dt and the constants stay as written.
    pub fn set_frame(&mut self, frame: u32) {
        self.params.frame = frame;
        self.queue.write_buffer(
            &self.params_buffer,
            SimParams::FRAME_OFFSET,
            bytemuck::bytes_of(&frame),
        );
    }

    pub fn update_view_state(&self, view: &ViewUniform) {
        self.queue
            .write_buffer(&self.view_buffer, 0, bytemuck::cast_slice(&[*view]));
    }

    /// Start a click impulse at `position` (world units).
    pub fn apply_click(&mut self, position: Vec2, force: f32) {
        self.click.apply(position, force);
        self.write_click();
    }

    /// Age the click impulse by one frame.
    pub fn tick_click(&mut self) {
        let was_active = self.click.is_active();
        self.click.tick();
        if was_active {
            self.write_click();
        }
    }

    pub fn click(&self) -> &ClickPerturbation {
        &self.click
    }

    /// Whether a population has been published.
    pub fn is_ready(&self) -> bool {
        self.particles.is_ready() && self.matrices.is_ready()
    }

    pub fn active_particle_buffer(&self) -> Option<&wgpu::Buffer> {
        self.particles.active().map(|a| &a.buffer)
    }

    pub fn active_matrix_buffer(&self) -> Option<&wgpu::Buffer> {
        self.matrices.active().map(|a| &a.buffer)
    }

    pub fn params_buffer(&self) -> &wgpu::Buffer {
        &self.params_buffer
    }

    pub fn view_buffer(&self) -> &wgpu::Buffer {
        &self.view_buffer
    }

    pub fn click_buffer(&self) -> &wgpu::Buffer {
        &self.click_buffer
    }

    pub fn particle_count(&self) -> u32 {
        self.params.particle_count
    }

    pub fn species_count(&self) -> usize {
        self.params.species_count as usize
    }

    /// Bumped on every regeneration; bind groups keyed on it must be rebuilt.
    pub fn generation(&self) -> u64 {
        self.particles.generation()
    }

    /// CPU copy of the active matrix.
    pub fn matrix(&self) -> &InteractionMatrix {
        &self.matrix
    }

    pub fn physics(&self) -> &PhysicsParameters {
        &self.physics
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Copy a particle slot back to the CPU. Blocks until the GPU is done.
    pub fn read_particles(&self, slot: BufferSlot) -> Result<Vec<Particle>> {
        let array = self
            .particles
            .get(slot)
            .ok_or_else(|| SimulationError::Readback(format!("{slot:?} slot is empty")))?;
        let size = (array.len as usize * std::mem::size_of::<Particle>()) as u64;
        if size == 0 {
            return Ok(Vec::new());
        }

        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Particle Readback Staging Buffer"),
            size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Particle Readback Encoder"),
            });
        encoder.copy_buffer_to_buffer(&array.buffer, 0, &staging, 0, size);
        let submission = self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        self.device.poll(wgpu::PollType::Wait {
            submission_index: Some(submission),
            timeout: None,
        })?;

        rx.recv()
            .map_err(|_| SimulationError::Readback("map callback never ran".into()))??;

        let particles = {
            let data = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, Particle>(&data).to_vec()
        };
        staging.unmap();

        Ok(particles)
    }

    fn write_params(&self) {
        self.queue
            .write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[self.params]));
    }

    fn write_click(&self) {
        self.queue.write_buffer(
            &self.click_buffer,
            0,
            bytemuck::cast_slice(&[self.click.to_uniform()]),
        );
    }
}

/// Upload `bytes` into the inactive slot, growing it when too small.
fn write_inactive(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    target: &mut DoubleBuffer<GpuArray>,
    label: &str,
    bytes: &[u8],
    len: u32,
) {
    // Empty storage bindings are invalid; keep at least one element's worth.
    let size = (bytes.len() as u64).max(std::mem::size_of::<Particle>() as u64);
    let array = target.write_inactive(
        |existing| existing.buffer.size() >= size,
        || {
            log::debug!("Allocating {label} ({size} bytes)");
            GpuArray {
                buffer: device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some(label),
                    size,
                    usage: wgpu::BufferUsages::STORAGE
                        | wgpu::BufferUsages::COPY_DST
                        | wgpu::BufferUsages::COPY_SRC,
                    mapped_at_creation: false,
                }),
                len: 0,
            }
        },
    );
    if !bytes.is_empty() {
        queue.write_buffer(&array.buffer, 0, bytes);
    }
    array.len = len;
}

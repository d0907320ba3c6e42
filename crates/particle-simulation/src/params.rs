//! Physics parameters for runtime tuning

use bytemuck::{Pod, Zeroable};
use particle_physics::{
    ForceLaw, DEFAULT_BETA, DEFAULT_FRICTION, DEFAULT_MAX_DISTANCE, DEFAULT_MIN_DISTANCE,
    DEFAULT_POINT_SIZE, DEFAULT_REPULSION, DEFAULT_WORLD_SIZE,
};

/// Scalar constants of the simulation, as tuned by presets and controls.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsParameters {
    /// Interaction cutoff in world units.
    pub max_distance: f32,
    /// Below this distance every pair repels.
    pub min_distance: f32,
    /// Normalized distance of peak attraction, in `(0, 1)`.
    pub beta: f32,
    /// Fraction of velocity lost per step.
    pub friction: f32,
    pub repulsion: f32,
    /// Point diameter in pixels.
    pub point_size: f32,
    /// Half-extent of the seeded world.
    pub world_size: f32,
}

impl Default for PhysicsParameters {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            min_distance: DEFAULT_MIN_DISTANCE,
            beta: DEFAULT_BETA,
            friction: DEFAULT_FRICTION,
            repulsion: DEFAULT_REPULSION,
            point_size: DEFAULT_POINT_SIZE,
            world_size: DEFAULT_WORLD_SIZE,
        }
    }
}

impl PhysicsParameters {
    /// The subset the force kernel needs, in CPU reference form.
    pub fn force_law(&self) -> ForceLaw {
        ForceLaw {
            max_distance: self.max_distance,
            min_distance: self.min_distance,
            beta: self.beta,
            repulsion: self.repulsion,
        }
    }
}

/// Simulation uniform (matches `SimParams` in particle_life.wgsl).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SimParams {
    pub max_distance: f32,
    pub min_distance: f32,
    pub beta: f32,
    pub friction: f32,

    pub repulsion: f32,
    pub dt: f32,
    pub world_size: f32,
    pub _pad0: f32,

    pub particle_count: u32,
    pub species_count: u32,
    pub frame: u32,
    pub _pad1: u32,
}

impl SimParams {
    /// Byte offset of `frame`, so the counter can be uploaded on its own.
    pub const FRAME_OFFSET: u64 = std::mem::offset_of!(SimParams, frame) as u64;

    /// Copy the tunable constants in, leaving dt/counts/frame untouched.
    pub fn apply(&mut self, physics: &PhysicsParameters) {
        self.max_distance = physics.max_distance;
        self.min_distance = physics.min_distance;
        self.beta = physics.beta;
        self.friction = physics.friction;
        self.repulsion = physics.repulsion;
        self.world_size = physics.world_size;
    }
}

/// Click impulse uniform (matches `Click` in particle_life.wgsl).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ClickUniform {
    pub position: [f32; 2],
    pub force: f32,
    pub radius: f32,

    pub remaining: u32,
    pub ttl: u32,
    pub _padding: [u32; 2],
}

//! Bounds and defaults shared by the generators, the GPU engine and the shaders.
//!
//! The WGSL kernels hardcode a few of these (workgroup size, palette capacity);
//! keep them in sync when changing values here.

/// Smallest supported number of species.
pub const MIN_SPECIES: usize = 1;

/// Largest supported number of species.
pub const MAX_SPECIES: usize = 9;

/// Smallest particle population a generator will produce.
pub const MIN_PARTICLES: usize = 1;

/// Hard upper bound on the particle population, independent of the device tier.
pub const MAX_PARTICLES: usize = 65_536;

/// Threads per compute workgroup (matches `@workgroup_size` in the kernels).
pub const WORKGROUP_SIZE: u32 = 256;

/// Distance below which pairs are treated as coincident to avoid dividing by zero.
pub const SOFTENING: f32 = 1.0e-4;

/// Default radius of influence for the species interaction.
pub const DEFAULT_MAX_DISTANCE: f32 = 0.1;

/// Default hard-core radius.
pub const DEFAULT_MIN_DISTANCE: f32 = 0.01;

/// Default location of the force peak as a fraction of `max_distance`.
pub const DEFAULT_BETA: f32 = 0.3;

/// Default per-frame velocity damping.
pub const DEFAULT_FRICTION: f32 = 0.1;

/// Default hard-core repulsion strength.
pub const DEFAULT_REPULSION: f32 = 0.05;

/// Default rendered particle diameter in pixels.
pub const DEFAULT_POINT_SIZE: f32 = 4.0;

/// Default half-extent of the initial world.
pub const DEFAULT_WORLD_SIZE: f32 = 1.0;

/// Clamp a requested species count to the supported range.
pub fn clamp_species(species_count: usize) -> usize {
    species_count.clamp(MIN_SPECIES, MAX_SPECIES)
}

/// Clamp a requested particle count to the supported range.
pub fn clamp_particles(particle_count: usize) -> usize {
    particle_count.clamp(MIN_PARTICLES, MAX_PARTICLES)
}

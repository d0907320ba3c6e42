//! Immutable scene snapshots.

use crate::params::PhysicsParameters;
use crate::view::ColorEffect;
use particle_physics::{
    clamp_particles, clamp_species, DistributionPattern, DistributionRequest, MatrixArchetype,
    MatrixSource,
};

/// View settings a preset starts from. Camera and zoom are derived from the
/// world size when applied.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewSeed {
    pub palette_index: usize,
    pub species_color_offset: u32,
    pub color_effect: ColorEffect,
}

/// Everything needed to rebuild a scene from scratch.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: String,
    pub species_count: usize,
    pub particle_count: usize,
    pub distribution: DistributionPattern,
    /// Relative population per species; empty means uniform
    pub species_weights: Vec<f32>,
    pub matrix: MatrixSource,
    pub physics: PhysicsParameters,
    pub view: ViewSeed,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            species_count: 6,
            particle_count: 4096,
            distribution: DistributionPattern::Uniform,
            species_weights: Vec::new(),
            matrix: MatrixSource::Archetype(MatrixArchetype::FullRandom),
            physics: PhysicsParameters::default(),
            view: ViewSeed::default(),
        }
    }
}

impl Preset {
    /// Distribution request for this preset, with the particle count capped
    /// at `max_particles` (the device tier ceiling).
    pub fn distribution_request(
        &self,
        max_particles: usize,
        aspect_ratio: f32,
    ) -> DistributionRequest {
        DistributionRequest {
            pattern: self.distribution,
            particle_count: clamp_particles(self.particle_count.min(max_particles)),
            species_count: clamp_species(self.species_count),
            species_weights: self.species_weights.clone(),
            world_size: self.physics.world_size,
            aspect_ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_respects_tier_ceiling_and_bounds() {
        let preset = Preset {
            species_count: 12,
            particle_count: 50_000,
            ..Default::default()
        };
        let request = preset.distribution_request(8_192, 1.5);
        assert_eq!(request.particle_count, 8_192);
        assert_eq!(request.species_count, 9);
        assert_eq!(request.aspect_ratio, 1.5);

        let empty = Preset {
            particle_count: 0,
            species_count: 0,
            ..Default::default()
        };
        let request = empty.distribution_request(8_192, 1.0);
        assert_eq!(request.particle_count, 1);
        assert_eq!(request.species_count, 1);
    }
}

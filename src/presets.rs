//! Built-in scenes, selectable with the number keys.

use particle_physics::{DistributionPattern, InteractionMatrix, MatrixArchetype, MatrixSource};
use particle_simulation::{ColorEffect, PhysicsParameters, Preset, ViewSeed};

pub fn builtin() -> Vec<Preset> {
    vec![
        Preset {
            name: "Primordial Soup".to_string(),
            species_count: 6,
            particle_count: 8192,
            ..Default::default()
        },
        Preset {
            name: "Symmetric Cells".to_string(),
            species_count: 5,
            particle_count: 8192,
            distribution: DistributionPattern::CenteredCluster,
            matrix: MatrixSource::Archetype(MatrixArchetype::SymmetricRandom),
            view: ViewSeed {
                palette_index: 1,
                ..Default::default()
            },
            ..Default::default()
        },
        Preset {
            name: "Snakes".to_string(),
            species_count: 8,
            particle_count: 12288,
            distribution: DistributionPattern::RainbowRing,
            matrix: MatrixSource::Archetype(MatrixArchetype::Snake),
            physics: PhysicsParameters {
                friction: 0.05,
                ..Default::default()
            },
            view: ViewSeed {
                palette_index: 4,
                ..Default::default()
            },
            ..Default::default()
        },
        Preset {
            name: "Chains".to_string(),
            species_count: 7,
            particle_count: 8192,
            distribution: DistributionPattern::Spiral,
            matrix: MatrixSource::Archetype(MatrixArchetype::Chain),
            view: ViewSeed {
                color_effect: ColorEffect::Textured,
                ..Default::default()
            },
            ..Default::default()
        },
        Preset {
            name: "Color Battle".to_string(),
            species_count: 4,
            particle_count: 16384,
            distribution: DistributionPattern::ColorBattle,
            matrix: MatrixSource::Archetype(MatrixArchetype::PolarizedStrong),
            physics: PhysicsParameters {
                max_distance: 0.08,
                point_size: 3.0,
                ..Default::default()
            },
            view: ViewSeed {
                palette_index: 2,
                ..Default::default()
            },
            ..Default::default()
        },
        Preset {
            name: "Banded Drift".to_string(),
            species_count: 9,
            particle_count: 12288,
            distribution: DistributionPattern::HorizontalBands,
            matrix: MatrixSource::Archetype(MatrixArchetype::BandedAttractRepel),
            view: ViewSeed {
                color_effect: ColorEffect::Highlighted,
                ..Default::default()
            },
            ..Default::default()
        },
        Preset {
            name: "Sparse Nebula".to_string(),
            species_count: 6,
            particle_count: 24576,
            distribution: DistributionPattern::NoiseMaskedFill,
            matrix: MatrixSource::Archetype(MatrixArchetype::SparseWeak),
            physics: PhysicsParameters {
                point_size: 2.5,
                world_size: 1.5,
                ..Default::default()
            },
            view: ViewSeed {
                palette_index: 3,
                ..Default::default()
            },
            ..Default::default()
        },
        Preset {
            name: "Predator and Prey".to_string(),
            species_count: 3,
            particle_count: 6144,
            distribution: DistributionPattern::ColorBattle,
            species_weights: vec![1.0, 3.0, 6.0],
            matrix: MatrixSource::Custom(InteractionMatrix::from_rows(&[
                vec![0.2, 0.8, -0.1],
                vec![-0.9, 0.4, 0.6],
                vec![0.1, -0.6, 0.3],
            ])),
            physics: PhysicsParameters {
                point_size: 5.0,
                ..Default::default()
            },
            view: ViewSeed {
                color_effect: ColorEffect::GrayscaleHighlighted,
                ..Default::default()
            },
            ..Default::default()
        },
        Preset {
            name: "Neutral Threads".to_string(),
            species_count: 9,
            particle_count: 16384,
            distribution: DistributionPattern::Line,
            matrix: MatrixSource::Archetype(MatrixArchetype::NeutralChain),
            view: ViewSeed {
                palette_index: 4,
                species_color_offset: 3,
                ..Default::default()
            },
            ..Default::default()
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use particle_physics::{MAX_PARTICLES, MAX_SPECIES};

    #[test]
    fn presets_are_in_bounds() {
        let presets = builtin();
        assert!(presets.len() <= 9, "number keys only reach nine presets");
        for preset in &presets {
            assert!((1..=MAX_SPECIES).contains(&preset.species_count), "{}", preset.name);
            assert!((1..=MAX_PARTICLES).contains(&preset.particle_count), "{}", preset.name);
            if let MatrixSource::Custom(matrix) = &preset.matrix {
                assert_eq!(matrix.size(), preset.species_count, "{}", preset.name);
            }
            if !preset.species_weights.is_empty() {
                assert_eq!(preset.species_weights.len(), preset.species_count);
                assert!(
                    !preset.distribution.assigns_species_cyclically(),
                    "{} weights would be ignored by {}",
                    preset.name,
                    preset.distribution.name()
                );
            }
        }
    }

    #[test]
    fn names_are_unique() {
        let presets = builtin();
        let mut names: Vec<_> = presets.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), presets.len());
    }
}

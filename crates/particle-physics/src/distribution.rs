//! Initial particle layouts
//!
//! A distribution is built in three steps: per-species populations are derived
//! from the requested weights, species ids are assigned to particle indices,
//! and each index is placed by a pure shape function in a unit-ish local frame
//! before being recentered and scaled into world units.

use crate::constants::{clamp_particles, clamp_species, DEFAULT_WORLD_SIZE};
use crate::noise::GradientNoise;
use crate::particle::Particle;
use glam::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use std::f32::consts::TAU;

const RING_RADIUS: f32 = 0.9;
const RING_JITTER: f32 = 0.02;
const LINE_JITTER: f32 = 0.01;
const CLUSTER_RADIUS: f32 = 0.2;
const BATTLE_ORBIT: f32 = 0.5;
const BATTLE_RADIUS: f32 = 0.12;
const SPIRAL_TURNS: f32 = 3.0;
const NOISE_FREQUENCY: f32 = 3.0;
const NOISE_THRESHOLD: f32 = -0.05;
const NOISE_MAX_ATTEMPTS: usize = 32;

/// Spatial pattern used to seed particle positions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DistributionPattern {
    Uniform,
    CenteredCluster,
    UniformCircle,
    CenteredCircle,
    Ring,
    RainbowRing,
    ColorBattle,
    ColorWheel,
    HorizontalBands,
    Line,
    Spiral,
    RainbowSpiral,
    NoiseMaskedFill,
}

impl DistributionPattern {
    pub const ALL: [DistributionPattern; 13] = [
        DistributionPattern::Uniform,
        DistributionPattern::CenteredCluster,
        DistributionPattern::UniformCircle,
        DistributionPattern::CenteredCircle,
        DistributionPattern::Ring,
        DistributionPattern::RainbowRing,
        DistributionPattern::ColorBattle,
        DistributionPattern::ColorWheel,
        DistributionPattern::HorizontalBands,
        DistributionPattern::Line,
        DistributionPattern::Spiral,
        DistributionPattern::RainbowSpiral,
        DistributionPattern::NoiseMaskedFill,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DistributionPattern::Uniform => "uniform",
            DistributionPattern::CenteredCluster => "centered cluster",
            DistributionPattern::UniformCircle => "uniform circle",
            DistributionPattern::CenteredCircle => "centered circle",
            DistributionPattern::Ring => "ring",
            DistributionPattern::RainbowRing => "rainbow ring",
            DistributionPattern::ColorBattle => "color battle",
            DistributionPattern::ColorWheel => "color wheel",
            DistributionPattern::HorizontalBands => "horizontal bands",
            DistributionPattern::Line => "line",
            DistributionPattern::Spiral => "spiral",
            DistributionPattern::RainbowSpiral => "rainbow spiral",
            DistributionPattern::NoiseMaskedFill => "noise-masked fill",
        }
    }

    /// Patterns whose look depends on index order get `i mod N` species and
    /// ignore the weights.
    pub fn assigns_species_cyclically(self) -> bool {
        matches!(
            self,
            DistributionPattern::Ring
                | DistributionPattern::RainbowRing
                | DistributionPattern::ColorWheel
                | DistributionPattern::HorizontalBands
                | DistributionPattern::RainbowSpiral
        )
    }

    pub fn recenters(self) -> bool {
        matches!(
            self,
            DistributionPattern::ColorBattle
                | DistributionPattern::Spiral
                | DistributionPattern::RainbowSpiral
        )
    }

    pub fn scales_to_aspect(self) -> bool {
        matches!(
            self,
            DistributionPattern::Uniform
                | DistributionPattern::HorizontalBands
                | DistributionPattern::Line
                | DistributionPattern::NoiseMaskedFill
        )
    }
}

/// Everything needed to seed a population.
#[derive(Clone, Debug, PartialEq)]
pub struct DistributionRequest {
    pub pattern: DistributionPattern,
    pub particle_count: usize,
    pub species_count: usize,
    /// Relative weight per species; empty means uniform
    pub species_weights: Vec<f32>,
    pub world_size: f32,
    /// Window width over height
    pub aspect_ratio: f32,
}

impl Default for DistributionRequest {
    fn default() -> Self {
        Self {
            pattern: DistributionPattern::Uniform,
            particle_count: 4096,
            species_count: 6,
            species_weights: Vec::new(),
            world_size: DEFAULT_WORLD_SIZE,
            aspect_ratio: 1.0,
        }
    }
}

/// Integer population per species.
///
/// The result has one entry per (clamped) species and sums to
/// `particle_count` exactly. Every species with a positive weight gets at
/// least one particle as long as there are enough particles to go around.
/// Missing weights count as 1; all-zero weights mean uniform.
pub fn species_populations(
    weights: &[f32],
    particle_count: usize,
    species_count: usize,
) -> Vec<usize> {
    let n = clamp_species(species_count);

    let mut w: Vec<f32> = (0..n)
        .map(|i| {
            let value = weights.get(i).copied().unwrap_or(1.0);
            if value.is_finite() {
                value.max(0.0)
            } else {
                0.0
            }
        })
        .collect();
    let mut total: f32 = w.iter().sum();
    if total <= 0.0 {
        w.fill(1.0);
        total = n as f32;
    }

    let active: Vec<usize> = (0..n).filter(|&i| w[i] > 0.0).collect();
    let mut counts = vec![0usize; n];

    if particle_count < active.len() {
        for &i in active.iter().take(particle_count) {
            counts[i] = 1;
        }
        return counts;
    }

    for &i in &active {
        let share = (w[i] / total * particle_count as f32).floor() as usize;
        counts[i] = share.max(1);
    }

    let mut assigned: usize = counts.iter().sum();

    // Bumping empty species to one can overshoot; take back from the largest.
    while assigned > particle_count {
        let Some(&largest) = active
            .iter()
            .filter(|&&i| counts[i] > 1)
            .max_by_key(|&&i| counts[i])
        else {
            break;
        };
        counts[largest] -= 1;
        assigned -= 1;
    }

    for &i in active.iter().cycle() {
        if assigned >= particle_count {
            break;
        }
        counts[i] += 1;
        assigned += 1;
    }

    counts
}

/// Seed a population for `request`.
///
/// Always returns exactly `clamp_particles(request.particle_count)` particles,
/// each with `species < clamp_species(request.species_count)`, at rest.
pub fn generate<R: Rng>(request: &DistributionRequest, rng: &mut R) -> Vec<Particle> {
    let pattern = request.pattern;
    let species_count = clamp_species(request.species_count);
    let count = clamp_particles(request.particle_count);

    let species = assign_species(request, species_count, count, rng);

    let noise = (pattern == DistributionPattern::NoiseMaskedFill).then(|| GradientNoise::new(rng));

    let mut positions: Vec<Vec2> = species
        .iter()
        .map(|&s| sample_shape(pattern, s, species_count, noise.as_ref(), rng))
        .collect();

    if pattern.recenters() {
        let centroid = positions.iter().copied().sum::<Vec2>() / positions.len() as f32;
        for p in &mut positions {
            *p -= centroid;
        }
    }

    let scale = if pattern.scales_to_aspect() {
        Vec2::new(request.world_size * request.aspect_ratio, request.world_size)
    } else {
        Vec2::splat(request.world_size)
    };

    log::debug!(
        "Generated {} particles ({}, {} species)",
        count,
        pattern.name(),
        species_count
    );

    positions
        .into_iter()
        .zip(species)
        .map(|(p, s)| Particle::new(p * scale, s))
        .collect()
}

fn assign_species<R: Rng>(
    request: &DistributionRequest,
    species_count: usize,
    count: usize,
    rng: &mut R,
) -> Vec<u32> {
    if request.pattern.assigns_species_cyclically() {
        return (0..count).map(|i| (i % species_count) as u32).collect();
    }

    let populations = species_populations(&request.species_weights, count, species_count);
    let mut species: Vec<u32> = populations
        .iter()
        .enumerate()
        .flat_map(|(s, &n)| std::iter::repeat_n(s as u32, n))
        .collect();
    species.shuffle(rng);
    species
}

fn sample_shape<R: Rng>(
    pattern: DistributionPattern,
    species: u32,
    species_count: usize,
    noise: Option<&GradientNoise>,
    rng: &mut R,
) -> Vec2 {
    let n = species_count as f32;
    let s = species as f32;

    match pattern {
        DistributionPattern::Uniform => random_in_square(rng),
        DistributionPattern::CenteredCluster => {
            let r = rng.random::<f32>().powi(2) * CLUSTER_RADIUS;
            polar(rng.random::<f32>() * TAU, r)
        }
        DistributionPattern::UniformCircle => {
            polar(rng.random::<f32>() * TAU, rng.random::<f32>().sqrt())
        }
        DistributionPattern::CenteredCircle => {
            polar(rng.random::<f32>() * TAU, rng.random::<f32>())
        }
        DistributionPattern::Ring => {
            polar(rng.random::<f32>() * TAU, RING_RADIUS + jitter(rng, RING_JITTER))
        }
        DistributionPattern::RainbowRing => {
            let angle = (s + rng.random::<f32>()) / n * TAU;
            polar(angle, RING_RADIUS + jitter(rng, RING_JITTER))
        }
        DistributionPattern::ColorBattle => {
            let center = polar(s / n * TAU, BATTLE_ORBIT);
            let offset = polar(
                rng.random::<f32>() * TAU,
                rng.random::<f32>().sqrt() * BATTLE_RADIUS,
            );
            center + offset
        }
        DistributionPattern::ColorWheel => {
            // Leave a thin gap between wedges.
            let angle = (s + 0.1 + rng.random::<f32>() * 0.8) / n * TAU;
            let r = 0.1 + 0.8 * rng.random::<f32>().sqrt();
            polar(angle, r) + Vec2::new(jitter(rng, 0.01), jitter(rng, 0.01))
        }
        DistributionPattern::HorizontalBands => {
            let y = -1.0 + (s + rng.random::<f32>()) / n * 2.0;
            Vec2::new(rng.random_range(-1.0..1.0), y)
        }
        DistributionPattern::Line => {
            Vec2::new(rng.random_range(-1.0..1.0), jitter(rng, LINE_JITTER))
        }
        DistributionPattern::Spiral => archimedean(rng.random::<f32>(), rng),
        DistributionPattern::RainbowSpiral => archimedean((s + rng.random::<f32>()) / n, rng),
        DistributionPattern::NoiseMaskedFill => {
            let mut candidate = random_in_square(rng);
            if let Some(noise) = noise {
                for _ in 0..NOISE_MAX_ATTEMPTS {
                    if noise.sample(candidate * NOISE_FREQUENCY) > NOISE_THRESHOLD {
                        break;
                    }
                    candidate = random_in_square(rng);
                }
            }
            candidate
        }
    }
}

fn random_in_square<R: Rng>(rng: &mut R) -> Vec2 {
    Vec2::new(rng.random_range(-1.0..1.0), rng.random_range(-1.0..1.0))
}

fn polar(angle: f32, radius: f32) -> Vec2 {
    Vec2::from_angle(angle) * radius
}

fn jitter<R: Rng>(rng: &mut R, amplitude: f32) -> f32 {
    rng.random_range(-amplitude..=amplitude)
}

/// Point at parameter `t ∈ [0, 1]` along an Archimedean spiral, radius linear in angle.
fn archimedean<R: Rng>(t: f32, rng: &mut R) -> Vec2 {
    let angle = t * SPIRAL_TURNS * TAU;
    let radius = 0.05 + 0.85 * t;
    polar(angle, radius) + Vec2::new(jitter(rng, LINE_JITTER), jitter(rng, LINE_JITTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1234)
    }

    fn request(
        pattern: DistributionPattern,
        particle_count: usize,
        species_count: usize,
    ) -> DistributionRequest {
        DistributionRequest {
            pattern,
            particle_count,
            species_count,
            ..Default::default()
        }
    }

    #[test]
    fn every_pattern_returns_exact_count_with_valid_species() {
        let mut rng = rng();
        for pattern in DistributionPattern::ALL {
            for (count, species) in [(1, 1), (7, 3), (500, 9), (1024, 4)] {
                let particles = generate(&request(pattern, count, species), &mut rng);
                assert_eq!(particles.len(), count, "{}", pattern.name());
                assert!(particles.iter().all(|p| (p.species as usize) < species));
                assert!(particles.iter().all(|p| p.position().is_finite()));
                assert!(particles.iter().all(|p| p.velocity() == Vec2::ZERO));
            }
        }
    }

    #[test]
    fn populations_sum_and_cover_weighted_species() {
        let cases: &[(&[f32], usize, usize)] = &[
            (&[], 1000, 6),
            (&[1.0, 1.0, 1.0], 10, 3),
            (&[0.97, 0.01, 0.01, 0.01], 100, 4),
            (&[0.5, 0.0, 0.5], 9, 3),
            (&[1e-6, 1.0], 3, 2),
            (&[2.0, 1.0, 1.0, 3.0, 0.5, 0.5, 1.0, 1.0, 4.0], 4096, 9),
        ];
        for &(weights, count, species) in cases {
            let populations = species_populations(weights, count, species);
            assert_eq!(populations.len(), species);
            assert_eq!(populations.iter().sum::<usize>(), count);
            for (i, &population) in populations.iter().enumerate() {
                let weight = weights.get(i).copied().unwrap_or(1.0);
                if weight > 0.0 {
                    assert!(population >= 1, "species {} starved in {:?}", i, weights);
                } else {
                    assert_eq!(population, 0);
                }
            }
        }
    }

    #[test]
    fn zero_weights_fall_back_to_uniform() {
        let populations = species_populations(&[0.0, 0.0, 0.0], 9, 3);
        assert_eq!(populations, vec![3, 3, 3]);
    }

    #[test]
    fn fewer_particles_than_species() {
        let populations = species_populations(&[], 2, 5);
        assert_eq!(populations.iter().sum::<usize>(), 2);
    }

    #[test]
    fn weighted_assignment_matches_populations() {
        let mut rng = rng();
        let req = DistributionRequest {
            pattern: DistributionPattern::UniformCircle,
            particle_count: 200,
            species_count: 3,
            species_weights: vec![0.5, 0.3, 0.2],
            ..Default::default()
        };
        let particles = generate(&req, &mut rng);
        let expected = species_populations(&req.species_weights, 200, 3);
        for (s, &n) in expected.iter().enumerate() {
            let actual = particles.iter().filter(|p| p.species as usize == s).count();
            assert_eq!(actual, n);
        }
    }

    #[test]
    fn cyclic_patterns_ignore_weights() {
        let mut rng = rng();
        let req = DistributionRequest {
            pattern: DistributionPattern::RainbowRing,
            particle_count: 30,
            species_count: 4,
            species_weights: vec![1.0, 0.0, 0.0, 0.0],
            ..Default::default()
        };
        let particles = generate(&req, &mut rng);
        for (i, p) in particles.iter().enumerate() {
            assert_eq!(p.species as usize, i % 4);
        }
    }

    #[test]
    fn noise_mask_rejects_low_noise_positions() {
        let mut rng = StdRng::seed_from_u64(77);
        let mut replay = rng.clone();
        let req = request(DistributionPattern::NoiseMaskedFill, 4000, 3);
        let particles = generate(&req, &mut rng);

        // Same draws as `generate`: species first, then the noise table
        assign_species(&req, 3, 4000, &mut replay);
        let noise = GradientNoise::new(&mut replay);
        let passes = |p: Vec2| noise.sample(p * NOISE_FREQUENCY) > NOISE_THRESHOLD;

        // Default world size and aspect ratio leave positions unscaled
        let accepted = particles.iter().filter(|p| passes(p.position())).count();
        assert!(
            accepted as f32 > 0.95 * particles.len() as f32,
            "only {accepted} of {} positions clear the mask",
            particles.len()
        );

        let unmasked = (0..4000)
            .filter(|_| passes(random_in_square(&mut replay)))
            .count();
        assert!(
            (unmasked as f32) < 0.9 * 4000.0,
            "mask rejects too little to carve voids ({unmasked} of 4000)"
        );
    }

    #[test]
    fn species_count_is_clamped() {
        let mut rng = rng();
        let low = generate(&request(DistributionPattern::Uniform, 50, 0), &mut rng);
        assert!(low.iter().all(|p| p.species == 0));

        let high = generate(&request(DistributionPattern::Ring, 50, 40), &mut rng);
        assert!(high.iter().all(|p| p.species < 9));
        assert!(high.iter().any(|p| p.species == 8));
    }

    #[test]
    fn recentered_patterns_have_centroid_at_origin() {
        let mut rng = rng();
        for pattern in DistributionPattern::ALL.into_iter().filter(|p| p.recenters()) {
            let req = DistributionRequest {
                world_size: 3.0,
                ..request(pattern, 777, 5)
            };
            let particles = generate(&req, &mut rng);
            let centroid =
                particles.iter().map(|p| p.position()).sum::<Vec2>() / particles.len() as f32;
            assert!(centroid.length() < 1e-3, "{} centroid {:?}", pattern.name(), centroid);
        }
    }

    #[test]
    fn aspect_patterns_stretch_x() {
        let mut rng = rng();
        let req = DistributionRequest {
            world_size: 2.0,
            aspect_ratio: 1.5,
            ..request(DistributionPattern::Uniform, 4000, 3)
        };
        let particles = generate(&req, &mut rng);
        assert!(particles.iter().all(|p| p.position[0].abs() <= 3.0 && p.position[1].abs() <= 2.0));
        assert!(particles.iter().any(|p| p.position[0].abs() > 2.0));
    }

    #[test]
    fn non_aspect_patterns_scale_uniformly() {
        let mut rng = rng();
        let req = DistributionRequest {
            world_size: 2.0,
            aspect_ratio: 3.0,
            ..request(DistributionPattern::UniformCircle, 2000, 3)
        };
        let particles = generate(&req, &mut rng);
        assert!(particles.iter().all(|p| p.position().length() <= 2.0 + 1e-4));
    }

    #[test]
    fn ring_particles_sit_on_the_ring() {
        let mut rng = rng();
        let particles = generate(&request(DistributionPattern::Ring, 300, 3), &mut rng);
        for p in &particles {
            let r = p.position().length();
            assert!((r - RING_RADIUS).abs() <= RING_JITTER + 1e-5);
        }
    }

    #[test]
    fn bands_are_ordered_by_species() {
        let mut rng = rng();
        let particles = generate(&request(DistributionPattern::HorizontalBands, 300, 3), &mut rng);
        for p in &particles {
            let lower = -1.0 + p.species as f32 * 2.0 / 3.0;
            let upper = lower + 2.0 / 3.0;
            assert!(p.position[1] >= lower - 1e-5 && p.position[1] <= upper + 1e-5);
        }
    }
}

//! Species force law
//!
//! NOTE: These are reference implementations for documentation and testing.
//! The actual simulation runs the same rules in the `accumulate`/`integrate`
//! compute kernels; keep both in step.

use crate::constants::SOFTENING;
use crate::matrix::InteractionMatrix;
use crate::particle::Particle;
use glam::Vec2;

/// Scalar constants of the force law.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceLaw {
    pub max_distance: f32,
    pub min_distance: f32,
    pub beta: f32,
    pub repulsion: f32,
}

/// Shape of the interaction as a function of normalized distance `r = d / max_distance`.
///
/// Rises linearly from 0 to a peak of 1 at `r = beta`, then falls linearly to
/// 0 at `r = 1`.
pub fn falloff(r: f32, beta: f32) -> f32 {
    if r <= 0.0 || r >= 1.0 {
        0.0
    } else if r < beta {
        r / beta
    } else {
        (1.0 - r) / (1.0 - beta).max(SOFTENING)
    }
}

/// Acceleration `p` receives from `other`.
///
/// Positive `strength` pulls toward `other`; inside `min_distance` the pair
/// repels with magnitude `repulsion / d` regardless of the matrix.
pub fn pair_acceleration(law: &ForceLaw, strength: f32, p: Vec2, other: Vec2) -> Vec2 {
    let delta = other - p;
    let d = delta.length();
    if d < SOFTENING {
        return Vec2::ZERO;
    }
    let direction = delta / d;

    if d < law.min_distance {
        -direction * (law.repulsion / d)
    } else if d < law.max_distance {
        direction * strength * falloff(d / law.max_distance, law.beta)
    } else {
        Vec2::ZERO
    }
}

/// Radial click impulse at `p`.
///
/// `scale` is the remaining-lifetime fraction; positive force pushes away
/// from `center`, negative pulls toward it.
pub fn click_acceleration(p: Vec2, center: Vec2, radius: f32, force: f32, scale: f32) -> Vec2 {
    let delta = p - center;
    let d = delta.length();
    if force == 0.0 || d >= radius || d < SOFTENING {
        return Vec2::ZERO;
    }
    delta / d * force * scale * (1.0 - d / radius)
}

/// One full all-pairs step on the CPU.
///
/// Mirrors the GPU kernels: velocities are updated from a snapshot of the
/// positions, then positions are advanced.
pub fn step(
    particles: &mut [Particle],
    matrix: &InteractionMatrix,
    law: &ForceLaw,
    friction: f32,
    dt: f32,
) {
    let snapshot: Vec<(Vec2, usize)> = particles
        .iter()
        .map(|p| (p.position(), p.species as usize))
        .collect();

    for (i, particle) in particles.iter_mut().enumerate() {
        let (position, species) = snapshot[i];
        let acceleration: Vec2 = snapshot
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(_, &(other, other_species))| {
                pair_acceleration(law, matrix.get(species, other_species), position, other)
            })
            .sum();

        let velocity = particle.velocity() * (1.0 - friction) + acceleration * dt;
        particle.set_velocity(velocity);
        particle.set_position(position + velocity * dt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn law() -> ForceLaw {
        ForceLaw {
            max_distance: 0.1,
            min_distance: 0.01,
            beta: 0.3,
            repulsion: 0.05,
        }
    }

    #[test]
    fn falloff_peaks_at_beta() {
        assert_eq!(falloff(0.0, 0.3), 0.0);
        assert!((falloff(0.3, 0.3) - 1.0).abs() < 1e-6);
        assert!((falloff(0.15, 0.3) - 0.5).abs() < 1e-6);
        assert!((falloff(0.65, 0.3) - 0.5).abs() < 1e-6);
        assert_eq!(falloff(1.0, 0.3), 0.0);
        assert_eq!(falloff(1.5, 0.3), 0.0);
    }

    #[test]
    fn positive_strength_attracts() {
        let a = pair_acceleration(&law(), 1.0, Vec2::ZERO, Vec2::new(0.05, 0.0));
        assert!(a.x > 0.0);
        assert_eq!(a.y, 0.0);
    }

    #[test]
    fn negative_strength_repels() {
        let a = pair_acceleration(&law(), -1.0, Vec2::ZERO, Vec2::new(0.0, 0.05));
        assert!(a.y < 0.0);
    }

    #[test]
    fn core_repulsion_ignores_matrix_sign() {
        for strength in [-1.0, 0.0, 1.0] {
            let a = pair_acceleration(&law(), strength, Vec2::ZERO, Vec2::new(0.005, 0.0));
            assert!(a.x < 0.0);
            assert!((a.x + 0.05 / 0.005).abs() < 1e-3);
        }
    }

    #[test]
    fn no_force_beyond_max_distance() {
        let a = pair_acceleration(&law(), 1.0, Vec2::ZERO, Vec2::new(0.2, 0.0));
        assert_eq!(a, Vec2::ZERO);
    }

    #[test]
    fn coincident_pair_is_ignored() {
        let a = pair_acceleration(&law(), 1.0, Vec2::ONE, Vec2::ONE);
        assert_eq!(a, Vec2::ZERO);
    }

    #[test]
    fn click_pushes_and_pulls() {
        let push = click_acceleration(Vec2::new(0.1, 0.0), Vec2::ZERO, 0.5, 2.0, 1.0);
        assert!(push.x > 0.0);
        let pull = click_acceleration(Vec2::new(0.1, 0.0), Vec2::ZERO, 0.5, -2.0, 1.0);
        assert!(pull.x < 0.0);
        let outside = click_acceleration(Vec2::new(0.6, 0.0), Vec2::ZERO, 0.5, 2.0, 1.0);
        assert_eq!(outside, Vec2::ZERO);
    }

    #[test]
    fn mutual_attraction_closes_the_gap() {
        let matrix = InteractionMatrix::from_rows(&[vec![1.0]]);
        let mut particles = vec![
            Particle::new(Vec2::new(-0.03, 0.0), 0),
            Particle::new(Vec2::new(0.03, 0.0), 0),
        ];
        for _ in 0..10 {
            step(&mut particles, &matrix, &law(), 0.1, 0.01);
        }
        let gap = particles[1].position[0] - particles[0].position[0];
        assert!(gap < 0.06);
        assert!(gap > 0.0);
    }

    #[test]
    fn friction_decays_velocity_of_isolated_particle() {
        let matrix = InteractionMatrix::from_rows(&[vec![0.0]]);
        let mut particles = vec![Particle::new(Vec2::ZERO, 0)];
        particles[0].set_velocity(Vec2::new(1.0, 0.0));
        step(&mut particles, &matrix, &law(), 0.5, 0.01);
        assert!((particles[0].velocity().x - 0.5).abs() < 1e-6);
        assert!((particles[0].position[0] - 0.005).abs() < 1e-6);
    }
}

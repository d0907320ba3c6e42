//! GPU-compatible particle record

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

/// A single particle.
///
/// Layout matches the WGSL `Particle` struct: two `vec2<f32>` followed by the
/// species id and explicit padding, 24 bytes total.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Position in world units
    pub position: [f32; 2],
    /// Velocity in world units per second
    pub velocity: [f32; 2],
    /// Species id, indexes the interaction matrix and the palette
    pub species: u32,
    pub _padding: u32,
}

impl Particle {
    /// Create a particle at rest.
    pub fn new(position: Vec2, species: u32) -> Self {
        Self {
            position: position.to_array(),
            velocity: [0.0; 2],
            species,
            _padding: 0,
        }
    }

    pub fn position(&self) -> Vec2 {
        Vec2::from_array(self.position)
    }

    pub fn velocity(&self) -> Vec2 {
        Vec2::from_array(self.velocity)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position.to_array();
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity.to_array();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_wgsl() {
        assert_eq!(std::mem::size_of::<Particle>(), 24);
        assert_eq!(std::mem::align_of::<Particle>(), 4);
    }

    #[test]
    fn new_particle_is_at_rest() {
        let p = Particle::new(Vec2::new(0.5, -0.25), 3);
        assert_eq!(p.velocity(), Vec2::ZERO);
        assert_eq!(p.position(), Vec2::new(0.5, -0.25));
        assert_eq!(p.species, 3);
    }
}

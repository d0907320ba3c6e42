//! Transient pointer impulse.

use crate::params::ClickUniform;
use glam::Vec2;

/// Click tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickConfig {
    /// Frames a click stays active after the frame it was applied on.
    pub ttl: u32,
    /// Radius of influence in world units.
    pub radius: f32,
    /// Impulse magnitude; secondary clicks use the negated value.
    pub force: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            ttl: 3,
            radius: 0.15,
            force: 40.0,
        }
    }
}

/// A radial impulse that decays over `ttl` frames.
///
/// The force is live on the click frame and the following `ttl` ticks, and is
/// cleared to zero on tick `ttl + 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClickPerturbation {
    pub world_position: Vec2,
    pub force: f32,
    pub remaining_frames: u32,
    radius: f32,
    ttl: u32,
}

impl ClickPerturbation {
    pub fn new(config: &ClickConfig) -> Self {
        Self {
            world_position: Vec2::ZERO,
            force: 0.0,
            remaining_frames: 0,
            radius: config.radius,
            ttl: config.ttl,
        }
    }

    pub fn apply(&mut self, world_position: Vec2, force: f32) {
        self.world_position = world_position;
        self.force = force;
        self.remaining_frames = self.ttl;
    }

    /// Age the impulse by one frame.
    pub fn tick(&mut self) {
        if self.remaining_frames == 0 {
            self.force = 0.0;
        } else {
            self.remaining_frames -= 1;
        }
    }

    pub fn is_active(&self) -> bool {
        self.force != 0.0
    }

    pub fn to_uniform(&self) -> ClickUniform {
        ClickUniform {
            position: self.world_position.to_array(),
            force: self.force,
            radius: self.radius,
            remaining: self.remaining_frames,
            ttl: self.ttl,
            _padding: [0; 2],
        }
    }
}

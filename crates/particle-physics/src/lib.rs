//! # Particle Life Physics
//!
//! CPU-side model of the particle-life system: the particle record, the
//! species interaction matrix and its archetypes, initial distributions, and a
//! reference implementation of the force law run by the GPU kernels.

pub mod constants;
pub mod distribution;
pub mod forces;
pub mod matrix;
pub mod noise;
pub mod particle;

pub use constants::*;
pub use distribution::*;
pub use forces::*;
pub use matrix::*;
pub use particle::*;

//! # Particle Renderer
//!
//! Draws the particle-life population as instanced point sprites colored by
//! species.

pub mod camera;
pub mod palette;
pub mod renderer;

pub use camera::*;
pub use palette::*;
pub use renderer::*;

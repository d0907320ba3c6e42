//! # Particle Life Engine
//!
//! GPU-resident particle-life simulation: double-buffered particle and matrix
//! state, delta-time smoothing, hardware calibration and the all-pairs
//! compute kernels.

pub mod capability;
pub mod click;
pub mod clock;
pub mod compute;
pub mod config;
pub mod double_buffer;
pub mod error;
pub mod gpu;
pub mod params;
pub mod preset;
pub mod store;
pub mod view;

pub use capability::*;
pub use click::*;
pub use clock::*;
pub use compute::*;
pub use config::*;
pub use double_buffer::*;
pub use error::*;
pub use params::*;
pub use preset::*;
pub use store::*;
pub use view::*;

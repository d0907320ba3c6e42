//! Error types for device bootstrap and GPU readback.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("no compatible GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create GPU device: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),

    #[error("failed to wait for GPU work: {0}")]
    Poll(#[from] wgpu::PollError),

    #[error("failed to map GPU buffer: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    #[error("calibration failed: {0}")]
    Calibration(String),

    #[error("readback failed: {0}")]
    Readback(String),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

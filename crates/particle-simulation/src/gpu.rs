//! Adapter and device acquisition.

use crate::error::Result;

pub fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: wgpu::Backends::PRIMARY,
        ..Default::default()
    })
}

pub fn create_surface<'window>(
    instance: &wgpu::Instance,
    target: impl Into<wgpu::SurfaceTarget<'window>>,
) -> Result<wgpu::Surface<'window>> {
    Ok(instance.create_surface(target)?)
}

/// Pick a high-performance adapter, optionally one that can present to `surface`.
pub async fn request_adapter(
    instance: &wgpu::Instance,
    surface: Option<&wgpu::Surface<'_>>,
) -> Result<wgpu::Adapter> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await?;

    log::info!("Using GPU: {}", adapter.get_info().name);
    Ok(adapter)
}

pub async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Particle Life Device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            memory_hints: wgpu::MemoryHints::default(),
            experimental_features: wgpu::ExperimentalFeatures::default(),
            trace: wgpu::Trace::Off,
        })
        .await?;
    Ok((device, queue))
}

/// Device and queue without a surface, for calibration and tests.
pub async fn request_headless_device() -> Result<(wgpu::Device, wgpu::Queue)> {
    let instance = create_instance();
    let adapter = request_adapter(&instance, None).await?;
    request_device(&adapter).await
}

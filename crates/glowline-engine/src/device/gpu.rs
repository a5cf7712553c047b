use anyhow::{Context, Result};

use crate::backend::WgpuBackendDesc;

use super::{GpuInit, OffscreenTarget};

/// Owns an adapter, device and queue without a surface.
pub struct HeadlessGpu {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl HeadlessGpu {
    /// Acquires an adapter and device. Asynchronous under wgpu.
    pub async fn new(init: GpuInit) -> Result<Self> {
        let GpuInit {
            power_preference,
            force_fallback_adapter,
            required_features,
            required_limits,
        } = init;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("glowline headless device"),
                required_features,
                required_limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let info = adapter.get_info();
        log::info!("headless GPU: {} ({:?})", info.name, info.backend);

        Ok(Self { adapter, device, queue })
    }

    /// Blocking variant of [`HeadlessGpu::new`].
    pub fn new_blocking(init: GpuInit) -> Result<Self> {
        pollster::block_on(Self::new(init))
    }

    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.adapter.get_info()
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Backend descriptor bound to this device, rendering into `color_format`.
    pub fn backend_desc(&self, color_format: wgpu::TextureFormat) -> WgpuBackendDesc {
        WgpuBackendDesc::new(self.device.clone(), self.queue.clone(), color_format)
    }

    /// Creates an RGBA8 color target (plus `Stencil8` when requested).
    pub fn create_target(&self, width: u32, height: u32, stencil: bool) -> Result<OffscreenTarget> {
        OffscreenTarget::new(&self.device, width, height, stencil)
    }

    /// Copies the target's color texture back to the CPU as tightly packed RGBA8.
    pub fn read_rgba8(&self, target: &OffscreenTarget) -> Result<Vec<u8>> {
        target.read_rgba8(&self.device, &self.queue)
    }
}

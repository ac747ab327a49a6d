use std::sync::Arc;

use anyhow::Result;
use wgpu::{
    CompositeAlphaMode, Device, DeviceDescriptor, ExperimentalFeatures, Instance,
    InstanceDescriptor, MemoryHints, PowerPreference, Queue, RequestAdapterOptions, Surface,
    SurfaceConfiguration, TextureFormat, TextureUsages, Trace,
};
use winit::window::Window;

/// Device, queue and the window's swapchain. The instance and adapter are
/// only needed while setting these up.
pub struct GpuContext {
    pub device: Device,
    pub queue: Queue,
    pub surface: Surface<'static>,
    pub surface_config: SurfaceConfiguration,
    pub format: TextureFormat,
}

impl GpuContext {
    pub fn new(window: Arc<Window>) -> Result<Self> {
        let instance = Instance::new(&InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))?;
        let info = adapter.get_info();

        let (device, queue) = pollster::block_on(adapter.request_device(&DeviceDescriptor {
            label: Some("videoplane-device"),
            required_features: wgpu::Features::empty(),
            required_limits: wgpu::Limits::default(),
            experimental_features: ExperimentalFeatures::default(),
            memory_hints: MemoryHints::MemoryUsage,
            trace: Trace::Off,
        }))?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = pick_format(&capabilities.formats)
            .ok_or_else(|| anyhow::anyhow!("surface reports no supported formats"))?;

        let size = window.inner_size();
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode: pick_alpha_mode(&capabilities.alpha_modes),
            view_formats: vec![],
        };
        surface.configure(&device, &surface_config);

        log::info!(
            "GPU initialized: {} ({:?}), surface format {format:?}",
            info.name,
            info.backend
        );

        Ok(Self {
            device,
            queue,
            surface,
            surface_config,
            format,
        })
    }

    /// Reconfigure the swapchain. Zero sizes (minimized window) are skipped.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
    }
}

/// First sRGB format, else whatever the surface lists first.
fn pick_format(formats: &[TextureFormat]) -> Option<TextureFormat> {
    formats
        .iter()
        .copied()
        .find(TextureFormat::is_srgb)
        .or_else(|| formats.first().copied())
}

fn pick_alpha_mode(modes: &[CompositeAlphaMode]) -> CompositeAlphaMode {
    if modes.contains(&CompositeAlphaMode::Opaque) {
        CompositeAlphaMode::Opaque
    } else {
        modes.first().copied().unwrap_or(CompositeAlphaMode::Auto)
    }
}

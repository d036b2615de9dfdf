use orbtrace_worker::{FrameLayouts, GpuProvider, InitError, WorkerState};

use crate::renderer::GpuRenderer;
use crate::shaders::ShaderSource;

/// Everything the host hands the worker in `initialize`.
///
/// The surface is created on the host thread from its window; ownership
/// moves to the worker with this value.
pub struct SurfaceHandoff {
    pub instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    /// Surface size at hand-off, used until the first resize arrives.
    pub width: u32,
    pub height: u32,
}

impl std::fmt::Debug for SurfaceHandoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceHandoff")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Acquires adapter and device for a handed-over surface.
#[derive(Debug, Clone)]
pub struct WgpuProvider {
    pub shader: ShaderSource,
    pub power_preference: wgpu::PowerPreference,
}

impl Default for WgpuProvider {
    fn default() -> Self {
        Self {
            shader: ShaderSource::Builtin,
            power_preference: wgpu::PowerPreference::HighPerformance,
        }
    }
}

impl WgpuProvider {
    pub fn new(shader: ShaderSource) -> Self {
        Self {
            shader,
            ..Self::default()
        }
    }
}

impl GpuProvider for WgpuProvider {
    type Surface = SurfaceHandoff;
    type Target = GpuRenderer;

    fn acquire(
        &mut self,
        handoff: SurfaceHandoff,
        state: &WorkerState,
        layouts: &FrameLayouts,
    ) -> Result<GpuRenderer, InitError> {
        let SurfaceHandoff {
            instance,
            surface,
            width,
            height,
        } = handoff;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: self.power_preference,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or(InitError::NoAdapter)?;
        let info = adapter.get_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "adapter acquired");

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("orbtrace_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .map_err(|e| InitError::Device(e.to_string()))?;

        let limits = device.limits();
        layouts
            .uniform
            .check_capacity(1, u64::from(limits.max_uniform_buffer_binding_size))?;
        layouts.entity.check_capacity(
            state.scene.len().max(1),
            u64::from(limits.max_storage_buffer_binding_size),
        )?;

        let caps = surface.get_capabilities(&adapter);
        let format = choose_format(&caps.formats).ok_or(InitError::IncompatibleSurface)?;
        let alpha_mode = choose_alpha_mode(&caps.alpha_modes);

        let (w, h) = if state.config.surface_width > 0 && state.config.surface_height > 0 {
            (state.config.surface_width, state.config.surface_height)
        } else {
            (width, height)
        };
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: w.max(1),
            height: h.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let source = self.shader.load()?;
        GpuRenderer::new(
            device,
            queue,
            surface,
            config,
            &source,
            layouts,
            state.scene.len(),
        )
    }
}

/// Prefer a non-sRGB format: the shader writes final display values.
fn choose_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .find(|f| !f.is_srgb())
        .or_else(|| formats.first())
        .copied()
}

/// Prefer an alpha mode that lets the transparent clear show through.
fn choose_alpha_mode(modes: &[wgpu::CompositeAlphaMode]) -> wgpu::CompositeAlphaMode {
    [
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::PostMultiplied,
    ]
    .into_iter()
    .find(|m| modes.contains(m))
    .or_else(|| modes.first().copied())
    .unwrap_or(wgpu::CompositeAlphaMode::Auto)
}

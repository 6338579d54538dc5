//! wgpu surface provider
//!
//! Renders straight into a wgpu surface on the host window. Each
//! `initialize` builds a fresh surface (the device survives), each
//! `render` clears and presents one frame, and `cleanup` drops the surface.

use crate::color::Color;
use crate::gpu::{GpuConfig, GpuContext};
use bridge_core::{NativeSurfaceHandle, SurfaceProvider, WgpuConfig, WindowIdentity};
use tracing::{debug, info, warn};
use wgpu::{Surface, SurfaceConfiguration, SurfaceError, TextureUsages};

/// Surface currently owned by the provider
struct ActiveSurface {
    surface: Surface<'static>,
    config: SurfaceConfiguration,
    handle: NativeSurfaceHandle,
}

pub struct WgpuSurfaceProvider {
    config: WgpuConfig,
    clear_color: Color,
    gpu: Option<GpuContext>,
    active: Option<ActiveSurface>,
    /// Last handle issued; handles are never reused
    generation: usize,
}

impl WgpuSurfaceProvider {
    pub fn new(config: WgpuConfig) -> Self {
        Self {
            clear_color: Color::from_hex(config.clear_color),
            config,
            gpu: None,
            active: None,
            generation: 0,
        }
    }

    fn gpu(&mut self) -> Option<&GpuContext> {
        if self.gpu.is_none() {
            let config = GpuConfig {
                low_power: self.config.low_power,
                ..GpuConfig::default()
            };
            match pollster::block_on(GpuContext::new(config)) {
                Ok(gpu) => self.gpu = Some(gpu),
                Err(e) => {
                    warn!("Failed to initialize GPU: {}", e);
                    return None;
                }
            }
        }
        self.gpu.as_ref()
    }

    fn next_handle(&mut self) -> Option<NativeSurfaceHandle> {
        self.generation += 1;
        NativeSurfaceHandle::from_raw(self.generation)
    }

    /// Surface currently alive, if any
    pub fn current(&self) -> Option<NativeSurfaceHandle> {
        self.active.as_ref().map(|active| active.handle)
    }
}

impl SurfaceProvider for WgpuSurfaceProvider {
    fn initialize(
        &mut self,
        window: WindowIdentity,
        width: i32,
        height: i32,
    ) -> Option<NativeSurfaceHandle> {
        if width <= 0 || height <= 0 {
            warn!("Refusing to create a {}x{} surface", width, height);
            return None;
        }
        if let Some(active) = &self.active {
            warn!("Surface {} still alive; refusing to create another", active.handle);
            return None;
        }

        let vsync = self.config.vsync;
        let gpu = self.gpu()?;

        // SAFETY: the lifecycle controller cleans this surface up before the
        // host window is destroyed.
        let surface = match unsafe { gpu.create_surface(&window) } {
            Ok(surface) => surface,
            Err(e) => {
                warn!("Failed to create surface: {}", e);
                return None;
            }
        };

        let caps = surface.get_capabilities(&gpu.adapter);
        let Some(format) = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first())
            .copied()
        else {
            warn!("Surface reports no usable formats");
            return None;
        };
        debug!("Surface format: {:?}", format);

        let config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width as u32,
            height: height as u32,
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            desired_maximum_frame_latency: 2,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
        };
        surface.configure(&gpu.device, &config);

        let handle = self.next_handle()?;
        info!("Created wgpu surface {} ({}x{})", handle, width, height);
        self.active = Some(ActiveSurface {
            surface,
            config,
            handle,
        });
        Some(handle)
    }

    fn render(&mut self) {
        let (Some(gpu), Some(active)) = (&self.gpu, &self.active) else {
            return;
        };

        let output = match active.surface.get_current_texture() {
            Ok(output) => output,
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                debug!("Surface {} outdated, reconfiguring", active.handle);
                active.surface.configure(&gpu.device, &active.config);
                return;
            }
            Err(e) => {
                warn!("Failed to acquire frame: {}", e);
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        {
            let _render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Clear Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn cleanup(&mut self) {
        if let Some(active) = self.active.take() {
            info!("Released wgpu surface {}", active.handle);
        }
    }
}

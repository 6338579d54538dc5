//! GPU Context - wgpu initialization
//!
//! Device and queue shared by every surface the wgpu provider creates.
//! Created once, on the first surface request, and kept across surface
//! loss so recovery only rebuilds the surface.

use crate::error::NativeError;
use bridge_core::WindowIdentity;
use tracing::{debug, info, warn};
use wgpu::{
    Adapter, Device, DeviceDescriptor, Features, Instance, InstanceDescriptor, Limits,
    PowerPreference, Queue, RequestAdapterOptions, Surface, SurfaceTargetUnsafe,
};

/// GPU configuration
#[derive(Debug, Clone)]
pub struct GpuConfig {
    /// Prefer low-power GPU (integrated) over high-performance (discrete)
    pub low_power: bool,
    /// Maximum texture dimension
    pub max_texture_dimension: u32,
}

impl Default for GpuConfig {
    fn default() -> Self {
        Self {
            low_power: true,
            max_texture_dimension: 8192,
        }
    }
}

/// wgpu instance, adapter, device and queue
pub struct GpuContext {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: Device,
    pub queue: Queue,
}

impl GpuContext {
    /// Create a new GPU context
    pub async fn new(config: GpuConfig) -> Result<Self, NativeError> {
        info!("Initializing GPU context (low_power: {})", config.low_power);

        let instance = Instance::new(&InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power_preference = if config.low_power {
            PowerPreference::LowPower
        } else {
            PowerPreference::HighPerformance
        };

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(NativeError::NoAdapter)?;

        let adapter_info = adapter.get_info();
        info!(
            "GPU adapter: {} ({:?})",
            adapter_info.name, adapter_info.backend
        );
        debug!(
            "GPU driver: {} (vendor: {})",
            adapter_info.driver, adapter_info.vendor
        );

        let limits = Limits {
            max_texture_dimension_2d: config.max_texture_dimension,
            ..Limits::downlevel_webgl2_defaults()
        };

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Surface Bridge Device"),
                    required_features: Features::empty(),
                    required_limits: limits,
                    memory_hints: wgpu::MemoryHints::MemoryUsage,
                },
                None,
            )
            .await
            .map_err(|e| NativeError::DeviceCreation(e.to_string()))?;

        device.on_uncaptured_error(Box::new(|error| {
            warn!("wgpu error: {}", error);
        }));

        info!("GPU context initialized successfully");

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
        })
    }

    /// Create a surface presenting to `window`.
    ///
    /// # Safety
    ///
    /// The window behind `window` must stay alive until the returned
    /// surface is dropped.
    pub unsafe fn create_surface(
        &self,
        window: &WindowIdentity,
    ) -> Result<Surface<'static>, NativeError> {
        let target = SurfaceTargetUnsafe::RawHandle {
            raw_display_handle: window.raw_display_handle(),
            raw_window_handle: window.raw_window_handle(),
        };
        let surface = unsafe { self.instance.create_surface_unsafe(target) }
            .map_err(|e| NativeError::Surface(e.to_string()))?;

        if !self.adapter.is_surface_supported(&surface) {
            return Err(NativeError::Surface(String::from(
                "adapter cannot present to this window",
            )));
        }
        Ok(surface)
    }
}

//! Surface Bridge Native Providers
//!
//! Concrete renderers behind the three-call surface contract:
//! - `DrawerLibrary`: a native drawer shared library (`Initialize`,
//!   `Render`, `Cleanup` C exports)
//! - `WgpuSurfaceProvider`: a wgpu surface on the host window, for running
//!   without a native drawer

mod color;
mod error;
mod gpu;
mod library;
mod wgpu_provider;

pub use color::Color;
pub use error::NativeError;
pub use gpu::{GpuConfig, GpuContext};
pub use library::DrawerLibrary;
pub use wgpu_provider::WgpuSurfaceProvider;

use bridge_core::{ProviderConfig, SurfaceProvider};

/// Build the provider selected by the configuration.
pub fn provider_from_config(
    config: &ProviderConfig,
) -> Result<Box<dyn SurfaceProvider>, NativeError> {
    match config {
        ProviderConfig::Wgpu(wgpu) => Ok(Box::new(WgpuSurfaceProvider::new(wgpu.clone()))),
        ProviderConfig::Library(library) => Ok(Box::new(DrawerLibrary::open(
            &library.path,
            &library.symbols,
        )?)),
    }
}

//! Surface Bridge Core
//!
//! Synchronizes a compositor's frame loop with a natively owned GPU
//! surface:
//! - Surface provider contract (create, draw, destroy)
//! - Interop binding of the native surface as the compositor's back buffer
//! - Render loop coordinator that only draws while the surface is valid
//! - Lifecycle controller driven by window-ready and availability events

mod binding;
mod compositor;
mod config;
mod geometry;
mod handle;
mod lifecycle;
mod provider;
mod render_loop;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use binding::{BindError, InteropSurfaceBinding};
pub use compositor::{FrameSource, FrameSubscription, ImageSource, ImageSourceLock};
pub use config::{
    BridgeConfig, ConfigError, LibraryConfig, ProviderConfig, SymbolNames, WgpuConfig,
    CONFIG_ENV_VAR,
};
pub use geometry::{DirtyRegion, PixelSize};
pub use handle::{NativeSurfaceHandle, WindowIdentity};
pub use lifecycle::{LifecycleController, LifecycleStats};
pub use provider::SurfaceProvider;
pub use render_loop::{FrameOutcome, LoopState, RenderLoopCoordinator};

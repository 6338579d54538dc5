//! Contract of the native renderer that owns the surface.

use crate::handle::{NativeSurfaceHandle, WindowIdentity};

/// The three entry points of a native surface renderer.
///
/// Implementations own at most one surface at a time. Callers must pair
/// every successful [`initialize`](Self::initialize) with a
/// [`cleanup`](Self::cleanup) before initializing again.
pub trait SurfaceProvider {
    /// Allocate a surface of `width` x `height` pixels presented through
    /// `window`. Returns `None` when no surface could be created; failures
    /// never unwind out of this call.
    fn initialize(
        &mut self,
        window: WindowIdentity,
        width: i32,
        height: i32,
    ) -> Option<NativeSurfaceHandle>;

    /// Draw one frame into the current surface. Only called while the
    /// compositor lock is held and a surface is bound.
    fn render(&mut self);

    /// Release every resource tied to the current surface.
    fn cleanup(&mut self);
}

impl<P: SurfaceProvider + ?Sized> SurfaceProvider for Box<P> {
    fn initialize(
        &mut self,
        window: WindowIdentity,
        width: i32,
        height: i32,
    ) -> Option<NativeSurfaceHandle> {
        (**self).initialize(window, width, height)
    }

    fn render(&mut self) {
        (**self).render()
    }

    fn cleanup(&mut self) {
        (**self).cleanup()
    }
}

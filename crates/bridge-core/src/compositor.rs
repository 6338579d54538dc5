//! Compositor-side seams: the image source that presents the native
//! surface, and the per-frame notification source.

use crate::geometry::{DirtyRegion, PixelSize};
use crate::handle::NativeSurfaceHandle;
use std::fmt;

/// A compositor image backed by an externally owned surface.
///
/// The compositor presents the front buffer while the back buffer is
/// written; mutations of the back buffer slot and drawing into it must
/// happen between [`lock`](Self::lock) and [`unlock`](Self::unlock).
pub trait ImageSource {
    /// Whether hardware composition of the front buffer is currently
    /// possible.
    fn is_front_buffer_available(&self) -> bool;

    /// Take the compositor's exclusive lock on the back buffer.
    fn lock(&mut self);

    /// Release the lock taken by [`lock`](Self::lock).
    fn unlock(&mut self);

    /// Point the back buffer at `surface`, or detach it with `None`.
    fn set_back_buffer(&mut self, surface: Option<NativeSurfaceHandle>);

    /// Mark a region of the back buffer as changed.
    fn add_dirty_rect(&mut self, region: DirtyRegion);

    /// Size of the image in pixels.
    fn pixel_size(&self) -> PixelSize;
}

/// Holds the image source lock for its lifetime.
pub struct ImageSourceLock<'a, S: ImageSource + ?Sized> {
    source: &'a mut S,
}

impl<'a, S: ImageSource + ?Sized> ImageSourceLock<'a, S> {
    pub fn acquire(source: &'a mut S) -> Self {
        source.lock();
        Self { source }
    }

    pub fn set_back_buffer(&mut self, surface: Option<NativeSurfaceHandle>) {
        self.source.set_back_buffer(surface);
    }

    pub fn add_dirty_rect(&mut self, region: DirtyRegion) {
        self.source.add_dirty_rect(region);
    }
}

impl<S: ImageSource + ?Sized> Drop for ImageSourceLock<'_, S> {
    fn drop(&mut self) {
        self.source.unlock();
    }
}

/// Token identifying one per-frame subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSubscription(pub u64);

impl fmt::Display for FrameSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of the compositor's "about to render a frame" notifications.
pub trait FrameSource {
    /// Start delivering per-frame notifications.
    fn subscribe(&mut self) -> FrameSubscription;

    /// Stop delivering notifications for `subscription`.
    fn unsubscribe(&mut self, subscription: FrameSubscription);
}

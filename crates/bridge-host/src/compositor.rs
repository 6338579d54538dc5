//! Host-side compositor state
//!
//! The host window plays the compositor: it owns the front buffer
//! availability flag, the back buffer slot, and the frame clock that
//! hands out per-frame subscriptions.

use bridge_core::{
    DirtyRegion, FrameSource, FrameSubscription, ImageSource, NativeSurfaceHandle, PixelSize,
};
use tracing::{debug, trace, warn};

/// Image source backed by the host window.
#[derive(Debug)]
pub struct WindowImageSource {
    size: PixelSize,
    front_buffer_available: bool,
    locked: bool,
    back_buffer: Option<NativeSurfaceHandle>,
    /// Regions invalidated since the last present
    dirty: Vec<DirtyRegion>,
    presented_frames: u64,
}

impl WindowImageSource {
    pub fn new(size: PixelSize) -> Self {
        Self {
            size,
            front_buffer_available: true,
            locked: false,
            back_buffer: None,
            dirty: Vec::new(),
            presented_frames: 0,
        }
    }

    /// Update the availability flag. Returns `true` if it changed.
    pub fn set_front_buffer_available(&mut self, available: bool) -> bool {
        if self.front_buffer_available == available {
            return false;
        }
        debug!("Front buffer available: {}", available);
        self.front_buffer_available = available;
        true
    }

    /// Hand the accumulated dirty regions to presentation.
    pub fn present(&mut self) -> Vec<DirtyRegion> {
        if self.dirty.is_empty() {
            return Vec::new();
        }
        self.presented_frames += 1;
        trace!(
            "Presenting frame {} ({} dirty regions)",
            self.presented_frames,
            self.dirty.len()
        );
        std::mem::take(&mut self.dirty)
    }

    pub fn back_buffer(&self) -> Option<NativeSurfaceHandle> {
        self.back_buffer
    }

    pub fn presented_frames(&self) -> u64 {
        self.presented_frames
    }
}

impl ImageSource for WindowImageSource {
    fn is_front_buffer_available(&self) -> bool {
        self.front_buffer_available
    }

    fn lock(&mut self) {
        debug_assert!(!self.locked, "image source locked twice");
        self.locked = true;
    }

    fn unlock(&mut self) {
        debug_assert!(self.locked, "unlock without lock");
        self.locked = false;
    }

    fn set_back_buffer(&mut self, surface: Option<NativeSurfaceHandle>) {
        if !self.locked {
            warn!("Back buffer changed outside the lock");
        }
        // A new back buffer invalidates whatever the old one reported
        self.dirty.clear();
        self.back_buffer = surface;
    }

    fn add_dirty_rect(&mut self, region: DirtyRegion) {
        if self.back_buffer.is_none() {
            warn!("Dirty rect {:?} without a back buffer", region);
            return;
        }
        self.dirty.push(region);
    }

    fn pixel_size(&self) -> PixelSize {
        self.size
    }
}

/// Per-frame notification source driven by the window's redraw cycle.
#[derive(Debug, Default)]
pub struct FrameClock {
    next_id: u64,
    subscriber: Option<FrameSubscription>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether redraws should keep being requested
    pub fn is_subscribed(&self) -> bool {
        self.subscriber.is_some()
    }
}

impl FrameSource for FrameClock {
    fn subscribe(&mut self) -> FrameSubscription {
        self.next_id += 1;
        let subscription = FrameSubscription(self.next_id);
        if let Some(previous) = self.subscriber.replace(subscription) {
            warn!("Frame subscription {} replaced by {}", previous, subscription);
        }
        subscription
    }

    fn unsubscribe(&mut self, subscription: FrameSubscription) {
        if self.subscriber == Some(subscription) {
            self.subscriber = None;
        } else {
            warn!("Unknown frame subscription {}", subscription);
        }
    }
}

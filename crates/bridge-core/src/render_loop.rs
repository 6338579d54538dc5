//! Render Loop Coordinator
//!
//! Owns the per-frame subscription. While active, each compositor frame
//! draws the native surface under the compositor lock and invalidates the
//! whole image.

use crate::binding::InteropSurfaceBinding;
use crate::compositor::{FrameSource, FrameSubscription, ImageSource, ImageSourceLock};
use crate::geometry::DirtyRegion;
use crate::provider::SurfaceProvider;
use tracing::{debug, trace};

/// Subscription state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Not subscribed to frame notifications
    Idle,
    /// Subscribed; frames draw into the bound surface
    Active(FrameSubscription),
}

/// What happened on one frame notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Drew a frame and invalidated the region
    Rendered(DirtyRegion),
    /// Availability dropped before teardown caught up; nothing drawn
    SkippedUnavailable,
    /// No subscription, nothing drawn
    Idle,
}

#[derive(Debug)]
pub struct RenderLoopCoordinator {
    state: LoopState,
    frames_rendered: u64,
    frames_skipped: u64,
}

impl RenderLoopCoordinator {
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            frames_rendered: 0,
            frames_skipped: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, LoopState::Active(_))
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    /// Subscribe to frame notifications. Returns `false` if already active.
    pub fn activate<F>(&mut self, frames: &mut F) -> bool
    where
        F: FrameSource + ?Sized,
    {
        if self.is_active() {
            return false;
        }
        let subscription = frames.subscribe();
        self.state = LoopState::Active(subscription);
        debug!("Render loop active (subscription {})", subscription);
        true
    }

    /// Drop the frame subscription. Returns `false` if already idle.
    pub fn deactivate<F>(&mut self, frames: &mut F) -> bool
    where
        F: FrameSource + ?Sized,
    {
        match self.state {
            LoopState::Idle => false,
            LoopState::Active(subscription) => {
                frames.unsubscribe(subscription);
                self.state = LoopState::Idle;
                debug!(
                    "Render loop idle ({} frames rendered, {} skipped)",
                    self.frames_rendered, self.frames_skipped
                );
                true
            }
        }
    }

    /// Handle one frame notification.
    ///
    /// Availability is re-read on every frame: a notification can arrive
    /// after the front buffer was lost but before the teardown ran, and the
    /// native handle may already be invalid by then.
    pub fn on_frame<S, P>(
        &mut self,
        source: &mut S,
        provider: &mut P,
        binding: &InteropSurfaceBinding,
    ) -> FrameOutcome
    where
        S: ImageSource + ?Sized,
        P: SurfaceProvider + ?Sized,
    {
        if !self.is_active() {
            return FrameOutcome::Idle;
        }
        if !source.is_front_buffer_available() {
            self.frames_skipped += 1;
            trace!("Front buffer unavailable, skipping frame");
            return FrameOutcome::SkippedUnavailable;
        }
        debug_assert!(binding.is_bound(), "render loop active without a bound surface");
        if !binding.is_bound() {
            return FrameOutcome::Idle;
        }

        let region = DirtyRegion::full(source.pixel_size());
        {
            let mut lock = ImageSourceLock::acquire(source);
            provider.render();
            lock.add_dirty_rect(region);
        }

        self.frames_rendered += 1;
        trace!("Rendered frame {}", self.frames_rendered);
        FrameOutcome::Rendered(region)
    }
}

impl Default for RenderLoopCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

//! Lifecycle Controller
//!
//! Creates and tears down the native surface in response to two
//! compositor events:
//! 1. Window-ready: the hosting window has a native handle (fires once)
//! 2. Availability-changed: the front buffer became usable or was lost
//!
//! Bring-up order is initialize, bind, subscribe. Teardown order is
//! unsubscribe, unbind, cleanup. At most one surface exists at a time.

use crate::binding::InteropSurfaceBinding;
use crate::compositor::{FrameSource, ImageSource};
use crate::geometry::PixelSize;
use crate::handle::{NativeSurfaceHandle, WindowIdentity};
use crate::provider::SurfaceProvider;
use crate::render_loop::{FrameOutcome, LoopState, RenderLoopCoordinator};
use tracing::{debug, error, info, warn};

/// Counters of lifecycle transitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleStats {
    /// `initialize` calls issued to the provider
    pub initializations: u64,
    /// `initialize` calls that returned no surface
    pub creation_failures: u64,
    /// `cleanup` calls issued to the provider
    pub cleanups: u64,
    /// Bring-ups refused because a surface was still live
    pub rejected_binds: u64,
    /// Frames drawn
    pub frames_rendered: u64,
    /// Frames skipped because the front buffer was gone
    pub frames_skipped: u64,
}

pub struct LifecycleController<P: SurfaceProvider> {
    /// Native renderer
    provider: P,
    /// Surface size, fixed at construction
    size: PixelSize,
    /// Hosting window, set once on window-ready
    window: Option<WindowIdentity>,
    /// The one live native surface, owned until cleanup
    surface: Option<NativeSurfaceHandle>,
    /// `initialize` was issued and no `cleanup` has followed yet. Stays set
    /// after a failed creation: the provider may hold partial resources.
    needs_cleanup: bool,
    binding: InteropSurfaceBinding,
    render_loop: RenderLoopCoordinator,
    stats: LifecycleStats,
}

impl<P: SurfaceProvider> LifecycleController<P> {
    pub fn new(provider: P, size: PixelSize) -> Self {
        Self {
            provider,
            size,
            window: None,
            surface: None,
            needs_cleanup: false,
            binding: InteropSurfaceBinding::new(size),
            render_loop: RenderLoopCoordinator::new(),
            stats: LifecycleStats::default(),
        }
    }

    /// The hosting window obtained its native handle.
    ///
    /// Availability may have settled to true before any handle existed, so
    /// this forces an availability evaluation.
    pub fn on_window_ready<S, F>(&mut self, window: WindowIdentity, source: &mut S, frames: &mut F)
    where
        S: ImageSource + ?Sized,
        F: FrameSource + ?Sized,
    {
        if let Some(existing) = self.window {
            warn!(
                "Window already realized ({:?}); ignoring second ready event",
                existing.native_ptr()
            );
            return;
        }

        info!("Window ready ({:?})", window.native_ptr());
        self.window = Some(window);
        self.on_availability_changed(source, frames);
    }

    /// The compositor's front buffer availability flipped.
    pub fn on_availability_changed<S, F>(&mut self, source: &mut S, frames: &mut F)
    where
        S: ImageSource + ?Sized,
        F: FrameSource + ?Sized,
    {
        if source.is_front_buffer_available() {
            self.bring_up(source, frames);
        } else {
            self.tear_down(source, frames);
        }
    }

    /// Deliver one compositor frame notification.
    pub fn on_frame<S>(&mut self, source: &mut S) -> FrameOutcome
    where
        S: ImageSource + ?Sized,
    {
        let outcome = self
            .render_loop
            .on_frame(source, &mut self.provider, &self.binding);
        self.stats.frames_rendered = self.render_loop.frames_rendered();
        self.stats.frames_skipped = self.render_loop.frames_skipped();
        outcome
    }

    /// The hosting window is resized. The surface keeps its configured size.
    pub fn on_resize(&mut self, width: u32, height: u32) {
        debug!(
            "Window resized to {}x{}; surface stays at {}",
            width, height, self.size
        );
    }

    /// The hosting window is closing; release the native surface.
    pub fn shutdown<S, F>(&mut self, source: &mut S, frames: &mut F)
    where
        S: ImageSource + ?Sized,
        F: FrameSource + ?Sized,
    {
        if self.needs_cleanup || self.render_loop.is_active() {
            info!("Releasing native surface before window closes");
            self.tear_down(source, frames);
        }
    }

    fn bring_up<S, F>(&mut self, source: &mut S, frames: &mut F)
    where
        S: ImageSource + ?Sized,
        F: FrameSource + ?Sized,
    {
        let Some(window) = self.window else {
            debug!("Front buffer available before window is ready; deferring");
            return;
        };

        if self.needs_cleanup {
            // A second bring-up without a teardown would leak the first
            // surface, or whatever a failed initialize left behind.
            error!(
                "Surface {:?} not yet cleaned up; ignoring duplicate availability",
                self.surface
            );
            self.stats.rejected_binds += 1;
            return;
        }

        info!("Creating native surface ({})", self.size);
        self.stats.initializations += 1;
        self.needs_cleanup = true;
        let Some(handle) = self
            .provider
            .initialize(window, self.size.width, self.size.height)
        else {
            warn!("Native surface creation failed; waiting for next availability change");
            self.stats.creation_failures += 1;
            return;
        };
        self.surface = Some(handle);

        match self.binding.bind(source, handle) {
            Ok(()) => {
                self.render_loop.activate(frames);
                info!("Surface {} bound, render loop active", handle);
            }
            Err(err) => {
                error!("Failed to bind surface {}: {}", handle, err);
                self.surface = None;
                self.release();
            }
        }
    }

    fn tear_down<S, F>(&mut self, source: &mut S, frames: &mut F)
    where
        S: ImageSource + ?Sized,
        F: FrameSource + ?Sized,
    {
        // Stop frames before the handle goes away
        self.render_loop.deactivate(frames);
        self.binding.unbind(source);

        let surface = self.surface.take();
        if self.needs_cleanup {
            self.release();
            match surface {
                Some(handle) => info!("Native surface {} released", handle),
                None => info!("Native renderer cleaned up after failed creation"),
            }
        }
    }

    fn release(&mut self) {
        self.provider.cleanup();
        self.needs_cleanup = false;
        self.stats.cleanups += 1;
    }

    pub fn state(&self) -> LoopState {
        self.render_loop.state()
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_bound()
    }

    pub fn surface(&self) -> Option<NativeSurfaceHandle> {
        self.surface
    }

    pub fn window(&self) -> Option<WindowIdentity> {
        self.window
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }

    pub fn stats(&self) -> LifecycleStats {
        self.stats
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DirtyRegion;
    use crate::testing::{
        test_window, Call, Recorder, RecordingFrameSource, RecordingImageSource,
        RecordingProvider,
    };

    const SIZE: PixelSize = PixelSize::new(800, 600);

    struct Harness {
        recorder: Recorder,
        source: RecordingImageSource,
        frames: RecordingFrameSource,
        controller: LifecycleController<RecordingProvider>,
    }

    impl Harness {
        fn new() -> Self {
            let recorder = Recorder::new();
            Self {
                source: recorder.image_source(SIZE),
                frames: recorder.frame_source(),
                controller: LifecycleController::new(recorder.provider(), SIZE),
                recorder,
            }
        }

        fn provider_mut(&mut self) -> &mut RecordingProvider {
            &mut self.controller.provider
        }

        fn window_ready(&mut self) {
            self.controller
                .on_window_ready(test_window(0x42), &mut self.source, &mut self.frames);
        }

        fn set_available(&mut self, available: bool) {
            self.source.set_available(available);
            self.controller
                .on_availability_changed(&mut self.source, &mut self.frames);
        }

        fn frame(&mut self) -> FrameOutcome {
            self.controller.on_frame(&mut self.source)
        }
    }

    #[test]
    fn test_window_ready_while_unavailable_then_available() {
        let mut h = Harness::new();
        h.source.set_available(false);
        h.window_ready();

        assert_eq!(h.recorder.initializations(), 0);
        assert_eq!(h.controller.state(), LoopState::Idle);

        h.set_available(true);

        assert_eq!(
            h.recorder.count(|c| *c
                == Call::Initialize {
                    window: test_window(0x42),
                    width: 800,
                    height: 600,
                }),
            1
        );
        assert_eq!(h.recorder.initializations(), 1);
        assert_eq!(h.recorder.binds(), 1);
        assert!(matches!(h.controller.state(), LoopState::Active(_)));
        assert!(h.controller.is_bound());
    }

    #[test]
    fn test_window_ready_forces_initialization() {
        let mut h = Harness::new();
        h.window_ready();

        assert_eq!(h.recorder.initializations(), 1);
        assert!(matches!(h.controller.state(), LoopState::Active(_)));
        assert_eq!(h.source.back_buffer(), h.controller.surface());
    }

    #[test]
    fn test_availability_before_window_is_deferred() {
        let mut h = Harness::new();
        h.set_available(true);

        assert_eq!(h.recorder.initializations(), 0);
        assert_eq!(h.controller.state(), LoopState::Idle);

        h.window_ready();
        assert_eq!(h.recorder.initializations(), 1);
    }

    #[test]
    fn test_second_window_ready_is_ignored() {
        let mut h = Harness::new();
        h.window_ready();
        h.controller
            .on_window_ready(test_window(0x99), &mut h.source, &mut h.frames);

        assert_eq!(h.controller.window(), Some(test_window(0x42)));
        assert_eq!(h.recorder.initializations(), 1);
    }

    #[test]
    fn test_creation_failure_stays_idle() {
        let mut h = Harness::new();
        h.provider_mut().fail_next();
        h.window_ready();

        assert_eq!(h.recorder.initializations(), 1);
        assert_eq!(h.recorder.binds(), 0);
        assert_eq!(h.recorder.subscriptions(), 0);
        assert_eq!(h.controller.state(), LoopState::Idle);
        assert_eq!(h.controller.stats().creation_failures, 1);

        // No automatic retry
        assert_eq!(h.frame(), FrameOutcome::Idle);
        assert_eq!(h.recorder.initializations(), 1);
        assert_eq!(h.recorder.renders(), 0);
    }

    #[test]
    fn test_creation_failure_recovers_on_next_availability() {
        let mut h = Harness::new();
        h.provider_mut().fail_next();
        h.window_ready();

        h.set_available(false);
        h.set_available(true);

        assert_eq!(h.recorder.initializations(), 2);
        assert_eq!(h.recorder.cleanups(), 1);
        assert!(matches!(h.controller.state(), LoopState::Active(_)));

        let lifecycle: Vec<Call> = h
            .recorder
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Initialize { .. } | Call::Cleanup))
            .collect();
        assert!(matches!(lifecycle[0], Call::Initialize { .. }));
        assert_eq!(lifecycle[1], Call::Cleanup);
        assert!(matches!(lifecycle[2], Call::Initialize { .. }));
    }

    #[test]
    fn test_failed_creation_is_cleaned_up_without_unbind() {
        let mut h = Harness::new();
        h.provider_mut().fail_next();
        h.window_ready();
        h.recorder.clear();

        h.set_available(false);

        // Nothing was bound or subscribed, so cleanup is the only call
        assert_eq!(h.recorder.calls(), vec![Call::Cleanup]);
        assert_eq!(h.controller.stats().cleanups, 1);
    }

    #[test]
    fn test_duplicate_availability_after_failure_is_rejected() {
        let mut h = Harness::new();
        h.provider_mut().fail_next();
        h.window_ready();

        h.set_available(true);

        assert_eq!(h.recorder.initializations(), 1);
        assert_eq!(h.controller.stats().rejected_binds, 1);
        assert_eq!(h.controller.state(), LoopState::Idle);
    }

    #[test]
    fn test_shutdown_after_failed_creation_cleans_up() {
        let mut h = Harness::new();
        h.provider_mut().fail_next();
        h.window_ready();

        h.controller.shutdown(&mut h.source, &mut h.frames);
        h.controller.shutdown(&mut h.source, &mut h.frames);

        assert_eq!(h.recorder.cleanups(), 1);
    }

    #[test]
    fn test_teardown_unsubscribes_before_unbind_and_cleanup() {
        let mut h = Harness::new();
        h.window_ready();
        h.recorder.clear();

        h.set_available(false);

        let unsubscribe = h
            .recorder
            .position(|c| matches!(c, Call::Unsubscribe(_)))
            .unwrap();
        let unbind = h
            .recorder
            .position(|c| *c == Call::SetBackBuffer(None))
            .unwrap();
        let cleanup = h.recorder.position(|c| *c == Call::Cleanup).unwrap();
        assert!(unsubscribe < unbind);
        assert!(unbind < cleanup);
        assert_eq!(h.controller.state(), LoopState::Idle);
        assert!(!h.controller.is_bound());
        assert_eq!(h.controller.surface(), None);

        // A frame delivered in the same tick draws nothing
        assert_eq!(h.frame(), FrameOutcome::Idle);
        assert_eq!(h.recorder.renders(), 0);
    }

    #[test]
    fn test_frame_racing_teardown_is_skipped() {
        let mut h = Harness::new();
        h.window_ready();
        assert!(matches!(h.frame(), FrameOutcome::Rendered(_)));

        // Flag drops; the frame notification wins the race with teardown
        h.source.set_available(false);
        assert_eq!(h.frame(), FrameOutcome::SkippedUnavailable);
        assert_eq!(h.recorder.renders(), 1);

        h.controller
            .on_availability_changed(&mut h.source, &mut h.frames);
        assert_eq!(h.controller.stats().frames_skipped, 1);
        assert_eq!(h.recorder.cleanups(), 1);
    }

    #[test]
    fn test_frames_render_full_surface() {
        let mut h = Harness::new();
        h.window_ready();

        for _ in 0..3 {
            assert_eq!(h.frame(), FrameOutcome::Rendered(DirtyRegion::full(SIZE)));
        }
        assert_eq!(h.recorder.renders(), 3);
        assert_eq!(h.controller.stats().frames_rendered, 3);
        assert!(!h.source.is_locked());
    }

    #[test]
    fn test_duplicate_availability_does_not_leak_surface() {
        let mut h = Harness::new();
        h.window_ready();
        let first = h.controller.surface();

        h.set_available(true);

        assert_eq!(h.recorder.initializations(), 1);
        assert_eq!(h.recorder.binds(), 1);
        assert_eq!(h.recorder.subscriptions(), 1);
        assert_eq!(h.controller.surface(), first);
        assert_eq!(h.controller.stats().rejected_binds, 1);
        assert!(matches!(h.controller.state(), LoopState::Active(_)));
    }

    #[test]
    fn test_flip_sequences_pair_initialize_with_cleanup() {
        // (availability flips, indices of the rises whose initialize fails)
        let cases: [(&[bool], &[usize]); 8] = [
            (&[true, false, true, false], &[]),
            (&[false, true, true, false, false, true], &[]),
            (&[true, false, false, true, false, true, true, false], &[]),
            (&[false, false, true], &[]),
            (&[true, false, true, false], &[0]),
            (&[true, false, true, false, true, false], &[0, 1]),
            (&[true, true, false, true, false, true], &[1]),
            (&[true, false, true, false, true], &[0, 2]),
        ];

        for (flips, failing_rises) in cases {
            let mut h = Harness::new();
            h.source.set_available(false);
            h.window_ready();

            let mut available = false;
            let mut rises = 0;
            let mut falls = 0;
            for &flip in flips {
                if flip != available {
                    if flip {
                        if failing_rises.contains(&rises) {
                            h.provider_mut().fail_next();
                        }
                        rises += 1;
                    } else {
                        falls += 1;
                    }
                    available = flip;
                    h.set_available(flip);
                }
                // Frame after every event: never draws while unavailable
                let renders_before = h.recorder.renders();
                h.frame();
                if !available {
                    assert_eq!(h.recorder.renders(), renders_before);
                }
            }

            assert_eq!(h.recorder.initializations(), rises, "flips {:?}", flips);
            assert_eq!(h.recorder.cleanups(), falls, "flips {:?}", flips);
            assert_eq!(
                h.controller.stats().creation_failures,
                failing_rises.len() as u64,
                "flips {:?}",
                flips
            );

            let lifecycle: Vec<Call> = h
                .recorder
                .calls()
                .into_iter()
                .filter(|c| matches!(c, Call::Initialize { .. } | Call::Cleanup))
                .collect();
            for (i, call) in lifecycle.iter().enumerate() {
                if i % 2 == 0 {
                    assert!(matches!(call, Call::Initialize { .. }), "flips {:?}", flips);
                } else {
                    assert_eq!(*call, Call::Cleanup, "flips {:?}", flips);
                }
            }
        }
    }

    #[test]
    fn test_unbind_precedes_cleanup_every_cycle() {
        let mut h = Harness::new();
        h.window_ready();
        for _ in 0..3 {
            h.set_available(false);
            h.set_available(true);
        }
        h.set_available(false);

        let calls = h.recorder.calls();
        let mut bound = false;
        for call in &calls {
            match call {
                Call::SetBackBuffer(Some(_)) => bound = true,
                Call::SetBackBuffer(None) => bound = false,
                Call::Cleanup => assert!(!bound, "cleanup while bound: {:?}", calls),
                _ => {}
            }
        }
        assert_eq!(h.recorder.cleanups(), 4);
    }

    #[test]
    fn test_shutdown_releases_surface_once() {
        let mut h = Harness::new();
        h.window_ready();

        h.controller.shutdown(&mut h.source, &mut h.frames);
        h.controller.shutdown(&mut h.source, &mut h.frames);

        assert_eq!(h.recorder.cleanups(), 1);
        assert_eq!(h.frames.active_subscriptions(), 0);
        assert_eq!(h.source.back_buffer(), None);
        assert_eq!(h.controller.provider().live_surface(), None);
    }

    #[test]
    fn test_shutdown_without_surface_is_noop() {
        let mut h = Harness::new();
        h.controller.shutdown(&mut h.source, &mut h.frames);
        assert!(h.recorder.calls().is_empty());
    }

    #[test]
    fn test_resize_keeps_surface_size() {
        let mut h = Harness::new();
        h.window_ready();
        h.controller.on_resize(1920, 1080);

        assert_eq!(h.controller.size(), SIZE);
        assert_eq!(h.frame(), FrameOutcome::Rendered(DirtyRegion::full(SIZE)));
    }
}

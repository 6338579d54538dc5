//! Recording doubles for the provider and compositor seams.
//!
//! Every double created from one [`Recorder`] appends to the same call log,
//! so tests can assert ordering across the native and compositor sides.

use crate::compositor::{FrameSource, FrameSubscription, ImageSource};
use crate::geometry::{DirtyRegion, PixelSize};
use crate::handle::{NativeSurfaceHandle, WindowIdentity};
use crate::provider::SurfaceProvider;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle, Win32WindowHandle, WindowsDisplayHandle};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::num::NonZeroIsize;
use std::rc::Rc;

/// One observable call across the seams.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Initialize {
        window: WindowIdentity,
        width: i32,
        height: i32,
    },
    Render,
    Cleanup,
    Lock,
    Unlock,
    SetBackBuffer(Option<NativeSurfaceHandle>),
    AddDirtyRect(DirtyRegion),
    Subscribe(FrameSubscription),
    Unsubscribe(FrameSubscription),
}

/// Shared call log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Rc<RefCell<Vec<Call>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    /// Snapshot of every call so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Number of calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|call| predicate(*call)).count()
    }

    /// Index of the first call matching `predicate`.
    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls.borrow().iter().position(predicate)
    }

    pub fn initializations(&self) -> usize {
        self.count(|call| matches!(call, Call::Initialize { .. }))
    }

    pub fn renders(&self) -> usize {
        self.count(|call| matches!(call, Call::Render))
    }

    pub fn cleanups(&self) -> usize {
        self.count(|call| matches!(call, Call::Cleanup))
    }

    pub fn subscriptions(&self) -> usize {
        self.count(|call| matches!(call, Call::Subscribe(_)))
    }

    /// Back buffer assignments of a real surface.
    pub fn binds(&self) -> usize {
        self.count(|call| matches!(call, Call::SetBackBuffer(Some(_))))
    }

    pub fn provider(&self) -> RecordingProvider {
        RecordingProvider {
            recorder: self.clone(),
            next_handle: 0x1000,
            failures: VecDeque::new(),
            live: None,
        }
    }

    pub fn image_source(&self, size: PixelSize) -> RecordingImageSource {
        RecordingImageSource {
            recorder: self.clone(),
            size,
            available: true,
            locked: false,
            back_buffer: None,
        }
    }

    pub fn frame_source(&self) -> RecordingFrameSource {
        RecordingFrameSource {
            recorder: self.clone(),
            next_id: 1,
            active: Vec::new(),
        }
    }
}

/// A window identity that points nowhere, for driving the controller.
pub fn test_window(hwnd: isize) -> WindowIdentity {
    let hwnd = NonZeroIsize::new(hwnd).unwrap_or(NonZeroIsize::MIN);
    WindowIdentity::new(
        RawWindowHandle::Win32(Win32WindowHandle::new(hwnd)),
        RawDisplayHandle::Windows(WindowsDisplayHandle::new()),
    )
}

/// Provider double that hands out increasing handles.
#[derive(Debug)]
pub struct RecordingProvider {
    recorder: Recorder,
    next_handle: usize,
    failures: VecDeque<bool>,
    live: Option<NativeSurfaceHandle>,
}

impl RecordingProvider {
    /// Make the next `initialize` call report failure.
    pub fn fail_next(&mut self) {
        self.failures.push_back(true);
    }

    /// Surface created and not yet cleaned up.
    pub fn live_surface(&self) -> Option<NativeSurfaceHandle> {
        self.live
    }
}

impl SurfaceProvider for RecordingProvider {
    fn initialize(
        &mut self,
        window: WindowIdentity,
        width: i32,
        height: i32,
    ) -> Option<NativeSurfaceHandle> {
        self.recorder.push(Call::Initialize { window, width, height });
        assert!(
            self.live.is_none(),
            "initialize called while {:?} is still live",
            self.live
        );
        if self.failures.pop_front().unwrap_or(false) {
            return None;
        }
        self.next_handle += 0x10;
        self.live = NativeSurfaceHandle::from_raw(self.next_handle);
        self.live
    }

    fn render(&mut self) {
        assert!(self.live.is_some(), "render called without a live surface");
        self.recorder.push(Call::Render);
    }

    fn cleanup(&mut self) {
        self.recorder.push(Call::Cleanup);
        self.live = None;
    }
}

/// Image source double with a settable availability flag.
#[derive(Debug)]
pub struct RecordingImageSource {
    recorder: Recorder,
    size: PixelSize,
    available: bool,
    locked: bool,
    back_buffer: Option<NativeSurfaceHandle>,
}

impl RecordingImageSource {
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn back_buffer(&self) -> Option<NativeSurfaceHandle> {
        self.back_buffer
    }
}

impl ImageSource for RecordingImageSource {
    fn is_front_buffer_available(&self) -> bool {
        self.available
    }

    fn lock(&mut self) {
        assert!(!self.locked, "image source locked twice");
        self.locked = true;
        self.recorder.push(Call::Lock);
    }

    fn unlock(&mut self) {
        assert!(self.locked, "unlock without lock");
        self.locked = false;
        self.recorder.push(Call::Unlock);
    }

    fn set_back_buffer(&mut self, surface: Option<NativeSurfaceHandle>) {
        assert!(self.locked, "back buffer changed outside the lock");
        self.back_buffer = surface;
        self.recorder.push(Call::SetBackBuffer(surface));
    }

    fn add_dirty_rect(&mut self, region: DirtyRegion) {
        assert!(self.locked, "dirty rect added outside the lock");
        self.recorder.push(Call::AddDirtyRect(region));
    }

    fn pixel_size(&self) -> PixelSize {
        self.size
    }
}

/// Frame source double tracking live subscriptions.
#[derive(Debug)]
pub struct RecordingFrameSource {
    recorder: Recorder,
    next_id: u64,
    active: Vec<FrameSubscription>,
}

impl RecordingFrameSource {
    pub fn active_subscriptions(&self) -> usize {
        self.active.len()
    }
}

impl FrameSource for RecordingFrameSource {
    fn subscribe(&mut self) -> FrameSubscription {
        let subscription = FrameSubscription(self.next_id);
        self.next_id += 1;
        self.active.push(subscription);
        self.recorder.push(Call::Subscribe(subscription));
        subscription
    }

    fn unsubscribe(&mut self, subscription: FrameSubscription) {
        self.active.retain(|s| *s != subscription);
        self.recorder.push(Call::Unsubscribe(subscription));
    }
}

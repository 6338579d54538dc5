//! Native handles crossing the renderer boundary.

use raw_window_handle::{
    DisplayHandle, HandleError, HasDisplayHandle, HasWindowHandle, RawDisplayHandle,
    RawWindowHandle, WindowHandle,
};
use std::ffi::c_void;
use std::fmt;
use std::num::NonZeroUsize;

/// Opaque reference to a GPU surface owned by the native renderer.
///
/// The renderer signals failure with a zero pointer, so a zero handle is
/// unrepresentable here: raw constructors return `None` instead.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeSurfaceHandle(NonZeroUsize);

impl NativeSurfaceHandle {
    /// Wrap a pointer returned by the native renderer.
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        Self::from_raw(ptr as usize)
    }

    /// Wrap a raw handle value. Zero means creation failed.
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    /// Raw handle value.
    pub fn get(self) -> usize {
        self.0.get()
    }

    /// Handle as a pointer for handing back across the ABI.
    pub fn as_ptr(self) -> *mut c_void {
        self.0.get() as *mut c_void
    }
}

impl fmt::Debug for NativeSurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeSurfaceHandle({:#x})", self.0.get())
    }
}

impl fmt::Display for NativeSurfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0.get())
    }
}

/// Native identity of the hosting window.
///
/// Captured once, when the window is first realized, and never changes
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowIdentity {
    window: RawWindowHandle,
    display: RawDisplayHandle,
}

impl WindowIdentity {
    pub fn new(window: RawWindowHandle, display: RawDisplayHandle) -> Self {
        Self { window, display }
    }

    /// Capture the identity of a realized window.
    pub fn from_window<W>(window: &W) -> Result<Self, HandleError>
    where
        W: HasWindowHandle + HasDisplayHandle + ?Sized,
    {
        let window_handle = window.window_handle()?.as_raw();
        let display_handle = window.display_handle()?.as_raw();
        Ok(Self::new(window_handle, display_handle))
    }

    pub fn raw_window_handle(&self) -> RawWindowHandle {
        self.window
    }

    pub fn raw_display_handle(&self) -> RawDisplayHandle {
        self.display
    }

    /// Platform window reference passed to the native renderer: the HWND on
    /// Windows, the X11 window id, the Wayland surface or the NSView/UIView.
    /// Null for platforms without a single pointer-sized window reference.
    pub fn native_ptr(&self) -> *mut c_void {
        match self.window {
            RawWindowHandle::Win32(handle) => handle.hwnd.get() as *mut c_void,
            RawWindowHandle::Xlib(handle) => handle.window as usize as *mut c_void,
            RawWindowHandle::Xcb(handle) => handle.window.get() as usize as *mut c_void,
            RawWindowHandle::Wayland(handle) => handle.surface.as_ptr(),
            RawWindowHandle::AppKit(handle) => handle.ns_view.as_ptr(),
            RawWindowHandle::UiKit(handle) => handle.ui_view.as_ptr(),
            _ => std::ptr::null_mut(),
        }
    }
}

impl HasWindowHandle for WindowIdentity {
    fn window_handle(&self) -> Result<WindowHandle<'_>, HandleError> {
        // SAFETY: the identity is only constructed from a realized window,
        // and the lifecycle controller tears every surface down before that
        // window is destroyed.
        Ok(unsafe { WindowHandle::borrow_raw(self.window) })
    }
}

impl HasDisplayHandle for WindowIdentity {
    fn display_handle(&self) -> Result<DisplayHandle<'_>, HandleError> {
        // SAFETY: see `window_handle`.
        Ok(unsafe { DisplayHandle::borrow_raw(self.display) })
    }
}

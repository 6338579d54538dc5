//! Interop binding of a native surface as the compositor's back buffer.

use crate::compositor::{ImageSource, ImageSourceLock};
use crate::geometry::PixelSize;
use crate::handle::NativeSurfaceHandle;
use thiserror::Error;
use tracing::debug;

/// Binding errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("Surface {current} is already bound; refusing to bind {requested}")]
    AlreadyBound {
        current: NativeSurfaceHandle,
        requested: NativeSurfaceHandle,
    },

    #[error("Front buffer is not available")]
    FrontBufferUnavailable,
}

/// Presents one native surface to the compositor as its back buffer.
///
/// Holds a non-owning copy of the handle: the native renderer owns the
/// surface, and the binding must be cleared before that surface is
/// destroyed.
#[derive(Debug)]
pub struct InteropSurfaceBinding {
    /// Surface currently attached as back buffer
    back_buffer: Option<NativeSurfaceHandle>,
    /// Compositor-visible dimensions
    size: PixelSize,
}

impl InteropSurfaceBinding {
    pub fn new(size: PixelSize) -> Self {
        Self {
            back_buffer: None,
            size,
        }
    }

    /// Attach `handle` as the back buffer of `source`.
    ///
    /// The back buffer slot is written under the compositor lock; the new
    /// surface shows up with the compositor's next frame.
    pub fn bind<S>(&mut self, source: &mut S, handle: NativeSurfaceHandle) -> Result<(), BindError>
    where
        S: ImageSource + ?Sized,
    {
        if let Some(current) = self.back_buffer {
            return Err(BindError::AlreadyBound {
                current,
                requested: handle,
            });
        }
        if !source.is_front_buffer_available() {
            return Err(BindError::FrontBufferUnavailable);
        }

        ImageSourceLock::acquire(source).set_back_buffer(Some(handle));
        self.back_buffer = Some(handle);

        debug!("Bound surface {} as back buffer ({})", handle, self.size);
        Ok(())
    }

    /// Detach the back buffer. Returns the surface that was bound, if any.
    pub fn unbind<S>(&mut self, source: &mut S) -> Option<NativeSurfaceHandle>
    where
        S: ImageSource + ?Sized,
    {
        let handle = self.back_buffer.take()?;
        ImageSourceLock::acquire(source).set_back_buffer(None);

        debug!("Unbound surface {}", handle);
        Some(handle)
    }

    pub fn handle(&self) -> Option<NativeSurfaceHandle> {
        self.back_buffer
    }

    pub fn is_bound(&self) -> bool {
        self.back_buffer.is_some()
    }

    pub fn size(&self) -> PixelSize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, Recorder};

    fn handle(raw: usize) -> NativeSurfaceHandle {
        NativeSurfaceHandle::from_raw(raw).unwrap()
    }

    #[test]
    fn test_bind_sets_back_buffer_under_lock() {
        let recorder = Recorder::new();
        let mut source = recorder.image_source(PixelSize::new(800, 600));
        let mut binding = InteropSurfaceBinding::new(PixelSize::new(800, 600));

        binding.bind(&mut source, handle(0x40)).unwrap();

        assert_eq!(binding.handle(), Some(handle(0x40)));
        assert_eq!(source.back_buffer(), Some(handle(0x40)));
        assert_eq!(
            recorder.calls(),
            vec![Call::Lock, Call::SetBackBuffer(Some(handle(0x40))), Call::Unlock]
        );
    }

    #[test]
    fn test_bind_twice_is_rejected() {
        let recorder = Recorder::new();
        let mut source = recorder.image_source(PixelSize::new(800, 600));
        let mut binding = InteropSurfaceBinding::new(PixelSize::new(800, 600));

        binding.bind(&mut source, handle(0x40)).unwrap();
        let err = binding.bind(&mut source, handle(0x50)).unwrap_err();

        assert_eq!(
            err,
            BindError::AlreadyBound {
                current: handle(0x40),
                requested: handle(0x50),
            }
        );
        assert_eq!(binding.handle(), Some(handle(0x40)));
        assert_eq!(source.back_buffer(), Some(handle(0x40)));
        assert_eq!(recorder.binds(), 1);
    }

    #[test]
    fn test_bind_requires_front_buffer() {
        let recorder = Recorder::new();
        let mut source = recorder.image_source(PixelSize::new(800, 600));
        source.set_available(false);
        let mut binding = InteropSurfaceBinding::new(PixelSize::new(800, 600));

        assert_eq!(
            binding.bind(&mut source, handle(0x40)),
            Err(BindError::FrontBufferUnavailable)
        );
        assert!(!binding.is_bound());
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_unbind_clears_back_buffer() {
        let recorder = Recorder::new();
        let mut source = recorder.image_source(PixelSize::new(800, 600));
        let mut binding = InteropSurfaceBinding::new(PixelSize::new(800, 600));

        binding.bind(&mut source, handle(0x40)).unwrap();
        recorder.clear();

        assert_eq!(binding.unbind(&mut source), Some(handle(0x40)));
        assert_eq!(source.back_buffer(), None);
        assert_eq!(
            recorder.calls(),
            vec![Call::Lock, Call::SetBackBuffer(None), Call::Unlock]
        );

        // Nothing left to detach
        assert_eq!(binding.unbind(&mut source), None);
        assert_eq!(recorder.calls().len(), 3);
    }

    #[test]
    fn test_rebind_after_unbind() {
        let recorder = Recorder::new();
        let mut source = recorder.image_source(PixelSize::new(800, 600));
        let mut binding = InteropSurfaceBinding::new(PixelSize::new(800, 600));

        binding.bind(&mut source, handle(0x40)).unwrap();
        binding.unbind(&mut source);
        binding.bind(&mut source, handle(0x50)).unwrap();

        assert_eq!(binding.handle(), Some(handle(0x50)));
    }
}

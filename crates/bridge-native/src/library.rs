//! Native drawer library
//!
//! Loads a shared library exporting the three drawer entry points:
//!
//! ```c
//! void* Initialize(void* hwnd, int width, int height); // NULL on failure
//! void  Render(void);
//! void  Cleanup(void);
//! ```

use crate::error::NativeError;
use bridge_core::{NativeSurfaceHandle, SurfaceProvider, SymbolNames, WindowIdentity};
use libloading::{Library, Symbol};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

type InitializeFn = unsafe extern "system" fn(*mut c_void, i32, i32) -> *mut c_void;
type RenderFn = unsafe extern "system" fn();
type CleanupFn = unsafe extern "system" fn();

/// A loaded drawer library.
pub struct DrawerLibrary {
    initialize: InitializeFn,
    render: RenderFn,
    cleanup: CleanupFn,
    path: PathBuf,
    /// Keeps the entry points above mapped
    _library: Library,
}

impl DrawerLibrary {
    /// Load the library at `path` and resolve its entry points.
    ///
    /// Loading runs the library's initialisers; the library must export
    /// the entry points with the signatures documented on this module.
    pub fn open(path: impl AsRef<Path>, symbols: &SymbolNames) -> Result<Self, NativeError> {
        let path = path.as_ref();
        debug!("Loading drawer library from: {:?}", path);

        let library = unsafe {
            Library::new(path).map_err(|e| NativeError::LibraryLoad {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        let initialize = unsafe { resolve::<InitializeFn>(&library, &symbols.initialize)? };
        let render = unsafe { resolve::<RenderFn>(&library, &symbols.render)? };
        let cleanup = unsafe { resolve::<CleanupFn>(&library, &symbols.cleanup)? };

        info!("Loaded drawer library: {:?}", path);

        Ok(Self {
            initialize,
            render,
            cleanup,
            path: path.to_path_buf(),
            _library: library,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Look up `name` and copy the function pointer out of the symbol.
///
/// # Safety
///
/// `T` must match the exported function's signature, and the pointer must
/// not outlive `library`.
unsafe fn resolve<T: Copy>(library: &Library, name: &str) -> Result<T, NativeError> {
    let symbol: Symbol<T> = unsafe {
        library
            .get(name.as_bytes())
            .map_err(|e| NativeError::MissingSymbol {
                symbol: name.to_string(),
                message: e.to_string(),
            })?
    };
    Ok(*symbol)
}

impl SurfaceProvider for DrawerLibrary {
    fn initialize(
        &mut self,
        window: WindowIdentity,
        width: i32,
        height: i32,
    ) -> Option<NativeSurfaceHandle> {
        let surface = unsafe { (self.initialize)(window.native_ptr(), width, height) };
        NativeSurfaceHandle::from_ptr(surface)
    }

    fn render(&mut self) {
        unsafe { (self.render)() }
    }

    fn cleanup(&mut self) {
        unsafe { (self.cleanup)() }
    }
}

impl std::fmt::Debug for DrawerLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawerLibrary")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

//! Native provider errors

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NativeError {
    #[error("Failed to load drawer library {path:?}: {message}")]
    LibraryLoad { path: PathBuf, message: String },

    #[error("Missing symbol '{symbol}' in drawer library: {message}")]
    MissingSymbol { symbol: String, message: String },

    #[error("No suitable GPU adapter found")]
    NoAdapter,

    #[error("Failed to create device: {0}")]
    DeviceCreation(String),

    #[error("Surface error: {0}")]
    Surface(String),
}

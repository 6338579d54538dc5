//! Bridge Configuration
//!
//! Surface size and the choice of native surface provider. Read from a JSON
//! file; every field has a default so partial files are accepted.

use crate::geometry::PixelSize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming the configuration file
pub const CONFIG_ENV_VAR: &str = "SURFACE_BRIDGE_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Surface dimensions must be positive, got {width}x{height}")]
    InvalidDimensions { width: i32, height: i32 },
}

/// Exported symbol names of a native drawer library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolNames {
    pub initialize: String,
    pub render: String,
    pub cleanup: String,
}

impl Default for SymbolNames {
    fn default() -> Self {
        Self {
            initialize: String::from("Initialize"),
            render: String::from("Render"),
            cleanup: String::from("Cleanup"),
        }
    }
}

/// Native drawer loaded from a shared library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Path to the library (e.g. `Direct2DDrawer.dll`)
    pub path: PathBuf,
    /// Entry point names
    #[serde(default)]
    pub symbols: SymbolNames,
}

/// Built-in wgpu surface provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WgpuConfig {
    /// Clear color as 0xRRGGBB
    pub clear_color: u32,
    /// Prefer low-power GPU (integrated) over high-performance (discrete)
    pub low_power: bool,
    /// VSync enabled
    pub vsync: bool,
}

impl Default for WgpuConfig {
    fn default() -> Self {
        Self {
            clear_color: 0x6495ED, // cornflower blue
            low_power: true,
            vsync: true,
        }
    }
}

/// Which native surface provider to drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Wgpu(WgpuConfig),
    Library(LibraryConfig),
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Wgpu(WgpuConfig::default())
    }
}

/// Complete bridge configuration
///
/// Provider options live under `provider`; unknown top-level keys are
/// rejected so a misplaced option is not silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Surface width in pixels, fixed for the window's lifetime
    pub width: i32,
    /// Surface height in pixels, fixed for the window's lifetime
    pub height: i32,
    /// Host window title
    pub title: String,
    /// Surface provider
    pub provider: ProviderConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

impl BridgeConfig {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            title: String::from("Surface Bridge"),
            provider: ProviderConfig::default(),
        }
    }

    /// Drive a native drawer library instead of the wgpu provider.
    pub fn with_library(mut self, path: impl Into<PathBuf>) -> Self {
        self.provider = ProviderConfig::Library(LibraryConfig {
            path: path.into(),
            symbols: SymbolNames::default(),
        });
        self
    }

    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Load and validate a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], or defaults if unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.size().is_drawable() {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

//! Pixel sizes and dirty regions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Surface size in pixels, in the ABI's signed representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: i32,
    pub height: i32,
}

impl PixelSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Whether a surface of this size can be created at all.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

impl fmt::Display for PixelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Rectangle of the surface that changed since the last frame.
///
/// Built fresh for every frame and handed straight to the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRegion {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRegion {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Whole-surface invalidation.
    pub const fn full(size: PixelSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Whether this region covers every pixel of a surface of `size`.
    pub fn covers(&self, size: PixelSize) -> bool {
        self.x <= 0
            && self.y <= 0
            && self.x + self.width >= size.width
            && self.y + self.height >= size.height
    }

    pub fn area(&self) -> i64 {
        i64::from(self.width.max(0)) * i64::from(self.height.max(0))
    }
}

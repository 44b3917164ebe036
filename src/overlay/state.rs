//! Overlay state record — functional core.
//!
//! Plain data plus the clamping rules. Nothing here touches a window.

use crate::config::{
    DEFAULT_OPACITY, DEFAULT_POSITION, DEFAULT_SIZE, MAX_OPACITY, MIN_OPACITY,
};
use serde::Serialize;
use std::sync::Arc;

/// Top-left corner of the overlay, in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Overlay dimensions in logical pixels. Both sides are always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Returns `None` when either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { width, height })
    }
}

impl Default for Size {
    fn default() -> Self {
        Self {
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
        }
    }
}

/// Base64 raster payload as received from the producer.
///
/// Never decoded here. Cloning shares the underlying buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EncodedBitmap(Arc<str>);

impl EncodedBitmap {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for EncodedBitmap {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&str> for EncodedBitmap {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

/// Everything the controller knows about the overlay.
///
/// `position`, `size`, `opacity` and `mouse_pass_through` outlive the window
/// itself: they are reused when the surface is recreated.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    pub exists: bool,
    pub visible: bool,
    pub position: Position,
    pub size: Size,
    pub opacity: f64,
    pub mouse_pass_through: bool,
    pub current_image: Option<EncodedBitmap>,
}

impl OverlayState {
    /// Startup value: no window yet, click-through on, half transparent.
    pub fn new() -> Self {
        Self {
            exists: false,
            visible: false,
            position: Position::new(DEFAULT_POSITION.0, DEFAULT_POSITION.1),
            size: Size::default(),
            opacity: DEFAULT_OPACITY,
            mouse_pass_through: true,
            current_image: None,
        }
    }
}

impl Default for OverlayState {
    fn default() -> Self {
        Self::new()
    }
}

/// Clamps to `[MIN_OPACITY, MAX_OPACITY]` and snaps to hundredths so repeated
/// steps of 0.1 land on exact tenths.
///
/// Returns `None` for NaN or infinite input.
pub fn clamp_opacity(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let snapped = (value * 100.0).round() / 100.0;
    Some(snapped.clamp(MIN_OPACITY, MAX_OPACITY))
}

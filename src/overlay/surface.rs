//! The contract between the controller and whatever draws the overlay.
//!
//! The controller only ever talks to a `Surface`; the Tauri window in
//! `window.rs` is one implementation, tests use a recording double.

use super::state::{EncodedBitmap, Position, Size};

/// Geometry and input mode a new surface is created with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceSpec {
    pub position: Position,
    pub size: Size,
    pub mouse_pass_through: bool,
}

/// Repaint requests pushed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceNotification {
    ImageReceived(EncodedBitmap),
    OpacityChanged(f64),
}

/// Command side of the overlay surface.
///
/// Calls must not block; they are issued from inside the controller's
/// serialized loop.
pub trait Surface: Send + 'static {
    /// Creates the surface, initially hidden.
    fn create(&mut self, spec: &SurfaceSpec) -> Result<(), SurfaceError>;

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError>;

    fn move_to(&mut self, position: Position) -> Result<(), SurfaceError>;

    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError>;

    /// Click-through with pointer-move forwarding when `enabled`.
    fn set_pass_through(&mut self, enabled: bool) -> Result<(), SurfaceError>;

    fn notify(&mut self, notification: &SurfaceNotification) -> Result<(), SurfaceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("Overlay window is not open")]
    Missing,

    #[error("Overlay window operation failed: {0}")]
    Window(String),
}

//! Overlay domain — public API.
//!
//! This module owns the overlay's state and the only way to change it.
//! External code (relay, tray, shortcuts, renderer commands) holds an
//! `OverlayHandle` and never touches `OverlayState` directly.

mod controller;
mod state;
mod surface;
mod window;

pub use controller::{OverlayCommand, OverlayController};
pub use state::{clamp_opacity, EncodedBitmap, OverlayState, Position, Size};
pub use surface::{Surface, SurfaceError, SurfaceNotification, SurfaceSpec};
pub use window::TauriSurface;

use tokio::sync::{mpsc, oneshot};

/// Receiving end handed to `OverlayController::run`.
pub type CommandReceiver = mpsc::UnboundedReceiver<OverlayCommand>;

/// Cloneable sender into the controller's queue.
///
/// Sends never wait, so no caller can stall another.
#[derive(Clone)]
pub struct OverlayHandle {
    commands: mpsc::UnboundedSender<OverlayCommand>,
}

impl OverlayHandle {
    pub fn channel() -> (Self, CommandReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { commands: tx }, rx)
    }

    pub fn present(&self, image: EncodedBitmap, size: Size) {
        self.send(OverlayCommand::Present { image, size });
    }

    pub fn toggle(&self) {
        self.send(OverlayCommand::Toggle);
    }

    pub fn adjust_opacity(&self, delta: f64) {
        self.send(OverlayCommand::AdjustOpacity(delta));
    }

    pub fn set_opacity(&self, value: f64) {
        self.send(OverlayCommand::SetOpacity(value));
    }

    pub fn set_mouse_pass_through(&self, enabled: bool) {
        self.send(OverlayCommand::SetMousePassThrough(enabled));
    }

    pub fn move_by(&self, dx: i32, dy: i32) {
        self.send(OverlayCommand::MoveBy { dx, dy });
    }

    pub fn hide(&self) {
        self.send(OverlayCommand::Hide);
    }

    pub fn record_geometry(&self, position: Option<Position>, size: Option<Size>) {
        self.send(OverlayCommand::RecordGeometry { position, size });
    }

    pub fn surface_ready(&self) {
        self.send(OverlayCommand::SurfaceReady);
    }

    pub fn surface_destroyed(&self) {
        self.send(OverlayCommand::SurfaceDestroyed);
    }

    /// Copy of the state after every command queued before this call.
    ///
    /// `None` if the controller is no longer running.
    pub async fn snapshot(&self) -> Option<OverlayState> {
        let (tx, rx) = oneshot::channel();
        self.send(OverlayCommand::Snapshot(tx));
        rx.await.ok()
    }

    fn send(&self, command: OverlayCommand) {
        if self.commands.send(command).is_err() {
            log::warn!("[OVERLAY] Controller gone — command dropped");
        }
    }
}

//! Fixed application constants.
//!
//! The producer plugin is hard-wired to one port, so nothing here is read from
//! the environment. Geometry is in logical pixels.

use std::net::{Ipv4Addr, SocketAddr};

/// Port the design-tool plugin connects to.
pub const RELAY_PORT: u16 = 47777;

/// Largest relay frame/message accepted. A 2x export of a tall frame easily
/// exceeds the WebSocket library's 16 MiB default.
pub const RELAY_MAX_MESSAGE_BYTES: usize = 100 * 1024 * 1024;

pub const DEFAULT_POSITION: (i32, i32) = (100, 100);
pub const DEFAULT_SIZE: (u32, u32) = (400, 800);
pub const DEFAULT_OPACITY: f64 = 0.5;

pub const MIN_OPACITY: f64 = 0.1;
pub const MAX_OPACITY: f64 = 1.0;

/// Step applied by the opacity shortcuts and tray items.
pub const OPACITY_STEP: f64 = 0.1;

/// Tauri label of the overlay window.
pub const OVERLAY_LABEL: &str = "overlay";
pub const OVERLAY_PAGE: &str = "overlay.html";

pub const EVENT_IMAGE_RECEIVED: &str = "image-received";
pub const EVENT_OPACITY_CHANGED: &str = "opacity-changed";
pub const EVENT_POINTER_MOVED: &str = "pointer-moved";

pub const SHORTCUT_TOGGLE: &str = "CmdOrCtrl+Shift+O";
pub const SHORTCUT_OPACITY_UP: &str = "CmdOrCtrl+]";
pub const SHORTCUT_OPACITY_DOWN: &str = "CmdOrCtrl+[";

/// Loopback address the relay listens on.
pub fn relay_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, RELAY_PORT))
}

/// Address shown in the tray menu for operator diagnosis.
pub fn relay_url() -> String {
    format!("ws://localhost:{}", RELAY_PORT)
}

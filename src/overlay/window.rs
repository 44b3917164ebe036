//! Tauri implementation of `Surface`.
//!
//! This is the infrastructure layer — it talks to the window system. The
//! controller pushes commands in; native move/resize/destroy events and the
//! cursor forwarder report back through an `OverlayHandle`.

use super::state::{Position, Size};
use super::surface::{Surface, SurfaceError, SurfaceNotification, SurfaceSpec};
use super::OverlayHandle;
use crate::config::{
    EVENT_IMAGE_RECEIVED, EVENT_OPACITY_CHANGED, EVENT_POINTER_MOVED, OVERLAY_LABEL,
    OVERLAY_PAGE,
};
use serde::Serialize;
use std::time::Duration;
use tauri::async_runtime::JoinHandle;
use tauri::{
    AppHandle, Emitter, LogicalPosition, LogicalSize, Manager, WebviewUrl, WebviewWindow,
    WebviewWindowBuilder, WindowEvent,
};

/// Roughly 30 Hz; enough for hover feedback without burning a core.
const CURSOR_POLL_INTERVAL: Duration = Duration::from_millis(33);

/// Window-relative pointer location sent while the overlay is click-through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointerMoved {
    pub x: i32,
    pub y: i32,
    pub inside: bool,
}

pub struct TauriSurface {
    app: AppHandle,
    feedback: OverlayHandle,
    forwarder: Option<JoinHandle<()>>,
}

impl TauriSurface {
    pub fn new(app: AppHandle, feedback: OverlayHandle) -> Self {
        Self {
            app,
            feedback,
            forwarder: None,
        }
    }

    fn window(&self) -> Result<WebviewWindow, SurfaceError> {
        self.app
            .get_webview_window(OVERLAY_LABEL)
            .ok_or(SurfaceError::Missing)
    }

    fn start_forwarder(&mut self) {
        if self.forwarder.is_some() {
            return;
        }
        let app = self.app.clone();
        self.forwarder = Some(tauri::async_runtime::spawn(forward_cursor(app)));
        log::debug!("[OVERLAY] Cursor forwarding started");
    }

    fn stop_forwarder(&mut self) {
        if let Some(task) = self.forwarder.take() {
            task.abort();
            log::debug!("[OVERLAY] Cursor forwarding stopped");
        }
    }
}

impl Surface for TauriSurface {
    fn create(&mut self, spec: &SurfaceSpec) -> Result<(), SurfaceError> {
        // A previous window may have died with its forwarder still parked.
        self.stop_forwarder();

        let window = WebviewWindowBuilder::new(
            &self.app,
            OVERLAY_LABEL,
            WebviewUrl::App(OVERLAY_PAGE.into()),
        )
        .title("Ghost Overlay")
        .inner_size(spec.size.width as f64, spec.size.height as f64)
        .position(spec.position.x as f64, spec.position.y as f64)
        .transparent(true)
        .decorations(false)
        .shadow(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .resizable(true)
        .visible_on_all_workspaces(true)
        .visible(false)
        .build()
        .map_err(window_error)?;

        let feedback = self.feedback.clone();
        let events_window = window.clone();
        window.on_window_event(move |event| match event {
            WindowEvent::Moved(physical) => {
                let scale = events_window.scale_factor().unwrap_or(1.0);
                let logical = physical.to_logical::<i32>(scale);
                feedback.record_geometry(Some(Position::new(logical.x, logical.y)), None);
            }
            WindowEvent::Resized(physical) => {
                let scale = events_window.scale_factor().unwrap_or(1.0);
                let logical = physical.to_logical::<u32>(scale);
                // Minimizing reports 0x0; keep the previous size.
                if let Some(size) = Size::new(logical.width, logical.height) {
                    feedback.record_geometry(None, Some(size));
                }
            }
            WindowEvent::Destroyed => feedback.surface_destroyed(),
            _ => {}
        });

        // The window exists now; a pass-through failure must not hide that.
        if let Err(e) = self.set_pass_through(spec.mouse_pass_through) {
            log::error!("[OVERLAY] Initial pass-through setup failed: {}", e);
        }
        Ok(())
    }

    fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
        self.window()?
            .set_size(LogicalSize::new(size.width as f64, size.height as f64))
            .map_err(window_error)
    }

    fn move_to(&mut self, position: Position) -> Result<(), SurfaceError> {
        self.window()?
            .set_position(LogicalPosition::new(position.x as f64, position.y as f64))
            .map_err(window_error)
    }

    fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
        let window = self.window()?;
        if visible {
            window.show().map_err(window_error)
        } else {
            window.hide().map_err(window_error)
        }
    }

    fn set_pass_through(&mut self, enabled: bool) -> Result<(), SurfaceError> {
        self.window()?
            .set_ignore_cursor_events(enabled)
            .map_err(window_error)?;
        if enabled {
            self.start_forwarder();
        } else {
            self.stop_forwarder();
        }
        Ok(())
    }

    fn notify(&mut self, notification: &SurfaceNotification) -> Result<(), SurfaceError> {
        let window = self.window()?;
        let emitted = match notification {
            SurfaceNotification::ImageReceived(image) => window.emit(EVENT_IMAGE_RECEIVED, image),
            SurfaceNotification::OpacityChanged(opacity) => {
                window.emit(EVENT_OPACITY_CHANGED, opacity)
            }
        };
        emitted.map_err(window_error)
    }
}

fn window_error(e: tauri::Error) -> SurfaceError {
    SurfaceError::Window(e.to_string())
}

/// Polls the global cursor and tells the renderer where it is, since a
/// click-through window receives no pointer events of its own.
///
/// Ends by itself once the overlay window is gone.
async fn forward_cursor(app: AppHandle) {
    let mut ticker = tokio::time::interval(CURSOR_POLL_INTERVAL);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last: Option<PointerMoved> = None;

    loop {
        ticker.tick().await;
        let Some(window) = app.get_webview_window(OVERLAY_LABEL) else {
            break;
        };
        let Some(pointer) = sample_pointer(&window) else {
            continue;
        };
        if last == Some(pointer) {
            continue;
        }
        if let Err(e) = window.emit(EVENT_POINTER_MOVED, pointer) {
            log::debug!("[OVERLAY] Pointer forward failed: {}", e);
        }
        last = Some(pointer);
    }
}

fn sample_pointer(window: &WebviewWindow) -> Option<PointerMoved> {
    let cursor = window.cursor_position().ok()?;
    let origin = window.inner_position().ok()?;
    let size = window.inner_size().ok()?;
    let scale = window.scale_factor().ok()?;
    Some(relative_pointer(
        (cursor.x, cursor.y),
        (origin.x, origin.y),
        (size.width, size.height),
        scale,
    ))
}

/// Converts a physical screen-space cursor into window-relative logical
/// coordinates.
fn relative_pointer(
    cursor: (f64, f64),
    origin: (i32, i32),
    size: (u32, u32),
    scale: f64,
) -> PointerMoved {
    let scale = if scale > 0.0 { scale } else { 1.0 };
    let dx = cursor.0 - origin.0 as f64;
    let dy = cursor.1 - origin.1 as f64;
    let inside = dx >= 0.0 && dy >= 0.0 && dx < size.0 as f64 && dy < size.1 as f64;
    PointerMoved {
        x: (dx / scale).round() as i32,
        y: (dy / scale).round() as i32,
        inside,
    }
}

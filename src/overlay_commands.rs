//! Tauri commands invoked by the overlay renderer.
//!
//! Each one is a thin forward onto `OverlayHandle`; the renderer never
//! changes window state on its own.

use crate::overlay::OverlayHandle;

/// Tauri command: absolute opacity from the renderer's slider/scroll gesture.
#[tauri::command]
pub fn set_opacity(overlay: tauri::State<'_, OverlayHandle>, opacity: f64) -> Result<(), String> {
    overlay.set_opacity(opacity);
    Ok(())
}

/// Tauri command: toggle click-through.
///
/// The renderer turns it off while the user drags the overlay and back on
/// when the pointer leaves.
#[tauri::command]
pub fn set_ignore_mouse_events(
    overlay: tauri::State<'_, OverlayHandle>,
    ignore: bool,
) -> Result<(), String> {
    overlay.set_mouse_pass_through(ignore);
    Ok(())
}

/// Tauri command: relative drag delta in logical pixels.
#[tauri::command]
pub fn move_window(
    overlay: tauri::State<'_, OverlayHandle>,
    delta_x: i32,
    delta_y: i32,
) -> Result<(), String> {
    overlay.move_by(delta_x, delta_y);
    Ok(())
}

/// Tauri command: the renderer's close button. Hides, never destroys.
#[tauri::command]
pub fn close_overlay(overlay: tauri::State<'_, OverlayHandle>) -> Result<(), String> {
    overlay.hide();
    Ok(())
}

/// Tauri command: renderer listeners are attached; resend image and opacity.
#[tauri::command]
pub fn overlay_ready(overlay: tauri::State<'_, OverlayHandle>) -> Result<(), String> {
    log::debug!("[OVERLAY] Renderer ready");
    overlay.surface_ready();
    Ok(())
}

//! Global keyboard shortcuts.
//!
//! Three accelerators, each mapped 1:1 onto an overlay operation. Only the
//! key-press edge triggers; releases are ignored.

use crate::config::{OPACITY_STEP, SHORTCUT_OPACITY_DOWN, SHORTCUT_OPACITY_UP, SHORTCUT_TOGGLE};
use crate::overlay::OverlayHandle;
use tauri::{AppHandle, Manager, Runtime};
use tauri_plugin_global_shortcut::{Code, Modifiers, Shortcut, ShortcutState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    ToggleOverlay,
    IncreaseOpacity,
    DecreaseOpacity,
}

impl ShortcutAction {
    /// Resolves a pressed shortcut to its action, if it is one of ours.
    pub fn for_shortcut(shortcut: &Shortcut) -> Option<Self> {
        let primary = primary_modifier();
        if shortcut.matches(primary | Modifiers::SHIFT, Code::KeyO) {
            Some(Self::ToggleOverlay)
        } else if shortcut.matches(primary, Code::BracketRight) {
            Some(Self::IncreaseOpacity)
        } else if shortcut.matches(primary, Code::BracketLeft) {
            Some(Self::DecreaseOpacity)
        } else {
            None
        }
    }

    pub fn apply(self, overlay: &OverlayHandle) {
        match self {
            Self::ToggleOverlay => overlay.toggle(),
            Self::IncreaseOpacity => overlay.adjust_opacity(OPACITY_STEP),
            Self::DecreaseOpacity => overlay.adjust_opacity(-OPACITY_STEP),
        }
    }
}

/// `CmdOrCtrl`: Command on macOS, Control elsewhere.
fn primary_modifier() -> Modifiers {
    if cfg!(target_os = "macos") {
        Modifiers::SUPER
    } else {
        Modifiers::CONTROL
    }
}

/// Builds the global-shortcut plugin with our accelerators registered.
pub fn plugin<R: Runtime>() -> Result<tauri::plugin::TauriPlugin<R>, Box<dyn std::error::Error>> {
    let plugin = tauri_plugin_global_shortcut::Builder::new()
        .with_shortcuts([SHORTCUT_TOGGLE, SHORTCUT_OPACITY_UP, SHORTCUT_OPACITY_DOWN])?
        .with_handler(|app, shortcut, event| {
            if event.state != ShortcutState::Pressed {
                return;
            }
            let Some(action) = ShortcutAction::for_shortcut(shortcut) else {
                return;
            };
            log::info!("[SHORTCUT] {:?}", action);
            dispatch(app, action);
        })
        .build();
    Ok(plugin)
}

fn dispatch<R: Runtime>(app: &AppHandle<R>, action: ShortcutAction) {
    match app.try_state::<OverlayHandle>() {
        Some(overlay) => action.apply(&overlay),
        None => log::warn!("[SHORTCUT] Overlay not initialised yet — ignoring {:?}", action),
    }
}

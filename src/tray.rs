//! System tray setup and menu handler.
//!
//! The tray is the status indicator for Ghost Overlay. Left click toggles the
//! overlay; right click opens the menu, which also shows where the relay is
//! listening.

use crate::config::{
    relay_url, OPACITY_STEP, SHORTCUT_OPACITY_DOWN, SHORTCUT_OPACITY_UP, SHORTCUT_TOGGLE,
};
use crate::overlay::OverlayHandle;
use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder},
    tray::{MouseButton, MouseButtonState, TrayIconBuilder, TrayIconEvent},
    AppHandle, Manager,
};
use tauri_plugin_global_shortcut::GlobalShortcutExt;

const MENU_TOGGLE: &str = "toggle";
const MENU_OPACITY_UP: &str = "opacity-up";
const MENU_OPACITY_DOWN: &str = "opacity-down";
const MENU_QUIT: &str = "quit";

#[derive(Debug, Clone, Copy, PartialEq)]
enum TrayAction {
    Toggle,
    IncreaseOpacity,
    DecreaseOpacity,
    Quit,
}

impl TrayAction {
    fn from_menu_id(id: &str) -> Option<Self> {
        match id {
            MENU_TOGGLE => Some(Self::Toggle),
            MENU_OPACITY_UP => Some(Self::IncreaseOpacity),
            MENU_OPACITY_DOWN => Some(Self::DecreaseOpacity),
            MENU_QUIT => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Sets up the system tray icon and its menu.
pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let title = MenuItemBuilder::with_id("title", "Ghost Overlay")
        .enabled(false)
        .build(app)?;
    let toggle = MenuItemBuilder::with_id(MENU_TOGGLE, "Show/Hide Overlay")
        .accelerator(SHORTCUT_TOGGLE)
        .build(app)?;
    let opacity_up = MenuItemBuilder::with_id(MENU_OPACITY_UP, "Increase Opacity")
        .accelerator(SHORTCUT_OPACITY_UP)
        .build(app)?;
    let opacity_down = MenuItemBuilder::with_id(MENU_OPACITY_DOWN, "Decrease Opacity")
        .accelerator(SHORTCUT_OPACITY_DOWN)
        .build(app)?;
    let server = MenuItemBuilder::with_id("server", format!("Server: {}", relay_url()))
        .enabled(false)
        .build(app)?;
    let quit = MenuItemBuilder::with_id(MENU_QUIT, "Quit")
        .accelerator("CmdOrCtrl+Q")
        .build(app)?;

    let menu = MenuBuilder::new(app)
        .item(&title)
        .separator()
        .item(&toggle)
        .separator()
        .item(&opacity_up)
        .item(&opacity_down)
        .separator()
        .item(&server)
        .separator()
        .item(&quit)
        .build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::new()
        .icon(tray_icon)
        .tooltip("Ghost Overlay")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let TrayIconEvent::Click {
                button: MouseButton::Left,
                button_state: MouseButtonState::Up,
                ..
            } = event
            {
                log::debug!("[TRAY] Icon clicked — toggling overlay");
                run_action(tray_icon.app_handle(), TrayAction::Toggle);
            }
        })
        .on_menu_event(|app, event| match TrayAction::from_menu_id(event.id().as_ref()) {
            Some(action) => run_action(app, action),
            None => log::debug!("[TRAY] Unhandled menu item: {:?}", event.id()),
        })
        .build(app)?;

    Ok(())
}

fn run_action(app: &AppHandle, action: TrayAction) {
    if action == TrayAction::Quit {
        log::info!("[TRAY] Quit requested from tray menu");
        if let Err(e) = app.global_shortcut().unregister_all() {
            log::warn!("[TRAY] Failed to unregister shortcuts: {}", e);
        }
        app.exit(0);
        return;
    }

    let Some(overlay) = app.try_state::<OverlayHandle>() else {
        log::warn!("[TRAY] Overlay not initialised yet — ignoring {:?}", action);
        return;
    };
    match action {
        TrayAction::Toggle => overlay.toggle(),
        TrayAction::IncreaseOpacity => overlay.adjust_opacity(OPACITY_STEP),
        TrayAction::DecreaseOpacity => overlay.adjust_opacity(-OPACITY_STEP),
        TrayAction::Quit => {}
    }
}

//! Ghost Overlay — Tauri application entry point.
//!
//! This is the app shell that wires together:
//! - Overlay controller and its window surface (overlay/)
//! - WebSocket relay for the design-tool plugin (relay/)
//! - System tray (tray.rs) and global shortcuts (shortcuts.rs)
//! - Tauri command handlers for the overlay renderer (overlay_commands.rs)

pub mod config;
pub mod overlay;
mod overlay_commands;
pub mod relay;
pub mod shortcuts;
mod tray;

use overlay::{OverlayController, OverlayHandle, TauriSurface};
use relay::RelayServer;
use tauri::{Manager, RunEvent};

/// Entry point — called by `main`.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Optional .env for RUST_LOG during development.
    dotenvy::dotenv().ok();
    env_logger::init();

    let shortcuts = match shortcuts::plugin() {
        Ok(plugin) => plugin,
        Err(e) => {
            log::error!("Failed to register global shortcuts: {}", e);
            std::process::exit(1);
        }
    };

    let app = tauri::Builder::default()
        .plugin(shortcuts)
        .invoke_handler(tauri::generate_handler![
            overlay_commands::set_opacity,
            overlay_commands::set_ignore_mouse_events,
            overlay_commands::move_window,
            overlay_commands::close_overlay,
            overlay_commands::overlay_ready,
        ])
        .setup(|app| {
            log::info!("Ghost Overlay starting up");

            // Menu-bar app: no Dock icon.
            #[cfg(target_os = "macos")]
            app.set_activation_policy(tauri::ActivationPolicy::Accessory);

            let (overlay, commands) = OverlayHandle::channel();
            let surface = TauriSurface::new(app.handle().clone(), overlay.clone());
            tauri::async_runtime::spawn(OverlayController::new(surface).run(commands));

            // The plugin only knows this one port, so failing to bind is fatal.
            let relay = tauri::async_runtime::block_on(RelayServer::bind(config::relay_addr()))
                .inspect_err(|e| log::error!("[RELAY] {}", e))?;
            tauri::async_runtime::spawn(relay.serve(overlay.clone()));

            app.manage(overlay);
            tray::setup_tray(app.handle())?;

            log::info!("Ghost Overlay is running — relay at {}", config::relay_url());
            Ok(())
        })
        .build(tauri::generate_context!())
        .expect("Error building Ghost Overlay");

    app.run(|_app, event| {
        // Keep running when the overlay window closes; only Quit exits.
        if let RunEvent::ExitRequested { code: None, api, .. } = event {
            api.prevent_exit();
        }
    });
}

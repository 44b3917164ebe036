//! Build script for Ghost Overlay.
//!
//! Only the Tauri code generation step is needed: the overlay has no native
//! bridges, and the renderer is a static page under `ui/`.

fn main() {
    tauri_build::build();
}

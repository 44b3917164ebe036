//! Overlay controller — the single owner of `OverlayState`.
//!
//! Every mutation arrives as an `OverlayCommand` and is applied to completion
//! before the next one is looked at. `run` drains the command channel in
//! arrival order, so relay messages, shortcuts, tray clicks and renderer
//! callbacks can never interleave inside one update.

use super::state::{clamp_opacity, EncodedBitmap, OverlayState, Position, Size};
use super::surface::{Surface, SurfaceNotification, SurfaceSpec};
use std::collections::VecDeque;
use tokio::sync::{mpsc, oneshot};

/// Programmatic moves still waiting for their native `Moved` echo.
const MAX_PENDING_MOVES: usize = 64;

/// Logical positions may be off by one after a physical round trip.
const ECHO_TOLERANCE: i32 = 1;

/// One request against the overlay. See `OverlayHandle` for the senders.
#[derive(Debug)]
pub enum OverlayCommand {
    Present { image: EncodedBitmap, size: Size },
    Toggle,
    AdjustOpacity(f64),
    SetOpacity(f64),
    SetMousePassThrough(bool),
    MoveBy { dx: i32, dy: i32 },
    Hide,
    /// The user moved or resized the window natively. Never echoed back.
    RecordGeometry {
        position: Option<Position>,
        size: Option<Size>,
    },
    /// The renderer finished loading and wants the current picture.
    SurfaceReady,
    /// The native window is gone; state is kept for the next creation.
    SurfaceDestroyed,
    Snapshot(oneshot::Sender<OverlayState>),
}

pub struct OverlayController<S: Surface> {
    state: OverlayState,
    surface: S,
    pending_moves: VecDeque<Position>,
}

impl<S: Surface> OverlayController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            state: OverlayState::new(),
            surface,
            pending_moves: VecDeque::new(),
        }
    }

    pub fn state(&self) -> &OverlayState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Applies commands until every `OverlayHandle` has been dropped.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<OverlayCommand>) {
        log::info!("[OVERLAY] Controller running");
        while let Some(command) = commands.recv().await {
            self.apply(command);
        }
        log::info!("[OVERLAY] Controller stopped — all handles dropped");
    }

    pub fn apply(&mut self, command: OverlayCommand) {
        match command {
            OverlayCommand::Present { image, size } => self.present(image, size),
            OverlayCommand::Toggle => self.toggle(),
            OverlayCommand::AdjustOpacity(delta) => self.adjust_opacity(delta),
            OverlayCommand::SetOpacity(value) => self.set_opacity(value),
            OverlayCommand::SetMousePassThrough(enabled) => self.set_mouse_pass_through(enabled),
            OverlayCommand::MoveBy { dx, dy } => self.move_by(dx, dy),
            OverlayCommand::Hide => self.hide(),
            OverlayCommand::RecordGeometry { position, size } => {
                self.record_geometry(position, size)
            }
            OverlayCommand::SurfaceReady => self.surface_ready(),
            OverlayCommand::SurfaceDestroyed => self.surface_destroyed(),
            OverlayCommand::Snapshot(reply) => {
                // Receiver gone means the caller stopped caring.
                let _ = reply.send(self.state.clone());
            }
        }
    }

    /// Shows `image` at `size`, creating or resizing the surface as needed.
    pub fn present(&mut self, image: EncodedBitmap, size: Size) {
        log::debug!(
            "[OVERLAY] Present {}x{} ({} bytes base64)",
            size.width,
            size.height,
            image.len()
        );

        self.state.size = size;
        if self.state.exists {
            if let Err(e) = self.surface.resize(size) {
                log::error!("[OVERLAY] Resize to {}x{} failed: {}", size.width, size.height, e);
            }
        } else {
            self.ensure_surface();
        }

        self.state.current_image = Some(image.clone());
        if self.state.exists {
            self.notify(SurfaceNotification::ImageReceived(image));
            self.show();
        }
    }

    /// Creates and shows the surface if absent, otherwise flips visibility.
    pub fn toggle(&mut self) {
        if !self.state.exists {
            if self.ensure_surface() {
                self.show();
            }
            return;
        }

        if self.state.visible {
            self.hide();
        } else {
            self.show();
        }
    }

    pub fn adjust_opacity(&mut self, delta: f64) {
        self.set_opacity(self.state.opacity + delta);
    }

    pub fn set_opacity(&mut self, value: f64) {
        let Some(opacity) = clamp_opacity(value) else {
            log::warn!("[OVERLAY] Ignoring non-finite opacity {}", value);
            return;
        };
        self.state.opacity = opacity;
        log::debug!("[OVERLAY] Opacity {:.2}", opacity);
        if self.state.exists {
            self.notify(SurfaceNotification::OpacityChanged(opacity));
        }
    }

    pub fn set_mouse_pass_through(&mut self, enabled: bool) {
        self.state.mouse_pass_through = enabled;
        if self.state.exists {
            if let Err(e) = self.surface.set_pass_through(enabled) {
                log::error!("[OVERLAY] Pass-through={} failed: {}", enabled, e);
            }
        }
    }

    pub fn move_by(&mut self, dx: i32, dy: i32) {
        self.state.position = self.state.position.offset(dx, dy);
        if !self.state.exists {
            return;
        }
        match self.surface.move_to(self.state.position) {
            Ok(()) => {
                if self.pending_moves.len() == MAX_PENDING_MOVES {
                    self.pending_moves.pop_front();
                }
                self.pending_moves.push_back(self.state.position);
            }
            Err(e) => log::error!("[OVERLAY] Move failed: {}", e),
        }
    }

    /// Hides without tearing the surface down or dropping the image.
    pub fn hide(&mut self) {
        self.state.visible = false;
        if self.state.exists {
            if let Err(e) = self.surface.set_visible(false) {
                log::error!("[OVERLAY] Hide failed: {}", e);
            }
        }
    }

    /// Feedback path from native moves/resizes. Deliberately silent towards the
    /// surface.
    ///
    /// The window system also reports moves this controller requested itself.
    /// Those echoes can arrive behind newer `move_by`s and are dropped, so a
    /// stale position never overwrites the latest one.
    pub fn record_geometry(&mut self, position: Option<Position>, size: Option<Size>) {
        if let Some(position) = position {
            if self.consume_echo(position) {
                log::debug!(
                    "[OVERLAY] Ignoring echo of own move to ({},{})",
                    position.x,
                    position.y
                );
            } else {
                self.pending_moves.clear();
                self.state.position = position;
            }
        }
        if let Some(size) = size {
            self.state.size = size;
        }
    }

    pub fn surface_ready(&mut self) {
        if !self.state.exists {
            return;
        }
        if let Some(image) = self.state.current_image.clone() {
            self.notify(SurfaceNotification::ImageReceived(image));
        }
        self.notify(SurfaceNotification::OpacityChanged(self.state.opacity));
    }

    pub fn surface_destroyed(&mut self) {
        if self.state.exists {
            log::info!("[OVERLAY] Surface destroyed — keeping last-known state");
        }
        self.state.exists = false;
        self.state.visible = false;
        self.pending_moves.clear();
    }

    /// Drops `position` and every older pending move if it matches one.
    fn consume_echo(&mut self, position: Position) -> bool {
        let matched = self.pending_moves.iter().position(|p| {
            (p.x - position.x).abs() <= ECHO_TOLERANCE && (p.y - position.y).abs() <= ECHO_TOLERANCE
        });
        match matched {
            Some(index) => {
                self.pending_moves.drain(..=index);
                true
            }
            None => false,
        }
    }

    /// Returns whether a surface exists afterwards.
    fn ensure_surface(&mut self) -> bool {
        if self.state.exists {
            return true;
        }

        let spec = SurfaceSpec {
            position: self.state.position,
            size: self.state.size,
            mouse_pass_through: self.state.mouse_pass_through,
        };
        match self.surface.create(&spec) {
            Ok(()) => {
                self.pending_moves.clear();
                log::info!(
                    "[OVERLAY] Surface created at ({},{}) {}x{}",
                    spec.position.x,
                    spec.position.y,
                    spec.size.width,
                    spec.size.height
                );
                self.state.exists = true;
                self.state.visible = false;
                true
            }
            Err(e) => {
                log::error!("[OVERLAY] Surface creation failed: {}", e);
                false
            }
        }
    }

    fn show(&mut self) {
        self.state.visible = true;
        if let Err(e) = self.surface.set_visible(true) {
            log::error!("[OVERLAY] Show failed: {}", e);
        }
    }

    fn notify(&mut self, notification: SurfaceNotification) {
        if let Err(e) = self.surface.notify(&notification) {
            log::error!("[OVERLAY] Notification failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::surface::SurfaceError;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Create(SurfaceSpec),
        Resize(Size),
        MoveTo(Position),
        Visible(bool),
        PassThrough(bool),
        Notify(SurfaceNotification),
    }

    #[derive(Default)]
    struct FakeSurface {
        calls: Vec<Call>,
        fail_create: bool,
    }

    impl FakeSurface {
        fn creations(&self) -> usize {
            self.calls
                .iter()
                .filter(|c| matches!(c, Call::Create(_)))
                .count()
        }

        fn notifications(&self) -> Vec<&SurfaceNotification> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Notify(n) => Some(n),
                    _ => None,
                })
                .collect()
        }
    }

    impl Surface for FakeSurface {
        fn create(&mut self, spec: &SurfaceSpec) -> Result<(), SurfaceError> {
            if self.fail_create {
                return Err(SurfaceError::Window("no display".into()));
            }
            self.calls.push(Call::Create(*spec));
            Ok(())
        }
        fn resize(&mut self, size: Size) -> Result<(), SurfaceError> {
            self.calls.push(Call::Resize(size));
            Ok(())
        }
        fn move_to(&mut self, position: Position) -> Result<(), SurfaceError> {
            self.calls.push(Call::MoveTo(position));
            Ok(())
        }
        fn set_visible(&mut self, visible: bool) -> Result<(), SurfaceError> {
            self.calls.push(Call::Visible(visible));
            Ok(())
        }
        fn set_pass_through(&mut self, enabled: bool) -> Result<(), SurfaceError> {
            self.calls.push(Call::PassThrough(enabled));
            Ok(())
        }
        fn notify(&mut self, notification: &SurfaceNotification) -> Result<(), SurfaceError> {
            self.calls.push(Call::Notify(notification.clone()));
            Ok(())
        }
    }

    fn controller() -> OverlayController<FakeSurface> {
        OverlayController::new(FakeSurface::default())
    }

    fn size(w: u32, h: u32) -> Size {
        Size::new(w, h).unwrap()
    }

    // ── Opacity ─────────────────────────────────────────────────────────

    #[test]
    fn opacity_saturates_at_one() {
        let mut c = controller();
        for _ in 0..9 {
            c.adjust_opacity(0.1);
        }
        assert_eq!(c.state().opacity, 1.0);
    }

    #[test]
    fn opacity_saturates_at_minimum() {
        let mut c = controller();
        for _ in 0..20 {
            c.adjust_opacity(-0.1);
        }
        assert_eq!(c.state().opacity, 0.1);
    }

    #[test]
    fn opacity_stays_in_range_for_mixed_deltas() {
        let mut c = controller();
        for delta in [3.0, -0.25, -7.5, 0.33, 0.1, -0.1, 12.0, -0.05, f64::MAX, f64::MIN] {
            c.adjust_opacity(delta);
            let o = c.state().opacity;
            assert!((0.1..=1.0).contains(&o), "opacity out of range: {}", o);
        }
    }

    #[test]
    fn opacity_without_surface_is_recorded_silently() {
        let mut c = controller();
        c.set_opacity(0.8);
        assert_eq!(c.state().opacity, 0.8);
        assert!(c.surface().calls.is_empty());

        c.present("abc".into(), size(10, 10));
        let spec = match &c.surface().calls[0] {
            Call::Create(spec) => *spec,
            other => panic!("expected create, got {:?}", other),
        };
        assert_eq!(spec.size, size(10, 10));
        assert_eq!(c.state().opacity, 0.8);
    }

    #[test]
    fn opacity_change_notifies_existing_surface() {
        let mut c = controller();
        c.toggle();
        c.adjust_opacity(0.1);
        assert_eq!(
            c.surface().notifications(),
            vec![&SurfaceNotification::OpacityChanged(0.6)]
        );
    }

    #[test]
    fn nan_opacity_is_ignored() {
        let mut c = controller();
        c.set_opacity(f64::NAN);
        assert_eq!(c.state().opacity, 0.5);
    }

    // ── Present ─────────────────────────────────────────────────────────

    #[test]
    fn present_creates_at_last_known_position() {
        let mut c = controller();
        c.move_by(20, -30);
        c.present("img".into(), size(300, 600));

        let state = c.state();
        assert!(state.exists);
        assert!(state.visible);
        assert_eq!(state.size, size(300, 600));
        assert_eq!(state.position, Position::new(120, 70));
        assert_eq!(state.opacity, 0.5);
        assert_eq!(state.current_image, Some("img".into()));
        assert_eq!(
            c.surface().calls,
            vec![
                Call::Create(SurfaceSpec {
                    position: Position::new(120, 70),
                    size: size(300, 600),
                    mouse_pass_through: true,
                }),
                Call::Notify(SurfaceNotification::ImageReceived("img".into())),
                Call::Visible(true),
            ]
        );
    }

    #[test]
    fn second_present_resizes_instead_of_recreating() {
        let mut c = controller();
        c.present("first".into(), size(300, 600));
        c.present("second".into(), size(200, 100));

        assert_eq!(c.surface().creations(), 1);
        assert!(c.surface().calls.contains(&Call::Resize(size(200, 100))));
        assert_eq!(c.state().size, size(200, 100));
        assert_eq!(c.state().current_image, Some("second".into()));
    }

    #[test]
    fn repeated_identical_present_redelivers() {
        let mut c = controller();
        c.present("same".into(), size(50, 50));
        c.present("same".into(), size(50, 50));
        let images = c
            .surface()
            .notifications()
            .into_iter()
            .filter(|n| matches!(n, SurfaceNotification::ImageReceived(_)))
            .count();
        assert_eq!(images, 2);
    }

    #[test]
    fn present_shows_hidden_surface() {
        let mut c = controller();
        c.present("a".into(), size(10, 10));
        c.hide();
        assert!(!c.state().visible);
        c.present("b".into(), size(10, 10));
        assert!(c.state().visible);
    }

    #[test]
    fn failed_creation_leaves_surface_absent() {
        let mut c = OverlayController::new(FakeSurface {
            fail_create: true,
            ..Default::default()
        });
        c.present("img".into(), size(10, 20));
        assert!(!c.state().exists);
        assert!(!c.state().visible);
        assert_eq!(c.state().size, size(10, 20));
        assert_eq!(c.state().current_image, Some("img".into()));
    }

    // ── Toggle / hide ───────────────────────────────────────────────────

    #[test]
    fn toggle_creates_and_shows_when_absent() {
        let mut c = controller();
        c.toggle();
        assert!(c.state().exists);
        assert!(c.state().visible);
        assert!(c.state().current_image.is_none());
        assert_eq!(c.state().size, size(400, 800));
    }

    #[test]
    fn double_toggle_restores_visibility_only() {
        let mut c = controller();
        c.present("img".into(), size(320, 640));
        c.set_opacity(0.7);
        let before = c.state().clone();

        c.toggle();
        assert!(!c.state().visible);
        c.toggle();

        assert_eq!(c.state(), &before);
    }

    #[test]
    fn hide_keeps_surface_and_image() {
        let mut c = controller();
        c.present("img".into(), size(10, 10));
        c.hide();
        assert!(c.state().exists);
        assert!(!c.state().visible);
        assert_eq!(c.state().current_image, Some("img".into()));
        assert_eq!(c.surface().calls.last(), Some(&Call::Visible(false)));
    }

    #[test]
    fn hide_without_surface_touches_nothing() {
        let mut c = controller();
        c.hide();
        assert!(c.surface().calls.is_empty());
        assert!(!c.state().exists);
    }

    // ── Geometry ────────────────────────────────────────────────────────

    #[test]
    fn move_by_moves_existing_surface() {
        let mut c = controller();
        c.toggle();
        c.move_by(5, 7);
        assert_eq!(c.state().position, Position::new(105, 107));
        assert_eq!(c.surface().calls.last(), Some(&Call::MoveTo(Position::new(105, 107))));
    }

    #[test]
    fn record_geometry_does_not_call_back_into_surface() {
        let mut c = controller();
        c.present("img".into(), size(10, 10));
        let calls_before = c.surface().calls.len();

        c.record_geometry(Some(Position::new(-40, 12)), Some(size(640, 480)));

        assert_eq!(c.surface().calls.len(), calls_before);
        assert_eq!(c.state().position, Position::new(-40, 12));
        assert_eq!(c.state().size, size(640, 480));
    }

    #[test]
    fn stale_move_echo_does_not_rewind_drag() {
        let mut c = controller();
        c.toggle();
        c.move_by(10, 0);
        c.move_by(5, 5);
        // Echo of the first move arrives after the second was applied.
        c.record_geometry(Some(Position::new(110, 100)), None);
        assert_eq!(c.state().position, Position::new(115, 105));

        c.move_by(1, 1);
        assert_eq!(c.state().position, Position::new(116, 106));
        assert_eq!(c.surface().calls.last(), Some(&Call::MoveTo(Position::new(116, 106))));
    }

    #[test]
    fn echo_within_rounding_tolerance_is_ignored() {
        let mut c = controller();
        c.toggle();
        c.move_by(3, 3);
        c.move_by(3, 3);
        c.record_geometry(Some(Position::new(104, 102)), None);
        assert_eq!(c.state().position, Position::new(106, 106));
    }

    #[test]
    fn native_drag_after_echoes_is_recorded() {
        let mut c = controller();
        c.toggle();
        c.move_by(10, 10);
        c.record_geometry(Some(Position::new(110, 110)), None);
        // Window-manager drag to somewhere never requested.
        c.record_geometry(Some(Position::new(500, 40)), None);
        assert_eq!(c.state().position, Position::new(500, 40));

        c.move_by(-5, 0);
        assert_eq!(c.state().position, Position::new(495, 40));
    }

    #[test]
    fn native_drag_mid_sequence_clears_pending_moves() {
        let mut c = controller();
        c.toggle();
        c.move_by(10, 0);
        c.record_geometry(Some(Position::new(300, 300)), None);
        // The old target is no longer pending, so reporting it is a real move.
        c.record_geometry(Some(Position::new(110, 100)), None);
        assert_eq!(c.state().position, Position::new(110, 100));
    }

    #[test]
    fn record_geometry_partial_update() {
        let mut c = controller();
        c.record_geometry(None, Some(size(1, 2)));
        assert_eq!(c.state().position, Position::new(100, 100));
        assert_eq!(c.state().size, size(1, 2));
    }

    // ── Pass-through ────────────────────────────────────────────────────

    #[test]
    fn pass_through_is_remembered_for_creation() {
        let mut c = controller();
        c.set_mouse_pass_through(false);
        assert!(c.surface().calls.is_empty());
        c.toggle();
        assert!(matches!(
            c.surface().calls[0],
            Call::Create(SurfaceSpec { mouse_pass_through: false, .. })
        ));
        c.set_mouse_pass_through(true);
        assert_eq!(c.surface().calls.last(), Some(&Call::PassThrough(true)));
    }

    // ── Surface lifecycle ───────────────────────────────────────────────

    #[test]
    fn ready_redelivers_image_and_opacity() {
        let mut c = controller();
        c.present("img".into(), size(10, 10));
        c.surface_ready();
        let notes = c.surface().notifications();
        assert_eq!(
            &notes[notes.len() - 2..],
            &[
                &SurfaceNotification::ImageReceived("img".into()),
                &SurfaceNotification::OpacityChanged(0.5),
            ]
        );
    }

    #[test]
    fn ready_without_surface_is_noop() {
        let mut c = controller();
        c.surface_ready();
        assert!(c.surface().calls.is_empty());
    }

    #[test]
    fn destroyed_surface_is_recreated_with_last_state() {
        let mut c = controller();
        c.present("img".into(), size(300, 200));
        c.record_geometry(Some(Position::new(7, 8)), None);
        c.set_opacity(0.9);
        c.surface_destroyed();

        assert!(!c.state().exists);
        assert!(!c.state().visible);
        assert_eq!(c.state().current_image, Some("img".into()));

        c.toggle();
        assert_eq!(c.surface().creations(), 2);
        assert_eq!(
            c.surface().calls.iter().rev().find(|c| matches!(c, Call::Create(_))),
            Some(&Call::Create(SurfaceSpec {
                position: Position::new(7, 8),
                size: size(300, 200),
                mouse_pass_through: true,
            }))
        );
        assert_eq!(c.state().opacity, 0.9);
        assert!(c.state().visible);
    }

    // ── Snapshot ────────────────────────────────────────────────────────

    #[test]
    fn snapshot_returns_current_state() {
        let mut c = controller();
        c.set_opacity(0.3);
        let (tx, mut rx) = oneshot::channel();
        c.apply(OverlayCommand::Snapshot(tx));
        let snap = rx.try_recv().unwrap();
        assert_eq!(snap.opacity, 0.3);
    }
}

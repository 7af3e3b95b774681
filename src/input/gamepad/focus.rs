//! Window focus routing
//!
//! Gamepads are not bound to a window by the OS. Button and axis events go to
//! whichever window last gained focus; connect/disconnect goes to all of them.

use tracing::debug;

use super::window::WindowId;

/// Tracks the single window eligible for gamepad input
#[derive(Debug, Default, Clone, Copy)]
pub struct FocusRouter {
    focused: Option<WindowId>,
}

impl FocusRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.focused
    }

    pub fn is_focused(&self, window: WindowId) -> bool {
        self.focused == Some(window)
    }

    /// Apply a focus change reported by `window`
    ///
    /// A loss reported by a window that is not the focused one is stale and
    /// ignored.
    pub fn on_focus_changed(&mut self, window: WindowId, focused: bool) {
        if focused {
            debug!("Window {} focused", window);
            self.focused = Some(window);
        } else if self.is_focused(window) {
            debug!("Window {} lost focus", window);
            self.focused = None;
        }
    }

    /// Forget `window` if it held focus
    pub fn on_window_removed(&mut self, window: WindowId) {
        if self.is_focused(window) {
            self.focused = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_focus_moves_between_windows() {
        let mut focus = FocusRouter::new();
        assert_eq!(focus.focused(), None);

        focus.on_focus_changed(WindowId(1), true);
        focus.on_focus_changed(WindowId(2), true);
        assert_eq!(focus.focused(), Some(WindowId(2)));
    }

    #[test]
    fn test_stale_focus_loss_is_ignored() {
        let mut focus = FocusRouter::new();
        focus.on_focus_changed(WindowId(1), true);
        focus.on_focus_changed(WindowId(2), true);

        // Window 1's loss arrives after window 2 already took focus
        focus.on_focus_changed(WindowId(1), false);
        assert!(focus.is_focused(WindowId(2)));

        focus.on_focus_changed(WindowId(2), false);
        assert_eq!(focus.focused(), None);
    }

    #[test]
    fn test_removing_focused_window_clears_focus() {
        let mut focus = FocusRouter::new();
        focus.on_focus_changed(WindowId(4), true);
        focus.on_window_removed(WindowId(5));
        assert!(focus.is_focused(WindowId(4)));
        focus.on_window_removed(WindowId(4));
        assert_eq!(focus.focused(), None);
    }
}

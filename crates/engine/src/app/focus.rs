/// Active frames a regained window waits before capturing the mouse again.
pub const REFOCUS_SETTLE_FRAMES: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseMode {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FocusOutcome {
    /// Last mouse mode requested this frame, if any.
    pub mouse_mode: Option<MouseMode>,
    /// The mouse was captured again; the window may have moved screens meanwhile.
    pub recaptured: bool,
}

/// Release/refocus counter. Zero means focus is settled and the mouse is
/// captured.
#[derive(Debug, Default)]
pub struct FocusTracker {
    must_refocus: u8,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_settled(&self) -> bool {
        self.must_refocus == 0
    }

    pub fn must_refocus(&self) -> u8 {
        self.must_refocus
    }

    pub fn update(
        &mut self,
        window_active: bool,
        release_requested: bool,
        left_click: bool,
    ) -> FocusOutcome {
        let mut outcome = FocusOutcome::default();

        if !window_active {
            if self.must_refocus == 0 {
                outcome.mouse_mode = Some(MouseMode::Absolute);
            }
            self.must_refocus = 1;
        } else if release_requested {
            outcome.mouse_mode = Some(MouseMode::Absolute);
            self.must_refocus = 1;
        }

        if self.must_refocus > 0 && window_active {
            if self.must_refocus < REFOCUS_SETTLE_FRAMES {
                outcome.mouse_mode = Some(MouseMode::Absolute);
                self.must_refocus += 1;
            }

            if self.must_refocus >= REFOCUS_SETTLE_FRAMES || left_click {
                outcome.mouse_mode = Some(MouseMode::Relative);
                outcome.recaptured = true;
                self.must_refocus = 0;
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_focus_requests_nothing() {
        let mut focus = FocusTracker::new();
        for _ in 0..5 {
            assert_eq!(focus.update(true, false, false), FocusOutcome::default());
        }
        assert!(focus.is_settled());
    }

    #[test]
    fn losing_focus_releases_mouse_once() {
        let mut focus = FocusTracker::new();
        let first = focus.update(false, false, false);
        assert_eq!(first.mouse_mode, Some(MouseMode::Absolute));
        assert!(!focus.is_settled());

        let second = focus.update(false, false, false);
        assert_eq!(second.mouse_mode, None);
        assert_eq!(focus.must_refocus(), 1);
    }

    #[test]
    fn regained_focus_recaptures_after_two_active_frames() {
        let mut focus = FocusTracker::new();
        focus.update(false, false, false);

        let first_active = focus.update(true, false, false);
        assert_eq!(first_active.mouse_mode, Some(MouseMode::Absolute));
        assert!(!first_active.recaptured);

        let second_active = focus.update(true, false, false);
        assert_eq!(second_active.mouse_mode, Some(MouseMode::Relative));
        assert!(second_active.recaptured);
        assert!(focus.is_settled());
    }

    #[test]
    fn left_click_recaptures_immediately() {
        let mut focus = FocusTracker::new();
        focus.update(false, false, false);

        let outcome = focus.update(true, false, true);
        assert_eq!(outcome.mouse_mode, Some(MouseMode::Relative));
        assert!(outcome.recaptured);
        assert!(focus.is_settled());
    }

    #[test]
    fn release_request_while_active_starts_refocus_cycle() {
        let mut focus = FocusTracker::new();
        let outcome = focus.update(true, true, false);

        assert_eq!(outcome.mouse_mode, Some(MouseMode::Absolute));
        assert!(!outcome.recaptured);
        assert_eq!(focus.must_refocus(), 2);
    }
}

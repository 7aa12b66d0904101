use std::time::{Duration, Instant};

pub const MANUAL_SCROLL_DEBOUNCE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    Following,
    Pinned,
}

impl ScrollMode {
    pub fn label(self) -> &'static str {
        match self {
            ScrollMode::Following => "Following",
            ScrollMode::Pinned => "Pinned",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoscrollState {
    pub autoscroll_enabled: bool,
    /// Set by an upward gesture, cleared by the first reconciliation pass
    /// that runs after the debounce window.
    pub last_manual_scroll: Option<Instant>,
}

impl Default for AutoscrollState {
    fn default() -> Self {
        Self {
            autoscroll_enabled: true,
            last_manual_scroll: None,
        }
    }
}

/// Sentinel position in viewport coordinates (0 is the top of the viewport).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentinelGeometry {
    pub sentinel_bottom: f32,
    pub viewport_height: f32,
}

impl SentinelGeometry {
    pub fn is_visible(&self) -> bool {
        self.sentinel_bottom < self.viewport_height
    }
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// A manual gesture is still inside the debounce window.
    Debounced,
    /// The manual gesture settled; the view stays pinned.
    ManualSettled,
    /// Decided from sentinel geometry.
    Measured(ScrollMode),
}

/// Follows the bottom of the log until the user scrolls up. Scroll events
/// produced by the gesture itself are ignored for [`MANUAL_SCROLL_DEBOUNCE`]
/// so a measurement against unsettled layout cannot undo it.
#[derive(Debug, Default)]
pub struct AutoscrollController {
    state: AutoscrollState,
}

impl AutoscrollController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AutoscrollState {
        self.state
    }

    pub fn mode(&self) -> ScrollMode {
        if self.state.autoscroll_enabled {
            ScrollMode::Following
        } else {
            ScrollMode::Pinned
        }
    }

    pub fn is_following(&self) -> bool {
        self.state.autoscroll_enabled
    }

    pub fn on_manual_scroll_up(&mut self, at: Instant) {
        if self.state.autoscroll_enabled {
            tracing::debug!("manual scroll up, pinning");
        }
        self.state = AutoscrollState {
            autoscroll_enabled: false,
            last_manual_scroll: Some(at),
        };
    }

    /// `geometry` is `None` when the sentinel has not been laid out.
    pub fn reconcile(
        &mut self,
        now: Instant,
        has_content: bool,
        geometry: Option<SentinelGeometry>,
    ) -> Reconciliation {
        if let Some(at) = self.state.last_manual_scroll {
            if now.saturating_duration_since(at) < MANUAL_SCROLL_DEBOUNCE {
                tracing::trace!("reconcile suppressed by manual scroll debounce");
                return Reconciliation::Debounced;
            }
            self.state = AutoscrollState {
                autoscroll_enabled: false,
                last_manual_scroll: None,
            };
            return Reconciliation::ManualSettled;
        }

        // No content or no sentinel yet (e.g. just after loading): nothing
        // to hold position against, so follow.
        let mode = match geometry {
            Some(geometry) if has_content && !geometry.is_visible() => ScrollMode::Pinned,
            _ => ScrollMode::Following,
        };

        if mode != self.mode() {
            tracing::debug!(from = self.mode().label(), to = mode.label(), "autoscroll mode changed");
        }
        self.state = AutoscrollState {
            autoscroll_enabled: mode == ScrollMode::Following,
            last_manual_scroll: None,
        };
        Reconciliation::Measured(mode)
    }
}

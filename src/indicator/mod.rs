//! Transient mute indicator.
//!
//! A small overlay that fades in on every toggle, holds, then fades back
//! out. Rapid repeated toggles are the hard case: a naive single-timer
//! show/hide flickers when an old hide timer fires after a newer show.
//! Every deferred callback here captures the generation current when it
//! was scheduled and no-ops if a newer `show` has bumped it since, so
//! stale timers and stale fade completions are always safe.

pub mod overlay {
    #[cfg(windows)]
    mod win;
    #[cfg(windows)]
    pub use win::LayeredOverlay;
}

use std::time::Duration;

/// How long the indicator holds fully visible.
pub const DWELL: Duration = Duration::from_millis(900);

/// Fade-in animation length.
pub const FADE_IN: Duration = Duration::from_millis(100);

/// Fade-out animation length.
pub const FADE_OUT: Duration = Duration::from_millis(120);

/// What the indicator shows: microphone on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorStatus {
    On,
    Off,
}

/// Where the indicator is in its show/hide cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorPhase {
    Hidden,
    FadingIn,
    Visible,
    FadingOut,
}

/// A deferred callback, tagged with the generation captured when it was
/// scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorTimer {
    FadeInDone { generation: u64 },
    Hide { generation: u64 },
    FadeOutDone { generation: u64 },
}

/// The rendered overlay window, implemented per platform.
pub trait OverlaySurface {
    /// Update the rendered content for the given status.
    fn apply_status(&mut self, status: IndicatorStatus);

    /// Re-anchor to the screen under the current pointer location.
    fn move_to_pointer_screen(&mut self);

    /// Animate opacity to `opacity` over `fade`. A zero duration applies
    /// immediately and cancels any in-flight animation.
    fn set_opacity(&mut self, opacity: f32, fade: Duration);

    /// Bring the overlay on screen without stealing focus.
    fn order_front(&mut self);

    /// Remove the overlay from screen.
    fn order_out(&mut self);
}

/// Cooperative timer scheduling on the UI/event thread.
///
/// The host delivers each scheduled timer back into
/// [`IndicatorController::handle_timer`] after the delay. Delivery may be
/// late or out of order across generations; the generation check makes
/// that harmless, so hosts never need reliable cancellation.
pub trait TimerHost {
    fn schedule(&mut self, delay: Duration, timer: IndicatorTimer);
}

/// Drives the overlay's show/hold/fade cycle.
pub struct IndicatorController<S: OverlaySurface, T: TimerHost> {
    surface: S,
    timers: T,
    generation: u64,
    phase: IndicatorPhase,
    status: IndicatorStatus,
}

impl<S: OverlaySurface, T: TimerHost> IndicatorController<S, T> {
    pub fn new(surface: S, timers: T) -> Self {
        Self {
            surface,
            timers,
            generation: 0,
            phase: IndicatorPhase::Hidden,
            status: IndicatorStatus::On,
        }
    }

    /// Show the indicator with the given status and restart the hide
    /// countdown from scratch.
    pub fn show(&mut self, status: IndicatorStatus) {
        // Invalidate every previously scheduled timer and any in-flight
        // fade completion.
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;

        self.status = status;
        self.surface.apply_status(status);
        self.surface.move_to_pointer_screen();

        // Kill any mid-fade state immediately, then run the fade-in from
        // the right starting point.
        self.surface.set_opacity(1.0, Duration::ZERO);
        if self.phase == IndicatorPhase::Hidden {
            self.surface.set_opacity(0.0, Duration::ZERO);
            self.surface.order_front();
        }
        self.surface.set_opacity(1.0, FADE_IN);
        self.phase = IndicatorPhase::FadingIn;

        self.timers
            .schedule(FADE_IN, IndicatorTimer::FadeInDone { generation });
        self.timers
            .schedule(DWELL, IndicatorTimer::Hide { generation });
    }

    /// Deliver a previously scheduled timer.
    pub fn handle_timer(&mut self, timer: IndicatorTimer) {
        match timer {
            IndicatorTimer::FadeInDone { generation } => {
                if generation != self.generation {
                    return;
                }
                if self.phase == IndicatorPhase::FadingIn {
                    self.phase = IndicatorPhase::Visible;
                }
            }
            IndicatorTimer::Hide { generation } => {
                // A newer show superseded this countdown.
                if generation != self.generation {
                    return;
                }
                self.phase = IndicatorPhase::FadingOut;
                self.surface.set_opacity(0.0, FADE_OUT);
                self.timers
                    .schedule(FADE_OUT, IndicatorTimer::FadeOutDone { generation });
            }
            IndicatorTimer::FadeOutDone { generation } => {
                // A show could have started during the fade-out itself.
                if generation != self.generation {
                    return;
                }
                self.surface.order_out();
                // Reset for the next show.
                self.surface.set_opacity(1.0, Duration::ZERO);
                self.phase = IndicatorPhase::Hidden;
            }
        }
    }

    pub fn phase(&self) -> IndicatorPhase {
        self.phase
    }

    pub fn status(&self) -> IndicatorStatus {
        self.status
    }
}

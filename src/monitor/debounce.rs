use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

use super::classifier::VerdictKind;

/// Gates feedback on verdict stability and on the single-flight actuation
/// flag, so an unchanged verdict produces at most one actuation per
/// stabilization window and two actuations never overlap.
pub struct FeedbackDebouncer {
    window: Duration,
    last: Option<VerdictKind>,
    stable_since: Option<Instant>,
    in_flight: Arc<AtomicBool>,
}

impl FeedbackDebouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: None,
            stable_since: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Observe the current frame's verdict. Returns true when feedback
    /// should fire now.
    ///
    /// A changed verdict resets the stability clock and never fires. An
    /// unchanged verdict fires once it has been stable strictly longer than
    /// the window, provided no actuation is in flight; firing re-arms the
    /// clock so the next actuation needs a fresh full window.
    pub fn observe(&mut self, kind: VerdictKind, now: Instant) -> bool {
        if self.last != Some(kind) {
            self.last = Some(kind);
            self.stable_since = Some(now);
            return false;
        }

        let stable_since = match self.stable_since {
            Some(instant) => instant,
            None => {
                self.stable_since = Some(now);
                return false;
            }
        };

        if now.duration_since(stable_since) <= self.window {
            return false;
        }

        if self.in_flight.load(Ordering::SeqCst) {
            return false;
        }

        self.stable_since = Some(now);
        true
    }

    /// Mark an actuation as started. The returned flag must be cleared by
    /// the actuation task when it completes, success or failure.
    pub fn begin_actuation(&self) -> Arc<AtomicBool> {
        self.in_flight.store(true, Ordering::SeqCst);
        Arc::clone(&self.in_flight)
    }

    pub fn actuation_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

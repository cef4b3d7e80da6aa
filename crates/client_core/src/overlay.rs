//! Expiry scheduling for the self-decaying overlays.
//!
//! Two independent slots, one per overlay kind. Arming a slot cancels its
//! still-pending timer, so there is never more than one outstanding expiry
//! per kind and a left match can never be touched by a late firing.

use std::time::Duration;

use tokio::{sync::mpsc, task::JoinHandle, time::sleep};

use crate::state::Action;

/// How long a just-won trick stays on display before the area hands back to
/// the live trick.
pub const TRICK_DISPLAY: Duration = Duration::from_millis(1200);
/// How long the "player timed out" notice lingers.
pub const TIMEOUT_NOTICE: Duration = Duration::from_secs(3);

/// A cancellable one-shot timer. Each arming gets a fresh epoch; a firing
/// whose epoch is no longer current belongs to a superseded arming and must
/// be ignored.
struct TimerSlot {
    epoch: u64,
    pending: Option<JoinHandle<()>>,
}

impl TimerSlot {
    fn new() -> Self {
        Self {
            epoch: 0,
            pending: None,
        }
    }

    fn schedule(
        &mut self,
        delay: Duration,
        queue: &mpsc::UnboundedSender<Action>,
        expiry: fn(u64) -> Action,
    ) {
        self.cancel();
        self.epoch += 1;
        let epoch = self.epoch;
        let queue = queue.clone();
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            let _ = queue.send(expiry(epoch));
        }));
    }

    fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Watches the action stream and keeps the two expiry timers honest: each is
/// armed by its triggering action, re-armed when a newer one supersedes it,
/// and cancelled whenever something else clears the overlay out-of-band.
pub struct OverlayScheduler {
    trick: TimerSlot,
    timeout: TimerSlot,
    queue: mpsc::UnboundedSender<Action>,
}

impl OverlayScheduler {
    pub fn new(queue: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            trick: TimerSlot::new(),
            timeout: TimerSlot::new(),
            queue,
        }
    }

    /// Whether an action should reach the reducer at all. Everything passes
    /// except expiry firings from a superseded arming.
    pub fn admits(&self, action: &Action) -> bool {
        match action {
            Action::TrickDisplayElapsed { epoch } => self.trick.is_current(*epoch),
            Action::TimeoutNoticeElapsed { epoch } => self.timeout.is_current(*epoch),
            _ => true,
        }
    }

    /// Adjust the timers for an admitted action, before it is reduced.
    pub fn observe(&mut self, action: &Action) {
        match action {
            Action::TrickWon { .. } => {
                self.trick.schedule(TRICK_DISPLAY, &self.queue, |epoch| {
                    Action::TrickDisplayElapsed { epoch }
                });
            }
            Action::TurnTimedOut { .. } => {
                self.timeout.schedule(TIMEOUT_NOTICE, &self.queue, |epoch| {
                    Action::TimeoutNoticeElapsed { epoch }
                });
            }
            // These clear the trick display as part of their reduction, so
            // the pending expiry has nothing left to do.
            Action::StateReplaced(_) | Action::CardsDealt { .. } => {
                self.trick.cancel();
            }
            Action::Reset => {
                self.trick.cancel();
                self.timeout.cancel();
            }
            _ => {}
        }
    }
}

use tracing::debug;

use crate::shared::events::{ControllerEvent, EventSender, RevealOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reveal,
    Conceal,
}

/// Reports the end of a show/hide sequence back to the controller.
///
/// Dropping an unfinished guard (early return, panic, task abort) still sends
/// a completion, so the busy flag is always released.
pub struct CompletionGuard {
    events: EventSender,
    attempt: u64,
    phase: Phase,
    armed: bool,
}

impl CompletionGuard {
    pub fn reveal(events: EventSender, attempt: u64) -> Self {
        Self { events, attempt, phase: Phase::Reveal, armed: true }
    }

    pub fn conceal(events: EventSender, attempt: u64) -> Self {
        Self { events, attempt, phase: Phase::Conceal, armed: true }
    }

    pub fn finish(mut self, event: ControllerEvent) {
        self.armed = false;
        self.send(event);
    }

    fn send(&self, event: ControllerEvent) {
        if self.events.send(event).is_err() {
            debug!(attempt = self.attempt, "controller gone, completion dropped");
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let event = match self.phase {
            Phase::Reveal => ControllerEvent::RevealFinished {
                attempt: self.attempt,
                outcome: RevealOutcome::Abandoned,
            },
            Phase::Conceal => ControllerEvent::ConcealFinished { attempt: self.attempt },
        };
        self.send(event);
    }
}

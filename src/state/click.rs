//! Single- vs double-click disambiguation for topic headers.
//!
//! The first click starts a window timer; whichever of "second click" or
//! "timer expiry" comes first decides the outcome and the other becomes a
//! no-op. Each pending click carries a ticket so a late timer from an earlier
//! window can never fire a single action.

pub(crate) const DOUBLE_CLICK_WINDOW_MS: i32 = 300;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum ClickPhase {
    #[default]
    Idle,
    PendingSingle {
        ticket: u32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ClickOutcome {
    /// First click: start the window timer and report back with `ticket`.
    StartTimer { ticket: u32 },
    /// Second click inside the window: cancel `timer` and run the double action.
    Double { timer: Option<i32> },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ClickGate {
    phase: ClickPhase,
    next_ticket: u32,
    timer: Option<i32>,
}

impl ClickGate {
    #[cfg(test)]
    pub(crate) fn phase(&self) -> ClickPhase {
        self.phase
    }

    pub(crate) fn on_click(&mut self) -> ClickOutcome {
        match self.phase {
            ClickPhase::Idle => {
                let ticket = self.next_ticket;
                self.next_ticket = self.next_ticket.wrapping_add(1);
                self.phase = ClickPhase::PendingSingle { ticket };
                self.timer = None;
                ClickOutcome::StartTimer { ticket }
            }
            ClickPhase::PendingSingle { .. } => {
                self.phase = ClickPhase::Idle;
                ClickOutcome::Double {
                    timer: self.timer.take(),
                }
            }
        }
    }

    /// Remember the host timer started for the pending click.
    pub(crate) fn arm(&mut self, ticket: u32, handle: i32) {
        if self.phase == (ClickPhase::PendingSingle { ticket }) {
            self.timer = Some(handle);
        }
    }

    /// Window timer fired. True when the single action should run.
    pub(crate) fn on_timeout(&mut self, ticket: u32) -> bool {
        if self.phase == (ClickPhase::PendingSingle { ticket }) {
            self.phase = ClickPhase::Idle;
            self.timer = None;
            true
        } else {
            false
        }
    }
}

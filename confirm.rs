/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Modal yes/no gate for destructive actions.
//!
//! The gate holds at most one pending side-effecting action. Confirming
//! runs it exactly once no matter how fast the confirm control is hit;
//! cancelling drops it with no other state change. Arming while a dialog is
//! already pending replaces it: the newer dialog wins and the replaced
//! action never runs.

pub struct ConfirmationGate {
    pending: Option<PendingConfirmation>,
}

struct PendingConfirmation {
    message: String,
    action: Box<dyn FnOnce()>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self { pending: None }
    }

    /// Arm the gate with a message and the action to run on confirmation.
    pub fn present(&mut self, message: impl Into<String>, action: impl FnOnce() + 'static) {
        self.pending = Some(PendingConfirmation {
            message: message.into(),
            action: Box::new(action),
        });
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    pub fn message(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.message.as_str())
    }

    /// Run the pending action. Returns `true` if an action ran; repeated
    /// calls are no-ops until the gate is armed again.
    pub fn confirm(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                (pending.action)();
                true
            }
            None => false,
        }
    }

    /// Discard the pending action, leaving all other state unchanged.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

impl Default for ConfirmationGate {
    fn default() -> Self {
        Self::new()
    }
}

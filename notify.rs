/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Transient user notifications.
//!
//! Stands in for the host's toast widget: views and forms push outcomes
//! here, the host drains and renders them. Nothing in this queue is
//! load-bearing; dropping it loses nothing but feedback.

use std::sync::Mutex;

use log::debug;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Failure,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Default)]
pub struct Notifier {
    queue: Mutex<Vec<Toast>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_success(&self, message: impl Into<String>) {
        self.push(ToastKind::Success, message.into());
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.push(ToastKind::Failure, message.into());
    }

    fn push(&self, kind: ToastKind, message: String) {
        debug!("toast ({kind:?}): {message}");
        if let Ok(mut queue) = self.queue.lock() {
            queue.push(Toast {
                id: Uuid::new_v4(),
                kind,
                message,
            });
        }
    }

    /// Take every queued toast, oldest first.
    pub fn drain(&self) -> Vec<Toast> {
        match self.queue.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }
}

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! List view-models over the collection store.
//!
//! A view owns its fetch key and a subscription to it, projects the cached
//! collection into display rows, and routes destructive actions through the
//! confirmation gate. Rendering stays with the host; the view hands it a
//! [`ListPhase`] and reacts to change notifications.

pub mod companies;
pub mod users;

pub use companies::{CompanyList, CompanyRow};
pub use users::{UserList, UserRow, UserScope};

use log::warn;

use crate::api::ApiError;
use crate::model::Record;
use crate::store::EntrySnapshot;

/// What a list renders right now.
#[derive(Clone, Debug, PartialEq)]
pub enum ListPhase<R> {
    /// Initial fetch has not resolved: placeholder, no table.
    Loading,
    /// Fetch failed: error placeholder, no table.
    Failed(ApiError),
    Ready(Vec<R>),
}

/// Project a cache entry into a phase, numbering rows 1-based in fetch
/// order. Records the projection cannot decode are skipped; the numbering
/// stays contiguous.
pub(crate) fn phase_from_snapshot<R>(
    snapshot: EntrySnapshot,
    mut project: impl FnMut(usize, &Record) -> Option<R>,
) -> ListPhase<R> {
    if let Some(error) = snapshot.error {
        return ListPhase::Failed(error);
    }
    let Some(data) = snapshot.data else {
        return ListPhase::Loading;
    };
    let mut rows = Vec::with_capacity(data.len());
    for record in data.iter() {
        let index = rows.len() + 1;
        match project(index, record) {
            Some(row) => rows.push(row),
            None => warn!("skipping row for record {}: undecodable", record.id()),
        }
    }
    ListPhase::Ready(rows)
}

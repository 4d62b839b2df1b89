/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Client-side core for the training-request backoffice.
//!
//! This crate owns the data-fetching and form-state layer of the
//! administrative front-end: a keyed remote-collection store with
//! de-duplication and explicit invalidation, list view-models with
//! role-gated actions, a confirmation gate for destructive mutations,
//! and a controlled form draft with server-side validation surfacing.
//! Rendering, routing, and authentication stay with the host.

pub mod api;
pub mod config;
pub mod confirm;
pub mod form;
pub mod model;
pub mod notify;
pub mod store;
pub mod views;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The user list (`/usuario/rol/{roleId}`), toggling between the
//! instructor-role and person-role sub-collections.

use std::sync::Arc;

use log::{debug, warn};
use url::Url;

use crate::api;
use crate::config::{AppConfig, Role};
use crate::confirm::ConfirmationGate;
use crate::model::Person;
use crate::notify::Notifier;
use crate::store::{CollectionStore, FetchKey, Subscription};
use crate::views::{ListPhase, phase_from_snapshot};

/// Which role-filtered sub-collection the list shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserScope {
    Instructors,
    Persons,
}

impl UserScope {
    fn role(self) -> Role {
        match self {
            Self::Instructors => Role::Instructor,
            Self::Persons => Role::Person,
        }
    }

    fn toggled(self) -> Self {
        match self {
            Self::Instructors => Self::Persons,
            Self::Persons => Self::Instructors,
        }
    }
}

/// One rendered user row.
#[derive(Clone, Debug, PartialEq)]
pub struct UserRow {
    /// 1-based synthetic index in fetch order.
    pub index: usize,
    pub id: String,
    pub full_name: String,
    pub celular: String,
    pub correo_electronico: String,
    pub photo_url: Option<Url>,
    pub can_manage: bool,
}

pub struct UserList {
    store: Arc<CollectionStore>,
    config: Arc<AppConfig>,
    notifier: Arc<Notifier>,
    role: Role,
    scope: UserScope,
    key: FetchKey,
    subscription: Subscription,
}

impl UserList {
    /// Starts in instructor scope, like the page it models.
    pub fn new(
        store: Arc<CollectionStore>,
        config: Arc<AppConfig>,
        notifier: Arc<Notifier>,
        role: Role,
    ) -> Self {
        let scope = UserScope::Instructors;
        let key = FetchKey::from_url(&api::users_by_role_url(&config, scope.role()));
        let subscription = store.subscribe(&key);
        // Fetch on construction; rendering only reads the entry.
        store.observe(&key);
        Self {
            store,
            config,
            notifier,
            role,
            scope,
            key,
            subscription,
        }
    }

    pub fn scope(&self) -> UserScope {
        self.scope
    }

    pub fn key(&self) -> &FetchKey {
        &self.key
    }

    pub fn changed(&self) -> bool {
        self.subscription.try_changed()
    }

    /// Header for the active scope.
    pub fn title(&self) -> &'static str {
        match self.scope {
            UserScope::Instructors => "Instructores",
            UserScope::Persons => "Personas",
        }
    }

    /// Label for the toggle affordance: names the scope it switches to.
    pub fn toggle_label(&self) -> &'static str {
        match self.scope {
            UserScope::Instructors => "Visualizar Personas",
            UserScope::Persons => "Visualizar instructores",
        }
    }

    /// Create and toggle affordances render only for admins.
    pub fn can_manage(&self) -> bool {
        self.role == Role::Admin
    }

    /// Switch to the given scope, re-keying the fetch. Setting the active
    /// scope again is a no-op; no reload is required either way.
    pub fn set_scope(&mut self, scope: UserScope) {
        if scope == self.scope {
            return;
        }
        self.scope = scope;
        self.key = FetchKey::from_url(&api::users_by_role_url(&self.config, scope.role()));
        self.subscription = self.store.subscribe(&self.key);
        self.store.observe(&self.key);
    }

    pub fn toggle_scope(&mut self) {
        self.set_scope(self.scope.toggled());
    }

    pub fn phase(&self) -> ListPhase<UserRow> {
        let can_manage = self.role == Role::Admin;
        let snapshot = self.store.observe(&self.key);
        phase_from_snapshot(snapshot, |index, record| {
            let person: Person = record.decode().ok()?;
            Some(UserRow {
                index,
                full_name: person.display_name(),
                id: person.id,
                celular: person.celular,
                correo_electronico: person.correo_electronico,
                photo_url: person.foto.as_deref().map(|foto| self.config.upload_url(foto)),
                can_manage,
            })
        })
    }

    /// Same contract as the company list's delete: confirmation first, the
    /// round trip on a store worker, toast and invalidation only on an ok
    /// outcome.
    pub fn request_delete(&self, gate: &mut ConfirmationGate, row: &UserRow) {
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let url = api::user_url(&self.config, &row.id);
        let key = self.key.clone();
        let full_name = row.full_name.clone();
        gate.present(
            format!("¿Desea eliminar el usuario {full_name}?"),
            move || {
                let worker_store = Arc::clone(&store);
                store.spawn_mutation(move || {
                    let transport = worker_store.transport();
                    match api::delete_record(transport.as_ref(), &url) {
                        Ok(outcome) if outcome.ok => {
                            notifier.push_success("Usuario eliminado satisfactoriamente");
                            worker_store.invalidate(&key);
                        }
                        Ok(outcome) => {
                            debug!(
                                "delete of usuario {full_name} reported not-ok ({:?}); no feedback",
                                outcome.error
                            );
                        }
                        Err(error) => {
                            warn!("delete of usuario {full_name} failed: {error}");
                        }
                    }
                });
            },
        );
    }
}

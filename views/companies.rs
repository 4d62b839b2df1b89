/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The company list (`/empresa`).

use std::sync::Arc;

use log::{debug, warn};
use url::Url;

use crate::api;
use crate::config::{AppConfig, Role};
use crate::confirm::ConfirmationGate;
use crate::model::Company;
use crate::notify::Notifier;
use crate::store::{CollectionStore, FetchKey, Subscription};
use crate::views::{ListPhase, phase_from_snapshot};

/// One rendered company row.
#[derive(Clone, Debug, PartialEq)]
pub struct CompanyRow {
    /// 1-based synthetic index in fetch order.
    pub index: usize,
    pub id: String,
    pub razon_social: String,
    pub celular: String,
    pub correo_electronico: String,
    pub photo_url: Option<Url>,
    /// Edit/delete controls render only for admins.
    pub can_manage: bool,
}

pub struct CompanyList {
    store: Arc<CollectionStore>,
    config: Arc<AppConfig>,
    notifier: Arc<Notifier>,
    role: Role,
    key: FetchKey,
    subscription: Subscription,
}

impl CompanyList {
    pub fn new(
        store: Arc<CollectionStore>,
        config: Arc<AppConfig>,
        notifier: Arc<Notifier>,
        role: Role,
    ) -> Self {
        let key = FetchKey::from_url(&api::companies_url(&config));
        let subscription = store.subscribe(&key);
        // Fetch on construction; rendering only reads the entry.
        store.observe(&key);
        Self {
            store,
            config,
            notifier,
            role,
            key,
            subscription,
        }
    }

    pub fn key(&self) -> &FetchKey {
        &self.key
    }

    /// Did the underlying collection change since the last check?
    pub fn changed(&self) -> bool {
        self.subscription.try_changed()
    }

    /// The create affordance renders only for admins.
    pub fn can_create(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn phase(&self) -> ListPhase<CompanyRow> {
        let can_manage = self.role == Role::Admin;
        let snapshot = self.store.observe(&self.key);
        phase_from_snapshot(snapshot, |index, record| {
            let company: Company = record.decode().ok()?;
            Some(CompanyRow {
                index,
                id: company.id,
                razon_social: company.razon_social,
                celular: company.celular,
                correo_electronico: company.correo_electronico,
                photo_url: company.foto.as_deref().map(|foto| self.config.upload_url(foto)),
                can_manage,
            })
        })
    }

    /// Route a row's delete through the confirmation gate. Confirming spawns
    /// the round trip on a store worker, so the confirming thread returns
    /// immediately; when the backend signals success, a toast is pushed and
    /// the feeding key invalidated so the list refetches. A not-ok outcome
    /// stays silent.
    pub fn request_delete(&self, gate: &mut ConfirmationGate, row: &CompanyRow) {
        let store = Arc::clone(&self.store);
        let notifier = Arc::clone(&self.notifier);
        let url = api::company_url(&self.config, &row.id);
        let key = self.key.clone();
        let razon_social = row.razon_social.clone();
        gate.present(
            format!("¿Desea eliminar la empresa {razon_social}?"),
            move || {
                let worker_store = Arc::clone(&store);
                store.spawn_mutation(move || {
                    let transport = worker_store.transport();
                    match api::delete_record(transport.as_ref(), &url) {
                        Ok(outcome) if outcome.ok => {
                            notifier.push_success("Empresa eliminada satisfactoriamente");
                            worker_store.invalidate(&key);
                        }
                        Ok(outcome) => {
                            debug!(
                                "delete of empresa {razon_social} reported not-ok ({:?}); no feedback",
                                outcome.error
                            );
                        }
                        Err(error) => {
                            warn!("delete of empresa {razon_social} failed: {error}");
                        }
                    }
                });
            },
        );
    }
}

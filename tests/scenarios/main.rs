/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! End-to-end scenarios over the public surface, driven through a scripted
//! transport: shared fetches, delete-with-confirmation round trips, form
//! submission outcomes, and the deliberate silent-failure gaps.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde_json::{Value, json};
use url::Url;

use backoffice::api::{ApiError, ApiTransport};
use backoffice::config::{AppConfig, Role, RoleTokens};
use backoffice::confirm::ConfirmationGate;
use backoffice::form::{RequestForm, SubmitStatus};
use backoffice::model::Record;
use backoffice::notify::{Notifier, ToastKind};
use backoffice::store::CollectionStore;
use backoffice::views::{CompanyList, CompanyRow, ListPhase};

const SETTLE: Duration = Duration::from_secs(5);

/// Scripted backend: canned GET bodies per path, a programmable delete
/// pair, and capture of every save payload.
#[derive(Default)]
struct ScriptedBackend {
    get_bodies: Mutex<Vec<(String, Value)>>,
    get_calls: AtomicUsize,
    delete_response: Mutex<Value>,
    delete_calls: Mutex<Vec<String>>,
    save_response: Mutex<Value>,
    save_calls: Mutex<Vec<(String, Value)>>,
}

impl ScriptedBackend {
    fn new() -> Self {
        let backend = Self::default();
        *backend.delete_response.lock().unwrap() = json!([null, true]);
        *backend.save_response.lock().unwrap() = json!({"id": "1"});
        backend
    }

    fn script_get(&self, path: &str, body: Value) {
        let mut bodies = self.get_bodies.lock().unwrap();
        bodies.retain(|(scripted, _)| scripted != path);
        bodies.push((path.to_string(), body));
    }
}

impl ApiTransport for ScriptedBackend {
    fn get_json(&self, url: &Url) -> Result<Value, ApiError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let bodies = self.get_bodies.lock().unwrap();
        bodies
            .iter()
            .find(|(path, _)| path == url.path())
            .map(|(_, body)| Ok(body.clone()))
            .unwrap_or(Err(ApiError::HttpStatus(404)))
    }

    fn delete_json(&self, url: &Url) -> Result<Value, ApiError> {
        self.delete_calls.lock().unwrap().push(url.path().to_string());
        Ok(self.delete_response.lock().unwrap().clone())
    }

    fn post_json(&self, _url: &Url, body: &Value) -> Result<Value, ApiError> {
        self.save_calls
            .lock()
            .unwrap()
            .push(("POST".to_string(), body.clone()));
        Ok(self.save_response.lock().unwrap().clone())
    }

    fn put_json(&self, _url: &Url, body: &Value) -> Result<Value, ApiError> {
        self.save_calls
            .lock()
            .unwrap()
            .push(("PUT".to_string(), body.clone()));
        Ok(self.save_response.lock().unwrap().clone())
    }
}

struct Harness {
    backend: Arc<ScriptedBackend>,
    store: Arc<CollectionStore>,
    config: Arc<AppConfig>,
    notifier: Arc<Notifier>,
}

fn harness() -> Harness {
    let backend = Arc::new(ScriptedBackend::new());
    backend.script_get(
        "/empresa",
        json!([{
            "id": "1",
            "razonSocial": "Acme",
            "celular": "3000000000",
            "correoElectronico": "a@x.com",
        }]),
    );
    let store = Arc::new(CollectionStore::new(
        Arc::clone(&backend) as Arc<dyn ApiTransport>
    ));
    let config = Arc::new(
        AppConfig::new(
            Url::parse("http://api.local:3000").unwrap(),
            RoleTokens::new("1", "2", "3", "4"),
        )
        .unwrap(),
    );
    Harness {
        backend,
        store,
        config,
        notifier: Arc::new(Notifier::new()),
    }
}

fn company_list(h: &Harness, role: Role) -> CompanyList {
    CompanyList::new(
        Arc::clone(&h.store),
        Arc::clone(&h.config),
        Arc::clone(&h.notifier),
        role,
    )
}

#[test]
fn concurrent_consumers_share_one_fetch_and_one_result() {
    let h = harness();
    let admin_list = company_list(&h, Role::Admin);
    let guest_list = company_list(&h, Role::Person);

    // Both views observe the same key before anything resolves.
    assert!(matches!(admin_list.phase(), ListPhase::Loading));
    assert!(matches!(guest_list.phase(), ListPhase::Loading));
    assert!(h.store.settle(SETTLE));

    let ListPhase::Ready(admin_rows) = admin_list.phase() else {
        panic!("expected ready phase");
    };
    let ListPhase::Ready(guest_rows) = guest_list.phase() else {
        panic!("expected ready phase");
    };
    assert_eq!(h.backend.get_calls.load(Ordering::SeqCst), 1);
    assert_eq!(admin_rows[0].id, guest_rows[0].id);
    assert_eq!(admin_rows[0].razon_social, guest_rows[0].razon_social);
    assert!(admin_list.changed());
    assert!(guest_list.changed());
}

#[test]
fn concurrent_consumers_share_one_error() {
    let h = harness();
    h.backend.get_bodies.lock().unwrap().clear();
    let list_a = company_list(&h, Role::Admin);
    let list_b = company_list(&h, Role::Admin);
    assert!(h.store.settle(SETTLE));

    assert_eq!(h.backend.get_calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        list_a.phase(),
        ListPhase::Failed(ApiError::HttpStatus(404))
    ));
    assert!(matches!(
        list_b.phase(),
        ListPhase::Failed(ApiError::HttpStatus(404))
    ));
}

#[test]
fn rendered_company_table_matches_the_observed_page() {
    let h = harness();
    let admin_list = company_list(&h, Role::Admin);
    admin_list.phase();
    assert!(h.store.settle(SETTLE));

    let ListPhase::Ready(rows) = admin_list.phase() else {
        panic!("expected ready phase");
    };
    let row = &rows[0];
    assert_eq!(row.index, 1);
    assert_eq!(row.razon_social, "Acme");
    assert_eq!(row.celular, "3000000000");
    assert_eq!(row.correo_electronico, "a@x.com");
    assert!(row.can_manage);
    assert!(admin_list.can_create());

    let visitor_list = company_list(&h, Role::Company);
    let ListPhase::Ready(rows) = visitor_list.phase() else {
        panic!("expected ready phase");
    };
    assert!(!rows[0].can_manage);
    assert!(!visitor_list.can_create());
}

#[test]
fn confirmed_delete_hits_the_endpoint_notifies_and_refreshes_the_list() {
    let h = harness();
    let list = company_list(&h, Role::Admin);
    list.phase();
    assert!(h.store.settle(SETTLE));
    let ListPhase::Ready(rows) = list.phase() else {
        panic!("expected ready phase");
    };
    list.changed();

    // The collection shrinks after the delete.
    h.backend.script_get("/empresa", json!([]));
    let mut gate = ConfirmationGate::new();
    list.request_delete(&mut gate, &rows[0]);
    assert_eq!(gate.message(), Some("¿Desea eliminar la empresa Acme?"));
    assert!(gate.confirm());
    assert!(h.store.settle(SETTLE));

    assert_eq!(
        h.backend.delete_calls.lock().unwrap().as_slice(),
        ["/empresa/1"]
    );
    let toasts = h.notifier.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Success);
    assert_eq!(toasts[0].message, "Empresa eliminada satisfactoriamente");

    // The invalidation refetched without a reload.
    assert!(list.changed());
    let ListPhase::Ready(rows) = list.phase() else {
        panic!("expected ready phase");
    };
    assert!(rows.is_empty());
}

#[test]
fn cancelled_delete_leaves_everything_unchanged() {
    let h = harness();
    let list = company_list(&h, Role::Admin);
    list.phase();
    assert!(h.store.settle(SETTLE));
    let ListPhase::Ready(rows) = list.phase() else {
        panic!("expected ready phase");
    };

    let mut gate = ConfirmationGate::new();
    list.request_delete(&mut gate, &rows[0]);
    gate.cancel();
    assert!(!gate.confirm());

    assert!(h.backend.delete_calls.lock().unwrap().is_empty());
    assert!(h.notifier.drain().is_empty());
}

#[test]
fn confirm_fires_the_delete_exactly_once_under_rapid_clicks() {
    let h = harness();
    let list = company_list(&h, Role::Admin);
    list.phase();
    assert!(h.store.settle(SETTLE));
    let ListPhase::Ready(rows) = list.phase() else {
        panic!("expected ready phase");
    };

    let mut gate = ConfirmationGate::new();
    list.request_delete(&mut gate, &rows[0]);
    assert!(gate.confirm());
    assert!(!gate.confirm());
    assert!(!gate.confirm());
    assert!(h.store.settle(SETTLE));

    assert_eq!(h.backend.delete_calls.lock().unwrap().len(), 1);
}

#[test]
fn confirm_returns_before_the_delete_round_trip_finishes() {
    struct SlowDeleteBackend {
        deletes: AtomicUsize,
    }

    impl ApiTransport for SlowDeleteBackend {
        fn get_json(&self, _url: &Url) -> Result<Value, ApiError> {
            Ok(json!([]))
        }
        fn delete_json(&self, _url: &Url) -> Result<Value, ApiError> {
            std::thread::sleep(Duration::from_millis(400));
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Ok(json!([null, true]))
        }
        fn post_json(&self, _url: &Url, _body: &Value) -> Result<Value, ApiError> {
            Err(ApiError::Network)
        }
        fn put_json(&self, _url: &Url, _body: &Value) -> Result<Value, ApiError> {
            Err(ApiError::Network)
        }
    }

    let backend = Arc::new(SlowDeleteBackend {
        deletes: AtomicUsize::new(0),
    });
    let store = Arc::new(CollectionStore::new(
        Arc::clone(&backend) as Arc<dyn ApiTransport>
    ));
    let config = Arc::new(
        AppConfig::new(
            Url::parse("http://api.local:3000").unwrap(),
            RoleTokens::new("1", "2", "3", "4"),
        )
        .unwrap(),
    );
    let notifier = Arc::new(Notifier::new());
    let list = CompanyList::new(
        Arc::clone(&store),
        config,
        Arc::clone(&notifier),
        Role::Admin,
    );
    assert!(store.settle(SETTLE));
    let row = CompanyRow {
        index: 1,
        id: "1".to_string(),
        razon_social: "Acme".to_string(),
        celular: String::new(),
        correo_electronico: String::new(),
        photo_url: None,
        can_manage: true,
    };

    let mut gate = ConfirmationGate::new();
    list.request_delete(&mut gate, &row);
    let confirmed_at = Instant::now();
    assert!(gate.confirm());
    // The round trip holds the transport for 400ms; confirming must not.
    assert!(confirmed_at.elapsed() < Duration::from_millis(200));

    assert!(store.settle(SETTLE));
    assert_eq!(backend.deletes.load(Ordering::SeqCst), 1);
    let toasts = notifier.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Success);
}

#[test]
fn not_ok_delete_outcome_stays_silent_and_skips_invalidation() {
    let h = harness();
    let list = company_list(&h, Role::Admin);
    list.phase();
    assert!(h.store.settle(SETTLE));
    let ListPhase::Ready(rows) = list.phase() else {
        panic!("expected ready phase");
    };
    list.changed();
    let fetches_before = h.backend.get_calls.load(Ordering::SeqCst);

    *h.backend.delete_response.lock().unwrap() = json!([null, false]);
    let mut gate = ConfirmationGate::new();
    list.request_delete(&mut gate, &rows[0]);
    assert!(gate.confirm());
    assert!(h.store.settle(SETTLE));

    // The call went out, but no toast and no refetch followed.
    assert_eq!(h.backend.delete_calls.lock().unwrap().len(), 1);
    assert!(h.notifier.drain().is_empty());
    assert!(!list.changed());
    assert_eq!(h.backend.get_calls.load(Ordering::SeqCst), fetches_before);
}

#[test]
fn seeded_form_submitted_unchanged_resends_the_owned_fields_verbatim() {
    let h = harness();
    let seed = json!({
        "id": "12",
        "origenSolicitud": "2",
        "radicadoSolicitud": "R-2024-001",
        "segmento": "3",
        "tipoSolicitud": "1",
        "cuposSolicitados": "25",
        "estadoSolicitud": "1",
        "motivoSolicitud": "10",
        "usuarioId": "7",
        "cursoComplementarioId": "c1",
    });
    let mut record_value = seed.clone();
    record_value["usuario"] = json!({"id": "7", "nombres": "Ana", "apellidos": "Rojas"});
    let record = Record::from_value(record_value).unwrap();

    let mut form = RequestForm::with_record(
        Arc::clone(&h.store),
        Arc::clone(&h.config),
        Arc::clone(&h.notifier),
        &record,
    );
    assert_eq!(form.submit(), SubmitStatus::Saved);

    let saves = h.backend.save_calls.lock().unwrap();
    assert_eq!(saves.len(), 1);
    let (method, payload) = &saves[0];
    assert_eq!(method, "PUT");
    assert_eq!(payload, &seed);
}

#[test]
fn missing_required_field_blocks_before_any_network_call() {
    let h = harness();
    let mut form = RequestForm::new(
        Arc::clone(&h.store),
        Arc::clone(&h.config),
        Arc::clone(&h.notifier),
    );
    form.set_field("origenSolicitud", "1");

    let SubmitStatus::Blocked(missing) = form.submit() else {
        panic!("expected blocked status");
    };
    assert!(missing.contains(&"radicadoSolicitud"));
    assert!(h.backend.save_calls.lock().unwrap().is_empty());
}

#[test]
fn validation_rejection_keeps_the_draft_and_pins_the_message_to_its_field() {
    let h = harness();
    *h.backend.save_response.lock().unwrap() = json!({
        "statusCode": 400,
        "errors": [{"field": "razonSocial", "message": "required"}],
    });
    let mut form = RequestForm::new(
        Arc::clone(&h.store),
        Arc::clone(&h.config),
        Arc::clone(&h.notifier),
    );
    form.set_field("origenSolicitud", "1");
    form.set_field("radicadoSolicitud", "R-1");
    form.set_field("segmento", "3");
    form.set_field("tipoSolicitud", "1");
    form.set_field("cuposSolicitados", "25");
    form.set_field("estadoSolicitud", "1");
    form.set_field("motivoSolicitud", "7");
    form.set_field("cursoComplementarioId", "c1");

    assert_eq!(form.submit(), SubmitStatus::Rejected);
    assert_eq!(form.errors_for("razonSocial"), vec!["required"]);
    assert_eq!(form.value("radicadoSolicitud"), Some("R-1"));

    let toasts = h.notifier.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Failure);
}

#[test]
fn network_failure_on_submit_keeps_the_draft_and_reports_generically() {
    struct DownBackend;
    impl ApiTransport for DownBackend {
        fn get_json(&self, _url: &Url) -> Result<Value, ApiError> {
            Err(ApiError::Network)
        }
        fn delete_json(&self, _url: &Url) -> Result<Value, ApiError> {
            Err(ApiError::Network)
        }
        fn post_json(&self, _url: &Url, _body: &Value) -> Result<Value, ApiError> {
            Err(ApiError::Network)
        }
        fn put_json(&self, _url: &Url, _body: &Value) -> Result<Value, ApiError> {
            Err(ApiError::Network)
        }
    }

    let store = Arc::new(CollectionStore::new(Arc::new(DownBackend)));
    let config = Arc::new(
        AppConfig::new(
            Url::parse("http://api.local:3000").unwrap(),
            RoleTokens::new("1", "2", "3", "4"),
        )
        .unwrap(),
    );
    let notifier = Arc::new(Notifier::new());
    let mut form = RequestForm::new(store, config, Arc::clone(&notifier));
    form.set_field("origenSolicitud", "1");
    form.set_field("radicadoSolicitud", "R-1");
    form.set_field("segmento", "3");
    form.set_field("tipoSolicitud", "1");
    form.set_field("cuposSolicitados", "25");
    form.set_field("estadoSolicitud", "1");
    form.set_field("motivoSolicitud", "7");
    form.set_field("cursoComplementarioId", "c1");

    assert_eq!(form.submit(), SubmitStatus::Failed(ApiError::Network));
    assert_eq!(form.value("radicadoSolicitud"), Some("R-1"));

    let toasts = notifier.drain();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].kind, ToastKind::Failure);
    assert_eq!(toasts[0].message, "Error al guardar la solicitud");
}

#[test]
fn smoke_version_is_populated() {
    assert!(!backoffice::VERSION.is_empty());
}

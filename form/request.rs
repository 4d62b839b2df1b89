/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The training-request form (`/solicitud`).

use std::sync::Arc;

use log::{error, warn};

use crate::api::{self, ApiError, FieldError, SaveOutcome};
use crate::config::{AppConfig, Role};
use crate::form::{
    FieldKind, FieldSpec, FormDraft, ReferenceSource, SelectChoice, SelectOption,
};
use crate::model::{Company, ComplementaryCourse, GuestUser, Person, Record};
use crate::notify::Notifier;
use crate::store::{CollectionStore, FetchKey};

const ORIGIN_OPTIONS: &[SelectOption] = &[
    SelectOption { value: "1", label: "Ticket" },
    SelectOption { value: "2", label: "Correo electrónico" },
    SelectOption { value: "3", label: "Conferencia" },
    SelectOption { value: "4", label: "Aplicativo Web" },
];

const SEGMENT_OPTIONS: &[SelectOption] = &[
    SelectOption { value: "1", label: "Individual" },
    SelectOption { value: "2", label: "Aprendices" },
    SelectOption { value: "3", label: "Empresa" },
    SelectOption { value: "4", label: "Institución" },
    SelectOption { value: "5", label: "Entidad Territorial" },
    SelectOption { value: "6", label: "Funcionarios y Contratistas" },
    SelectOption { value: "7", label: "CPIC" },
];

const TYPE_OPTIONS: &[SelectOption] = &[
    SelectOption { value: "1", label: "Formación" },
];

const STATUS_OPTIONS: &[SelectOption] = &[
    SelectOption { value: "1", label: "Abierta" },
    SelectOption { value: "0", label: "Cerrada" },
];

const MOTIVE_OPTIONS: &[SelectOption] = &[
    SelectOption { value: "1", label: "En cola" },
    SelectOption { value: "2", label: "En cola - Faltan datos" },
    SelectOption { value: "3", label: "Sin respuesta" },
    SelectOption { value: "4", label: "No interesado" },
    SelectOption { value: "5", label: "Cancelada" },
    SelectOption { value: "6", label: "Por convocar" },
    SelectOption { value: "7", label: "Programada" },
    SelectOption { value: "8", label: "Sin oferta disponible" },
    SelectOption { value: "9", label: "Sin instructor disponible" },
    SelectOption { value: "10", label: "Instructor asignado" },
    SelectOption { value: "11", label: "Satisfecha" },
    SelectOption { value: "12", label: "Trasladada" },
    SelectOption { value: "13", label: "Pendiente" },
    SelectOption { value: "14", label: "Duplicada" },
    SelectOption { value: "15", label: "En cola - Aplazada" },
    SelectOption { value: "16", label: "Por completar cupo mínimo" },
    SelectOption { value: "17", label: "Propuesta de oferta enviada" },
    SelectOption { value: "18", label: "Cerrada" },
    SelectOption { value: "19", label: "Por enviar listad de interesados" },
];

/// The fixed, ordered field set of the training-request form.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "origenSolicitud",
        label: "Origen de solicitud",
        required: true,
        kind: FieldKind::StaticSelect(ORIGIN_OPTIONS),
    },
    FieldSpec {
        name: "radicadoSolicitud",
        label: "Radicado de solicitud",
        required: true,
        kind: FieldKind::Text,
    },
    FieldSpec {
        name: "segmento",
        label: "Segmento",
        required: true,
        kind: FieldKind::StaticSelect(SEGMENT_OPTIONS),
    },
    FieldSpec {
        name: "tipoSolicitud",
        label: "Tipo de solicitud",
        required: true,
        kind: FieldKind::StaticSelect(TYPE_OPTIONS),
    },
    FieldSpec {
        name: "cuposSolicitados",
        label: "Cupos solicitados",
        required: true,
        kind: FieldKind::Number,
    },
    FieldSpec {
        name: "estadoSolicitud",
        label: "Estado de solicitud",
        required: true,
        kind: FieldKind::StaticSelect(STATUS_OPTIONS),
    },
    FieldSpec {
        name: "motivoSolicitud",
        label: "Motivo de solicitud",
        required: true,
        kind: FieldKind::StaticSelect(MOTIVE_OPTIONS),
    },
    FieldSpec {
        name: "usuarioId",
        label: "Persona solicitante",
        required: false,
        kind: FieldKind::ReferenceSelect(ReferenceSource::Persons),
    },
    FieldSpec {
        name: "empresaId",
        label: "Empresa solicitante",
        required: false,
        kind: FieldKind::ReferenceSelect(ReferenceSource::Companies),
    },
    FieldSpec {
        name: "usuarioInvitadoId",
        label: "Usuario invitado solicitante",
        required: false,
        kind: FieldKind::ReferenceSelect(ReferenceSource::GuestUsers),
    },
    FieldSpec {
        name: "cursoComplementarioId",
        label: "Curso complementario",
        required: true,
        kind: FieldKind::ReferenceSelect(ReferenceSource::ComplementaryCourses),
    },
];

/// Fields supplied on an existing record for display only; the editor never
/// resubmits them.
const UNOWNED_FIELDS: &[&str] = &["usuario"];

/// Result of a submit attempt, as the host should report it.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitStatus {
    /// Required fields are blank; no network call was made.
    Blocked(Vec<&'static str>),
    Saved,
    /// The backend rejected the draft; messages are on the form.
    Rejected,
    /// The call never produced a structured answer.
    Failed(ApiError),
}

pub struct RequestForm {
    store: Arc<CollectionStore>,
    config: Arc<AppConfig>,
    notifier: Arc<Notifier>,
    draft: FormDraft,
    field_errors: Vec<FieldError>,
}

impl RequestForm {
    /// A blank form for creating a new request.
    pub fn new(
        store: Arc<CollectionStore>,
        config: Arc<AppConfig>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            store,
            config,
            notifier,
            draft: FormDraft::new(),
            field_errors: Vec::new(),
        }
    }

    /// An edit form seeded from an existing request record.
    pub fn with_record(
        store: Arc<CollectionStore>,
        config: Arc<AppConfig>,
        notifier: Arc<Notifier>,
        record: &Record,
    ) -> Self {
        Self {
            store,
            config,
            notifier,
            draft: FormDraft::seeded_from(record, UNOWNED_FIELDS),
            field_errors: Vec::new(),
        }
    }

    pub fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    pub fn draft(&self) -> &FormDraft {
        &self.draft
    }

    pub fn set_field(&mut self, name: &str, value: impl Into<serde_json::Value>) {
        self.draft.set_field(name, value);
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.draft.value_str(name)
    }

    /// The store key feeding a reference selector.
    pub fn reference_key(&self, source: ReferenceSource) -> FetchKey {
        let url = match source {
            ReferenceSource::Persons => api::users_by_role_url(&self.config, Role::Person),
            ReferenceSource::Companies => api::companies_url(&self.config),
            ReferenceSource::GuestUsers => api::guest_users_url(&self.config),
            ReferenceSource::ComplementaryCourses => {
                api::complementary_courses_url(&self.config)
            }
        };
        FetchKey::from_url(&url)
    }

    /// Choices for one field. Static selectors return their baked-in table;
    /// reference selectors read (and start fetching) their collection and
    /// stay empty until it resolves.
    pub fn options_for(&self, field: &FieldSpec) -> Vec<SelectChoice> {
        match field.kind {
            FieldKind::Text | FieldKind::Number => Vec::new(),
            FieldKind::StaticSelect(options) => options
                .iter()
                .map(|option| SelectChoice {
                    value: option.value.to_string(),
                    label: option.label.to_string(),
                })
                .collect(),
            FieldKind::ReferenceSelect(source) => {
                let key = self.reference_key(source);
                let snapshot = self.store.observe(&key);
                let Some(records) = snapshot.data else {
                    return Vec::new();
                };
                records
                    .iter()
                    .filter_map(|record| reference_choice(source, record))
                    .collect()
            }
        }
    }

    /// Required fields currently blank. Submission is blocked while this is
    /// non-empty; the authoritative validation stays server-side.
    pub fn missing_required(&self) -> Vec<&'static str> {
        FIELDS
            .iter()
            .filter(|field| field.required && self.draft.is_blank(field.name))
            .map(|field| field.name)
            .collect()
    }

    /// Server-side messages from the last rejected submission.
    pub fn field_errors(&self) -> &[FieldError] {
        &self.field_errors
    }

    pub fn errors_for(&self, field: &str) -> Vec<&str> {
        self.field_errors
            .iter()
            .filter(|entry| entry.field == field)
            .map(|entry| entry.message.as_str())
            .collect()
    }

    /// Send the full draft to the save endpoint: create when the draft has
    /// no id, update otherwise. Every failure path preserves the draft so
    /// the user can correct and resubmit.
    pub fn submit(&mut self) -> SubmitStatus {
        let missing = self.missing_required();
        if !missing.is_empty() {
            warn!("solicitud submit blocked; required fields blank: {missing:?}");
            return SubmitStatus::Blocked(missing);
        }

        let url = api::requests_url(&self.config);
        let payload = self.draft.payload();
        let transport = self.store.transport();
        let result = if self.draft.has_id() {
            transport.put_json(&url, &payload)
        } else {
            transport.post_json(&url, &payload)
        };

        match result {
            Ok(body) => match api::decode_save_response(&body) {
                SaveOutcome::Saved => {
                    self.field_errors.clear();
                    self.notifier
                        .push_success("Solicitud guardada satisfactoriamente");
                    SubmitStatus::Saved
                }
                SaveOutcome::Rejected(failure) => {
                    self.field_errors = failure.field_messages();
                    for entry in &self.field_errors {
                        self.notifier.push_failure(entry.message.clone());
                    }
                    SubmitStatus::Rejected
                }
            },
            Err(api_error) => {
                error!("error al guardar la solicitud: {api_error}");
                self.notifier.push_failure("Error al guardar la solicitud");
                SubmitStatus::Failed(api_error)
            }
        }
    }
}

fn reference_choice(source: ReferenceSource, record: &Record) -> Option<SelectChoice> {
    let choice = match source {
        ReferenceSource::Persons => {
            let person: Person = record.decode().ok()?;
            SelectChoice {
                value: person.id.clone(),
                label: person.display_name(),
            }
        }
        ReferenceSource::Companies => {
            let company: Company = record.decode().ok()?;
            SelectChoice {
                value: company.id,
                label: company.razon_social,
            }
        }
        ReferenceSource::GuestUsers => {
            let guest: GuestUser = record.decode().ok()?;
            SelectChoice {
                value: guest.id.clone(),
                label: guest.display_name(),
            }
        }
        ReferenceSource::ComplementaryCourses => {
            let course: ComplementaryCourse = record.decode().ok()?;
            SelectChoice {
                value: course.id,
                label: course.nombre,
            }
        }
    };
    Some(choice)
}

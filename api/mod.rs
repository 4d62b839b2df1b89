/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The REST edge of the crate.
//!
//! Endpoint URL builders for the collections the backoffice consumes, plus
//! the decoded outcome types for mutating calls. The backend's
//! `[error-or-null, success-boolean]` pair and its structured validation
//! payload are decoded here; positional indexing never escapes this module.

mod transport;

pub use transport::{ApiTransport, HttpTransport};

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::{AppConfig, Role};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("invalid request URL")]
    InvalidUrl,
    #[error("network error")]
    Network,
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
    #[error("malformed response body")]
    Body,
}

pub fn companies_url(config: &AppConfig) -> Url {
    config.resource_url(&["empresa"])
}

pub fn company_url(config: &AppConfig, id: &str) -> Url {
    config.resource_url(&["empresa", id])
}

pub fn users_by_role_url(config: &AppConfig, role: Role) -> Url {
    config.resource_url(&["usuario", "rol", config.roles().token_for(role)])
}

pub fn user_url(config: &AppConfig, id: &str) -> Url {
    config.resource_url(&["usuario", id])
}

pub fn complementary_courses_url(config: &AppConfig) -> Url {
    config.resource_url(&["curso-complementario"])
}

pub fn guest_users_url(config: &AppConfig) -> Url {
    config.resource_url(&["usuario-invitado"])
}

pub fn requests_url(config: &AppConfig) -> Url {
    config.resource_url(&["solicitud"])
}

/// Explicit outcome of a delete call.
///
/// The wire contract is a two-element pair whose second element signals
/// success when truthy. A not-ok outcome with no error is a legal state the
/// UI deliberately treats as silently accepted.
#[derive(Clone, Debug, PartialEq)]
pub struct MutationOutcome {
    pub ok: bool,
    pub error: Option<String>,
}

/// Decode the `[error-or-null, success-boolean]` result pair.
pub fn decode_mutation_outcome(body: &Value) -> Result<MutationOutcome, ApiError> {
    let Some(pair) = body.as_array() else {
        return Err(ApiError::Body);
    };
    if pair.len() < 2 {
        return Err(ApiError::Body);
    }
    let error = match &pair[0] {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    };
    let ok = !matches!(&pair[1], Value::Null | Value::Bool(false));
    Ok(MutationOutcome { ok, error })
}

/// Issue a DELETE for one record and decode the outcome pair.
pub fn delete_record(
    transport: &dyn ApiTransport,
    url: &Url,
) -> Result<MutationOutcome, ApiError> {
    let body = transport.delete_json(url)?;
    decode_mutation_outcome(&body)
}

/// One field-level message from a structured validation payload.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    #[serde(default)]
    pub field: String,
    pub message: String,
}

/// A structured validation payload (`statusCode` plus field messages)
/// returned by the save endpoint in place of a saved record.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub status_code: u16,
    #[serde(default)]
    pub errors: Vec<FieldError>,
    #[serde(default)]
    message: Option<Value>,
}

impl ValidationFailure {
    /// All messages carried by the payload: field-level entries first, then
    /// any page-level `message` strings with an empty field name.
    pub fn field_messages(&self) -> Vec<FieldError> {
        let mut messages = self.errors.clone();
        match &self.message {
            Some(Value::String(text)) => messages.push(FieldError {
                field: String::new(),
                message: text.clone(),
            }),
            Some(Value::Array(items)) => {
                for item in items {
                    if let Some(text) = item.as_str() {
                        messages.push(FieldError {
                            field: String::new(),
                            message: text.to_string(),
                        });
                    }
                }
            }
            _ => {}
        }
        messages
    }
}

/// Outcome of a save call that reached the backend.
#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    Saved,
    Rejected(ValidationFailure),
}

/// Classify a save response body. Any body carrying a positive `statusCode`
/// is a rejection; everything else is a saved record.
pub fn decode_save_response(body: &Value) -> SaveOutcome {
    let status = body
        .get("statusCode")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    if status == 0 {
        return SaveOutcome::Saved;
    }
    match ValidationFailure::deserialize(body) {
        Ok(failure) => SaveOutcome::Rejected(failure),
        Err(_) => SaveOutcome::Rejected(ValidationFailure {
            status_code: u16::try_from(status).unwrap_or(u16::MAX),
            errors: Vec::new(),
            message: None,
        }),
    }
}

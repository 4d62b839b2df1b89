/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Identified records and their typed wire views.
//!
//! Every collection endpoint returns a bare JSON array of objects carrying a
//! stable string `id`. The store keeps them opaque; views and forms decode
//! the handful of fields they actually display or bind. Field names on the
//! wire are the backend's Spanish camelCase names.

use serde::Deserialize;
use serde_json::Value;

/// An opaque identified record as fetched from a collection endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Record(Value);

impl Record {
    /// Wrap a JSON object. Returns `None` for anything that is not an
    /// object or lacks a string `id`.
    pub fn from_value(value: Value) -> Option<Self> {
        let id_present = value
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| !id.is_empty());
        id_present.then_some(Self(value))
    }

    pub fn id(&self) -> &str {
        // Guaranteed by from_value.
        self.0.get("id").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Decode into a typed view of the record.
    pub fn decode<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.0)
    }
}

/// A company (`/empresa`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub razon_social: String,
    #[serde(default)]
    pub celular: String,
    #[serde(default)]
    pub correo_electronico: String,
    #[serde(default)]
    pub foto: Option<String>,
}

/// A person or instructor (`/usuario/rol/{roleId}`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    pub id: String,
    pub nombres: String,
    pub apellidos: String,
    #[serde(default)]
    pub celular: String,
    #[serde(default)]
    pub correo_electronico: String,
    #[serde(default)]
    pub foto: Option<String>,
}

impl Person {
    /// Display label used by lists and reference selectors.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.nombres, self.apellidos)
    }
}

/// A guest user (`/usuario-invitado`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuestUser {
    pub id: String,
    pub nombres: String,
    pub apellidos: String,
}

impl GuestUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.nombres, self.apellidos)
    }
}

/// A complementary course (`/curso-complementario`).
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComplementaryCourse {
    pub id: String,
    pub nombre: String,
}

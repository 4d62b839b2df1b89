/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Controlled form drafts.
//!
//! A draft is a transient JSON object keyed by wire field name, owned by
//! the form and never written anywhere until explicit submission. Field
//! descriptors are declarative: scalar inputs, selectors over baked-in
//! option tables, and selectors populated from a reference collection
//! fetched through the store.

pub mod request;

pub use request::{RequestForm, SubmitStatus};

use serde_json::{Map, Value};

use crate::model::Record;

/// A fixed `{value, label}` choice baked into a form definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

/// A choice computed at render time (reference selectors: the label is a
/// derived display string, the stored value is the record's id).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectChoice {
    pub value: String,
    pub label: String,
}

/// Which reference collection populates a dynamic selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceSource {
    Persons,
    Companies,
    GuestUsers,
    ComplementaryCourses,
}

#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    Text,
    Number,
    StaticSelect(&'static [SelectOption]),
    ReferenceSelect(ReferenceSource),
}

/// One field of a form, in declaration order.
#[derive(Clone, Copy, Debug)]
pub struct FieldSpec {
    /// Wire name, also the draft key.
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub kind: FieldKind,
}

/// The transient, locally-held partial entity under edit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormDraft {
    values: Map<String, Value>,
}

impl FormDraft {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from an existing record, verbatim except the fields the form
    /// does not own (denormalized relations supplied only for display).
    pub fn seeded_from(record: &Record, unowned: &[&str]) -> Self {
        let mut values = match record.as_value() {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        for field in unowned {
            values.remove(*field);
        }
        Self { values }
    }

    /// Replace exactly one key, leaving all others untouched.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn value_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Missing, null, or empty-string — the states a required field must
    /// not be in at submission time.
    pub fn is_blank(&self, name: &str) -> bool {
        match self.values.get(name) {
            None | Some(Value::Null) => true,
            Some(Value::String(text)) => text.trim().is_empty(),
            Some(_) => false,
        }
    }

    /// An identifier in the draft means the save is an update, not a
    /// create. The endpoint owns that distinction; the form only picks the
    /// method.
    pub fn has_id(&self) -> bool {
        self.value_str("id").is_some_and(|id| !id.is_empty())
    }

    pub fn payload(&self) -> Value {
        Value::Object(self.values.clone())
    }
}

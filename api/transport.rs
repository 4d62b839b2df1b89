/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! HTTP transport behind a trait seam.
//!
//! The store and the form talk to `ApiTransport` only, so tests substitute
//! scripted transports without touching the network. The real implementation
//! is a process-lifetime blocking `reqwest` client.

use std::sync::OnceLock;
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use url::Url;

use super::ApiError;

pub trait ApiTransport: Send + Sync {
    fn get_json(&self, url: &Url) -> Result<Value, ApiError>;
    fn delete_json(&self, url: &Url) -> Result<Value, ApiError>;
    fn post_json(&self, url: &Url, body: &Value) -> Result<Value, ApiError>;
    fn put_json(&self, url: &Url, body: &Value) -> Result<Value, ApiError>;
}

fn client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(4))
            .build()
            .expect("reqwest blocking client should build")
    })
}

/// The production transport.
#[derive(Default)]
pub struct HttpTransport;

impl ApiTransport for HttpTransport {
    fn get_json(&self, url: &Url) -> Result<Value, ApiError> {
        let response = client()
            .get(url.clone())
            .send()
            .map_err(|_| ApiError::Network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }
        response.json().map_err(|_| ApiError::Body)
    }

    fn delete_json(&self, url: &Url) -> Result<Value, ApiError> {
        let response = client()
            .delete(url.clone())
            .send()
            .map_err(|_| ApiError::Network)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::HttpStatus(status.as_u16()));
        }
        response.json().map_err(|_| ApiError::Body)
    }

    fn post_json(&self, url: &Url, body: &Value) -> Result<Value, ApiError> {
        // Validation rejections ride non-2xx responses with a structured
        // body, so the status is not checked here; the caller classifies
        // the decoded body instead.
        let response = client()
            .post(url.clone())
            .json(body)
            .send()
            .map_err(|_| ApiError::Network)?;
        response.json().map_err(|_| ApiError::Body)
    }

    fn put_json(&self, url: &Url, body: &Value) -> Result<Value, ApiError> {
        let response = client()
            .put(url.clone())
            .json(body)
            .send()
            .map_err(|_| ApiError::Network)?;
        response.json().map_err(|_| ApiError::Body)
    }
}

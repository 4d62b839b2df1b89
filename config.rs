/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Read-only application configuration.
//!
//! Deployments hand these values to the process through the environment.
//! They are resolved once, validated, and passed down by construction;
//! nothing in the crate reads the environment after startup.

use std::env;

use log::warn;
use thiserror::Error;
use url::Url;

/// Well-known actor roles. Tokens are opaque and compared for equality
/// only; they are never parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Instructor,
    Company,
    Person,
}

/// The role tokens the backend issues for each well-known role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleTokens {
    admin: String,
    instructor: String,
    company: String,
    person: String,
}

impl RoleTokens {
    pub fn new(
        admin: impl Into<String>,
        instructor: impl Into<String>,
        company: impl Into<String>,
        person: impl Into<String>,
    ) -> Self {
        Self {
            admin: admin.into(),
            instructor: instructor.into(),
            company: company.into(),
            person: person.into(),
        }
    }

    /// Map an actor's token back to a well-known role.
    pub fn resolve(&self, token: &str) -> Option<Role> {
        if token == self.admin {
            Some(Role::Admin)
        } else if token == self.instructor {
            Some(Role::Instructor)
        } else if token == self.company {
            Some(Role::Company)
        } else if token == self.person {
            Some(Role::Person)
        } else {
            None
        }
    }

    pub fn token_for(&self, role: Role) -> &str {
        match role {
            Role::Admin => &self.admin,
            Role::Instructor => &self.instructor,
            Role::Company => &self.company,
            Role::Person => &self.person,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),
    #[error("BACKOFFICE_API_URL is not a valid absolute URL: {0}")]
    InvalidBaseUrl(String),
}

const ENV_API_URL: &str = "BACKOFFICE_API_URL";
const ENV_ROL_ADMIN: &str = "BACKOFFICE_ROL_ADMIN_ID";
const ENV_ROL_INSTRUCTOR: &str = "BACKOFFICE_ROL_INSTRUCTOR_ID";
const ENV_ROL_EMPRESA: &str = "BACKOFFICE_ROL_EMPRESA_ID";
const ENV_ROL_PERSONA: &str = "BACKOFFICE_ROL_PERSONA_ID";

/// Process-lifetime configuration: the API base URL plus the role tokens
/// used for action gating and role-scoped collection keys.
#[derive(Clone, Debug)]
pub struct AppConfig {
    api_base: Url,
    roles: RoleTokens,
}

impl AppConfig {
    pub fn new(api_base: Url, roles: RoleTokens) -> Result<Self, ConfigError> {
        if api_base.cannot_be_a_base() {
            return Err(ConfigError::InvalidBaseUrl(api_base.to_string()));
        }
        Ok(Self { api_base, roles })
    }

    /// Build the configuration from `BACKOFFICE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = require_var(ENV_API_URL)?;
        let api_base = Url::parse(base.trim())
            .map_err(|_| ConfigError::InvalidBaseUrl(base.clone()))?;
        let roles = RoleTokens::new(
            require_var(ENV_ROL_ADMIN)?,
            require_var(ENV_ROL_INSTRUCTOR)?,
            require_var(ENV_ROL_EMPRESA)?,
            require_var(ENV_ROL_PERSONA)?,
        );
        Self::new(api_base, roles)
    }

    pub fn api_base(&self) -> &Url {
        &self.api_base
    }

    pub fn roles(&self) -> &RoleTokens {
        &self.roles
    }

    /// Join resource path segments onto the API base URL.
    pub fn resource_url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        match url.path_segments_mut() {
            Ok(mut path) => {
                path.pop_if_empty().extend(segments);
            }
            Err(()) => {
                // Ruled out by the cannot_be_a_base check in new().
                warn!("API base URL cannot carry path segments: {}", self.api_base);
            }
        }
        url
    }

    /// Resolve a record's relative photo field against the static upload
    /// convention `{base}/uploads/{foto}`.
    pub fn upload_url(&self, foto: &str) -> Url {
        self.resource_url(&["uploads", foto])
    }
}

fn require_var(key: &'static str) -> Result<String, ConfigError> {
    let Ok(value) = env::var(key) else {
        return Err(ConfigError::MissingVar(key));
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingVar(key));
    }
    Ok(trimmed.to_string())
}

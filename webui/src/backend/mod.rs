// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Collaborators the console talks to: the remote role and environment
//! stores and the per-environment recipe lookup.

use crate::config::{ApiBackend, ApiConfig};
use crate::model::Role;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

mod error;
mod http;
mod memory;

pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use http::HttpApiClient;
pub use memory::InMemoryBackend;

/// Resource name to resource location, as returned by an uninflated listing.
pub type ResourceIndex = BTreeMap<String, String>;

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn list(&self) -> ApiResult<ResourceIndex>;
    async fn load(&self, name: &str) -> ApiResult<Role>;
    async fn create(&self, role: &Role) -> ApiResult<()>;
    async fn save(&self, role: &Role) -> ApiResult<()>;
    async fn destroy(&self, role: &Role) -> ApiResult<()>;
}

#[async_trait]
pub trait EnvironmentStore: Send + Sync {
    async fn list(&self) -> ApiResult<ResourceIndex>;
}

#[async_trait]
pub trait RecipeLookup: Send + Sync {
    /// Recipes usable in `environment`, sorted by name.
    async fn recipes_for(&self, environment: &str) -> ApiResult<Vec<String>>;
}

#[derive(Clone)]
pub struct Backend {
    pub roles: Arc<dyn RoleStore>,
    pub environments: Arc<dyn EnvironmentStore>,
    pub recipes: Arc<dyn RecipeLookup>,
}

impl Backend {
    /// Uses one implementation for all three collaborators.
    pub fn from_shared<T>(inner: Arc<T>) -> Self
    where
        T: RoleStore + EnvironmentStore + RecipeLookup + 'static,
    {
        Self {
            roles: inner.clone(),
            environments: inner.clone(),
            recipes: inner,
        }
    }

    pub fn from_config(api: &ApiConfig) -> ApiResult<Self> {
        match api.backend {
            ApiBackend::Http => {
                let client = HttpApiClient::new(
                    &api.url,
                    &api.client_name,
                    Duration::from_secs(api.timeout_seconds),
                )?;
                log::info!("Using configuration server API at {}", api.url);
                Ok(Self::from_shared(Arc::new(client)))
            }
            ApiBackend::Memory => {
                log::warn!("Using the in-memory backend; roles are lost on restart");
                Ok(Self::from_shared(Arc::new(InMemoryBackend::new())))
            }
        }
    }
}

// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{
    ApiError, ApiErrorKind, ApiResult, EnvironmentStore, RecipeLookup, ResourceIndex, RoleStore,
};
use crate::model::{DEFAULT_ENVIRONMENT, Role};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Process-local stand-in for the configuration server.
///
/// Starts with the `_default` environment and no roles. `set_unavailable`
/// makes every call fail as if the server could not be reached.
pub struct InMemoryBackend {
    roles: RwLock<BTreeMap<String, Role>>,
    environments: RwLock<BTreeMap<String, Vec<String>>>,
    unavailable: AtomicBool,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        let mut environments = BTreeMap::new();
        environments.insert(DEFAULT_ENVIRONMENT.to_string(), Vec::new());
        Self {
            roles: RwLock::new(BTreeMap::new()),
            environments: RwLock::new(environments),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Registers an environment, replacing its recipe list.
    pub fn with_environment(self, name: &str, recipes: &[&str]) -> Self {
        if let Ok(mut environments) = self.environments.write() {
            let mut recipes: Vec<String> = recipes.iter().map(|r| r.to_string()).collect();
            recipes.sort();
            environments.insert(name.to_string(), recipes);
        }
        self
    }

    pub fn with_role(self, role: Role) -> Self {
        if let Ok(mut roles) = self.roles.write() {
            roles.insert(role.name().to_string(), role);
        }
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of a stored role, bypassing the availability switch.
    pub fn stored_role(&self, name: &str) -> Option<Role> {
        self.roles
            .read()
            .ok()
            .and_then(|roles| roles.get(name).cloned())
    }

    pub fn role_count(&self) -> usize {
        self.roles.read().map(|roles| roles.len()).unwrap_or(0)
    }

    fn ensure_available(&self) -> ApiResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ApiError::new(
                ApiErrorKind::Transport,
                "Configuration server is unavailable",
            ));
        }
        Ok(())
    }

    fn read_roles(&self) -> ApiResult<RwLockReadGuard<'_, BTreeMap<String, Role>>> {
        self.ensure_available()?;
        self.roles
            .read()
            .map_err(|_| ApiError::new(ApiErrorKind::Transport, "Role store lock poisoned"))
    }

    fn write_roles(&self) -> ApiResult<RwLockWriteGuard<'_, BTreeMap<String, Role>>> {
        self.ensure_available()?;
        self.roles
            .write()
            .map_err(|_| ApiError::new(ApiErrorKind::Transport, "Role store lock poisoned"))
    }

    fn read_environments(&self) -> ApiResult<RwLockReadGuard<'_, BTreeMap<String, Vec<String>>>> {
        self.ensure_available()?;
        self.environments.read().map_err(|_| {
            ApiError::new(ApiErrorKind::Transport, "Environment store lock poisoned")
        })
    }
}

fn index<V>(prefix: &str, entries: &BTreeMap<String, V>) -> ResourceIndex {
    entries
        .keys()
        .map(|name| (name.clone(), format!("/{}/{}", prefix, name)))
        .collect()
}

#[async_trait]
impl RoleStore for InMemoryBackend {
    async fn list(&self) -> ApiResult<ResourceIndex> {
        Ok(index("roles", &*self.read_roles()?))
    }

    async fn load(&self, name: &str) -> ApiResult<Role> {
        self.read_roles()?
            .get(name)
            .cloned()
            .ok_or_else(|| ApiError::not_found("role", name))
    }

    async fn create(&self, role: &Role) -> ApiResult<()> {
        let mut roles = self.write_roles()?;
        if roles.contains_key(role.name()) {
            return Err(ApiError::conflict("role", role.name()));
        }
        roles.insert(role.name().to_string(), role.clone());
        Ok(())
    }

    async fn save(&self, role: &Role) -> ApiResult<()> {
        self.write_roles()?
            .insert(role.name().to_string(), role.clone());
        Ok(())
    }

    async fn destroy(&self, role: &Role) -> ApiResult<()> {
        self.write_roles()?
            .remove(role.name())
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found("role", role.name()))
    }
}

#[async_trait]
impl EnvironmentStore for InMemoryBackend {
    async fn list(&self) -> ApiResult<ResourceIndex> {
        Ok(index("environments", &*self.read_environments()?))
    }
}

#[async_trait]
impl RecipeLookup for InMemoryBackend {
    async fn recipes_for(&self, environment: &str) -> ApiResult<Vec<String>> {
        self.read_environments()?
            .get(environment)
            .cloned()
            .ok_or_else(|| ApiError::not_found("environment", environment))
    }
}

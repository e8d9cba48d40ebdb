// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Role actions, independent of HTTP.
//!
//! Every action returns an [`ActionOutcome`]; failures are logged here and
//! folded into an error message on a renderable view.

use super::ROLES_PATH;
use super::error::{RoleActionError, log_failure};
use super::form::RoleForm;
use super::views::{RoleFormData, RoleView};
use crate::backend::{Backend, ResourceIndex};
use crate::flash::Flash;
use crate::model::{DEFAULT_ENVIRONMENT, Role, RunList, RunListItem, parse_attributes};
use std::collections::BTreeMap;

const NEW_FORM_FAILED: &str = "Could not load available recipes, roles, or the run list.";

#[derive(Debug)]
pub enum ActionOutcome {
    Render {
        view: RoleView,
        message: Option<Flash>,
    },
    Redirect {
        location: String,
        /// Resolve `location` against the request's scheme and host.
        absolute: bool,
        permanent: bool,
        flash: Flash,
    },
}

impl ActionOutcome {
    fn render(view: RoleView) -> Self {
        ActionOutcome::Render {
            view,
            message: None,
        }
    }

    fn render_with(view: RoleView, message: Flash) -> Self {
        ActionOutcome::Render {
            view,
            message: Some(message),
        }
    }
}

pub struct RoleController<'a> {
    backend: &'a Backend,
}

impl<'a> RoleController<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    pub async fn index(&self) -> ActionOutcome {
        match self.backend.roles.list().await {
            Ok(roles) => ActionOutcome::render(RoleView::Index { roles }),
            Err(err) => {
                log_failure("list roles", &err);
                ActionOutcome::render_with(
                    RoleView::Index {
                        roles: ResourceIndex::new(),
                    },
                    Flash::error("Could not list roles"),
                )
            }
        }
    }

    pub async fn show(&self, id: &str) -> ActionOutcome {
        match self.backend.roles.load(id).await {
            Ok(role) => ActionOutcome::render(RoleView::Show { role }),
            Err(err) => {
                log_failure(&format!("load role {}", id), &err);
                ActionOutcome::render_with(
                    RoleView::Show { role: Role::new() },
                    Flash::error(format!("Could not load role {}", id)),
                )
            }
        }
    }

    pub async fn new_form(&self) -> ActionOutcome {
        match self.assemble_form(Role::new(), DEFAULT_ENVIRONMENT).await {
            Ok(form) => ActionOutcome::render(RoleView::New(form)),
            Err(err) => {
                log_failure("assemble new role form", &err);
                let roles = self.role_index_or_empty().await;
                ActionOutcome::render_with(
                    RoleView::Index { roles },
                    Flash::error(NEW_FORM_FAILED),
                )
            }
        }
    }

    pub async fn edit_form(&self, id: &str, current_environment: &str) -> ActionOutcome {
        let result = match self.backend.roles.load(id).await {
            Ok(role) => self.assemble_form(role, current_environment).await,
            Err(err) => Err(err.into()),
        };
        match result {
            Ok(form) => ActionOutcome::render(RoleView::Edit {
                id: id.to_string(),
                form,
            }),
            Err(err) => {
                log_failure(&format!("assemble edit form for role {}", id), &err);
                ActionOutcome::render_with(
                    RoleView::Edit {
                        id: id.to_string(),
                        form: RoleFormData::empty(current_environment),
                    },
                    Flash::error(format!(
                        "Could not load role {}, the available recipes, roles, or the run list",
                        id
                    )),
                )
            }
        }
    }

    pub async fn create(&self, form: &RoleForm) -> ActionOutcome {
        match self.try_create(form).await {
            Ok(role) => {
                log::info!("Created role {}", role.name());
                ActionOutcome::Redirect {
                    location: ROLES_PATH.to_string(),
                    absolute: false,
                    permanent: false,
                    flash: Flash::notice(format!("Created Role {}", role.name())),
                }
            }
            Err(err) => {
                log_failure(&format!("create role {}", form.name), &err);
                let mut role = Role::new();
                if let Err(name_err) = role.set_name(&form.name) {
                    log::debug!("Keeping placeholder name on redisplay: {}", name_err);
                }
                if role.set_env_run_lists(&form.env_run_lists).is_err() {
                    log::debug!("Submitted run lists for {} are not redisplayed", form.name);
                }
                let form_data = self.fallback_form(role, form, DEFAULT_ENVIRONMENT).await;
                ActionOutcome::render_with(
                    RoleView::New(form_data),
                    Flash::error("Could not create role"),
                )
            }
        }
    }

    /// `current_environment` only selects which recipes the form offers
    /// when the update fails.
    pub async fn update(
        &self,
        id: &str,
        form: &RoleForm,
        current_environment: &str,
    ) -> ActionOutcome {
        let mut loaded = None;
        match self.try_update(id, form, &mut loaded).await {
            Ok(role) => {
                log::info!("Updated role {}", role.name());
                ActionOutcome::render_with(
                    RoleView::Show { role },
                    Flash::notice("Updated Role"),
                )
            }
            Err(err) => {
                log_failure(&format!("update role {}", id), &err);
                log::error!(
                    "Run list submitted for role {}: {:?}",
                    id,
                    lenient_run_list(&form.for_role).to_strings()
                );
                let role = loaded.unwrap_or_default();
                let form_data = self.fallback_form(role, form, current_environment).await;
                ActionOutcome::render_with(
                    RoleView::Edit {
                        id: id.to_string(),
                        form: form_data,
                    },
                    Flash::error(format!("Could not update role {}", id)),
                )
            }
        }
    }

    pub async fn destroy(&self, id: &str) -> ActionOutcome {
        match self.try_destroy(id).await {
            Ok(role) => {
                log::info!("Deleted role {}", role.name());
                ActionOutcome::Redirect {
                    location: ROLES_PATH.to_string(),
                    absolute: true,
                    permanent: true,
                    flash: Flash::notice(format!("Role {} deleted successfully.", role.name())),
                }
            }
            Err(err) => {
                log_failure(&format!("delete role {}", id), &err);
                let roles = self.role_index_or_empty().await;
                ActionOutcome::render_with(
                    RoleView::Index { roles },
                    Flash::error(format!("Could not delete role {}", id)),
                )
            }
        }
    }

    async fn try_create(&self, form: &RoleForm) -> Result<Role, RoleActionError> {
        let mut role = Role::new();
        role.set_name(&form.name)?;
        role.set_env_run_lists(&form.env_run_lists)?;
        apply_optional_fields(&mut role, form)?;
        self.backend.roles.create(&role).await?;
        Ok(role)
    }

    /// Leaves the loaded (possibly half-updated) role in `loaded` so a failed
    /// update can redisplay it.
    async fn try_update(
        &self,
        id: &str,
        form: &RoleForm,
        loaded: &mut Option<Role>,
    ) -> Result<Role, RoleActionError> {
        let role = loaded.insert(self.backend.roles.load(id).await?);
        role.set_env_run_lists(&form.env_run_lists)?;
        apply_optional_fields(role, form)?;
        self.backend.roles.save(role).await?;
        Ok(role.clone())
    }

    async fn try_destroy(&self, id: &str) -> Result<Role, RoleActionError> {
        let role = self.backend.roles.load(id).await?;
        self.backend.roles.destroy(&role).await?;
        Ok(role)
    }

    async fn assemble_form(
        &self,
        role: Role,
        current_environment: &str,
    ) -> Result<RoleFormData, RoleActionError> {
        let available_roles = self.backend.roles.list().await?.into_keys().collect();
        let environments: Vec<String> = self
            .backend
            .environments
            .list()
            .await?
            .into_keys()
            .collect();
        let available_recipes = self.backend.recipes.recipes_for(current_environment).await?;
        Ok(form_data(
            role,
            available_roles,
            environments,
            available_recipes,
            current_environment,
        ))
    }

    /// Rebuilds a form after a failed create or update. Each piece of
    /// supporting data falls back to empty on its own failure.
    async fn fallback_form(
        &self,
        mut role: Role,
        form: &RoleForm,
        current_environment: &str,
    ) -> RoleFormData {
        if let Some(description) = form.description() {
            role.set_description(description);
        }
        if let Some(Ok(attributes)) = form.default_attributes().map(parse_attributes) {
            role.set_default_attributes(attributes);
        }
        if let Some(Ok(attributes)) = form.override_attributes().map(parse_attributes) {
            role.set_override_attributes(attributes);
        }

        let available_recipes = match self.backend.recipes.recipes_for(current_environment).await {
            Ok(recipes) => recipes,
            Err(err) => {
                log_failure("list available recipes", &err);
                Vec::new()
            }
        };
        let available_roles = self.role_index_or_empty().await.into_keys().collect();
        let environments = match self.backend.environments.list().await {
            Ok(environments) => environments.into_keys().collect(),
            Err(err) => {
                log_failure("list environments", &err);
                Vec::new()
            }
        };

        let mut data = form_data(
            role,
            available_roles,
            environments,
            available_recipes,
            current_environment,
        );
        data.run_list = lenient_run_list(&form.for_role);
        data
    }

    async fn role_index_or_empty(&self) -> ResourceIndex {
        match self.backend.roles.list().await {
            Ok(roles) => roles,
            Err(err) => {
                log_failure("list roles", &err);
                ResourceIndex::new()
            }
        }
    }
}

fn form_data(
    role: Role,
    available_roles: Vec<String>,
    environments: Vec<String>,
    available_recipes: Vec<String>,
    current_environment: &str,
) -> RoleFormData {
    let run_lists: BTreeMap<String, Option<RunList>> = environments
        .iter()
        .map(|env| (env.clone(), role.run_list_for(env).cloned()))
        .collect();
    let mut existing_run_list_environments = vec![String::new()];
    existing_run_list_environments.extend(role.run_list_environments());
    let run_list = role.run_list().clone();

    RoleFormData {
        role,
        available_roles,
        environments,
        run_lists,
        current_environment: current_environment.to_string(),
        available_recipes,
        existing_run_list_environments,
        run_list,
    }
}

/// Description and attributes change only when submitted; both attribute
/// blobs parse before either is applied.
fn apply_optional_fields(role: &mut Role, form: &RoleForm) -> Result<(), RoleActionError> {
    let default_attributes = form.default_attributes().map(parse_attributes).transpose()?;
    let override_attributes = form.override_attributes().map(parse_attributes).transpose()?;
    if let Some(description) = form.description() {
        role.set_description(description);
    }
    if let Some(attributes) = default_attributes {
        role.set_default_attributes(attributes);
    }
    if let Some(attributes) = override_attributes {
        role.set_override_attributes(attributes);
    }
    Ok(())
}

/// Builds a run list for redisplay, skipping entries that do not parse.
fn lenient_run_list(entries: &[String]) -> RunList {
    let mut run_list = RunList::new();
    for entry in entries {
        match RunListItem::parse(entry) {
            Ok(item) => {
                run_list.add(item);
            }
            Err(err) => log::debug!("Skipping run list entry {:?}: {}", entry, err),
        }
    }
    run_list
}

// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::backend::ResourceIndex;
use crate::model::{DEFAULT_ENVIRONMENT, Role, RunList};
use minijinja::{Value, context};
use serde::Serialize;
use std::collections::BTreeMap;

/// Everything the new and edit forms need besides the page chrome.
#[derive(Debug, Clone)]
pub struct RoleFormData {
    pub role: Role,
    pub available_roles: Vec<String>,
    pub environments: Vec<String>,
    /// Snapshot of the role's run list per known environment.
    pub run_lists: BTreeMap<String, Option<RunList>>,
    pub current_environment: String,
    pub available_recipes: Vec<String>,
    /// Environments the role has run lists for, led by an empty "unset" choice.
    pub existing_run_list_environments: Vec<String>,
    pub run_list: RunList,
}

impl RoleFormData {
    /// Form with no supporting data, used when assembling it failed.
    pub fn empty(current_environment: &str) -> Self {
        Self {
            role: Role::new(),
            available_roles: Vec::new(),
            environments: Vec::new(),
            run_lists: BTreeMap::new(),
            current_environment: current_environment.to_string(),
            available_recipes: Vec::new(),
            existing_run_list_environments: vec![String::new()],
            run_list: RunList::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RoleView {
    Index { roles: ResourceIndex },
    Show { role: Role },
    New(RoleFormData),
    Edit { id: String, form: RoleFormData },
}

impl RoleView {
    pub fn template_name(&self) -> &'static str {
        match self {
            RoleView::Index { .. } => "roles/index.html",
            RoleView::Show { .. } => "roles/show.html",
            RoleView::New(_) => "roles/new.html",
            RoleView::Edit { .. } => "roles/edit.html",
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RoleView::Index { roles } => {
                let roles: Vec<RoleLink> = roles
                    .iter()
                    .map(|(name, location)| RoleLink {
                        name: name.clone(),
                        location: location.clone(),
                    })
                    .collect();
                context! { roles => Value::from_serialize(&roles) }
            }
            RoleView::Show { role } => context! {
                role => Value::from_serialize(RoleSummary::from(role))
            },
            RoleView::New(form) => form_value(None, form),
            RoleView::Edit { id, form } => form_value(Some(id), form),
        }
    }
}

fn form_value(id: Option<&str>, form: &RoleFormData) -> Value {
    let run_lists: BTreeMap<&str, Option<Vec<String>>> = form
        .run_lists
        .iter()
        .map(|(env, list)| (env.as_str(), list.as_ref().map(RunList::to_strings)))
        .collect();
    let current_run_list = form
        .role
        .run_list_for(&form.current_environment)
        .map(RunList::to_strings)
        .unwrap_or_default();

    context! {
        id => id,
        role => Value::from_serialize(RoleSummary::from(&form.role)),
        available_roles => &form.available_roles,
        environments => &form.environments,
        run_lists => Value::from_serialize(&run_lists),
        current_environment => &form.current_environment,
        current_run_list => current_run_list,
        available_recipes => &form.available_recipes,
        existing_run_list_environments => &form.existing_run_list_environments,
        run_list => form.run_list.to_strings(),
        default_environment => DEFAULT_ENVIRONMENT
    }
}

#[derive(Debug, Serialize)]
struct RoleLink {
    name: String,
    location: String,
}

/// Template-facing projection of a role.
#[derive(Debug, Serialize)]
struct RoleSummary {
    name: String,
    description: String,
    default_attributes: String,
    override_attributes: String,
    env_run_lists: BTreeMap<String, Vec<String>>,
    run_list: Vec<String>,
}

impl From<&Role> for RoleSummary {
    fn from(role: &Role) -> Self {
        Self {
            name: role.name().to_string(),
            description: role.description().to_string(),
            default_attributes: pretty_json(role.default_attributes()),
            override_attributes: pretty_json(role.override_attributes()),
            env_run_lists: role
                .env_run_lists()
                .iter()
                .map(|(env, list)| (env.clone(), list.to_strings()))
                .collect(),
            run_list: role.run_list().to_strings(),
        }
    }
}

fn pretty_json(attributes: &crate::model::Attributes) -> String {
    serde_json::to_string_pretty(attributes).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_lists_roles_in_name_order() {
        let mut roles = ResourceIndex::new();
        roles.insert("web".to_string(), "/roles/web".to_string());
        roles.insert("db".to_string(), "/roles/db".to_string());
        let value = RoleView::Index { roles }.to_value();
        let roles = value.get_attr("roles").unwrap();
        let first = roles.get_item(&Value::from(0)).unwrap();
        assert_eq!(first.get_attr("name").unwrap().as_str(), Some("db"));
    }

    #[test]
    fn empty_form_offers_unset_environment_choice() {
        let form = RoleFormData::empty("production");
        assert_eq!(form.existing_run_list_environments, vec![String::new()]);
        let value = RoleView::Edit {
            id: "web".to_string(),
            form,
        }
        .to_value();
        assert_eq!(value.get_attr("id").unwrap().as_str(), Some("web"));
        assert_eq!(
            value.get_attr("current_environment").unwrap().as_str(),
            Some("production")
        );
    }
}

// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::DEFAULT_ENVIRONMENT;
use super::run_list::{RunList, RunListError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

pub const MAX_ROLE_NAME_CHARS: usize = 255;

const JSON_CLASS: &str = "Chef::Role";
const CHEF_TYPE: &str = "role";

pub type Attributes = Map<String, Value>;

#[derive(Debug)]
pub enum RoleError {
    InvalidName(String),
    InvalidRunList {
        environment: String,
        source: RunListError,
    },
    MissingDefaultRunList,
    AttributesJson(serde_json::Error),
    AttributesNotObject,
}

impl fmt::Display for RoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleError::InvalidName(msg) => write!(f, "Invalid role name: {}", msg),
            RoleError::InvalidRunList {
                environment,
                source,
            } => write!(f, "Invalid run list for {}: {}", environment, source),
            RoleError::MissingDefaultRunList => write!(
                f,
                "{} key is required in env_run_lists",
                DEFAULT_ENVIRONMENT
            ),
            RoleError::AttributesJson(err) => write!(f, "Attributes are not valid JSON: {}", err),
            RoleError::AttributesNotObject => write!(f, "Attributes must be a JSON object"),
        }
    }
}

impl Error for RoleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RoleError::InvalidRunList { source, .. } => Some(source),
            RoleError::AttributesJson(err) => Some(err),
            _ => None,
        }
    }
}

pub fn validate_role_name(name: &str) -> Result<(), RoleError> {
    if name.is_empty() {
        return Err(RoleError::InvalidName("name is required".to_string()));
    }
    if name.chars().count() > MAX_ROLE_NAME_CHARS {
        return Err(RoleError::InvalidName(format!(
            "name must be at most {} characters",
            MAX_ROLE_NAME_CHARS
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(RoleError::InvalidName(format!(
            "'{}' contains invalid characters",
            name
        )));
    }
    Ok(())
}

/// Decodes a submitted attribute blob. Only JSON objects are accepted.
pub fn parse_attributes(text: &str) -> Result<Attributes, RoleError> {
    match serde_json::from_str::<Value>(text).map_err(RoleError::AttributesJson)? {
        Value::Object(map) => Ok(map),
        _ => Err(RoleError::AttributesNotObject),
    }
}

/// Request-scoped copy of a role held by the remote server.
///
/// A role always carries a `_default` run list; [`Role::run_list`] returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RoleDocument", into = "RoleDocument")]
pub struct Role {
    name: String,
    description: String,
    default_attributes: Attributes,
    override_attributes: Attributes,
    env_run_lists: BTreeMap<String, RunList>,
}

impl Default for Role {
    fn default() -> Self {
        let mut env_run_lists = BTreeMap::new();
        env_run_lists.insert(DEFAULT_ENVIRONMENT.to_string(), RunList::new());
        Self {
            name: String::new(),
            description: String::new(),
            default_attributes: Attributes::new(),
            override_attributes: Attributes::new(),
            env_run_lists,
        }
    }
}

impl Role {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> Result<(), RoleError> {
        validate_role_name(name)?;
        self.name = name.to_string();
        Ok(())
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: &str) {
        self.description = description.to_string();
    }

    pub fn default_attributes(&self) -> &Attributes {
        &self.default_attributes
    }

    pub fn set_default_attributes(&mut self, attributes: Attributes) {
        self.default_attributes = attributes;
    }

    pub fn override_attributes(&self) -> &Attributes {
        &self.override_attributes
    }

    pub fn set_override_attributes(&mut self, attributes: Attributes) {
        self.override_attributes = attributes;
    }

    pub fn env_run_lists(&self) -> &BTreeMap<String, RunList> {
        &self.env_run_lists
    }

    /// Replaces every run list. `_default` must be present; nothing changes
    /// when an entry is invalid.
    pub fn set_env_run_lists(
        &mut self,
        lists: &BTreeMap<String, Vec<String>>,
    ) -> Result<(), RoleError> {
        if !lists.contains_key(DEFAULT_ENVIRONMENT) {
            return Err(RoleError::MissingDefaultRunList);
        }
        let mut next = BTreeMap::new();
        for (environment, entries) in lists {
            let run_list =
                RunList::from_entries(entries).map_err(|source| RoleError::InvalidRunList {
                    environment: environment.clone(),
                    source,
                })?;
            next.insert(environment.clone(), run_list);
        }
        self.env_run_lists = next;
        Ok(())
    }

    pub fn run_list(&self) -> &RunList {
        static EMPTY: RunList = RunList::EMPTY;
        self.env_run_lists
            .get(DEFAULT_ENVIRONMENT)
            .unwrap_or(&EMPTY)
    }

    pub fn run_list_for(&self, environment: &str) -> Option<&RunList> {
        self.env_run_lists.get(environment)
    }

    /// Environment names the role has a run list for, sorted.
    pub fn run_list_environments(&self) -> Vec<String> {
        self.env_run_lists.keys().cloned().collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RoleDocument {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_json_class")]
    json_class: String,
    #[serde(default = "default_chef_type")]
    chef_type: String,
    #[serde(default)]
    default_attributes: Attributes,
    #[serde(default)]
    override_attributes: Attributes,
    #[serde(default)]
    run_list: RunList,
    #[serde(default)]
    env_run_lists: BTreeMap<String, RunList>,
}

fn default_json_class() -> String {
    JSON_CLASS.to_string()
}

fn default_chef_type() -> String {
    CHEF_TYPE.to_string()
}

impl From<Role> for RoleDocument {
    fn from(role: Role) -> Self {
        let mut env_run_lists = role.env_run_lists;
        let run_list = env_run_lists.remove(DEFAULT_ENVIRONMENT).unwrap_or_default();
        Self {
            name: role.name,
            description: role.description,
            json_class: default_json_class(),
            chef_type: default_chef_type(),
            default_attributes: role.default_attributes,
            override_attributes: role.override_attributes,
            run_list,
            env_run_lists,
        }
    }
}

impl TryFrom<RoleDocument> for Role {
    type Error = RoleError;

    fn try_from(document: RoleDocument) -> Result<Self, Self::Error> {
        validate_role_name(&document.name)?;
        let mut env_run_lists = document.env_run_lists;
        // the top-level run list wins over a stray `_default` entry
        env_run_lists.insert(DEFAULT_ENVIRONMENT.to_string(), document.run_list);
        Ok(Self {
            name: document.name,
            description: document.description,
            default_attributes: document.default_attributes,
            override_attributes: document.override_attributes,
            env_run_lists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lists(entries: &[(&str, &[&str])]) -> BTreeMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(env, items)| {
                (
                    env.to_string(),
                    items.iter().map(|item| item.to_string()).collect(),
                )
            })
            .collect()
    }

    #[test]
    fn new_role_has_empty_default_run_list() {
        let role = Role::new();
        assert_eq!(role.name(), "");
        assert!(role.run_list().is_empty());
        assert_eq!(role.run_list_environments(), vec![DEFAULT_ENVIRONMENT]);
    }

    #[test]
    fn set_name_validates_characters() {
        let mut role = Role::new();
        assert!(role.set_name("web-frontend_2").is_ok());
        assert!(matches!(
            role.set_name("web server"),
            Err(RoleError::InvalidName(_))
        ));
        assert!(role.set_name("").is_err());
        assert_eq!(role.name(), "web-frontend_2");
    }

    #[test]
    fn env_run_lists_require_default_entry() {
        let mut role = Role::new();
        let result = role.set_env_run_lists(&lists(&[("production", &["nginx"])]));
        assert!(matches!(result, Err(RoleError::MissingDefaultRunList)));

        role.set_env_run_lists(&lists(&[
            ("_default", &["recipe[nginx]"]),
            ("production", &["role[base]", "nginx"]),
        ]))
        .unwrap();
        assert_eq!(role.run_list().to_strings(), vec!["recipe[nginx]"]);
        assert_eq!(
            role.run_list_for("production").unwrap().to_strings(),
            vec!["role[base]", "recipe[nginx]"]
        );
    }

    #[test]
    fn invalid_run_list_leaves_role_unchanged() {
        let mut role = Role::new();
        role.set_env_run_lists(&lists(&[("_default", &["apt"])]))
            .unwrap();
        let result = role.set_env_run_lists(&lists(&[("_default", &["bad[x]"])]));
        assert!(matches!(result, Err(RoleError::InvalidRunList { .. })));
        assert_eq!(role.run_list().to_strings(), vec!["recipe[apt]"]);
    }

    #[test]
    fn parse_attributes_requires_object() {
        let attrs = parse_attributes(r#"{"nginx": {"port": 80}}"#).unwrap();
        assert_eq!(attrs["nginx"]["port"], json!(80));
        assert!(matches!(
            parse_attributes("{not json"),
            Err(RoleError::AttributesJson(_))
        ));
        assert!(matches!(
            parse_attributes("[1, 2]"),
            Err(RoleError::AttributesNotObject)
        ));
    }

    #[test]
    fn wire_format_splits_default_run_list() {
        let mut role = Role::new();
        role.set_name("web").unwrap();
        role.set_description("Web servers");
        role.set_env_run_lists(&lists(&[
            ("_default", &["recipe[nginx]"]),
            ("production", &["role[base]"]),
        ]))
        .unwrap();

        let value = serde_json::to_value(&role).unwrap();
        assert_eq!(value["json_class"], json!("Chef::Role"));
        assert_eq!(value["chef_type"], json!("role"));
        assert_eq!(value["run_list"], json!(["recipe[nginx]"]));
        assert_eq!(
            value["env_run_lists"],
            json!({"production": ["role[base]"]})
        );

        let decoded: Role = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, role);
    }

    #[test]
    fn wire_format_fills_missing_fields() {
        let role: Role = serde_json::from_value(json!({"name": "db"})).unwrap();
        assert_eq!(role.name(), "db");
        assert!(role.default_attributes().is_empty());
        assert!(role.run_list_for(DEFAULT_ENVIRONMENT).is_some());
        assert!(serde_json::from_value::<Role>(json!({"name": "bad name"})).is_err());
    }
}

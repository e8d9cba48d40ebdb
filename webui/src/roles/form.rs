// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::csrf::CSRF_FIELD_NAME;
use std::collections::BTreeMap;

const ENV_RUN_LISTS_PREFIX: &str = "env_run_lists[";

/// HTTP verb requested through the `_method` field of a POST form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodOverride {
    Put,
    Delete,
}

impl MethodOverride {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "put" => Some(Self::Put),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// Submitted role create/update form.
///
/// Built from the raw urlencoded pairs so repeated keys and bracketed
/// environment names survive decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleForm {
    pub name: String,
    pub description: String,
    pub default_attributes: String,
    pub override_attributes: String,
    pub env_run_lists: BTreeMap<String, Vec<String>>,
    pub for_role: Vec<String>,
    pub method: String,
    pub csrf_token: String,
}

impl RoleForm {
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut form = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "name" => form.name = value.clone(),
                "description" => form.description = value.clone(),
                "default_attributes" => form.default_attributes = value.clone(),
                "override_attributes" => form.override_attributes = value.clone(),
                "_method" => form.method = value.clone(),
                CSRF_FIELD_NAME => form.csrf_token = value.clone(),
                "for_role" | "for_role[]" => form.for_role.extend(split_entries(value)),
                other => {
                    if let Some(environment) = env_run_list_key(other) {
                        form.env_run_lists
                            .entry(environment.to_string())
                            .or_default()
                            .extend(split_entries(value));
                    }
                }
            }
        }
        form
    }

    pub fn description(&self) -> Option<&str> {
        non_blank(&self.description)
    }

    pub fn default_attributes(&self) -> Option<&str> {
        non_blank(&self.default_attributes)
    }

    pub fn override_attributes(&self) -> Option<&str> {
        non_blank(&self.override_attributes)
    }

    pub fn method_override(&self) -> Option<MethodOverride> {
        MethodOverride::parse(&self.method)
    }
}

fn non_blank(value: &str) -> Option<&str> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// `env_run_lists[ENV]` and `env_run_lists[ENV][]` name the environment ENV.
fn env_run_list_key(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(ENV_RUN_LISTS_PREFIX)?;
    let end = rest.find(']')?;
    let (environment, tail) = (&rest[..end], &rest[end + 1..]);
    if environment.is_empty() || !(tail.is_empty() || tail == "[]") {
        return None;
    }
    Some(environment)
}

fn split_entries(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(['\n', '\r', ','])
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(entries: &[(&str, &str)]) -> Vec<(String, String)> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn scalar_fields_keep_last_value() {
        let form = RoleForm::from_pairs(&pairs(&[
            ("name", "first"),
            ("name", "web"),
            ("description", "Front end"),
            ("csrf_token", "tok"),
        ]));
        assert_eq!(form.name, "web");
        assert_eq!(form.csrf_token, "tok");
        assert_eq!(form.description(), Some("Front end"));
        assert_eq!(form.default_attributes(), None);
    }

    #[test]
    fn blank_optional_fields_are_absent() {
        let form = RoleForm::from_pairs(&pairs(&[
            ("description", "   "),
            ("override_attributes", ""),
        ]));
        assert_eq!(form.description(), None);
        assert_eq!(form.override_attributes(), None);
    }

    #[test]
    fn env_run_lists_collect_per_environment() {
        let form = RoleForm::from_pairs(&pairs(&[
            ("env_run_lists[_default][]", "recipe[nginx]"),
            ("env_run_lists[_default][]", "role[base]"),
            ("env_run_lists[production]", "recipe[a], recipe[b]\nrecipe[c]"),
            ("env_run_lists[staging]", ""),
        ]));
        assert_eq!(
            form.env_run_lists.get("_default").unwrap(),
            &vec!["recipe[nginx]".to_string(), "role[base]".to_string()]
        );
        assert_eq!(form.env_run_lists.get("production").unwrap().len(), 3);
        assert!(form.env_run_lists.get("staging").unwrap().is_empty());
    }

    #[test]
    fn malformed_env_keys_are_ignored() {
        let form = RoleForm::from_pairs(&pairs(&[
            ("env_run_lists[]", "recipe[a]"),
            ("env_run_lists[prod]extra", "recipe[a]"),
            ("env_run_lists", "recipe[a]"),
        ]));
        assert!(form.env_run_lists.is_empty());
    }

    #[test]
    fn for_role_accepts_both_key_forms() {
        let form = RoleForm::from_pairs(&pairs(&[
            ("for_role[]", "recipe[a]"),
            ("for_role", "role[b]\r\n"),
        ]));
        assert_eq!(form.for_role, vec!["recipe[a]", "role[b]"]);
    }

    #[test]
    fn method_override_is_case_insensitive() {
        let form = RoleForm::from_pairs(&pairs(&[("_method", "DELETE")]));
        assert_eq!(form.method_override(), Some(MethodOverride::Delete));
        assert_eq!(MethodOverride::parse("put"), Some(MethodOverride::Put));
        assert_eq!(MethodOverride::parse("patch"), None);
    }
}

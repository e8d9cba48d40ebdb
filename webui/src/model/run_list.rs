// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunListError {
    message: String,
}

impl RunListError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RunListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for RunListError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum RunListItemKind {
    Recipe,
    Role,
}

impl RunListItemKind {
    fn as_str(&self) -> &'static str {
        match self {
            RunListItemKind::Recipe => "recipe",
            RunListItemKind::Role => "role",
        }
    }
}

/// One entry of a run list: `recipe[name]`, `recipe[name@version]` or `role[name]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunListItem {
    kind: RunListItemKind,
    name: String,
    version: Option<String>,
}

impl RunListItem {
    /// Parses the textual form. A bare name (`nginx`, `nginx::proxy`,
    /// `nginx@1.2.0`) is a recipe reference.
    pub fn parse(value: &str) -> Result<Self, RunListError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RunListError::new("Run list item cannot be empty"));
        }

        match trimmed.find('[') {
            Some(open) => {
                let Some(inner) = trimmed[open + 1..].strip_suffix(']') else {
                    return Err(RunListError::new(format!(
                        "Unable to create run list item from '{}'",
                        trimmed
                    )));
                };
                let kind = match &trimmed[..open] {
                    "recipe" => RunListItemKind::Recipe,
                    "role" => RunListItemKind::Role,
                    other => {
                        return Err(RunListError::new(format!(
                            "Unknown run list item type '{}' in '{}'",
                            other, trimmed
                        )));
                    }
                };
                Self::build(kind, inner)
            }
            None if trimmed.contains(']') => Err(RunListError::new(format!(
                "Unable to create run list item from '{}'",
                trimmed
            ))),
            None => Self::build(RunListItemKind::Recipe, trimmed),
        }
    }

    fn build(kind: RunListItemKind, spec: &str) -> Result<Self, RunListError> {
        let (name, version) = match (kind, spec.split_once('@')) {
            (RunListItemKind::Recipe, Some((name, version))) => {
                if version.is_empty() {
                    return Err(RunListError::new(format!(
                        "Recipe '{}' has an empty version",
                        name
                    )));
                }
                (name, Some(version.to_string()))
            }
            _ => (spec, None),
        };
        validate_item_name(name)?;
        Ok(Self {
            kind,
            name: name.to_string(),
            version,
        })
    }
}

fn validate_item_name(name: &str) -> Result<(), RunListError> {
    if name.is_empty() {
        return Err(RunListError::new("Run list item name cannot be empty"));
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | '@' | ','))
    {
        return Err(RunListError::new(format!(
            "Run list item name '{}' contains invalid characters",
            name
        )));
    }
    Ok(())
}

impl fmt::Display for RunListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}[{}@{}]", self.kind.as_str(), self.name, version),
            None => write!(f, "{}[{}]", self.kind.as_str(), self.name),
        }
    }
}

/// Ordered, duplicate-free list of recipes and roles for one environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunList {
    items: Vec<RunListItem>,
}

impl RunList {
    pub const EMPTY: RunList = RunList { items: Vec::new() };

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a run list from raw entries, failing on the first invalid one.
    pub fn from_entries<S: AsRef<str>>(entries: &[S]) -> Result<Self, RunListError> {
        let mut run_list = Self::new();
        run_list.reset(entries)?;
        Ok(run_list)
    }

    /// Replaces every entry. The list is left untouched when an entry fails to parse.
    pub fn reset<S: AsRef<str>>(&mut self, entries: &[S]) -> Result<(), RunListError> {
        let mut next = Self::new();
        for entry in entries {
            next.add(RunListItem::parse(entry.as_ref())?);
        }
        *self = next;
        Ok(())
    }

    /// Appends an item unless it is already present. Returns whether it was added.
    pub fn add(&mut self, item: RunListItem) -> bool {
        if self.items.contains(&item) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.items.iter().map(RunListItem::to_string).collect()
    }
}

impl Serialize for RunList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.items.iter().map(RunListItem::to_string))
    }
}

impl<'de> Deserialize<'de> for RunList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<String>::deserialize(deserializer)?;
        RunList::from_entries(&entries).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_are_recipes() {
        let item = RunListItem::parse("nginx::proxy").unwrap();
        assert_eq!(item.kind, RunListItemKind::Recipe);
        assert_eq!(item.name, "nginx::proxy");
        assert_eq!(item.to_string(), "recipe[nginx::proxy]");
    }

    #[test]
    fn parses_versions_and_roles() {
        let recipe = RunListItem::parse("recipe[nginx@1.2.0]").unwrap();
        assert_eq!(recipe.version.as_deref(), Some("1.2.0"));
        assert_eq!(recipe.to_string(), "recipe[nginx@1.2.0]");

        let role = RunListItem::parse(" role[base] ").unwrap();
        assert_eq!(role.kind, RunListItemKind::Role);
        assert_eq!(role.name, "base");
    }

    #[test]
    fn rejects_unknown_and_malformed_items() {
        assert!(RunListItem::parse("foo[bar]").is_err());
        assert!(RunListItem::parse("recipe[nginx").is_err());
        assert!(RunListItem::parse("nginx]").is_err());
        assert!(RunListItem::parse("recipe[]").is_err());
        assert!(RunListItem::parse("role[base@1.0]").is_err());
        assert!(RunListItem::parse("recipe[nginx@]").is_err());
        assert!(RunListItem::parse("   ").is_err());
    }

    #[test]
    fn add_ignores_duplicates_and_keeps_order() {
        let mut run_list = RunList::new();
        assert!(run_list.add(RunListItem::parse("apt").unwrap()));
        assert!(run_list.add(RunListItem::parse("role[base]").unwrap()));
        assert!(!run_list.add(RunListItem::parse("recipe[apt]").unwrap()));
        assert_eq!(run_list.to_strings(), vec!["recipe[apt]", "role[base]"]);
    }

    #[test]
    fn reset_keeps_previous_entries_on_failure() {
        let mut run_list = RunList::from_entries(&["recipe[apt]"]).unwrap();
        let result = run_list.reset(&["role[base]", "bogus[x]"]);
        assert!(result.is_err());
        assert_eq!(run_list.to_strings(), vec!["recipe[apt]"]);
    }

    #[test]
    fn serializes_as_string_list() {
        let run_list = RunList::from_entries(&["nginx", "role[web]"]).unwrap();
        let json = serde_json::to_value(&run_list).unwrap();
        assert_eq!(json, serde_json::json!(["recipe[nginx]", "role[web]"]));

        let decoded: RunList = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, run_list);
        assert!(serde_json::from_str::<RunList>(r#"["oops[x]"]"#).is_err());
    }
}

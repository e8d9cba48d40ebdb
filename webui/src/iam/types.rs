// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::UserConfig;
use serde::{Deserialize, Serialize};

pub const ADMIN_GROUP: &str = "admin";

/// Authenticated console user, without credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    pub name: String,
    pub groups: Vec<String>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.groups.iter().any(|group| group == ADMIN_GROUP)
    }
}

impl From<&UserConfig> for User {
    fn from(config: &UserConfig) -> Self {
        Self {
            name: config.name.clone(),
            groups: config.groups.clone(),
        }
    }
}

// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod role;
mod run_list;

pub use role::{
    Attributes, MAX_ROLE_NAME_CHARS, Role, RoleError, parse_attributes, validate_role_name,
};
pub use run_list::{RunList, RunListError, RunListItem};

/// Environment every role and node falls back to.
pub const DEFAULT_ENVIRONMENT: &str = "_default";

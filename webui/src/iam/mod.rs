// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod middleware;
mod password;
pub(crate) mod types;

pub use middleware::{
    AuthRequest, RequireLoginMiddleware, SessionContext, SessionMiddlewareFactory,
};
pub use password::{PasswordError, hash_password, verify_password};
pub use types::{ADMIN_GROUP, User};

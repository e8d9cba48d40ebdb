// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::iam::RequireLoginMiddleware;
use actix_web::web;

mod controller;
mod error;
mod form;
mod handlers;
mod views;

pub use controller::{ActionOutcome, RoleController};
pub use error::RoleActionError;
pub use form::{MethodOverride, RoleForm};
pub use views::{RoleFormData, RoleView};

pub const ROLES_PATH: &str = "/roles";

/// Registers the role admin routes. Every route requires a logged-in user.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope(ROLES_PATH)
            .wrap(RequireLoginMiddleware)
            .route("", web::get().to(handlers::index))
            .route("", web::post().to(handlers::create))
            .route("/new", web::get().to(handlers::new_form))
            .route("/{id}", web::get().to(handlers::show))
            .route("/{id}", web::put().to(handlers::update))
            .route("/{id}", web::delete().to(handlers::destroy))
            .route("/{id}", web::post().to(handlers::member_post))
            .route("/{id}/edit", web::get().to(handlers::edit_form)),
    );
}

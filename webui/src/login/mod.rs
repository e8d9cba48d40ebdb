// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::web;

mod handlers;
mod return_path;
mod sessions;

pub use return_path::local_return_path;
pub use sessions::{LoginSessionError, LoginSessionStore, SessionSnapshot};

pub const LOGIN_PATH: &str = "/login";

/// Configure login and logout routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(LOGIN_PATH)
            .route(web::get().to(handlers::login_page))
            .route(web::post().to(handlers::handle_login)),
    )
    .service(web::resource("/logout").route(web::post().to(handlers::handle_logout)));
}

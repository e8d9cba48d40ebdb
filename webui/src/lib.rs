// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod app_state;
pub mod backend;
pub mod config;
pub mod csrf;
pub mod environments;
pub mod flash;
pub mod iam;
pub mod login;
pub mod model;
pub mod roles;
pub mod templates;

use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::web::{self, Data};
use actix_web::{HttpRequest, HttpResponse, Result};
use app_state::AppState;
use templates::{ErrorPageContext, render_page};

/// Registers every console route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root_redirect));
    login::configure(cfg);
    roles::configure(cfg);
    environments::configure(cfg);
}

async fn root_redirect() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, roles::ROLES_PATH))
        .finish()
}

/// Fallback for unknown paths.
pub async fn not_found(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse> {
    log::debug!("No route for {} {}", req.method(), req.path());
    let page = app_state.page_context(&req);
    render_page(
        app_state.templates.as_ref(),
        "error_404.html",
        ErrorPageContext::new(page).to_value(),
        StatusCode::NOT_FOUND,
    )
}

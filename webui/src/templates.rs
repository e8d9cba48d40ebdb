// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Result};
use minijinja::Value;

mod context;
mod engine;

pub use context::{ErrorPageContext, LoginPageContext, PageContext};
pub use engine::{MiniJinjaEngine, TemplateEngine};

/// Render a minijinja template with the given context
pub fn render_minijinja_template(
    engine: &dyn TemplateEngine,
    template_name: &str,
    context: Value,
) -> Result<String, minijinja::Error> {
    engine.render(template_name, context)
}

/// Render a full HTML page, mapping template failures to a 500.
pub fn render_page(
    engine: &dyn TemplateEngine,
    template_name: &str,
    context: Value,
    status: StatusCode,
) -> Result<HttpResponse> {
    let html = render_minijinja_template(engine, template_name, context).map_err(|err| {
        log::error!("Failed to render template {}: {}", template_name, err);
        actix_web::error::ErrorInternalServerError("Template rendering failed")
    })?;

    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .insert_header(("Cache-Control", "no-cache, no-store, must-revalidate"))
        .body(html))
}

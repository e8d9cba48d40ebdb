// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! The per-session "current environment" used by the role edit form.

use crate::app_state::AppState;
use crate::iam::{AuthRequest, RequireLoginMiddleware};
use crate::login::local_return_path;
use crate::model::DEFAULT_ENVIRONMENT;
use crate::roles::ROLES_PATH;
use actix_web::http::header::LOCATION;
use actix_web::web::{self, Data};
use actix_web::{HttpRequest, HttpResponse, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CurrentEnvironmentForm {
    #[serde(default)]
    environment: String,
    return_path: Option<String>,
    csrf_token: Option<String>,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/environments")
            .wrap(RequireLoginMiddleware)
            .route("/current", web::post().to(set_current_environment)),
    );
}

/// Blank or `_default` clears the preference.
fn environment_preference(raw: &str) -> Option<String> {
    let environment = raw.trim();
    if environment.is_empty() || environment == DEFAULT_ENVIRONMENT {
        None
    } else {
        Some(environment.to_string())
    }
}

async fn set_current_environment(
    req: HttpRequest,
    form: web::Form<CurrentEnvironmentForm>,
    app_state: Data<AppState>,
) -> Result<HttpResponse> {
    app_state.csrf.verify(&req, form.csrf_token.as_deref())?;
    let environment = environment_preference(&form.environment);
    if let Some(session) = req.session() {
        log::debug!(
            "User {} switched to environment {}",
            session.user.name,
            environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
        );
        app_state
            .sessions
            .set_environment(&session.id, environment)
            .await;
    }

    let location = form
        .return_path
        .as_deref()
        .and_then(local_return_path)
        .unwrap_or_else(|| ROLES_PATH.to_string());
    Ok(HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_default_clear_the_preference() {
        assert_eq!(environment_preference("  "), None);
        assert_eq!(environment_preference("_default"), None);
        assert_eq!(
            environment_preference(" production "),
            Some("production".to_string())
        );
    }
}

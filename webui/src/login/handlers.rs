// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::LOGIN_PATH;
use super::return_path::local_return_path;
use crate::app_state::AppState;
use crate::config::{SessionConfig, ValidatedConfig};
use crate::flash::Flash;
use crate::iam::{AuthRequest, User, verify_password};
use crate::roles::ROLES_PATH;
use crate::templates::{LoginPageContext, render_page};
use actix_web::cookie::time::{Duration, OffsetDateTime};
use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::StatusCode;
use actix_web::http::header::LOCATION;
use actix_web::web::{self, Data};
use actix_web::{HttpRequest, HttpResponse, Result};
use serde::Deserialize;

const LOGIN_FAILED: &str = "Invalid username or password";

#[derive(Debug, Deserialize)]
pub(super) struct LoginQuery {
    return_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginForm {
    #[serde(default)]
    name: String,
    #[serde(default)]
    password: String,
    return_path: Option<String>,
}

pub(super) async fn login_page(
    req: HttpRequest,
    query: web::Query<LoginQuery>,
    app_state: Data<AppState>,
) -> Result<HttpResponse> {
    let return_path = query.return_path.as_deref().and_then(local_return_path);
    if req.is_authenticated() {
        return Ok(see_other(return_path.as_deref().unwrap_or(ROLES_PATH)));
    }
    render_login(&req, &app_state, "", return_path.as_deref(), None, StatusCode::OK).await
}

pub(super) async fn handle_login(
    req: HttpRequest,
    form: web::Form<LoginForm>,
    app_state: Data<AppState>,
    config: Data<ValidatedConfig>,
) -> Result<HttpResponse> {
    let return_path = form.return_path.as_deref().and_then(local_return_path);

    let Some(user) = authenticate(&config, &form.name, &form.password) else {
        log::warn!("Failed login attempt for user {:?}", form.name);
        return render_login(
            &req,
            &app_state,
            &form.name,
            return_path.as_deref(),
            Some(Flash::error(LOGIN_FAILED)),
            StatusCode::UNAUTHORIZED,
        )
        .await;
    };

    let session_id = app_state.sessions.create(user).await.map_err(|err| {
        log::error!("Failed to create session for {}: {}", form.name, err);
        actix_web::error::ErrorInternalServerError("Session store unavailable")
    })?;
    if let Some(previous) = req.session() {
        app_state.sessions.invalidate(&previous.id);
        app_state.csrf.cleanup_tokens_for_session(&previous.id);
    }
    log::info!("User {} logged in", form.name);

    Ok(HttpResponse::SeeOther()
        .cookie(session_cookie(&config.session, session_id))
        .insert_header((LOCATION, return_path.as_deref().unwrap_or(ROLES_PATH)))
        .finish())
}

pub(super) async fn handle_logout(
    req: HttpRequest,
    app_state: Data<AppState>,
    config: Data<ValidatedConfig>,
) -> Result<HttpResponse> {
    if let Some(session) = req.session() {
        app_state.sessions.invalidate(&session.id);
        app_state.csrf.cleanup_tokens_for_session(&session.id);
        log::info!("User {} logged out", session.user.name);
    }

    Ok(HttpResponse::SeeOther()
        .cookie(logout_cookie(&config.session))
        .insert_header((LOCATION, LOGIN_PATH))
        .finish())
}

/// Unknown users and bad passwords look the same to the caller.
fn authenticate(config: &ValidatedConfig, name: &str, password: &str) -> Option<User> {
    let user = config.find_user(name)?;
    match verify_password(password, &user.password_hash) {
        Ok(true) => Some(User::from(user)),
        Ok(false) => None,
        Err(err) => {
            log::error!("Password check failed for user {}: {}", name, err);
            None
        }
    }
}

async fn render_login(
    req: &HttpRequest,
    app_state: &AppState,
    username: &str,
    return_path: Option<&str>,
    flash: Option<Flash>,
    status: StatusCode,
) -> Result<HttpResponse> {
    let pending = app_state.take_pending_flash(req).await;
    let page = app_state.page_context(req).with_flash(flash.or(pending));
    let context = LoginPageContext::new(page, username, return_path).to_value();
    render_page(
        app_state.templates.as_ref(),
        "login/login_page.html",
        context,
        status,
    )
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((LOCATION, location))
        .finish()
}

fn session_cookie(config: &SessionConfig, session_id: String) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), session_id)
        .path("/")
        .secure(config.secure_cookie)
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish()
}

fn logout_cookie(config: &SessionConfig) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), "")
        .path("/")
        .secure(config.secure_cookie)
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(0))
        .expires(OffsetDateTime::UNIX_EPOCH)
        .finish()
}

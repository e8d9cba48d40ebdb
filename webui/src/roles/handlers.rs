// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::controller::{ActionOutcome, RoleController};
use super::form::{MethodOverride, RoleForm};
use crate::app_state::AppState;
use crate::iam::{ADMIN_GROUP, AuthRequest};
use crate::templates::{ErrorPageContext, render_page};
use actix_web::http::StatusCode;
use actix_web::http::header::{ALLOW, LOCATION};
use actix_web::web::{self, Data};
use actix_web::{HttpRequest, HttpResponse, Result};
use minijinja::context;

/// Raw urlencoded pairs; [`RoleForm::from_pairs`] gives them meaning.
type FormPairs = web::Form<Vec<(String, String)>>;

pub async fn index(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse> {
    let outcome = RoleController::new(&app_state.backend).index().await;
    respond(&req, &app_state, outcome).await
}

pub async fn new_form(req: HttpRequest, app_state: Data<AppState>) -> Result<HttpResponse> {
    let outcome = RoleController::new(&app_state.backend).new_form().await;
    respond(&req, &app_state, outcome).await
}

pub async fn show(
    req: HttpRequest,
    path: web::Path<String>,
    app_state: Data<AppState>,
) -> Result<HttpResponse> {
    let outcome = RoleController::new(&app_state.backend).show(&path).await;
    respond(&req, &app_state, outcome).await
}

pub async fn edit_form(
    req: HttpRequest,
    path: web::Path<String>,
    app_state: Data<AppState>,
) -> Result<HttpResponse> {
    let current_environment = req.current_environment();
    let outcome = RoleController::new(&app_state.backend)
        .edit_form(&path, &current_environment)
        .await;
    respond(&req, &app_state, outcome).await
}

pub async fn create(
    req: HttpRequest,
    form: FormPairs,
    app_state: Data<AppState>,
) -> Result<HttpResponse> {
    let form = RoleForm::from_pairs(&form);
    app_state.csrf.verify(&req, Some(form.csrf_token.as_str()))?;
    let outcome = RoleController::new(&app_state.backend).create(&form).await;
    respond(&req, &app_state, outcome).await
}

pub async fn update(
    req: HttpRequest,
    path: web::Path<String>,
    form: FormPairs,
    app_state: Data<AppState>,
) -> Result<HttpResponse> {
    let form = RoleForm::from_pairs(&form);
    app_state.csrf.verify(&req, Some(form.csrf_token.as_str()))?;
    update_role(&req, &app_state, &path, &form).await
}

/// `DELETE` carries its token in the `X-CSRF-Token` header.
pub async fn destroy(
    req: HttpRequest,
    path: web::Path<String>,
    app_state: Data<AppState>,
) -> Result<HttpResponse> {
    app_state.csrf.verify(&req, None)?;
    destroy_role(&req, &app_state, &path).await
}

/// `POST /roles/{id}` from HTML forms, dispatched on `_method`.
pub async fn member_post(
    req: HttpRequest,
    path: web::Path<String>,
    form: FormPairs,
    app_state: Data<AppState>,
) -> Result<HttpResponse> {
    let form = RoleForm::from_pairs(&form);
    app_state.csrf.verify(&req, Some(form.csrf_token.as_str()))?;
    match form.method_override() {
        Some(MethodOverride::Put) => update_role(&req, &app_state, &path, &form).await,
        Some(MethodOverride::Delete) => destroy_role(&req, &app_state, &path).await,
        None => {
            log::debug!("Rejecting POST to role {} with _method {:?}", path, form.method);
            Ok(HttpResponse::MethodNotAllowed()
                .insert_header((ALLOW, "GET, PUT, DELETE"))
                .finish())
        }
    }
}

async fn update_role(
    req: &HttpRequest,
    app_state: &AppState,
    id: &str,
    form: &RoleForm,
) -> Result<HttpResponse> {
    let current_environment = req.current_environment();
    let outcome = RoleController::new(&app_state.backend)
        .update(id, form, &current_environment)
        .await;
    respond(req, app_state, outcome).await
}

async fn destroy_role(req: &HttpRequest, app_state: &AppState, id: &str) -> Result<HttpResponse> {
    if !req.has_group(ADMIN_GROUP) {
        let user = req.user_info().map(|user| user.name).unwrap_or_default();
        log::warn!("User {} is not allowed to delete role {}", user, id);
        let flash = app_state.take_pending_flash(req).await;
        let page = app_state.page_context(req).with_flash(flash);
        return render_page(
            app_state.templates.as_ref(),
            "error_403.html",
            ErrorPageContext::new(page).to_value(),
            StatusCode::FORBIDDEN,
        );
    }
    let outcome = RoleController::new(&app_state.backend).destroy(id).await;
    respond(req, app_state, outcome).await
}

/// Every rendered page consumes the pending flash; the action's own message
/// takes precedence over it.
async fn respond(
    req: &HttpRequest,
    app_state: &AppState,
    outcome: ActionOutcome,
) -> Result<HttpResponse> {
    match outcome {
        ActionOutcome::Render { view, message } => {
            let pending = app_state.take_pending_flash(req).await;
            let page = app_state.page_context(req).with_flash(message.or(pending));
            let context = context! {
                page => page.to_value(),
                view => view.to_value()
            };
            render_page(
                app_state.templates.as_ref(),
                view.template_name(),
                context,
                StatusCode::OK,
            )
        }
        ActionOutcome::Redirect {
            location,
            absolute,
            permanent,
            flash,
        } => {
            if let Some(session) = req.session() {
                app_state.sessions.set_flash(&session.id, flash).await;
            }
            let location = if absolute {
                app_state.absolute_url(&location)
            } else {
                location
            };
            let mut response = if permanent {
                HttpResponse::MovedPermanently()
            } else {
                HttpResponse::Found()
            };
            Ok(response.insert_header((LOCATION, location)).finish())
        }
    }
}

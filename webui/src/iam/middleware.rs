// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::LOCATION;
use actix_web::web::Data;
use actix_web::{Error, HttpMessage, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

use super::types::User;
use crate::app_state::AppState;
use crate::config::ValidatedConfig;
use crate::model::DEFAULT_ENVIRONMENT;

/// Session attached to the request by [`SessionMiddlewareFactory`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: String,
    pub user: User,
    pub current_environment: Option<String>,
}

/// Trait to add authentication methods to HttpRequest
pub trait AuthRequest {
    fn session(&self) -> Option<SessionContext>;
    fn user_info(&self) -> Option<User>;
    fn has_group(&self, group: &str) -> bool;
    fn is_authenticated(&self) -> bool;

    /// Environment picked by the user, `_default` when none was chosen.
    fn current_environment(&self) -> String;
}

impl AuthRequest for HttpRequest {
    fn session(&self) -> Option<SessionContext> {
        self.extensions().get::<SessionContext>().cloned()
    }

    fn user_info(&self) -> Option<User> {
        self.session().map(|session| session.user)
    }

    fn has_group(&self, group: &str) -> bool {
        self.user_info()
            .map(|info| info.groups.iter().any(|g| g == group))
            .unwrap_or(false)
    }

    fn is_authenticated(&self) -> bool {
        self.extensions().contains::<SessionContext>()
    }

    fn current_environment(&self) -> String {
        self.session()
            .and_then(|session| session.current_environment)
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    }
}

// Session lookup middleware
pub struct SessionMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for SessionMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let app_state = req.app_data::<Data<AppState>>().cloned();
        let config = req.app_data::<Data<ValidatedConfig>>().cloned();
        let service = self.service.clone();

        Box::pin(async move {
            if let (Some(app_state), Some(config)) = (app_state, config)
                && let Some(cookie) = req.cookie(&config.session.cookie_name)
            {
                let session_id = cookie.value().to_string();
                match app_state.sessions.get(&session_id).await {
                    Some(snapshot) => {
                        req.extensions_mut().insert(SessionContext {
                            id: session_id,
                            user: snapshot.user,
                            current_environment: snapshot.current_environment,
                        });
                    }
                    None => log::debug!("Ignoring unknown or expired session cookie"),
                }
            }

            service.call(req).await
        })
    }
}

/// Middleware that requires a logged-in user - redirects to /login with the current path otherwise
pub struct RequireLoginMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequireLoginMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireLoginMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireLoginMiddlewareService { service }))
    }
}

pub struct RequireLoginMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequireLoginMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if !req.request().is_authenticated() {
            let (req, _) = req.into_parts();
            let current_path = req
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or(req.uri().path());
            let redirect_location =
                format!("/login?return_path={}", urlencoding::encode(current_path));
            log::debug!("Anonymous request to {} sent to login", current_path);

            let response = HttpResponse::Found()
                .insert_header((LOCATION, redirect_location))
                .finish()
                .map_into_right_body();

            return Box::pin(async move { Ok(ServiceResponse::new(req, response)) });
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            // Map normal responses to left body
            fut.await.map(ServiceResponse::map_into_left_body)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn request_with_session(groups: &[&str], environment: Option<&str>) -> HttpRequest {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(SessionContext {
            id: "session".to_string(),
            user: User {
                name: "alice".to_string(),
                groups: groups.iter().map(|g| g.to_string()).collect(),
            },
            current_environment: environment.map(str::to_string),
        });
        req
    }

    #[test]
    fn anonymous_request_has_no_user() {
        let req = TestRequest::default().to_http_request();
        assert!(!req.is_authenticated());
        assert!(!req.has_group("admin"));
        assert_eq!(req.current_environment(), DEFAULT_ENVIRONMENT);
    }

    #[test]
    fn session_exposes_user_and_environment() {
        let req = request_with_session(&["admin"], Some("production"));
        assert!(req.is_authenticated());
        assert!(req.has_group("admin"));
        assert_eq!(req.user_info().map(|u| u.name), Some("alice".to_string()));
        assert_eq!(req.current_environment(), "production");

        let req = request_with_session(&["ops"], None);
        assert!(!req.has_group("admin"));
        assert_eq!(req.current_environment(), DEFAULT_ENVIRONMENT);
    }
}

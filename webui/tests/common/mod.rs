// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, Version};
use std::sync::Arc;
use webui::app_state::AppState;
use webui::backend::{Backend, InMemoryBackend};
use webui::config::{
    ApiBackend, ApiConfig, AppConfig, LoggingConfig, ServerConfig, SessionConfig, UserConfig,
    ValidatedConfig,
};
use webui::iam::SessionMiddlewareFactory;
use webui::login::LoginSessionStore;
use webui::model::Role;

pub const ADMIN_NAME: &str = "alice";
pub const ADMIN_PASSWORD: &str = "admin-password";
pub const VIEWER_NAME: &str = "bob";
pub const VIEWER_PASSWORD: &str = "viewer-password";

pub struct TestHarness {
    pub config: Arc<ValidatedConfig>,
    pub app_state: Arc<AppState>,
    pub memory: Arc<InMemoryBackend>,
}

impl TestHarness {
    /// Must run inside the actix test runtime; the session store spawns a task.
    pub fn new() -> Self {
        Self::with_backend(InMemoryBackend::new())
    }

    pub fn with_backend(memory: InMemoryBackend) -> Self {
        let config = Arc::new(build_config());
        let memory = Arc::new(memory);
        let sessions = LoginSessionStore::from_config(&config.session);
        let app_state = Arc::new(AppState::new(
            &config,
            Backend::from_shared(memory.clone()),
            sessions,
        ));
        Self {
            config,
            app_state,
            memory,
        }
    }

    pub fn build_app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(web::Data::from(self.config.clone()))
            .app_data(web::Data::from(self.app_state.clone()))
            .wrap(SessionMiddlewareFactory)
            .configure(webui::configure)
            .default_service(web::to(webui::not_found))
    }

    /// The form token the console renders for this session.
    pub fn csrf_token(&self, cookie: &Cookie<'static>) -> String {
        self.app_state.csrf.get_or_refresh_token(cookie.value())
    }
}

pub fn role(name: &str, description: &str) -> Role {
    let mut role = Role::new();
    role.set_name(name).expect("valid role name");
    role.set_description(description);
    role
}

/// Logs in through the form and returns the session cookie.
pub async fn login<S>(app: &S, name: &str, password: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let req = test::TestRequest::post()
        .uri("/login")
        .set_form([("name", name), ("password", password)])
        .to_request();
    let resp = test::call_service(app, req).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    resp.response()
        .cookies()
        .find(|cookie| cookie.name() == SessionConfig::default().cookie_name)
        .map(|cookie| cookie.into_owned())
        .expect("session cookie")
}

pub async fn get_page<S>(app: &S, uri: &str, cookie: &Cookie<'static>) -> (StatusCode, String)
where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>,
{
    let req = test::TestRequest::get()
        .uri(uri)
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(app, req).await;
    let status = resp.status();
    let body = test::read_body(resp).await;
    (status, String::from_utf8(body.to_vec()).expect("utf-8 body"))
}

pub fn location(resp: &ServiceResponse<BoxBody>) -> String {
    resp.headers()
        .get(actix_web::http::header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
        .to_string()
}

fn build_config() -> ValidatedConfig {
    ValidatedConfig {
        server: ServerConfig::default(),
        app: AppConfig::default(),
        api: ApiConfig {
            backend: ApiBackend::Memory,
            ..ApiConfig::default()
        },
        logging: LoggingConfig::default(),
        session: SessionConfig::default(),
        users: vec![
            UserConfig {
                name: ADMIN_NAME.to_string(),
                password_hash: cheap_hash(ADMIN_PASSWORD),
                groups: vec!["admin".to_string()],
            },
            UserConfig {
                name: VIEWER_NAME.to_string(),
                password_hash: cheap_hash(VIEWER_PASSWORD),
                groups: Vec::new(),
            },
        ],
    }
}

/// Low-cost argon2id parameters; verification reads them back from the PHC string.
fn cheap_hash(password: &str) -> String {
    let params = Params::new(1024, 1, 1, None).expect("argon2 params");
    let salt = SaltString::generate(&mut OsRng);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.as_bytes(), &salt)
        .expect("hash password")
        .to_string()
}

// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use actix_web::HttpRequest;

use crate::backend::Backend;
use crate::config::ValidatedConfig;
use crate::csrf::CsrfTokenStore;
use crate::flash::Flash;
use crate::iam::AuthRequest;
use crate::login::LoginSessionStore;
use crate::templates::{MiniJinjaEngine, PageContext, TemplateEngine};

pub struct AppState {
    pub app_name: String,
    /// Origin for absolute redirects, without a trailing slash.
    pub public_base_url: String,
    pub templates: Arc<dyn TemplateEngine>,
    pub backend: Backend,
    pub sessions: LoginSessionStore,
    pub csrf: CsrfTokenStore,
}

impl AppState {
    pub fn new(config: &ValidatedConfig, backend: Backend, sessions: LoginSessionStore) -> Self {
        Self {
            app_name: config.app.name.clone(),
            public_base_url: config.public_base_url(),
            templates: Arc::new(MiniJinjaEngine::new()),
            backend,
            sessions,
            csrf: CsrfTokenStore::new(),
        }
    }

    /// Page chrome for `req`, including the session's form token.
    pub fn page_context(&self, req: &HttpRequest) -> PageContext {
        let page = PageContext::from_request(req, &self.app_name);
        match req.session() {
            Some(session) => page.with_csrf_token(self.csrf.get_or_refresh_token(&session.id)),
            None => page,
        }
    }

    /// Consumes the flash left by the previous redirect, if any.
    pub async fn take_pending_flash(&self, req: &HttpRequest) -> Option<Flash> {
        let session = req.session()?;
        self.sessions.take_flash(&session.id).await
    }

    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.public_base_url, path)
    }
}

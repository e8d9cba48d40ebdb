// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::flash::Flash;
use crate::iam::AuthRequest;
use actix_web::HttpRequest;
use minijinja::{Value, context};

/// Chrome shared by every page rendered inside `layout.html`.
#[derive(Debug, Clone)]
pub struct PageContext {
    app_name: String,
    user_name: Option<String>,
    is_admin: bool,
    current_environment: String,
    flash: Option<Flash>,
    csrf_token: Option<String>,
}

impl PageContext {
    pub fn new(app_name: &str) -> Self {
        Self {
            app_name: app_name.to_string(),
            user_name: None,
            is_admin: false,
            current_environment: crate::model::DEFAULT_ENVIRONMENT.to_string(),
            flash: None,
            csrf_token: None,
        }
    }

    pub fn from_request(req: &HttpRequest, app_name: &str) -> Self {
        let mut page = Self::new(app_name);
        if let Some(user) = req.user_info() {
            page.is_admin = user.is_admin();
            page.user_name = Some(user.name);
        }
        page.current_environment = req.current_environment();
        page
    }

    pub fn with_flash(mut self, flash: Option<Flash>) -> Self {
        self.flash = flash;
        self
    }

    pub fn with_csrf_token(mut self, token: String) -> Self {
        self.csrf_token = Some(token);
        self
    }

    pub fn to_value(&self) -> Value {
        context! {
            app_name => &self.app_name,
            user_name => &self.user_name,
            is_admin => self.is_admin,
            current_environment => &self.current_environment,
            flash => Value::from_serialize(&self.flash),
            csrf_token => &self.csrf_token
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorPageContext {
    page: PageContext,
}

impl ErrorPageContext {
    pub fn new(page: PageContext) -> Self {
        Self { page }
    }

    pub fn to_value(&self) -> Value {
        context! {
            page => self.page.to_value()
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginPageContext {
    page: PageContext,
    username: String,
    return_path: Option<String>,
}

impl LoginPageContext {
    pub fn new(page: PageContext, username: &str, return_path: Option<&str>) -> Self {
        Self {
            page,
            username: username.to_string(),
            return_path: return_path.map(str::to_string),
        }
    }

    pub fn to_value(&self) -> Value {
        context! {
            page => self.page.to_value(),
            username => &self.username,
            return_path => &self.return_path
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_context_defaults_to_default_environment() {
        let value = PageContext::new("Console").to_value();
        assert_eq!(
            value.get_attr("current_environment").unwrap().as_str(),
            Some("_default")
        );
        assert!(value.get_attr("flash").unwrap().is_none());
        assert!(value.get_attr("csrf_token").unwrap().is_none());
    }

    #[test]
    fn page_context_carries_csrf_token() {
        let value = PageContext::new("Console")
            .with_csrf_token("tok-123".to_string())
            .to_value();
        assert_eq!(value.get_attr("csrf_token").unwrap().as_str(), Some("tok-123"));
    }

    #[test]
    fn page_context_exposes_flash() {
        let page = PageContext::new("Console").with_flash(Some(Flash::error("boom")));
        let value = page.to_value();
        let flash = value.get_attr("flash").unwrap();
        assert_eq!(flash.get_attr("kind").unwrap().as_str(), Some("error"));
        assert_eq!(flash.get_attr("message").unwrap().as_str(), Some("boom"));
    }
}

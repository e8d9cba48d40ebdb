// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use minijinja::{Environment, Value, default_auto_escape_callback};

pub trait TemplateEngine: Send + Sync {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error>;
}

pub struct MiniJinjaEngine {
    env: Environment<'static>,
}

impl MiniJinjaEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(default_auto_escape_callback);
        env.set_loader(embedded_template_loader);
        Self { env }
    }
}

impl Default for MiniJinjaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateEngine for MiniJinjaEngine {
    fn render(&self, template_name: &str, context: Value) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template(template_name)?;
        tmpl.render(context)
    }
}

/// Template loader for minijinja that loads from embedded sources
fn embedded_template_loader(name: &str) -> Result<Option<String>, minijinja::Error> {
    let template_content = match name {
        "layout.html" => Some(include_str!("html/layout.html")),

        // Error pages
        "error_403.html" => Some(include_str!("html/error_403.html")),
        "error_404.html" => Some(include_str!("html/error_404.html")),

        // Login
        "login/login_page.html" => Some(include_str!("../login/templates/login_page.html")),

        // Role admin pages
        "roles/index.html" => Some(include_str!("../roles/templates/index.html")),
        "roles/show.html" => Some(include_str!("../roles/templates/show.html")),
        "roles/new.html" => Some(include_str!("../roles/templates/new.html")),
        "roles/edit.html" => Some(include_str!("../roles/templates/edit.html")),
        "roles/_form.html" => Some(include_str!("../roles/templates/_form.html")),

        _ => None,
    };

    Ok(template_content.map(|s| s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn renders_error_page_through_layout() {
        let engine = MiniJinjaEngine::new();
        let html = engine
            .render(
                "error_404.html",
                context! { page => context! { app_name => "Console" } },
            )
            .unwrap();
        assert!(html.contains("Console"));
        assert!(html.contains("Not Found"));
    }

    #[test]
    fn unknown_template_is_an_error() {
        let engine = MiniJinjaEngine::new();
        assert!(engine.render("missing.html", context! {}).is_err());
    }
}

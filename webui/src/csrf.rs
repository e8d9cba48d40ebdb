// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Per-session anti-forgery tokens for the state-changing console forms.

use crate::iam::AuthRequest;
use actix_web::HttpRequest;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use std::collections::HashMap;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const CSRF_TOKEN_EXPIRY_SECONDS: u64 = 3600;

/// Hidden form field carrying the token.
pub const CSRF_FIELD_NAME: &str = "csrf_token";
/// Header accepted instead of the form field, for `PUT`/`DELETE` callers.
pub const CSRF_HEADER_NAME: &str = "X-CSRF-Token";

#[derive(Clone, Debug)]
struct CsrfTokenData {
    created_at: Instant,
    session_id: String,
}

#[derive(Clone)]
pub struct CsrfTokenStore {
    sender: mpsc::Sender<CsrfCommand>,
}

enum CsrfCommand {
    GetOrRefresh {
        session_id: String,
        reply: mpsc::Sender<String>,
    },
    ValidateAndRenew {
        token_value: String,
        session_id: String,
        reply: mpsc::Sender<bool>,
    },
    CleanupTokens {
        session_id: String,
    },
}

/// Why a mutating request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfRejection {
    Missing,
    Invalid,
}

impl From<CsrfRejection> for actix_web::Error {
    fn from(rejection: CsrfRejection) -> Self {
        match rejection {
            CsrfRejection::Missing => actix_web::error::ErrorBadRequest("CSRF token required"),
            CsrfRejection::Invalid => {
                actix_web::error::ErrorForbidden("CSRF token validation failed")
            }
        }
    }
}

impl Default for CsrfTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CsrfTokenStore {
    pub fn new() -> Self {
        CsrfTokenStore {
            sender: start_csrf_worker(),
        }
    }

    fn request<T>(&self, build: impl FnOnce(mpsc::Sender<T>) -> CsrfCommand, fallback: T) -> T {
        let (reply, receive) = mpsc::channel();
        if self.sender.send(build(reply)).is_err() {
            log::error!("CsrfTokenStore channel closed");
            return fallback;
        }
        receive.recv().unwrap_or(fallback)
    }

    /// Returns the live token for the session, creating one when none exists.
    pub fn get_or_refresh_token(&self, session_id: &str) -> String {
        self.request(
            |reply| CsrfCommand::GetOrRefresh {
                session_id: session_id.to_string(),
                reply,
            },
            String::new(),
        )
    }

    /// A valid token is renewed rather than consumed, so several open forms keep working.
    pub fn validate_and_renew_token(&self, token_value: &str, session_id: &str) -> bool {
        if token_value.is_empty() {
            return false;
        }
        self.request(
            |reply| CsrfCommand::ValidateAndRenew {
                token_value: token_value.to_string(),
                session_id: session_id.to_string(),
                reply,
            },
            false,
        )
    }

    pub fn cleanup_tokens_for_session(&self, session_id: &str) {
        let command = CsrfCommand::CleanupTokens {
            session_id: session_id.to_string(),
        };
        if self.sender.send(command).is_err() {
            log::error!("CsrfTokenStore channel closed");
        }
    }

    /// Checks the token submitted with a mutating request: the form field when
    /// present, the `X-CSRF-Token` header otherwise.
    pub fn verify(
        &self,
        req: &HttpRequest,
        form_token: Option<&str>,
    ) -> Result<(), CsrfRejection> {
        let Some(session) = req.session() else {
            return Err(CsrfRejection::Invalid);
        };
        let token = form_token
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .or_else(|| {
                req.headers()
                    .get(CSRF_HEADER_NAME)
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
            });
        let Some(token) = token else {
            log::warn!(
                "Missing CSRF token for {} {} from user {}",
                req.method(),
                req.path(),
                session.user.name
            );
            return Err(CsrfRejection::Missing);
        };
        if !self.validate_and_renew_token(&token, &session.id) {
            log::warn!(
                "Invalid CSRF token for {} {} from user {}",
                req.method(),
                req.path(),
                session.user.name
            );
            return Err(CsrfRejection::Invalid);
        }
        Ok(())
    }
}

fn generate_token_value() -> String {
    let mut bytes = [0u8; 24];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn start_csrf_worker() -> mpsc::Sender<CsrfCommand> {
    let (sender, receiver) = mpsc::channel();
    let thread = thread::Builder::new().name("csrf-token-store".to_string());
    if let Err(err) = thread.spawn(move || run_csrf_worker(receiver)) {
        log::error!("CsrfTokenStore worker failed to start: {}", err);
    }
    sender
}

fn run_csrf_worker(receiver: mpsc::Receiver<CsrfCommand>) {
    let mut tokens: HashMap<String, CsrfTokenData> = HashMap::new();
    while let Ok(command) = receiver.recv() {
        let now = Instant::now();
        cleanup_expired_tokens(&mut tokens, now);
        match command {
            CsrfCommand::GetOrRefresh { session_id, reply } => {
                let existing = tokens
                    .iter_mut()
                    .find(|(_, data)| data.session_id == session_id)
                    .map(|(token_value, data)| {
                        data.created_at = now;
                        token_value.clone()
                    });
                let token_value = existing.unwrap_or_else(|| {
                    let token_value = generate_token_value();
                    tokens.insert(
                        token_value.clone(),
                        CsrfTokenData {
                            created_at: now,
                            session_id,
                        },
                    );
                    token_value
                });
                let _ = reply.send(token_value);
            }
            CsrfCommand::ValidateAndRenew {
                token_value,
                session_id,
                reply,
            } => {
                let is_valid = match tokens.get_mut(&token_value) {
                    Some(data) if data.session_id == session_id => {
                        data.created_at = now;
                        true
                    }
                    Some(_) => {
                        log::warn!("CSRF token presented by a different session; revoking it");
                        tokens.remove(&token_value);
                        false
                    }
                    None => false,
                };
                let _ = reply.send(is_valid);
            }
            CsrfCommand::CleanupTokens { session_id } => {
                tokens.retain(|_, data| data.session_id != session_id);
            }
        }
    }
}

fn cleanup_expired_tokens(tokens: &mut HashMap<String, CsrfTokenData>, now: Instant) {
    tokens.retain(|_, data| {
        now.duration_since(data.created_at) < Duration::from_secs(CSRF_TOKEN_EXPIRY_SECONDS)
    });
}

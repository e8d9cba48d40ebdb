// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::error::Error;
use std::fmt;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The server could not be reached or the exchange broke off.
    Transport,
    NotFound,
    Conflict,
    /// Any other non-success status.
    Status(u16),
    /// The response body did not decode.
    Decode,
    /// The request could not be built from the given data.
    Request,
}

#[derive(Debug)]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn not_found(resource: &str, name: &str) -> Self {
        Self::new(
            ApiErrorKind::NotFound,
            format!("{} '{}' not found", resource, name),
        )
    }

    pub fn conflict(resource: &str, name: &str) -> Self {
        Self::new(
            ApiErrorKind::Conflict,
            format!("{} '{}' already exists", resource, name),
        )
    }

    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ApiErrorKind::Status(code) => write!(f, "{} (HTTP {})", self.message, code),
            _ => write!(f, "{}", self.message),
        }
    }
}

impl Error for ApiError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|err| err as &(dyn Error + 'static))
    }
}

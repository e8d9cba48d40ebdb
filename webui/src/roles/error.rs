// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::backend::ApiError;
use crate::model::RoleError;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt;

/// Any failure inside a role action: a collaborator call or a model mutation.
#[derive(Debug)]
pub enum RoleActionError {
    Api(ApiError),
    Role(RoleError),
}

impl fmt::Display for RoleActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleActionError::Api(err) => write!(f, "API request failed: {}", err),
            RoleActionError::Role(err) => write!(f, "Invalid role: {}", err),
        }
    }
}

impl Error for RoleActionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RoleActionError::Api(err) => Some(err),
            RoleActionError::Role(err) => Some(err),
        }
    }
}

impl From<ApiError> for RoleActionError {
    fn from(err: ApiError) -> Self {
        RoleActionError::Api(err)
    }
}

impl From<RoleError> for RoleActionError {
    fn from(err: RoleError) -> Self {
        RoleActionError::Role(err)
    }
}

/// Logs a failed action with its cause chain, plus a backtrace when
/// `RUST_BACKTRACE` enables capture.
pub(crate) fn log_failure(action: &str, err: &(dyn Error + 'static)) {
    for line in failure_lines(action, err) {
        log::error!("{}", line);
    }
    let backtrace = Backtrace::capture();
    if backtrace.status() == BacktraceStatus::Captured {
        log::error!("{}", backtrace);
    }
}

/// Wrappers that already print their source's message do not repeat it as a cause.
fn failure_lines(action: &str, err: &(dyn Error + 'static)) -> Vec<String> {
    let mut shown = err.to_string();
    let mut lines = vec![format!("Failed to {}: {}", action, shown)];
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !shown.contains(&text) {
            lines.push(format!("  caused by: {}", text));
        }
        shown = text;
        source = cause.source();
    }
    lines
}

// This file is part of the product Role Console.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

/// Accepts only same-site absolute paths; anything that could leave the
/// console (schemes, `//host`, backslashes) is dropped.
pub fn local_return_path(raw_path: &str) -> Option<String> {
    let cleaned = raw_path.trim().replace(['\r', '\n'], "");
    if cleaned.is_empty() {
        return None;
    }
    if !cleaned.starts_with('/') || cleaned.starts_with("//") || cleaned.contains('\\') {
        return None;
    }
    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_local_paths() {
        assert_eq!(
            local_return_path(" /roles/web/edit?x=1 "),
            Some("/roles/web/edit?x=1".to_string())
        );
        assert_eq!(local_return_path("/"), Some("/".to_string()));
    }

    #[test]
    fn rejects_external_targets() {
        assert_eq!(local_return_path(""), None);
        assert_eq!(local_return_path("https://evil.example/"), None);
        assert_eq!(local_return_path("//evil.example/"), None);
        assert_eq!(local_return_path("/\\evil.example"), None);
        assert_eq!(local_return_path("roles"), None);
    }

    #[test]
    fn strips_line_breaks() {
        assert_eq!(
            local_return_path("/roles\r\nSet-Cookie: x"),
            Some("/rolesSet-Cookie: x".to_string())
        );
    }
}

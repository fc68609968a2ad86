//! Input validation and sanitizing for account forms.

use std::sync::LazyLock;

use regex::Regex;
use validator::ValidationErrors;

/// Letters, whitespace, hyphens and apostrophes.
pub static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z\s'-]+$").expect("valid regex"));

/// Lower-case and trim an email address.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Escape HTML-significant characters in free text before it is stored.
pub fn sanitize_input(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.trim().chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '&' => out.push_str("&amp;"),
            _ => out.push(c),
        }
    }
    out
}

/// Character-class requirements for new passwords. Length is checked by the
/// request's `validate()`.
pub fn password_issues(password: &str) -> Vec<String> {
    let checks: [(fn(&char) -> bool, &str); 4] = [
        (char::is_ascii_lowercase, "Password must contain at least one lowercase letter"),
        (char::is_ascii_uppercase, "Password must contain at least one uppercase letter"),
        (char::is_ascii_digit, "Password must contain at least one number"),
        (
            |c| !c.is_ascii_alphanumeric(),
            "Password must contain at least one special character",
        ),
    ];

    checks
        .iter()
        .filter(|(check, _)| !password.chars().any(|c| check(&c)))
        .map(|(_, message)| (*message).to_string())
        .collect()
}

/// Flatten `validator` errors into messages, in the given field order.
pub fn error_messages(errors: &ValidationErrors, fields: &[&str]) -> Vec<String> {
    let by_field = errors.field_errors();
    fields
        .iter()
        .filter_map(|field| by_field.get(*field))
        .flat_map(|errs| errs.iter())
        .map(|e| {
            e.message
                .as_ref()
                .map_or_else(|| format!("Invalid {}", e.code), ToString::to_string)
        })
        .collect()
}

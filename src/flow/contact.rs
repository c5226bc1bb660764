//! Telegram contact normalization and validation.
//!
//! Accepted shapes: `@username`, `http(s)://t.me/username`, `t.me/username`.
//! Bare `t.me/` links are rewritten to `https://t.me/` before matching.

use std::sync::LazyLock;

use regex::Regex;

static TELEGRAM_CONTACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(@\w{3,}|https?://t\.me/\w{3,}|t\.me/\w{3,})$")
        .expect("contact pattern is valid")
});

/// Trim the value and give bare `t.me/` links an `https://` scheme.
pub fn normalize(value: &str) -> String {
    let value = value.trim();
    if value.to_lowercase().starts_with("t.me/") {
        format!("https://{value}")
    } else {
        value.to_string()
    }
}

/// Whole-string match against the accepted shapes.
pub fn is_valid(value: &str) -> bool {
    TELEGRAM_CONTACT.is_match(value)
}

/// Normalize then validate. Returns the normalized contact on success.
pub fn parse_contact(raw: &str) -> Option<String> {
    let contact = normalize(raw);
    is_valid(&contact).then_some(contact)
}

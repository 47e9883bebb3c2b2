//! Log Redaction Layer
//!
//! Scrubs bot tokens and bearer tokens from strings prior to logging.

use regex::Regex;
use std::sync::LazyLock;

/// Telegram bot tokens look like `123456789:AAH...` (numeric bot id, colon, secret).
static BOT_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{5,}:[A-Za-z0-9_-]{30,}").unwrap());
static BEARER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Bearer\s+[a-zA-Z0-9\-\._~+/]+=*").unwrap());

/// Redacts sensitive patterns in a string.
pub fn redact_sensitive_data(input: &str) -> String {
    let redacted = BOT_TOKEN_RE.replace_all(input, "[REDACTED_TOKEN]");
    BEARER_RE
        .replace_all(&redacted, "[REDACTED_TOKEN]")
        .into_owned()
}

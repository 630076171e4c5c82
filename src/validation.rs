//! Input validation for the registration dialog

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Two or three letters, four digits, optional suffix letter
static CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{2,3}[0-9]{4}[A-Z]?$").unwrap_or_else(|e| panic!("invalid code regex: {e}"))
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://t\.me/joinchat/[A-Za-z0-9]+$")
        .unwrap_or_else(|e| panic!("invalid url regex: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Invalid {field} format: {input:?}")]
    InvalidFormat { field: &'static str, input: String },
}

/// Normalise a course code: trimmed, uppercased, e.g. ` cs2103t ` -> `CS2103T`
///
/// # Errors
///
/// `ValidationError::InvalidFormat` if the normalised code is not two or three
/// letters, four digits and an optional letter.
pub fn sanitize_code(input: &str) -> Result<String, ValidationError> {
    let code = input.trim().to_uppercase();
    if CODE_RE.is_match(&code) {
        Ok(code)
    } else {
        Err(ValidationError::InvalidFormat {
            field: "code",
            input: input.to_string(),
        })
    }
}

/// Check a group invite link; only surrounding whitespace is removed
///
/// # Errors
///
/// `ValidationError::InvalidFormat` unless the link is a `t.me/joinchat` invite.
pub fn sanitize_url(input: &str) -> Result<String, ValidationError> {
    let url = input.trim();
    if URL_RE.is_match(url) {
        Ok(url.to_string())
    } else {
        Err(ValidationError::InvalidFormat {
            field: "url",
            input: input.to_string(),
        })
    }
}

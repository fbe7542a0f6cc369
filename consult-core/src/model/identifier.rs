use crate::error::SignalingError;
use std::fmt;

/// Shortest identifier the relay accepts, in characters.
pub const MIN_IDENTIFIER_LEN: usize = 3;

/// Longest identifier the relay accepts, in characters.
pub const MAX_IDENTIFIER_LEN: usize = 128;

/// Which identifier failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Session,
    Participant,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierKind::Session => write!(f, "session id"),
            IdentifierKind::Participant => write!(f, "participant id"),
        }
    }
}

/// Checks an externally issued identifier and returns its trimmed form.
pub(crate) fn validate(kind: IdentifierKind, raw: &str) -> Result<String, SignalingError> {
    let value = raw.trim();

    let reject = |reason: &str| SignalingError::InvalidIdentifier {
        kind,
        reason: reason.to_owned(),
    };

    if value.is_empty() {
        return Err(reject("must not be empty"));
    }

    let len = value.chars().count();
    if len < MIN_IDENTIFIER_LEN {
        return Err(reject(&format!(
            "must be at least {MIN_IDENTIFIER_LEN} characters, got {len}"
        )));
    }
    if len > MAX_IDENTIFIER_LEN {
        return Err(reject(&format!(
            "must be at most {MAX_IDENTIFIER_LEN} characters, got {len}"
        )));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(reject("must not contain whitespace or control characters"));
    }

    Ok(value.to_owned())
}

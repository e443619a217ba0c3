use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_SESSION_ID_LEN: usize = 128;

/// Opaque collaboration room identifier.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionIdError {
    #[error("session id is empty")]
    Empty,
    #[error("session id is longer than {} bytes", MAX_SESSION_ID_LEN)]
    TooLong,
    #[error("session id has surrounding whitespace or control characters")]
    InvalidCharacters,
}

impl SessionId {
    pub fn parse(value: impl Into<String>) -> Result<Self, SessionIdError> {
        let value = value.into();
        if value.is_empty() {
            return Err(SessionIdError::Empty);
        }
        if value.len() > MAX_SESSION_ID_LEN {
            return Err(SessionIdError::TooLong);
        }
        if value.trim() != value || value.chars().any(char::is_control) {
            return Err(SessionIdError::InvalidCharacters);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionId {
    type Error = SessionIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<SessionId> for String {
    fn from(value: SessionId) -> Self {
        value.0
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_opaque_identifiers() {
        assert!(SessionId::parse("s1").is_ok());
        assert!(SessionId::parse("3f1c2a9e-7d7b-4c55-9f0e-1a2b3c4d5e6f").is_ok());
    }

    #[test]
    fn rejects_bad_identifiers() {
        assert_eq!(SessionId::parse(""), Err(SessionIdError::Empty));
        assert_eq!(
            SessionId::parse("x".repeat(MAX_SESSION_ID_LEN + 1)),
            Err(SessionIdError::TooLong)
        );
        assert_eq!(
            SessionId::parse(" s1"),
            Err(SessionIdError::InvalidCharacters)
        );
        assert_eq!(
            SessionId::parse("s\n1"),
            Err(SessionIdError::InvalidCharacters)
        );
    }

    #[test]
    fn deserializing_validates() {
        assert!(serde_json::from_str::<SessionId>(r#""room""#).is_ok());
        assert!(serde_json::from_str::<SessionId>(r#""""#).is_err());
    }
}

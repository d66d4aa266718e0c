use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;
use uuid::Uuid;
use validator::ValidateEmail;

use super::error::{Field, ValidationError, ValidationErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct UserId(Uuid);

impl UserId {
    pub(crate) fn new(id: Uuid) -> Self {
        Self(id)
    }

    #[cfg(test)]
    pub(crate) fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub(crate) fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl FromStr for UserId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An email address as the user typed it. Validation is permissive:
/// single-label domains such as `user@localhost` are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct EmailAddress(String);

impl EmailAddress {
    pub(crate) fn parse(candidate: impl Into<String>) -> Result<Self, ValidationError> {
        let candidate = candidate.into();
        if !candidate.validate_email() {
            return Err(ValidationError::new(
                Field::Email,
                ValidationErrorKind::InvalidFormat("is not a valid email address"),
            ));
        }
        Ok(Self(candidate))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) const USERNAME_MIN_LEN: usize = 3;
pub(crate) const USERNAME_MAX_LEN: usize = 16;

static USERNAME_RE: OnceLock<Regex> = OnceLock::new();

fn username_regex() -> &'static Regex {
    USERNAME_RE.get_or_init(|| {
        Regex::new("^[a-zA-Z0-9_]{3,16}$")
            .unwrap_or_else(|error| panic!("username regex failed to compile: {error}"))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct Username(String);

impl Username {
    /// Length is checked before the charset; only the first failure is
    /// reported.
    pub(crate) fn parse(candidate: impl Into<String>) -> Result<Self, ValidationError> {
        let candidate = candidate.into();
        let len = candidate.chars().count();
        if len < USERNAME_MIN_LEN {
            return Err(ValidationError::new(
                Field::Username,
                ValidationErrorKind::TooShort {
                    min: USERNAME_MIN_LEN,
                },
            ));
        }
        if len > USERNAME_MAX_LEN {
            return Err(ValidationError::new(
                Field::Username,
                ValidationErrorKind::TooLong {
                    max: USERNAME_MAX_LEN,
                },
            ));
        }
        if !username_regex().is_match(&candidate) {
            return Err(ValidationError::new(
                Field::Username,
                ValidationErrorKind::InvalidFormat(
                    "may only contain letters, numbers and underscores",
                ),
            ));
        }
        Ok(Self(candidate))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Bio(String);

impl Bio {
    pub(crate) fn parse(candidate: impl Into<String>) -> Self {
        Self(candidate.into())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Bio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub(crate) fn parse_image_url(candidate: &str) -> Result<Url, ValidationError> {
    Url::parse(candidate)
        .map_err(|_| ValidationError::new(Field::Image, ValidationErrorKind::InvalidUrl))
}

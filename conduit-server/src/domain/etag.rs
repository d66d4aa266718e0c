use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use super::value_objects::UserId;

const SEPARATOR: &str = "::";

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ETagParseError {
    #[error("ETag is missing the `::` separator")]
    MissingSeparator,

    #[error("ETag carries an invalid resource id")]
    InvalidId,

    #[error("ETag carries an invalid timestamp")]
    InvalidTimestamp,

    #[error("weak ETags are not supported")]
    Weak,
}

/// Version stamp of a user: its id plus the time of its last write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ETag {
    user_id: UserId,
    updated_at: DateTime<Utc>,
}

impl ETag {
    pub(crate) fn new(user_id: UserId, updated_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            updated_at,
        }
    }

    pub(crate) fn user_id(&self) -> UserId {
        self.user_id
    }

    pub(crate) fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}{SEPARATOR}{}\"",
            self.user_id,
            self.updated_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
        )
    }
}

impl FromStr for ETag {
    type Err = ETagParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("W/") {
            return Err(ETagParseError::Weak);
        }
        let unquoted = s
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .unwrap_or(s);

        let (id, timestamp) = unquoted
            .split_once(SEPARATOR)
            .ok_or(ETagParseError::MissingSeparator)?;
        let user_id = id.parse().map_err(|_| ETagParseError::InvalidId)?;
        let updated_at = DateTime::parse_from_rfc3339(timestamp)
            .map_err(|_| ETagParseError::InvalidTimestamp)?
            .with_timezone(&Utc);

        Ok(Self::new(user_id, updated_at))
    }
}

use std::fmt;

use thiserror::Error;

use super::etag::ETag;
use super::value_objects::UserId;

#[derive(Debug, Error)]
pub(crate) enum DomainError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    ConcurrentModification(#[from] ConcurrentModificationError),

    #[error("unexpected domain error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        DomainError::Validation(ValidationErrors::from(err))
    }
}

/// Failed authentication. Wrong password and unknown email are
/// indistinguishable to the caller: the message is always `unauthorized`.
#[derive(Debug, Error, Default)]
#[error("unauthorized")]
pub(crate) struct AuthError {
    #[source]
    cause: Option<anyhow::Error>,
}

impl AuthError {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_cause(cause: impl Into<anyhow::Error>) -> Self {
        Self {
            cause: Some(cause.into()),
        }
    }

    pub(crate) fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdField {
    Id,
    Email,
}

impl fmt::Display for IdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdField::Id => f.write_str("id"),
            IdField::Email => f.write_str("email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("user with {id_field} {value} not found")]
pub(crate) struct NotFoundError {
    pub(crate) id_field: IdField,
    pub(crate) value: String,
}

impl NotFoundError {
    pub(crate) fn by_id(id: &UserId) -> Self {
        Self {
            id_field: IdField::Id,
            value: id.to_string(),
        }
    }

    pub(crate) fn by_email(email: impl fmt::Display) -> Self {
        Self {
            id_field: IdField::Email,
            value: email.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("user {user_id} was modified concurrently: ETag {supplied_etag} is stale")]
pub(crate) struct ConcurrentModificationError {
    pub(crate) user_id: UserId,
    pub(crate) supplied_etag: ETag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Field {
    Username,
    Email,
    Password,
    Image,
}

impl Field {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Email => "email",
            Field::Password => "password",
            Field::Image => "image",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ValidationErrorKind {
    #[error("is too short (minimum is {min} characters)")]
    TooShort { min: usize },

    #[error("is too long (maximum is {max} characters)")]
    TooLong { max: usize },

    #[error("{0}")]
    InvalidFormat(&'static str),

    #[error("has already been taken")]
    Duplicate,

    #[error("is not a valid URL")]
    InvalidUrl,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} {kind}")]
pub(crate) struct ValidationError {
    pub(crate) field: Field,
    pub(crate) kind: ValidationErrorKind,
}

impl ValidationError {
    pub(crate) fn new(field: Field, kind: ValidationErrorKind) -> Self {
        Self { field, kind }
    }

    pub(crate) fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Every field-level failure of one request, in the order the fields were
/// checked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, err: ValidationError) {
        self.0.push(err);
    }

    /// Absorbs `err` if it carries validation failures, so the caller can keep
    /// checking the remaining fields. Any other error is handed back untouched
    /// and must abort the pipeline.
    pub(crate) fn push_validation_error(&mut self, err: DomainError) -> Result<(), DomainError> {
        match err {
            DomainError::Validation(errs) => {
                self.0.extend(errs.0);
                Ok(())
            }
            other => Err(other),
        }
    }

    /// Unwraps a parse result, recording a validation failure instead of
    /// returning it.
    pub(crate) fn collect<T, E>(&mut self, result: Result<T, E>) -> Result<Option<T>, DomainError>
    where
        E: Into<DomainError>,
    {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                self.push_validation_error(err.into())?;
                Ok(None)
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.0.iter()
    }

    pub(crate) fn into_result(self) -> Result<(), DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self))
        }
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(err: ValidationError) -> Self {
        Self(vec![err])
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed")?;
        for (idx, err) in self.0.iter().enumerate() {
            let sep = if idx == 0 { ": " } else { "; " };
            write!(f, "{sep}{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

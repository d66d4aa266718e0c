use url::Url;

use super::error::{DomainError, ValidationErrors};
use super::etag::ETag;
use super::password::{PasswordCandidate, PasswordHash};
use super::value_objects::{Bio, EmailAddress, UserId, Username, parse_image_url};

/// A snapshot of a stored user. `id` and `etag` come from persistence; every
/// write yields a new `User` with a new `etag`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct User {
    pub(crate) id: UserId,
    pub(crate) etag: ETag,
    pub(crate) username: Username,
    pub(crate) email: EmailAddress,
    pub(crate) password_hash: PasswordHash,
    pub(crate) bio: Option<Bio>,
    pub(crate) image_url: Option<Url>,
}

#[derive(Debug, Clone)]
pub(crate) struct RegistrationRequest {
    username: Username,
    email: EmailAddress,
    password_hash: PasswordHash,
}

impl RegistrationRequest {
    pub(crate) fn parse(username: &str, email: &str, password: &str) -> Result<Self, DomainError> {
        let mut errs = ValidationErrors::new();
        let username = errs.collect(Username::parse(username))?;
        let email = errs.collect(EmailAddress::parse(email))?;
        let password_hash = errs.collect(PasswordHash::parse(password))?;

        match (username, email, password_hash) {
            (Some(username), Some(email), Some(password_hash)) if errs.is_empty() => Ok(Self {
                username,
                email,
                password_hash,
            }),
            _ => Err(DomainError::Validation(errs)),
        }
    }

    pub(crate) fn username(&self) -> &Username {
        &self.username
    }

    pub(crate) fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub(crate) fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AuthRequest {
    email: EmailAddress,
    password_candidate: PasswordCandidate,
}

impl AuthRequest {
    pub(crate) fn parse(email: &str, password: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            email: EmailAddress::parse(email)?,
            password_candidate: PasswordCandidate::new(password),
        })
    }

    pub(crate) fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub(crate) fn password_candidate(&self) -> &PasswordCandidate {
        &self.password_candidate
    }
}

/// A partial update of one user. A `None` field is left untouched.
#[derive(Debug, Clone)]
pub(crate) struct UpdateRequest {
    pub(crate) user_id: UserId,
    pub(crate) etag: ETag,
    pub(crate) email: Option<EmailAddress>,
    pub(crate) password_hash: Option<PasswordHash>,
    pub(crate) bio: Option<Bio>,
    pub(crate) image_url: Option<Url>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct UpdateFields<'a> {
    pub(crate) email: Option<&'a str>,
    pub(crate) password: Option<&'a str>,
    pub(crate) bio: Option<&'a str>,
    pub(crate) image: Option<&'a str>,
}

impl UpdateRequest {
    pub(crate) fn parse(
        user_id: UserId,
        etag: ETag,
        fields: UpdateFields<'_>,
    ) -> Result<Self, DomainError> {
        let mut errs = ValidationErrors::new();
        let email = match fields.email {
            Some(raw) => errs.collect(EmailAddress::parse(raw))?,
            None => None,
        };
        let password_hash = match fields.password {
            Some(raw) => errs.collect(PasswordHash::parse(raw))?,
            None => None,
        };
        let image_url = match fields.image {
            Some(raw) => errs.collect(parse_image_url(raw))?,
            None => None,
        };
        errs.into_result()?;

        Ok(Self {
            user_id,
            etag,
            email,
            password_hash,
            bio: fields.bio.map(Bio::parse),
            image_url,
        })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.bio.is_none()
            && self.image_url.is_none()
    }
}

use std::fmt;
use std::sync::OnceLock;

use anyhow::anyhow;
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash as PhcHash, PasswordHasher, PasswordVerifier,
        SaltString, rand_core::OsRng,
    },
};

use super::error::{AuthError, DomainError, Field, ValidationError, ValidationErrorKind};

pub(crate) const PASSWORD_MIN_BYTES: usize = 8;
/// The hard input limit of bcrypt-family hashes, kept so every stored
/// password stays portable across adaptive hashers.
pub(crate) const PASSWORD_MAX_BYTES: usize = 72;

const REDACTED: &str = "[REDACTED]";

/// A one-way Argon2id hash of a user's password, kept as a PHC string.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct PasswordHash(String);

impl PasswordHash {
    pub(crate) fn parse(candidate: &str) -> Result<Self, DomainError> {
        let len = candidate.len();
        if len < PASSWORD_MIN_BYTES {
            return Err(ValidationError::new(
                Field::Password,
                ValidationErrorKind::TooShort {
                    min: PASSWORD_MIN_BYTES,
                },
            )
            .into());
        }
        if len > PASSWORD_MAX_BYTES {
            return Err(ValidationError::new(
                Field::Password,
                ValidationErrorKind::TooLong {
                    max: PASSWORD_MAX_BYTES,
                },
            )
            .into());
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2()?
            .hash_password(candidate.as_bytes(), &salt)
            .map_err(|err| anyhow!("failed to hash password: {err}"))?;
        Ok(Self(hash.to_string()))
    }

    pub(crate) fn from_phc(phc: String) -> Result<Self, DomainError> {
        PhcHash::new(&phc).map_err(|err| anyhow!("stored password hash is malformed: {err}"))?;
        Ok(Self(phc))
    }

    pub(crate) fn verify(&self, candidate: &PasswordCandidate) -> Result<(), DomainError> {
        let parsed = PhcHash::new(&self.0)
            .map_err(|err| anyhow!("stored password hash is malformed: {err}"))?;
        argon2()?
            .verify_password(candidate.0.as_bytes(), &parsed)
            .map_err(|err| match err {
                PasswordHashError::Password => {
                    DomainError::Auth(AuthError::with_cause(anyhow!("password mismatch")))
                }
                other => DomainError::Unexpected(anyhow!("password verification failed: {other}")),
            })
    }

    pub(crate) fn expose_phc(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordHash({REDACTED})")
    }
}

impl fmt::Display for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

/// A password as submitted at login. Compared against a hash, never
/// validated, so a failed login reveals nothing about password rules.
#[derive(Clone)]
pub(crate) struct PasswordCandidate(String);

impl PasswordCandidate {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }
}

impl fmt::Debug for PasswordCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordCandidate({REDACTED})")
    }
}

impl fmt::Display for PasswordCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

static DUMMY_HASH: OnceLock<PasswordHash> = OnceLock::new();

/// Burns one hash verification so a login for an unknown email takes about
/// as long as one with a wrong password.
pub(crate) fn verify_against_dummy(candidate: &PasswordCandidate) {
    let dummy = match DUMMY_HASH.get() {
        Some(hash) => hash,
        None => match PasswordHash::parse("dummy-password-for-timing") {
            Ok(hash) => DUMMY_HASH.get_or_init(|| hash),
            Err(_) => return,
        },
    };
    let _ = dummy.verify(candidate);
}

fn argon2() -> Result<Argon2<'static>, DomainError> {
    let params = Params::new(19 * 1024, 2, 1, None)
        .map_err(|err| anyhow!("invalid argon2 params: {err}"))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

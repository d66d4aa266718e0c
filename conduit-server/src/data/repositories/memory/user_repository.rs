use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::data::user_repository::UserRepository;
use crate::domain::error::{
    ConcurrentModificationError, DomainError, Field, NotFoundError, ValidationError,
    ValidationErrorKind, ValidationErrors,
};
use crate::domain::etag::ETag;
use crate::domain::user::{RegistrationRequest, UpdateRequest, User};
use crate::domain::value_objects::{EmailAddress, UserId};

/// In-process stand-in for the Postgres repository with the same uniqueness
/// and ETag semantics.
#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn snapshot(&self, id: UserId) -> Option<User> {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .get(&id)
            .cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn get_user_by_id(&self, id: UserId) -> Result<User, DomainError> {
        self.snapshot(id)
            .ok_or_else(|| NotFoundError::by_id(&id).into())
    }

    async fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, DomainError> {
        self.users
            .lock()
            .expect("users mutex poisoned")
            .values()
            .find(|user| &user.email == email)
            .cloned()
            .ok_or_else(|| NotFoundError::by_email(email).into())
    }

    async fn create_user(&self, req: RegistrationRequest) -> Result<User, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        let mut errs = ValidationErrors::new();
        if users.values().any(|user| &user.username == req.username()) {
            errs.push(ValidationError::new(Field::Username, ValidationErrorKind::Duplicate));
        }
        if users.values().any(|user| &user.email == req.email()) {
            errs.push(ValidationError::new(Field::Email, ValidationErrorKind::Duplicate));
        }
        errs.into_result()?;

        let id = UserId::random();
        let user = User {
            id,
            etag: ETag::new(id, Utc::now()),
            username: req.username().clone(),
            email: req.email().clone(),
            password_hash: req.password_hash().clone(),
            bio: None,
            image_url: None,
        };
        users.insert(id, user.clone());
        Ok(user)
    }

    async fn update_user(&self, req: UpdateRequest) -> Result<User, DomainError> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        let current = users
            .get(&req.user_id)
            .cloned()
            .ok_or_else(|| NotFoundError::by_id(&req.user_id))?;

        if current.etag != req.etag {
            return Err(ConcurrentModificationError {
                user_id: req.user_id,
                supplied_etag: req.etag,
            }
            .into());
        }
        if let Some(email) = &req.email
            && users
                .values()
                .any(|user| user.id != req.user_id && &user.email == email)
        {
            return Err(ValidationError::new(Field::Email, ValidationErrorKind::Duplicate).into());
        }

        let previous = current.etag.updated_at();
        let updated_at = Utc::now().max(previous + Duration::microseconds(1));
        let updated = User {
            etag: ETag::new(current.id, updated_at),
            email: req.email.unwrap_or(current.email),
            password_hash: req.password_hash.unwrap_or(current.password_hash),
            bio: req.bio.or(current.bio),
            image_url: req.image_url.or(current.image_url),
            ..current
        };
        users.insert(updated.id, updated.clone());
        Ok(updated)
    }
}

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::error::DomainError;
use crate::domain::user::{RegistrationRequest, UpdateRequest, User};
use crate::domain::value_objects::{EmailAddress, UserId};

/// Storage contract for users.
///
/// Misses are reported as `DomainError::NotFound`, unique violations as a
/// duplicate `DomainError::Validation`, and a stale ETag on update as
/// `DomainError::ConcurrentModification`.
#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn get_user_by_id(&self, id: UserId) -> Result<User, DomainError>;
    async fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, DomainError>;
    async fn create_user(&self, req: RegistrationRequest) -> Result<User, DomainError>;
    /// Applies `req` only if `req.etag` still names the current version.
    async fn update_user(&self, req: UpdateRequest) -> Result<User, DomainError>;
}

#[async_trait]
impl<R: UserRepository + ?Sized> UserRepository for Arc<R> {
    async fn get_user_by_id(&self, id: UserId) -> Result<User, DomainError> {
        (**self).get_user_by_id(id).await
    }

    async fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, DomainError> {
        (**self).get_user_by_email(email).await
    }

    async fn create_user(&self, req: RegistrationRequest) -> Result<User, DomainError> {
        (**self).create_user(req).await
    }

    async fn update_user(&self, req: UpdateRequest) -> Result<User, DomainError> {
        (**self).update_user(req).await
    }
}

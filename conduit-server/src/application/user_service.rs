use tracing::{debug, info};

use crate::data::user_repository::UserRepository;
use crate::domain::error::{AuthError, ConcurrentModificationError, DomainError};
use crate::domain::password::verify_against_dummy;
use crate::domain::user::{AuthRequest, RegistrationRequest, UpdateRequest, User};
use crate::domain::value_objects::UserId;

/// Stateless orchestration of user use cases over a [`UserRepository`].
/// Every call is attempted once; errors reach the caller as they are.
pub(crate) struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    pub(crate) async fn register(&self, req: RegistrationRequest) -> Result<User, DomainError> {
        let user = self.repo.create_user(req).await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Unknown email and wrong password both end in [`AuthError`], and both
    /// cost one hash verification.
    pub(crate) async fn authenticate(&self, req: AuthRequest) -> Result<User, DomainError> {
        let user = match self.repo.get_user_by_email(req.email()).await {
            Ok(user) => user,
            Err(DomainError::NotFound(not_found)) => {
                verify_against_dummy(req.password_candidate());
                debug!("authentication failed: unknown email");
                return Err(AuthError::with_cause(not_found).into());
            }
            Err(err) => return Err(err),
        };

        user.password_hash
            .verify(req.password_candidate())
            .inspect_err(|_| debug!(user_id = %user.id, "authentication failed"))?;

        info!(user_id = %user.id, "user authenticated");
        Ok(user)
    }

    pub(crate) async fn get_user(&self, id: UserId) -> Result<User, DomainError> {
        self.repo.get_user_by_id(id).await
    }

    /// An update that changes nothing still checks the ETag but writes nothing,
    /// so the ETag stays put.
    pub(crate) async fn update_user(&self, req: UpdateRequest) -> Result<User, DomainError> {
        if req.is_empty() {
            let current = self.repo.get_user_by_id(req.user_id).await?;
            if current.etag != req.etag {
                return Err(ConcurrentModificationError {
                    user_id: req.user_id,
                    supplied_etag: req.etag,
                }
                .into());
            }
            debug!(user_id = %current.id, "empty update, nothing written");
            return Ok(current);
        }

        let user_id = req.user_id;
        let user = self.repo.update_user(req).await?;
        info!(user_id = %user_id, etag = %user.etag, "user updated");
        Ok(user)
    }
}

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::data::user_repository::UserRepository;
use crate::domain::error::{
    ConcurrentModificationError, DomainError, Field, NotFoundError, ValidationError,
    ValidationErrorKind, ValidationErrors,
};
use crate::domain::etag::ETag;
use crate::domain::password::PasswordHash;
use crate::domain::user::{RegistrationRequest, UpdateRequest, User};
use crate::domain::value_objects::{Bio, EmailAddress, UserId, Username};

const USER_COLUMNS: &str = "id, username, email, password_hash, bio, image_url, updated_at";

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(id.as_uuid())
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_db_error)
    }

    async fn duplicate_fields(
        &self,
        username: &Username,
        email: &EmailAddress,
    ) -> Result<ValidationErrors, DomainError> {
        let (username_taken, email_taken) = sqlx::query_as::<_, (bool, bool)>(
            r#"
            SELECT EXISTS (SELECT 1 FROM users WHERE username = $1),
                   EXISTS (SELECT 1 FROM users WHERE email = $2)
            "#,
        )
        .bind(username.as_str())
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        Ok(duplicate_errors(username_taken, email_taken))
    }
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    bio: Option<String>,
    image_url: Option<String>,
    updated_at: DateTime<Utc>,
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn get_user_by_id(&self, id: UserId) -> Result<User, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        row.ok_or_else(|| NotFoundError::by_id(&id).into())
            .and_then(map_row_to_user)
    }

    async fn get_user_by_email(&self, email: &EmailAddress) -> Result<User, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        row.ok_or_else(|| NotFoundError::by_email(email).into())
            .and_then(map_row_to_user)
    }

    async fn create_user(&self, req: RegistrationRequest) -> Result<User, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(req.username().as_str())
        .bind(req.email().as_str())
        .bind(req.password_hash().expose_phc())
        .fetch_one(&self.pool)
        .await;

        let err = match row {
            Ok(row) => return map_row_to_user(row),
            Err(err) => err,
        };
        // Postgres reports only the first violated constraint; look up both.
        if is_unique_violation(&err) {
            let errs = self.duplicate_fields(req.username(), req.email()).await?;
            if !errs.is_empty() {
                return Err(errs.into());
            }
        }
        Err(map_user_db_error(err))
    }

    async fn update_user(&self, req: UpdateRequest) -> Result<User, DomainError> {
        // Compare-and-swap on the ETag: id and last write time must both match.
        // The new timestamp is forced past the old one so the ETag always moves.
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($4, email),
                password_hash = COALESCE($5, password_hash),
                bio = COALESCE($6, bio),
                image_url = COALESCE($7, image_url),
                updated_at = GREATEST(NOW(), updated_at + INTERVAL '1 microsecond')
            WHERE id = $1 AND id = $2 AND updated_at = $3
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(req.user_id.as_uuid())
        .bind(req.etag.user_id().as_uuid())
        .bind(req.etag.updated_at())
        .bind(req.email.as_ref().map(EmailAddress::as_str))
        .bind(req.password_hash.as_ref().map(PasswordHash::expose_phc))
        .bind(req.bio.as_ref().map(Bio::as_str))
        .bind(req.image_url.as_ref().map(Url::as_str))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        if let Some(row) = row {
            return map_row_to_user(row);
        }
        if !self.user_exists(req.user_id).await? {
            return Err(NotFoundError::by_id(&req.user_id).into());
        }
        debug!(user_id = %req.user_id, "update rejected: stale ETag");
        Err(ConcurrentModificationError {
            user_id: req.user_id,
            supplied_etag: req.etag,
        }
        .into())
    }
}

fn map_row_to_user(row: UserRow) -> Result<User, DomainError> {
    let id = UserId::new(row.id);
    let username = Username::parse(row.username)
        .map_err(|err| anyhow!("stored user {id} is invalid: {err}"))?;
    let email =
        EmailAddress::parse(row.email).map_err(|err| anyhow!("stored user {id} is invalid: {err}"))?;
    let password_hash = PasswordHash::from_phc(row.password_hash)?;
    let image_url = row
        .image_url
        .map(|raw| Url::parse(&raw))
        .transpose()
        .map_err(|err| anyhow!("stored user {id} has an invalid image url: {err}"))?;

    Ok(User {
        id,
        etag: ETag::new(id, row.updated_at),
        username,
        email,
        password_hash,
        bio: row.bio.map(Bio::parse),
        image_url,
    })
}

fn duplicate_errors(username_taken: bool, email_taken: bool) -> ValidationErrors {
    let mut errs = ValidationErrors::new();
    if username_taken {
        errs.push(ValidationError::new(Field::Username, ValidationErrorKind::Duplicate));
    }
    if email_taken {
        errs.push(ValidationError::new(Field::Email, ValidationErrorKind::Duplicate));
    }
    errs
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

fn map_user_db_error(err: sqlx::Error) -> DomainError {
    if is_unique_violation(&err)
        && let sqlx::Error::Database(db_err) = &err
    {
        let field = match db_err.constraint() {
            Some("users_username_key") => Some(Field::Username),
            Some("users_email_key") => Some(Field::Email),
            _ => None,
        };
        if let Some(field) = field {
            return ValidationError::new(field, ValidationErrorKind::Duplicate).into();
        }
    }
    DomainError::Unexpected(anyhow::Error::new(err).context("user query failed"))
}

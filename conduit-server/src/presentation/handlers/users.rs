use anyhow::Context;
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::etag::ETag;
use crate::domain::user::{AuthRequest, RegistrationRequest, UpdateFields, UpdateRequest, User};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppError, AppResult};
use crate::presentation::extract::JsonBody;
use crate::presentation::middleware::auth::AuthenticatedUser;

// Request DTOs hold raw passwords and intentionally do not derive `Debug`.

#[derive(Deserialize, ToSchema)]
pub(crate) struct RegisterUserDto {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Deserialize, ToSchema)]
pub(crate) struct RegisterRequestBody {
    pub(crate) user: RegisterUserDto,
}

#[derive(Deserialize, ToSchema)]
pub(crate) struct LoginUserDto {
    pub(crate) email: String,
    pub(crate) password: String,
}

#[derive(Deserialize, ToSchema)]
pub(crate) struct LoginRequestBody {
    pub(crate) user: LoginUserDto,
}

/// Absent and `null` fields are left unchanged.
#[derive(Deserialize, ToSchema, Default)]
pub(crate) struct UpdateUserDto {
    pub(crate) email: Option<String>,
    pub(crate) password: Option<String>,
    pub(crate) bio: Option<String>,
    pub(crate) image: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub(crate) struct UpdateRequestBody {
    pub(crate) user: UpdateUserDto,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserDto {
    pub(crate) email: String,
    pub(crate) token: String,
    pub(crate) username: String,
    pub(crate) bio: Option<String>,
    pub(crate) image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserResponseBody {
    pub(crate) user: UserDto,
}

impl UserDto {
    fn new(user: User, token: String) -> Self {
        Self {
            email: user.email.to_string(),
            token,
            username: user.username.to_string(),
            bio: user.bio.map(|bio| bio.into_inner()),
            image: user.image_url.map(String::from),
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = RegisterRequestBody,
    responses(
        (status = 201, description = "Registered successfully", body = UserResponseBody),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequestBody>,
) -> AppResult<Response> {
    let dto = body.user;
    let req = RegistrationRequest::parse(&dto.username, &dto.email, &dto.password)?;

    let user = state.user_service.register(req).await?;

    user_response(&state, StatusCode::CREATED, user)
}

#[utoipa::path(
    post,
    path = "/api/users/login",
    tag = "users",
    request_body = LoginRequestBody,
    responses(
        (status = 200, description = "Login successful", body = UserResponseBody),
        (status = 401, description = "Invalid credentials"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequestBody>,
) -> AppResult<Response> {
    let dto = body.user;
    let req = AuthRequest::parse(&dto.email, dto.password)?;

    let user = state.user_service.authenticate(req).await?;

    user_response(&state, StatusCode::OK, user)
}

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponseBody),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_current_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> AppResult<Response> {
    let user = state.user_service.get_user(auth.user_id).await?;

    user_response(&state, StatusCode::OK, user)
}

#[utoipa::path(
    put,
    path = "/api/user",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("If-Match" = String, Header, description = "ETag of the user as last read, or `*`")
    ),
    request_body = UpdateRequestBody,
    responses(
        (status = 200, description = "User updated", body = UserResponseBody),
        (status = 400, description = "Malformed If-Match header"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found"),
        (status = 412, description = "User was modified since the supplied ETag"),
        (status = 422, description = "Validation error"),
        (status = 428, description = "If-Match header missing"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn update_current_user(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    headers: HeaderMap,
    JsonBody(body): JsonBody<UpdateRequestBody>,
) -> AppResult<Response> {
    let etag = match if_match(&headers)? {
        Some(etag) => etag,
        None => state.user_service.get_user(auth.user_id).await?.etag,
    };
    let dto = body.user;
    let req = UpdateRequest::parse(
        auth.user_id,
        etag,
        UpdateFields {
            email: dto.email.as_deref(),
            password: dto.password.as_deref(),
            bio: dto.bio.as_deref(),
            image: dto.image.as_deref(),
        },
    )?;

    let user = state.user_service.update_user(req).await?;

    user_response(&state, StatusCode::OK, user)
}

/// `None` means `If-Match: *`, which matches whatever version is current.
fn if_match(headers: &HeaderMap) -> AppResult<Option<ETag>> {
    let raw = headers
        .get(header::IF_MATCH)
        .ok_or(AppError::PreconditionRequired)?
        .to_str()
        .map_err(|_| AppError::BadRequest("If-Match header is not valid text".to_string()))?;

    if raw.trim() == "*" {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|err| AppError::BadRequest(format!("invalid If-Match header: {err}")))
}

fn user_response(state: &AppState, status: StatusCode, user: User) -> AppResult<Response> {
    let token = state
        .jwt
        .generate_token(user.id)
        .context("failed to issue access token")?;
    let etag = HeaderValue::from_str(&user.etag.to_string()).context("ETag is not a valid header")?;

    Ok((
        status,
        [(header::ETAG, etag)],
        Json(UserResponseBody {
            user: UserDto::new(user, token),
        }),
    )
        .into_response())
}

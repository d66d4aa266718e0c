use axum::Router;
use axum::middleware;
use axum::routing::{get, post};

use crate::presentation::AppState;
use crate::presentation::handlers::users::{
    get_current_user, login, register, update_current_user,
};
use crate::presentation::middleware::auth::jwt_auth_middleware;

pub(crate) fn users_router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/login", post(login))
}

pub(crate) fn current_user_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(get_current_user).put(update_current_user))
        .layer(middleware::from_fn_with_state(state, jwt_auth_middleware))
}

use axum::Router;

use super::AppState;

pub(crate) mod users;

pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/users", users::users_router())
        .nest("/api/user", users::current_user_router(state))
}

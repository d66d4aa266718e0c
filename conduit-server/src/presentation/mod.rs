use std::sync::Arc;

use crate::application::user_service::UserService;
use crate::data::user_repository::UserRepository;
use crate::infrastructure::jwt::JwtService;

pub(crate) mod app_error;
pub(crate) mod extract;
pub(crate) mod handlers;
pub(crate) mod http_handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

#[cfg(test)]
mod tests;

pub(crate) type SharedUserRepository = Arc<dyn UserRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) user_service: Arc<UserService<SharedUserRepository>>,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    pub(crate) fn new(
        user_service: Arc<UserService<SharedUserRepository>>,
        jwt: Arc<JwtService>,
    ) -> Self {
        Self { user_service, jwt }
    }
}

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::users::{
    LoginRequestBody, LoginUserDto, RegisterRequestBody, RegisterUserDto, UpdateRequestBody,
    UpdateUserDto, UserDto, UserResponseBody,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::users::register,
        crate::presentation::handlers::users::login,
        crate::presentation::handlers::users::get_current_user,
        crate::presentation::handlers::users::update_current_user
    ),
    components(
        schemas(
            RegisterUserDto,
            RegisterRequestBody,
            LoginUserDto,
            LoginRequestBody,
            UpdateUserDto,
            UpdateRequestBody,
            UserDto,
            UserResponseBody
        )
    ),
    tags(
        (name = "users", description = "Registration, login and the current user")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}

use axum::response::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::handlers;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::register::register,
        handlers::login::login,
        handlers::two_factor::enroll,
        handlers::two_factor::confirm,
        handlers::me::me,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::types::RegisterRequest,
        handlers::types::AccountResponse,
        handlers::types::LoginRequest,
        handlers::types::LoginResponse,
        handlers::types::TwoFactorEnrollResponse,
        handlers::types::TwoFactorConfirmRequest,
        handlers::types::TwoFactorConfirmResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Accounts, sessions, and two-factor enrollment"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub async fn serve() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::debug;

use super::types::{AccountResponse, RegisterRequest};
use crate::auth::{AuthError, AuthService};

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Malformed email, empty password, or unusable body"),
        (status = 409, description = "Account already exists")
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(service): Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(payload)) = payload else {
        return Err(AuthError::Validation {
            field: "body",
            reason: "must be a JSON object with email and password",
        });
    };

    let account = service.register(&payload.email, &payload.password).await?;
    debug!("account created: {}", account.id);

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthConfig, MemoryCredentialStore, NoopRateLimiter};
    use anyhow::Result;
    use axum::response::Response;
    use secrecy::SecretString;

    fn service() -> Arc<AuthService> {
        let config = AuthConfig::new(SecretString::from("sekreto".to_string()), 3, 15)
            .expect("valid config");
        Arc::new(AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(NoopRateLimiter),
            &config,
        ))
    }

    async fn body_json(response: Response) -> Result<serde_json::Value> {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn register_returns_the_new_account() -> Result<()> {
        let service = service();
        let request = RegisterRequest {
            email: "alice@example.com".to_string(),
            password: "hunter22".to_string(),
        };

        let response = register(Extension(service), Some(Json(request)))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await?;
        assert_eq!(body["email"], "alice@example.com");
        assert_eq!(body["two_factor_enabled"], false);
        Ok(())
    }

    #[tokio::test]
    async fn missing_body_is_a_bad_request() {
        let response = register(Extension(service()), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_registration_is_a_conflict() -> Result<()> {
        let service = service();
        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let request = RegisterRequest {
                email: "alice@example.com".to_string(),
                password: "hunter22".to_string(),
            };
            let response = register(Extension(service.clone()), Some(Json(request)))
                .await
                .into_response();
            assert_eq!(response.status(), expected);
        }
        Ok(())
    }
}

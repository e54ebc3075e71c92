use axum::{
    extract::{ConnectInfo, Extension},
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::types::{LoginRequest, LoginResponse};
use super::utils::client_id;
use crate::auth::{AuthError, AuthService};

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginResponse),
        (status = 400, description = "Unusable body"),
        (status = 401, description = "Login failed, cause withheld")
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Extension(service): Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<impl IntoResponse, AuthError> {
    let Some(Json(payload)) = payload else {
        return Err(AuthError::Validation {
            field: "body",
            reason: "must be a JSON object with email and password",
        });
    };

    let client_id = client_id(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let token = service
        .login(
            &payload.email,
            &payload.password,
            payload.code.as_deref(),
            &client_id,
        )
        .await?;

    Ok(Json(LoginResponse { token }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::error::LOGIN_FAILED;
    use crate::auth::{AuthConfig, LoginRateLimiter, MemoryCredentialStore, NoopRateLimiter};
    use anyhow::Result;
    use axum::http::{HeaderValue, StatusCode};
    use secrecy::SecretString;
    use std::time::Duration;

    const EMAIL: &str = "alice@example.com";
    const PASSWORD: &str = "hunter22";

    fn config() -> AuthConfig {
        AuthConfig::new(SecretString::from("sekreto".to_string()), 2, 15).expect("valid config")
    }

    async fn service_with_account(limited: bool) -> Result<Arc<AuthService>> {
        let limiter: Arc<dyn crate::auth::RateLimiter> = if limited {
            Arc::new(LoginRateLimiter::new(2, Duration::from_secs(60)))
        } else {
            Arc::new(NoopRateLimiter)
        };
        let service = Arc::new(AuthService::new(
            Arc::new(MemoryCredentialStore::new()),
            limiter,
            &config(),
        ));
        service.register(EMAIL, PASSWORD).await?;
        Ok(service)
    }

    fn request(email: &str, password: &str) -> Option<Json<LoginRequest>> {
        Some(Json(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
            code: None,
        }))
    }

    #[tokio::test]
    async fn successful_login_returns_a_token() -> Result<()> {
        let service = service_with_account(false).await?;
        let response = login(
            HeaderMap::new(),
            None,
            Extension(service),
            request(EMAIL, PASSWORD),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body: serde_json::Value = serde_json::from_slice(&bytes)?;
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
        Ok(())
    }

    // Unknown account and wrong password return the identical response.
    #[tokio::test]
    async fn failures_share_one_opaque_response() -> Result<()> {
        let service = service_with_account(false).await?;

        let mut bodies = Vec::new();
        for (email, password) in [(EMAIL, "wrong"), ("nobody@example.com", PASSWORD)] {
            let response = login(
                HeaderMap::new(),
                None,
                Extension(service.clone()),
                request(email, password),
            )
            .await
            .into_response();

            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
            bodies.push(String::from_utf8(bytes.to_vec())?);
        }

        assert_eq!(bodies[0], bodies[1]);
        assert_eq!(bodies[0], LOGIN_FAILED);
        Ok(())
    }

    #[tokio::test]
    async fn rate_limited_client_sees_the_same_failure() -> Result<()> {
        let service = service_with_account(true).await?;
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.7"));

        for _ in 0..2 {
            let _ = login(
                headers.clone(),
                None,
                Extension(service.clone()),
                request(EMAIL, "wrong"),
            )
            .await
            .into_response();
        }

        // Cap reached: correct credentials are refused with the same
        // status and message as any other reject.
        let response = login(
            headers,
            None,
            Extension(service.clone()),
            request(EMAIL, PASSWORD),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        assert_eq!(String::from_utf8(bytes.to_vec())?, LOGIN_FAILED);

        // A different client address still gets through.
        let response = login(
            HeaderMap::new(),
            None,
            Extension(service),
            request(EMAIL, PASSWORD),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn missing_body_is_a_bad_request() -> Result<()> {
        let service = service_with_account(false).await?;
        let response = login(HeaderMap::new(), None, Extension(service), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}

//! Two-factor enrollment endpoints.
//!
//! Enrollment is a two-step flow: `enroll` provisions a secret and hands
//! it back once, `confirm` proves the authenticator app has it before
//! logins start requiring codes.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use super::types::{TwoFactorConfirmRequest, TwoFactorConfirmResponse, TwoFactorEnrollResponse};
use super::utils::require_account;
use crate::auth::{AuthError, AuthService};

#[utoipa::path(
    post,
    path = "/v1/auth/2fa/enroll",
    responses(
        (status = 200, description = "Fresh secret provisioned", body = TwoFactorEnrollResponse),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn enroll(
    headers: HeaderMap,
    Extension(service): Extension<Arc<AuthService>>,
) -> Result<impl IntoResponse, AuthError> {
    let account_id = require_account(&service, &headers)?;
    let enrollment = service.enroll_two_factor(account_id).await?;

    Ok(Json(TwoFactorEnrollResponse {
        secret: enrollment.secret,
        provisioning_uri: enrollment.provisioning_uri,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/2fa/confirm",
    request_body = TwoFactorConfirmRequest,
    responses(
        (status = 200, description = "Two-factor enabled", body = TwoFactorConfirmResponse),
        (status = 400, description = "Wrong code, no pending enrollment, or unusable body"),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn confirm(
    headers: HeaderMap,
    Extension(service): Extension<Arc<AuthService>>,
    payload: Option<Json<TwoFactorConfirmRequest>>,
) -> Result<Response, AuthError> {
    let account_id = require_account(&service, &headers)?;
    let Some(Json(payload)) = payload else {
        return Err(AuthError::Validation {
            field: "body",
            reason: "must be a JSON object with a code",
        });
    };

    if service.confirm_two_factor(account_id, &payload.code).await? {
        Ok(Json(TwoFactorConfirmResponse { enabled: true }).into_response())
    } else {
        Ok((StatusCode::BAD_REQUEST, "Invalid two-factor code").into_response())
    }
}

use axum::{
    extract::Extension,
    http::HeaderMap,
    response::{IntoResponse, Json},
};
use std::sync::Arc;

use super::types::AccountResponse;
use super::utils::require_account;
use crate::auth::{AuthError, AuthService};

#[utoipa::path(
    get,
    path = "/v1/auth/me",
    responses(
        (status = 200, description = "The authenticated account", body = AccountResponse),
        (status = 401, description = "Missing or invalid session token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn me(
    headers: HeaderMap,
    Extension(service): Extension<Arc<AuthService>>,
) -> Result<impl IntoResponse, AuthError> {
    let account_id = require_account(&service, &headers)?;
    let account = service.account(account_id).await?;

    Ok(Json(AccountResponse::from(account)))
}

//! Request and response bodies for the auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Account;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub two_factor_enabled: bool,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email,
            two_factor_enabled: account.two_factor_enabled,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// One-time code, required once two-factor is enabled.
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TwoFactorEnrollResponse {
    pub secret: String,
    pub provisioning_uri: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TwoFactorConfirmRequest {
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TwoFactorConfirmResponse {
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use uuid::Uuid;

    #[test]
    fn login_request_code_is_optional() -> Result<()> {
        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw"}"#)?;
        assert!(request.code.is_none());

        let request: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.c","password":"pw","code":"123456"}"#)?;
        assert_eq!(request.code.as_deref(), Some("123456"));
        Ok(())
    }

    #[test]
    fn account_response_carries_the_id_as_text() -> Result<()> {
        let id = Uuid::new_v4();
        let response = AccountResponse::from(Account {
            id,
            email: "a@b.c".to_string(),
            password_hash: "hash".to_string(),
            totp_secret: None,
            two_factor_enabled: false,
        });

        let json = serde_json::to_value(&response)?;
        assert_eq!(json["id"], id.to_string());
        // The hash never leaves the store type.
        assert!(json.get("password_hash").is_none());
        Ok(())
    }
}

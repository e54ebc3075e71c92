//! Session token issuance and verification.
//!
//! Tokens are HS256 JWTs carrying the account id and an expiration fixed
//! at issuance. Verification is stateless; there is no revocation list,
//! so a token stays valid until it expires.

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AuthError;

/// Claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the account id.
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
}

/// Signs and validates session tokens.
#[derive(Clone)]
pub struct SessionTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_days: i64,
}

impl std::fmt::Debug for SessionTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionTokens")
            .field("ttl_days", &self.ttl_days)
            .finish()
    }
}

impl SessionTokens {
    #[must_use]
    pub fn new(secret: &SecretString, ttl_days: i64) -> Self {
        let mut validation = Validation::default();
        validation.leeway = 5; // seconds of clock skew

        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
            ttl_days,
        }
    }

    /// Mint a signed token for the account, expiring `ttl_days` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn issue(&self, account_id: Uuid) -> Result<String, AuthError> {
        self.issue_at(account_id, Utc::now())
    }

    fn issue_at(&self, account_id: Uuid, now: DateTime<Utc>) -> Result<String, AuthError> {
        let exp = now + Duration::days(self.ttl_days);
        let claims = Claims {
            sub: account_id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(anyhow!("failed to encode session token: {e}")))
    }

    /// Validate a raw token and extract the account id.
    ///
    /// # Errors
    ///
    /// [`AuthError::ExpiredToken`] past the expiration,
    /// [`AuthError::InvalidToken`] for anything else wrong with it. Both
    /// collapse to the same message at the boundary.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                    _ => AuthError::InvalidToken,
                }
            })?;

        Ok(data.claims.sub)
    }

    /// Resolve an Authorization header value into an account id.
    ///
    /// With `required = false` a missing header is "no identity" rather
    /// than a failure, for operations serving both anonymous and
    /// authenticated callers. A header that is present but unusable is
    /// always a failure.
    ///
    /// # Errors
    ///
    /// See [`SessionTokens::verify`]; additionally
    /// [`AuthError::MissingAuthorization`] and
    /// [`AuthError::MalformedAuthorization`].
    pub fn verify_header(
        &self,
        authorization: Option<&str>,
        required: bool,
    ) -> Result<Option<Uuid>, AuthError> {
        let Some(value) = authorization else {
            if required {
                return Err(AuthError::MissingAuthorization);
            }
            return Ok(None);
        };

        let token = extract_bearer(value).ok_or(AuthError::MalformedAuthorization)?;
        Ok(Some(self.verify(token)?))
    }
}

fn extract_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn tokens() -> SessionTokens {
        SessionTokens::new(&SecretString::from("sekreto".to_string()), 7)
    }

    #[test]
    fn issue_then_verify_round_trip() -> Result<(), AuthError> {
        let tokens = tokens();
        let account_id = Uuid::new_v4();

        let token = tokens.issue(account_id)?;
        assert_eq!(tokens.verify(&token)?, account_id);
        Ok(())
    }

    #[test]
    fn expired_token_is_rejected() -> Result<(), AuthError> {
        let tokens = tokens();
        let issued = tokens.issue_at(Uuid::new_v4(), Utc::now() - Duration::days(8))?;

        assert!(matches!(
            tokens.verify(&issued),
            Err(AuthError::ExpiredToken)
        ));
        Ok(())
    }

    #[test]
    fn token_not_yet_expired_is_accepted() -> Result<(), AuthError> {
        let tokens = tokens();
        let account_id = Uuid::new_v4();
        // Issued almost seven days ago, still inside the window.
        let issued = tokens.issue_at(
            account_id,
            Utc::now() - Duration::days(7) + Duration::hours(1),
        )?;

        assert_eq!(tokens.verify(&issued)?, account_id);
        Ok(())
    }

    #[test]
    fn wrong_signature_is_rejected() -> Result<(), AuthError> {
        let token = tokens().issue(Uuid::new_v4())?;
        let other = SessionTokens::new(&SecretString::from("alia".to_string()), 7);

        assert!(matches!(other.verify(&token), Err(AuthError::InvalidToken)));
        Ok(())
    }

    #[test]
    fn header_extraction_modes() -> Result<(), AuthError> {
        let tokens = tokens();
        let account_id = Uuid::new_v4();
        let token = tokens.issue(account_id)?;

        // Missing header: failure only when identity is required.
        assert!(matches!(
            tokens.verify_header(None, true),
            Err(AuthError::MissingAuthorization)
        ));
        assert_eq!(tokens.verify_header(None, false)?, None);

        // Malformed headers fail regardless of the required flag.
        assert!(matches!(
            tokens.verify_header(Some(&token), false),
            Err(AuthError::MalformedAuthorization)
        ));
        assert!(matches!(
            tokens.verify_header(Some("Bearer "), false),
            Err(AuthError::MalformedAuthorization)
        ));

        let header = format!("Bearer {token}");
        assert_eq!(tokens.verify_header(Some(&header), true)?, Some(account_id));
        Ok(())
    }
}

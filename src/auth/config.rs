//! Auth configuration.
//!
//! The signing secret, attempt cap, and window length come from the
//! operator and have no fallback values; [`AuthConfig::new`] rejects
//! anything unusable so the server never starts with a weakened setup.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::error::AuthError;

const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
const DEFAULT_TOTP_ISSUER: &str = "ABS Blogger";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    token_secret: SecretString,
    max_attempts: u32,
    window: Duration,
    session_ttl_days: i64,
    totp_issuer: String,
}

impl AuthConfig {
    /// Build a configuration from the three mandatory inputs.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Configuration`] if the secret is empty or
    /// either rate-limit value is zero.
    pub fn new(
        token_secret: SecretString,
        max_attempts: u32,
        window_minutes: u64,
    ) -> Result<Self, AuthError> {
        if token_secret.expose_secret().is_empty() {
            return Err(AuthError::Configuration(
                "token signing secret must not be empty".to_string(),
            ));
        }
        if max_attempts == 0 {
            return Err(AuthError::Configuration(
                "login attempt limit must be greater than zero".to_string(),
            ));
        }
        if window_minutes == 0 {
            return Err(AuthError::Configuration(
                "login window must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            token_secret,
            max_attempts,
            window: Duration::from_secs(window_minutes * 60),
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            totp_issuer: DEFAULT_TOTP_ISSUER.to_string(),
        })
    }

    #[must_use]
    pub fn with_session_ttl_days(mut self, days: i64) -> Self {
        self.session_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_totp_issuer(mut self, issuer: String) -> Self {
        self.totp_issuer = issuer;
        self
    }

    #[must_use]
    pub fn token_secret(&self) -> &SecretString {
        &self.token_secret
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    #[must_use]
    pub fn session_ttl_days(&self) -> i64 {
        self.session_ttl_days
    }

    #[must_use]
    pub fn totp_issuer(&self) -> &str {
        &self.totp_issuer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    #[test]
    fn defaults_and_overrides() -> Result<(), AuthError> {
        let config = AuthConfig::new(secret("sekreto"), 5, 15)?;

        assert_eq!(config.max_attempts(), 5);
        assert_eq!(config.window(), Duration::from_secs(15 * 60));
        assert_eq!(config.session_ttl_days(), DEFAULT_SESSION_TTL_DAYS);
        assert_eq!(config.totp_issuer(), DEFAULT_TOTP_ISSUER);

        let config = config
            .with_session_ttl_days(1)
            .with_totp_issuer("Test Issuer".to_string());

        assert_eq!(config.session_ttl_days(), 1);
        assert_eq!(config.totp_issuer(), "Test Issuer");
        Ok(())
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let result = AuthConfig::new(secret(""), 5, 15);
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[test]
    fn zero_rate_limit_values_are_configuration_errors() {
        assert!(matches!(
            AuthConfig::new(secret("sekreto"), 0, 15),
            Err(AuthError::Configuration(_))
        ));
        assert!(matches!(
            AuthConfig::new(secret("sekreto"), 5, 0),
            Err(AuthError::Configuration(_))
        ));
    }
}

//! TOTP secret provisioning and verification.

use anyhow::anyhow;
use totp_rs::{Algorithm, Secret, TOTP};

use super::error::AuthError;

// Parameters shared with authenticator apps: SHA-1, six digits,
// 30-second step, one step of clock skew either way.
const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP: u64 = 30;

/// Result of starting an enrollment. The secret and URI are shown to the
/// user exactly once so they can configure an authenticator app.
#[derive(Clone, Debug)]
pub struct TwoFactorEnrollment {
    /// Base32-encoded shared secret.
    pub secret: String,
    /// `otpauth://` URI, usually rendered as a scannable code.
    pub provisioning_uri: String,
}

/// Generates secrets and checks one-time codes against them.
#[derive(Clone, Debug)]
pub struct TotpEngine {
    issuer: String,
}

impl TotpEngine {
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
        }
    }

    /// Begin enrollment: generate a fresh random secret and the
    /// provisioning URI labelled with the account email.
    ///
    /// # Errors
    ///
    /// Returns an error if secret generation or TOTP setup fails.
    pub fn enrollment(&self, email: &str) -> Result<TwoFactorEnrollment, AuthError> {
        let secret = Secret::generate_secret();
        let secret_bytes = secret
            .to_bytes()
            .map_err(|e| AuthError::Internal(anyhow!("secret generation error: {e}")))?;

        let totp = self.instance(secret_bytes, email)?;

        Ok(TwoFactorEnrollment {
            secret: totp.get_secret_base32(),
            provisioning_uri: totp.get_url(),
        })
    }

    /// Check a code against the current time step of the given secret.
    ///
    /// # Errors
    ///
    /// Returns an error only for an undecodable stored secret; a wrong
    /// code is `Ok(false)`.
    pub fn verify(&self, secret_base32: &str, code: &str) -> Result<bool, AuthError> {
        let secret_bytes = Secret::Encoded(secret_base32.to_string())
            .to_bytes()
            .map_err(|e| AuthError::Internal(anyhow!("stored secret is not valid base32: {e}")))?;

        let totp = self.instance(secret_bytes, "account")?;

        Ok(totp.check_current(code).unwrap_or(false))
    }

    /// Current code for a secret; lets tests act as the authenticator app.
    #[cfg(test)]
    pub(crate) fn current_code(&self, secret_base32: &str) -> Result<String, AuthError> {
        let secret_bytes = Secret::Encoded(secret_base32.to_string())
            .to_bytes()
            .map_err(|e| AuthError::Internal(anyhow!("stored secret is not valid base32: {e}")))?;

        let totp = self.instance(secret_bytes, "account")?;
        totp.generate_current()
            .map_err(|e| AuthError::Internal(anyhow!("system time error: {e}")))
    }

    fn instance(&self, secret: Vec<u8>, account: &str) -> Result<TOTP, AuthError> {
        TOTP::new(
            Algorithm::SHA1,
            DIGITS,
            SKEW,
            STEP,
            secret,
            Some(self.issuer.clone()),
            account.to_string(),
        )
        .map_err(|e| AuthError::Internal(anyhow!("TOTP init error: {e}")))
    }
}

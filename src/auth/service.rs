//! The authentication facade: registration, login with optional
//! two-factor, enrollment, and session verification.
//!
//! Every operation returns the internal [`AuthError`] taxonomy; callers
//! at the HTTP boundary map it through [`AuthError::external`] so the
//! distinct login-reject causes stay internal.

use regex::Regex;
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::config::AuthConfig;
use super::error::AuthError;
use super::password::PasswordHasher;
use super::rate_limit::{RateLimitDecision, RateLimiter};
use super::store::{Account, CredentialStore};
use super::token::SessionTokens;
use super::totp::{TotpEngine, TwoFactorEnrollment};

fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").map_or(false, |re| re.is_match(email))
}

/// Ties the store, limiter, hasher, TOTP engine, and token signer into
/// the operations the HTTP surface exposes.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    limiter: Arc<dyn RateLimiter>,
    passwords: PasswordHasher,
    totp: TotpEngine,
    tokens: SessionTokens,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn CredentialStore>,
        limiter: Arc<dyn RateLimiter>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            store,
            limiter,
            passwords: PasswordHasher::new(),
            totp: TotpEngine::new(config.totp_issuer()),
            tokens: SessionTokens::new(config.token_secret(), config.session_ttl_days()),
        }
    }

    /// Create an account from an email and password.
    ///
    /// The email is trimmed but otherwise kept as-is; two addresses that
    /// differ only in case are two identities.
    ///
    /// # Errors
    ///
    /// [`AuthError::Validation`] for a malformed email or empty password,
    /// [`AuthError::DuplicateAccount`] when the email is taken.
    #[instrument(skip_all)]
    pub async fn register(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let email = email.trim();
        if !valid_email(email) {
            return Err(AuthError::Validation {
                field: "email",
                reason: "must be a valid email address",
            });
        }
        if password.is_empty() {
            return Err(AuthError::Validation {
                field: "password",
                reason: "must not be empty",
            });
        }

        let hash = self.passwords.hash(password)?;
        let account = self.store.insert_account(email, &hash).await?;
        debug!("registered account {}", account.id);
        Ok(account)
    }

    /// Authenticate and mint a session token.
    ///
    /// The limiter is consulted before any credential work, keyed on the
    /// caller-supplied client id. Every failed step past that gate counts
    /// against the client, including a missing two-factor code. A
    /// successful login does not reset the counter; the window simply
    /// expires.
    ///
    /// # Errors
    ///
    /// The reject causes are distinct here but all collapse to the same
    /// external message.
    #[instrument(skip_all, fields(client_id = client_id))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        code: Option<&str>,
        client_id: &str,
    ) -> Result<String, AuthError> {
        if self.limiter.check(client_id) == RateLimitDecision::Limited {
            return Err(AuthError::RateLimited);
        }

        let Some(account) = self.store.find_by_email(email.trim()).await? else {
            self.limiter.record_failure(client_id);
            return Err(AuthError::UnknownAccount);
        };

        if !self.passwords.verify(password, &account.password_hash)? {
            self.limiter.record_failure(client_id);
            return Err(AuthError::BadPassword);
        }

        if account.two_factor_enabled {
            let Some(code) = code else {
                self.limiter.record_failure(client_id);
                return Err(AuthError::MissingTwoFactorCode);
            };
            let Some(secret) = account.totp_secret.as_deref() else {
                // Enabled without a secret cannot happen through the
                // store's conditional update.
                return Err(AuthError::Internal(anyhow::anyhow!(
                    "account {} has two-factor enabled without a secret",
                    account.id
                )));
            };
            if !self.totp.verify(secret, code)? {
                self.limiter.record_failure(client_id);
                return Err(AuthError::BadTwoFactorCode);
            }
        }

        self.tokens.issue(account.id)
    }

    /// Start (or restart) two-factor enrollment for an account.
    ///
    /// The fresh secret is persisted immediately, replacing any previous
    /// one, but `two_factor_enabled` stays untouched until
    /// [`AuthService::confirm_two_factor`] succeeds.
    ///
    /// # Errors
    ///
    /// [`AuthError::AccountMissing`] when the session's account is gone.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub async fn enroll_two_factor(
        &self,
        account_id: Uuid,
    ) -> Result<TwoFactorEnrollment, AuthError> {
        let Some(account) = self.store.find_by_id(account_id).await? else {
            return Err(AuthError::AccountMissing);
        };

        let enrollment = self.totp.enrollment(&account.email)?;
        if !self.store.set_totp_secret(account.id, &enrollment.secret).await? {
            return Err(AuthError::AccountMissing);
        }
        Ok(enrollment)
    }

    /// Prove possession of the enrolled secret and enable two-factor.
    ///
    /// Returns whether two-factor is now enabled; a wrong code is
    /// `Ok(false)`, not an error, and leaves the enrollment pending.
    ///
    /// # Errors
    ///
    /// [`AuthError::TwoFactorNotEnrolled`] when no enrollment was started,
    /// [`AuthError::AccountMissing`] when the account is gone.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub async fn confirm_two_factor(
        &self,
        account_id: Uuid,
        code: &str,
    ) -> Result<bool, AuthError> {
        let Some(account) = self.store.find_by_id(account_id).await? else {
            return Err(AuthError::AccountMissing);
        };
        let Some(secret) = account.totp_secret.as_deref() else {
            return Err(AuthError::TwoFactorNotEnrolled);
        };

        if !self.totp.verify(secret, code)? {
            return Ok(false);
        }

        // Conditional update: enabling only goes through while a secret
        // is still present.
        Ok(self.store.confirm_two_factor(account.id).await?)
    }

    /// Load the account behind a verified session.
    ///
    /// # Errors
    ///
    /// [`AuthError::AccountMissing`] when the account was deleted after
    /// the token was issued.
    pub async fn account(&self, account_id: Uuid) -> Result<Account, AuthError> {
        match self.store.find_by_id(account_id).await? {
            Some(account) => Ok(account),
            None => Err(AuthError::AccountMissing),
        }
    }

    /// Resolve an Authorization header into an account id.
    ///
    /// # Errors
    ///
    /// See [`SessionTokens::verify_header`].
    pub fn authenticate(
        &self,
        authorization: Option<&str>,
        required: bool,
    ) -> Result<Option<Uuid>, AuthError> {
        self.tokens.verify_header(authorization, required)
    }
}

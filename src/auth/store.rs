//! Credential storage: the accounts table and its in-memory counterpart.
//!
//! Email uniqueness is case-exact; no normalization happens anywhere in
//! this module. Mutations are single atomic statements so concurrent
//! requests for the same account cannot interleave read-then-write
//! updates.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use super::error::AuthError;

/// One record per account.
///
/// `two_factor_enabled` only flips after a confirmed enrollment, so it
/// being true implies `totp_secret` is present.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub totp_secret: Option<String>,
    pub two_factor_enabled: bool,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AuthError::DuplicateAccount,
            StoreError::Backend(err) => AuthError::Internal(err),
        }
    }
}

/// Persistence seam for accounts.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_account(&self, email: &str, password_hash: &str)
        -> Result<Account, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Overwrite the TOTP secret, leaving `two_factor_enabled` untouched.
    /// Returns whether the account existed.
    async fn set_totp_secret(&self, id: Uuid, secret: &str) -> Result<bool, StoreError>;

    /// Enable two-factor, but only while a secret is present — the update
    /// predicate is what upholds the enabled-implies-secret invariant
    /// under concurrent requests. Returns whether two-factor is enabled
    /// afterwards.
    async fn confirm_two_factor(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        totp_secret: row.get("totp_secret"),
        two_factor_enabled: row.get("two_factor_enabled"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

const SELECT_COLUMNS: &str = "id, email, password_hash, totp_secret, two_factor_enabled";

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        let query = "INSERT INTO accounts (email, password_hash) VALUES ($1, $2) RETURNING id";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        match row {
            Ok(row) => Ok(Account {
                id: row.get("id"),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                totp_secret: None,
                two_factor_enabled: false,
            }),
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicateEmail),
            Err(err) => Err(StoreError::Backend(
                anyhow::Error::new(err).context("failed to insert account"),
            )),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM accounts WHERE email = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up account by email")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = format!("SELECT {SELECT_COLUMNS} FROM accounts WHERE id = $1");
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query.as_str()
        );
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to look up account by id")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn set_totp_secret(&self, id: Uuid, secret: &str) -> Result<bool, StoreError> {
        let query = "UPDATE accounts SET totp_secret = $2 WHERE id = $1";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .bind(secret)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to store TOTP secret")?;

        Ok(result.rows_affected() > 0)
    }

    async fn confirm_two_factor(&self, id: Uuid) -> Result<bool, StoreError> {
        let query =
            "UPDATE accounts SET two_factor_enabled = TRUE WHERE id = $1 AND totp_secret IS NOT NULL";
        let span = tracing::info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        let result = sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to enable two-factor")?;

        Ok(result.rows_affected() > 0)
    }
}

/// In-memory store for tests and embedded setups.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, Account>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_account(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Account, StoreError> {
        let mut accounts = self.lock();
        if accounts.values().any(|account| account.email == email) {
            return Err(StoreError::DuplicateEmail);
        }

        let account = Account {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            totp_secret: None,
            two_factor_enabled: false,
        };
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .lock()
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.lock().get(&id).cloned())
    }

    async fn set_totp_secret(&self, id: Uuid, secret: &str) -> Result<bool, StoreError> {
        let mut accounts = self.lock();
        match accounts.get_mut(&id) {
            Some(account) => {
                account.totp_secret = Some(secret.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn confirm_two_factor(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut accounts = self.lock();
        match accounts.get_mut(&id) {
            Some(account) if account.totp_secret.is_some() => {
                account.two_factor_enabled = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

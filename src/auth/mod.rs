//! Authentication core: credential storage, rate limiting, password
//! hashing, TOTP two-factor, session tokens, and the facade that ties
//! them together.

pub mod config;
pub mod error;
pub mod password;
pub mod rate_limit;
pub mod service;
pub mod store;
pub mod token;
pub mod totp;

pub use config::AuthConfig;
pub use error::AuthError;
pub use rate_limit::{LoginRateLimiter, NoopRateLimiter, RateLimitDecision, RateLimiter};
pub use service::AuthService;
pub use store::{Account, CredentialStore, MemoryCredentialStore, PgCredentialStore};
pub use totp::TwoFactorEnrollment;

//! # ensaluti
//!
//! Authentication and session security for the ABS Blogger publishing
//! platform: registration, password login with optional TOTP two-factor,
//! JWT session issuance/verification, and IP-based login rate limiting.
//!
//! The content side of the platform (sites, posts, portfolio items,
//! newsletter subscribers) lives elsewhere and talks to this service
//! through the HTTP API in [`api`], or embeds [`auth::AuthService`]
//! directly.

pub mod api;
pub mod auth;
pub mod cli;

//! Shared helpers for the auth handlers.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::net::SocketAddr;
use uuid::Uuid;

use crate::auth::{AuthError, AuthService};

/// Best-effort client identifier for rate limiting.
///
/// Proxy headers win over the socket address: the first entry of
/// `X-Forwarded-For`, then `X-Real-IP`, then the peer address. The
/// fallback string groups clients whose address could not be determined
/// into one shared bucket.
pub fn client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_string();
        }
    }

    peer.map_or_else(|| "unknown".to_string(), |addr| addr.ip().to_string())
}

/// Resolve the Authorization header to an account id, or fail with the
/// opaque authentication error.
pub fn require_account(service: &AuthService, headers: &HeaderMap) -> Result<Uuid, AuthError> {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    match service.authenticate(authorization, true)? {
        Some(account_id) => Ok(account_id),
        None => Err(AuthError::MissingAuthorization),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn peer() -> Option<SocketAddr> {
        "10.0.0.9:4431".parse().ok()
    }

    #[test]
    fn forwarded_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_id(&headers, peer()), "203.0.113.7");
    }

    #[test]
    fn real_ip_beats_the_socket() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.2"));

        assert_eq!(client_id(&headers, peer()), "198.51.100.2");
    }

    #[test]
    fn socket_address_is_the_fallback() {
        assert_eq!(client_id(&HeaderMap::new(), peer()), "10.0.0.9");
    }

    #[test]
    fn unknown_when_nothing_is_available() {
        assert_eq!(client_id(&HeaderMap::new(), None), "unknown");
    }

    #[test]
    fn empty_proxy_headers_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("  "));
        headers.insert("x-real-ip", HeaderValue::from_static(""));

        assert_eq!(client_id(&headers, None), "unknown");
    }
}

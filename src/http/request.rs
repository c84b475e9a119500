//! Request identity helpers.

use axum::http::HeaderMap;
use std::net::SocketAddr;

/// Derive the rate-limit identity fingerprint for a request.
///
/// Deployments sit behind a reverse proxy, so the first address in
/// `x-forwarded-for` wins when present; otherwise the socket peer.
pub fn client_fingerprint(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| addr.ip().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "10.0.0.1:443".parse().unwrap()
    }

    #[test]
    fn forwarded_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.9, 10.0.0.2".parse().unwrap());
        assert_eq!(client_fingerprint(&headers, addr()), "203.0.113.9");
    }

    #[test]
    fn falls_back_to_peer_address() {
        assert_eq!(client_fingerprint(&HeaderMap::new(), addr()), "10.0.0.1");

        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "".parse().unwrap());
        assert_eq!(client_fingerprint(&headers, addr()), "10.0.0.1");
    }
}

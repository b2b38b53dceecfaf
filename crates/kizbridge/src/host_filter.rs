// Peer allow-list middleware.
//
// Matches the connecting peer's address against a fixed allow-list. When
// the bridge sits behind a trusted reverse proxy, the first hop in
// `X-Forwarded-For` is considered too. Anything else gets a 403.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::info;

/// Allow-list of peer addresses permitted to reach the API.
#[derive(Clone)]
pub struct HostFilter {
    allowed: Arc<HashSet<String>>,
    behind_proxy: bool,
}

impl HostFilter {
    pub fn new(hosts: &[String], behind_proxy: bool) -> Self {
        Self {
            allowed: Arc::new(
                hosts
                    .iter()
                    .map(|h| h.trim().to_ascii_lowercase())
                    .collect(),
            ),
            behind_proxy,
        }
    }

    fn permits(&self, addr: &str) -> bool {
        self.allowed.contains(&addr.trim().to_ascii_lowercase())
    }
}

/// Reject requests from peers not on the allow-list.
pub async fn enforce(
    State(filter): State<HostFilter>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let mut peers = vec![addr.ip().to_string()];
    if filter.behind_proxy {
        if let Some(forwarded) = request
            .headers()
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
        {
            peers.push(forwarded.trim().to_owned());
        }
    }

    if peers.iter().any(|peer| filter.permits(peer)) {
        next.run(request).await
    } else {
        info!(?peers, "access forbidden");
        StatusCode::FORBIDDEN.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permits_is_case_and_whitespace_insensitive() {
        let filter = HostFilter::new(&[" 192.168.1.10 ".into(), "FE80::1".into()], false);
        assert!(filter.permits("192.168.1.10"));
        assert!(filter.permits("fe80::1"));
        assert!(!filter.permits("192.168.1.11"));
    }

    #[test]
    fn empty_list_permits_nobody() {
        let filter = HostFilter::new(&[], false);
        assert!(!filter.permits("127.0.0.1"));
    }
}

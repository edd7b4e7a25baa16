use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use reqwest_middleware::ClientWithMiddleware;
use thiserror::Error;
use tracing::{debug, warn};

use crate::transport::{
    ProxyPolicy, TransportConfig, no_verify_transport, pooled_transport_with_min,
    transient_transport,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP client build error: {0}")]
    Build(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

impl TransportConfig {
    /// Builds a client that owns a fresh connection pool configured by `self`.
    ///
    /// Clones of the returned handle share that pool. The environment proxy
    /// settings are read here, not per request.
    ///
    /// # Errors
    ///
    /// Returns an error if reqwest cannot initialise its TLS backend.
    pub fn build_client(&self) -> Result<ClientWithMiddleware> {
        let idle_per_host = if self.keep_alives {
            self.max_idle_conns_per_host.pool_limit()
        } else {
            0
        };

        debug!(
            keep_alives = self.keep_alives,
            idle_per_host = self.max_idle_conns_per_host.as_raw(),
            verify_tls = self.verify_tls,
            proxy = ?self.proxy,
            "building HTTP client"
        );

        // reqwest's connect timeout covers both the TCP dial and the TLS handshake.
        let mut builder = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout + self.tls_handshake_timeout)
            .tcp_keepalive(self.tcp_keepalive)
            .pool_idle_timeout(self.idle_conn_timeout)
            .pool_max_idle_per_host(idle_per_host);

        if !self.keep_alives {
            let mut headers = HeaderMap::new();
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            builder = builder.default_headers(headers);
        }

        if !self.verify_tls {
            warn!("TLS certificate verification is disabled for this client");
            builder = builder.danger_accept_invalid_certs(true);
        }

        if self.proxy == ProxyPolicy::Disabled {
            builder = builder.no_proxy();
        }

        Ok(ClientWithMiddleware::from(builder.build()?))
    }
}

/// Client over a [`transient_transport`]: nothing is pooled and keep-alives are
/// off, so it can be dropped after use without leaking sockets.
///
/// # Errors
///
/// Returns an error if reqwest cannot initialise its TLS backend.
pub fn transient_client() -> Result<ClientWithMiddleware> {
    transient_transport().build_client()
}

/// Client over a [`pooled_transport`](crate::transport::pooled_transport).
///
/// Keep the handle (or clones of it) and reuse it for the same host(s); a new
/// pooled client per request leaves idle sockets behind.
///
/// # Errors
///
/// Returns an error if reqwest cannot initialise its TLS backend.
pub fn pooled_client() -> Result<ClientWithMiddleware> {
    pooled_client_with_min(0)
}

/// Client over a [`pooled_transport_with_min`].
///
/// # Errors
///
/// Returns an error if reqwest cannot initialise its TLS backend.
pub fn pooled_client_with_min(min_idle_per_host: i64) -> Result<ClientWithMiddleware> {
    pooled_transport_with_min(min_idle_per_host).build_client()
}

/// Client over a [`no_verify_transport`]. Internal, trusted endpoints only.
///
/// # Errors
///
/// Returns an error if reqwest cannot initialise its TLS backend.
pub fn no_verify_client() -> Result<ClientWithMiddleware> {
    no_verify_transport().build_client()
}

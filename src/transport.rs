use std::{num::NonZeroUsize, thread, time::Duration};

use bon::Builder;

use crate::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_IDLE_CONN_TIMEOUT, DEFAULT_MAX_IDLE_CONNS,
    DEFAULT_TCP_KEEPALIVE, DEFAULT_TLS_HANDSHAKE_TIMEOUT,
};

/// How many idle connections a transport keeps per host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdlePerHost {
    /// No idle connection is retained once a request completes.
    Disabled,
    /// At most this many idle connections are retained per host.
    Limit(usize),
}

impl IdlePerHost {
    /// Conceptual integer form: `-1` for [`IdlePerHost::Disabled`], the limit otherwise.
    #[must_use]
    pub fn as_raw(self) -> i64 {
        match self {
            Self::Disabled => -1,
            Self::Limit(n) => i64::try_from(n).unwrap_or(i64::MAX),
        }
    }

    /// Value handed to the connection pool, which has no separate "disabled" state.
    #[must_use]
    pub fn pool_limit(self) -> usize {
        match self {
            Self::Disabled => 0,
            Self::Limit(n) => n,
        }
    }
}

/// Where outgoing requests look for a proxy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProxyPolicy {
    /// `HTTP_PROXY`, `HTTPS_PROXY`, `ALL_PROXY` and `NO_PROXY`, read once when the
    /// client is built.
    #[default]
    Environment,
    /// Always connect directly.
    Disabled,
}

/// Connection policy for a single HTTP client.
///
/// Every field defaults to the pooled policy; see [`pooled_transport`].
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct TransportConfig {
    #[builder(default = DEFAULT_CONNECT_TIMEOUT)]
    pub connect_timeout: Duration,
    /// TCP keepalive probe interval.
    #[builder(default = DEFAULT_TCP_KEEPALIVE)]
    pub tcp_keepalive: Duration,
    #[builder(default = DEFAULT_TLS_HANDSHAKE_TIMEOUT)]
    pub tls_handshake_timeout: Duration,
    /// Global idle connection bound. Informational for reqwest, whose pool is
    /// bounded per host only.
    #[builder(default = DEFAULT_MAX_IDLE_CONNS)]
    pub max_idle_conns: usize,
    #[builder(default = IdlePerHost::Limit(idle_per_host(available_parallelism(), 0)))]
    pub max_idle_conns_per_host: IdlePerHost,
    #[builder(default = DEFAULT_IDLE_CONN_TIMEOUT)]
    pub idle_conn_timeout: Duration,
    /// HTTP keep-alive. When off, every connection is closed after one request.
    #[builder(default = true)]
    pub keep_alives: bool,
    #[builder(default = true)]
    pub verify_tls: bool,
    #[builder(default)]
    pub proxy: ProxyPolicy,
}

fn available_parallelism() -> usize {
    thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Idle connections per host for a pooled transport: one more than the worker
/// count, but never below `min_idle_per_host`. Negative minimums count as zero.
fn idle_per_host(parallelism: usize, min_idle_per_host: i64) -> usize {
    let floor = usize::try_from(min_idle_per_host).unwrap_or(0);
    parallelism.saturating_add(1).max(floor)
}

/// Transport that retains no idle connections and disables keep-alives.
///
/// Safe to build for one-off requests and throw away; nothing outlives the
/// request that used it.
#[must_use]
pub fn transient_transport() -> TransportConfig {
    TransportConfig {
        keep_alives: false,
        max_idle_conns_per_host: IdlePerHost::Disabled,
        ..pooled_transport_with_min(0)
    }
}

/// Pooled transport with the default per-host idle limit.
///
/// Do not use this for transient clients: idle sockets are kept open, so it is
/// only appropriate for a client that is reused for the same host(s).
#[must_use]
pub fn pooled_transport() -> TransportConfig {
    pooled_transport_with_min(0)
}

/// Pooled transport keeping at least `min_idle_per_host` idle connections per
/// host.
///
/// The per-host limit is `max(available_parallelism + 1, min_idle_per_host)`.
/// Negative minimums are treated as zero. The same reuse caveat as
/// [`pooled_transport`] applies.
#[must_use]
pub fn pooled_transport_with_min(min_idle_per_host: i64) -> TransportConfig {
    TransportConfig {
        connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        tcp_keepalive: DEFAULT_TCP_KEEPALIVE,
        tls_handshake_timeout: DEFAULT_TLS_HANDSHAKE_TIMEOUT,
        max_idle_conns: DEFAULT_MAX_IDLE_CONNS,
        max_idle_conns_per_host: IdlePerHost::Limit(idle_per_host(
            available_parallelism(),
            min_idle_per_host,
        )),
        idle_conn_timeout: DEFAULT_IDLE_CONN_TIMEOUT,
        keep_alives: true,
        verify_tls: true,
        proxy: ProxyPolicy::Environment,
    }
}

/// Transient transport that skips TLS certificate verification.
///
/// Only for internal endpoints whose certificates cannot be verified. Nothing
/// stops this from being pointed at a public host, so callers must not.
#[must_use]
pub fn no_verify_transport() -> TransportConfig {
    TransportConfig {
        verify_tls: false,
        ..transient_transport()
    }
}

pub mod client;
pub mod transport;
pub mod user_agent;

use std::time::Duration;

pub use client::{
    ClientError, no_verify_client, pooled_client, pooled_client_with_min, transient_client,
};
pub use transport::{
    IdlePerHost, ProxyPolicy, TransportConfig, no_verify_transport, pooled_transport,
    pooled_transport_with_min, transient_transport,
};
pub use user_agent::{UserAgent, attach_user_agent};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const DEFAULT_TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_IDLE_CONN_TIMEOUT: Duration = Duration::from_secs(90);
const DEFAULT_MAX_IDLE_CONNS: usize = 100;

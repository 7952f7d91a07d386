use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Listener and upstream timing configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address bound for both UDP and TCP.
    pub listen_addr: SocketAddr,

    /// How long to wait for an upstream server's response.
    pub read_timeout: Duration,

    /// Whether truncated upstream responses count as usable replies.
    pub allow_truncated: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, 53)),
            read_timeout: Duration::from_millis(300),
            allow_truncated: false,
        }
    }
}

pub mod udp;

use async_trait::async_trait;
use rally_dns_domain::DomainError;
use std::time::Duration;

pub use udp::UdpTransport;

/// Largest upstream message we are prepared to receive.
pub const MAX_RESPONSE_SIZE: usize = 4096;

/// One request/response round trip against a single upstream server.
#[async_trait]
pub trait DnsTransport: Send + Sync {
    async fn send(
        &self,
        message_bytes: &[u8],
        read_timeout: Duration,
    ) -> Result<Vec<u8>, DomainError>;
}

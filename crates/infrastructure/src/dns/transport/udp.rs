//! UDP transport for upstream DNS exchanges (RFC 1035 §4.2.1).
//!
//! Messages are sent as-is, no framing. Responses are read into a 4096-byte
//! buffer; a server that has more to say sets the TC bit and the caller's
//! truncation policy decides what happens next.

use super::{DnsTransport, MAX_RESPONSE_SIZE};
use async_trait::async_trait;
use rally_dns_domain::DomainError;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Budget for the local bind plus the outbound send. UDP has no dial step,
/// so this stands in for the dial and write timeouts of a connected
/// transport.
const SEND_TIMEOUT: Duration = Duration::from_millis(100);

/// DNS over UDP against one upstream server.
pub struct UdpTransport {
    server_addr: SocketAddr,
}

impl UdpTransport {
    pub fn new(server_addr: SocketAddr) -> Self {
        Self { server_addr }
    }
}

#[async_trait]
impl DnsTransport for UdpTransport {
    async fn send(
        &self,
        message_bytes: &[u8],
        read_timeout: Duration,
    ) -> Result<Vec<u8>, DomainError> {
        // Ephemeral port, one socket per exchange: responses cannot be
        // confused between concurrent exchanges to the same server.
        let bind_addr = if self.server_addr.is_ipv4() {
            SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
        } else {
            SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
        };

        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            DomainError::TransportIo {
                server: self.server_addr.to_string(),
                message: format!("bind: {e}"),
            }
        })?;

        tokio::time::timeout(SEND_TIMEOUT, socket.send_to(message_bytes, self.server_addr))
            .await
            .map_err(|_| DomainError::TransportSendTimeout {
                server: self.server_addr.to_string(),
            })?
            .map_err(|e| DomainError::TransportIo {
                server: self.server_addr.to_string(),
                message: format!("send: {e}"),
            })?;

        debug!(
            server = %self.server_addr,
            bytes_sent = message_bytes.len(),
            "UDP query sent"
        );

        let mut recv_buf = vec![0u8; MAX_RESPONSE_SIZE];
        let (bytes_received, from_addr) =
            tokio::time::timeout(read_timeout, socket.recv_from(&mut recv_buf))
                .await
                .map_err(|_| DomainError::TransportReadTimeout {
                    server: self.server_addr.to_string(),
                })?
                .map_err(|e| DomainError::TransportIo {
                    server: self.server_addr.to_string(),
                    message: format!("recv: {e}"),
                })?;

        if from_addr.ip() != self.server_addr.ip() {
            warn!(
                expected = %self.server_addr,
                received_from = %from_addr,
                "UDP response from unexpected source"
            );
        }

        recv_buf.truncate(bytes_received);

        debug!(
            server = %self.server_addr,
            bytes_received,
            "UDP response received"
        );

        Ok(recv_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_udp_transport_creation() {
        let addr: SocketAddr = "8.8.8.8:53".parse().unwrap();
        let transport = UdpTransport::new(addr);
        assert_eq!(transport.server_addr, addr);
    }

    #[test]
    fn test_udp_transport_ipv6() {
        let addr: SocketAddr = "[2001:4860:4860::8888]:53".parse().unwrap();
        let transport = UdpTransport::new(addr);
        assert_eq!(transport.server_addr, addr);
    }
}

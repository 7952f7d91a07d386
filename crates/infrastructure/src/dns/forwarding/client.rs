//! One DNS exchange against one upstream server.

use crate::dns::transport::{DnsTransport, UdpTransport};
use hickory_proto::op::Message;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use rally_dns_domain::DomainError;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, warn};

/// Payload size advertised to upstreams on queries that carry EDNS. This is
/// our receive capacity, independent of whatever the downstream client
/// advertised for itself.
const ADVERTISED_PAYLOAD_SIZE: u16 = 4096;

/// Executes single upstream exchanges.
///
/// Every transport fault collapses to `None`; the only reply inspection done
/// here is the truncation policy. Whether a reply is worth keeping — whether
/// it has answers — is the racer's decision, not ours.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    read_timeout: Duration,
    allow_truncated: bool,
}

impl UpstreamClient {
    /// Both settings are fixed for the life of the process; there is no way
    /// to change them after construction.
    pub fn new(read_timeout: Duration, allow_truncated: bool) -> Self {
        Self {
            read_timeout,
            allow_truncated,
        }
    }

    /// Sends the query to `addr` and returns the reply, or `None` when the
    /// exchange failed or produced something we will not relay.
    pub async fn exchange(&self, query: &Message, addr: SocketAddr) -> Option<Message> {
        let bytes = match serialize_query(query) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(%error, "could not serialise upstream query");
                return None;
            }
        };

        debug!(server = %addr, "calling exchange");

        let transport = UdpTransport::new(addr);
        let raw = match transport.send(&bytes, self.read_timeout).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(server = %addr, %error, "upstream exchange failed");
                return None;
            }
        };

        let reply = match Message::from_vec(&raw) {
            Ok(reply) => reply,
            Err(error) => {
                warn!(server = %addr, %error, "could not parse upstream response");
                return None;
            }
        };

        if reply.id() != query.id() {
            let error = DomainError::ResponseIdMismatch {
                got: reply.id(),
                want: query.id(),
            };
            warn!(server = %addr, %error, "dropping upstream response");
            return None;
        }

        if reply.truncated() && !self.allow_truncated {
            warn!(server = %addr, "dropping truncated upstream response");
            return None;
        }

        debug!(
            server = %addr,
            rcode = %reply.response_code(),
            answers = reply.answers().len(),
            "exchange response"
        );

        Some(reply)
    }
}

/// Serializes the outbound copy of a query. When the query already carries
/// an OPT record, the copy advertises our own receive capacity instead of
/// the downstream client's.
fn serialize_query(query: &Message) -> Result<Vec<u8>, DomainError> {
    match query.extensions() {
        Some(edns) => {
            let mut outbound = query.clone();
            let mut edns = edns.clone();
            edns.set_max_payload(ADVERTISED_PAYLOAD_SIZE);
            outbound.set_edns(edns);
            serialize(&outbound)
        }
        None => serialize(query),
    }
}

fn serialize(message: &Message) -> Result<Vec<u8>, DomainError> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    message
        .emit(&mut encoder)
        .map_err(|e| DomainError::InvalidDnsMessage(e.to_string()))?;
    Ok(buf)
}

use std::net::SocketAddr;

use crate::errors::DomainError;

/// An ordered list of upstream servers whose exchanges are raced together.
///
/// Position in the list is precedence: when several servers respond, the
/// earliest one with answers wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamGroup {
    pub servers: Vec<SocketAddr>,
}

impl UpstreamGroup {
    pub fn new(servers: Vec<SocketAddr>) -> Self {
        Self { servers }
    }
}

/// Builds the effective group list from raw `--fwd-to` specs.
///
/// Each spec is a comma-separated list of `ip:port` addresses and normally
/// forms its own group, in argument order. With `merge` set, every address
/// across every spec collapses into a single group, still in order.
pub fn parse_groups(specs: &[String], merge: bool) -> Result<Vec<UpstreamGroup>, DomainError> {
    if merge {
        let mut servers = Vec::new();
        for spec in specs {
            servers.extend(parse_spec(spec)?);
        }
        Ok(vec![UpstreamGroup::new(servers)])
    } else {
        specs
            .iter()
            .map(|spec| parse_spec(spec).map(UpstreamGroup::new))
            .collect()
    }
}

fn parse_spec(spec: &str) -> Result<Vec<SocketAddr>, DomainError> {
    spec.split(',').map(parse_server).collect()
}

fn parse_server(addr: &str) -> Result<SocketAddr, DomainError> {
    let addr = addr.trim();
    addr.parse()
        .map_err(|_| DomainError::InvalidUpstreamAddress(addr.to_string()))
}

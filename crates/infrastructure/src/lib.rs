//! DNS engine for rally-dns.
//!
//! Everything that touches the wire lives here: the upstream transport and
//! exchange client, the group racer and cascade, the coalescing query
//! coordinator, the request handler and the UDP/TCP serving loops.

pub mod dns;

//! Coalescing keys for in-flight query sharing.
//!
//! Two queries get the same key exactly when they may share one upstream
//! flight: same questions in the same order and the same effective UDP
//! payload size. The transaction id and header flags are deliberately
//! excluded — they differ between clients asking the same thing.

use std::fmt::Write;

use hickory_proto::op::Message;
use hickory_proto::rr::{DNSClass, RecordType};

/// RFC 1035 default payload size, assumed when a query carries no OPT record.
const MIN_PAYLOAD_SIZE: u16 = 512;

/// Token used for a type or class that has no mnemonic.
const UNKNOWN_TOKEN: &str = "nop";

/// Computes the coalescing key for a query.
pub fn fingerprint(query: &Message) -> String {
    let mut key = String::new();
    for question in query.queries() {
        let _ = write!(key, "{}", question.name());
        push_type(&mut key, question.query_type());
        push_class(&mut key, question.query_class());
    }
    let _ = write!(key, "{}", effective_payload_size(query));
    key
}

/// The UDP payload size a client is prepared to receive: the OPT record's
/// requestor size when EDNS is present, 512 otherwise.
pub fn effective_payload_size(query: &Message) -> u16 {
    query
        .extensions()
        .as_ref()
        .map_or(MIN_PAYLOAD_SIZE, |edns| edns.max_payload())
}

fn push_type(key: &mut String, rtype: RecordType) {
    match rtype {
        RecordType::Unknown(_) => key.push_str(UNKNOWN_TOKEN),
        RecordType::ZERO => key.push_str("None"),
        other => {
            let _ = write!(key, "{other}");
        }
    }
}

fn push_class(key: &mut String, class: DNSClass) {
    let mnemonic = match class {
        DNSClass::IN => "IN",
        DNSClass::CH => "CH",
        DNSClass::HS => "HS",
        DNSClass::NONE => "NONE",
        DNSClass::ANY => "ANY",
        _ => UNKNOWN_TOKEN,
    };
    key.push_str(mnemonic);
}

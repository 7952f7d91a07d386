//! Inbound request processing.
//!
//! The handler validates a decoded query, hands it to the coordinator, and
//! turns the flight's outcome into the wire reply: the shared upstream
//! message with this client's transaction id, or a FORMERR/SERVFAIL built
//! locally.

use crate::dns::coordinator::QueryCoordinator;
use crate::dns::fingerprint::effective_payload_size;
use hickory_proto::op::{Message, MessageType, OpCode, ResponseCode};
use hickory_proto::rr::RecordType;
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Transport the request arrived on. UDP replies must fit the client's
/// advertised payload budget; TCP replies are framed and unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Udp,
    Tcp,
}

/// Per-request processing, shared by the UDP and TCP serving loops.
#[derive(Clone)]
pub struct RequestHandler {
    coordinator: QueryCoordinator,
}

impl RequestHandler {
    pub fn new(coordinator: QueryCoordinator) -> Self {
        Self { coordinator }
    }

    /// Processes one raw inbound message and returns the serialized reply,
    /// if there is anything to say.
    pub async fn handle(&self, bytes: &[u8], protocol: Protocol) -> Option<Vec<u8>> {
        let query = match Message::from_vec(bytes) {
            Ok(query) => query,
            Err(error) => {
                warn!(%error, "undecodable request");
                return format_error_for_raw(bytes);
            }
        };

        let limit = match protocol {
            Protocol::Udp => Some(effective_payload_size(&query) as usize),
            Protocol::Tcp => None,
        };

        let response = self.handle_message(query).await?;
        serialize_bounded(&response, limit)
    }

    /// Message-level entry point. Returns the reply to write, with the
    /// request's transaction id already restored.
    pub async fn handle_message(&self, query: Message) -> Option<Message> {
        if let Err(reason) = validate(&query) {
            warn!(reason, "invalid request");
            return Some(error_response(&query, ResponseCode::FormErr));
        }

        let question = &query.queries()[0];
        info!(
            question = %question.name(),
            question_type = %question.query_type(),
            "handling request"
        );

        let request_id = query.id();
        let start = Instant::now();

        let query = Arc::new(query);
        let reply = self.coordinator.resolve(Arc::clone(&query)).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let Some(reply) = reply else {
            warn!(elapsed_ms, "no upstream reply, answering SERVFAIL");
            return Some(error_response(&query, ResponseCode::ServFail));
        };

        // The reply is shared with every other waiter of the same flight:
        // the id rewrite must happen on a private copy.
        let mut response = (*reply).clone();
        response.set_id(request_id);

        info!(
            elapsed_ms,
            rcode = %response.response_code(),
            answers = response.answers().len(),
            "responding to request"
        );

        Some(response)
    }
}

fn validate(query: &Message) -> Result<(), &'static str> {
    let questions = query.queries();

    if questions.is_empty() {
        return Err("empty question set");
    }

    let first = &questions[0];
    if matches!(
        first.query_type(),
        RecordType::ZERO | RecordType::Unknown(_)
    ) {
        return Err("unknown question type");
    }

    // A lone question needs a real name: at least two characters once the
    // root dot is gone.
    if questions.len() == 1 && first.name().to_string().trim_end_matches('.').len() < 2 {
        return Err("question name too short");
    }

    Ok(())
}

/// Builds an error reply for a decoded query: the request's id and question
/// section, the given response code, nothing else.
fn error_response(query: &Message, rcode: ResponseCode) -> Message {
    let mut response = Message::new();
    response.set_id(query.id());
    response.set_message_type(MessageType::Response);
    response.set_op_code(query.op_code());
    response.set_response_code(rcode);
    response.set_recursion_desired(query.recursion_desired());
    response.add_queries(query.queries().iter().cloned());
    response
}

/// FORMERR for a message we could not decode at all, as long as the id
/// field itself is readable. With fewer than two bytes there is no one to
/// address a reply to.
fn format_error_for_raw(bytes: &[u8]) -> Option<Vec<u8>> {
    if bytes.len() < 2 {
        return None;
    }
    let id = u16::from_be_bytes([bytes[0], bytes[1]]);
    let mut response = Message::new();
    response.set_id(id);
    response.set_message_type(MessageType::Response);
    response.set_op_code(OpCode::Query);
    response.set_response_code(ResponseCode::FormErr);
    serialize(&response)
}

/// Serializes a response, shrinking it to a TC-flagged header-and-question
/// reply when it exceeds the client's datagram budget.
fn serialize_bounded(response: &Message, limit: Option<usize>) -> Option<Vec<u8>> {
    let bytes = serialize(response)?;

    let Some(limit) = limit else {
        return Some(bytes);
    };
    if bytes.len() <= limit {
        return Some(bytes);
    }

    debug!(
        len = bytes.len(),
        limit, "response exceeds datagram budget, truncating"
    );

    let mut truncated = Message::new();
    truncated.set_id(response.id());
    truncated.set_message_type(MessageType::Response);
    truncated.set_op_code(response.op_code());
    truncated.set_response_code(response.response_code());
    truncated.set_recursion_desired(response.recursion_desired());
    truncated.set_recursion_available(response.recursion_available());
    truncated.set_truncated(true);
    truncated.add_queries(response.queries().iter().cloned());
    serialize(&truncated)
}

fn serialize(message: &Message) -> Option<Vec<u8>> {
    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    match message.emit(&mut encoder) {
        Ok(()) => Some(buf),
        Err(error) => {
            warn!(%error, "could not serialise response");
            None
        }
    }
}

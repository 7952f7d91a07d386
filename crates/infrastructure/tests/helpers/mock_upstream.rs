#![allow(dead_code)]

use hickory_proto::op::{Edns, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{DNSClass, Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::oneshot;

/// How the mock upstream answers queries.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// NOERROR with one A record for the question name.
    Answer(Ipv4Addr),
    /// NOERROR with the given number of A records, for oversize responses.
    AnswerMany(u16),
    /// NOERROR with an empty answer section.
    Empty,
    /// NXDOMAIN.
    NxDomain,
    /// Empty reply with the TC bit set.
    Truncated,
    /// Answer after the given delay.
    Delayed(Ipv4Addr, Duration),
    /// Never reply.
    Silent,
}

/// A scriptable upstream DNS server on a local UDP port.
pub struct MockUpstream {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockUpstream {
    pub async fn start(behavior: MockBehavior) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let queries = Arc::new(AtomicUsize::new(0));
        let counter = queries.clone();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut buf = vec![0u8; 4096];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { break };
                        counter.fetch_add(1, Ordering::SeqCst);
                        if let Some(response) = build_response(&buf[..len], &behavior).await {
                            let _ = socket.send_to(&response, peer).await;
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Number of queries received so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn build_response(query_bytes: &[u8], behavior: &MockBehavior) -> Option<Vec<u8>> {
    let query = Message::from_vec(query_bytes).ok()?;

    let mut response = Message::new();
    response.set_id(query.id());
    response.set_message_type(MessageType::Response);
    response.set_op_code(query.op_code());
    response.set_recursion_desired(query.recursion_desired());
    response.set_recursion_available(true);
    response.add_queries(query.queries().iter().cloned());

    // Echo EDNS so payload-size behaviour is observable by clients.
    if let Some(edns) = query.extensions().clone() {
        response.set_edns(edns);
    }

    match behavior {
        MockBehavior::Silent => return None,
        MockBehavior::Empty => {}
        MockBehavior::NxDomain => {
            response.set_response_code(ResponseCode::NXDomain);
        }
        MockBehavior::Truncated => {
            response.set_truncated(true);
        }
        MockBehavior::Answer(ip) => {
            push_answer(&mut response, &query, *ip);
        }
        MockBehavior::AnswerMany(count) => {
            for i in 0..*count {
                let octet = (i % 250) as u8;
                push_answer(&mut response, &query, Ipv4Addr::new(10, 0, 0, octet));
            }
        }
        MockBehavior::Delayed(ip, delay) => {
            tokio::time::sleep(*delay).await;
            push_answer(&mut response, &query, *ip);
        }
    }

    let mut buf = Vec::with_capacity(512);
    let mut encoder = BinEncoder::new(&mut buf);
    response.emit(&mut encoder).ok()?;
    Some(buf)
}

fn push_answer(response: &mut Message, query: &Message, ip: Ipv4Addr) {
    if let Some(question) = query.queries().first() {
        response.add_answer(Record::from_rdata(question.name().clone(), 60, RData::A(A(ip))));
    }
}

/// Builds a plain query message the way a stub resolver would.
pub fn build_query(id: u16, name: &str, rtype: RecordType) -> Message {
    let mut question = Query::new();
    question.set_name(Name::from_str(name).unwrap());
    question.set_query_type(rtype);
    question.set_query_class(DNSClass::IN);

    let mut message = Message::new();
    message.set_id(id);
    message.set_message_type(MessageType::Query);
    message.set_op_code(OpCode::Query);
    message.set_recursion_desired(true);
    message.add_query(question);
    message
}

/// Same, with an OPT record advertising the given payload size.
pub fn build_query_with_edns(id: u16, name: &str, rtype: RecordType, payload: u16) -> Message {
    let mut message = build_query(id, name, rtype);
    let mut edns = Edns::new();
    edns.set_max_payload(payload);
    edns.set_version(0);
    message.set_edns(edns);
    message
}

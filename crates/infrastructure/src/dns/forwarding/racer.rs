//! Races one query across every server of a group.

use super::client::UpstreamClient;
use hickory_proto::op::Message;
use std::net::SocketAddr;
use tokio::sync::oneshot;
use tracing::debug;

/// Issues concurrent exchanges to all servers of a group and picks the
/// winner by list position, not by completion time.
///
/// Each exchange runs in its own task and delivers into its own one-slot
/// channel, so a finished exchange never blocks on anyone. Results are then
/// consumed strictly in address order: if server 0 eventually produces an
/// answer, it wins even when server 2 answered first.
#[derive(Debug, Clone)]
pub struct GroupRacer {
    client: UpstreamClient,
}

impl GroupRacer {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Returns the first reply with answers, in address order. When no
    /// server produced one, returns the last reply seen instead — an
    /// NXDOMAIN or empty NOERROR is still something the client needs to
    /// hear, and `None` only when every exchange failed outright.
    pub async fn race(&self, query: &Message, servers: &[SocketAddr]) -> Option<Message> {
        let mut sinks = Vec::with_capacity(servers.len());
        let mut tasks = Vec::with_capacity(servers.len());

        for &addr in servers {
            let (tx, rx) = oneshot::channel();
            let client = self.client.clone();
            let query = query.clone();
            tasks.push(tokio::spawn(async move {
                let _ = tx.send(client.exchange(&query, addr).await);
            }));
            sinks.push(rx);
        }

        let mut last = None;
        for (position, sink) in sinks.into_iter().enumerate() {
            last = sink.await.unwrap_or(None);
            if is_acceptable(last.as_ref()) {
                debug!(server = %servers[position], position, "group winner");
                break;
            }
        }

        // Release exchanges still running for servers we no longer care
        // about; each is bounded by the read timeout anyway.
        for task in &tasks {
            task.abort();
        }

        last
    }
}

/// A reply worth relaying without trying further servers: present and
/// carrying at least one answer record.
pub(crate) fn is_acceptable(reply: Option<&Message>) -> bool {
    reply.is_some_and(|m| !m.answers().is_empty())
}

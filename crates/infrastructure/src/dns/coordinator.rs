//! Serialized ownership of the in-flight query table.
//!
//! Handlers submit queries here. Identical queries that overlap in time —
//! the classic case being several programs on one host resolving the same
//! name at once — share one upstream flight, and every waiter receives the
//! same reply. The table lives inside a single task that
//! alternates between submissions and flight completions, so no one ever
//! observes a half-applied update and no locks are involved.

use crate::dns::fingerprint::fingerprint;
use crate::dns::forwarding::GroupCascade;
use hickory_proto::op::Message;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// What a waiter receives: the flight's reply, shared between all waiters,
/// or `None` when no upstream produced one. Receivers must not mutate the
/// shared message; the handler clones it before rewriting the id.
pub type SharedReply = Option<Arc<Message>>;

type ReplySink = oneshot::Sender<SharedReply>;

struct Submission {
    query: Arc<Message>,
    sink: ReplySink,
}

struct Completion {
    /// The query the flight was started with; its fingerprint addresses the
    /// table entry to resolve.
    query: Arc<Message>,
    reply: SharedReply,
}

/// Cloneable handle to the coordinator task.
///
/// [`QueryCoordinator::spawn`] starts the task; it runs until every handle
/// has been dropped and the remaining flights have drained. Tests construct
/// their own coordinators, the binary spawns exactly one at startup.
#[derive(Clone)]
pub struct QueryCoordinator {
    submit_tx: mpsc::Sender<Submission>,
}

impl QueryCoordinator {
    pub fn spawn(cascade: GroupCascade) -> Self {
        let (submit_tx, submit_rx) = mpsc::channel(64);
        tokio::spawn(run(cascade, submit_rx));
        Self { submit_tx }
    }

    /// Submits a query and waits for the outcome of its flight.
    ///
    /// Exactly one value arrives per submission. `None` means no upstream
    /// produced a reply (or the coordinator is shutting down).
    pub async fn resolve(&self, query: Arc<Message>) -> SharedReply {
        let (sink, reply_rx) = oneshot::channel();
        if self
            .submit_tx
            .send(Submission { query, sink })
            .await
            .is_err()
        {
            warn!("coordinator is gone, dropping query");
            return None;
        }
        reply_rx.await.unwrap_or(None)
    }
}

async fn run(cascade: GroupCascade, mut submit_rx: mpsc::Receiver<Submission>) {
    let (done_tx, mut done_rx) = mpsc::channel::<Completion>(64);
    let mut in_flight: HashMap<String, Vec<ReplySink>> = HashMap::new();

    loop {
        tokio::select! {
            submission = submit_rx.recv() => match submission {
                Some(submission) => {
                    submit(&mut in_flight, submission, &cascade, &done_tx);
                }
                // Every handle dropped: no further submissions can arrive.
                None => break,
            },
            Some(completion) = done_rx.recv() => {
                complete(&mut in_flight, completion);
            }
        }
    }

    // Flights still running hold sinks in the table; let them finish so
    // their waiters get an answer rather than a dropped channel.
    drop(done_tx);
    while let Some(completion) = done_rx.recv().await {
        complete(&mut in_flight, completion);
    }
}

/// Attaches the sink to the query's flight, starting one iff none is
/// running. The flight spawn and the table insert happen together, under
/// the same serialized step.
fn submit(
    in_flight: &mut HashMap<String, Vec<ReplySink>>,
    submission: Submission,
    cascade: &GroupCascade,
    done_tx: &mpsc::Sender<Completion>,
) {
    let Submission { query, sink } = submission;
    let key = fingerprint(&query);

    match in_flight.entry(key) {
        Entry::Occupied(mut entry) => {
            entry.get_mut().push(sink);
            debug!(waiters = entry.get().len(), "joined in-flight query");
        }
        Entry::Vacant(entry) => {
            entry.insert(vec![sink]);
            let cascade = cascade.clone();
            let done_tx = done_tx.clone();
            tokio::spawn(async move {
                let reply = cascade.resolve(&query).await.map(Arc::new);
                let _ = done_tx.send(Completion { query, reply }).await;
            });
        }
    }
}

/// Resolves a finished flight: broadcasts the reply to every sink in attach
/// order and removes the entry, so the next identical query starts fresh.
fn complete(in_flight: &mut HashMap<String, Vec<ReplySink>>, completion: Completion) {
    let Completion { query, reply } = completion;
    let key = fingerprint(&query);

    let Some(sinks) = in_flight.remove(&key) else {
        warn!("completion for a flight with no table entry");
        return;
    };

    debug!(waiters = sinks.len(), "broadcasting flight result");
    for sink in sinks {
        // A waiter that gave up (dropped its receiver) is not an error.
        let _ = sink.send(reply.clone());
    }
}

//! Private module for selective re-export.
//!
//! A `Worker` is one OS thread running a cooperative scheduler hosting zero or more
//! [`Session`](super::ClientSession)s. Its mailbox is a `crossbeam_channel` rather than a
//! `Condvar`-guarded queue, since a Worker's mailbox has exactly one producer side worth
//! serializing (the dispatcher), not a work-stealing pool of equal peers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::ids::{ClientId, RequestId};
use super::session::ClientSession;

/// How long a Worker's scheduler loop blocks between mailbox checks when idle.
const SCHEDULER_TICK: Duration = Duration::from_secs(10);

pub(crate) enum Command<S: ClientSession> {
    Spawn(ClientId, S),
    Submit(ClientId, RequestId, S::Request),
    Close(ClientId),
}

/// A scheduler thread hosting a set of client Sessions.
///
/// Addressed through `Arc`/`Weak` by [`Pool`](super::pool::Pool): a slot's `Weak<Worker<S>>`
/// upgrades to `None` once every client bound to it has closed, at which point the slot is free
/// to host a freshly spawned Worker.
pub(crate) struct Worker<S: ClientSession> {
    tx: Sender<Command<S>>,
    /// Mirrors the binding map's per-worker client count without needing to lock it; read back
    /// through [`hosted_count`](Self::hosted_count) for logging and tests. Selection itself goes
    /// through `Arc::strong_count` on the binding map's `Arc<Worker<S>>` handles, not this field.
    hosted: AtomicUsize,
}

impl<S: ClientSession> Worker<S> {
    pub fn spawn(name: String) -> Arc<Self> {
        let (tx, rx) = crossbeam_channel::unbounded();
        let worker = Arc::new(Worker { tx, hosted: AtomicUsize::new(0) });
        std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || run(rx))
            .unwrap_or_else(|e| panic!("failed to spawn worker thread {name}: {e}"));
        worker
    }

    pub fn dispatch(&self, command: Command<S>) {
        match &command {
            Command::Spawn(..) => {
                let hosted = self.hosted.fetch_add(1, Ordering::Relaxed) + 1;
                log::trace!("worker: now hosting {hosted} session(s)");
            }
            Command::Close(_) => {
                let hosted = self.hosted.fetch_sub(1, Ordering::Relaxed) - 1;
                log::trace!("worker: now hosting {hosted} session(s)");
            }
            Command::Submit(..) => {}
        }
        // The receiving thread outlives every sender while any binding map entry (which holds an
        // `Arc<Worker<S>>`) is alive, so a disconnected channel here would indicate the worker
        // thread panicked — deliberately fatal to the process, not recovered here.
        if self.tx.send(command).is_err() {
            panic!("worker thread died unexpectedly");
        }
    }

    /// Current count of sessions this Worker hosts, per [`dispatch`](Self::dispatch)'s bookkeeping.
    pub(crate) fn hosted_count(&self) -> usize {
        self.hosted.load(Ordering::Relaxed)
    }
}

fn run<S: ClientSession>(rx: Receiver<Command<S>>) {
    let mut sessions: HashMap<ClientId, S> = HashMap::new();
    loop {
        match rx.recv_timeout(SCHEDULER_TICK) {
            Ok(Command::Spawn(client_id, session)) => {
                log::trace!("worker: hosting new session for {:?}", client_id);
                sessions.insert(client_id, session);
            }
            Ok(Command::Submit(client_id, request_id, request)) => {
                if let Some(session) = sessions.get_mut(&client_id) {
                    session.submit(request_id, request);
                } else {
                    log::warn!(
                        "worker: submit for unknown session {:?} (closed concurrently?)",
                        client_id
                    );
                }
            }
            Ok(Command::Close(client_id)) => {
                if let Some(mut session) = sessions.remove(&client_id) {
                    session.close();
                    log::trace!("worker: closed session for {:?}", client_id);
                }
                // Dropping `session` here (end of scope) drops its `QueueCallback`, which is
                // what actually emits the termination sentinel.
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::trace!("worker: mailbox closed, shutting down");
                break;
            }
        }
    }
}

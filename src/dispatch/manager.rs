//! Private module for selective re-export.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, RwLock};

use super::ids::{ClientId, RequestId};
use super::pool::Pool;
use super::response::{Response, ResponseObject};
use super::session::{ClientSession, Executor, QueueCallback, SessionFactory};
use super::worker::{Command, Worker};

/// The Client Dispatch Layer: hosts many client [`Session`](ClientSession)s over a pool of
/// Worker threads and multiplexes their results onto one consumer-facing queue.
///
/// `S` fixes the embedding protocol for one `Dispatcher` instance — one `Dispatcher<S>` serves
/// exactly one kind of contained client.
/// Where a [`Dispatcher`] draws its [`Pool`] from: a private one it owns outright (sized lazily,
/// optionally overridden via [`Dispatcher::with_pool_size`]), or the process-wide pool shared by
/// every [`Dispatcher`]/[`SingleClient`](super::SingleClient) hosting the same client-session
/// type.
enum PoolSource<S: ClientSession> {
    Private { pool: Option<Arc<Pool<S>>>, size: Option<usize> },
    Shared,
}

pub struct Dispatcher<S: ClientSession> {
    pool: Mutex<PoolSource<S>>,
    bindings: RwLock<HashMap<ClientId, Arc<Worker<S>>>>,
    next_client_id: AtomicU32,
    output_tx: Sender<Response<S::Result, S::Error>>,
    output_rx: Receiver<Response<S::Result, S::Error>>,
    receiving: AtomicBool,
    factory: Box<SessionFactory<S>>,
    executor: Box<Executor<S>>,
}

impl<S: ClientSession> Dispatcher<S> {
    /// `factory` constructs a fresh Session for each newly created client, given the callback it
    /// should report results through. `executor` backs [`execute`](Self::execute). Owns a
    /// private [`Pool`], sized lazily on the first [`create_client`](Self::create_client) call.
    pub fn new(
        factory: Box<SessionFactory<S>>,
        executor: Box<Executor<S>>,
    ) -> Self {
        Self::with_pool_source(
            PoolSource::Private { pool: None, size: None },
            factory,
            executor,
        )
    }

    /// Draws Workers from the process-wide pool shared across every `Dispatcher`/`SingleClient`
    /// hosting this same client-session type, rather than owning a private one. Used by
    /// [`SingleClient`](super::SingleClient) so that many single-client wrappers in one process
    /// share the same set of OS threads while still keeping their own output queue and binding
    /// map (and therefore their own `receive` single-reader invariant).
    pub(crate) fn new_with_shared_pool(
        factory: Box<SessionFactory<S>>,
        executor: Box<Executor<S>>,
    ) -> Self {
        Self::with_pool_source(PoolSource::Shared, factory, executor)
    }

    fn with_pool_source(
        pool: PoolSource<S>,
        factory: Box<SessionFactory<S>>,
        executor: Box<Executor<S>>,
    ) -> Self {
        let (output_tx, output_rx) = crossbeam_channel::unbounded();
        Dispatcher {
            pool: Mutex::new(pool),
            bindings: RwLock::new(HashMap::new()),
            next_client_id: AtomicU32::new(1),
            output_tx,
            output_rx,
            receiving: AtomicBool::new(false),
            factory,
            executor,
        }
    }

    /// Overrides the lazily-computed private-pool size (normally
    /// `clamp(hardware_concurrency * 5/4, 8, 1000)`) with an explicit slot count. Has no effect
    /// once the first [`create_client`](Self::create_client) call has materialized the pool, and
    /// no effect at all on a [`Dispatcher`] drawing from the shared process-wide pool.
    pub fn with_pool_size(self, size: usize) -> Self {
        if let PoolSource::Private { size: slot, .. } = &mut *self.pool.lock() {
            *slot = Some(size);
        }
        self
    }

    /// Allocates a new [`ClientId`], assigns it to the least-used pool Worker (materializing both
    /// the pool itself and that Worker lazily on first use), and records the binding.
    pub fn create_client(&self) -> ClientId {
        let worker = {
            let mut source = self.pool.lock();
            let pool = match &mut *source {
                PoolSource::Private { pool, size } => {
                    pool.get_or_insert_with(|| {
                        Arc::new(Pool::new(size.unwrap_or_else(Pool::<S>::size_for_hardware)))
                    })
                    .clone()
                }
                PoolSource::Shared => Pool::<S>::shared(),
            };
            pool.acquire()
        };

        let client_id = ClientId(self.next_client_id.fetch_add(1, Ordering::Relaxed));
        let callback = QueueCallback::new(client_id, self.output_tx.clone());
        let session = (self.factory)(client_id, callback);

        worker.dispatch(Command::Spawn(client_id, session));
        self.bindings.write().insert(client_id, worker);
        log::debug!("dispatch: created client {:?}", client_id);
        client_id
    }

    /// Delivers `request` into `client_id`'s Session, or synthesizes an "Invalid client" error
    /// response if no such binding exists.
    pub fn send(&self, client_id: ClientId, request_id: RequestId, request: S::Request) {
        let worker = self.bindings.read().get(&client_id).cloned();
        match worker {
            Some(worker) => worker.dispatch(Command::Submit(client_id, request_id, request)),
            None => {
                log::warn!("dispatch: send to invalid client {:?}", client_id);
                let _ = self.output_tx.send(Response::invalid_client(client_id, request_id));
            }
        }
    }

    /// Enqueues a close instruction for `client_id` without waiting for it to take effect.
    pub(crate) fn send_close(&self, client_id: ClientId) {
        if let Some(worker) = self.bindings.read().get(&client_id).cloned() {
            worker.dispatch(Command::Close(client_id));
        }
    }

    /// Dequeues one response, waiting up to `timeout`. Fatal if called concurrently with another
    /// `receive`.
    pub fn receive(&self, timeout: Duration) -> Response<S::Result, S::Error> {
        if self
            .receiving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            panic!("concurrent receive() call on Dispatcher violates the single-reader invariant");
        }

        let response = match self.output_rx.recv_timeout(timeout) {
            Ok(response) => response,
            Err(_) => Response::no_data(),
        };

        if response.is_termination() {
            self.bindings.write().remove(&response.client_id);
            log::debug!("dispatch: purged terminated client {:?}", response.client_id);
        }

        self.receiving.store(false, Ordering::Release);
        response
    }

    /// Runs a request needing no client context, synchronously.
    pub fn execute(&self, request: S::Request) -> ResponseObject<S::Result, S::Error> {
        (self.executor)(request)
    }
}

impl<S: ClientSession> Drop for Dispatcher<S> {
    /// Closes every still-live client and synchronously drains `receive` until each has produced
    /// its sentinel.
    fn drop(&mut self) {
        let live: Vec<ClientId> = self.bindings.read().keys().copied().collect();
        for client_id in &live {
            self.send_close(*client_id);
        }
        while !self.bindings.read().is_empty() {
            self.receive(Duration::from_secs(10));
        }
    }
}

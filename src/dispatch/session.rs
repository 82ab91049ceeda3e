//! Private module for selective re-export.

use crossbeam_channel::Sender;

use super::ids::{ClientId, RequestId};
use super::response::{Response, ResponseObject};

/// The contained protocol client (out of scope for this crate) seen purely as two capabilities:
/// accept a request bearing an opaque id, and be told to close.
///
/// One `Session` is created per client via a [`SessionFactory`] and hosted exclusively by a
/// single [`Worker`](super::worker::Worker) thread for its entire lifetime — nothing here needs
/// to be `Sync`, only `Send` to make the initial handoff.
pub trait ClientSession: Send + 'static {
    /// The opaque request payload `send` is given.
    type Request: Send + 'static;
    /// The opaque result payload a successful request ultimately yields.
    type Result: Send + 'static;
    /// The opaque error payload an application-level failure yields.
    type Error: Send + 'static;

    /// Enqueue `request` for processing. Must preserve call order relative to the session's own
    /// future callback invocations.
    fn submit(&mut self, request_id: RequestId, request: Self::Request);

    /// Drain pending work and invoke the callback one final time with the termination sentinel.
    /// Implementations are expected to hold their [`ClientCallback`] (a [`QueueCallback`]) in a
    /// field that is dropped by the time this returns or by the time `self` itself drops — the
    /// sentinel fires from that drop, not from this method directly, since destroying the
    /// callback is what emits it.
    fn close(&mut self);
}

/// The capability a [`ClientSession`] calls into to report results: an `on_result`/`on_error`
/// pair plus an implicit destructor-fired sentinel.
pub trait ClientCallback: Send + 'static {
    type Result: Send + 'static;
    type Error: Send + 'static;

    fn on_result(&mut self, request_id: RequestId, result: Self::Result);
    fn on_error(&mut self, request_id: RequestId, error: Self::Error);
}

/// The concrete [`ClientCallback`] the dispatcher hands to every [`SessionFactory`] invocation: a
/// thin adapter pushing [`Response`] values into the shared output queue. Its `Drop` impl is the
/// sole source of the per-client termination sentinel.
pub struct QueueCallback<R, E> {
    client_id: ClientId,
    tx: Sender<Response<R, E>>,
}

impl<R, E> QueueCallback<R, E> {
    pub(crate) fn new(client_id: ClientId, tx: Sender<Response<R, E>>) -> Self {
        QueueCallback { client_id, tx }
    }
}

impl<R, E> ClientCallback for QueueCallback<R, E>
where
    R: Send + 'static,
    E: Send + 'static,
{
    type Result = R;
    type Error = E;

    fn on_result(&mut self, request_id: RequestId, result: R) {
        let _ = self.tx.send(Response {
            client_id: self.client_id,
            request_id,
            object: ResponseObject::Result(result),
        });
    }

    fn on_error(&mut self, request_id: RequestId, error: E) {
        let _ = self.tx.send(Response {
            client_id: self.client_id,
            request_id,
            object: ResponseObject::Error(super::response::ErrorObject::Application(error)),
        });
    }
}

impl<R, E> Drop for QueueCallback<R, E> {
    fn drop(&mut self) {
        let _ = self.tx.send(Response::termination(self.client_id));
        log::trace!("dispatch: termination sentinel sent for {:?}", self.client_id);
    }
}

/// Constructs a fresh [`ClientSession`] for a newly created client, given the callback it should
/// report results through.
pub type SessionFactory<S> =
    dyn Fn(ClientId, QueueCallback<<S as ClientSession>::Result, <S as ClientSession>::Error>) -> S
        + Send
        + Sync;

/// Runs a request needing no client context.
pub type Executor<S> = dyn Fn(<S as ClientSession>::Request) -> ResponseObject<<S as ClientSession>::Result, <S as ClientSession>::Error>
    + Send
    + Sync;

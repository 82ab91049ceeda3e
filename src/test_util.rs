//! Shared fixtures for the `dispatch` and `omi` test suites.

use std::sync::Mutex;
use std::time::Duration;

use crate::dispatch::{
    ClientCallback, ClientSession, Dispatcher, QueueCallback, Response, ResponseObject,
    SingleClient,
};

/// A `ClientSession` that echoes every submitted `i64` request straight back as its result.
/// Simple enough to make the FIFO-ordering and termination properties the dispatch test suites
/// check about as directly observable as possible.
pub struct EchoSession {
    callback: QueueCallback<i64, String>,
}

impl EchoSession {
    pub fn new(callback: QueueCallback<i64, String>) -> Self {
        EchoSession { callback }
    }
}

impl ClientSession for EchoSession {
    type Request = i64;
    type Result = i64;
    type Error = String;

    fn submit(&mut self, request_id: crate::dispatch::RequestId, request: i64) {
        self.callback.on_result(request_id, request);
    }

    fn close(&mut self) {
        // Nothing buffered to flush; the termination sentinel fires when `self.callback`
        // drops along with `self`.
    }
}

pub fn echo_dispatcher() -> Dispatcher<EchoSession> {
    Dispatcher::new(
        Box::new(|_client_id, callback| EchoSession::new(callback)),
        Box::new(|request: i64| ResponseObject::Result(request)),
    )
}

pub fn echo_single_client() -> SingleClient<EchoSession> {
    SingleClient::new(
        Box::new(|_client_id, callback| EchoSession::new(callback)),
        Box::new(|request: i64| ResponseObject::Result(request)),
    )
}

/// Drains `dispatcher` until `client_id`'s termination sentinel is observed, collecting every
/// other response seen along the way. Useful for tests that need the full response sequence
/// rather than just the count.
pub fn drain_until_termination(
    dispatcher: &Dispatcher<EchoSession>,
    client_id: crate::dispatch::ClientId,
) -> Vec<Response<i64, String>> {
    let mut seen = Vec::new();
    loop {
        let response = dispatcher.receive(Duration::from_secs(5));
        let is_done = response.is_termination() && response.client_id == client_id;
        seen.push(response);
        if is_done {
            return seen;
        }
    }
}

/// A date lookup table for `OrderedMessages::find_message_by_date`-style tests, guarded the way a
/// shared fixture would be if tests ran concurrently (they don't here, but explicit
/// synchronization primitives are preferred over ambient assumptions).
pub fn date_table(pairs: &[(i64, i64)]) -> Mutex<std::collections::HashMap<i64, i64>> {
    Mutex::new(pairs.iter().copied().collect())
}

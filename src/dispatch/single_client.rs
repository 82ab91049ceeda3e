//! Private module for selective re-export.
//!
//! A convenience wrapper owning exactly one [`ClientId`]: no distinct algorithms, just
//! [`Dispatcher`] with the client-id threaded through automatically.
//!
//! Each `SingleClient` owns a private `Dispatcher` — its own output queue and binding map — so
//! that a second wrapper's `receive` can never steal a response meant for the first. The
//! underlying Worker pool is a different concern: every `SingleClient<S>` in the process draws
//! from the same process-wide `Pool<S>`, so many wrappers over the same session type still share
//! one set of OS threads rather than each paying for its own.

use std::time::Duration;

use super::ids::RequestId;
use super::manager::Dispatcher;
use super::response::{Response, ResponseObject};
use super::session::{ClientSession, Executor, SessionFactory};
use super::ClientId;

pub struct SingleClient<S: ClientSession> {
    dispatcher: Dispatcher<S>,
    client_id: ClientId,
}

impl<S: ClientSession> SingleClient<S> {
    pub fn new(factory: Box<SessionFactory<S>>, executor: Box<Executor<S>>) -> Self {
        let dispatcher = Dispatcher::new_with_shared_pool(factory, executor);
        let client_id = dispatcher.create_client();
        SingleClient { dispatcher, client_id }
    }

    pub fn client_id(&self) -> ClientId {
        self.client_id
    }

    /// Forwards to the owned client. A request id of `0` is malformed and is logged and dropped
    /// rather than sent.
    pub fn send(&self, request_id: RequestId, request: S::Request) {
        if !request_id.is_valid() {
            log::warn!("single_client: dropping malformed request with id 0");
            return;
        }
        self.dispatcher.send(self.client_id, request_id, request);
    }

    pub fn receive(&self, timeout: Duration) -> Response<S::Result, S::Error> {
        self.dispatcher.receive(timeout)
    }

    pub fn execute(&self, request: S::Request) -> ResponseObject<S::Result, S::Error> {
        self.dispatcher.execute(request)
    }
}

impl<S: ClientSession> Drop for SingleClient<S> {
    /// Closes the owned client and drains until its sentinel is observed.
    fn drop(&mut self) {
        self.dispatcher.send_close(self.client_id);
        loop {
            let response = self.dispatcher.receive(Duration::from_secs(10));
            if response.is_termination() && response.client_id == self.client_id {
                break;
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_util::echo_single_client;

    #[test]
    fn send_then_receive_round_trips() {
        let client = echo_single_client();
        client.send(RequestId(5), 123);
        let response = client.receive(Duration::from_secs(5));
        assert!(matches!(response.object, ResponseObject::Result(123)));
    }

    #[test]
    fn malformed_request_id_zero_is_dropped() {
        let client = echo_single_client();
        client.send(RequestId(0), 1);
        // Nothing was enqueued; a receive should time out rather than return the dropped request.
        let response = client.receive(Duration::from_millis(50));
        assert!(response.is_no_data());
    }
}

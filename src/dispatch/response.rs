//! Private module for selective re-export.

use super::ids::{ClientId, RequestId};

/// An error surfaced through the response stream rather than through `Result`/`?` — transport,
/// protocol, and application-level errors are all modeled as response objects, never as
/// out-of-band failures.
#[derive(Clone, Debug)]
pub enum ErrorObject<E> {
    /// Synthesized by the dispatcher itself — currently only the "invalid client" case.
    Synthesized { code: i32, message: String },
    /// Propagated verbatim from the contained client's [`ClientCallback::on_error`](super::ClientCallback::on_error).
    Application(E),
}

/// The payload half of a [`Response`].
#[derive(Clone, Debug)]
pub enum ResponseObject<R, E> {
    Result(R),
    Error(ErrorObject<E>),
    /// Either the per-client termination sentinel (`request_id == RequestId(0)` and a valid
    /// `client_id`) or the no-data poll result (`client_id == ClientId(0)`), disambiguated by
    /// which field is zeroed — see [`Response::is_termination`] / [`Response::is_no_data`].
    Null,
}

/// One entry in the dispatcher's shared output queue.
#[derive(Clone, Debug)]
pub struct Response<R, E> {
    pub client_id: ClientId,
    pub request_id: RequestId,
    pub object: ResponseObject<R, E>,
}

impl<R, E> Response<R, E> {
    /// The zeroed value `receive` returns when its wait times out with nothing queued, rather
    /// than erroring.
    pub fn no_data() -> Self {
        Response {
            client_id: ClientId(0),
            request_id: RequestId(0),
            object: ResponseObject::Null,
        }
    }

    pub fn is_no_data(&self) -> bool {
        !self.client_id.is_valid() && matches!(self.object, ResponseObject::Null)
    }

    /// The per-client termination sentinel `(client_id, 0, null)`.
    pub fn is_termination(&self) -> bool {
        self.client_id.is_valid()
            && !self.request_id.is_valid()
            && matches!(self.object, ResponseObject::Null)
    }

    pub(crate) fn invalid_client(client_id: ClientId, request_id: RequestId) -> Self {
        Response {
            client_id,
            request_id,
            object: ResponseObject::Error(ErrorObject::Synthesized {
                code: 400,
                message: "Invalid client".to_owned(),
            }),
        }
    }

    pub(crate) fn termination(client_id: ClientId) -> Self {
        Response {
            client_id,
            request_id: RequestId(0),
            object: ResponseObject::Null,
        }
    }
}

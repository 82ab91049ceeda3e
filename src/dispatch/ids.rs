//! Private module for selective re-export.

use std::fmt::{Debug, Formatter};

/// A client handle allocated by [`Dispatcher::create_client`](super::Dispatcher::create_client).
///
/// `ClientId(0)` never denotes a real client — it is reserved for
/// [`Response::no_data`](super::Response::no_data), the zeroed value `receive` returns when its
/// wait times out without a response arriving.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ClientId(pub(crate) u32);

impl ClientId {
    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Debug for ClientId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("ClientId({})", self.0))
    }
}

/// Caller-chosen request identifier, unique within a single client's lifetime.
///
/// `RequestId(0)` is reserved: it tags the per-client termination sentinel and is rejected by
/// [`SingleClient::send`](super::SingleClient::send) as malformed.
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RequestId(pub u32);

impl RequestId {
    pub const TERMINATION: RequestId = RequestId(0);

    pub fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl Debug for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("RequestId({})", self.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_is_reserved_for_both_ids() {
        assert!(!ClientId(0).is_valid());
        assert!(!RequestId(0).is_valid());
        assert_eq!(RequestId::TERMINATION, RequestId(0));
    }
}

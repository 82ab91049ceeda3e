//! Ordered Message Index: a per-dialog, order-preserving index of message ids.
//!
//! Backed by a [treap](treap) keyed by [`MessageId`] and balanced by a heap key derived
//! deterministically from the id, so that insertion order never needs to be tracked separately
//! and no external randomness source is required. [`OrderedMessages`] is the public entry point;
//! everything else in this module is implementation detail reachable only through it.

mod arena;
mod iter;
mod message_id;
mod messages;
mod treap;

pub use iter::Iter;
pub use message_id::MessageId;
pub use messages::{MessageRef, OrderedMessages};

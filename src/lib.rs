//! Two cores extracted from a Telegram-protocol client library: a per-dialog
//! [ordered message index](omi) and a multi-tenant [client dispatch layer](dispatch).
//!
//! Neither module depends on the other. [`omi`] is a single-threaded treap-backed index of
//! message ids with adjacency bookkeeping and range/date queries; [`dispatch`] hosts many
//! client sessions over a pool of worker threads and multiplexes their results onto one
//! consumer-facing queue. See each module's docs for details.

pub mod dispatch;
pub mod omi;

#[cfg(test)]
pub mod test_util;

//! Private module for selective re-export.

use std::cmp::Ordering;

use super::arena::{Arena, NodeIndex};
use super::iter::Iter;
use super::message_id::MessageId;
use super::treap;

/// A stable handle to a just-inserted message. Since every other [`OrderedMessages`] operation
/// addresses nodes by [`MessageId`] rather than by reference, this is little more than a
/// convenience echo of the id that was inserted — but it type-checks a caller's assumption that
/// the insert actually happened before the next `erase` of that id invalidates it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MessageRef(pub MessageId);

/// A per-dialog, order-preserving index of message ids.
///
/// Backed by a [treap](super) keyed by [`MessageId`] and balanced by a heap key derived
/// deterministically from the id (see [`MessageId::random_y`]). Not `Send`/`Sync`: per the
/// invariant that owns this structure, no two operations may run concurrently against the same
/// `OrderedMessages` — the caller (typically one dialog actor) is responsible for serializing
/// access.
#[derive(Default)]
pub struct OrderedMessages {
    pub(super) root: Option<NodeIndex>,
    pub(super) arena: Arena,
    len: usize,
}

impl OrderedMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live messages.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn find_node(&self, message_id: MessageId) -> Option<NodeIndex> {
        let mut current = self.root;
        while let Some(idx) = current {
            let node = self.arena.get(idx);
            match message_id.cmp(&node.message_id) {
                Ordering::Equal => return Some(idx),
                Ordering::Less => current = node.left,
                Ordering::Greater => current = node.right,
            }
        }
        None
    }

    /// Returns whether `message_id` currently has a node in the index.
    pub fn contains(&self, message_id: MessageId) -> bool {
        self.find_node(message_id).is_some()
    }

    /// Inserts `message_id`. Fatal on duplicate insertion — the caller is expected to already
    /// know the set's membership.
    pub fn insert(&mut self, message_id: MessageId) -> MessageRef {
        if self.find_node(message_id).is_some() {
            panic!("duplicate insertion of message id {:?}", message_id);
        }
        let idx = self.arena.insert(message_id);
        self.root = Some(treap::insert(&mut self.arena, self.root, idx));
        self.len += 1;
        log::trace!("omi: inserted message_id={:?}", message_id);
        MessageRef(message_id)
    }

    /// Removes `message_id`. Fatal if absent.
    pub fn erase(&mut self, message_id: MessageId) {
        if self.find_node(message_id).is_none() {
            panic!("erase of absent message id {:?}", message_id);
        }
        let (new_root, removed) = treap::erase(&mut self.arena, self.root, message_id);
        self.arena.remove(removed);
        self.root = new_root;
        self.len -= 1;
        log::trace!("omi: erased message_id={:?}", message_id);
    }

    /// Positions an iterator at `message_id`, or at the greatest id strictly less than it if
    /// `message_id` itself is absent.
    pub fn get_iterator(&self, message_id: MessageId) -> Iter<'_> {
        Iter::descend_to_floor(self, message_id)
    }

    /// Finds the predecessor of `message_id` without requiring that `message_id` itself be
    /// present, and without panicking when no predecessor exists — used by
    /// [`auto_attach_message`](Self::auto_attach_message), which treats a missing neighbor as a
    /// routine outcome rather than caller misuse.
    fn predecessor(&self, message_id: MessageId) -> Option<NodeIndex> {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(idx) = current {
            let node = self.arena.get(idx);
            if node.message_id < message_id {
                candidate = Some(idx);
                current = node.right;
            } else {
                current = node.left;
            }
        }
        candidate
    }

    /// Symmetric to [`predecessor`](Self::predecessor).
    fn successor(&self, message_id: MessageId) -> Option<NodeIndex> {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(idx) = current {
            let node = self.arena.get(idx);
            if node.message_id > message_id {
                candidate = Some(idx);
                current = node.left;
            } else {
                current = node.right;
            }
        }
        candidate
    }

    /// Marks `message_id` as having a known previous message, and propagates: the in-order
    /// predecessor's `have_next` becomes `true`. If the predecessor's `have_next` was already
    /// `true`, `message_id` inherits `have_next = true` too, merging the two runs of known-adjacent
    /// messages. Fatal if `message_id` is the minimum element (no predecessor to attach to).
    pub fn attach_message_to_previous(&mut self, message_id: MessageId, source: &str) {
        let mut it = self.get_iterator(message_id);
        debug_assert_eq!(it.message_id(), Some(message_id));
        it.decrement();
        let pred_idx = it.node().expect("attach_message_to_previous past the minimum");
        let pred_had_next = self.arena.get(pred_idx).have_next;
        self.arena.get_mut(pred_idx).have_next = true;

        let idx = self.find_node(message_id).expect("message id vanished during attach");
        self.arena.get_mut(idx).have_previous = true;
        if pred_had_next {
            self.arena.get_mut(idx).have_next = true;
        }
        log::trace!(
            "attach_message_to_previous: message_id={:?}, source={}",
            message_id, source
        );
    }

    /// Symmetric to [`attach_message_to_previous`](Self::attach_message_to_previous).
    pub fn attach_message_to_next(&mut self, message_id: MessageId, source: &str) {
        let mut it = self.get_iterator(message_id);
        debug_assert_eq!(it.message_id(), Some(message_id));
        it.increment();
        let succ_idx = it.node().expect("attach_message_to_next past the maximum");
        let succ_had_previous = self.arena.get(succ_idx).have_previous;
        self.arena.get_mut(succ_idx).have_previous = true;

        let idx = self.find_node(message_id).expect("message id vanished during attach");
        self.arena.get_mut(idx).have_next = true;
        if succ_had_previous {
            self.arena.get_mut(idx).have_previous = true;
        }
        log::trace!(
            "attach_message_to_next: message_id={:?}, source={}",
            message_id, source
        );
    }

    /// Heuristic attachment for a newly learned message, given the dialog's last known message
    /// id (pass an invalid [`MessageId`] — `MessageId(0)` — if unknown). Unlike the
    /// `attach_message_to_*` pair, a missing neighbor is an expected outcome here, not a caller
    /// error.
    ///
    /// On the successor branch, the successor's `have_previous` is asserted false rather than
    /// read back as part of the return value — the return in that branch is always `(false,
    /// true)`, and the successor itself is left unmutated.
    pub fn auto_attach_message(
        &mut self,
        message_id: MessageId,
        last_message_id: MessageId,
        source: &str,
    ) -> (bool, bool) {
        if let Some(pred_idx) = self.predecessor(message_id) {
            let pred = self.arena.get(pred_idx);
            if pred.have_next || (last_message_id.is_valid() && pred.message_id >= last_message_id) {
                let had_next = pred.have_next;
                self.arena.get_mut(pred_idx).have_next = true;
                log::trace!(
                    "auto_attach_message: message_id={:?}, source={}, attached_forward=true",
                    message_id, source
                );
                return (true, had_next);
            }
        }
        if !message_id.is_yet_unsent() {
            if let Some(succ_idx) = self.successor(message_id) {
                debug_assert!(
                    !self.arena.get(succ_idx).have_previous,
                    "successor unexpectedly already marked have_previous"
                );
                log::trace!(
                    "auto_attach_message: message_id={:?}, source={}, attached_backward=true",
                    message_id, source
                );
                return (false, true);
            }
        }
        log::trace!(
            "auto_attach_message: message_id={:?}, source={}, attached=false",
            message_id, source
        );
        (false, false)
    }

    /// All currently-inserted ids `<= max_id`, ascending.
    pub fn find_older_messages(&self, max_id: MessageId) -> Vec<MessageId> {
        let mut out = Vec::new();
        self.collect_older(self.root, max_id, &mut out);
        out
    }

    fn collect_older(&self, idx: Option<NodeIndex>, max_id: MessageId, out: &mut Vec<MessageId>) {
        if let Some(idx) = idx {
            let node = self.arena.get(idx);
            self.collect_older(node.left, max_id, out);
            if node.message_id <= max_id {
                out.push(node.message_id);
                self.collect_older(node.right, max_id, out);
            }
        }
    }

    /// All currently-inserted ids `> min_id`, ascending.
    pub fn find_newer_messages(&self, min_id: MessageId) -> Vec<MessageId> {
        let mut out = Vec::new();
        self.collect_newer(self.root, min_id, &mut out);
        out
    }

    fn collect_newer(&self, idx: Option<NodeIndex>, min_id: MessageId, out: &mut Vec<MessageId>) {
        if let Some(idx) = idx {
            let node = self.arena.get(idx);
            if node.message_id > min_id {
                self.collect_newer(node.left, min_id, out);
                out.push(node.message_id);
            }
            self.collect_newer(node.right, min_id, out);
        }
    }

    /// The greatest message whose date is `<= date`, using `get_date` as a (weakly-ordered)
    /// lookup. At each node: if its date is greater than the target, only the left subtree can
    /// contain a qualifying id, so descend there exclusively; otherwise prefer a hit in the right
    /// subtree (it may hold an even-larger id that still qualifies), falling back to the current
    /// node.
    pub fn find_message_by_date(
        &self,
        date: i64,
        get_date: impl Fn(MessageId) -> i64,
    ) -> Option<MessageId> {
        self.find_message_by_date_rec(self.root, date, &get_date)
    }

    fn find_message_by_date_rec(
        &self,
        idx: Option<NodeIndex>,
        date: i64,
        get_date: &impl Fn(MessageId) -> i64,
    ) -> Option<MessageId> {
        let idx = idx?;
        let node = self.arena.get(idx);
        if get_date(node.message_id) > date {
            self.find_message_by_date_rec(node.left, date, get_date)
        } else {
            self.find_message_by_date_rec(node.right, date, get_date)
                .or(Some(node.message_id))
        }
    }

    /// All ids whose date falls in `[min_date, max_date]`, ascending by message id. Applies the
    /// same per-node pruning rule as [`find_message_by_date`](Self::find_message_by_date) to each
    /// bound independently.
    pub fn find_messages_by_date(
        &self,
        min_date: i64,
        max_date: i64,
        get_date: impl Fn(MessageId) -> i64,
    ) -> Vec<MessageId> {
        let mut out = Vec::new();
        self.collect_by_date(self.root, min_date, max_date, &get_date, &mut out);
        out
    }

    fn collect_by_date(
        &self,
        idx: Option<NodeIndex>,
        min_date: i64,
        max_date: i64,
        get_date: &impl Fn(MessageId) -> i64,
        out: &mut Vec<MessageId>,
    ) {
        if let Some(idx) = idx {
            let node = self.arena.get(idx);
            let date = get_date(node.message_id);
            if date > min_date {
                self.collect_by_date(node.left, min_date, max_date, get_date, out);
            }
            if date >= min_date && date <= max_date {
                out.push(node.message_id);
            }
            if date <= max_date {
                self.collect_by_date(node.right, min_date, max_date, get_date, out);
            }
        }
    }

    /// A general in-order walk: at each node, `need_scan_older` gates recursion into the left
    /// (older) subtree and `need_scan_newer` gates recursion into the right (newer) subtree, both
    /// evaluated against the current node's id. `visit` is called for every node actually reached.
    pub fn traverse_messages(
        &self,
        mut need_scan_older: impl FnMut(MessageId) -> bool,
        mut need_scan_newer: impl FnMut(MessageId) -> bool,
        mut visit: impl FnMut(MessageId),
    ) {
        self.traverse_rec(self.root, &mut need_scan_older, &mut need_scan_newer, &mut visit);
    }

    fn traverse_rec(
        &self,
        idx: Option<NodeIndex>,
        need_scan_older: &mut impl FnMut(MessageId) -> bool,
        need_scan_newer: &mut impl FnMut(MessageId) -> bool,
        visit: &mut impl FnMut(MessageId),
    ) {
        if let Some(idx) = idx {
            let node = self.arena.get(idx);
            let message_id = node.message_id;
            let (left, right) = (node.left, node.right);
            if need_scan_older(message_id) {
                self.traverse_rec(left, need_scan_older, need_scan_newer, visit);
            }
            visit(message_id);
            if need_scan_newer(message_id) {
                self.traverse_rec(right, need_scan_older, need_scan_newer, visit);
            }
        }
    }

    /// Have-previous/have-next flags for `message_id`, for tests and diagnostics.
    pub fn adjacency(&self, message_id: MessageId) -> (bool, bool) {
        let idx = self
            .find_node(message_id)
            .unwrap_or_else(|| panic!("adjacency query for absent message id {:?}", message_id));
        let node = self.arena.get(idx);
        (node.have_previous, node.have_next)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn set_semantics_after_interleaved_insert_erase() {
        let mut messages = OrderedMessages::new();
        for id in [5, 2, 8, 1, 3, 7, 9] {
            messages.insert(MessageId(id));
        }
        assert_eq!(
            messages.find_older_messages(MessageId(i64::MAX)),
            vec![1, 2, 3, 5, 7, 8, 9].into_iter().map(MessageId).collect::<Vec<_>>()
        );
        messages.erase(MessageId(5));
        assert_eq!(
            messages.find_older_messages(MessageId(i64::MAX)),
            vec![1, 2, 3, 7, 8, 9].into_iter().map(MessageId).collect::<Vec<_>>()
        );
    }

    #[test]
    #[should_panic(expected = "duplicate insertion")]
    fn duplicate_insert_is_fatal() {
        let mut messages = OrderedMessages::new();
        messages.insert(MessageId(1));
        messages.insert(MessageId(1));
    }

    #[test]
    #[should_panic(expected = "erase of absent")]
    fn erase_of_absent_is_fatal() {
        let mut messages = OrderedMessages::new();
        messages.erase(MessageId(1));
    }

    #[test]
    fn range_queries_partition_the_set() {
        let mut messages = OrderedMessages::new();
        for id in [1, 2, 3, 4, 5] {
            messages.insert(MessageId(id));
        }
        let older = messages.find_older_messages(MessageId(3));
        let newer = messages.find_newer_messages(MessageId(3));
        assert_eq!(older, vec![MessageId(1), MessageId(2), MessageId(3)]);
        assert_eq!(newer, vec![MessageId(4), MessageId(5)]);
        assert!(older.iter().all(|id| !newer.contains(id)));
    }

    #[test]
    fn adjacency_propagation_merges_runs() {
        let mut messages = OrderedMessages::new();
        for id in [10, 20, 30] {
            messages.insert(MessageId(id));
        }
        messages.attach_message_to_previous(MessageId(20), "test");
        assert_eq!(messages.adjacency(MessageId(10)).1, true); // 10.have_next
        assert_eq!(messages.adjacency(MessageId(20)).0, true); // 20.have_previous

        messages.attach_message_to_previous(MessageId(30), "test");
        assert_eq!(messages.adjacency(MessageId(20)).1, true); // 20.have_next
        assert_eq!(messages.adjacency(MessageId(30)).0, true); // 30.have_previous
        // Because 20.have_next was already true, 30 inherits have_next too.
        assert_eq!(messages.adjacency(MessageId(30)).1, true);
    }

    #[test]
    fn date_search_finds_greatest_le_target() {
        let mut messages = OrderedMessages::new();
        for id in [1, 2, 3] {
            messages.insert(MessageId(id));
        }
        let dates = crate::test_util::date_table(&[(1, 100), (2, 200), (3, 300)]);
        let get_date = |id: MessageId| dates.lock().unwrap()[&id.0];

        assert_eq!(messages.find_message_by_date(250, get_date), Some(MessageId(2)));
        assert_eq!(messages.find_message_by_date(99, get_date), None);
        assert_eq!(
            messages.find_messages_by_date(150, 250, get_date),
            vec![MessageId(2)]
        );
    }

    #[test]
    fn auto_attach_forward_when_predecessor_has_next() {
        let mut messages = OrderedMessages::new();
        messages.insert(MessageId(10));
        messages.insert(MessageId(20));
        messages.attach_message_to_next(MessageId(10), "test"); // 10.have_next = true
        messages.insert(MessageId(15));
        let (have_previous, have_next) =
            messages.auto_attach_message(MessageId(15), MessageId(0), "test");
        assert!(have_previous);
        assert!(have_next); // predecessor (10) already had have_next set
        assert_eq!(messages.adjacency(MessageId(10)).1, true);
    }

    #[test]
    fn auto_attach_forward_via_last_message_id() {
        let mut messages = OrderedMessages::new();
        messages.insert(MessageId(10));
        messages.insert(MessageId(15));
        let (have_previous, have_next) =
            messages.auto_attach_message(MessageId(15), MessageId(10), "test");
        assert!(have_previous);
        assert!(!have_next); // predecessor's have_next was not yet set
        assert_eq!(messages.adjacency(MessageId(10)).1, true);
    }

    #[test]
    fn auto_attach_backward_via_successor_without_mutation() {
        let mut messages = OrderedMessages::new();
        messages.insert(MessageId(20));
        messages.insert(MessageId(15));
        let (have_previous, have_next) =
            messages.auto_attach_message(MessageId(15), MessageId(0), "test");
        assert!(!have_previous);
        assert!(have_next);
        // Unmutated: the successor's own have_previous remains false.
        assert_eq!(messages.adjacency(MessageId(20)).0, false);
    }

    #[test]
    fn auto_attach_reports_nothing_known_when_isolated() {
        let mut messages = OrderedMessages::new();
        messages.insert(MessageId(15));
        let (have_previous, have_next) =
            messages.auto_attach_message(MessageId(15), MessageId(0), "test");
        assert!(!have_previous);
        assert!(!have_next);
    }

    #[test]
    fn traverse_messages_respects_gating_predicates() {
        let mut messages = OrderedMessages::new();
        for id in [1, 2, 3, 4, 5] {
            messages.insert(MessageId(id));
        }
        let mut seen = Vec::new();
        messages.traverse_messages(
            |id| id.0 > 2, // only keep scanning older while above 2
            |_| true,
            |id| seen.push(id.0),
        );
        // The left branch below 3 is still visited once per node until the gate fails,
        // and the whole right side is always explored.
        assert!(seen.contains(&3));
        assert!(seen.contains(&4));
        assert!(seen.contains(&5));
    }

    #[test]
    fn randomized_insert_erase_preserves_set_semantics() {
        use rand::prelude::*;
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let mut messages = OrderedMessages::new();
        let mut live: std::collections::BTreeSet<i64> = std::collections::BTreeSet::new();
        for _ in 0..2_000 {
            let id = rng.gen_range(-500..500);
            if id == 0 {
                continue;
            }
            if live.contains(&id) {
                messages.erase(MessageId(id));
                live.remove(&id);
            } else {
                messages.insert(MessageId(id));
                live.insert(id);
            }
        }
        let expected: Vec<MessageId> = live.iter().copied().map(MessageId).collect();
        assert_eq!(messages.find_older_messages(MessageId(i64::MAX)), expected);
        assert_eq!(messages.len(), live.len());
    }
}

//! Private module for selective re-export.

use super::arena::NodeIndex;
use super::message_id::MessageId;
use super::messages::OrderedMessages;

/// Positioned at a message id (or, per [`OrderedMessages::get_iterator`]'s contract, at the
/// greatest id strictly less than a missing target). Supports in-order predecessor/successor
/// stepping via [`decrement`](Iter::decrement)/[`increment`](Iter::increment).
///
/// Implemented as a stack of ancestors recorded during the descent from the root: the top of the
/// stack is the current node, and the rest of the stack is exactly what's needed to resume an
/// in-order walk in either direction without parent pointers. `OrderedMessages` never mutates its
/// tree shape between a `get_iterator` call and the adjacency `++`/`--` that follows it, so the
/// stack can't go stale in that window.
pub struct Iter<'a> {
    messages: &'a OrderedMessages,
    path: Vec<NodeIndex>,
}

impl<'a> Iter<'a> {
    pub(crate) fn descend_to_floor(messages: &'a OrderedMessages, key: MessageId) -> Self {
        let arena = &messages.arena;
        let mut path = Vec::new();
        let mut floor_len = 0;
        let mut current = messages.root;
        while let Some(idx) = current {
            path.push(idx);
            let node_key = arena.get(idx).message_id;
            if key == node_key {
                return Iter { messages, path };
            } else if key < node_key {
                current = arena.get(idx).left;
            } else {
                floor_len = path.len();
                current = arena.get(idx).right;
            }
        }
        path.truncate(floor_len);
        Iter { messages, path }
    }

    /// The message id at the iterator's current position. `None` if positioned before the first
    /// element (only reachable when the original lookup key was smaller than every stored id).
    pub fn message_id(&self) -> Option<MessageId> {
        self.path.last().map(|&idx| self.messages.arena.get(idx).message_id)
    }

    pub(crate) fn node(&self) -> Option<NodeIndex> {
        self.path.last().copied()
    }

    /// Moves to the in-order successor. Panics if already at the maximum element — callers using
    /// this for adjacency bookkeeping are expected to know a successor exists before calling.
    pub fn increment(&mut self) {
        let arena = &self.messages.arena;
        let idx = *self.path.last().expect("increment on an empty iterator");
        if let Some(mut cur) = arena.get(idx).right {
            self.path.push(cur);
            while let Some(l) = arena.get(cur).left {
                self.path.push(l);
                cur = l;
            }
            return;
        }
        loop {
            let child = self.path.pop().expect("iterator increment past the maximum");
            match self.path.last() {
                Some(&parent) if arena.get(parent).left == Some(child) => return,
                Some(_) => continue,
                None => panic!("iterator increment past the maximum"),
            }
        }
    }

    /// Moves to the in-order predecessor. Panics if already at (or before) the minimum element.
    pub fn decrement(&mut self) {
        let arena = &self.messages.arena;
        let idx = *self.path.last().expect("decrement on an empty iterator");
        if let Some(mut cur) = arena.get(idx).left {
            self.path.push(cur);
            while let Some(r) = arena.get(cur).right {
                self.path.push(r);
                cur = r;
            }
            return;
        }
        loop {
            let child = self.path.pop().expect("iterator decrement past the minimum");
            match self.path.last() {
                Some(&parent) if arena.get(parent).right == Some(child) => return,
                Some(_) => continue,
                None => panic!("iterator decrement past the minimum"),
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::message_id::MessageId;
    use super::super::messages::OrderedMessages;

    fn build(ids: &[i64]) -> OrderedMessages {
        let mut messages = OrderedMessages::new();
        for &id in ids {
            messages.insert(MessageId(id));
        }
        messages
    }

    #[test]
    fn lands_on_exact_match() {
        let messages = build(&[10, 20, 30]);
        let it = messages.get_iterator(MessageId(20));
        assert_eq!(it.message_id(), Some(MessageId(20)));
    }

    #[test]
    fn lands_on_greatest_predecessor_when_absent() {
        let messages = build(&[10, 20, 30]);
        let it = messages.get_iterator(MessageId(25));
        assert_eq!(it.message_id(), Some(MessageId(20)));
    }

    #[test]
    fn empty_when_smaller_than_every_id() {
        let messages = build(&[10, 20, 30]);
        let it = messages.get_iterator(MessageId(5));
        assert_eq!(it.message_id(), None);
    }

    #[test]
    fn increment_and_decrement_walk_in_order() {
        let messages = build(&[5, 2, 8, 1, 3, 7, 9]);
        let mut it = messages.get_iterator(MessageId(1));
        let mut seen = vec![it.message_id().unwrap().0];
        for _ in 0..6 {
            it.increment();
            seen.push(it.message_id().unwrap().0);
        }
        assert_eq!(seen, vec![1, 2, 3, 5, 7, 8, 9]);

        for _ in 0..6 {
            it.decrement();
        }
        assert_eq!(it.message_id(), Some(MessageId(1)));
    }

    #[test]
    #[should_panic(expected = "past the maximum")]
    fn increment_past_maximum_panics() {
        let messages = build(&[5]);
        let mut it = messages.get_iterator(MessageId(5));
        it.increment();
    }

    #[test]
    #[should_panic(expected = "past the minimum")]
    fn decrement_past_minimum_panics() {
        let messages = build(&[5]);
        let mut it = messages.get_iterator(MessageId(5));
        it.decrement();
    }
}

//! Private module for selective re-export.
//!
//! Backs [`OrderedMessages`](super::OrderedMessages) with a flat `Vec` of slots addressed by a
//! newtype index: a `NodeIndex` can't be confused with any other `usize`-like key. Unlike a plain
//! dense map, slots here can be freed, so a free list threads through vacated slots instead of
//! only ever growing.

use super::message_id::MessageId;

#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub(crate) struct NodeIndex(u32);

impl std::fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("NodeIndex({})", self.0))
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub message_id: MessageId,
    pub random_y: i32,
    pub left: Option<NodeIndex>,
    pub right: Option<NodeIndex>,
    pub have_previous: bool,
    pub have_next: bool,
}

impl Node {
    fn new(message_id: MessageId) -> Self {
        Node {
            message_id,
            random_y: message_id.random_y(),
            left: None,
            right: None,
            have_previous: false,
            have_next: false,
        }
    }
}

enum Slot {
    Occupied(Node),
    /// Vacated slot; threads the free list through the next free index (or `None` at the tail).
    Free(Option<NodeIndex>),
}

#[derive(Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free_head: Option<NodeIndex>,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, message_id: MessageId) -> NodeIndex {
        let node = Node::new(message_id);
        match self.free_head {
            Some(idx) => {
                let next_free = match &self.slots[idx.0 as usize] {
                    Slot::Free(next) => *next,
                    Slot::Occupied(_) => unreachable!("free list pointed at an occupied slot"),
                };
                self.free_head = next_free;
                self.slots[idx.0 as usize] = Slot::Occupied(node);
                idx
            }
            None => {
                let idx = NodeIndex(self.slots.len() as u32);
                self.slots.push(Slot::Occupied(node));
                idx
            }
        }
    }

    pub fn remove(&mut self, idx: NodeIndex) -> Node {
        let slot = std::mem::replace(&mut self.slots[idx.0 as usize], Slot::Free(self.free_head));
        self.free_head = Some(idx);
        match slot {
            Slot::Occupied(node) => node,
            Slot::Free(_) => unreachable!("removed an already-free slot"),
        }
    }

    pub fn get(&self, idx: NodeIndex) -> &Node {
        match &self.slots[idx.0 as usize] {
            Slot::Occupied(node) => node,
            Slot::Free(_) => unreachable!("accessed a free slot"),
        }
    }

    pub fn get_mut(&mut self, idx: NodeIndex) -> &mut Node {
        match &mut self.slots[idx.0 as usize] {
            Slot::Occupied(node) => node,
            Slot::Free(_) => unreachable!("accessed a free slot"),
        }
    }
}

//! Private module for selective re-export.
//!
//! The split/meld primitives behind [`OrderedMessages::insert`](super::OrderedMessages::insert)
//! and [`OrderedMessages::erase`](super::OrderedMessages::erase). Kept separate from the public
//! surface because nothing here is aware of the `have_previous`/`have_next` adjacency bookkeeping
//! or the by-id lookup table layered on top in `messages.rs`.

use super::arena::{Arena, NodeIndex};
use super::message_id::MessageId;

/// Splits the subtree rooted at `root` into everything strictly less than `key` and everything
/// strictly greater, preserving both the BST order on message id and the max-heap order on
/// `random_y` in each half. `key` must not already be present in the subtree.
///
/// Implemented by threading two moving tail pointers down the search path for `key`: each node
/// visited is appended to whichever half it belongs to, and its child on the side facing away
/// from that half becomes the next node to classify.
pub(crate) fn split(
    arena: &mut Arena,
    root: Option<NodeIndex>,
    key: MessageId,
) -> (Option<NodeIndex>, Option<NodeIndex>) {
    let mut less_head = None;
    let mut less_tail: Option<NodeIndex> = None;
    let mut greater_head = None;
    let mut greater_tail: Option<NodeIndex> = None;

    let mut current = root;
    while let Some(idx) = current {
        if arena.get(idx).message_id < key {
            current = arena.get(idx).right;
            match less_tail {
                Some(tail) => arena.get_mut(tail).right = Some(idx),
                None => less_head = Some(idx),
            }
            less_tail = Some(idx);
        } else {
            current = arena.get(idx).left;
            match greater_tail {
                Some(tail) => arena.get_mut(tail).left = Some(idx),
                None => greater_head = Some(idx),
            }
            greater_tail = Some(idx);
        }
    }
    if let Some(tail) = less_tail {
        arena.get_mut(tail).right = None;
    }
    if let Some(tail) = greater_tail {
        arena.get_mut(tail).left = None;
    }
    (less_head, greater_head)
}

/// Inserts `new_idx` (already carrying its own `message_id`/`random_y`, with `left`/`right` both
/// `None`) into the subtree rooted at `root`, returning the new subtree root.
///
/// Descends while the current node's `random_y` is at least the new node's, exactly as long as
/// doing so preserves heap order; at the first node whose `random_y` is smaller, that node's
/// subtree is displaced: it is split by `new_idx`'s key and the two halves become `new_idx`'s
/// children.
pub(crate) fn insert(arena: &mut Arena, root: Option<NodeIndex>, new_idx: NodeIndex) -> NodeIndex {
    let new_key = arena.get(new_idx).message_id;
    let new_y = arena.get(new_idx).random_y;

    // Walk down recording the path so the cut point can be spliced back in without parent
    // pointers. `path[i].1` records whether node `i+1` is reached via the left or right child.
    let mut path: Vec<(NodeIndex, bool)> = Vec::new(); // bool: true = descended left
    let mut current = root;
    loop {
        match current {
            None => break,
            Some(idx) => {
                if arena.get(idx).random_y < new_y {
                    break;
                }
                let go_left = new_key < arena.get(idx).message_id;
                let next = if go_left { arena.get(idx).left } else { arena.get(idx).right };
                path.push((idx, go_left));
                current = next;
            }
        }
    }

    // `current` (possibly `None`) is the root of the subtree displaced by `new_idx`.
    let (left, right) = split(arena, current, new_key);
    {
        let new_node = arena.get_mut(new_idx);
        new_node.left = left;
        new_node.right = right;
    }

    // Thread `new_idx` back up as the child of the last node on the path, or as the new root.
    let mut child = new_idx;
    for (idx, went_left) in path.into_iter().rev() {
        if went_left {
            arena.get_mut(idx).left = Some(child);
        } else {
            arena.get_mut(idx).right = Some(child);
        }
        child = idx;
    }
    child
}

/// Melds two subtrees into one, keeping BST order (every key in `left` is less than every key in
/// `right`) and max-heap order on `random_y`.
pub(crate) fn meld(
    arena: &mut Arena,
    left: Option<NodeIndex>,
    right: Option<NodeIndex>,
) -> Option<NodeIndex> {
    match (left, right) {
        (None, right) => right,
        (left, None) => left,
        (Some(l), Some(r)) => {
            if arena.get(l).random_y >= arena.get(r).random_y {
                let new_right = meld(arena, arena.get(l).right, Some(r));
                arena.get_mut(l).right = new_right;
                Some(l)
            } else {
                let new_left = meld(arena, Some(l), arena.get(r).left);
                arena.get_mut(r).left = new_left;
                Some(r)
            }
        }
    }
}

/// Removes the node with the given key from the subtree rooted at `root`, melding its children
/// into its place. Returns the new subtree root and the index of the removed node (still present
/// in the arena — the caller is responsible for freeing it once any bookkeeping on its fields is
/// done).
pub(crate) fn erase(
    arena: &mut Arena,
    root: Option<NodeIndex>,
    key: MessageId,
) -> (Option<NodeIndex>, NodeIndex) {
    let idx = root.unwrap_or_else(|| panic!("erase of absent message id during descent"));
    let node_key = arena.get(idx).message_id;
    if key < node_key {
        let (new_left, removed) = erase(arena, arena.get(idx).left, key);
        arena.get_mut(idx).left = new_left;
        (Some(idx), removed)
    } else if key > node_key {
        let (new_right, removed) = erase(arena, arena.get(idx).right, key);
        arena.get_mut(idx).right = new_right;
        (Some(idx), removed)
    } else {
        let melded = meld(arena, arena.get(idx).left, arena.get(idx).right);
        (melded, idx)
    }
}

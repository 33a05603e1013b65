//! Persistent bit-indexed trie map over `u64` keys.
//!
//! Keys are decomposed least-significant-bit first: at each level the
//! current low bit selects a child (0 = left, 1 = right) and the key is
//! halved. Descent terminates when the key reaches zero, so depth is
//! bounded by the bit length of the key, not by the number of entries.
//!
//! [`TrieMap::set`] never mutates: it rebuilds only the nodes on the
//! key's bit path and shares every other subtree with the original map
//! by reference. Old versions stay valid and observable for as long as
//! they are held.

use std::fmt;
use std::rc::Rc;

enum Node<V> {
    /// Empty subtree. Converted to a `Branch` lazily, only along a path
    /// being written.
    Leaf,
    Branch {
        /// `None` marks an unoccupied slot; absence is never encoded as
        /// an in-domain value.
        slot: Option<V>,
        /// Keys whose next bit is 0.
        left: Rc<Node<V>>,
        /// Keys whose next bit is 1.
        right: Rc<Node<V>>,
    },
}

#[inline]
fn leaf<V>() -> Rc<Node<V>> {
    Rc::new(Node::Leaf)
}

/// An immutable map from `u64` keys to values, with structural sharing
/// between versions.
///
/// Cloning the handle is O(1). Reads never allocate and never create
/// entries; writes allocate O(bit length of key) nodes.
pub struct TrieMap<V> {
    root: Rc<Node<V>>,
    len: usize,
}

impl<V> TrieMap<V> {
    /// The empty map.
    pub fn new() -> Self {
        Self {
            root: leaf(),
            len: 0,
        }
    }

    /// Returns the value stored at `key`, or `None` if the key was never
    /// set (or was removed).
    pub fn get(&self, mut key: u64) -> Option<&V> {
        let mut node = &self.root;
        loop {
            match &**node {
                Node::Leaf => return None,
                Node::Branch { slot, left, right } => {
                    if key == 0 {
                        return slot.as_ref();
                    }
                    node = if key & 1 == 0 { left } else { right };
                    key >>= 1;
                }
            }
        }
    }

    pub fn contains_key(&self, key: u64) -> bool {
        self.get(key).is_some()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over `(key, value)` entries.
    ///
    /// The order is a fixed depth-first walk of the bit-path tree. It is
    /// the same for any two maps holding the same keys, but it is *not*
    /// ascending key order.
    pub fn iter(&self) -> Iter<'_, V> {
        let mut stack = Vec::new();
        if let Node::Branch { .. } = &*self.root {
            stack.push(Frame {
                node: &self.root,
                key: 0,
                depth: 0,
            });
        }
        Iter { stack }
    }
}

impl<V: Clone> TrieMap<V> {
    /// Returns a new map in which `key` maps to `value`.
    ///
    /// Every entry at any other key is preserved. Only the nodes on the
    /// path from the root to the key's slot are freshly allocated; all
    /// untouched subtrees are shared with `self`.
    pub fn set(&self, key: u64, value: V) -> Self {
        let (root, had) = write(&self.root, key, Some(value));
        Self {
            root,
            len: if had { self.len } else { self.len + 1 },
        }
    }

    /// Returns a new map with the slot at `key` unoccupied.
    ///
    /// This writes an empty slot; it never shrinks or restructures the
    /// trie. Removing an absent key returns an identical map without
    /// allocating.
    pub fn remove(&self, key: u64) -> Self {
        if !self.contains_key(key) {
            return self.clone();
        }
        let (root, had) = write(&self.root, key, None);
        debug_assert!(had);
        Self {
            root,
            len: self.len - 1,
        }
    }
}

/// Rebuilds the path to `key`, storing `slot` at its terminal node.
///
/// Returns the new subtree and whether the slot previously held a value.
fn write<V: Clone>(node: &Rc<Node<V>>, key: u64, slot: Option<V>) -> (Rc<Node<V>>, bool) {
    match &**node {
        Node::Leaf => {
            if slot.is_none() {
                // Nothing stored below a Leaf; no reason to materialize it.
                return (Rc::clone(node), false);
            }
            if key == 0 {
                let branch = Node::Branch {
                    slot,
                    left: leaf(),
                    right: leaf(),
                };
                (Rc::new(branch), false)
            } else {
                let (child, _) = write(&leaf(), key >> 1, slot);
                let (left, right) = if key & 1 == 0 {
                    (child, leaf())
                } else {
                    (leaf(), child)
                };
                let branch = Node::Branch {
                    slot: None,
                    left,
                    right,
                };
                (Rc::new(branch), false)
            }
        }
        Node::Branch { slot: old, left, right } => {
            if key == 0 {
                let branch = Node::Branch {
                    slot,
                    left: Rc::clone(left),
                    right: Rc::clone(right),
                };
                (Rc::new(branch), old.is_some())
            } else if key & 1 == 0 {
                let (left, had) = write(left, key >> 1, slot);
                let branch = Node::Branch {
                    slot: old.clone(),
                    left,
                    right: Rc::clone(right),
                };
                (Rc::new(branch), had)
            } else {
                let (right, had) = write(right, key >> 1, slot);
                let branch = Node::Branch {
                    slot: old.clone(),
                    left: Rc::clone(left),
                    right,
                };
                (Rc::new(branch), had)
            }
        }
    }
}

struct Frame<'a, V> {
    node: &'a Rc<Node<V>>,
    /// Bits of the key consumed so far.
    key: u64,
    /// Levels descended; the next bit chosen contributes `1 << depth`.
    depth: u32,
}

pub struct Iter<'a, V> {
    stack: Vec<Frame<'a, V>>,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (u64, &'a V);

    fn next(&mut self) -> Option<(u64, &'a V)> {
        while let Some(Frame { node, key, depth }) = self.stack.pop() {
            let Node::Branch { slot, left, right } = &**node else {
                continue;
            };
            debug_assert!(depth <= 64, "branch deeper than the key space");

            // Right pushed first so the left subtree pops first.
            if let Node::Branch { .. } = &**right {
                self.stack.push(Frame {
                    node: right,
                    key: key | 1 << depth,
                    depth: depth + 1,
                });
            }
            if let Node::Branch { .. } = &**left {
                self.stack.push(Frame {
                    node: left,
                    key,
                    depth: depth + 1,
                });
            }

            if let Some(value) = slot.as_ref() {
                return Some((key, value));
            }
        }
        None
    }
}

impl<V> Clone for TrieMap<V> {
    fn clone(&self) -> Self {
        Self {
            root: Rc::clone(&self.root),
            len: self.len,
        }
    }
}

impl<V> Default for TrieMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for TrieMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: PartialEq> PartialEq for TrieMap<V> {
    fn eq(&self, other: &Self) -> bool {
        // Entry order is canonical for a given key set, so a zip suffices.
        self.len == other.len && self.iter().eq(other.iter())
    }
}

impl<V: Eq> Eq for TrieMap<V> {}

impl<V: Clone> FromIterator<(u64, V)> for TrieMap<V> {
    fn from_iter<I: IntoIterator<Item = (u64, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (key, value)| map.set(key, value))
    }
}

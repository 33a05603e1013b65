//! # lit-rs
//!
//! Two building blocks for embedding small functional runtimes:
//!
//! - [`TrieMap`]: an immutable, persistent map from `u64` keys to values,
//!   encoded as a binary trie over the key's bits, least-significant bit
//!   first. Every update returns a new version sharing all untouched
//!   subtrees with the old one.
//! - [`Io`]: a side-effecting program represented as inert data: a tree
//!   of tagged requests, each carrying a continuation, composed with
//!   [`Io::bind`] and executed later by an external interpreter.
//!
//! ## Example
//!
//! ```rust
//! use lit_rs::TrieMap;
//! use lit_rs::io::{self, Tag};
//!
//! let m: TrieMap<u64> = TrieMap::new();
//! let m2 = m.set(1, 10).set(2, 20);
//! assert_eq!(m2.get(1), Some(&10));
//! assert_eq!(m2.get(7), None);
//! assert!(m.is_empty()); // the original version is untouched
//!
//! let prog = io::print("hello").bind(|_| io::pure(42));
//! assert_eq!(prog.tag(), Tag::PutText); // described, not yet performed
//! ```

pub mod io;
pub mod trie;

pub use io::{Handler, ImageTree, Io, Span, Tag, Timestamp};
pub use trie::TrieMap;

#[cfg(test)]
mod proptests;

//! Plain integer aliases shared across the crate.

/// Identifier of a character (strictly: a canonical substring) in a
/// [`CharIndex`](crate::char_index::CharIndex). Id 0 means "no character".
pub type CharId = u16;

/// Index of a node inside a trie arena. For the mutable builder this is the
/// ordinal of the node, for the frozen blob it is the word offset of the
/// node's info word.
pub type NodeId = u32;

/// Non-negative edit penalty. 100 is one full edit; cheap fixes such as
/// accents cost far less.
pub type Cost = u32;

//! Packed trie storage and the capability layer over its representations.

pub mod blob;
pub mod builder;
pub mod consolidate;
pub mod walker;

pub use self::blob::TrieBlob;
pub use self::builder::TrieBuilder;
pub(crate) use self::builder::ROOT;
pub use self::consolidate::consolidate;
pub use self::walker::{CompoundingMethod, HintedWalker, Walker, WalkerItem};

use smol_str::SmolStr;
use unicode_normalization::UnicodeNormalization;

use crate::char_index::CharIndex;
use crate::constants::{
    CASE_FOLD_MARKER, COMPOUND_JOIN, FORBID_MARKER, NODE_CHAR_MASK, NODE_CHILD_SHIFT, NODE_EOW_MASK,
};
use crate::types::{CharId, NodeId};

/// Bit-field widths of the packed node records.
///
/// These are instance-wide: the builder that produced an arena and the blob
/// frozen from it must agree, which is checked by an assertion at freeze
/// time. Packing stays a sealed optimization; everything outside the arena
/// boundary goes through the encode/decode helpers below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeLayout {
    pub eow_mask: u32,
    pub char_mask: u32,
    pub child_shift: u32,
}

impl Default for NodeLayout {
    fn default() -> Self {
        NodeLayout {
            eow_mask: NODE_EOW_MASK,
            char_mask: NODE_CHAR_MASK,
            child_shift: NODE_CHILD_SHIFT,
        }
    }
}

impl NodeLayout {
    #[inline(always)]
    pub(crate) fn encode_info(&self, count: usize, eow: bool) -> u32 {
        ((count as u32) << 1) | if eow { self.eow_mask } else { 0 }
    }

    #[inline(always)]
    pub(crate) fn info_eow(&self, info: u32) -> bool {
        info & self.eow_mask != 0
    }

    #[inline(always)]
    pub(crate) fn info_count(&self, info: u32) -> usize {
        (info >> 1) as usize
    }

    #[inline(always)]
    pub(crate) fn encode_entry(&self, child: u32, ch: CharId) -> u32 {
        (child << self.child_shift) | ch as u32
    }

    #[inline(always)]
    pub(crate) fn entry_char(&self, entry: u32) -> CharId {
        (entry & self.char_mask) as CharId
    }

    #[inline(always)]
    pub(crate) fn entry_child(&self, entry: u32) -> u32 {
        entry >> self.child_shift
    }
}

/// Uniform interface over tree-based, blob-based and filtered nodes.
///
/// Every algorithm above the storage layer (walking, search, serialization)
/// depends only on this trait, never on a concrete representation. A node is
/// a cheap `(arena-ref, index)` pair; cloning never copies node data.
pub trait TrieNode: Clone {
    /// Identity of the node within its arena. After DAWG consolidation the
    /// same id is reachable through many paths, so consumers tracking
    /// visited nodes must key on `(id, context)`, never the id alone.
    fn id(&self) -> NodeId;

    /// End-of-word flag.
    fn eow(&self) -> bool;

    /// Number of child edges.
    fn size(&self) -> usize;

    /// The char id of the `i`-th edge.
    fn char_at(&self, i: usize) -> Option<CharId>;

    /// The node behind the `i`-th edge.
    fn child(&self, i: usize) -> Option<Self>;

    /// The child reached over the edge labelled `ch`, if any.
    fn get(&self, ch: CharId) -> Option<Self> {
        (0..self.size())
            .find(|&i| self.char_at(i) == Some(ch))
            .and_then(|i| self.child(i))
    }

    fn has(&self, ch: CharId) -> bool {
        self.get(ch).is_some()
    }

    #[inline(always)]
    fn has_children(&self) -> bool {
        self.size() != 0
    }

    fn keys(&self) -> Vec<CharId> {
        (0..self.size()).filter_map(|i| self.char_at(i)).collect()
    }

    fn entries(&self) -> Entries<Self> {
        Entries {
            node: self.clone(),
            at: 0,
        }
    }
}

/// Iterator over `(char id, child)` pairs of one node.
pub struct Entries<N: TrieNode> {
    node: N,
    at: usize,
}

impl<N: TrieNode> Iterator for Entries<N> {
    type Item = (CharId, N);

    fn next(&mut self) -> Option<Self::Item> {
        while self.at < self.node.size() {
            let i = self.at;
            self.at += 1;
            if let (Some(ch), Some(child)) = (self.node.char_at(i), self.node.child(i)) {
                return Some((ch, child));
            }
        }
        None
    }
}

/// A word lexicon backed by some node arena.
pub trait TrieLexicon {
    type Node<'a>: TrieNode
    where
        Self: 'a;

    fn root(&self) -> Self::Node<'_>;
    fn char_index(&self) -> &CharIndex;
    fn node_count(&self) -> usize;
    fn word_count(&self) -> usize;

    /// Membership test. Never fails, including on the empty string.
    fn has(&self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }

        let mut node = self.root();
        let mut buf = [0u8; 4];

        for ch in word.nfc() {
            let id = match self.char_index().resolve(ch.encode_utf8(&mut buf)) {
                Some(id) => id,
                None => return false,
            };
            node = match node.get(id) {
                Some(next) => next,
                None => return false,
            };
        }

        node.eow()
    }
}

/// Lazy, restartable sequence of all words of a lexicon, markers included.
pub fn words<L: TrieLexicon>(lexicon: &L) -> impl Iterator<Item = SmolStr> + '_ {
    Walker::new(lexicon.char_index(), lexicon.root(), CompoundingMethod::None)
        .filter(|item| item.node.eow())
        .map(|item| item.text)
}

/// Child edges hidden from ordinary traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HiddenEdges {
    ids: [CharId; 3],
    len: u8,
}

impl HiddenEdges {
    pub fn new(ids: &[CharId]) -> HiddenEdges {
        let mut hidden = HiddenEdges::default();
        for &id in ids.iter().take(3) {
            hidden.ids[hidden.len as usize] = id;
            hidden.len += 1;
        }
        hidden
    }

    #[inline(always)]
    pub fn contains(&self, id: CharId) -> bool {
        self.ids[..self.len as usize].contains(&id)
    }
}

/// The char ids of the compound, forbid and case-fold control edges, for the
/// given index. Markers the index has never seen are simply absent.
pub fn control_char_ids(char_index: &CharIndex) -> HiddenEdges {
    let mut buf = [0u8; 4];
    let mut ids = [0 as CharId; 3];
    let mut len = 0;

    for marker in [COMPOUND_JOIN, FORBID_MARKER, CASE_FOLD_MARKER] {
        if let Some(id) = char_index.resolve(marker.encode_utf8(&mut buf)) {
            ids[len] = id;
            len += 1;
        }
    }

    HiddenEdges::new(&ids[..len])
}

/// Decorator hiding specific child edges (the internal control edges) from
/// the node it wraps. All children are wrapped with the same filter.
#[derive(Debug, Clone)]
pub struct FilteredNode<N: TrieNode> {
    inner: N,
    hidden: HiddenEdges,
}

impl<N: TrieNode> FilteredNode<N> {
    pub fn new(inner: N, hidden: HiddenEdges) -> FilteredNode<N> {
        FilteredNode { inner, hidden }
    }

    pub fn inner(&self) -> &N {
        &self.inner
    }

    fn visible(&self, i: usize) -> Option<usize> {
        let mut seen = 0;
        for raw in 0..self.inner.size() {
            match self.inner.char_at(raw) {
                Some(ch) if self.hidden.contains(ch) => continue,
                Some(_) => {
                    if seen == i {
                        return Some(raw);
                    }
                    seen += 1;
                }
                None => continue,
            }
        }
        None
    }
}

impl<N: TrieNode> TrieNode for FilteredNode<N> {
    fn id(&self) -> NodeId {
        self.inner.id()
    }

    fn eow(&self) -> bool {
        self.inner.eow()
    }

    fn size(&self) -> usize {
        (0..self.inner.size())
            .filter_map(|i| self.inner.char_at(i))
            .filter(|&ch| !self.hidden.contains(ch))
            .count()
    }

    fn char_at(&self, i: usize) -> Option<CharId> {
        self.visible(i).and_then(|raw| self.inner.char_at(raw))
    }

    fn child(&self, i: usize) -> Option<Self> {
        let raw = self.visible(i)?;
        let child = self.inner.child(raw)?;
        Some(FilteredNode {
            inner: child,
            hidden: self.hidden,
        })
    }

    fn get(&self, ch: CharId) -> Option<Self> {
        if self.hidden.contains(ch) {
            return None;
        }
        self.inner.get(ch).map(|child| FilteredNode {
            inner: child,
            hidden: self.hidden,
        })
    }
}

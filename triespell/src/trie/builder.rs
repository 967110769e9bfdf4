//! Mutable packed node store.

use super::{NodeLayout, TrieLexicon, TrieNode};
use crate::char_index::CharIndex;
use crate::types::{CharId, NodeId};

use unicode_normalization::UnicodeNormalization;

pub(crate) const ROOT: u32 = 0;
pub(crate) const EOW_LEAF: u32 = 1;

/// Mutable trie under construction.
///
/// Each node is its own small integer array; the arena is exclusively owned
/// by the builder, and node references are array indices. `nodes[0]` is the
/// root, `nodes[1]` the canonical empty end-of-word leaf shared by every
/// terminal that has no further children. Extending a word past the shared
/// leaf forks that single path (copy-on-write at the node level).
#[derive(Debug, Clone)]
pub struct TrieBuilder {
    pub(crate) nodes: Vec<Vec<u32>>,
    pub(crate) char_index: CharIndex,
    pub(crate) layout: NodeLayout,
    pub(crate) words: usize,
    pub(crate) consolidated: bool,
}

impl TrieBuilder {
    pub fn new() -> TrieBuilder {
        TrieBuilder::with_layout(NodeLayout::default())
    }

    pub fn with_layout(layout: NodeLayout) -> TrieBuilder {
        TrieBuilder {
            nodes: vec![
                vec![layout.encode_info(0, false)],
                vec![layout.encode_info(0, true)],
            ],
            char_index: CharIndex::new(),
            layout,
            words: 0,
            consolidated: false,
        }
    }

    #[inline(always)]
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Inserts one word; returns whether it was new. Leading and trailing
    /// whitespace is trimmed, empty words are ignored.
    pub fn insert(&mut self, word: &str) -> bool {
        assert!(
            !self.consolidated,
            "insert into a consolidated trie would corrupt shared nodes"
        );

        let word = word.trim();
        if word.is_empty() {
            return false;
        }

        let ids: Vec<CharId> = {
            let mut buf = [0u8; 4];
            word.nfc()
                .map(|ch| self.char_index.get_or_insert(ch.encode_utf8(&mut buf)))
                .collect()
        };

        let mut inserted = false;
        let mut at = ROOT;

        for (i, &ch) in ids.iter().enumerate() {
            assert!(
                (ch as u32) <= self.layout.char_mask,
                "char id {} exceeds the char-index mask {:#x}",
                ch,
                self.layout.char_mask
            );

            let last = i + 1 == ids.len();

            match self.find_child(at, ch) {
                Some(child) if last => {
                    if child != EOW_LEAF && self.set_eow(child) {
                        inserted = true;
                    }
                    at = child;
                }
                Some(child) => {
                    at = if child == EOW_LEAF {
                        // The shared leaf must not grow children; fork it.
                        let fork = self.alloc(true);
                        self.repoint_entry(at, ch, fork);
                        fork
                    } else {
                        child
                    };
                }
                None => {
                    let child = if last { EOW_LEAF } else { self.alloc(false) };
                    self.add_entry(at, ch, child);
                    if last {
                        inserted = true;
                    }
                    at = child;
                }
            }
        }

        if inserted {
            self.words += 1;
        }

        inserted
    }

    /// Inserts every word of `words`.
    pub fn insert_all<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            self.insert(word.as_ref());
        }
    }

    /// Sorts every node's entries and re-encodes the arena into a single
    /// flat allocation with child references expressed as word offsets.
    /// The one-time cost here, not asymptotic complexity, is what buys the
    /// frozen blob its query latency.
    pub fn freeze(self) -> super::TrieBlob {
        let layout = self.layout;
        let mut nodes = self.nodes;

        for node in nodes.iter_mut() {
            node[1..].sort_unstable_by_key(|&e| layout.entry_char(e));
        }

        let mut offsets = Vec::with_capacity(nodes.len());
        let mut total: u32 = 0;
        for node in nodes.iter() {
            offsets.push(total);
            total += node.len() as u32;
        }

        assert!(
            total <= (u32::MAX >> layout.child_shift),
            "frozen arena of {} words does not fit the child-ref field",
            total
        );

        let mut data = Vec::with_capacity(total as usize);
        for node in nodes.iter() {
            data.push(node[0]);
            for &entry in &node[1..] {
                let child = offsets[layout.entry_child(entry) as usize];
                data.push(layout.encode_entry(child, layout.entry_char(entry)));
            }
        }

        log::debug!(
            "froze {} nodes ({} words of storage)",
            nodes.len(),
            data.len()
        );

        let blob = super::TrieBlob::new(data, self.char_index, layout, nodes.len(), self.words);
        assert!(
            blob.layout() == &layout,
            "builder and blob disagree on the bit-field layout"
        );
        blob
    }

    pub fn root(&self) -> BuilderNode<'_> {
        BuilderNode {
            builder: self,
            at: ROOT,
        }
    }

    /// Lazy, restartable sequence of all words.
    pub fn words(&self) -> impl Iterator<Item = smol_str::SmolStr> + '_ {
        super::words(self)
    }

    fn find_child(&self, at: u32, ch: CharId) -> Option<u32> {
        self.nodes[at as usize][1..]
            .iter()
            .find(|&&e| self.layout.entry_char(e) == ch)
            .map(|&e| self.layout.entry_child(e))
    }

    pub(crate) fn alloc(&mut self, eow: bool) -> u32 {
        let at = self.nodes.len() as u32;
        self.nodes.push(vec![self.layout.encode_info(0, eow)]);
        at
    }

    pub(crate) fn add_entry(&mut self, parent: u32, ch: CharId, child: u32) {
        let layout = self.layout;
        let node = &mut self.nodes[parent as usize];
        let eow = layout.info_eow(node[0]);
        node.push(layout.encode_entry(child, ch));
        node[0] = layout.encode_info(node.len() - 1, eow);
    }

    /// Sets the EOW flag; returns whether it was newly set.
    pub(crate) fn set_eow(&mut self, at: u32) -> bool {
        let info = self.nodes[at as usize][0];
        if self.layout.info_eow(info) {
            return false;
        }
        self.nodes[at as usize][0] = info | self.layout.eow_mask;
        true
    }

    fn repoint_entry(&mut self, parent: u32, ch: CharId, child: u32) {
        let layout = self.layout;
        for entry in self.nodes[parent as usize][1..].iter_mut() {
            if layout.entry_char(*entry) == ch {
                *entry = layout.encode_entry(child, ch);
                return;
            }
        }
    }

    /// Repoints the most recently added entry of `parent`. Used by the codec
    /// importer when a back-reference replaces a freshly created child.
    pub(crate) fn repoint_last_entry(&mut self, parent: u32, child: u32) {
        let layout = self.layout;
        if let Some(entry) = self.nodes[parent as usize].last_mut() {
            let ch = layout.entry_char(*entry);
            *entry = layout.encode_entry(child, ch);
        }
    }

    /// Drops the most recently allocated node. Only valid while it has no
    /// children and nothing points at it, which the importer guarantees.
    pub(crate) fn pop_last_node(&mut self) {
        self.nodes.pop();
    }
}

impl Default for TrieBuilder {
    fn default() -> Self {
        TrieBuilder::new()
    }
}

impl<S: AsRef<str>> Extend<S> for TrieBuilder {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl TrieLexicon for TrieBuilder {
    type Node<'a> = BuilderNode<'a>;

    fn root(&self) -> BuilderNode<'_> {
        TrieBuilder::root(self)
    }

    fn char_index(&self) -> &CharIndex {
        &self.char_index
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn word_count(&self) -> usize {
        self.words
    }
}

/// A `(builder, index)` pair; the tree-shaped view used while authoring.
#[derive(Debug, Clone)]
pub struct BuilderNode<'a> {
    builder: &'a TrieBuilder,
    at: u32,
}

impl<'a> BuilderNode<'a> {
    #[inline(always)]
    fn raw(&self) -> &[u32] {
        &self.builder.nodes[self.at as usize]
    }
}

impl<'a> TrieNode for BuilderNode<'a> {
    fn id(&self) -> NodeId {
        self.at
    }

    fn eow(&self) -> bool {
        self.builder.layout.info_eow(self.raw()[0])
    }

    fn size(&self) -> usize {
        self.builder.layout.info_count(self.raw()[0])
    }

    fn char_at(&self, i: usize) -> Option<CharId> {
        self.raw()
            .get(i + 1)
            .map(|&e| self.builder.layout.entry_char(e))
    }

    fn child(&self, i: usize) -> Option<Self> {
        self.raw().get(i + 1).map(|&e| BuilderNode {
            builder: self.builder,
            at: self.builder.layout.entry_child(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::TrieLexicon;

    #[test]
    fn insert_and_has() {
        let mut builder = TrieBuilder::new();
        assert!(builder.insert("cat"));
        assert!(builder.insert("cats"));
        assert!(builder.insert("cart"));
        assert!(!builder.insert("cat"));

        assert!(builder.has("cat"));
        assert!(builder.has("cats"));
        assert!(builder.has("cart"));
        assert!(!builder.has("ca"));
        assert!(!builder.has("carts"));
        assert!(!builder.has(""));
        assert_eq!(builder.word_count(), 3);
    }

    #[test]
    fn insert_trims_and_ignores_empty() {
        let mut builder = TrieBuilder::new();
        assert!(!builder.insert("   "));
        assert!(builder.insert("  cat\n"));
        assert!(builder.has("cat"));
        assert_eq!(builder.word_count(), 1);
    }

    #[test]
    fn terminal_nodes_share_the_eow_leaf() {
        let mut builder = TrieBuilder::new();
        builder.insert("ab");
        builder.insert("cd");

        let root = builder.root();
        let b = root.child(0).unwrap().child(0).unwrap();
        let d = root.child(1).unwrap().child(0).unwrap();
        assert_eq!(b.id(), EOW_LEAF);
        assert_eq!(d.id(), EOW_LEAF);
    }

    #[test]
    fn extending_past_the_leaf_forks_it() {
        let mut builder = TrieBuilder::new();
        builder.insert("cat");
        builder.insert("cats");

        assert!(builder.has("cat"));
        assert!(builder.has("cats"));

        // "cat"'s terminal is now a private fork, "cats"'s is the leaf again
        let root = builder.root();
        let t = root
            .child(0)
            .unwrap()
            .child(0)
            .unwrap()
            .child(0)
            .unwrap();
        assert_ne!(t.id(), EOW_LEAF);
        assert!(t.eow());
        assert_eq!(t.child(0).unwrap().id(), EOW_LEAF);
    }

    #[test]
    fn composed_and_decomposed_forms_are_interchangeable() {
        let mut builder = TrieBuilder::new();
        builder.insert("stra\u{00df}e");
        builder.insert("k\u{00e4}se");

        assert!(builder.has("k\u{00e4}se"));
        assert!(builder.has("ka\u{0308}se"));
    }

    #[test]
    fn words_round_trip() {
        let mut builder = TrieBuilder::new();
        let list = ["walk", "walked", "walker", "walking", "walks", "talk"];
        builder.insert_all(list);

        let mut out: Vec<String> = builder.words().map(|w| w.to_string()).collect();
        out.sort();
        let mut expected: Vec<String> = list.iter().map(|w| w.to_string()).collect();
        expected.sort();
        assert_eq!(out, expected);
    }
}

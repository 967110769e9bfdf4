//! Frozen, bit-packed trie blob.

use super::{NodeLayout, TrieLexicon, TrieNode};
use crate::char_index::CharIndex;
use crate::types::{CharId, NodeId};

/// Immutable trie in one contiguous allocation.
///
/// Node references are word offsets into `data`; the root sits at offset 0.
/// Entries of every node are sorted ascending by char id, which lookups rely
/// on and the constructor asserts.
#[derive(Debug, Clone)]
pub struct TrieBlob {
    data: Vec<u32>,
    char_index: CharIndex,
    layout: NodeLayout,
    node_count: usize,
    words: usize,
}

impl TrieBlob {
    pub(crate) fn new(
        data: Vec<u32>,
        char_index: CharIndex,
        layout: NodeLayout,
        node_count: usize,
        words: usize,
    ) -> TrieBlob {
        assert!(
            layout.char_mask == (1u32 << layout.child_shift) - 1 && layout.eow_mask == 1,
            "inconsistent bit-field layout"
        );

        let blob = TrieBlob {
            data,
            char_index,
            layout,
            node_count,
            words,
        };
        blob.assert_sorted();
        blob
    }

    #[inline(always)]
    pub fn layout(&self) -> &NodeLayout {
        &self.layout
    }

    pub fn root(&self) -> BlobNode<'_> {
        BlobNode { blob: self, at: 0 }
    }

    /// Lazy, restartable sequence of all words.
    pub fn words(&self) -> impl Iterator<Item = smol_str::SmolStr> + '_ {
        super::words(self)
    }

    /// Walks every frozen node and asserts its entries are sorted strictly
    /// ascending by char id. A violation is a build-pipeline bug.
    fn assert_sorted(&self) {
        let mut at = 0usize;
        while at < self.data.len() {
            let count = self.layout.info_count(self.data[at]);
            for i in 1..count {
                let prev = self.layout.entry_char(self.data[at + i]);
                let next = self.layout.entry_char(self.data[at + i + 1]);
                assert!(
                    prev < next,
                    "frozen node at offset {} has unsorted entries",
                    at
                );
            }
            at += 1 + count;
        }
    }
}

impl TrieLexicon for TrieBlob {
    type Node<'a> = BlobNode<'a>;

    fn root(&self) -> BlobNode<'_> {
        TrieBlob::root(self)
    }

    fn char_index(&self) -> &CharIndex {
        &self.char_index
    }

    fn node_count(&self) -> usize {
        self.node_count
    }

    fn word_count(&self) -> usize {
        self.words
    }
}

/// A `(blob, offset)` pair.
#[derive(Debug, Clone)]
pub struct BlobNode<'a> {
    blob: &'a TrieBlob,
    at: u32,
}

impl<'a> BlobNode<'a> {
    #[inline(always)]
    fn info(&self) -> u32 {
        self.blob.data[self.at as usize]
    }

    #[inline(always)]
    fn entry(&self, i: usize) -> Option<u32> {
        if i < self.size() {
            Some(self.blob.data[self.at as usize + 1 + i])
        } else {
            None
        }
    }
}

impl<'a> TrieNode for BlobNode<'a> {
    fn id(&self) -> NodeId {
        self.at
    }

    fn eow(&self) -> bool {
        self.blob.layout.info_eow(self.info())
    }

    fn size(&self) -> usize {
        self.blob.layout.info_count(self.info())
    }

    fn char_at(&self, i: usize) -> Option<CharId> {
        self.entry(i).map(|e| self.blob.layout.entry_char(e))
    }

    fn child(&self, i: usize) -> Option<Self> {
        self.entry(i).map(|e| BlobNode {
            blob: self.blob,
            at: self.blob.layout.entry_child(e),
        })
    }

    /// Ordered scan; entries are sorted, so stop as soon as we pass `ch`.
    fn get(&self, ch: CharId) -> Option<Self> {
        for i in 0..self.size() {
            let at = self.char_at(i)?;
            if at == ch {
                return self.child(i);
            }
            if at > ch {
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::super::TrieBuilder;
    use super::*;

    fn build(words: &[&str]) -> TrieBlob {
        let mut builder = TrieBuilder::new();
        builder.insert_all(words);
        builder.freeze()
    }

    #[test]
    fn frozen_blob_agrees_with_builder() {
        let words = ["walk", "walked", "walker", "walking", "walks", "talked"];
        let mut builder = TrieBuilder::new();
        builder.insert_all(words);
        let blob = builder.clone().freeze();

        for w in words {
            assert!(builder.has(w), "builder missing {}", w);
            assert!(blob.has(w), "blob missing {}", w);
        }
        for w in ["wal", "walkers", "alk", ""] {
            assert_eq!(builder.has(w), blob.has(w));
            assert!(!blob.has(w));
        }
    }

    #[test]
    fn frozen_entries_are_sorted() {
        // Insertion order deliberately reversed; freeze must sort.
        let blob = build(&["zebra", "yak", "ant", "zeal"]);
        let root = blob.root();
        let keys = root.keys();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn blob_words_round_trip() {
        let words = ["journal", "journals", "talk", "talks"];
        let blob = build(&words);
        let mut out: Vec<String> = blob.words().map(|w| w.to_string()).collect();
        out.sort();
        assert_eq!(out, words.iter().map(|w| w.to_string()).collect::<Vec<_>>());
        assert_eq!(blob.word_count(), 4);
    }

    #[test]
    fn ordered_scan_early_exit() {
        let blob = build(&["be", "by"]);
        let root = blob.root();
        let b = root.child(0).unwrap();
        let ci = blob.char_index();
        assert!(b.get(ci.resolve("e").unwrap()).is_some());
        assert!(b.get(ci.resolve("b").unwrap()).is_none());
    }
}

//! Bottom-up structural sharing: trie to DAWG.

use hashbrown::HashMap;

use super::builder::{EOW_LEAF, ROOT};
use super::TrieBuilder;
use crate::types::CharId;

type Signature = (bool, Vec<(CharId, u32)>);

enum Visit {
    Enter(u32),
    Exit(u32),
}

/// Post-order, signature-based merge of identical subtries.
///
/// Nodes with the same `(eow, sorted {char, canonical child} set)`, where
/// the child is itself post-consolidation, collapse into one arena slot.
/// `has()` and the word set are unchanged and the node count never grows.
/// The result is flagged so later inserts are rejected: a shared node can no
/// longer be mutated on behalf of a single path.
pub fn consolidate(builder: &TrieBuilder) -> TrieBuilder {
    let layout = builder.layout;

    let mut out: Vec<Vec<u32>> = vec![
        vec![layout.encode_info(0, false)],
        vec![layout.encode_info(0, true)],
    ];
    let mut memo: HashMap<Signature, u32> = HashMap::new();
    memo.insert((true, vec![]), EOW_LEAF);

    let mut canonical: Vec<Option<u32>> = vec![None; builder.nodes.len()];
    canonical[EOW_LEAF as usize] = Some(EOW_LEAF);

    // Explicit two-phase stack; the input may already be a DAG (a previous
    // consolidation or the shared leaf), so every node resolves exactly once.
    let mut stack = vec![Visit::Enter(ROOT)];

    while let Some(visit) = stack.pop() {
        match visit {
            Visit::Enter(at) => {
                if canonical[at as usize].is_some() {
                    continue;
                }
                stack.push(Visit::Exit(at));
                for &entry in &builder.nodes[at as usize][1..] {
                    let child = layout.entry_child(entry);
                    if canonical[child as usize].is_none() {
                        stack.push(Visit::Enter(child));
                    }
                }
            }
            Visit::Exit(at) => {
                if canonical[at as usize].is_some() {
                    continue;
                }

                let node = &builder.nodes[at as usize];
                let eow = layout.info_eow(node[0]);
                let mut entries: Vec<(CharId, u32)> = node[1..]
                    .iter()
                    .map(|&e| {
                        let child = layout.entry_child(e) as usize;
                        // Children are resolved first by post-order.
                        (layout.entry_char(e), canonical[child].unwrap())
                    })
                    .collect();
                entries.sort_unstable_by_key(|&(ch, _)| ch);

                let id = if at == ROOT {
                    // The root keeps slot 0 and never merges away.
                    write_node(&mut out, ROOT, eow, &entries, &layout);
                    ROOT
                } else {
                    *memo.entry((eow, entries.clone())).or_insert_with(|| {
                        let id = out.len() as u32;
                        out.push(vec![]);
                        write_node(&mut out, id, eow, &entries, &layout);
                        id
                    })
                };

                canonical[at as usize] = Some(id);
            }
        }
    }

    log::debug!(
        "consolidated {} nodes into {}",
        builder.nodes.len(),
        out.len()
    );
    debug_assert!(out.len() <= builder.nodes.len());

    TrieBuilder {
        nodes: out,
        char_index: builder.char_index.clone(),
        layout,
        words: builder.words,
        consolidated: true,
    }
}

fn write_node(
    out: &mut [Vec<u32>],
    at: u32,
    eow: bool,
    entries: &[(CharId, u32)],
    layout: &super::NodeLayout,
) {
    let node = &mut out[at as usize];
    node.clear();
    node.push(layout.encode_info(entries.len(), eow));
    for &(ch, child) in entries {
        node.push(layout.encode_entry(child, ch));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::TrieLexicon;

    fn word_set(builder: &TrieBuilder) -> Vec<String> {
        let mut words: Vec<String> = builder.words().map(|w| w.to_string()).collect();
        words.sort();
        words
    }

    #[test]
    fn shares_identical_suffixes() {
        let mut builder = TrieBuilder::new();
        builder.insert_all([
            "walk", "walked", "walker", "walking", "walks", "talk", "talked", "talker",
            "talking", "talks",
        ]);

        let before = builder.node_count();
        let dawg = consolidate(&builder);

        // "alk…" subtries of t and w collapse into one.
        assert!(dawg.node_count() < before);
        assert_eq!(word_set(&dawg), word_set(&builder));
        for w in ["walk", "talking", "walks"] {
            assert!(dawg.has(w));
        }
        assert!(!dawg.has("walkings"));
    }

    #[test]
    fn never_increases_node_count() {
        let mut builder = TrieBuilder::new();
        builder.insert_all(["a", "b", "ab"]);
        let dawg = consolidate(&builder);
        assert!(dawg.node_count() <= builder.node_count());
        assert_eq!(word_set(&dawg), word_set(&builder));
    }

    #[test]
    fn consolidating_twice_is_stable() {
        let mut builder = TrieBuilder::new();
        builder.insert_all(["tap", "taps", "top", "tops"]);
        let once = consolidate(&builder);
        let twice = consolidate(&once);
        assert_eq!(once.node_count(), twice.node_count());
        assert_eq!(word_set(&once), word_set(&twice));
    }

    #[test]
    fn consolidated_trie_freezes_cleanly() {
        let mut builder = TrieBuilder::new();
        builder.insert_all(["run", "runs", "ran"]);
        let blob = consolidate(&builder).freeze();
        assert!(blob.has("runs"));
        assert!(!blob.has("rans"));
    }

    #[test]
    #[should_panic(expected = "consolidated")]
    fn insert_after_consolidation_is_rejected() {
        let mut builder = TrieBuilder::new();
        builder.insert("hi");
        let mut dawg = consolidate(&builder);
        dawg.insert("ho");
    }
}

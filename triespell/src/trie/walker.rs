//! Iterative, non-recursive trie traversal.

use smol_str::SmolStr;

use super::{control_char_ids, FilteredNode, TrieNode};
use crate::char_index::CharIndex;
use crate::constants::{COMPOUND_JOIN, WORD_SEPARATOR};

/// How words may be concatenated during traversal and search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CompoundingMethod {
    /// Plain words only.
    None,
    /// Words may be joined directly; the join is marked with `+` internally.
    JoinWords,
    /// Words may be joined with a space between them.
    SeparateWords,
}

impl CompoundingMethod {
    #[inline(always)]
    pub(crate) fn join_char(self) -> Option<char> {
        match self {
            CompoundingMethod::None => None,
            CompoundingMethod::JoinWords => Some(COMPOUND_JOIN),
            CompoundingMethod::SeparateWords => Some(WORD_SEPARATOR),
        }
    }
}

impl Default for CompoundingMethod {
    fn default() -> Self {
        CompoundingMethod::None
    }
}

/// One step of a walk.
#[derive(Debug, Clone)]
pub struct WalkerItem<N> {
    pub text: SmolStr,
    pub node: N,
    pub depth: usize,
}

struct Frame<N> {
    node: N,
    pos: usize,
    text_len: usize,
    depth: usize,
    compounded: bool,
}

/// Depth-first traversal yielding `(text, node, depth)` for every edge
/// taken, driven by an explicit frame stack. Compounding splices virtual
/// edges back to the root whenever an end-of-word node is reached, which can
/// chain arbitrarily deep; recursion is therefore never an option here.
pub struct Walker<'a, N: TrieNode> {
    char_index: &'a CharIndex,
    root: N,
    method: CompoundingMethod,
    stack: Vec<Frame<N>>,
    text: String,
}

impl<'a, N: TrieNode> Walker<'a, N> {
    pub fn new(char_index: &'a CharIndex, root: N, method: CompoundingMethod) -> Walker<'a, N> {
        let stack = vec![Frame {
            node: root.clone(),
            pos: 0,
            text_len: 0,
            depth: 0,
            compounded: false,
        }];

        Walker {
            char_index,
            root,
            method,
            stack,
            text: String::new(),
        }
    }

    fn descend(&mut self, node: N, appended: &str, depth: usize) -> WalkerItem<N> {
        self.text.push_str(appended);
        self.stack.push(Frame {
            node: node.clone(),
            pos: 0,
            text_len: self.text.len(),
            depth,
            compounded: false,
        });

        WalkerItem {
            text: SmolStr::new(&self.text),
            node,
            depth,
        }
    }
}

impl<'a, N: TrieNode> Iterator for Walker<'a, N> {
    type Item = WalkerItem<N>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.len().checked_sub(1)?;

            let (pos, size) = {
                let frame = &self.stack[top];
                (frame.pos, frame.node.size())
            };

            if pos < size {
                self.stack[top].pos += 1;
                let frame = &self.stack[top];
                let text_len = frame.text_len;
                let depth = frame.depth + 1;
                let (ch, child) = match (frame.node.char_at(pos), frame.node.child(pos)) {
                    (Some(ch), Some(child)) => (ch, child),
                    _ => continue,
                };

                let label = self.char_index.text_of(ch).unwrap_or("").to_string();
                self.text.truncate(text_len);
                return Some(self.descend(child, &label, depth));
            }

            // Children exhausted; splice the virtual compound edge before
            // backing out of an end-of-word node.
            let frame = &self.stack[top];
            if frame.depth > 0 && frame.node.eow() && !frame.compounded {
                if let Some(join) = self.method.join_char() {
                    self.stack[top].compounded = true;
                    let frame = &self.stack[top];
                    let text_len = frame.text_len;
                    let depth = frame.depth + 1;
                    let root = self.root.clone();

                    self.text.truncate(text_len);
                    let mut label = [0u8; 4];
                    let label = join.encode_utf8(&mut label).to_string();
                    return Some(self.descend(root, &label, depth));
                }
            }

            self.stack.pop();
            if let Some(frame) = self.stack.last() {
                self.text.truncate(frame.text_len);
            }
        }
    }
}

/// Walker variant that expands children nearest to a hint word first and
/// suppresses the internal control edges. Used to reach plausible
/// corrections early when the consumer will stop after a few results.
pub struct HintedWalker<'a, N: TrieNode> {
    inner: Walker<'a, OrderedNode<FilteredNode<N>>>,
}

impl<'a, N: TrieNode> HintedWalker<'a, N> {
    pub fn new(
        char_index: &'a CharIndex,
        root: N,
        method: CompoundingMethod,
        hint: &str,
    ) -> HintedWalker<'a, N> {
        let hidden = control_char_ids(char_index);
        let mut buf = [0u8; 4];
        let hint_ids: Vec<_> = hint
            .chars()
            .filter_map(|ch| char_index.resolve(ch.encode_utf8(&mut buf)))
            .collect();

        let root = OrderedNode {
            inner: FilteredNode::new(root, hidden),
            hint: std::rc::Rc::new(hint_ids),
            depth: 0,
        };

        HintedWalker {
            inner: Walker::new(char_index, root, method),
        }
    }
}

impl<'a, N: TrieNode> Iterator for HintedWalker<'a, N> {
    type Item = WalkerItem<FilteredNode<N>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|item| WalkerItem {
            text: item.text,
            node: item.node.inner.clone(),
            depth: item.depth,
        })
    }
}

/// Node decorator that reorders child edges by closeness to the hint: the
/// exact hint character at this depth first, characters appearing near this
/// depth next, the rest last.
#[derive(Clone)]
struct OrderedNode<N: TrieNode> {
    inner: N,
    hint: std::rc::Rc<Vec<crate::types::CharId>>,
    depth: usize,
}

impl<N: TrieNode> OrderedNode<N> {
    fn order(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.inner.size()).collect();
        indices.sort_by_key(|&i| match self.inner.char_at(i) {
            Some(ch) => self.priority(ch),
            None => u8::MAX,
        });
        indices
    }

    fn priority(&self, ch: crate::types::CharId) -> u8 {
        if self.hint.get(self.depth) == Some(&ch) {
            return 0;
        }
        let lo = self.depth.saturating_sub(2);
        let hi = (self.depth + 3).min(self.hint.len());
        if lo < hi && self.hint[lo..hi].contains(&ch) {
            return 1;
        }
        if self.hint.contains(&ch) {
            return 2;
        }
        3
    }
}

impl<N: TrieNode> TrieNode for OrderedNode<N> {
    fn id(&self) -> crate::types::NodeId {
        self.inner.id()
    }

    fn eow(&self) -> bool {
        self.inner.eow()
    }

    fn size(&self) -> usize {
        self.inner.size()
    }

    fn char_at(&self, i: usize) -> Option<crate::types::CharId> {
        let order = self.order();
        order.get(i).and_then(|&raw| self.inner.char_at(raw))
    }

    fn child(&self, i: usize) -> Option<Self> {
        let order = self.order();
        let raw = *order.get(i)?;
        self.inner.child(raw).map(|child| OrderedNode {
            inner: child,
            hint: self.hint.clone(),
            depth: self.depth + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::{TrieBuilder, TrieLexicon};

    #[test]
    fn plain_walk_visits_every_prefix() {
        let mut builder = TrieBuilder::new();
        builder.insert_all(["ab", "ac"]);

        let items: Vec<_> =
            Walker::new(builder.char_index(), builder.root(), CompoundingMethod::None)
                .map(|item| (item.text.to_string(), item.depth))
                .collect();

        assert_eq!(
            items,
            vec![
                ("a".to_string(), 1),
                ("ab".to_string(), 2),
                ("ac".to_string(), 2),
            ]
        );
    }

    #[test]
    fn compounding_splices_back_to_the_root() {
        let mut builder = TrieBuilder::new();
        builder.insert_all(["go", "ox"]);

        let walked: Vec<String> = Walker::new(
            builder.char_index(),
            builder.root(),
            CompoundingMethod::JoinWords,
        )
        .take(40)
        .filter(|item| item.node.eow())
        .map(|item| item.text.to_string())
        .collect();

        assert!(walked.contains(&"go".to_string()));
        assert!(walked.contains(&"go+go".to_string()) || walked.contains(&"go+ox".to_string()));
    }

    #[test]
    fn separate_words_uses_a_space() {
        let mut builder = TrieBuilder::new();
        builder.insert("ab");

        let walked: Vec<String> = Walker::new(
            builder.char_index(),
            builder.root(),
            CompoundingMethod::SeparateWords,
        )
        .take(12)
        .filter(|item| item.node.eow())
        .map(|item| item.text.to_string())
        .collect();

        assert!(walked.contains(&"ab ab".to_string()));
    }

    #[test]
    fn hinted_walker_prefers_the_hint_path() {
        let mut builder = TrieBuilder::new();
        builder.insert_all(["cab", "cob", "cub"]);

        let first_word = HintedWalker::new(
            builder.char_index(),
            builder.root(),
            CompoundingMethod::None,
            "cub",
        )
        .find(|item| item.node.eow())
        .map(|item| item.text.to_string());

        assert_eq!(first_word, Some("cub".to_string()));
    }

    #[test]
    fn hinted_walker_hides_control_edges() {
        let mut builder = TrieBuilder::new();
        builder.insert_all(["tip", "tip+", "!tin"]);

        let words: Vec<String> = HintedWalker::new(
            builder.char_index(),
            builder.root(),
            CompoundingMethod::None,
            "tip",
        )
        .filter(|item| item.node.eow())
        .map(|item| item.text.to_string())
        .collect();

        assert_eq!(words, vec!["tip".to_string()]);
    }
}

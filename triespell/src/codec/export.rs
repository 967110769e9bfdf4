use hashbrown::HashMap;

use super::{
    SerializeOptions, BACK, DATA_TAG, EOR, EOW, ESCAPE, MAX_REF, REF, REF_ESCAPE_CEILING, REF_SEP,
    VERSION_TAG,
};
use crate::trie::{TrieLexicon, TrieNode};
use crate::types::NodeId;

/// Serializes a lexicon into the versioned text format. Works on any node
/// representation; sharing present in the arena (a consolidated trie, the
/// common end-of-word leaf) comes out as back-references.
pub fn serialize<L: TrieLexicon>(lexicon: &L, options: &SerializeOptions) -> String {
    assert!(
        (2..=36).contains(&options.base),
        "radix {} out of range",
        options.base
    );

    let mut out = String::new();
    out.push_str(VERSION_TAG);
    out.push('\n');
    out.push_str(&format!("base={}\n", options.base));
    out.push_str(&format!("# words: {}\n", lexicon.word_count()));
    out.push_str(DATA_TAG);
    out.push('\n');

    let mut exporter = Exporter {
        lexicon,
        options,
        out,
        emitted: HashMap::new(),
        next: 0,
    };

    exporter.emit_tree(lexicon.root());
    exporter.out
}

struct Exporter<'a, L: TrieLexicon> {
    lexicon: &'a L,
    options: &'a SerializeOptions,
    out: String,
    emitted: HashMap<NodeId, u32>,
    next: u32,
}

/// One level of the depth-first walk: a node and the next edge to take.
struct Frame<N> {
    node: N,
    pos: usize,
}

impl<'a, L: TrieLexicon> Exporter<'a, L> {
    /// Emits the whole tree under `root`. Depth-first over an explicit frame
    /// stack; dictionary tries get arbitrarily deep and every other deep
    /// traversal in this crate already carries its own stack.
    fn emit_tree(&mut self, root: L::Node<'a>) {
        self.begin(&root);
        let mut stack = vec![Frame { node: root, pos: 0 }];

        while let Some(frame) = stack.last_mut() {
            let i = frame.pos;
            frame.pos += 1;

            let step = frame.node.char_at(i).zip(frame.node.child(i));
            let (ch, child) = match step {
                Some(step) => step,
                None => {
                    stack.pop();
                    if !stack.is_empty() {
                        self.out.push(BACK);
                    }
                    continue;
                }
            };

            if let Some(label) = self.lexicon.char_index().text_of(ch) {
                let label = label.to_string();
                self.emit_label(&label);
            }

            match self.emitted.get(&child.id()).copied() {
                Some(first)
                    if !(self.options.optimize_simple_references && is_simple(&child)) =>
                {
                    // A reference stands for the whole subtree and pops by
                    // itself; no explicit back step.
                    self.emit_ref(first);
                }
                _ => {
                    self.begin(&child);
                    stack.push(Frame { node: child, pos: 0 });
                }
            }
        }
    }

    /// Numbers a node and writes its end-of-word mark. The caller has
    /// already decided that this is an emission (first visit or inline
    /// re-emission), never a reference. Every emission consumes one
    /// pre-order index so the importer's numbering stays in step even when
    /// chains are re-emitted inline.
    fn begin(&mut self, node: &L::Node<'a>) {
        self.emitted.entry(node.id()).or_insert(self.next);
        self.next += 1;

        if node.eow() {
            self.out.push(EOW);
            self.maybe_break();
        }
    }

    fn emit_label(&mut self, label: &str) {
        for ch in label.chars() {
            if matches!(ch, EOW | BACK | REF | EOR | ESCAPE | '\n' | '\r') {
                self.out.push(ESCAPE);
            }
            self.out.push(ch);
        }
    }

    fn emit_ref(&mut self, index: u32) {
        assert!(
            index < MAX_REF,
            "node index {} exceeds the reference range",
            index
        );

        self.out.push(REF);
        if index < REF_ESCAPE_CEILING {
            self.push_radix(index);
        } else {
            // 7-bit continuation tokens, most significant first.
            let mut started = false;
            for shift in [14u32, 7, 0] {
                let token = (index >> shift) & 0x7f;
                if !started && token == 0 && shift != 0 {
                    continue;
                }
                if started {
                    self.out.push(REF_SEP);
                }
                self.push_radix(token);
                started = true;
            }
        }
        self.out.push(EOR);
        self.maybe_break();
    }

    fn push_radix(&mut self, value: u32) {
        let base = self.options.base;
        let mut digits = [0u8; 32];
        let mut len = 0;
        let mut v = value;

        loop {
            digits[len] = (v % base) as u8;
            len += 1;
            v /= base;
            if v == 0 {
                break;
            }
        }

        for &d in digits[..len].iter().rev() {
            if let Some(ch) = char::from_digit(d as u32, base) {
                self.out.push(ch);
            }
        }
    }

    fn maybe_break(&mut self) {
        if self.options.add_line_breaks_to_improve_diffs {
            self.out.push('\n');
        }
    }
}

fn is_simple<N: TrieNode>(node: &N) -> bool {
    !node.eow() && node.size() == 1
}

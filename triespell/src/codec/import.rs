use super::{
    DecodeError, BACK, DATA_TAG, DEFAULT_RADIX, EOR, EOW, ESCAPE, REF, REF_SEP, VERSION_TAG,
};
use crate::trie::TrieBuilder;

/// Parses a complete serialized trie in one call.
pub fn import(text: &str) -> Result<TrieBuilder, DecodeError> {
    let mut decoder = Decoder::new();
    decoder.feed(text)?;
    decoder.finish()
}

/// Parses a serialized trie arriving in arbitrary pieces. Chunk boundaries
/// may fall anywhere, including inside an escape sequence or a reference
/// token.
pub fn import_chunks<I, S>(chunks: I) -> Result<TrieBuilder, DecodeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut decoder = Decoder::new();
    for chunk in chunks {
        decoder.feed(chunk.as_ref())?;
    }
    decoder.finish()
}

/// Incremental decoder. All parse state lives in the struct, so `feed` can
/// be called with any split of the input; `finish` checks that the stream
/// ended on a structural boundary.
pub struct Decoder {
    phase: Phase,
    line: usize,
}

enum Phase {
    Header { buf: String, radix: u32, version_seen: bool },
    Data(DataState),
    Failed,
}

struct DataState {
    builder: TrieBuilder,
    radix: u32,
    /// Path from the root to the node currently being filled in.
    stack: Vec<u32>,
    /// Pre-order emission index to arena node, used to resolve references.
    order: Vec<u32>,
    escape: bool,
    ref_acc: Option<RefAccumulator>,
}

/// A partially read `#…;` token.
struct RefAccumulator {
    digits: String,
    acc: u64,
    byte_mode: bool,
}

impl Decoder {
    pub fn new() -> Decoder {
        Decoder {
            phase: Phase::Header {
                buf: String::new(),
                radix: DEFAULT_RADIX,
                version_seen: false,
            },
            line: 1,
        }
    }

    pub fn feed(&mut self, chunk: &str) -> Result<(), DecodeError> {
        for ch in chunk.chars() {
            if let Err(err) = self.step(ch) {
                self.phase = Phase::Failed;
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<TrieBuilder, DecodeError> {
        let line = self.line;
        match self.phase {
            Phase::Data(state) => {
                if state.escape || state.ref_acc.is_some() || state.stack.len() != 1 {
                    return Err(DecodeError::TruncatedStream { line });
                }
                let mut builder = state.builder;
                // An end-of-word mark only appears on a node's first
                // emission; shared terminals are referenced afterwards, so
                // the word count has to come from a walk, not from counting
                // marks.
                builder.words = crate::trie::words(&builder).count();
                Ok(builder)
            }
            Phase::Header { .. } | Phase::Failed => Err(DecodeError::TruncatedStream { line }),
        }
    }

    fn step(&mut self, ch: char) -> Result<(), DecodeError> {
        match &mut self.phase {
            Phase::Header { buf, .. } => {
                if ch == '\n' {
                    self.header_line()?;
                    self.line += 1;
                } else {
                    buf.push(ch);
                }
                Ok(())
            }
            Phase::Data(_) => self.data_char(ch),
            Phase::Failed => Err(DecodeError::TruncatedStream { line: self.line }),
        }
    }

    fn header_line(&mut self) -> Result<(), DecodeError> {
        let line = self.line;
        let (buf, radix, version_seen) = match &mut self.phase {
            Phase::Header { buf, radix, version_seen } => (buf, radix, version_seen),
            _ => unreachable!(),
        };

        let text = buf.trim_end_matches('\r').to_string();
        buf.clear();

        if !*version_seen {
            if text == VERSION_TAG {
                *version_seen = true;
                return Ok(());
            }
            return Err(DecodeError::UnsupportedVersion { line, found: text });
        }

        if text == DATA_TAG {
            let radix = *radix;
            self.phase = Phase::Data(DataState {
                builder: TrieBuilder::new(),
                radix,
                stack: vec![crate::trie::ROOT],
                order: vec![crate::trie::ROOT],
                escape: false,
                ref_acc: None,
            });
            return Ok(());
        }

        if text.is_empty() || text.starts_with('#') {
            return Ok(());
        }

        if let Some(value) = text.strip_prefix("base=") {
            match value.trim().parse::<u32>() {
                Ok(base) if (2..=36).contains(&base) => {
                    *radix = base;
                    return Ok(());
                }
                _ => {
                    return Err(DecodeError::InvalidRadix {
                        line,
                        found: value.to_string(),
                    })
                }
            }
        }

        Err(DecodeError::UnexpectedHeaderLine { line, found: text })
    }

    fn data_char(&mut self, ch: char) -> Result<(), DecodeError> {
        let line = self.line;
        let state = match &mut self.phase {
            Phase::Data(state) => state,
            _ => unreachable!(),
        };

        if state.escape {
            state.escape = false;
            return state.add_edge(ch, line);
        }

        if state.ref_acc.is_some() {
            return state.ref_char(ch, line);
        }

        match ch {
            '\n' => {
                self.line += 1;
                Ok(())
            }
            '\r' => Ok(()),
            ESCAPE => {
                state.escape = true;
                Ok(())
            }
            EOW => {
                let top = *state.stack.last().unwrap_or(&crate::trie::ROOT);
                state.builder.set_eow(top);
                Ok(())
            }
            BACK => {
                if state.stack.len() <= 1 {
                    return Err(DecodeError::UnexpectedCharacter { line, ch });
                }
                state.stack.pop();
                Ok(())
            }
            REF => {
                state.ref_acc = Some(RefAccumulator {
                    digits: String::new(),
                    acc: 0,
                    byte_mode: false,
                });
                Ok(())
            }
            _ => state.add_edge(ch, line),
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Decoder::new()
    }
}

impl DataState {
    fn add_edge(&mut self, ch: char, line: usize) -> Result<(), DecodeError> {
        let mut buf = [0u8; 4];
        let id = self.builder.char_index.get_or_insert(ch.encode_utf8(&mut buf));
        assert!(
            (id as u32) <= self.builder.layout.char_mask,
            "char id {} exceeds the char-index mask",
            id
        );

        let parent = *self.stack.last().unwrap_or(&crate::trie::ROOT);

        // A well-formed stream never walks the same edge of one node twice;
        // a duplicate would leave the arena with two entries for one char.
        let layout = self.builder.layout;
        let duplicate = self.builder.nodes[parent as usize][1..]
            .iter()
            .any(|&entry| layout.entry_char(entry) == id);
        if duplicate {
            return Err(DecodeError::DuplicateEdge { line, ch });
        }

        let child = self.builder.alloc(false);
        self.builder.add_entry(parent, id, child);
        self.stack.push(child);
        self.order.push(child);
        Ok(())
    }

    fn ref_char(&mut self, ch: char, line: usize) -> Result<(), DecodeError> {
        let acc = self.ref_acc.as_mut().unwrap_or_else(|| unreachable!());

        match ch {
            REF_SEP => {
                let token = parse_token(&acc.digits, self.radix, line)?;
                acc.acc = acc.acc * 128 + token;
                acc.digits.clear();
                acc.byte_mode = true;
                Ok(())
            }
            EOR => {
                let token = parse_token(&acc.digits, self.radix, line)?;
                let value = if acc.byte_mode {
                    acc.acc * 128 + token
                } else {
                    token
                };
                self.ref_acc = None;
                self.apply_ref(value, line)
            }
            _ if ch.is_ascii_alphanumeric() => {
                acc.digits.push(ch);
                Ok(())
            }
            _ => Err(DecodeError::UnexpectedCharacter { line, ch }),
        }
    }

    /// Replaces the freshly attached child with an already imported node.
    /// The exporter emits a reference directly after the edge character, so
    /// the node on top of the stack must be the most recent allocation and
    /// still empty.
    fn apply_ref(&mut self, value: u64, line: usize) -> Result<(), DecodeError> {
        if self.stack.len() <= 1 {
            return Err(DecodeError::MisplacedReference { line });
        }

        let fresh = self.stack.pop().unwrap_or_else(|| unreachable!());
        let is_last = fresh as usize + 1 == self.builder.node_count();
        let is_empty = {
            let node = &self.builder.nodes[fresh as usize];
            node.len() == 1 && !self.builder.layout.info_eow(node[0])
        };
        if !is_last || !is_empty || self.order.last() != Some(&fresh) {
            return Err(DecodeError::MisplacedReference { line });
        }

        // The reference does not consume an emission index.
        self.order.pop();
        self.builder.pop_last_node();

        let target = match self.order.get(value as usize) {
            Some(&target) => target,
            None => return Err(DecodeError::BadReference { line, index: value }),
        };

        let parent = *self.stack.last().unwrap_or(&crate::trie::ROOT);
        self.builder.repoint_last_entry(parent, target);
        // The arena now holds a node reachable through more than one path;
        // from here on an insert could mutate a shared node, so the builder
        // is locked the same way a consolidated trie is.
        self.builder.consolidated = true;
        Ok(())
    }
}

fn parse_token(digits: &str, radix: u32, line: usize) -> Result<u64, DecodeError> {
    if digits.is_empty() {
        return Err(DecodeError::BadNumber {
            line,
            token: digits.to_string(),
        });
    }
    u64::from_str_radix(digits, radix).map_err(|_| DecodeError::BadNumber {
        line,
        token: digits.to_string(),
    })
}

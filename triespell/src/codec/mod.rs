//! Versioned text serialization of the trie.
//!
//! The format (`TrieXv3`) is a short header followed by a depth-first
//! character stream: literal characters descend one edge, `$` marks an
//! end-of-word, `<` backs up one level and `#…;` attaches an already
//! emitted node by its pre-order index, which is how DAWG sharing survives
//! a round trip. External callers should treat the whole thing as an
//! opaque, version-tagged blob.

mod export;
mod import;

pub use self::export::serialize;
pub use self::import::{import, import_chunks, Decoder};

use thiserror::Error;

pub(crate) const VERSION_TAG: &str = "TrieXv3";
pub(crate) const DATA_TAG: &str = "__DATA__";

pub(crate) const EOW: char = '$';
pub(crate) const BACK: char = '<';
pub(crate) const REF: char = '#';
pub(crate) const EOR: char = ';';
pub(crate) const REF_SEP: char = '.';
pub(crate) const ESCAPE: char = '\\';

/// References below this ceiling are a single base-N token; larger ones are
/// escaped into up to three 7-bit tokens.
pub(crate) const REF_ESCAPE_CEILING: u32 = 1 << 7;
pub(crate) const MAX_REF: u32 = 1 << 21;

pub const DEFAULT_RADIX: u32 = 32;

/// Knobs of the exporter.
#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Radix of the integer tokens, 2–36.
    pub base: u32,
    /// Insert cosmetic newlines so dictionary diffs stay small in version
    /// control. Purely cosmetic; the importer skips line breaks.
    pub add_line_breaks_to_improve_diffs: bool,
    /// Re-emit single-child chains inline instead of referencing them.
    pub optimize_simple_references: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        SerializeOptions {
            base: DEFAULT_RADIX,
            add_line_breaks_to_improve_diffs: true,
            optimize_simple_references: false,
        }
    }
}

/// Fatal, non-recoverable import failures. A trie that failed to parse must
/// never be queried.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("line {line}: expected `{VERSION_TAG}` header, found {found:?}")]
    UnsupportedVersion { line: usize, found: String },

    #[error("line {line}: invalid radix {found:?}, expected 2-36")]
    InvalidRadix { line: usize, found: String },

    #[error("line {line}: unexpected header line {found:?}")]
    UnexpectedHeaderLine { line: usize, found: String },

    #[error("line {line}: unexpected character {ch:?} in data stream")]
    UnexpectedCharacter { line: usize, ch: char },

    #[error("line {line}: duplicate edge {ch:?} out of one node")]
    DuplicateEdge { line: usize, ch: char },

    #[error("line {line}: bad integer token {token:?}")]
    BadNumber { line: usize, token: String },

    #[error("line {line}: reference to undefined node index {index}")]
    BadReference { line: usize, index: u64 },

    #[error("line {line}: reference does not directly follow an edge character")]
    MisplacedReference { line: usize },

    #[error("line {line}: serialized stream ended mid-structure")]
    TruncatedStream { line: usize },
}

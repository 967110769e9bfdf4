//! Bidirectional, normalization-aware mapping between substrings and ids.

use hashbrown::HashMap;
use smol_str::SmolStr;
use unicode_normalization::UnicodeNormalization;

use crate::types::CharId;

/// Ordered list of canonical substrings with a reverse lookup table.
///
/// Index 0 is reserved for "no character". Both the NFC and the NFD
/// normalization of a substring resolve to the same id, so composed and
/// decomposed accented forms are interchangeable. Ids are stable and only
/// grow; nothing is ever removed.
#[derive(Debug, Clone)]
pub struct CharIndex {
    texts: Vec<SmolStr>,
    lookup: HashMap<SmolStr, CharId>,
}

impl CharIndex {
    pub fn new() -> CharIndex {
        CharIndex {
            texts: vec![SmolStr::new("")],
            lookup: HashMap::new(),
        }
    }

    /// Number of known substrings, including the reserved id 0.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.texts.len() <= 1
    }

    /// Resolves `text` to its id, registering a new id if it is unknown.
    pub fn get_or_insert(&mut self, text: &str) -> CharId {
        let nfc: SmolStr = text.nfc().collect();

        if let Some(&id) = self.lookup.get(nfc.as_str()) {
            return id;
        }

        let id = self.texts.len() as CharId;
        self.texts.push(nfc.clone());
        self.lookup.insert(nfc.clone(), id);

        let nfd: SmolStr = text.nfd().collect();
        if nfd != nfc {
            self.lookup.entry(nfd).or_insert(id);
        }

        id
    }

    /// Resolves `text` to an id without registering anything.
    pub fn resolve(&self, text: &str) -> Option<CharId> {
        if let Some(&id) = self.lookup.get(text) {
            return Some(id);
        }

        let nfc: SmolStr = text.nfc().collect();
        self.lookup.get(nfc.as_str()).copied()
    }

    /// The canonical (NFC) text of `id`.
    pub fn text_of(&self, id: CharId) -> Option<&str> {
        self.texts.get(id as usize).map(|s| s.as_str())
    }
}

impl Default for CharIndex {
    fn default() -> Self {
        CharIndex::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable_and_grow() {
        let mut ci = CharIndex::new();
        let a = ci.get_or_insert("a");
        let b = ci.get_or_insert("b");
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(ci.get_or_insert("a"), a);
        assert_eq!(ci.len(), 3);
    }

    #[test]
    fn nfc_and_nfd_share_an_id() {
        let mut ci = CharIndex::new();
        // "ä" composed vs "a" + combining diaeresis
        let composed = ci.get_or_insert("\u{00e4}");
        assert_eq!(ci.resolve("a\u{0308}"), Some(composed));
        assert_eq!(ci.text_of(composed), Some("\u{00e4}"));
    }

    #[test]
    fn unknown_resolves_to_none() {
        let ci = CharIndex::new();
        assert_eq!(ci.resolve("x"), None);
        assert_eq!(ci.text_of(0), Some(""));
    }
}

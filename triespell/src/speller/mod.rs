//! Suggestion search over a frozen lexicon.

pub mod suggestion;
mod worker;

pub use self::suggestion::Suggestion;

use std::time::Duration;

use hashbrown::HashSet;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use unicode_normalization::UnicodeNormalization;

use crate::constants::{
    ACCENT_COST, BASE_COST, CAPS_COST, FIRST_LETTER_BIAS, NON_ALPHABET_COST, SWAP_COST,
    WORD_BREAK_COST,
};
use crate::trie::{CompoundingMethod, TrieLexicon};
use crate::types::Cost;
use crate::weights::WeightMap;

use self::worker::SuggestWorker;

/// Upper bound on each memoized word set; beyond it, new results are simply
/// not cached. Losing an entry costs speed, never correctness.
const MEMO_CAP: usize = 1 << 16;

/// Flat edit costs used where no weighted map entry applies. Product-tuning
/// values, deliberately configuration rather than structural invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditCosts {
    /// One full edit.
    pub base: Cost,
    /// Transposing two adjacent characters.
    pub swap: Cost,
    /// Substituting a character for the same base letter with different
    /// diacritics.
    pub accent: Cost,
    /// Substituting a character for the same letter in different case. Only
    /// applied when `ignore_case` is set.
    pub caps: Cost,
    /// Extra penalty for substituting the first letter of the word.
    pub first_letter_bias: Cost,
    /// Inserting or substituting a non-letter character.
    pub non_alphabet: Cost,
    /// Splicing from one dictionary word into the next while compounding.
    pub word_break: Cost,
}

impl Default for EditCosts {
    fn default() -> Self {
        EditCosts {
            base: BASE_COST,
            swap: SWAP_COST,
            accent: ACCENT_COST,
            caps: CAPS_COST,
            first_letter_bias: FIRST_LETTER_BIAS,
            non_alphabet: NON_ALPHABET_COST,
            word_break: WORD_BREAK_COST,
        }
    }
}

/// Search configuration. The defaults are what interactive spell checking
/// wants; batch consumers usually drop the timeout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpellerConfig {
    /// Maximum number of results.
    pub num_suggestions: usize,
    /// Maximum whole edits per candidate, clamped to 1..=5.
    pub change_limit: usize,
    pub compound_method: CompoundingMethod,
    /// Treat case differences as a near-zero-cost edit.
    pub ignore_case: bool,
    /// Cooperative wall-clock budget, sampled between heap pops. `None`
    /// searches to exhaustion.
    pub timeout: Option<Duration>,
    pub costs: EditCosts,
}

impl Default for SpellerConfig {
    fn default() -> Self {
        SpellerConfig {
            num_suggestions: 10,
            change_limit: 3,
            compound_method: CompoundingMethod::None,
            ignore_case: false,
            timeout: Some(Duration::from_millis(500)),
            costs: EditCosts::default(),
        }
    }
}

/// The query surface a dictionary layer talks to.
pub trait Speller {
    fn has(&self, word: &str) -> bool;

    fn suggest(&self, word: &str) -> Vec<Suggestion> {
        self.suggest_with_config(word, &SpellerConfig::default())
    }

    fn suggest_with_config(&self, word: &str, config: &SpellerConfig) -> Vec<Suggestion>;
}

/// Speller over one frozen lexicon, with best-effort `has` memoization.
pub struct TrieSpeller<L: TrieLexicon> {
    lexicon: L,
    weights: Option<WeightMap>,
    known: RwLock<HashSet<SmolStr>>,
    unknown: RwLock<HashSet<SmolStr>>,
}

impl<L: TrieLexicon> TrieSpeller<L> {
    pub fn new(lexicon: L) -> TrieSpeller<L> {
        TrieSpeller {
            lexicon,
            weights: None,
            known: RwLock::new(HashSet::new()),
            unknown: RwLock::new(HashSet::new()),
        }
    }

    pub fn with_weights(lexicon: L, weights: WeightMap) -> TrieSpeller<L> {
        TrieSpeller {
            lexicon,
            weights: Some(weights),
            known: RwLock::new(HashSet::new()),
            unknown: RwLock::new(HashSet::new()),
        }
    }

    pub fn lexicon(&self) -> &L {
        &self.lexicon
    }

    pub fn weights(&self) -> Option<&WeightMap> {
        self.weights.as_ref()
    }

    /// Lazy, restartable sequence of all dictionary words, markers included.
    pub fn words(&self) -> impl Iterator<Item = SmolStr> + '_ {
        crate::trie::words(&self.lexicon)
    }

    fn memoize(&self, word: &str, known: bool) {
        let cache = if known { &self.known } else { &self.unknown };
        let mut cache = cache.write();
        if cache.len() < MEMO_CAP {
            cache.insert(SmolStr::new(word));
        }
    }
}

impl<L: TrieLexicon> Speller for TrieSpeller<L> {
    fn has(&self, word: &str) -> bool {
        if self.known.read().contains(word) {
            return true;
        }
        if self.unknown.read().contains(word) {
            return false;
        }

        let known = self.lexicon.has(word);
        self.memoize(word, known);
        known
    }

    fn suggest_with_config(&self, word: &str, config: &SpellerConfig) -> Vec<Suggestion> {
        let input: Vec<char> = word.trim().nfc().collect();
        if input.is_empty() {
            return vec![];
        }

        log::trace!("suggest {:?} with {:?}", word, config);
        SuggestWorker::new(&self.lexicon, self.weights.as_ref(), input, config).run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trie::TrieBuilder;

    fn speller(words: &[&str]) -> TrieSpeller<crate::trie::TrieBlob> {
        let mut builder = TrieBuilder::new();
        builder.insert_all(words);
        TrieSpeller::new(builder.freeze())
    }

    #[test]
    fn has_is_memoized_and_stable() {
        let speller = speller(&["walk", "walks"]);
        for _ in 0..3 {
            assert!(speller.has("walk"));
            assert!(!speller.has("wolk"));
        }
        assert!(speller.known.read().contains("walk"));
        assert!(speller.unknown.read().contains("wolk"));
    }

    #[test]
    fn empty_input_suggests_nothing() {
        let speller = speller(&["walk"]);
        assert!(speller.suggest("").is_empty());
        assert!(speller.suggest("   ").is_empty());
    }

    #[test]
    fn exact_match_comes_first_at_cost_zero() {
        let speller = speller(&["walk", "walks", "talk"]);
        let suggestions = speller.suggest("walk");
        assert_eq!(suggestions[0].word(), "walk");
        assert_eq!(suggestions[0].cost(), 0);
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = SpellerConfig {
            num_suggestions: 3,
            ignore_case: true,
            ..SpellerConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SpellerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

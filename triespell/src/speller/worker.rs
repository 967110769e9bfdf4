//! Best-first suggestion search.

use std::cmp::Ordering;
use std::time::Instant;

use hashbrown::HashMap;
use smol_str::SmolStr;

use super::{SpellerConfig, Suggestion};
use crate::heap::Heap;
use crate::trie::{control_char_ids, CompoundingMethod, FilteredNode, TrieLexicon, TrieNode};
use crate::types::{CharId, Cost};
use crate::weights::WeightMap;

type StateNode<'a, L> = FilteredNode<<L as TrieLexicon>::Node<'a>>;

/// One search state: a trie position, an input position and the text built
/// so far. `seq` is the discovery order, the deterministic tie-breaker.
struct SearchNode<N> {
    cost: Cost,
    seq: u64,
    node: N,
    pos: usize,
    text: String,
}

fn compare<N>(a: &SearchNode<N>, b: &SearchNode<N>) -> Ordering {
    a.cost.cmp(&b.cost).then_with(|| a.seq.cmp(&b.seq))
}

/// Min-priority frontier with the cost budget built in. States over budget
/// are discarded at the door; the budget only ever tightens, so anything
/// already queued that later falls out of budget is caught at pop time.
struct Frontier<N: TrieNode> {
    heap: Heap<SearchNode<N>, fn(&SearchNode<N>, &SearchNode<N>) -> Ordering>,
    seq: u64,
    limit: Cost,
}

impl<N: TrieNode> Frontier<N> {
    fn new(limit: Cost) -> Frontier<N> {
        Frontier {
            heap: Heap::new(compare::<N> as fn(&SearchNode<N>, &SearchNode<N>) -> Ordering),
            seq: 0,
            limit,
        }
    }

    fn push(&mut self, cost: Cost, node: N, pos: usize, text: String) {
        let state = SearchNode {
            cost,
            seq: self.seq,
            node,
            pos,
            text,
        };
        self.seq += 1;
        if cost <= self.limit {
            self.heap.push(state);
        }
    }

    fn pop(&mut self) -> Option<SearchNode<N>> {
        self.heap.pop()
    }
}

struct Correction {
    cost: Cost,
    seq: u64,
    compound: Option<SmolStr>,
}

pub(crate) struct SuggestWorker<'a, L: TrieLexicon> {
    lexicon: &'a L,
    weights: Option<&'a WeightMap>,
    input: Vec<char>,
    input_ids: Vec<Option<CharId>>,
    config: &'a SpellerConfig,
}

impl<'a, L: TrieLexicon> SuggestWorker<'a, L> {
    pub(crate) fn new(
        lexicon: &'a L,
        weights: Option<&'a WeightMap>,
        input: Vec<char>,
        config: &'a SpellerConfig,
    ) -> SuggestWorker<'a, L> {
        let mut buf = [0u8; 4];
        let input_ids = input
            .iter()
            .map(|ch| lexicon.char_index().resolve(ch.encode_utf8(&mut buf)))
            .collect();

        SuggestWorker {
            lexicon,
            weights,
            input,
            input_ids,
            config,
        }
    }

    pub(crate) fn run(self) -> Vec<Suggestion> {
        // A zero result cap is well-formed; there is nothing to search for.
        if self.config.num_suggestions == 0 {
            return vec![];
        }

        let costs = &self.config.costs;
        let change_limit = self.config.change_limit.clamp(1, 5) as Cost;

        // The budget is whole edits up to the change limit, but never more
        // than one edit per two input characters; short inputs get a
        // proportionally short leash.
        let limit = (costs.base * change_limit).min(costs.base * self.input.len() as Cost / 2);

        let root: StateNode<'a, L> = FilteredNode::new(
            self.lexicon.root(),
            control_char_ids(self.lexicon.char_index()),
        );
        let join = self.config.compound_method.join_char();

        let mut frontier = Frontier::new(limit);
        frontier.push(0, root.clone(), 0, String::new());

        let deadline = self.config.timeout.map(|t| Instant::now() + t);
        let mut corrections: HashMap<SmolStr, Correction> = HashMap::new();

        while let Some(state) = frontier.pop() {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    log::trace!("suggestion search timed out after {} states", state.seq);
                    break;
                }
            }

            // Pops are monotone in cost; the whole frontier is out of budget.
            if state.cost > frontier.limit {
                break;
            }

            if state.pos == self.input.len() && state.node.eow() && !state.text.is_empty() {
                self.record(&mut corrections, &state, join);
                if corrections.len() >= self.config.num_suggestions {
                    frontier.limit = frontier.limit.min(self.worst_kept(&corrections));
                }
            }

            let pos = state.pos;
            let next_input_id = self.input_ids.get(pos).copied().flatten();

            for (ch, child) in state.node.entries() {
                let label = match self.lexicon.char_index().text_of(ch) {
                    Some(label) => label.to_string(),
                    None => continue,
                };
                let label_ch = match label.chars().next() {
                    Some(label_ch) => label_ch,
                    None => continue,
                };

                // Insertion of a trie character the input does not have.
                frontier.push(
                    state.cost + self.ins_or_del_cost(label_ch),
                    child.clone(),
                    pos,
                    format!("{}{}", state.text, label),
                );

                if pos < self.input.len() {
                    let step = if next_input_id == Some(ch) {
                        0
                    } else {
                        self.replace_cost(self.input[pos], label_ch, pos)
                    };
                    frontier.push(
                        state.cost + step,
                        child,
                        pos + 1,
                        format!("{}{}", state.text, label),
                    );
                }
            }

            if pos < self.input.len() {
                // Deletion of the current input character.
                frontier.push(
                    state.cost + self.ins_or_del_cost(self.input[pos]),
                    state.node.clone(),
                    pos + 1,
                    state.text.clone(),
                );
            }

            // Transposition of two adjacent input characters, both present
            // as trie edges in swapped order.
            if pos + 1 < self.input.len() && self.input[pos] != self.input[pos + 1] {
                if let (Some(a), Some(b)) = (self.input_ids[pos], self.input_ids[pos + 1]) {
                    if let Some(swapped) = state.node.get(b).and_then(|n| n.get(a)) {
                        frontier.push(
                            state.cost + costs.swap,
                            swapped,
                            pos + 2,
                            format!("{}{}{}", state.text, self.input[pos + 1], self.input[pos]),
                        );
                    }
                }
            }

            if let Some(weights) = self.weights {
                self.expand_weighted(weights, &state, &mut frontier);
            }

            // Compound splice: an end-of-word mid-input may continue as a
            // fresh dictionary word from the root.
            if let Some(join) = join {
                if state.node.eow()
                    && pos > 0
                    && pos < self.input.len()
                    && !state.text.is_empty()
                    && !state.text.ends_with(join)
                {
                    frontier.push(
                        state.cost + costs.word_break,
                        root.clone(),
                        pos,
                        format!("{}{}", state.text, join),
                    );
                }
            }
        }

        self.finalize(corrections)
    }

    fn expand_weighted(
        &self,
        weights: &WeightMap,
        state: &SearchNode<StateNode<'a, L>>,
        frontier: &mut Frontier<StateNode<'a, L>>,
    ) {
        let pos = state.pos;

        // Weighted deletion of a whole class member from the input.
        for (len, cost) in weights.ins_del_costs(&self.input, pos) {
            frontier.push(
                state.cost + cost,
                state.node.clone(),
                pos + len,
                state.text.clone(),
            );
        }

        // Weighted insertion of a class member present in the trie.
        for (member, cost) in weights.insertions() {
            if let Some(dest) = self.walk_str(&state.node, member) {
                frontier.push(
                    state.cost + cost,
                    dest,
                    pos,
                    format!("{}{}", state.text, member),
                );
            }
        }

        for (len, replacement, cost) in weights.replacements(&self.input, pos) {
            if let Some(dest) = self.walk_str(&state.node, &replacement) {
                frontier.push(
                    state.cost + cost,
                    dest,
                    pos + len,
                    format!("{}{}", state.text, replacement),
                );
            }
        }

        for (len, swapped, cost) in weights.swaps(&self.input, pos) {
            if let Some(dest) = self.walk_str(&state.node, &swapped) {
                frontier.push(
                    state.cost + cost,
                    dest,
                    pos + len,
                    format!("{}{}", state.text, swapped),
                );
            }
        }
    }

    fn walk_str(&self, node: &StateNode<'a, L>, text: &str) -> Option<StateNode<'a, L>> {
        let mut buf = [0u8; 4];
        let mut node = node.clone();
        for ch in text.chars() {
            let id = self.lexicon.char_index().resolve(ch.encode_utf8(&mut buf))?;
            node = node.get(id)?;
        }
        Some(node)
    }

    fn record(
        &self,
        corrections: &mut HashMap<SmolStr, Correction>,
        state: &SearchNode<StateNode<'a, L>>,
        join: Option<char>,
    ) {
        let (word, compound) = match join {
            Some(join) if state.text.contains(join) => {
                let compound = SmolStr::new(&state.text);
                let word = match self.config.compound_method {
                    CompoundingMethod::JoinWords => {
                        SmolStr::new(state.text.chars().filter(|&c| c != join).collect::<String>())
                    }
                    _ => compound.clone(),
                };
                (word, Some(compound))
            }
            _ => (SmolStr::new(&state.text), None),
        };

        match corrections.get_mut(&word) {
            Some(existing) => {
                if state.cost < existing.cost {
                    existing.cost = state.cost;
                    existing.seq = state.seq;
                    existing.compound = compound;
                }
            }
            None => {
                corrections.insert(
                    word,
                    Correction {
                        cost: state.cost,
                        seq: state.seq,
                        compound,
                    },
                );
            }
        }
    }

    /// Cost of the candidate currently holding the last kept slot.
    fn worst_kept(&self, corrections: &HashMap<SmolStr, Correction>) -> Cost {
        let mut costs: Vec<Cost> = corrections.values().map(|c| c.cost).collect();
        costs.sort_unstable();
        costs[self.config.num_suggestions - 1]
    }

    fn finalize(&self, corrections: HashMap<SmolStr, Correction>) -> Vec<Suggestion> {
        let mut ranked: Vec<(Cost, u64, Suggestion)> = corrections
            .into_iter()
            .map(|(word, correction)| {
                let mut suggestion = Suggestion::new(word, correction.cost);
                suggestion.compound_word = correction.compound;
                (correction.cost, correction.seq, suggestion)
            })
            .collect();

        ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        ranked.truncate(self.config.num_suggestions);
        ranked.into_iter().map(|(_, _, s)| s).collect()
    }

    fn ins_or_del_cost(&self, ch: char) -> Cost {
        if is_letter(ch) {
            self.config.costs.base
        } else {
            self.config.costs.non_alphabet
        }
    }

    fn replace_cost(&self, from: char, to: char, pos: usize) -> Cost {
        let costs = &self.config.costs;

        if base_char(from) == base_char(to) {
            return costs.accent;
        }

        if self.config.ignore_case {
            if from.to_lowercase().eq(to.to_lowercase()) {
                return costs.caps;
            }
            if base_char(from).to_lowercase().eq(base_char(to).to_lowercase()) {
                return costs.accent + costs.caps;
            }
        }

        if !is_letter(from) || !is_letter(to) {
            return costs.non_alphabet;
        }

        costs.base + if pos == 0 { costs.first_letter_bias } else { 0 }
    }
}

fn is_letter(ch: char) -> bool {
    unic_ucd_category::GeneralCategory::of(ch).is_letter()
}

/// The first character of the canonical decomposition, i.e. the letter with
/// its diacritics stripped.
fn base_char(ch: char) -> char {
    let mut first = None;
    unicode_normalization::char::decompose_canonical(ch, |c| {
        if first.is_none() {
            first = Some(c);
        }
    });
    first.unwrap_or(ch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speller::{Speller, SpellerConfig, TrieSpeller};
    use crate::trie::{TrieBlob, TrieBuilder};

    fn blob(words: &[&str]) -> TrieBlob {
        let mut builder = TrieBuilder::new();
        builder.insert_all(words);
        builder.freeze()
    }

    fn words(suggestions: &[Suggestion]) -> Vec<&str> {
        suggestions.iter().map(|s| s.word()).collect()
    }

    #[test]
    fn single_deletion_and_insertion() {
        let speller = TrieSpeller::new(blob(&["talk", "talks"]));

        let from_long = speller.suggest("talks");
        assert_eq!(words(&from_long), vec!["talks", "talk"]);
        assert_eq!(from_long[1].cost(), 100);

        let from_short = speller.suggest("tallk");
        assert_eq!(words(&from_short)[0], "talk");
        assert_eq!(from_short[0].cost(), 100);
    }

    #[test]
    fn first_letter_substitution_costs_extra() {
        let speller = TrieSpeller::new(blob(&["walks", "talka"]));
        let suggestions = speller.suggest("talks");

        let walks = suggestions.iter().find(|s| s.word() == "walks").unwrap();
        let talka = suggestions.iter().find(|s| s.word() == "talka").unwrap();
        assert_eq!(walks.cost(), 125);
        assert_eq!(talka.cost(), 100);
    }

    #[test]
    fn accent_difference_is_nearly_free() {
        let speller = TrieSpeller::new(blob(&["k\u{00e4}se"]));
        let suggestions = speller.suggest("kase");
        assert_eq!(words(&suggestions), vec!["k\u{00e4}se"]);
        assert_eq!(suggestions[0].cost(), 1);
    }

    #[test]
    fn case_difference_needs_ignore_case() {
        let speller = TrieSpeller::new(blob(&["Tokyo"]));

        let strict = speller.suggest("tokyo");
        assert!(strict.iter().all(|s| s.cost() >= 100));

        let config = SpellerConfig {
            ignore_case: true,
            ..SpellerConfig::default()
        };
        let relaxed = speller.suggest_with_config("tokyo", &config);
        assert_eq!(relaxed[0].word(), "Tokyo");
        assert_eq!(relaxed[0].cost(), 1);
    }

    #[test]
    fn transposition_is_cheaper_than_two_edits() {
        let speller = TrieSpeller::new(blob(&["weird"]));
        let suggestions = speller.suggest("wierd");
        assert_eq!(suggestions[0].word(), "weird");
        assert_eq!(suggestions[0].cost(), 75);
    }

    #[test]
    fn results_never_exceed_num_suggestions() {
        let speller = TrieSpeller::new(blob(&[
            "talk", "talks", "talked", "talker", "tale", "tales", "tall", "task", "tusk",
            "walk", "walks",
        ]));
        let config = SpellerConfig {
            num_suggestions: 3,
            ..SpellerConfig::default()
        };
        let suggestions = speller.suggest_with_config("talk", &config);
        assert!(suggestions.len() <= 3);
        assert_eq!(suggestions[0].word(), "talk");
    }

    #[test]
    fn larger_change_limit_never_shrinks_the_result_set() {
        let speller = TrieSpeller::new(blob(&["walk", "walks", "walked", "walker", "walking"]));

        let mut previous: Vec<String> = vec![];
        for change_limit in 1..=5 {
            let config = SpellerConfig {
                change_limit,
                timeout: None,
                ..SpellerConfig::default()
            };
            let now: Vec<String> = speller
                .suggest_with_config("walkng", &config)
                .iter()
                .map(|s| s.word().to_string())
                .collect();
            for word in &previous {
                assert!(now.contains(word), "{} lost at limit {}", word, change_limit);
            }
            previous = now;
        }
    }

    #[test]
    fn repeated_queries_are_deterministic() {
        let speller = TrieSpeller::new(blob(&[
            "walk", "walks", "walked", "talk", "talks", "talked",
        ]));
        let first = speller.suggest("welks");
        for _ in 0..5 {
            assert_eq!(speller.suggest("welks"), first);
        }
    }

    #[test]
    fn zero_result_cap_returns_nothing() {
        let speller = TrieSpeller::new(blob(&["walk", "walks"]));
        let config = SpellerConfig {
            num_suggestions: 0,
            ..SpellerConfig::default()
        };
        assert!(speller.suggest_with_config("walk", &config).is_empty());
    }

    #[test]
    fn zero_timeout_yields_partial_results_not_errors() {
        let speller = TrieSpeller::new(blob(&["walk", "walks"]));
        let config = SpellerConfig {
            timeout: Some(std::time::Duration::ZERO),
            ..SpellerConfig::default()
        };
        assert!(speller.suggest_with_config("walk", &config).is_empty());
    }
}

//! End-to-end scenarios over a small English dictionary.

use triespell::codec::{import, serialize, SerializeOptions};
use triespell::parse::parse_dictionary_lines;
use triespell::speller::{Speller, SpellerConfig, TrieSpeller};
use triespell::trie::{consolidate, CompoundingMethod, TrieBlob, TrieBuilder, TrieLexicon};
use triespell::weights::{WeightMap, WeightedMapDef};

const DICTIONARY: &[&str] = &[
    "walk", "walked", "walker", "walking", "walks", "talk", "talks", "talked", "talker",
    "talking", "journal", "journals",
];

fn blob(words: &[&str]) -> TrieBlob {
    let mut builder = TrieBuilder::new();
    builder.insert_all(words);
    builder.freeze()
}

fn ranked(suggestions: &[triespell::Suggestion]) -> Vec<(String, u32)> {
    suggestions
        .iter()
        .map(|s| (s.word().to_string(), s.cost()))
        .collect()
}

#[test]
fn talks_is_corrected_in_ranked_order() {
    let speller = TrieSpeller::new(blob(DICTIONARY));
    let suggestions = speller.suggest("talks");

    assert_eq!(
        ranked(&suggestions),
        vec![
            ("talks".to_string(), 0),
            ("talk".to_string(), 100),
            ("walks".to_string(), 125),
            ("talked".to_string(), 200),
            ("talker".to_string(), 200),
            ("walk".to_string(), 225),
        ]
    );
}

#[test]
fn jernals_finds_the_journal_family() {
    let speller = TrieSpeller::new(blob(DICTIONARY));
    let suggestions = speller.suggest("jernals");

    let words: Vec<&str> = suggestions.iter().map(|s| s.word()).collect();
    assert_eq!(words, vec!["journals", "journal"]);
}

#[test]
fn compound_suggestion_joins_dictionary_words() {
    let forms = parse_dictionary_lines([
        "walk",
        "walking*",
        "*stick",
        "talking*",
        "*tree",
        "!walkingtree",
    ]);
    let mut builder = TrieBuilder::new();
    builder.insert_all(&forms);
    let speller = TrieSpeller::new(builder.freeze());

    // The forbidden entry hides "walkingtree" from has(); suppression in
    // suggestions is the wrapping dictionary layer's concern.
    assert!(!speller.has("walkingtree"));

    let config = SpellerConfig {
        num_suggestions: 1,
        compound_method: CompoundingMethod::JoinWords,
        ..SpellerConfig::default()
    };
    let suggestions = speller.suggest_with_config("walkingtree", &config);

    assert_eq!(ranked(&suggestions), vec![("walkingtree".to_string(), 99)]);
    assert_eq!(
        suggestions[0].compound_word.as_deref(),
        Some("walking+tree")
    );
}

#[test]
fn weighted_map_makes_sharp_s_cheap() {
    let weights = WeightMap::new(&[
        WeightedMapDef {
            map: "(ss)(\u{00df})".to_string(),
            ins_del: Some(1),
            replace: None,
            swap: None,
        },
        WeightedMapDef {
            map: "(ae)(\u{00e4})".to_string(),
            ins_del: Some(1),
            replace: None,
            swap: None,
        },
    ])
    .unwrap();

    let speller = TrieSpeller::with_weights(blob(&["stra\u{00df}e"]), weights);

    let lower = speller.suggest("strasse");
    assert_eq!(ranked(&lower), vec![("stra\u{00df}e".to_string(), 2)]);

    // Case mismatch: the weighted classes are case-sensitive, and seven
    // whole-character substitutions blow the edit budget.
    let upper = speller.suggest("STRASSE");
    assert!(upper.iter().all(|s| s.word() != "stra\u{00df}e"));
}

#[test]
fn every_representation_agrees_on_membership() {
    let mut builder = TrieBuilder::new();
    builder.insert_all(DICTIONARY);
    let dawg = consolidate(&builder);
    let blob = builder.clone().freeze();
    let dawg_blob = dawg.clone().freeze();

    for word in DICTIONARY.iter().copied().chain(["talkz", "wal", ""]) {
        let expected = builder.has(word);
        assert_eq!(dawg.has(word), expected, "dawg differs on {:?}", word);
        assert_eq!(blob.has(word), expected, "blob differs on {:?}", word);
        assert_eq!(
            dawg_blob.has(word),
            expected,
            "consolidated blob differs on {:?}",
            word
        );
    }
}

#[test]
fn suggestions_survive_a_serialization_round_trip() {
    let mut builder = TrieBuilder::new();
    builder.insert_all(DICTIONARY);
    let dawg = consolidate(&builder);

    let text = serialize(&dawg, &SerializeOptions::default());
    let restored = import(&text).unwrap().freeze();

    let original = TrieSpeller::new(dawg.freeze());
    let reloaded = TrieSpeller::new(restored);

    for word in ["talks", "jernals", "walkng"] {
        assert_eq!(original.suggest(word), reloaded.suggest(word));
    }
}

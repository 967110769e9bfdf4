//! Dictionary source parsing.
//!
//! Word-list sources use a small marker syntax: a trailing `*` lets the word
//! start a compound, a leading `*` lets it end one, `!` forbids a word and
//! `~` marks a case-folded variant. Markers expand into the control-edge
//! forms the trie stores (`word+`, `+word`); forbidden and case-folded
//! entries are stored verbatim behind their marker edge.

use itertools::Itertools;
use smol_str::SmolStr;

use crate::constants::{CASE_FOLD_MARKER, COMPOUND_JOIN, FORBID_MARKER};

/// Expands one dictionary entry into the word forms to insert.
pub fn expand_entry(entry: &str) -> Vec<SmolStr> {
    let entry = entry.trim();
    if entry.is_empty() {
        return vec![];
    }

    if entry.starts_with(FORBID_MARKER) || entry.starts_with(CASE_FOLD_MARKER) {
        return vec![SmolStr::new(entry)];
    }

    let can_follow = entry.starts_with('*');
    let can_precede = entry.ends_with('*');
    let word = entry.trim_matches('*');
    if word.is_empty() {
        return vec![];
    }

    let mut forms = vec![SmolStr::new(word)];
    if can_precede {
        forms.push(SmolStr::new(format!("{}{}", word, COMPOUND_JOIN)));
    }
    if can_follow {
        forms.push(SmolStr::new(format!("{}{}", COMPOUND_JOIN, word)));
    }
    if can_follow && can_precede {
        forms.push(SmolStr::new(format!(
            "{}{}{}",
            COMPOUND_JOIN, word, COMPOUND_JOIN
        )));
    }
    forms
}

/// Expands a whole word-list source. Comment lines start with `#`; blank
/// lines are skipped; duplicate forms are dropped, first occurrence wins.
pub fn parse_dictionary_lines<I, S>(lines: I) -> Vec<SmolStr>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    lines
        .into_iter()
        .filter(|line| {
            let line = line.as_ref().trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .flat_map(|line| expand_entry(line.as_ref()))
        .unique()
        .collect()
}

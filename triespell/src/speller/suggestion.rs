use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::types::Cost;

/// One ranked correction candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// The suggested word, compound markers stripped.
    pub word: SmolStr,
    /// Edit distance in cost units; 100 is one full edit.
    pub cost: Cost,
    /// Set by a wrapping dictionary layer for preferred corrections; the
    /// search itself never fills it in.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub is_preferred: Option<bool>,
    /// The raw compound form (`walking+tree`) when the candidate was built
    /// by joining dictionary words.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(default)]
    pub compound_word: Option<SmolStr>,
}

impl Suggestion {
    pub fn new(word: impl Into<SmolStr>, cost: Cost) -> Suggestion {
        Suggestion {
            word: word.into(),
            cost,
            is_preferred: None,
            compound_word: None,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }
}

impl PartialOrd for Suggestion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Suggestion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .cmp(&other.cost)
            .then_with(|| self.word.cmp(&other.word))
    }
}

//! Weighted edit costs over character classes.
//!
//! A definition like `{ map: "f(ph)(gh)", replace: 30 }` declares `f`, `ph`
//! and `gh` mutually replaceable at cost 30. Definitions compile into small
//! lookup tries keyed on the longest substring matching at a position; the
//! search consults them before falling back to the flat base costs.

use hashbrown::HashMap;
use smol_str::SmolStr;
use thiserror::Error;

use crate::types::Cost;

/// One raw cost definition, as found in dictionary metadata.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedMapDef {
    /// `|`-separated equivalence classes; `(...)` groups multi-character
    /// members.
    pub map: String,
    /// Symmetric cost of inserting or deleting a class member.
    #[serde(default)]
    pub ins_del: Option<Cost>,
    /// Cost of replacing one class member with another.
    #[serde(default)]
    pub replace: Option<Cost>,
    /// Cost of transposing two adjacent class members.
    #[serde(default)]
    pub swap: Option<Cost>,
}

#[derive(Debug, Error)]
pub enum WeightMapError {
    #[error("unbalanced group in map {map:?}")]
    UnbalancedGroup { map: String },

    #[error("empty group in map {map:?}")]
    EmptyGroup { map: String },
}

/// Compiled cost tables. Built once per dictionary, immutable afterwards,
/// shared by every query.
#[derive(Debug, Clone, Default)]
pub struct WeightMap {
    ins_del: CostTrie,
    replace: PairCostTrie,
    swap: PairCostTrie,
    insertions: Vec<(SmolStr, Cost)>,
}

impl WeightMap {
    pub fn new(defs: &[WeightedMapDef]) -> Result<WeightMap, WeightMapError> {
        let mut map = WeightMap::default();

        for def in defs {
            let classes = parse_classes(&def.map)?;

            if let Some(cost) = def.ins_del {
                for class in &classes {
                    for member in class {
                        map.ins_del.insert(member, cost);
                        map.insertions.push((member.clone(), cost));
                    }
                }
            }

            if let Some(cost) = def.replace {
                for class in &classes {
                    for a in class {
                        for b in class {
                            if a != b {
                                map.replace.insert(a, b, cost);
                            }
                        }
                    }
                }
            }

            if let Some(cost) = def.swap {
                for class in &classes {
                    for a in class {
                        for b in class {
                            map.swap.insert(a, b, cost);
                        }
                    }
                }
            }
        }

        // Deterministic expansion order; min cost wins on duplicates.
        map.insertions.sort();
        map.insertions.dedup_by(|next, kept| next.0 == kept.0);

        Ok(map)
    }

    /// Class members matching the input at `pos`, with their insert/delete
    /// cost, longest match first.
    pub fn ins_del_costs(&self, input: &[char], pos: usize) -> Vec<(usize, Cost)> {
        self.ins_del.matches_at(input, pos)
    }

    /// `(matched length, replacement text, cost)` for every weighted
    /// substitution applicable at `pos`, longest match first.
    pub fn replacements(&self, input: &[char], pos: usize) -> Vec<(usize, SmolStr, Cost)> {
        self.replace.pairs_at(input, pos)
    }

    /// Weighted transpositions at `pos`: the input reads member A then
    /// member B, the result swaps them. Returns
    /// `(total matched length, swapped text, cost)`.
    pub fn swaps(&self, input: &[char], pos: usize) -> Vec<(usize, SmolStr, Cost)> {
        let mut out = Vec::new();
        for (len_a, node) in self.swap.prefixes_at(input, pos) {
            let Some(nested) = node.nested.as_ref() else {
                continue;
            };
            for (len_b, cost) in nested.matches_at(input, pos + len_a) {
                let b: String = input[pos + len_a..pos + len_a + len_b].iter().collect();
                let a: String = input[pos..pos + len_a].iter().collect();
                out.push((len_a + len_b, SmolStr::new(format!("{}{}", b, a)), cost));
            }
        }
        out
    }

    /// Every substring with a declared insert cost, for expanding trie-side
    /// insertions the input does not contain.
    pub fn insertions(&self) -> &[(SmolStr, Cost)] {
        &self.insertions
    }

    pub fn is_empty(&self) -> bool {
        self.insertions.is_empty()
            && self.ins_del.children.is_empty()
            && self.replace.children.is_empty()
            && self.swap.children.is_empty()
    }
}

/// Substring-keyed cost lookup.
#[derive(Debug, Clone, Default)]
struct CostTrie {
    cost: Option<Cost>,
    children: HashMap<char, CostTrie>,
}

impl CostTrie {
    fn insert(&mut self, key: &str, cost: Cost) {
        let mut node = self;
        for ch in key.chars() {
            node = node.children.entry(ch).or_default();
        }
        node.cost = Some(match node.cost {
            Some(existing) => existing.min(cost),
            None => cost,
        });
    }

    fn matches_at(&self, input: &[char], pos: usize) -> Vec<(usize, Cost)> {
        let mut out = Vec::new();
        let mut node = self;
        let mut len = 0;

        while let Some(&ch) = input.get(pos + len) {
            node = match node.children.get(&ch) {
                Some(next) => next,
                None => break,
            };
            len += 1;
            if let Some(cost) = node.cost {
                out.push((len, cost));
            }
        }

        out.reverse();
        out
    }

    fn entries(&self) -> Vec<(SmolStr, Cost)> {
        let mut out = Vec::new();
        let mut prefix = String::new();
        self.collect(&mut prefix, &mut out);
        out.sort();
        out
    }

    fn collect(&self, prefix: &mut String, out: &mut Vec<(SmolStr, Cost)>) {
        if let Some(cost) = self.cost {
            out.push((SmolStr::new(prefix.as_str()), cost));
        }
        for (&ch, child) in self.children.iter() {
            prefix.push(ch);
            child.collect(prefix, out);
            prefix.truncate(prefix.len() - ch.len_utf8());
        }
    }
}

/// Two-level lookup: first substring, then a nested [`CostTrie`] over the
/// second.
#[derive(Debug, Clone, Default)]
struct PairCostTrie {
    children: HashMap<char, PairCostTrie>,
    nested: Option<CostTrie>,
}

impl PairCostTrie {
    fn insert(&mut self, first: &str, second: &str, cost: Cost) {
        let mut node = self;
        for ch in first.chars() {
            node = node.children.entry(ch).or_default();
        }
        node.nested.get_or_insert_with(CostTrie::default).insert(second, cost);
    }

    /// All prefixes of the input at `pos` that are declared first members.
    fn prefixes_at(&self, input: &[char], pos: usize) -> Vec<(usize, &PairCostTrie)> {
        let mut out = Vec::new();
        let mut node = self;
        let mut len = 0;

        while let Some(&ch) = input.get(pos + len) {
            node = match node.children.get(&ch) {
                Some(next) => next,
                None => break,
            };
            len += 1;
            if node.nested.is_some() {
                out.push((len, node));
            }
        }

        out.reverse();
        out
    }

    fn pairs_at(&self, input: &[char], pos: usize) -> Vec<(usize, SmolStr, Cost)> {
        let mut out = Vec::new();
        for (len, node) in self.prefixes_at(input, pos) {
            let Some(nested) = node.nested.as_ref() else {
                continue;
            };
            for (text, cost) in nested.entries() {
                out.push((len, text, cost));
            }
        }
        out
    }
}

/// Splits a map expression into equivalence classes of members.
fn parse_classes(map: &str) -> Result<Vec<Vec<SmolStr>>, WeightMapError> {
    let mut classes = Vec::new();

    for class_text in map.split('|') {
        let mut members = Vec::new();
        let mut chars = class_text.chars();

        while let Some(ch) = chars.next() {
            match ch {
                '(' => {
                    let mut group = String::new();
                    loop {
                        match chars.next() {
                            Some(')') => break,
                            Some(inner) => group.push(inner),
                            None => {
                                return Err(WeightMapError::UnbalancedGroup {
                                    map: map.to_string(),
                                })
                            }
                        }
                    }
                    if group.is_empty() {
                        return Err(WeightMapError::EmptyGroup {
                            map: map.to_string(),
                        });
                    }
                    members.push(SmolStr::new(group));
                }
                ')' => {
                    return Err(WeightMapError::UnbalancedGroup {
                        map: map.to_string(),
                    })
                }
                _ => members.push(SmolStr::new(ch.to_string())),
            }
        }

        if !members.is_empty() {
            classes.push(members);
        }
    }

    Ok(classes)
}

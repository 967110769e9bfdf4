/*! Spell-checking over packed trie dictionaries.

A word list compiles into a bit-packed trie (optionally consolidated into a
DAWG and frozen into one flat allocation), queried through `has` and a
best-first fuzzy `suggest` search with weighted edit costs. A versioned text
codec persists tries with their structural sharing intact.

# Usage example

```
use triespell::speller::{Speller, TrieSpeller};
use triespell::trie::TrieBuilder;

let mut builder = TrieBuilder::new();
builder.insert_all(["color", "colors", "colour"]);
let speller = TrieSpeller::new(builder.freeze());

assert!(speller.has("color"));
let suggestions = speller.suggest("colr");
assert_eq!(suggestions[0].word(), "color");
```
*/

pub mod char_index;
pub mod codec;
pub mod constants;
pub mod parse;
pub mod speller;
pub mod trie;
pub mod types;
pub mod weights;

pub(crate) mod heap;

pub use crate::speller::{Speller, SpellerConfig, Suggestion, TrieSpeller};
pub use crate::trie::{CompoundingMethod, TrieBlob, TrieBuilder};

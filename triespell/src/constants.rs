use crate::types::Cost;

// Default bit-field widths of a packed node entry. The info word keeps the
// EOW flag in bit 0 and the child count above it; every other slot packs
// `(child_ref << NODE_CHILD_SHIFT) | char_id`.
pub const NODE_EOW_MASK: u32 = 0b1;
pub const NODE_INFO_COUNT_SHIFT: u32 = 1;
pub const NODE_CHILD_SHIFT: u32 = 8;
pub const NODE_CHAR_MASK: u32 = (1 << NODE_CHILD_SHIFT) - 1;

// Control edges stored inside the trie itself. They are hidden from ordinary
// traversal by the filtering node decorator.
pub const COMPOUND_JOIN: char = '+';
pub const WORD_SEPARATOR: char = ' ';
pub const FORBID_MARKER: char = '!';
pub const CASE_FOLD_MARKER: char = '~';

// Default edit penalties. These are tuning values, overridable through
// `EditCosts`, not structural invariants.
pub const BASE_COST: Cost = 100;
pub const SWAP_COST: Cost = 75;
pub const ACCENT_COST: Cost = 1;
pub const CAPS_COST: Cost = 1;
pub const FIRST_LETTER_BIAS: Cost = 25;
pub const NON_ALPHABET_COST: Cost = 110;
pub const WORD_BREAK_COST: Cost = 99;

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn test_NODE_CHAR_MASK() {
        // The char mask must exactly fill the bits below the child shift.
        assert!(NODE_CHAR_MASK == (1u32 << NODE_CHILD_SHIFT) - 1);
        assert!(NODE_EOW_MASK == 1);
    }

    #[test]
    fn test_costs_are_sane() {
        assert!(WORD_BREAK_COST < BASE_COST);
        assert!(SWAP_COST < BASE_COST);
        assert!(ACCENT_COST < BASE_COST);
    }
}

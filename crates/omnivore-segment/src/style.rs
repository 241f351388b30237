//! Per-byte style bits.
//!
//! Every data byte has a parallel style byte. The bits are orthogonal:
//! setting `MATCH` never disturbs `COMMENT`, and so on. All style writes
//! go through a mask so unrelated bits survive.
//!
//! ```text
//!   bit:  7        6     5        4      3      2..0
//!        selected  data  comment  match  diff   user
//! ```

use bitflags::bitflags;

bitflags! {
    /// Style flags stored alongside each byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StyleBits: u8 {
        /// Three-bit user value field.
        const USER     = 0x07;
        /// Byte differs from the baseline.
        const DIFF     = 0x08;
        /// Byte is part of a search match.
        const MATCH    = 0x10;
        /// Byte carries a comment.
        const COMMENT  = 0x20;
        /// Byte has been marked as data (not code).
        const DATA     = 0x40;
        /// Byte is selected.
        const SELECTED = 0x80;
    }
}

impl Default for StyleBits {
    fn default() -> Self {
        Self::empty()
    }
}

impl StyleBits {
    /// Builds a style value carrying the given user number in the low bits.
    pub fn user(value: u8) -> Self {
        Self::from_bits_truncate(value & Self::USER.bits())
    }

    /// Returns the AND-mask that clears these bits and keeps the rest.
    pub fn clear_mask(self) -> u8 {
        !self.bits()
    }

    /// Extracts the user field from a raw style byte.
    pub fn user_value(raw: u8) -> u8 {
        raw & Self::USER.bits()
    }

    /// True when every bit of `self` is set in the raw style byte.
    pub fn all_set_in(self, raw: u8) -> bool {
        raw & self.bits() == self.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_are_disjoint() {
        let named = [
            StyleBits::USER,
            StyleBits::DIFF,
            StyleBits::MATCH,
            StyleBits::COMMENT,
            StyleBits::DATA,
            StyleBits::SELECTED,
        ];
        let mut seen = 0u8;
        for bits in named {
            assert_eq!(seen & bits.bits(), 0);
            seen |= bits.bits();
        }
        assert_eq!(seen, 0xff);
    }

    #[test]
    fn test_clear_mask_preserves_other_bits() {
        let raw = (StyleBits::MATCH | StyleBits::COMMENT | StyleBits::user(5)).bits();
        let cleared = raw & StyleBits::MATCH.clear_mask();
        assert_eq!(cleared, (StyleBits::COMMENT | StyleBits::user(5)).bits());
        assert_eq!(StyleBits::user_value(cleared), 5);
    }

    #[test]
    fn test_user_is_truncated() {
        assert_eq!(StyleBits::user(0xff).bits(), 0x07);
        assert!(StyleBits::COMMENT.all_set_in(0x20 | 0x01));
        assert!(!(StyleBits::COMMENT | StyleBits::DATA).all_set_in(0x20));
    }
}

//! Bit-packed index storage with word-straddling entries.
//!
//! Each entry occupies exactly `bits` bits, packed back to back into `u64`
//! words with no padding: an entry may straddle a word boundary, in which
//! case its low bits live at the top of one word and its high bits at the
//! bottom of the next. This is the layout the file format stores verbatim.

/// Errors produced when adopting raw packed words.
#[derive(Debug, thiserror::Error)]
pub enum PackedDataError {
    /// The word vector does not match `ceil(len * bits / 64)`.
    #[error("packed storage has {actual} words, layout requires {expected}")]
    WordCountMismatch { expected: usize, actual: usize },
}

/// A tightly bit-packed array of small unsigned values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackedBits {
    words: Vec<u64>,
    bits: u32,
    len: usize,
}

impl PackedBits {
    /// Creates a zeroed array of `len` entries at `bits` bits each.
    ///
    /// `bits` must be in `1..=32`.
    pub fn new(bits: u32, len: usize) -> Self {
        debug_assert!((1..=32).contains(&bits), "bits must be in 1..=32");
        Self {
            words: vec![0u64; Self::word_count(bits, len)],
            bits,
            len,
        }
    }

    fn word_count(bits: u32, len: usize) -> usize {
        (len as u64 * u64::from(bits)).div_ceil(64) as usize
    }

    /// Returns the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len` in debug builds.
    pub fn get(&self, index: usize) -> u32 {
        debug_assert!(index < self.len, "index out of bounds");
        let bit = index as u64 * u64::from(self.bits);
        let word = (bit / 64) as usize;
        let offset = (bit % 64) as u32;
        let mask = if self.bits == 64 {
            u64::MAX
        } else {
            (1u64 << self.bits) - 1
        };
        let low = self.words[word] >> offset;
        let value = if offset + self.bits <= 64 {
            low
        } else {
            low | (self.words[word + 1] << (64 - offset))
        };
        (value & mask) as u32
    }

    /// Sets the entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len`, or if `value` does not fit in `bits` bits,
    /// in debug builds.
    pub fn set(&mut self, index: usize, value: u32) {
        debug_assert!(index < self.len, "index out of bounds");
        debug_assert!(
            self.bits >= 32 || u64::from(value) < (1u64 << self.bits),
            "value {value} exceeds {}-bit capacity",
            self.bits
        );
        let bit = index as u64 * u64::from(self.bits);
        let word = (bit / 64) as usize;
        let offset = (bit % 64) as u32;
        let mask = (1u64 << self.bits) - 1;
        self.words[word] &= !(mask << offset);
        self.words[word] |= u64::from(value) << offset;
        if offset + self.bits > 64 {
            let spill = 64 - offset;
            self.words[word + 1] &= !(mask >> spill);
            self.words[word + 1] |= u64::from(value) >> spill;
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The raw backing words, in entry order.
    pub fn words(&self) -> &[u64] {
        &self.words
    }

    /// Adopts raw words produced by [`PackedBits::words`] or read from a
    /// document, validating the word count against the layout.
    pub fn from_words(bits: u32, len: usize, words: Vec<u64>) -> Result<Self, PackedDataError> {
        let expected = Self::word_count(bits, len);
        if words.len() != expected {
            return Err(PackedDataError::WordCountMismatch {
                expected,
                actual: words.len(),
            });
        }
        Ok(Self { words, bits, len })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_at_each_width() {
        for bits in [2u32, 3, 5, 7, 11, 13] {
            let len = 300;
            let mask = (1u64 << bits) - 1;
            let mut packed = PackedBits::new(bits, len);
            for i in 0..len {
                packed.set(i, ((i as u64 * 31) & mask) as u32);
            }
            for i in 0..len {
                assert_eq!(
                    packed.get(i),
                    ((i as u64 * 31) & mask) as u32,
                    "mismatch at index {i}, width {bits}"
                );
            }
        }
    }

    #[test]
    fn test_entries_straddle_word_boundaries() {
        // 5-bit entries: entry 12 occupies bits 60..65, split across words.
        let mut packed = PackedBits::new(5, 16);
        packed.set(12, 0b10110);
        assert_eq!(packed.get(12), 0b10110);
        assert_ne!(packed.words()[0], 0);
        assert_ne!(packed.words()[1], 0);

        // Neighbors are unaffected.
        assert_eq!(packed.get(11), 0);
        assert_eq!(packed.get(13), 0);
    }

    #[test]
    fn test_overwrite_clears_straddled_bits() {
        let mut packed = PackedBits::new(5, 16);
        packed.set(12, 0b11111);
        packed.set(12, 0b00001);
        assert_eq!(packed.get(12), 1);
        assert_eq!(packed.words()[1] & 1, 0);
    }

    #[test]
    fn test_word_count_is_tight() {
        // 100 entries at 3 bits = 300 bits = 5 words.
        let packed = PackedBits::new(3, 100);
        assert_eq!(packed.words().len(), 5);
    }

    #[test]
    fn test_from_words_validates_count() {
        let packed = PackedBits::new(3, 100);
        let words = packed.words().to_vec();
        assert!(PackedBits::from_words(3, 100, words.clone()).is_ok());
        let result = PackedBits::from_words(4, 100, words);
        assert!(matches!(
            result,
            Err(PackedDataError::WordCountMismatch {
                expected: 7,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_from_words_roundtrip() {
        let mut packed = PackedBits::new(6, 50);
        for i in 0..50 {
            packed.set(i, (i % 64) as u32);
        }
        let adopted = PackedBits::from_words(6, 50, packed.words().to_vec()).unwrap();
        assert_eq!(adopted, packed);
    }
}

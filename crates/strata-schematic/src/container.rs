//! Palette-compressed voxel containers.
//!
//! A container stores one cell per lattice position of a positive-dimension
//! box as an index into a local palette. The index width grows with the
//! palette: `bits = max(2, ceil(log2(palette_len)))`, and the whole index
//! array is repacked when the width increases. Cells are linearized Y-major:
//! `index = x + z·size.x + y·size.x·size.z`.

use strata_math::BlockPos;

use crate::packed::{PackedBits, PackedDataError};
use crate::palette::Palette;
use crate::state::BlockState;

/// Access outside the container's box.
#[derive(Debug, thiserror::Error)]
#[error("position ({}, {}, {}) outside container of size {}×{}×{}",
    pos.x, pos.y, pos.z, size.x, size.y, size.z)]
pub struct OutOfBounds {
    pub pos: BlockPos,
    pub size: BlockPos,
}

/// Errors produced when adopting raw palette + index data.
#[derive(Debug, thiserror::Error)]
pub enum ContainerDataError {
    /// The palette had no entries.
    #[error("container palette is empty")]
    EmptyPalette,
    /// The index words do not match the size/palette-derived layout.
    #[error(transparent)]
    Packed(#[from] PackedDataError),
    /// A stored index points past the palette.
    #[error("palette index {index} out of range for palette of {palette_len}")]
    IndexOutOfRange { index: u32, palette_len: usize },
}

/// A palette-compressed box of voxel states.
#[derive(Clone, Debug)]
pub struct VoxelContainer<S: BlockState> {
    size: BlockPos,
    palette: Palette<S>,
    storage: PackedBits,
}

/// Equality is per-cell: two containers are equal when every position decodes
/// to the same state, regardless of palette order or index width. Codecs that
/// rebuild palettes in a different insertion order still compare equal.
impl<S: BlockState> PartialEq for VoxelContainer<S> {
    fn eq(&self, other: &Self) -> bool {
        if self.size != other.size {
            return false;
        }
        (0..self.storage.len()).all(|i| {
            self.palette.states()[self.storage.get(i) as usize]
                == other.palette.states()[other.storage.get(i) as usize]
        })
    }
}

impl<S: BlockState> Eq for VoxelContainer<S> {}

impl<S: BlockState> VoxelContainer<S> {
    /// Creates a container of the given positive dimensions, filled with the
    /// empty state, which is pinned at palette index 0.
    pub fn new(size: BlockPos) -> Self {
        debug_assert!(
            size.x > 0 && size.y > 0 && size.z > 0,
            "container dimensions must be positive"
        );
        let volume = size.volume() as usize;
        Self {
            size,
            palette: Palette::with_first(S::empty()),
            storage: PackedBits::new(2, volume),
        }
    }

    pub fn size(&self) -> BlockPos {
        self.size
    }

    pub fn volume(&self) -> usize {
        self.size.volume() as usize
    }

    pub fn palette(&self) -> &Palette<S> {
        &self.palette
    }

    pub fn storage(&self) -> &PackedBits {
        &self.storage
    }

    /// Current index width in bits.
    pub fn bits(&self) -> u32 {
        self.storage.bits()
    }

    fn check(&self, pos: BlockPos) -> Result<usize, OutOfBounds> {
        if pos.x < 0
            || pos.y < 0
            || pos.z < 0
            || pos.x >= self.size.x
            || pos.y >= self.size.y
            || pos.z >= self.size.z
        {
            return Err(OutOfBounds {
                pos,
                size: self.size,
            });
        }
        Ok(self.linear_index(pos))
    }

    /// Converts a position to its Y-major linear index.
    fn linear_index(&self, pos: BlockPos) -> usize {
        (pos.x + pos.z * self.size.x + pos.y * self.size.x * self.size.z) as usize
    }

    /// Returns the state at `pos`.
    pub fn get(&self, pos: BlockPos) -> Result<&S, OutOfBounds> {
        let index = self.check(pos)?;
        let palette_index = self.storage.get(index);
        // Stored indices always point into the palette: set() inserts before
        // writing and from_raw_parts validates every index.
        Ok(&self.palette.states()[palette_index as usize])
    }

    /// Sets the state at `pos`, growing the palette (and repacking the index
    /// array at a wider bit width) as needed.
    pub fn set(&mut self, pos: BlockPos, state: S) -> Result<(), OutOfBounds> {
        let index = self.check(pos)?;
        let palette_index = self.palette.index_or_insert(&state);
        let needed = Self::bits_for_palette(self.palette.len());
        if needed > self.storage.bits() {
            self.repack(needed);
        }
        self.storage.set(index, palette_index);
        Ok(())
    }

    /// Required index width for a palette of `len` entries, floored at 2.
    pub fn bits_for_palette(len: usize) -> u32 {
        if len <= 1 {
            return 2;
        }
        let needed = usize::BITS - (len - 1).leading_zeros();
        needed.max(2)
    }

    /// Rebuilds the index array at a wider width, preserving every entry.
    fn repack(&mut self, new_bits: u32) {
        let mut wider = PackedBits::new(new_bits, self.storage.len());
        for i in 0..self.storage.len() {
            wider.set(i, self.storage.get(i));
        }
        self.storage = wider;
    }

    /// Number of cells holding a non-empty state. Linear scan; used when
    /// importing data that carries no stored count.
    pub fn count_non_empty(&self) -> i64 {
        let mut count = 0;
        for i in 0..self.storage.len() {
            let state = &self.palette.states()[self.storage.get(i) as usize];
            if !state.is_empty() {
                count += 1;
            }
        }
        count
    }

    /// Reassembles a container from a deserialized palette and index words.
    /// The index width is derived from the palette length; the word count and
    /// every stored index are validated.
    pub fn from_raw_parts(
        size: BlockPos,
        states: Vec<S>,
        words: Vec<u64>,
    ) -> Result<Self, ContainerDataError> {
        if states.is_empty() {
            return Err(ContainerDataError::EmptyPalette);
        }
        let palette = Palette::from_states(states);
        let bits = Self::bits_for_palette(palette.len());
        let volume = size.volume() as usize;
        let storage = PackedBits::from_words(bits, volume, words)?;
        for i in 0..volume {
            let index = storage.get(i);
            if index as usize >= palette.len() {
                return Err(ContainerDataError::IndexOutOfRange {
                    index,
                    palette_len: palette.len(),
                });
            }
        }
        Ok(Self {
            size,
            palette,
            storage,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

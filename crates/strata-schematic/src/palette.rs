//! State palettes: the bidirectional index ↔ state mapping of a container.

use rustc_hash::FxHashMap;

use crate::state::BlockState;

/// An append-only palette of distinct states with O(1) reverse lookup.
#[derive(Clone, Debug)]
pub struct Palette<S> {
    states: Vec<S>,
    lookup: FxHashMap<S, u32>,
}

impl<S: BlockState> Palette<S> {
    /// A palette seeded with a single entry at index 0.
    pub fn with_first(state: S) -> Self {
        let mut palette = Palette {
            states: Vec::new(),
            lookup: FxHashMap::default(),
        };
        palette.index_or_insert(&state);
        palette
    }

    /// Rebuilds a palette from an ordered entry list (deserialization).
    /// Duplicate entries keep their first index.
    pub fn from_states(states: Vec<S>) -> Self {
        let mut lookup = FxHashMap::default();
        for (i, state) in states.iter().enumerate() {
            lookup.entry(state.clone()).or_insert(i as u32);
        }
        Palette { states, lookup }
    }

    /// The index of a state, if present.
    pub fn index_of(&self, state: &S) -> Option<u32> {
        self.lookup.get(state).copied()
    }

    /// The index of a state, appending it if absent.
    pub fn index_or_insert(&mut self, state: &S) -> u32 {
        if let Some(index) = self.lookup.get(state) {
            return *index;
        }
        let index = self.states.len() as u32;
        self.states.push(state.clone());
        self.lookup.insert(state.clone(), index);
        index
    }

    pub fn state(&self, index: u32) -> Option<&S> {
        self.states.get(index as usize)
    }

    pub fn states(&self) -> &[S] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl<S: BlockState> PartialEq for Palette<S> {
    fn eq(&self, other: &Self) -> bool {
        self.states == other.states
    }
}

impl<S: BlockState> Eq for Palette<S> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

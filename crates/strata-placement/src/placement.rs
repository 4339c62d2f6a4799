//! Placement configuration: where and how a structure lands in a world.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strata_math::{BlockPos, Transform};
use strata_schematic::{BlockState, Structure};

/// Per-region placement overrides nested inside a [`Placement`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubRegionPlacement {
    /// The region's anchor relative to the placement origin. Defaults to the
    /// anchor stored in the structure; users may move regions independently.
    pub offset: BlockPos,
    /// Transform applied to this region alone, nested inside the whole
    /// placement's transform.
    pub transform: Transform,
    pub enabled: bool,
    pub ignore_entities: bool,
}

impl SubRegionPlacement {
    pub fn new(offset: BlockPos) -> Self {
        Self {
            offset,
            transform: Transform::IDENTITY,
            enabled: true,
            ignore_entities: false,
        }
    }
}

/// A configured placement of a structure: a world origin, a whole-placement
/// transform, and per-region overrides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub origin: BlockPos,
    pub transform: Transform,
    pub ignore_entities: bool,
    pub regions: BTreeMap<String, SubRegionPlacement>,
}

impl Placement {
    /// A placement with identity transforms and one sub-placement per
    /// structure region, anchored where the structure stored them.
    pub fn from_structure<S: BlockState>(structure: &Structure<S>, origin: BlockPos) -> Self {
        let regions = structure
            .regions()
            .map(|(name, region)| (name.clone(), SubRegionPlacement::new(region.position)))
            .collect();
        Self {
            origin,
            transform: Transform::IDENTITY,
            ignore_entities: false,
            regions,
        }
    }

    pub fn region(&self, name: &str) -> Option<&SubRegionPlacement> {
        self.regions.get(name)
    }

    pub fn region_mut(&mut self, name: &str) -> Option<&mut SubRegionPlacement> {
        self.regions.get_mut(name)
    }
}

/// What to do when a destination cell already holds something.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplacePolicy {
    /// Write every non-void source cell.
    #[default]
    Always,
    /// Leave destination cells that already hold a non-empty state.
    SkipNonEmptyDestination,
    /// Write only non-empty source cells, leaving destination holes intact.
    SkipEmptySource,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Block states and the state seam.
//!
//! Storage, codecs, and placement are generic over [`BlockState`] so callers
//! can plug in their own state representation. [`NamedState`] is the concrete
//! implementation used by the file formats: a registry name plus an ordered
//! property map.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::Hash;

use strata_math::{Mirror, Rotation, StateTransform};
use strata_tag::{Compound, Tag};

/// A voxel state that can be stored in a palette and carried through
/// mirror/rotation transforms.
pub trait BlockState: Clone + Eq + Hash + fmt::Debug {
    /// The state representing "nothing here" (air). Palette index 0.
    fn empty() -> Self;

    /// The sentinel state meaning "this cell carries no data at all" and is
    /// skipped entirely during placement.
    fn void() -> Self;

    fn is_empty(&self) -> bool;

    fn is_void(&self) -> bool;

    /// This state reflected across the given axis.
    fn mirrored(&self, mirror: Mirror) -> Self;

    /// This state rotated by the given quarter turns.
    fn rotated(&self, rotation: Rotation) -> Self;

    /// Serializes this state as a palette entry.
    fn to_tag(&self) -> Tag;

    /// Deserializes a palette entry, `None` if the tag is malformed.
    fn from_tag(tag: &Tag) -> Option<Self>;
}

/// Applies a composed placement transform to a state: outer mirror, inner
/// mirror (already axis-swapped by the composition), then combined rotation.
pub fn apply_state_transform<S: BlockState>(state: &S, t: &StateTransform) -> S {
    let mut out = state.clone();
    if t.outer_mirror != Mirror::None {
        out = out.mirrored(t.outer_mirror);
    }
    if t.inner_mirror != Mirror::None {
        out = out.mirrored(t.inner_mirror);
    }
    if t.rotation != Rotation::None {
        out = out.rotated(t.rotation);
    }
    out
}

/// Registry name of the empty state.
pub const EMPTY_STATE_NAME: &str = "air";

/// Registry name of the void sentinel.
pub const VOID_STATE_NAME: &str = "structure_void";

/// A block state identified by registry name plus string properties.
///
/// Properties are kept ordered so equal states serialize identically. The
/// `facing` and `axis` properties participate in mirror/rotation transforms;
/// all other properties ride along untouched.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedState {
    name: String,
    properties: BTreeMap<String, String>,
}

impl NamedState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    fn map_property(&self, key: &str, f: impl Fn(&str) -> Option<&'static str>) -> Self {
        match self.properties.get(key).and_then(|v| f(v)) {
            Some(mapped) => {
                let mut out = self.clone();
                out.properties.insert(key.to_string(), mapped.to_string());
                out
            }
            None => self.clone(),
        }
    }
}

fn facing_mirrored(mirror: Mirror, facing: &str) -> Option<&'static str> {
    match (mirror, facing) {
        (Mirror::X, "east") => Some("west"),
        (Mirror::X, "west") => Some("east"),
        (Mirror::Z, "north") => Some("south"),
        (Mirror::Z, "south") => Some("north"),
        _ => None,
    }
}

fn facing_rotated(rotation: Rotation, facing: &str) -> Option<&'static str> {
    const CLOCKWISE: [&str; 4] = ["north", "east", "south", "west"];
    let at = CLOCKWISE.iter().position(|&f| f == facing)?;
    let turns = rotation.quarter_turns() as usize;
    Some(CLOCKWISE[(at + turns) % 4])
}

fn axis_rotated(rotation: Rotation, axis: &str) -> Option<&'static str> {
    if !rotation.swaps_axes() {
        return None;
    }
    match axis {
        "x" => Some("z"),
        "z" => Some("x"),
        _ => None,
    }
}

impl BlockState for NamedState {
    fn empty() -> Self {
        NamedState::new(EMPTY_STATE_NAME)
    }

    fn void() -> Self {
        NamedState::new(VOID_STATE_NAME)
    }

    fn is_empty(&self) -> bool {
        self.name == EMPTY_STATE_NAME
    }

    fn is_void(&self) -> bool {
        self.name == VOID_STATE_NAME
    }

    fn mirrored(&self, mirror: Mirror) -> Self {
        self.map_property("facing", |f| facing_mirrored(mirror, f))
    }

    fn rotated(&self, rotation: Rotation) -> Self {
        let out = self.map_property("facing", |f| facing_rotated(rotation, f));
        out.map_property("axis", |a| axis_rotated(rotation, a))
    }

    fn to_tag(&self) -> Tag {
        let mut c = Compound::new();
        c.insert("Name".to_string(), Tag::Str(self.name.clone()));
        if !self.properties.is_empty() {
            let mut props = Compound::new();
            for (k, v) in &self.properties {
                props.insert(k.clone(), Tag::Str(v.clone()));
            }
            c.insert("Properties".to_string(), Tag::Compound(props));
        }
        Tag::Compound(c)
    }

    fn from_tag(tag: &Tag) -> Option<Self> {
        let name = tag.get("Name")?.as_str()?.to_string();
        let mut properties = BTreeMap::new();
        if let Some(props) = tag.get("Properties") {
            for (k, v) in props.as_compound()? {
                properties.insert(k.clone(), v.as_str()?.to_string());
            }
        }
        Some(NamedState { name, properties })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use strata_math::Transform;

    #[test]
    fn test_empty_and_void_are_distinct() {
        assert!(NamedState::empty().is_empty());
        assert!(!NamedState::empty().is_void());
        assert!(NamedState::void().is_void());
        assert!(!NamedState::void().is_empty());
    }

    #[test]
    fn test_facing_rotates_clockwise() {
        let s = NamedState::new("observer").with_property("facing", "north");
        assert_eq!(s.rotated(Rotation::Cw90).property("facing"), Some("east"));
        assert_eq!(s.rotated(Rotation::Cw180).property("facing"), Some("south"));
        assert_eq!(s.rotated(Rotation::Ccw90).property("facing"), Some("west"));
    }

    #[test]
    fn test_facing_mirrors_on_matching_axis_only() {
        let east = NamedState::new("hopper").with_property("facing", "east");
        assert_eq!(east.mirrored(Mirror::X).property("facing"), Some("west"));
        assert_eq!(east.mirrored(Mirror::Z).property("facing"), Some("east"));

        let north = NamedState::new("hopper").with_property("facing", "north");
        assert_eq!(north.mirrored(Mirror::Z).property("facing"), Some("south"));
        assert_eq!(north.mirrored(Mirror::X).property("facing"), Some("north"));
    }

    #[test]
    fn test_axis_property_swaps_on_quarter_turns() {
        let log = NamedState::new("log").with_property("axis", "x");
        assert_eq!(log.rotated(Rotation::Cw90).property("axis"), Some("z"));
        assert_eq!(log.rotated(Rotation::Cw180).property("axis"), Some("x"));
        let vertical = NamedState::new("log").with_property("axis", "y");
        assert_eq!(vertical.rotated(Rotation::Cw90).property("axis"), Some("y"));
    }

    #[test]
    fn test_unrelated_properties_ride_along() {
        let s = NamedState::new("furnace")
            .with_property("facing", "north")
            .with_property("lit", "true");
        let rotated = s.rotated(Rotation::Cw90);
        assert_eq!(rotated.property("lit"), Some("true"));
        assert_eq!(rotated.property("facing"), Some("east"));
    }

    #[test]
    fn test_tag_roundtrip() {
        let s = NamedState::new("stairs")
            .with_property("facing", "west")
            .with_property("half", "top");
        assert_eq!(NamedState::from_tag(&s.to_tag()), Some(s));

        let bare = NamedState::new("stone");
        let tag = bare.to_tag();
        assert!(tag.get("Properties").is_none());
        assert_eq!(NamedState::from_tag(&tag), Some(bare));
    }

    #[test]
    fn test_state_transform_applies_mirrors_then_rotation() {
        let st = StateTransform::compose(
            Transform::new(Mirror::X, Rotation::Cw90),
            Transform::IDENTITY,
        );
        let s = NamedState::new("observer").with_property("facing", "east");
        // Mirror X: east → west, then CW90: west → north.
        assert_eq!(
            apply_state_transform(&s, &st).property("facing"),
            Some("north")
        );
    }
}

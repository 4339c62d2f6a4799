//! Horizontal rotations and mirrors, and their composition rules.
//!
//! Rotations form the cyclic group of quarter turns about the Y axis;
//! mirrors reflect across one horizontal axis. Vertical orientation is never
//! affected by either.

use serde::{Deserialize, Serialize};

/// A clockwise quarter-turn rotation about the vertical axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Ccw90,
}

impl Rotation {
    /// Composes two rotations (applies `self`, then `other`).
    pub fn add(self, other: Rotation) -> Rotation {
        Rotation::from_quarter_turns(self.quarter_turns() + other.quarter_turns())
    }

    /// The rotation that undoes this one.
    pub fn reversed(self) -> Rotation {
        match self {
            Rotation::None => Rotation::None,
            Rotation::Cw90 => Rotation::Ccw90,
            Rotation::Cw180 => Rotation::Cw180,
            Rotation::Ccw90 => Rotation::Cw90,
        }
    }

    /// Number of clockwise quarter turns (0..=3).
    pub fn quarter_turns(self) -> u32 {
        match self {
            Rotation::None => 0,
            Rotation::Cw90 => 1,
            Rotation::Cw180 => 2,
            Rotation::Ccw90 => 3,
        }
    }

    fn from_quarter_turns(turns: u32) -> Rotation {
        match turns % 4 {
            0 => Rotation::None,
            1 => Rotation::Cw90,
            2 => Rotation::Cw180,
            _ => Rotation::Ccw90,
        }
    }

    /// True for the two quarter turns that swap the horizontal axes.
    pub fn swaps_axes(self) -> bool {
        matches!(self, Rotation::Cw90 | Rotation::Ccw90)
    }

    /// The clockwise yaw delta this rotation contributes, in degrees.
    pub fn degrees(self) -> f32 {
        match self {
            Rotation::None => 0.0,
            Rotation::Cw90 => 90.0,
            Rotation::Cw180 => 180.0,
            Rotation::Ccw90 => 270.0,
        }
    }
}

/// A reflection across one horizontal axis.
///
/// `Mirror::X` negates the X direction (reflects across the YZ plane);
/// `Mirror::Z` negates the Z direction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mirror {
    #[default]
    None,
    X,
    Z,
}

impl Mirror {
    /// Swaps the reflection axis. Used when a nested mirror is re-expressed
    /// after an outer quarter turn.
    pub fn swapped(self) -> Mirror {
        match self {
            Mirror::None => Mirror::None,
            Mirror::X => Mirror::Z,
            Mirror::Z => Mirror::X,
        }
    }

    /// Folds a yaw angle (degrees) through this reflection.
    ///
    /// Yaw is measured in the convention where 0° faces +Z and angles grow
    /// clockwise: reflecting X negates yaw, reflecting Z maps yaw to 180° − yaw.
    pub fn apply_yaw(self, yaw: f32) -> f32 {
        match self {
            Mirror::None => yaw,
            Mirror::X => -yaw,
            Mirror::Z => 180.0 - yaw,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

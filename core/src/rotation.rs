//! Four-way world and building rotation.

use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of distinct rotations.
pub const NR_OF_ROTATIONS: usize = 4;

/// Quarter-turn rotation applied to the world view or to a placed building.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Rotation {
    /// No rotation.
    #[default]
    Deg0,
    /// A quarter turn.
    Deg90,
    /// A half turn.
    Deg180,
    /// Three quarter turns.
    Deg270,
}

/// Direction of a single-step rotation requested by the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeRotation {
    /// Steps towards [`Rotation::Deg0`].
    Left,
    /// Steps towards [`Rotation::Deg270`].
    Right,
}

/// Raised when an integer does not name a rotation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RotationError {
    /// The value is outside `0..=3`.
    #[error("invalid argument: {value} is not a rotation (expected 0..=3)")]
    InvalidArgument {
        /// Rejected value.
        value: i64,
    },
}

impl Rotation {
    /// All rotations in ascending order.
    pub const ALL: [Rotation; NR_OF_ROTATIONS] = [
        Rotation::Deg0,
        Rotation::Deg90,
        Rotation::Deg180,
        Rotation::Deg270,
    ];

    /// Zero-based position of the rotation inside [`Rotation::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// Integer representation used by persisted tiles.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.index() as i32
    }

    /// Next rotation clockwise, stopping at [`Rotation::Deg270`].
    ///
    /// Single-step controls never wrap around; composing rotations is done
    /// with `+` and `-`, which do.
    #[must_use]
    pub const fn step_clockwise(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 | Self::Deg270 => Self::Deg270,
        }
    }

    /// Previous rotation, stopping at [`Rotation::Deg0`].
    #[must_use]
    pub const fn step_counter_clockwise(self) -> Self {
        match self {
            Self::Deg0 | Self::Deg90 => Self::Deg0,
            Self::Deg180 => Self::Deg90,
            Self::Deg270 => Self::Deg180,
        }
    }

    /// Applies a player-driven single step.
    #[must_use]
    pub const fn step(self, change: ChangeRotation) -> Self {
        match change {
            ChangeRotation::Left => self.step_counter_clockwise(),
            ChangeRotation::Right => self.step_clockwise(),
        }
    }

    /// Rotation that undoes this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg0,
            Self::Deg90 => Self::Deg270,
            Self::Deg180 => Self::Deg180,
            Self::Deg270 => Self::Deg90,
        }
    }

    /// Lower-case name used in logs and file names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Deg0 => "deg0",
            Self::Deg90 => "deg90",
            Self::Deg180 => "deg180",
            Self::Deg270 => "deg270",
        }
    }

    const fn from_index_wrapping(index: usize) -> Self {
        Self::ALL[index % NR_OF_ROTATIONS]
    }
}

/// Converts an integer in `0..=3` to a rotation.
pub fn int_to_rotation(value: i32) -> Result<Rotation, RotationError> {
    Rotation::try_from(value)
}

impl TryFrom<i32> for Rotation {
    type Error = RotationError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|index| Rotation::ALL.get(index).copied())
            .ok_or(RotationError::InvalidArgument {
                value: i64::from(value),
            })
    }
}

impl From<Rotation> for i32 {
    fn from(rotation: Rotation) -> Self {
        rotation.as_i32()
    }
}

impl Add for Rotation {
    type Output = Rotation;

    fn add(self, rhs: Rotation) -> Self::Output {
        Rotation::from_index_wrapping(self.index() + rhs.index())
    }
}

impl Sub for Rotation {
    type Output = Rotation;

    fn sub(self, rhs: Rotation) -> Self::Output {
        Rotation::from_index_wrapping(self.index() + NR_OF_ROTATIONS - rhs.index())
    }
}

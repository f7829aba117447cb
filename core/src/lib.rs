#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Isle engine.
//!
//! This crate defines the value types and the message surface that connect
//! adapters, the authoritative world, and pure systems. Adapters and systems
//! submit [`Command`] values describing desired edits, the world executes
//! those commands via its `apply` entry point, and then broadcasts [`Event`]
//! values describing what changed. Rotation, zoom and the coordinate
//! transforms live here so that every crate projects tiles the same way.

mod building;
mod rotation;
mod transform;
mod zoom;

use glam::IVec2;
use serde::{Deserialize, Serialize};

pub use building::{
    Building, BuildingCatalog, BuildingId, Context, FootprintSize, TextureCatalog, TextureSize,
    BEACH_BUILDING_ID, DEEP_WATER_BUILDING_ID, GRASS_BUILDING_ID, GRASS_GFX,
    NON_ROTATABLE_BUILDING_IDS, SHALLOW_WATER_BUILDING_ID, WATER_GFX,
};
pub use rotation::{int_to_rotation, ChangeRotation, Rotation, RotationError, NR_OF_ROTATIONS};
pub use transform::{
    is_in_bounds, iso_project, map_index, map_to_screen, model_matrix, rotate_position,
};
pub use zoom::{ChangeZoom, Zoom, NR_OF_ZOOMS};


/// Cell of the world grid, measured in DEG0 map coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorldPosition {
    x: i32,
    y: i32,
}

impl WorldPosition {
    /// Creates a new world position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Position shifted by the provided amount of cells.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Position as a glam vector.
    #[must_use]
    pub const fn as_ivec2(&self) -> IVec2 {
        IVec2::new(self.x, self.y)
    }
}

impl From<IVec2> for WorldPosition {
    fn from(value: IVec2) -> Self {
        Self::new(value.x, value.y)
    }
}

/// Index of an island inside the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IslandId(u32);

impl IslandId {
    /// Creates a new island identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Requests placement of a building anchored at the provided origin cell.
    PlaceBuilding {
        /// Building definition to place.
        building: BuildingId,
        /// World cell covered by the top-left cell of the rotated footprint.
        origin: WorldPosition,
        /// Rotation of the building itself.
        rotation: Rotation,
    },
    /// Requests removal of the building covering the provided cell.
    RemoveBuilding {
        /// Any world cell covered by the building.
        position: WorldPosition,
    },
    /// Steps the world rotation once in the requested direction.
    RotateWorld {
        /// Direction of the step.
        change: ChangeRotation,
    },
    /// Steps the world zoom once in the requested direction.
    ZoomWorld {
        /// Direction of the step.
        change: ChangeZoom,
    },
    /// Selects the building covering the provided cell.
    SelectBuilding {
        /// Any world cell covered by the building.
        position: WorldPosition,
    },
    /// Clears the current selection.
    ClearSelection,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// Confirms that a building was placed.
    BuildingPlaced {
        /// Island receiving the building.
        island: IslandId,
        /// Building definition that was placed.
        building: BuildingId,
        /// Top-left world cell of the rotated footprint.
        origin: WorldPosition,
        /// Rotation of the building.
        rotation: Rotation,
        /// Every world cell the building now covers.
        cells: Vec<WorldPosition>,
    },
    /// Reports that a placement request was rejected without mutating the world.
    BuildingPlacementRejected {
        /// Building definition that was requested.
        building: BuildingId,
        /// Requested origin.
        origin: WorldPosition,
        /// Requested rotation.
        rotation: Rotation,
        /// Reason for the rejection.
        reason: PlacementError,
    },
    /// Confirms that a building was removed.
    BuildingRemoved {
        /// Island that held the building.
        island: IslandId,
        /// Building definition that was removed.
        building: BuildingId,
        /// Every world cell the building covered.
        cells: Vec<WorldPosition>,
    },
    /// Reports that a removal request was rejected without mutating the world.
    BuildingRemovalRejected {
        /// Requested cell.
        position: WorldPosition,
        /// Reason for the rejection.
        reason: RemovalError,
    },
    /// Announces the world rotation after a rotate command.
    RotationChanged {
        /// Rotation now in effect.
        rotation: Rotation,
    },
    /// Announces the world zoom after a zoom command.
    ZoomChanged {
        /// Zoom now in effect.
        zoom: Zoom,
    },
    /// Announces which cells are selected after a selection command.
    SelectionChanged {
        /// Island holding the selection, if any.
        island: Option<IslandId>,
        /// Every selected world cell.
        cells: Vec<WorldPosition>,
    },
}

/// Reasons a building placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlacementError {
    /// No building definition exists for the requested id.
    UnknownBuilding,
    /// The origin does not lie on any island.
    NoIsland,
    /// Part of the rotated footprint extends beyond the island.
    OutOfBounds,
    /// Part of the rotated footprint stands on terrain that cannot carry buildings.
    NotBuildable,
    /// Part of the rotated footprint overlaps an existing building.
    Occupied,
}

/// Reasons a building removal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemovalError {
    /// The position does not lie on any island.
    NoIsland,
    /// No building covers the position.
    MissingBuilding,
}

#[cfg(test)]
mod tests {
    use super::{
        BuildingId, ChangeRotation, Command, Event, IslandId, PlacementError, RemovalError,
        Rotation, WorldPosition, Zoom,
    };
    use serde::{de::DeserializeOwned, Serialize};

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn place_command_round_trips_through_bincode() {
        assert_round_trip(&Command::PlaceBuilding {
            building: BuildingId::new(1012),
            origin: WorldPosition::new(4, 9),
            rotation: Rotation::Deg270,
        });
    }

    #[test]
    fn rotate_command_round_trips_through_bincode() {
        assert_round_trip(&Command::RotateWorld {
            change: ChangeRotation::Left,
        });
    }

    #[test]
    fn placement_rejection_round_trips_through_bincode() {
        assert_round_trip(&Event::BuildingPlacementRejected {
            building: BuildingId::new(1012),
            origin: WorldPosition::new(-1, 2),
            rotation: Rotation::Deg90,
            reason: PlacementError::Occupied,
        });
    }

    #[test]
    fn removal_event_round_trips_through_bincode() {
        assert_round_trip(&Event::BuildingRemoved {
            island: IslandId::new(3),
            building: BuildingId::new(7),
            cells: vec![WorldPosition::new(1, 1), WorldPosition::new(2, 1)],
        });
        assert_round_trip(&RemovalError::MissingBuilding);
    }

    #[test]
    fn zoom_round_trips_through_bincode() {
        for zoom in Zoom::ALL {
            assert_round_trip(&zoom);
        }
    }

    #[test]
    fn world_position_offsets_both_axes() {
        let origin = WorldPosition::new(5, 7);
        assert_eq!(origin.offset(2, -3), WorldPosition::new(7, 4));
        assert_eq!(origin.as_ivec2(), glam::IVec2::new(5, 7));
    }
}

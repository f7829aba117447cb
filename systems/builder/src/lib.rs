#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure builder system that turns a per-frame input snapshot into world commands.
//!
//! The system remembers which building the player picked and how it is
//! rotated. Everything it wants to change in the world leaves as a
//! [`Command`]; the world validates and applies the batch in one place.

use isle_core::{BuildingId, ChangeRotation, ChangeZoom, Command, Rotation, WorldPosition};

/// Declarative placement preview describing a potential building construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Building proposed for placement.
    pub building: BuildingId,
    /// World cell anchoring the top-left corner of the rotated footprint.
    pub origin: WorldPosition,
    /// Rotation the building would be placed with.
    pub rotation: Rotation,
    /// Indicates whether the preview represents a valid placement location.
    pub placeable: bool,
}

impl PlacementPreview {
    /// Creates a new placement preview descriptor.
    #[must_use]
    pub const fn new(
        building: BuildingId,
        origin: WorldPosition,
        rotation: Rotation,
        placeable: bool,
    ) -> Self {
        Self {
            building,
            origin,
            rotation,
            placeable,
        }
    }
}

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuilderInput {
    /// Building picked from the build menu on this frame.
    pub choose_building: Option<BuildingId>,
    /// Drops the picked building and the current selection.
    pub cancel_action: bool,
    /// Turns the picked building by one quarter.
    pub rotate_building: Option<ChangeRotation>,
    /// Steps the world rotation.
    pub rotate_world: Option<ChangeRotation>,
    /// Steps the world zoom.
    pub zoom_world: Option<ChangeZoom>,
    /// Places the picked building, or selects the building under the cursor.
    pub confirm_action: bool,
    /// Removes the building under the cursor.
    pub remove_action: bool,
    /// World cell currently hovered by the cursor.
    pub cursor_cell: Option<WorldPosition>,
}

/// Builder system that translates input snapshots into placement commands.
#[derive(Clone, Debug, Default)]
pub struct Builder {
    building: Option<BuildingId>,
    rotation: Rotation,
}

impl Builder {
    /// Creates a new builder system instance with nothing picked.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            building: None,
            rotation: Rotation::Deg0,
        }
    }

    /// Building currently picked for placement.
    #[must_use]
    pub fn building(&self) -> Option<BuildingId> {
        self.building
    }

    /// Rotation the picked building is placed with.
    ///
    /// Buildings the player may not rotate always report [`Rotation::Deg0`].
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        match self.building {
            Some(building) if !building.is_player_rotatable() => Rotation::Deg0,
            _ => self.rotation,
        }
    }

    /// Describes where the picked building would land under the cursor.
    ///
    /// `is_buildable` should mirror the world's `query::is_buildable_at`.
    pub fn preview<F>(
        &self,
        cursor_cell: Option<WorldPosition>,
        mut is_buildable: F,
    ) -> Option<PlacementPreview>
    where
        F: FnMut(BuildingId, WorldPosition, Rotation) -> bool,
    {
        let building = self.building?;
        let origin = cursor_cell?;
        let rotation = self.rotation();
        Some(PlacementPreview::new(
            building,
            origin,
            rotation,
            is_buildable(building, origin, rotation),
        ))
    }

    /// Consumes adapter input and emits the commands for this frame.
    ///
    /// The `building_at` closure should mirror the semantics of the world's
    /// buildings layer lookup so the system can identify the hovered building.
    pub fn handle<F>(
        &mut self,
        preview: Option<PlacementPreview>,
        input: BuilderInput,
        mut building_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(WorldPosition) -> Option<BuildingId>,
    {
        if let Some(change) = input.rotate_world {
            out.push(Command::RotateWorld { change });
        }
        if let Some(change) = input.zoom_world {
            out.push(Command::ZoomWorld { change });
        }

        if input.cancel_action {
            self.building = None;
            self.rotation = Rotation::Deg0;
            out.push(Command::ClearSelection);
            return;
        }

        if let Some(building) = input.choose_building {
            if self.building != Some(building) {
                self.rotation = Rotation::Deg0;
            }
            self.building = Some(building);
        }

        if let Some(change) = input.rotate_building {
            self.rotation = match change {
                ChangeRotation::Left => self.rotation - Rotation::Deg90,
                ChangeRotation::Right => self.rotation + Rotation::Deg90,
            };
        }

        if input.confirm_action {
            match self.building {
                Some(_) => {
                    if let Some(preview) = preview.filter(|preview| preview.placeable) {
                        out.push(Command::PlaceBuilding {
                            building: preview.building,
                            origin: preview.origin,
                            rotation: preview.rotation,
                        });
                    }
                }
                None => {
                    if let Some(position) = input.cursor_cell {
                        if building_at(position).is_some() {
                            out.push(Command::SelectBuilding { position });
                        } else {
                            out.push(Command::ClearSelection);
                        }
                    }
                }
            }
        }

        if input.remove_action {
            if let Some(position) = input.cursor_cell {
                if building_at(position).is_some() {
                    out.push(Command::RemoveBuilding { position });
                }
            }
        }
    }
}

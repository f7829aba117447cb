//! Tiles stored inside a layer.

use glam::{IVec2, Vec2};
use isle_core::{
    map_index, map_to_screen, BuildingId, Context, Rotation, Zoom, NR_OF_ROTATIONS, NR_OF_ZOOMS,
};

use crate::{file::TileRecord, LayerError, LayerGeometry};

/// A single cell of a layer.
///
/// Persisted fields are the building, its rotation, the local offset inside
/// the footprint and the connected cells. Everything else is derived from the
/// layer geometry by [`Tile::pre_calc`] and never written to disk.
#[derive(Clone, Debug, PartialEq)]
pub struct Tile {
    building: Option<BuildingId>,
    rotation: Rotation,
    local: IVec2,
    connected: Vec<i32>,
    map_position: IVec2,
    world_position: IVec2,
    screen_positions: [[Vec2; NR_OF_ROTATIONS]; NR_OF_ZOOMS],
    indices: [i32; NR_OF_ROTATIONS],
    pub(crate) instance_ids: [usize; NR_OF_ROTATIONS],
    gfxs: Vec<i32>,
    selected: bool,
}

impl Tile {
    /// Creates an empty tile located at `map_position` inside its layer.
    #[must_use]
    pub fn empty(map_position: IVec2) -> Self {
        Self {
            building: None,
            rotation: Rotation::Deg0,
            local: IVec2::ZERO,
            connected: Vec::new(),
            map_position,
            world_position: map_position,
            screen_positions: [[Vec2::ZERO; NR_OF_ROTATIONS]; NR_OF_ZOOMS],
            indices: [0; NR_OF_ROTATIONS],
            instance_ids: [0; NR_OF_ROTATIONS],
            gfxs: Vec::new(),
            selected: false,
        }
    }

    /// Creates the tile of one footprint cell of a building.
    ///
    /// `local` is the offset of the cell inside the placed footprint and
    /// `connected` lists the DEG0 layer indices of the other cells.
    #[must_use]
    pub fn building_part(
        map_position: IVec2,
        building: BuildingId,
        rotation: Rotation,
        local: IVec2,
        connected: Vec<i32>,
    ) -> Self {
        Self {
            building: Some(building),
            rotation,
            local,
            connected,
            ..Self::empty(map_position)
        }
    }

    /// Restores a tile from its persisted form.
    ///
    /// `None` and records without a non-negative id produce empty tiles.
    pub fn from_record(
        map_position: IVec2,
        record: Option<&TileRecord>,
    ) -> Result<Self, isle_core::RotationError> {
        let mut tile = Self::empty(map_position);
        let Some(record) = record else {
            return Ok(tile);
        };

        tile.building = record.id.and_then(BuildingId::from_persisted);
        if let Some(rotation) = record.rotation {
            tile.rotation = isle_core::int_to_rotation(rotation)?;
        }
        tile.local = IVec2::new(record.x.unwrap_or(0), record.y.unwrap_or(0));
        tile.connected = record.connected.clone().unwrap_or_default();
        Ok(tile)
    }

    /// Persisted form of the tile, `None` for empty tiles even when they were
    /// loaded from a record carrying a rotation or offset.
    #[must_use]
    pub fn to_record(&self) -> Option<TileRecord> {
        let building = self.building?;
        Some(TileRecord {
            id: Some(i64::from(building.get())),
            rotation: Some(self.rotation.as_i32()),
            x: Some(self.local.x),
            y: Some(self.local.y),
            connected: Some(self.connected.clone()),
        })
    }

    /// Building standing on the tile.
    #[must_use]
    pub fn building(&self) -> Option<BuildingId> {
        self.building
    }

    /// Whether a building stands on the tile.
    #[must_use]
    pub fn has_building(&self) -> bool {
        self.building.is_some()
    }

    /// Rotation of the building standing on the tile.
    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Offset of the tile inside the placed footprint of its building.
    #[must_use]
    pub fn local_offset(&self) -> IVec2 {
        self.local
    }

    /// DEG0 layer indices of the other cells of the same building.
    #[must_use]
    pub fn connected(&self) -> &[i32] {
        &self.connected
    }

    /// Position inside the owning layer.
    #[must_use]
    pub fn map_position(&self) -> IVec2 {
        self.map_position
    }

    /// Position inside the world.
    #[must_use]
    pub fn world_position(&self) -> IVec2 {
        self.world_position
    }

    /// Unadjusted screen position for a zoom and world rotation.
    #[must_use]
    pub fn screen_position(&self, zoom: Zoom, rotation: Rotation) -> Vec2 {
        self.screen_positions[zoom.index()][rotation.index()]
    }

    /// Render sort key for a world rotation.
    #[must_use]
    pub fn index(&self, rotation: Rotation) -> i32 {
        self.indices[rotation.index()]
    }

    /// Instance slot of the tile for a world rotation.
    #[must_use]
    pub fn instance_id(&self, rotation: Rotation) -> usize {
        self.instance_ids[rotation.index()]
    }

    /// Top-left graphics of the building, one per rotation or a single entry.
    #[must_use]
    pub fn gfxs(&self) -> &[i32] {
        &self.gfxs
    }

    /// Whether the tile belongs to the current selection.
    #[must_use]
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub(crate) fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }

    /// Clears every field, including the derived ones.
    pub fn reset(&mut self) {
        *self = Self::empty(IVec2::ZERO);
    }

    /// Clears the building and everything that depends on it.
    ///
    /// Positions, sort keys and instance slots stay untouched so the tile
    /// keeps its place in the render order.
    pub fn reset_building_info(&mut self) {
        self.building = None;
        self.rotation = Rotation::Deg0;
        self.local = IVec2::ZERO;
        self.gfxs.clear();
        self.connected.clear();
        self.selected = false;
    }

    /// Copies the building of `other` onto this tile, keeping derived positions.
    pub(crate) fn assign_building_info(&mut self, other: &Tile) {
        self.building = other.building;
        self.rotation = other.rotation;
        self.local = other.local;
        self.connected = other.connected.clone();
        self.gfxs.clear();
        self.selected = false;
    }

    /// Derives screen positions, sort keys and rotation graphics.
    pub(crate) fn pre_calc(
        &mut self,
        geometry: &LayerGeometry,
        ctx: &Context<'_>,
    ) -> Result<(), LayerError> {
        self.world_position = geometry.origin() + self.map_position;
        self.pre_calc_positions(geometry);
        self.pre_calc_gfxs(ctx)
    }

    pub(crate) fn pre_calc_gfxs(&mut self, ctx: &Context<'_>) -> Result<(), LayerError> {
        self.gfxs = match self.building {
            Some(id) => ctx
                .buildings
                .building(id)
                .ok_or(LayerError::UnknownBuilding { id })?
                .rotation_gfxs(),
            None => Vec::new(),
        };
        Ok(())
    }

    fn pre_calc_positions(&mut self, geometry: &LayerGeometry) {
        let world_size = geometry.world_size();
        for zoom in Zoom::ALL {
            for rotation in Rotation::ALL {
                self.screen_positions[zoom.index()][rotation.index()] = map_to_screen(
                    self.world_position.x,
                    self.world_position.y,
                    world_size.x,
                    world_size.y,
                    zoom,
                    rotation,
                );
            }
        }

        for rotation in Rotation::ALL {
            self.indices[rotation.index()] = map_index(
                self.map_position.x,
                self.map_position.y,
                geometry.width(),
                geometry.height(),
                rotation,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_records_restore_empty_tiles() {
        let position = IVec2::new(2, 1);
        let tile = Tile::from_record(position, None).expect("empty tile");
        assert!(!tile.has_building());

        let negative = TileRecord {
            id: Some(-1),
            rotation: Some(2),
            x: Some(0),
            y: Some(0),
            connected: Some(Vec::new()),
        };
        let tile = Tile::from_record(position, Some(&negative)).expect("negative id");
        assert!(!tile.has_building(), "negative ids describe empty tiles");
        assert_eq!(tile.to_record(), None, "empty tiles are saved as null");
    }

    #[test]
    fn invalid_rotations_are_rejected() {
        let record = TileRecord {
            id: Some(101),
            rotation: Some(4),
            x: None,
            y: None,
            connected: None,
        };
        assert!(Tile::from_record(IVec2::ZERO, Some(&record)).is_err());
    }

    #[test]
    fn persisted_fields_survive_a_record_round_trip() {
        let record = TileRecord {
            id: Some(1012),
            rotation: Some(3),
            x: Some(1),
            y: Some(0),
            connected: Some(vec![4, 9, 10]),
        };
        let tile = Tile::from_record(IVec2::new(3, 2), Some(&record)).expect("valid record");

        assert_eq!(tile.building(), Some(BuildingId::new(1012)));
        assert_eq!(tile.rotation(), Rotation::Deg270);
        assert_eq!(tile.local_offset(), IVec2::new(1, 0));
        assert_eq!(tile.to_record(), Some(record));
    }

    #[test]
    fn resetting_building_info_keeps_the_render_slot() {
        let mut tile = Tile::building_part(
            IVec2::new(4, 4),
            BuildingId::new(7),
            Rotation::Deg90,
            IVec2::new(1, 1),
            vec![1, 2, 3],
        );
        tile.instance_ids = [3, 1, 4, 1];
        tile.set_selected(true);

        tile.reset_building_info();

        assert!(!tile.has_building());
        assert!(tile.connected().is_empty());
        assert!(!tile.is_selected());
        assert_eq!(tile.map_position(), IVec2::new(4, 4));
        assert_eq!(tile.instance_id(Rotation::Deg180), 4);

        tile.reset();
        assert_eq!(tile.map_position(), IVec2::ZERO);
        assert_eq!(tile.instance_id(Rotation::Deg180), 0);
    }
}

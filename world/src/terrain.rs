//! All islands of a world and the queries spanning their layers.

use glam::IVec2;
use isle_core::{Building, BuildingCatalog, PlacementError, Rotation};

use crate::{Island, Tile};

/// Produces the tiles of a building placed with its rotated footprint's
/// top-left cell at `origin`.
///
/// `origin` is a layer-local position and `layer_width` the number of
/// columns of that layer. Each tile records its offset inside the rotated
/// footprint and the DEG0 layer indices of the other cells.
#[must_use]
pub fn building_tiles(
    building: &Building,
    origin: IVec2,
    rotation: Rotation,
    layer_width: i32,
) -> Vec<Tile> {
    let extent = building.size.rotated(rotation);
    let offsets: Vec<IVec2> = (0..extent.height())
        .flat_map(|y| (0..extent.width()).map(move |x| IVec2::new(x, y)))
        .collect();
    let indices: Vec<i32> = offsets
        .iter()
        .map(|offset| {
            let cell = origin + *offset;
            cell.y * layer_width + cell.x
        })
        .collect();

    offsets
        .iter()
        .zip(&indices)
        .map(|(offset, index)| {
            let connected = indices.iter().copied().filter(|other| other != index).collect();
            Tile::building_part(origin + *offset, building.id, rotation, *offset, connected)
        })
        .collect()
}

/// Islands of the world, indexed by their [`isle_core::IslandId`].
#[derive(Clone, Debug, Default)]
pub struct Terrain {
    islands: Vec<Island>,
}

impl Terrain {
    /// Wraps already validated islands.
    #[must_use]
    pub fn new(islands: Vec<Island>) -> Self {
        Self { islands }
    }

    /// Every island in file order.
    #[must_use]
    pub fn islands(&self) -> &[Island] {
        &self.islands
    }

    pub(crate) fn island_mut(&mut self, index: usize) -> Option<&mut Island> {
        self.islands.get_mut(index)
    }

    /// Index of the island covering a world position.
    #[must_use]
    pub fn island_index_at(&self, position: IVec2) -> Option<usize> {
        self.islands
            .iter()
            .position(|island| island.aabb().contains(position))
    }

    /// Island covering a world position.
    #[must_use]
    pub fn island_at(&self, position: IVec2) -> Option<&Island> {
        self.island_index_at(position).map(|index| &self.islands[index])
    }

    /// Checks whether `building` may be placed with its rotated footprint
    /// starting at the world position `origin`.
    ///
    /// Every covered cell must lie on the origin's island, stand on elevated
    /// terrain and be free in the buildings layer. Returns the island index.
    pub fn is_buildable_at(
        &self,
        origin: IVec2,
        building: &Building,
        rotation: Rotation,
        buildings: &dyn BuildingCatalog,
    ) -> Result<usize, PlacementError> {
        let index = self
            .island_index_at(origin)
            .ok_or(PlacementError::NoIsland)?;
        let island = &self.islands[index];
        let extent = building.size.rotated(rotation);

        for y in 0..extent.height() {
            for x in 0..extent.width() {
                let cell = island
                    .world_to_island(origin + IVec2::new(x, y))
                    .ok_or(PlacementError::OutOfBounds)?;

                let elevated = island
                    .terrain()
                    .tile(cell.x, cell.y)
                    .and_then(Tile::building)
                    .and_then(|id| buildings.building(id))
                    .is_some_and(Building::is_elevated);
                if !elevated {
                    return Err(PlacementError::NotBuildable);
                }

                if island.is_removable(cell) {
                    return Err(PlacementError::Occupied);
                }
            }
        }

        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use isle_core::{BuildingId, FootprintSize};

    use super::*;

    fn warehouse() -> Building {
        Building {
            id: BuildingId::new(1012),
            gfx: 200,
            size: FootprintSize::new(3, 2),
            rotate: 6,
            posoffs: 20,
        }
    }

    #[test]
    fn placement_tiles_cover_the_rotated_footprint() {
        let tiles = building_tiles(&warehouse(), IVec2::new(1, 2), Rotation::Deg90, 10);
        assert_eq!(tiles.len(), 6);

        let positions: Vec<IVec2> = tiles.iter().map(Tile::map_position).collect();
        assert_eq!(positions.first(), Some(&IVec2::new(1, 2)));
        assert_eq!(positions.last(), Some(&IVec2::new(2, 4)), "quarter turns swap the extent");

        for tile in &tiles {
            assert_eq!(tile.rotation(), Rotation::Deg90);
            assert_eq!(tile.map_position() - IVec2::new(1, 2), tile.local_offset());
            assert_eq!(tile.connected().len(), 5);
            let own = tile.map_position().y * 10 + tile.map_position().x;
            assert!(!tile.connected().contains(&own), "tiles never connect to themselves");
        }
    }

    #[test]
    fn single_cell_buildings_have_no_connections() {
        let mut kiosk = warehouse();
        kiosk.size = FootprintSize::new(1, 1);
        let tiles = building_tiles(&kiosk, IVec2::new(4, 4), Rotation::Deg270, 8);
        assert_eq!(tiles.len(), 1);
        assert!(tiles[0].connected().is_empty());
    }
}

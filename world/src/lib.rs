#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for Isle.
//!
//! The world owns every island, the deep water around them and the world grid.
//! Each of those is a [`Layer`] whose tiles are sorted once per rotation and
//! whose GPU instance arrays are patched in place when buildings change.
//! Mutations happen exclusively through [`apply`]; adapters read state via
//! [`query`].

mod catalog;
mod config;
mod error;
pub mod file;
mod gfx;
mod island;
mod layer;
mod terrain;
mod tile;
mod water;

use std::path::Path;

use glam::IVec2;
use isle_core::{
    BuildingId, Command, Context, Event, IslandId, PlacementError, RemovalError, Rotation,
    WorldPosition, Zoom,
};
use tracing::{debug, info};

pub use catalog::Catalog;
pub use config::{WorldConfig, MAP_VERSION};
pub use error::{CatalogError, ConfigError, IslandError, LayerError, MapFileError, WorldError};
pub use gfx::{footprint_offset, footprint_rotation, resolve_gfx};
pub use island::{Aabb, Island};
pub use layer::{Layer, LayerGeometry, LayerKind, ScreenBounds, NO_INSTANCE_VALUE};
pub use terrain::{building_tiles, Terrain};
pub use tile::Tile;
pub use water::deep_water_layer;

use file::MapFile;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Selection {
    island: usize,
    cells: Vec<IVec2>,
}

/// Represents the authoritative Isle world state.
#[derive(Clone, Debug)]
pub struct World {
    width: i32,
    height: i32,
    rotation: Rotation,
    zoom: Zoom,
    map_version: String,
    terrain: Terrain,
    deep_water: Layer,
    world_grid: Layer,
    selection: Option<Selection>,
}

impl World {
    /// Builds a world from a parsed map file.
    pub fn from_map(
        map: &MapFile,
        ctx: &Context<'_>,
        config: &WorldConfig,
    ) -> Result<Self, WorldError> {
        let (width, height) = (map.world.width, map.world.height);
        if !config.accepts_world_size(width, height) {
            return Err(WorldError::InvalidWorldSize {
                width,
                height,
                min: config.min_world_size,
                max: config.max_world_size,
            });
        }

        let world_size = IVec2::new(width, height);
        let bounds = Aabb::new(IVec2::ZERO, world_size);
        let mut islands: Vec<Island> = Vec::with_capacity(map.islands.len());
        for (index, record) in map.islands.iter().enumerate() {
            let id = IslandId::new(u32::try_from(index).unwrap_or(u32::MAX));
            let island = Island::from_record(id, record, world_size, ctx)
                .map_err(|source| WorldError::Island { index, source })?;

            if !bounds.encloses(island.aabb()) {
                return Err(WorldError::IslandOutsideWorld { index });
            }
            if let Some(first) = islands
                .iter()
                .position(|other| other.aabb().intersects(island.aabb()))
            {
                return Err(WorldError::OverlappingIslands {
                    first,
                    second: index,
                });
            }
            islands.push(island);
        }

        let deep_water = deep_water_layer(world_size, &islands, ctx)?;
        let world_grid = Layer::world_grid(world_size, ctx)?;

        info!(width, height, islands = islands.len(), "created world");

        Ok(Self {
            width,
            height,
            rotation: config.initial_rotation,
            zoom: config.initial_zoom,
            map_version: config.map_version.clone(),
            terrain: Terrain::new(islands),
            deep_water,
            world_grid,
            selection: None,
        })
    }

    /// Reads a map file and builds the world it describes.
    pub fn load(
        path: impl AsRef<Path>,
        ctx: &Context<'_>,
        config: &WorldConfig,
    ) -> Result<Self, WorldError> {
        let map = MapFile::load(path, &config.map_version)?;
        Self::from_map(&map, ctx, config)
    }

    /// Persisted form of the world, including every placed building.
    #[must_use]
    pub fn to_map_file(&self) -> MapFile {
        let mut map = MapFile::new(self.map_version.clone(), self.width, self.height);
        map.islands = self
            .terrain
            .islands()
            .iter()
            .map(Island::to_record)
            .collect();
        map
    }

    /// Writes the world to a `.map` file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), WorldError> {
        self.to_map_file().save(path)?;
        Ok(())
    }

    fn clear_selection(&mut self) -> Result<(), WorldError> {
        let Some(selection) = self.selection.take() else {
            return Ok(());
        };
        if let Some(island) = self.terrain.island_mut(selection.island) {
            island.set_selected(&selection.cells, false)?;
        }
        Ok(())
    }

    fn place_building(
        &mut self,
        building_id: BuildingId,
        origin: WorldPosition,
        rotation: Rotation,
        ctx: &Context<'_>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let reject = |reason| Event::BuildingPlacementRejected {
            building: building_id,
            origin,
            rotation,
            reason,
        };

        let Some(building) = ctx.buildings.building(building_id) else {
            out_events.push(reject(PlacementError::UnknownBuilding));
            return Ok(());
        };

        let index = match self.terrain.is_buildable_at(
            origin.as_ivec2(),
            building,
            rotation,
            ctx.buildings,
        ) {
            Ok(index) => index,
            Err(reason) => {
                out_events.push(reject(reason));
                return Ok(());
            }
        };

        let Some(island) = self.terrain.island_mut(index) else {
            out_events.push(reject(PlacementError::NoIsland));
            return Ok(());
        };
        let local_origin = origin.as_ivec2() - island.aabb().position;
        let tiles = building_tiles(building, local_origin, rotation, island.width());
        island.add_building(&tiles, ctx)?;

        let island_origin = island.aabb().position;
        let cells = tiles
            .iter()
            .map(|tile| WorldPosition::from(island_origin + tile.map_position()))
            .collect();
        debug!(
            building = building_id.get(),
            x = origin.x(),
            y = origin.y(),
            rotation = rotation.name(),
            "placed building"
        );
        out_events.push(Event::BuildingPlaced {
            island: island.id(),
            building: building_id,
            origin,
            rotation,
            cells,
        });
        Ok(())
    }

    fn remove_building(
        &mut self,
        position: WorldPosition,
        ctx: &Context<'_>,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let reject = |reason| Event::BuildingRemovalRejected { position, reason };

        let Some(index) = self.terrain.island_index_at(position.as_ivec2()) else {
            out_events.push(reject(RemovalError::NoIsland));
            return Ok(());
        };
        let Some(island) = self.terrain.island_mut(index) else {
            out_events.push(reject(RemovalError::NoIsland));
            return Ok(());
        };
        let Some(local) = island.world_to_island(position.as_ivec2()) else {
            out_events.push(reject(RemovalError::NoIsland));
            return Ok(());
        };
        let (Some(building), Some(cells)) = (
            island
                .buildings()
                .tile(local.x, local.y)
                .and_then(Tile::building),
            island.building_cells(local),
        ) else {
            out_events.push(reject(RemovalError::MissingBuilding));
            return Ok(());
        };

        let deselect = self
            .selection
            .as_ref()
            .is_some_and(|selection| selection.island == index && selection.cells.contains(&local));

        island.remove_building(&cells, ctx)?;
        let island_id = island.id();
        let island_origin = island.aabb().position;

        if deselect {
            self.selection = None;
            out_events.push(Event::SelectionChanged {
                island: None,
                cells: Vec::new(),
            });
        }

        debug!(building = building.get(), x = position.x(), y = position.y(), "removed building");
        out_events.push(Event::BuildingRemoved {
            island: island_id,
            building,
            cells: cells
                .iter()
                .map(|cell| WorldPosition::from(island_origin + *cell))
                .collect(),
        });
        Ok(())
    }

    fn select_building(
        &mut self,
        position: WorldPosition,
        out_events: &mut Vec<Event>,
    ) -> Result<(), WorldError> {
        let target = self.terrain.island_index_at(position.as_ivec2()).and_then(|index| {
            let island = &self.terrain.islands()[index];
            let local = island.world_to_island(position.as_ivec2())?;
            island.building_cells(local).map(|cells| (index, cells))
        });
        self.clear_selection()?;

        let Some((index, cells)) = target else {
            out_events.push(Event::SelectionChanged {
                island: None,
                cells: Vec::new(),
            });
            return Ok(());
        };

        let Some(island) = self.terrain.island_mut(index) else {
            return Ok(());
        };
        island.set_selected(&cells, true)?;
        let island_origin = island.aabb().position;
        out_events.push(Event::SelectionChanged {
            island: Some(island.id()),
            cells: cells
                .iter()
                .map(|cell| WorldPosition::from(island_origin + *cell))
                .collect(),
        });
        self.selection = Some(Selection {
            island: index,
            cells,
        });
        Ok(())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Invalid edits are reported through rejection events and leave the world
/// untouched. An `Err` signals corrupt content, such as a building whose
/// graphics are missing from the texture catalog.
pub fn apply(
    world: &mut World,
    command: Command,
    ctx: &Context<'_>,
    out_events: &mut Vec<Event>,
) -> Result<(), WorldError> {
    match command {
        Command::PlaceBuilding {
            building,
            origin,
            rotation,
        } => world.place_building(building, origin, rotation, ctx, out_events),
        Command::RemoveBuilding { position } => world.remove_building(position, ctx, out_events),
        Command::RotateWorld { change } => {
            world.rotation = world.rotation.step(change);
            out_events.push(Event::RotationChanged {
                rotation: world.rotation,
            });
            Ok(())
        }
        Command::ZoomWorld { change } => {
            world.zoom = world.zoom.step(change);
            out_events.push(Event::ZoomChanged { zoom: world.zoom });
            Ok(())
        }
        Command::SelectBuilding { position } => world.select_building(position, out_events),
        Command::ClearSelection => {
            world.clear_selection()?;
            out_events.push(Event::SelectionChanged {
                island: None,
                cells: Vec::new(),
            });
            Ok(())
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::{IVec2, Vec2};
    use isle_core::{
        map_to_screen, Building, BuildingCatalog, PlacementError, Rotation, WorldPosition, Zoom,
    };

    use super::{Island, Layer, LayerKind, Tile, World};

    /// Number of columns and rows of the world.
    #[must_use]
    pub fn world_size(world: &World) -> IVec2 {
        IVec2::new(world.width, world.height)
    }

    /// Rotation currently in effect.
    #[must_use]
    pub fn rotation(world: &World) -> Rotation {
        world.rotation
    }

    /// Zoom currently in effect.
    #[must_use]
    pub fn zoom(world: &World) -> Zoom {
        world.zoom
    }

    /// Whether a world position lies inside the world.
    #[must_use]
    pub fn is_position_in_world(world: &World, position: WorldPosition) -> bool {
        isle_core::is_in_bounds(position.x(), position.y(), world.width, world.height)
    }

    /// Unadjusted screen position of a world cell under the current zoom and rotation.
    #[must_use]
    pub fn world_to_screen(world: &World, position: WorldPosition) -> Vec2 {
        map_to_screen(
            position.x(),
            position.y(),
            world.width,
            world.height,
            world.zoom,
            world.rotation,
        )
    }

    /// Every island of the world.
    #[must_use]
    pub fn islands(world: &World) -> &[Island] {
        world.terrain.islands()
    }

    /// Island covering a world position.
    #[must_use]
    pub fn island_at(world: &World, position: WorldPosition) -> Option<&Island> {
        world.terrain.island_at(position.as_ivec2())
    }

    /// Layer covering the whole world outside the islands.
    #[must_use]
    pub fn deep_water(world: &World) -> &Layer {
        &world.deep_water
    }

    /// Outline of every world cell.
    #[must_use]
    pub fn world_grid(world: &World) -> &Layer {
        &world.world_grid
    }

    /// Layer of the given kind containing a world position.
    #[must_use]
    pub fn layer_at(world: &World, kind: LayerKind, position: WorldPosition) -> Option<&Layer> {
        match kind {
            LayerKind::DeepWater => Some(&world.deep_water),
            LayerKind::WorldGrid => Some(&world.world_grid),
            _ => island_at(world, position).and_then(|island| island.layer(kind)),
        }
    }

    /// Tile of the given layer kind at a world position.
    #[must_use]
    pub fn tile(world: &World, kind: LayerKind, position: WorldPosition) -> Option<&Tile> {
        layer_at(world, kind, position)?.tile_at_world(position.as_ivec2())
    }

    /// Instance slot of the tile at a world position for the current rotation.
    #[must_use]
    pub fn instance_id(world: &World, kind: LayerKind, position: WorldPosition) -> Option<usize> {
        layer_at(world, kind, position)?.instance_id(position.as_ivec2(), world.rotation)
    }

    /// Checks whether a building could be placed without mutating the world.
    pub fn is_buildable_at(
        world: &World,
        origin: WorldPosition,
        building: &Building,
        rotation: Rotation,
        buildings: &dyn BuildingCatalog,
    ) -> Result<(), PlacementError> {
        world
            .terrain
            .is_buildable_at(origin.as_ivec2(), building, rotation, buildings)
            .map(|_| ())
    }

    /// World cells of the current selection.
    #[must_use]
    pub fn selection(world: &World) -> Vec<WorldPosition> {
        let Some(selection) = &world.selection else {
            return Vec::new();
        };
        let Some(island) = world.terrain.islands().get(selection.island) else {
            return Vec::new();
        };
        selection
            .cells
            .iter()
            .map(|cell| WorldPosition::from(island.aabb().position + *cell))
            .collect()
    }
}

//! Layers: a tile arena plus the per-rotation render order and the GPU
//! instance arrays derived from it.
//!
//! Tiles live once in DEG0 order. Every rotation owns a permutation over that
//! arena sorted by the tile's render index; the position of a tile inside the
//! permutation is its instance slot for that rotation. Edits overwrite the
//! slots of the touched tiles and never re-sort.

use std::collections::HashMap;

use glam::{IVec2, IVec4, Mat4, Vec2};
use isle_core::{
    is_in_bounds, model_matrix, Context, Rotation, Zoom, GRASS_BUILDING_ID, GRASS_GFX,
    NR_OF_ROTATIONS, NR_OF_ZOOMS, WATER_GFX,
};
use tracing::{debug, trace};

use crate::{file::TileRecord, gfx::resolve_gfx, LayerError, Tile};

/// Value stored in instance arrays for "no graphic" and "no building".
pub const NO_INSTANCE_VALUE: i32 = -1;

/// Rendering concern served by a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Shallow water and beach around an island.
    Coast,
    /// Ground tiles of an island.
    Terrain,
    /// Placed buildings of an island.
    Buildings,
    /// Terrain with every building drawn on top.
    Mixed,
    /// Open sea covering every world cell outside the islands.
    DeepWater,
    /// Outline of every buildable island cell.
    Grid,
    /// Outline of every world cell.
    WorldGrid,
}

impl LayerKind {
    /// Lower-case name used in files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Coast => "coast",
            Self::Terrain => "terrain",
            Self::Buildings => "buildings",
            Self::Mixed => "mixed",
            Self::DeepWater => "deep_water",
            Self::Grid => "grid",
            Self::WorldGrid => "world_grid",
        }
    }

    /// Whether instances carry graphic and building ids.
    #[must_use]
    pub const fn has_instance_gfx(self) -> bool {
        !matches!(self, Self::Grid | Self::WorldGrid)
    }
}

/// Index space and world placement shared by every tile of a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayerGeometry {
    origin: IVec2,
    width: i32,
    height: i32,
    world_size: IVec2,
}

impl LayerGeometry {
    /// Describes a `width` x `height` layer whose top-left cell sits at `origin`.
    #[must_use]
    pub const fn new(origin: IVec2, width: i32, height: i32, world_size: IVec2) -> Self {
        Self {
            origin,
            width,
            height,
            world_size,
        }
    }

    /// Describes a layer covering the whole world.
    #[must_use]
    pub const fn world(world_size: IVec2) -> Self {
        Self::new(IVec2::ZERO, world_size.x, world_size.y, world_size)
    }

    /// World position of the layer's top-left cell.
    #[must_use]
    pub const fn origin(&self) -> IVec2 {
        self.origin
    }

    /// Number of columns of the index space.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of rows of the index space.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Size of the world the layer is projected into.
    #[must_use]
    pub const fn world_size(&self) -> IVec2 {
        self.world_size
    }

    /// Number of cells of the index space.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        usize::try_from(self.width * self.height).unwrap_or(0)
    }

    /// Whether a layer-local position lies inside the index space.
    #[must_use]
    pub const fn contains(&self, position: IVec2) -> bool {
        is_in_bounds(position.x, position.y, self.width, self.height)
    }

    /// Layer-local position of the cell at `index` in row-major DEG0 order.
    #[must_use]
    pub const fn position_of(&self, index: i32) -> IVec2 {
        IVec2::new(index % self.width, index / self.width)
    }
}

/// Every connected index of a building tile must name a cell of the same
/// building. `tiles` are in row-major order.
fn check_connections(tiles: &[Tile]) -> Result<(), LayerError> {
    for tile in tiles.iter().filter(|tile| tile.has_building()) {
        for &index in tile.connected() {
            let partner = usize::try_from(index).ok().and_then(|slot| tiles.get(slot));
            if partner.map_or(true, |partner| partner.building() != tile.building()) {
                let position = tile.map_position();
                return Err(LayerError::InvalidConnection {
                    x: position.x,
                    y: position.y,
                    index,
                });
            }
        }
    }
    Ok(())
}

/// Screen-space rectangle enclosing every sprite of a layer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenBounds {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl ScreenBounds {
    /// Whether the rectangle shares any area with `other`.
    #[must_use]
    pub fn intersects(&self, other: &ScreenBounds) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

type ModelMatrices = [[Vec<Mat4>; NR_OF_ROTATIONS]; NR_OF_ZOOMS];

struct InstanceValues {
    matrices: [[Mat4; NR_OF_ROTATIONS]; NR_OF_ZOOMS],
    gfx: [i32; NR_OF_ROTATIONS],
    building: i32,
}

/// Tile collection for one rendering concern.
#[derive(Clone, Debug)]
pub struct Layer {
    kind: LayerKind,
    geometry: LayerGeometry,
    tiles: Vec<Tile>,
    sorted: [Vec<usize>; NR_OF_ROTATIONS],
    instance_lookup: HashMap<(IVec2, Rotation), usize>,
    model_matrices: ModelMatrices,
    gfx_numbers: Vec<IVec4>,
    building_ids: Vec<IVec4>,
    selected: Vec<IVec4>,
    is_sorted: bool,
}

impl Layer {
    /// Creates an unprepared layer owning `tiles`.
    #[must_use]
    pub fn new(kind: LayerKind, geometry: LayerGeometry, tiles: Vec<Tile>) -> Self {
        Self {
            kind,
            geometry,
            tiles,
            sorted: Default::default(),
            instance_lookup: HashMap::new(),
            model_matrices: Default::default(),
            gfx_numbers: Vec::new(),
            building_ids: Vec::new(),
            selected: Vec::new(),
            is_sorted: false,
        }
    }

    /// Creates an unprepared layer from row-major persisted tiles.
    pub fn from_records(
        kind: LayerKind,
        geometry: LayerGeometry,
        records: &[Option<TileRecord>],
    ) -> Result<Self, LayerError> {
        let expected = geometry.cell_count();
        if records.len() != expected {
            return Err(LayerError::TileCountMismatch {
                kind,
                expected,
                actual: records.len(),
            });
        }

        let tiles = records
            .iter()
            .zip(0..)
            .map(|(record, index)| Tile::from_record(geometry.position_of(index), record.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        if kind == LayerKind::Buildings {
            check_connections(&tiles)?;
        }

        Ok(Self::new(kind, geometry, tiles))
    }

    /// Derives positions, sorts and fills every instance array.
    pub fn prepare(&mut self, ctx: &Context<'_>) -> Result<(), LayerError> {
        for tile in &mut self.tiles {
            tile.pre_calc(&self.geometry, ctx)?;
        }
        self.sort_tiles_for_rendering();
        self.create_model_matrices(ctx)?;
        self.create_instance_info(ctx)?;

        debug!(
            layer = self.kind.name(),
            tiles = self.tiles.len(),
            width = self.geometry.width,
            height = self.geometry.height,
            "prepared layer"
        );
        Ok(())
    }

    /// Computes the render order of every rotation and assigns instance slots.
    ///
    /// The arena itself ends up in DEG0 order, so a tile's arena index equals
    /// its DEG0 instance slot.
    pub fn sort_tiles_for_rendering(&mut self) {
        self.tiles.sort_by_key(|tile| tile.index(Rotation::Deg0));

        let Self {
            tiles,
            sorted,
            instance_lookup,
            ..
        } = self;

        instance_lookup.clear();
        for rotation in Rotation::ALL {
            let order = &mut sorted[rotation.index()];
            *order = (0..tiles.len()).collect();
            order.sort_by_key(|&index| tiles[index].index(rotation));

            for (instance, &index) in order.iter().enumerate() {
                let tile = &mut tiles[index];
                tile.instance_ids[rotation.index()] = instance;
                let _ = instance_lookup.insert((tile.world_position(), rotation), instance);
            }
        }

        self.is_sorted = true;
    }

    /// Emits one model matrix per instance for every zoom and rotation.
    ///
    /// # Panics
    ///
    /// Panics when the tiles have not been sorted yet.
    pub fn create_model_matrices(&mut self, ctx: &Context<'_>) -> Result<(), LayerError> {
        assert!(
            self.is_sorted,
            "{} layer must be sorted before creating model matrices",
            self.kind.name()
        );

        let mut matrices = ModelMatrices::default();
        for zoom in Zoom::ALL {
            for rotation in Rotation::ALL {
                let slot = &mut matrices[zoom.index()][rotation.index()];
                slot.reserve(self.tiles.len());
                for &index in &self.sorted[rotation.index()] {
                    slot.push(self.model_matrix(&self.tiles[index], zoom, rotation, ctx)?);
                }
            }
        }

        self.model_matrices = matrices;
        Ok(())
    }

    fn create_instance_info(&mut self, ctx: &Context<'_>) -> Result<(), LayerError> {
        let count = self.tiles.len();
        let mut gfx_numbers = vec![IVec4::splat(NO_INSTANCE_VALUE); count];
        let mut building_ids = vec![IVec4::splat(NO_INSTANCE_VALUE); count];
        let mut selected = vec![IVec4::ZERO; count];

        for rotation in Rotation::ALL {
            let r = rotation.index();
            for (instance, &index) in self.sorted[r].iter().enumerate() {
                let tile = &self.tiles[index];
                gfx_numbers[instance][r] = self.instance_gfx(tile, rotation, ctx)?;
                building_ids[instance][r] = self.instance_building(tile);
                selected[instance][r] = i32::from(tile.is_selected());
            }
        }

        self.gfx_numbers = gfx_numbers;
        self.building_ids = building_ids;
        self.selected = selected;
        Ok(())
    }

    fn model_matrix(
        &self,
        tile: &Tile,
        zoom: Zoom,
        rotation: Rotation,
        ctx: &Context<'_>,
    ) -> Result<Mat4, LayerError> {
        let (gfx, elevated) = match self.kind {
            LayerKind::DeepWater => (WATER_GFX, false),
            LayerKind::WorldGrid => (GRASS_GFX, false),
            LayerKind::Grid => (GRASS_GFX, true),
            LayerKind::Coast | LayerKind::Terrain | LayerKind::Buildings | LayerKind::Mixed => {
                match tile.building() {
                    Some(id) => {
                        let building = ctx
                            .buildings
                            .building(id)
                            .ok_or(LayerError::UnknownBuilding { id })?;
                        (resolve_gfx(tile, building, rotation)?, building.is_elevated())
                    }
                    None => {
                        let grass = ctx.buildings.building(GRASS_BUILDING_ID).ok_or(
                            LayerError::UnknownBuilding {
                                id: GRASS_BUILDING_ID,
                            },
                        )?;
                        (GRASS_GFX, grass.is_elevated())
                    }
                }
            }
        };

        let size = ctx
            .textures
            .texture_size(zoom, gfx)
            .ok_or(LayerError::MissingTexture { zoom, gfx })?
            .as_vec2();

        let mut position = tile.screen_position(zoom, rotation);
        position.y -= size.y - zoom.tile_height() as f32;
        if elevated {
            position.y -= zoom.elevation() as f32;
        }

        Ok(model_matrix(position, size))
    }

    fn instance_gfx(
        &self,
        tile: &Tile,
        rotation: Rotation,
        ctx: &Context<'_>,
    ) -> Result<i32, LayerError> {
        if !self.kind.has_instance_gfx() {
            return Ok(NO_INSTANCE_VALUE);
        }
        if self.kind == LayerKind::DeepWater {
            return Ok(WATER_GFX);
        }
        let Some(id) = tile.building() else {
            return Ok(NO_INSTANCE_VALUE);
        };
        let building = ctx
            .buildings
            .building(id)
            .ok_or(LayerError::UnknownBuilding { id })?;
        resolve_gfx(tile, building, rotation)
    }

    fn instance_building(&self, tile: &Tile) -> i32 {
        match tile.building() {
            Some(id) if self.kind.has_instance_gfx() => id.gpu_value(),
            _ => NO_INSTANCE_VALUE,
        }
    }

    fn instance_values(&self, tile: &Tile, ctx: &Context<'_>) -> Result<InstanceValues, LayerError> {
        let mut values = InstanceValues {
            matrices: [[Mat4::IDENTITY; NR_OF_ROTATIONS]; NR_OF_ZOOMS],
            gfx: [NO_INSTANCE_VALUE; NR_OF_ROTATIONS],
            building: self.instance_building(tile),
        };
        for rotation in Rotation::ALL {
            values.gfx[rotation.index()] = self.instance_gfx(tile, rotation, ctx)?;
            for zoom in Zoom::ALL {
                values.matrices[zoom.index()][rotation.index()] =
                    self.model_matrix(tile, zoom, rotation, ctx)?;
            }
        }
        Ok(values)
    }

    fn write_instance(&mut self, index: usize, values: &InstanceValues) {
        let tile = &self.tiles[index];
        for rotation in Rotation::ALL {
            let r = rotation.index();
            let instance = tile.instance_id(rotation);
            assert!(
                instance < self.gfx_numbers.len(),
                "instance slot {instance} outside of {} layer",
                self.kind.name()
            );
            self.gfx_numbers[instance][r] = values.gfx[r];
            self.building_ids[instance][r] = values.building;
            self.selected[instance][r] = i32::from(tile.is_selected());
            for zoom in Zoom::ALL {
                self.model_matrices[zoom.index()][r][instance] = values.matrices[zoom.index()][r];
            }
        }
    }

    /// Replaces the building info of existing tiles and rewrites their instance slots.
    ///
    /// Each input tile addresses its target through its layer-local map
    /// position. Nothing is written unless every tile resolves.
    pub fn replace_tiles(&mut self, tiles: &[Tile], ctx: &Context<'_>) -> Result<(), LayerError> {
        let mut staged = Vec::with_capacity(tiles.len());
        for replacement in tiles {
            let index = self.arena_index_local(replacement.map_position())?;
            let mut tile = self.tiles[index].clone();
            tile.assign_building_info(replacement);
            tile.pre_calc_gfxs(ctx)?;
            let values = self.instance_values(&tile, ctx)?;
            staged.push((index, tile, values));
        }

        for (index, tile, values) in staged {
            self.tiles[index] = tile;
            self.write_instance(index, &values);
        }

        trace!(layer = self.kind.name(), tiles = tiles.len(), "replaced tiles");
        Ok(())
    }

    /// Replaces a single tile, see [`Layer::replace_tiles`].
    pub fn replace_tile(&mut self, tile: Tile, ctx: &Context<'_>) -> Result<(), LayerError> {
        self.replace_tiles(std::slice::from_ref(&tile), ctx)
    }

    /// Writes the tiles of a newly placed building.
    pub fn add_building(&mut self, tiles: &[Tile], ctx: &Context<'_>) -> Result<(), LayerError> {
        self.replace_tiles(tiles, ctx)
    }

    /// Clears the building info of the tiles at the given layer-local positions.
    pub fn remove_building(
        &mut self,
        positions: &[IVec2],
        ctx: &Context<'_>,
    ) -> Result<(), LayerError> {
        let empty: Vec<Tile> = positions.iter().copied().map(Tile::empty).collect();
        self.replace_tiles(&empty, ctx)
    }

    /// Marks or unmarks tiles as selected and updates the selection buffer.
    pub fn set_selected(&mut self, positions: &[IVec2], selected: bool) -> Result<(), LayerError> {
        let indices = positions
            .iter()
            .map(|position| self.arena_index_local(*position))
            .collect::<Result<Vec<_>, _>>()?;

        for index in indices {
            let tile = &mut self.tiles[index];
            tile.set_selected(selected);
            for rotation in Rotation::ALL {
                self.selected[tile.instance_id(rotation)][rotation.index()] = i32::from(selected);
            }
        }
        Ok(())
    }

    /// Builds the mixed layer: terrain everywhere, buildings where placed.
    ///
    /// # Panics
    ///
    /// Panics when the two layers do not share the same geometry.
    #[must_use]
    pub fn mixed(terrain: &Layer, buildings: &Layer) -> Layer {
        assert_eq!(
            terrain.geometry, buildings.geometry,
            "mixed layer requires matching terrain and buildings geometry"
        );

        let mut mixed = terrain.clone();
        mixed.kind = LayerKind::Mixed;
        for (index, tile) in buildings.tiles.iter().enumerate() {
            if tile.has_building() {
                mixed.copy_instance_from(buildings, index);
            }
        }
        mixed
    }

    /// Re-syncs the mixed layer at the given layer-local positions.
    pub fn sync_mixed(
        &mut self,
        terrain: &Layer,
        buildings: &Layer,
        positions: &[IVec2],
    ) -> Result<(), LayerError> {
        for position in positions {
            let index = self.arena_index_local(*position)?;
            let source = if buildings.tiles[index].has_building() {
                buildings
            } else {
                terrain
            };
            self.copy_instance_from(source, index);
        }
        Ok(())
    }

    fn copy_instance_from(&mut self, source: &Layer, index: usize) {
        self.tiles[index] = source.tiles[index].clone();
        let tile = &self.tiles[index];
        for rotation in Rotation::ALL {
            let r = rotation.index();
            let instance = tile.instance_id(rotation);
            self.gfx_numbers[instance][r] = source.gfx_numbers[instance][r];
            self.building_ids[instance][r] = source.building_ids[instance][r];
            self.selected[instance][r] = source.selected[instance][r];
            for zoom in Zoom::ALL {
                self.model_matrices[zoom.index()][r][instance] =
                    source.model_matrices[zoom.index()][r][instance];
            }
        }
    }

    /// Builds the grid overlay of an island: one outline per elevated terrain cell.
    pub fn grid(terrain: &Layer, ctx: &Context<'_>) -> Result<Layer, LayerError> {
        let tiles = terrain
            .tiles
            .iter()
            .filter(|tile| {
                tile.building()
                    .and_then(|id| ctx.buildings.building(id))
                    .map_or(false, |building| building.is_elevated())
            })
            .cloned()
            .collect();

        let mut grid = Layer::new(LayerKind::Grid, terrain.geometry, tiles);
        grid.prepare(ctx)?;
        Ok(grid)
    }

    /// Builds the outline of every world cell.
    pub fn world_grid(world_size: IVec2, ctx: &Context<'_>) -> Result<Layer, LayerError> {
        let geometry = LayerGeometry::world(world_size);
        let tiles = (0..world_size.x * world_size.y)
            .map(|index| Tile::empty(geometry.position_of(index)))
            .collect();

        let mut grid = Layer::new(LayerKind::WorldGrid, geometry, tiles);
        grid.prepare(ctx)?;
        Ok(grid)
    }

    fn arena_index_local(&self, position: IVec2) -> Result<usize, LayerError> {
        let world = self.geometry.origin + position;
        self.instance_lookup
            .get(&(world, Rotation::Deg0))
            .copied()
            .ok_or(LayerError::MissingTile {
                kind: self.kind,
                x: world.x,
                y: world.y,
            })
    }

    /// Rendering concern of the layer.
    #[must_use]
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Index space and placement of the layer.
    #[must_use]
    pub fn geometry(&self) -> &LayerGeometry {
        &self.geometry
    }

    /// Tiles in DEG0 order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile at a layer-local position.
    #[must_use]
    pub fn tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tile_at_world(self.geometry.origin + IVec2::new(x, y))
    }

    /// Tile at a world position.
    #[must_use]
    pub fn tile_at_world(&self, position: IVec2) -> Option<&Tile> {
        self.instance_lookup
            .get(&(position, Rotation::Deg0))
            .map(|&index| &self.tiles[index])
    }

    /// Tiles in render order for a world rotation.
    pub fn sorted_tiles(&self, rotation: Rotation) -> impl Iterator<Item = &Tile> {
        self.sorted[rotation.index()]
            .iter()
            .map(move |&index| &self.tiles[index])
    }

    /// Instance slot of the tile at a world position for a world rotation.
    #[must_use]
    pub fn instance_id(&self, position: IVec2, rotation: Rotation) -> Option<usize> {
        self.instance_lookup.get(&(position, rotation)).copied()
    }

    /// Number of instances drawn per rotation.
    #[must_use]
    pub fn instances(&self) -> usize {
        self.tiles.len()
    }

    /// Model matrices of every instance for a zoom and rotation.
    #[must_use]
    pub fn model_matrices(&self, zoom: Zoom, rotation: Rotation) -> &[Mat4] {
        &self.model_matrices[zoom.index()][rotation.index()]
    }

    /// Per-instance graphics, one component per rotation.
    #[must_use]
    pub fn gfx_numbers(&self) -> &[IVec4] {
        &self.gfx_numbers
    }

    /// Per-instance building ids, one component per rotation.
    #[must_use]
    pub fn building_ids(&self) -> &[IVec4] {
        &self.building_ids
    }

    /// Per-instance selection flags, one component per rotation.
    #[must_use]
    pub fn selected(&self) -> &[IVec4] {
        &self.selected
    }

    /// Screen rectangle covered by the layer's sprites.
    ///
    /// The maximum corner includes the size of each sprite, so
    /// the rectangle is larger than the span of the matrix translations and
    /// sprites on the right and bottom edges are not culled.
    #[must_use]
    pub fn screen_bounds(&self, zoom: Zoom, rotation: Rotation) -> Option<ScreenBounds> {
        let matrices = self.model_matrices(zoom, rotation);
        let first = matrices.first()?;
        let mut bounds = ScreenBounds {
            min: first.w_axis.truncate().truncate(),
            max: first.w_axis.truncate().truncate(),
        };
        for matrix in matrices {
            let position = matrix.w_axis.truncate().truncate();
            let size = Vec2::new(matrix.x_axis.x, matrix.y_axis.y);
            bounds.min = bounds.min.min(position);
            bounds.max = bounds.max.max(position + size);
        }
        Some(bounds)
    }
}

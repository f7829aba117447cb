//! Islands: the coast, terrain, buildings, mixed and grid layers sharing one
//! DEG0 origin.

use glam::IVec2;
use isle_core::{Context, IslandId, Rotation, Zoom, NR_OF_ROTATIONS, NR_OF_ZOOMS};
use tracing::debug;

use crate::{
    file::{IslandRecord, LayerRecord},
    IslandError, Layer, LayerError, LayerGeometry, LayerKind, ScreenBounds, Tile,
};

/// Axis-aligned rectangle of world cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Aabb {
    /// Top-left cell.
    pub position: IVec2,
    /// Number of columns and rows.
    pub size: IVec2,
}

impl Aabb {
    /// Creates a rectangle from its top-left cell and size.
    #[must_use]
    pub const fn new(position: IVec2, size: IVec2) -> Self {
        Self { position, size }
    }

    /// Whether `point` lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, point: IVec2) -> bool {
        point.x >= self.position.x
            && point.y >= self.position.y
            && point.x < self.position.x + self.size.x
            && point.y < self.position.y + self.size.y
    }

    /// Whether the two rectangles share at least one cell.
    #[must_use]
    pub const fn intersects(&self, other: &Aabb) -> bool {
        self.position.x < other.position.x + other.size.x
            && other.position.x < self.position.x + self.size.x
            && self.position.y < other.position.y + other.size.y
            && other.position.y < self.position.y + self.size.y
    }

    /// Whether `other` lies completely inside the rectangle.
    #[must_use]
    pub const fn encloses(&self, other: &Aabb) -> bool {
        other.position.x >= self.position.x
            && other.position.y >= self.position.y
            && other.position.x + other.size.x <= self.position.x + self.size.x
            && other.position.y + other.size.y <= self.position.y + self.size.y
    }
}

/// One island of the world.
#[derive(Clone, Debug)]
pub struct Island {
    id: IslandId,
    climate: Option<String>,
    aabb: Aabb,
    coast: Layer,
    terrain: Layer,
    buildings: Layer,
    mixed: Layer,
    grid: Layer,
    bounds: [[Option<ScreenBounds>; NR_OF_ROTATIONS]; NR_OF_ZOOMS],
}

impl Island {
    /// Builds and prepares every layer of a persisted island.
    pub fn from_record(
        id: IslandId,
        record: &IslandRecord,
        world_size: IVec2,
        ctx: &Context<'_>,
    ) -> Result<Self, IslandError> {
        if record.width < 1 || record.height < 1 {
            return Err(IslandError::InvalidSize {
                width: record.width,
                height: record.height,
            });
        }
        if record.x < 0 || record.y < 0 {
            return Err(IslandError::InvalidOrigin {
                x: record.x,
                y: record.y,
            });
        }

        let origin = IVec2::new(record.x, record.y);
        let geometry = LayerGeometry::new(origin, record.width, record.height, world_size);
        let load = |kind: LayerKind| -> Result<Layer, IslandError> {
            let records = record
                .layer(kind.name())
                .ok_or(IslandError::MissingLayer { name: kind.name() })?;
            let mut layer = Layer::from_records(kind, geometry, records)?;
            layer.prepare(ctx)?;
            Ok(layer)
        };

        let coast = load(LayerKind::Coast)?;
        let terrain = load(LayerKind::Terrain)?;
        let buildings = load(LayerKind::Buildings)?;
        let mixed = Layer::mixed(&terrain, &buildings);
        let grid = Layer::grid(&terrain, ctx)?;

        let bounds = Zoom::ALL.map(|zoom| Rotation::ALL.map(|rotation| coast.screen_bounds(zoom, rotation)));

        debug!(
            island = id.get(),
            x = origin.x,
            y = origin.y,
            width = record.width,
            height = record.height,
            grid_tiles = grid.instances(),
            "created island"
        );

        Ok(Self {
            id,
            climate: record.climate.clone(),
            aabb: Aabb::new(origin, IVec2::new(record.width, record.height)),
            coast,
            terrain,
            buildings,
            mixed,
            grid,
            bounds,
        })
    }

    /// Persisted form of the island with its current buildings.
    #[must_use]
    pub fn to_record(&self) -> IslandRecord {
        let tiles = |layer: &Layer| layer.tiles().iter().map(Tile::to_record).collect();
        IslandRecord {
            width: self.aabb.size.x,
            height: self.aabb.size.y,
            x: self.aabb.position.x,
            y: self.aabb.position.y,
            climate: self.climate.clone(),
            layers: vec![
                LayerRecord::Coast(tiles(&self.coast)),
                LayerRecord::Terrain(tiles(&self.terrain)),
                LayerRecord::Buildings(tiles(&self.buildings)),
            ],
        }
    }

    /// Identifier of the island inside its world.
    #[must_use]
    pub fn id(&self) -> IslandId {
        self.id
    }

    /// Climate zone name, if any.
    #[must_use]
    pub fn climate(&self) -> Option<&str> {
        self.climate.as_deref()
    }

    /// World cells covered by the island.
    #[must_use]
    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    /// Number of columns.
    #[must_use]
    pub fn width(&self) -> i32 {
        self.aabb.size.x
    }

    /// Number of rows.
    #[must_use]
    pub fn height(&self) -> i32 {
        self.aabb.size.y
    }

    /// Converts a world position into an island position.
    #[must_use]
    pub fn world_to_island(&self, position: IVec2) -> Option<IVec2> {
        self.aabb
            .contains(position)
            .then(|| position - self.aabb.position)
    }

    /// Layer of the given kind, `None` for world-scale kinds.
    #[must_use]
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        match kind {
            LayerKind::Coast => Some(&self.coast),
            LayerKind::Terrain => Some(&self.terrain),
            LayerKind::Buildings => Some(&self.buildings),
            LayerKind::Mixed => Some(&self.mixed),
            LayerKind::Grid => Some(&self.grid),
            LayerKind::DeepWater | LayerKind::WorldGrid => None,
        }
    }

    /// Shallow water and beach.
    #[must_use]
    pub fn coast(&self) -> &Layer {
        &self.coast
    }

    /// Ground tiles.
    #[must_use]
    pub fn terrain(&self) -> &Layer {
        &self.terrain
    }

    /// Placed buildings.
    #[must_use]
    pub fn buildings(&self) -> &Layer {
        &self.buildings
    }

    /// Terrain with the buildings drawn on top.
    #[must_use]
    pub fn mixed(&self) -> &Layer {
        &self.mixed
    }

    /// Outline of every buildable cell.
    #[must_use]
    pub fn grid(&self) -> &Layer {
        &self.grid
    }

    /// Screen rectangle covered by the coast, which encloses every other layer.
    #[must_use]
    pub fn screen_bounds(&self, zoom: Zoom, rotation: Rotation) -> Option<ScreenBounds> {
        self.bounds[zoom.index()][rotation.index()]
    }

    /// Whether the buildings layer holds a building at an island position.
    #[must_use]
    pub fn is_removable(&self, position: IVec2) -> bool {
        self.buildings
            .tile(position.x, position.y)
            .is_some_and(Tile::has_building)
    }

    /// Island positions of every cell of the building covering `position`.
    #[must_use]
    pub fn building_cells(&self, position: IVec2) -> Option<Vec<IVec2>> {
        let tile = self
            .buildings
            .tile(position.x, position.y)
            .filter(|tile| tile.has_building())?;
        let geometry = self.buildings.geometry();
        let mut cells = vec![position];
        cells.extend(tile.connected().iter().map(|&index| geometry.position_of(index)));
        Some(cells)
    }

    /// Writes the tiles of a building and re-syncs the mixed layer.
    pub(crate) fn add_building(&mut self, tiles: &[Tile], ctx: &Context<'_>) -> Result<(), LayerError> {
        self.buildings.add_building(tiles, ctx)?;
        let positions: Vec<IVec2> = tiles.iter().map(Tile::map_position).collect();
        self.mixed.sync_mixed(&self.terrain, &self.buildings, &positions)
    }

    /// Clears the cells of a building and re-syncs the mixed layer.
    pub(crate) fn remove_building(
        &mut self,
        cells: &[IVec2],
        ctx: &Context<'_>,
    ) -> Result<(), LayerError> {
        self.buildings.remove_building(cells, ctx)?;
        self.mixed.sync_mixed(&self.terrain, &self.buildings, cells)
    }

    /// Marks or unmarks building cells in the buildings and mixed layers.
    pub(crate) fn set_selected(&mut self, cells: &[IVec2], selected: bool) -> Result<(), LayerError> {
        self.buildings.set_selected(cells, selected)?;
        self.mixed.set_selected(cells, selected)
    }
}

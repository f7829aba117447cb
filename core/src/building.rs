//! Building definitions and the read-only collaborators that supply them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{Rotation, Zoom};

/// Building placed on every buildable terrain cell of a fresh island.
pub const GRASS_BUILDING_ID: BuildingId = BuildingId::new(101);
/// Graphic drawn for island cells without a building.
pub const GRASS_GFX: i32 = 4;
/// Building covering every world cell that is not part of an island.
pub const DEEP_WATER_BUILDING_ID: BuildingId = BuildingId::new(1201);
/// Graphic drawn for deep water cells.
pub const WATER_GFX: i32 = 758;
/// Shallow water surrounding islands.
pub const SHALLOW_WATER_BUILDING_ID: BuildingId = BuildingId::new(1203);
/// Beach cells along the coast.
pub const BEACH_BUILDING_ID: BuildingId = BuildingId::new(1205);

/// Buildings the player may only place at DEG0.
pub const NON_ROTATABLE_BUILDING_IDS: [BuildingId; 3] = [
    BuildingId::new(605),
    BuildingId::new(1073),
    BuildingId::new(1331),
];

/// Identifier of a building definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Interprets a persisted id, where negative values mean "no building".
    #[must_use]
    pub fn from_persisted(value: i64) -> Option<Self> {
        u32::try_from(value).ok().map(Self)
    }

    /// Whether the player may choose a rotation when placing the building.
    #[must_use]
    pub fn is_player_rotatable(&self) -> bool {
        !NON_ROTATABLE_BUILDING_IDS.contains(self)
    }

    /// Value written into per-instance GPU arrays.
    #[must_use]
    pub fn gpu_value(&self) -> i32 {
        i32::try_from(self.0).unwrap_or(i32::MAX)
    }
}

/// Footprint of a building measured in tiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FootprintSize {
    width: i32,
    height: i32,
}

impl FootprintSize {
    /// Creates a footprint of `width` x `height` tiles.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Number of tiles along the x axis at DEG0.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.width
    }

    /// Number of tiles along the y axis at DEG0.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.height
    }

    /// Whether the footprint covers more than one tile.
    #[must_use]
    pub const fn is_multi_tile(&self) -> bool {
        self.width > 1 || self.height > 1
    }

    /// Extent covered on the map once the building is placed with `rotation`.
    #[must_use]
    pub const fn rotated(&self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::Deg0 | Rotation::Deg180 => *self,
            Rotation::Deg90 | Rotation::Deg270 => Self::new(self.height, self.width),
        }
    }
}

/// Static description of a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    /// Identifier of the definition.
    pub id: BuildingId,
    /// Graphic of the top-left cell at DEG0.
    pub gfx: i32,
    /// Footprint in tiles.
    pub size: FootprintSize,
    /// Graphic stride between rotation variants, zero when the graphic never rotates.
    pub rotate: i32,
    /// Nonzero when the building stands above water level.
    pub posoffs: i32,
}

impl Building {
    /// Whether the building has one graphic set per rotation.
    #[must_use]
    pub const fn is_rotatable(&self) -> bool {
        self.rotate > 0
    }

    /// Whether the building sits above water level.
    #[must_use]
    pub const fn is_elevated(&self) -> bool {
        self.posoffs > 0
    }

    /// Graphics of the top-left cell for every rotation variant.
    ///
    /// Returns a single entry for buildings that never rotate.
    #[must_use]
    pub fn rotation_gfxs(&self) -> Vec<i32> {
        if self.is_rotatable() {
            (0..4).map(|step| self.gfx + step * self.rotate).collect()
        } else {
            vec![self.gfx]
        }
    }
}

/// Pixel size of a single tile sprite.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl TextureSize {
    /// Creates a new sprite size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Size as a float vector suitable for model matrices.
    #[must_use]
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }
}

/// Read-only source of building definitions.
pub trait BuildingCatalog {
    /// Looks up a building definition by id.
    fn building(&self, id: BuildingId) -> Option<&Building>;
}

/// Read-only source of sprite dimensions, one table per zoom.
pub trait TextureCatalog {
    /// Number of sprites available for the zoom.
    fn texture_count(&self, zoom: Zoom) -> usize;

    /// Pixel size of the sprite `gfx` at `zoom`, if it exists.
    fn texture_size(&self, zoom: Zoom, gfx: i32) -> Option<TextureSize>;
}

/// Collaborators handed to every operation that reads building or sprite data.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Building definitions.
    pub buildings: &'a dyn BuildingCatalog,
    /// Sprite sizes.
    pub textures: &'a dyn TextureCatalog,
}

impl<'a> Context<'a> {
    /// Bundles the collaborators.
    #[must_use]
    pub fn new(buildings: &'a dyn BuildingCatalog, textures: &'a dyn TextureCatalog) -> Self {
        Self {
            buildings,
            textures,
        }
    }

    /// Bundles a single value implementing both catalogs.
    #[must_use]
    pub fn from_catalog<C>(catalog: &'a C) -> Self
    where
        C: BuildingCatalog + TextureCatalog,
    {
        Self::new(catalog, catalog)
    }
}

impl std::fmt::Debug for Context<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

//! Building definitions and sprite sizes loaded from a TOML catalog.

use std::{collections::HashMap, fs, path::Path};

use isle_core::{
    Building, BuildingCatalog, BuildingId, FootprintSize, TextureCatalog, TextureSize, Zoom,
    NR_OF_ZOOMS,
};
use serde::Deserialize;

use crate::CatalogError;

/// In-memory catalog implementing both collaborator traits.
///
/// Every graphic below the texture count shares the default sprite size of
/// its zoom unless an override says otherwise.
#[derive(Clone, Debug)]
pub struct Catalog {
    buildings: HashMap<BuildingId, Building>,
    texture_count: usize,
    default_sizes: [TextureSize; NR_OF_ZOOMS],
    overrides: HashMap<(Zoom, i32), TextureSize>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Catalog {
    /// Creates an empty catalog exposing `texture_count` tile-sized sprites per zoom.
    #[must_use]
    pub fn new(texture_count: usize) -> Self {
        Self {
            buildings: HashMap::new(),
            texture_count,
            default_sizes: Zoom::ALL.map(tile_sized),
            overrides: HashMap::new(),
        }
    }

    /// Reads and parses a catalog file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses a catalog from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, CatalogError> {
        let manifest: CatalogManifest = toml::from_str(contents)?;

        let mut catalog = Self::new(manifest.textures.count);
        for zoom in Zoom::ALL {
            if let Some(size) = manifest.textures.default_size(zoom) {
                catalog.default_sizes[zoom.index()] = size;
            }
        }

        for entry in manifest.textures.overrides {
            let in_range = usize::try_from(entry.gfx).map_or(false, |gfx| gfx < catalog.texture_count);
            if !in_range {
                return Err(CatalogError::OverrideOutOfRange {
                    zoom: entry.zoom,
                    gfx: entry.gfx,
                    count: catalog.texture_count,
                });
            }
            catalog.set_texture_size(entry.zoom, entry.gfx, TextureSize::new(entry.width, entry.height));
        }

        for entry in manifest.buildings {
            let id = BuildingId::new(entry.id);
            if entry.width < 1 || entry.height < 1 {
                return Err(CatalogError::EmptyFootprint { id });
            }
            if catalog.buildings.contains_key(&id) {
                return Err(CatalogError::DuplicateBuilding { id });
            }
            catalog.insert_building(Building {
                id,
                gfx: entry.gfx,
                size: FootprintSize::new(entry.width, entry.height),
                rotate: entry.rotate,
                posoffs: entry.posoffs,
            });
        }

        Ok(catalog)
    }

    /// Adds or replaces a building definition.
    pub fn insert_building(&mut self, building: Building) {
        let _ = self.buildings.insert(building.id, building);
    }

    /// Overrides the sprite size of a single graphic.
    pub fn set_texture_size(&mut self, zoom: Zoom, gfx: i32, size: TextureSize) {
        let _ = self.overrides.insert((zoom, gfx), size);
    }

    /// Number of building definitions.
    #[must_use]
    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    /// Iterates over the building definitions in ascending id order.
    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        let mut buildings: Vec<&Building> = self.buildings.values().collect();
        buildings.sort_by_key(|building| building.id);
        buildings.into_iter()
    }
}

impl BuildingCatalog for Catalog {
    fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }
}

impl TextureCatalog for Catalog {
    fn texture_count(&self, _zoom: Zoom) -> usize {
        self.texture_count
    }

    fn texture_size(&self, zoom: Zoom, gfx: i32) -> Option<TextureSize> {
        let index = usize::try_from(gfx).ok()?;
        if index >= self.texture_count {
            return None;
        }
        Some(
            self.overrides
                .get(&(zoom, gfx))
                .copied()
                .unwrap_or(self.default_sizes[zoom.index()]),
        )
    }
}

fn tile_sized(zoom: Zoom) -> TextureSize {
    TextureSize::new(zoom.tile_width().unsigned_abs(), zoom.tile_height().unsigned_abs())
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogManifest {
    textures: TextureManifest,
    #[serde(default)]
    buildings: Vec<BuildingEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TextureManifest {
    count: usize,
    sgfx: Option<SizeEntry>,
    mgfx: Option<SizeEntry>,
    gfx: Option<SizeEntry>,
    #[serde(default)]
    overrides: Vec<OverrideEntry>,
}

impl TextureManifest {
    fn default_size(&self, zoom: Zoom) -> Option<TextureSize> {
        let entry = match zoom {
            Zoom::Sgfx => self.sgfx.as_ref(),
            Zoom::Mgfx => self.mgfx.as_ref(),
            Zoom::Gfx => self.gfx.as_ref(),
        }?;
        Some(TextureSize::new(entry.width, entry.height))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SizeEntry {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct OverrideEntry {
    zoom: Zoom,
    gfx: i32,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BuildingEntry {
    id: u32,
    gfx: i32,
    #[serde(default = "one")]
    width: i32,
    #[serde(default = "one")]
    height: i32,
    #[serde(default)]
    rotate: i32,
    #[serde(default)]
    posoffs: i32,
}

const fn one() -> i32 {
    1
}

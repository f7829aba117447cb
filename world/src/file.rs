//! JSON map and island files.
//!
//! A map file stores the world size and every island. An island template
//! stores a single island with the sentinel position `x == y == -1`; it is
//! given a real position when added to a map.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::MapFileError;

/// Extension of map files.
pub const MAP_FILE_EXTENSION: &str = "map";
/// Extension of island template files.
pub const ISLAND_FILE_EXTENSION: &str = "isl";

const TEMPLATE_POSITION: i32 = -1;

/// Persisted form of a tile; derived fields are never written.
///
/// Only building tiles survive a save. A record whose `id` is absent or
/// negative loads as an empty tile and is written back as `null`, dropping
/// its other fields.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRecord {
    /// Building id, absent or negative for empty tiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Building rotation in `0..=3`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<i32>,
    /// Column of the cell inside the placed footprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Row of the cell inside the placed footprint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// DEG0 layer indices of the other cells of the building.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<Vec<i32>>,
}

/// Row-major tiles of one layer; `null` entries are empty tiles.
pub type LayerTiles = Vec<Option<TileRecord>>;

/// One named layer of an island.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerRecord {
    /// Shallow water and beach around the island.
    Coast(LayerTiles),
    /// Ground tiles.
    Terrain(LayerTiles),
    /// Tiles of placed buildings.
    Buildings(LayerTiles),
}

impl LayerRecord {
    /// Name of the layer as written to disk.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Coast(_) => "coast",
            Self::Terrain(_) => "terrain",
            Self::Buildings(_) => "buildings",
        }
    }

    /// Tiles of the layer.
    #[must_use]
    pub fn tiles(&self) -> &[Option<TileRecord>] {
        match self {
            Self::Coast(tiles) | Self::Terrain(tiles) | Self::Buildings(tiles) => tiles,
        }
    }
}

/// Persisted island.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IslandRecord {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
    /// World column of the top-left cell.
    pub x: i32,
    /// World row of the top-left cell.
    pub y: i32,
    /// Climate zone name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate: Option<String>,
    /// Named layers.
    pub layers: Vec<LayerRecord>,
}

impl IslandRecord {
    /// Tiles of the layer called `name`, if present.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&[Option<TileRecord>]> {
        self.layers
            .iter()
            .find(|layer| layer.name() == name)
            .map(LayerRecord::tiles)
    }
}

/// World dimensions stored in a map file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSize {
    /// Number of columns.
    pub width: i32,
    /// Number of rows.
    pub height: i32,
}

/// Persisted world.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapFile {
    /// Version of the writer.
    pub version: String,
    /// World dimensions.
    pub world: WorldSize,
    /// Every island of the world.
    pub islands: Vec<IslandRecord>,
}

impl MapFile {
    /// Creates a map file without islands.
    #[must_use]
    pub fn new(version: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            version: version.into(),
            world: WorldSize { width, height },
            islands: Vec::new(),
        }
    }

    /// Places an island template at a world position and appends it.
    pub fn add_island(&mut self, template: IslandFile, x: i32, y: i32) {
        let mut island = template.into_record();
        island.x = x;
        island.y = y;
        self.islands.push(island);
    }

    /// Parses a map and checks its required keys and version.
    pub fn from_json_str(contents: &str, expected_version: &str) -> Result<Self, MapFileError> {
        let value: Value = serde_json::from_str(contents)?;
        for key in ["version", "world", "islands"] {
            if value.get(key).is_none() {
                return Err(MapFileError::MissingKey { key });
            }
        }

        let map: Self = serde_json::from_value(value)?;
        if map.version != expected_version {
            return Err(MapFileError::UnsupportedVersion {
                found: map.version,
                expected: expected_version.to_owned(),
            });
        }

        debug!(
            width = map.world.width,
            height = map.world.height,
            islands = map.islands.len(),
            "parsed map file"
        );
        Ok(map)
    }

    /// Reads and parses a map file.
    pub fn load(path: impl AsRef<Path>, expected_version: &str) -> Result<Self, MapFileError> {
        let contents = read(path.as_ref())?;
        Self::from_json_str(&contents, expected_version)
    }

    /// Serializes the map as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, MapFileError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the map to a `.map` file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MapFileError> {
        let path = path.as_ref();
        ensure_extension(path, MAP_FILE_EXTENSION)?;
        write(path, &self.to_json_string()?)
    }
}

/// Island template that is not yet placed in a world.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IslandFile {
    record: IslandRecord,
}

impl IslandFile {
    /// Wraps an island record, resetting its position to the template sentinel.
    #[must_use]
    pub fn from_record(mut record: IslandRecord) -> Self {
        record.x = TEMPLATE_POSITION;
        record.y = TEMPLATE_POSITION;
        Self { record }
    }

    /// Parses a template and checks the position sentinel.
    pub fn from_json_str(contents: &str) -> Result<Self, MapFileError> {
        let record: IslandRecord = serde_json::from_str(contents)?;
        if record.x != TEMPLATE_POSITION || record.y != TEMPLATE_POSITION {
            return Err(MapFileError::PlacedTemplate {
                x: record.x,
                y: record.y,
            });
        }
        Ok(Self { record })
    }

    /// Reads and parses a template file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MapFileError> {
        let contents = read(path.as_ref())?;
        Self::from_json_str(&contents)
    }

    /// Writes the template to an `.isl` file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), MapFileError> {
        let path = path.as_ref();
        ensure_extension(path, ISLAND_FILE_EXTENSION)?;
        write(path, &serde_json::to_string_pretty(&self.record)?)
    }

    /// Island stored in the template.
    #[must_use]
    pub fn record(&self) -> &IslandRecord {
        &self.record
    }

    /// Unwraps the island record.
    #[must_use]
    pub fn into_record(self) -> IslandRecord {
        self.record
    }
}

fn ensure_extension(path: &Path, expected: &'static str) -> Result<(), MapFileError> {
    if path.extension().and_then(|ext| ext.to_str()) == Some(expected) {
        Ok(())
    } else {
        Err(MapFileError::WrongExtension {
            path: path.to_path_buf(),
            expected,
        })
    }
}

fn read(path: &Path) -> Result<String, MapFileError> {
    fs::read_to_string(path).map_err(|source| MapFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, contents: &str) -> Result<(), MapFileError> {
    fs::write(path, contents).map_err(|source| MapFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ISLAND: &str = r#"{
        "width": 2,
        "height": 1,
        "x": -1,
        "y": -1,
        "climate": "north",
        "layers": [
            {"coast": [null, null]},
            {"terrain": [{"id": 101, "rotation": 0, "x": 0, "y": 0, "connected": []}, {"id": 101}]},
            {"buildings": [null, {"id": -1}]}
        ]
    }"#;

    #[test]
    fn island_templates_expose_named_layers() {
        let template = IslandFile::from_json_str(ISLAND).expect("template parses");
        let record = template.record();

        assert_eq!(record.climate.as_deref(), Some("north"));
        assert_eq!(record.layer("coast").map(<[_]>::len), Some(2));
        let terrain = record.layer("terrain").expect("terrain layer");
        assert_eq!(terrain[1].as_ref().and_then(|tile| tile.id), Some(101));
        assert_eq!(terrain[1].as_ref().and_then(|tile| tile.rotation), None);
        assert!(record.layer("mixed").is_none());
    }

    #[test]
    fn placed_templates_are_rejected() {
        let placed = ISLAND.replacen("\"x\": -1", "\"x\": 3", 1);
        assert!(matches!(
            IslandFile::from_json_str(&placed),
            Err(MapFileError::PlacedTemplate { x: 3, y: -1 })
        ));
    }

    #[test]
    fn maps_require_every_top_level_key() {
        let result = MapFile::from_json_str(r#"{"version": "0.1", "world": {"width": 5, "height": 5}}"#, "0.1");
        assert!(matches!(result, Err(MapFileError::MissingKey { key: "islands" })));
    }

    #[test]
    fn maps_from_other_versions_are_rejected() {
        let result = MapFile::from_json_str(
            r#"{"version": "9.9", "world": {"width": 5, "height": 5}, "islands": []}"#,
            "0.1",
        );
        assert!(matches!(result, Err(MapFileError::UnsupportedVersion { .. })));
    }

    #[test]
    fn adding_a_template_places_it() {
        let template = IslandFile::from_json_str(ISLAND).expect("template parses");
        let mut map = MapFile::new("0.1", 60, 60);
        map.add_island(template, 7, 9);

        let json = map.to_json_string().expect("map serializes");
        let restored = MapFile::from_json_str(&json, "0.1").expect("map parses");
        assert_eq!(restored, map);
        assert_eq!((restored.islands[0].x, restored.islands[0].y), (7, 9));
    }

    #[test]
    fn layers_serialize_as_single_key_objects() {
        let layer = LayerRecord::Buildings(vec![None]);
        let json = serde_json::to_string(&layer).expect("layer serializes");
        assert_eq!(json, r#"{"buildings":[null]}"#);
    }

    #[test]
    fn saving_requires_the_matching_extension() {
        let map = MapFile::new("0.1", 60, 60);
        let target = std::env::temp_dir().join("isle-wrong-extension.isl");
        assert!(matches!(
            map.save(&target),
            Err(MapFileError::WrongExtension { expected: "map", .. })
        ));
    }
}

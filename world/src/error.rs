//! Typed failures raised while loading content or building layers.

use std::path::PathBuf;

use isle_core::{BuildingId, RotationError, Zoom};
use thiserror::Error;

use crate::LayerKind;

/// Content problems detected while creating or updating a layer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayerError {
    /// The number of tiles does not fill the layer.
    #[error("{kind:?} layer expects {expected} tiles but received {actual}")]
    TileCountMismatch {
        /// Layer being filled.
        kind: LayerKind,
        /// `width * height` of the layer.
        expected: usize,
        /// Tiles provided.
        actual: usize,
    },
    /// A tile references a building the catalog does not know.
    #[error("unknown building id {id:?}")]
    UnknownBuilding {
        /// Offending id.
        id: BuildingId,
    },
    /// A resolved graphic has no sprite at the given zoom.
    #[error("gfx {gfx} is missing from the {zoom:?} texture catalog")]
    MissingTexture {
        /// Zoom whose sprite table was consulted.
        zoom: Zoom,
        /// Graphic index that was requested.
        gfx: i32,
    },
    /// A resolved graphic lies outside the tile's precomputed rotation graphics.
    #[error("tile at ({x}, {y}) has no graphic for rotation slot {slot}")]
    MissingRotationGfx {
        /// Layer-local column.
        x: i32,
        /// Layer-local row.
        y: i32,
        /// Requested slot of the graphic list.
        slot: usize,
    },
    /// A persisted tile carries a rotation outside `0..=3`.
    #[error("invalid tile rotation")]
    InvalidRotation(#[from] RotationError),
    /// A building tile lists a connected cell outside the layer or holding
    /// another building.
    #[error("tile at ({x}, {y}) is connected to invalid cell index {index}")]
    InvalidConnection {
        /// Layer-local column.
        x: i32,
        /// Layer-local row.
        y: i32,
        /// Offending DEG0 index.
        index: i32,
    },
    /// A tile update addresses a cell the layer does not contain.
    #[error("{kind:?} layer has no tile at world position ({x}, {y})")]
    MissingTile {
        /// Layer being updated.
        kind: LayerKind,
        /// World column.
        x: i32,
        /// World row.
        y: i32,
    },
}

/// Structural problems of a single island.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IslandError {
    /// Width or height is not positive.
    #[error("island size {width}x{height} is invalid")]
    InvalidSize {
        /// Declared width.
        width: i32,
        /// Declared height.
        height: i32,
    },
    /// The island origin lies left of or above the world.
    #[error("island origin ({x}, {y}) is invalid")]
    InvalidOrigin {
        /// Declared column.
        x: i32,
        /// Declared row.
        y: i32,
    },
    /// A required layer is absent.
    #[error("island is missing its {name} layer")]
    MissingLayer {
        /// Name of the absent layer.
        name: &'static str,
    },
    /// A layer failed to build.
    #[error(transparent)]
    Layer(#[from] LayerError),
}

/// Failures reading or writing map and island files.
#[derive(Debug, Error)]
pub enum MapFileError {
    /// The file could not be read or written.
    #[error("failed to access {}", path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The file content is not valid JSON of the expected shape.
    #[error("failed to parse map data")]
    Parse(#[from] serde_json::Error),
    /// A required top-level key is absent.
    #[error("map file is missing the `{key}` key")]
    MissingKey {
        /// Name of the absent key.
        key: &'static str,
    },
    /// The file was written by an unsupported version.
    #[error("unsupported map version {found:?} (expected {expected:?})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: String,
        /// Version this build reads.
        expected: String,
    },
    /// A tile carries a rotation outside `0..=3`.
    #[error("invalid tile rotation")]
    InvalidRotation(#[from] RotationError),
    /// An island template carries a world position.
    #[error("island templates must use x == y == -1, found ({x}, {y})")]
    PlacedTemplate {
        /// Declared column.
        x: i32,
        /// Declared row.
        y: i32,
    },
    /// The save target does not carry the expected extension.
    #[error("{} does not end in .{expected}", path.display())]
    WrongExtension {
        /// Offending path.
        path: PathBuf,
        /// Extension the file kind requires.
        expected: &'static str,
    },
}

/// Failures assembling a world out of islands.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The world size falls outside the configured limits.
    #[error("world size {width}x{height} is outside {min}..={max}")]
    InvalidWorldSize {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
        /// Smallest accepted side.
        min: i32,
        /// Largest accepted side.
        max: i32,
    },
    /// An island extends beyond the world.
    #[error("island {index} does not fit inside the world")]
    IslandOutsideWorld {
        /// Position of the island in the map file.
        index: usize,
    },
    /// Two islands share at least one cell.
    #[error("islands {first} and {second} overlap")]
    OverlappingIslands {
        /// First island of the pair.
        first: usize,
        /// Second island of the pair.
        second: usize,
    },
    /// An island failed to build.
    #[error("island {index} is invalid")]
    Island {
        /// Position of the island in the map file.
        index: usize,
        /// Underlying failure.
        #[source]
        source: IslandError,
    },
    /// A world-scale layer failed to build or update.
    #[error(transparent)]
    Layer(#[from] LayerError),
    /// The map file could not be used.
    #[error(transparent)]
    File(#[from] MapFileError),
}

/// Failures loading the building and texture catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("failed to read catalog {}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The catalog is not valid TOML of the expected shape.
    #[error("failed to parse catalog")]
    Parse(#[from] toml::de::Error),
    /// Two entries share the same building id.
    #[error("building {id:?} is defined twice")]
    DuplicateBuilding {
        /// Repeated id.
        id: BuildingId,
    },
    /// A building declares a footprint without area.
    #[error("building {id:?} has an empty footprint")]
    EmptyFootprint {
        /// Offending id.
        id: BuildingId,
    },
    /// A sprite override addresses a graphic past the texture count.
    #[error("{zoom:?} override for gfx {gfx} exceeds the texture count {count}")]
    OverrideOutOfRange {
        /// Zoom of the override.
        zoom: Zoom,
        /// Overridden graphic.
        gfx: i32,
        /// Declared number of sprites.
        count: usize,
    },
}

/// Failures loading the world configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration {}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
    /// The configuration is not valid TOML of the expected shape.
    #[error("failed to parse configuration")]
    Parse(#[from] toml::de::Error),
    /// The minimum world side exceeds the maximum.
    #[error("world size limits {min}..={max} are empty")]
    EmptySizeRange {
        /// Configured minimum.
        min: i32,
        /// Configured maximum.
        max: i32,
    },
}

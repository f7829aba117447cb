//! Graphic selection for building tiles.
//!
//! A building owns one block of `width * height` sprites per rotation. The
//! sprite for a footprint cell is the block's first graphic plus the cell's
//! row-major offset inside the unrotated footprint.

use isle_core::{rotate_position, Building, Rotation};

use crate::{LayerError, Tile};

/// Rotation that maps a cell of a placed footprint back onto the DEG0 sprite block.
#[must_use]
pub const fn footprint_rotation(placed: Rotation) -> Rotation {
    match placed {
        Rotation::Deg0 => Rotation::Deg0,
        Rotation::Deg90 => Rotation::Deg270,
        Rotation::Deg180 => Rotation::Deg180,
        Rotation::Deg270 => Rotation::Deg90,
    }
}

/// Offset of a footprint cell inside the building's sprite block.
///
/// `local` spans the placed footprint, so for quarter turns its x axis runs
/// over the building height.
#[must_use]
pub fn footprint_offset(building: &Building, placed: Rotation, local: glam::IVec2) -> i32 {
    if !building.size.is_multi_tile() {
        return 0;
    }

    let width = building.size.width();
    let unrotated = rotate_position(
        local.x,
        local.y,
        width,
        building.size.height(),
        footprint_rotation(placed),
    );
    unrotated.y * width + unrotated.x
}

/// Resolves the graphic drawn for `tile` while the world is rotated by `world_rotation`.
///
/// Rotatable buildings turn with the world; all others keep their single
/// graphic.
pub fn resolve_gfx(
    tile: &Tile,
    building: &Building,
    world_rotation: Rotation,
) -> Result<i32, LayerError> {
    let slot = if building.is_rotatable() {
        (tile.rotation() + world_rotation).index()
    } else {
        0
    };

    let base = tile
        .gfxs()
        .get(slot)
        .copied()
        .ok_or(LayerError::MissingRotationGfx {
            x: tile.map_position().x,
            y: tile.map_position().y,
            slot,
        })?;

    Ok(base + footprint_offset(building, tile.rotation(), tile.local_offset()))
}

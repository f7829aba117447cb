//! Deep water covering every world cell outside the islands.

use glam::IVec2;
use isle_core::{Context, Rotation, DEEP_WATER_BUILDING_ID};

use crate::{Island, Layer, LayerError, LayerGeometry, LayerKind, Tile};

/// Builds and prepares the deep water layer of a world.
pub fn deep_water_layer(
    world_size: IVec2,
    islands: &[Island],
    ctx: &Context<'_>,
) -> Result<Layer, LayerError> {
    let geometry = LayerGeometry::world(world_size);
    let tiles = (0..world_size.x * world_size.y)
        .map(|index| geometry.position_of(index))
        .filter(|position| !islands.iter().any(|island| island.aabb().contains(*position)))
        .map(|position| {
            Tile::building_part(
                position,
                DEEP_WATER_BUILDING_ID,
                Rotation::Deg0,
                IVec2::ZERO,
                Vec::new(),
            )
        })
        .collect();

    let mut layer = Layer::new(LayerKind::DeepWater, geometry, tiles);
    layer.prepare(ctx)?;
    Ok(layer)
}

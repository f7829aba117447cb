//! Map space, index space and screen space conversions.
//!
//! Every layer stores its tiles in DEG0 map coordinates. Rendering under a
//! different world rotation first rotates the coordinate inside a bounding
//! width/height and then projects the result onto the isometric screen.

use glam::{IVec2, Mat4, Vec2, Vec3};

use crate::{Rotation, Zoom};

/// Rotates `(x, y)` inside a `width` x `height` area.
///
/// The same function rotates a whole layer's index space and the local
/// offset of a cell inside a building footprint; callers pass the bounding
/// size of whichever space they rotate.
#[must_use]
pub const fn rotate_position(x: i32, y: i32, width: i32, height: i32, rotation: Rotation) -> IVec2 {
    match rotation {
        Rotation::Deg0 => IVec2::new(x, y),
        Rotation::Deg90 => IVec2::new(width - y - 1, x),
        Rotation::Deg180 => IVec2::new(width - x - 1, height - y - 1),
        Rotation::Deg270 => IVec2::new(y, height - x - 1),
    }
}

/// Reports whether `(x, y)` lies inside a `width` x `height` area.
#[must_use]
pub const fn is_in_bounds(x: i32, y: i32, width: i32, height: i32) -> bool {
    x >= 0 && x < width && y >= 0 && y < height
}

/// Rotation-aware 2D to 1D mapping used as the render sort key.
///
/// Rotating by a quarter turn swaps which axis forms the rows, so the stride
/// is `width` for DEG0/DEG180 and `height` for DEG90/DEG270. The result may
/// be negative for non-square areas; only its ordering matters.
///
/// # Panics
///
/// Panics when `(x, y)` lies outside the area.
#[must_use]
pub fn map_index(x: i32, y: i32, width: i32, height: i32, rotation: Rotation) -> i32 {
    assert!(
        is_in_bounds(x, y, width, height),
        "map index requested for ({x}, {y}) outside of {width}x{height}"
    );

    let position = rotate_position(x, y, width, height, rotation);
    match rotation {
        Rotation::Deg0 | Rotation::Deg180 => position.y * width + position.x,
        Rotation::Deg90 | Rotation::Deg270 => position.y * height + position.x,
    }
}

/// Projects an already rotated position onto the isometric screen.
#[must_use]
pub fn iso_project(position: IVec2, zoom: Zoom) -> Vec2 {
    Vec2::new(
        ((position.x - position.y) * zoom.tile_width_half()) as f32,
        ((position.x + position.y) * zoom.tile_height_half()) as f32,
    )
}

/// Rotates a DEG0 map position inside the world and projects it to screen space.
#[must_use]
pub fn map_to_screen(
    x: i32,
    y: i32,
    width: i32,
    height: i32,
    zoom: Zoom,
    rotation: Rotation,
) -> Vec2 {
    iso_project(rotate_position(x, y, width, height, rotation), zoom)
}

/// Translate-then-scale transform placing a sprite of `size` at `position`.
#[must_use]
pub fn model_matrix(position: Vec2, size: Vec2) -> Mat4 {
    Mat4::from_translation(Vec3::new(position.x, position.y, 0.0))
        * Mat4::from_scale(Vec3::new(size.x, size.y, 1.0))
}

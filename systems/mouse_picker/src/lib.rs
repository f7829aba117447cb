#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure mouse picking system translating screen pixels into world cells.
//!
//! The screen is cut into tile-sized cells. The containing cell yields a
//! candidate diamond under the current rotation, then the corner image
//! sampled at the in-cell offset moves the result by one row or column when
//! the pixel belongs to a neighbouring diamond.

mod corner;

use glam::{IVec2, Vec2};
use isle_core::{is_in_bounds, Rotation, Zoom, NR_OF_ZOOMS};
use tracing::{debug, trace};

pub use corner::{Corner, CornerImage, CornerImageError};

/// Sentinel reported before the cursor ever touched the world.
pub const NO_POSITION: IVec2 = IVec2::splat(-1);

/// View parameters the inverse projection depends on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PickerView {
    /// Zoom currently in effect.
    pub zoom: Zoom,
    /// World rotation currently in effect.
    pub rotation: Rotation,
    /// Number of world columns.
    pub world_width: i32,
    /// Number of world rows.
    pub world_height: i32,
    /// Camera position in screen pixels.
    pub camera: Vec2,
}

/// Tracks the world cell under the mouse cursor.
#[derive(Clone, Debug)]
pub struct MousePicker {
    images: [CornerImage; NR_OF_ZOOMS],
    current: IVec2,
    last: IVec2,
    tile_position_changed: bool,
    in_window: bool,
}

impl MousePicker {
    /// Creates a picker from one corner image per zoom, ordered like [`Zoom::ALL`].
    pub fn new(images: [CornerImage; NR_OF_ZOOMS]) -> Result<Self, CornerImageError> {
        for (image, expected) in images.iter().zip(Zoom::ALL) {
            if image.zoom() != expected {
                return Err(CornerImageError::UnexpectedZoom {
                    expected,
                    found: image.zoom(),
                });
            }
        }

        debug!("created mouse picker");
        Ok(Self {
            images,
            current: NO_POSITION,
            last: NO_POSITION,
            tile_position_changed: false,
            in_window: false,
        })
    }

    /// Creates a picker using generated corner images.
    #[must_use]
    pub fn with_synthetic_images() -> Self {
        Self {
            images: Zoom::ALL.map(CornerImage::synthesize),
            current: NO_POSITION,
            last: NO_POSITION,
            tile_position_changed: false,
            in_window: false,
        }
    }

    /// World cell under a mouse pixel.
    ///
    /// The result may lie outside the world; callers check it with
    /// [`MousePicker::is_current_in_world`] or their own bounds.
    #[must_use]
    pub fn pick(&self, mouse: IVec2, view: &PickerView) -> IVec2 {
        let zoom = view.zoom;
        let tile = IVec2::new(zoom.tile_width(), zoom.tile_height());
        let shifted = mouse + IVec2::new(0, zoom.elevation());
        let cell = IVec2::new(shifted.x.div_euclid(tile.x), shifted.y.div_euclid(tile.y));
        let offset = IVec2::new(shifted.x.rem_euclid(tile.x), shifted.y.rem_euclid(tile.y));
        let origin = IVec2::new(
            (view.camera.x as i32).div_euclid(tile.x),
            (view.camera.y as i32).div_euclid(tile.y),
        );

        let column = cell.x + origin.x;
        let row = cell.y + origin.y;
        let sum = row + column;
        let difference = row - column;
        let (width, height) = (view.world_width, view.world_height);
        let corner = self.images[zoom.index()].corner_at(offset);

        let (base, left, right) = match view.rotation {
            Rotation::Deg0 => (IVec2::new(sum, difference), IVec2::X, IVec2::Y),
            Rotation::Deg90 => (
                IVec2::new(difference, width - 1 - sum),
                IVec2::NEG_Y,
                IVec2::X,
            ),
            Rotation::Deg180 => (
                IVec2::new(width - 1 - sum, height - 1 - difference),
                IVec2::NEG_X,
                IVec2::NEG_Y,
            ),
            Rotation::Deg270 => (
                IVec2::new(height - 1 - difference, sum),
                IVec2::Y,
                IVec2::NEG_X,
            ),
        };

        // `left` and `right` are the world steps along the two screen diagonals
        match corner {
            Corner::Center => base,
            Corner::TopLeft => base - left,
            Corner::BottomRight => base + left,
            Corner::TopRight => base - right,
            Corner::BottomLeft => base + right,
        }
    }

    /// Updates the tracked cells after the mouse moved.
    ///
    /// Returns whether the cursor entered a different cell.
    pub fn on_mouse_moved(&mut self, mouse: IVec2, view: &PickerView) -> bool {
        let position = self.pick(mouse, view);
        self.tile_position_changed = position != self.current;
        if self.tile_position_changed {
            self.last = self.current;
            self.current = position;
            trace!(x = position.x, y = position.y, "cursor moved to a new cell");
        }
        self.tile_position_changed
    }

    /// Records whether the cursor is inside the window.
    pub fn on_mouse_enter(&mut self, entered: bool) {
        self.in_window = entered;
    }

    /// Cell under the cursor.
    #[must_use]
    pub fn current_position(&self) -> IVec2 {
        self.current
    }

    /// Cell the cursor occupied before the current one.
    #[must_use]
    pub fn last_position(&self) -> IVec2 {
        self.last
    }

    /// Whether the most recent move changed the cell.
    #[must_use]
    pub fn tile_position_changed(&self) -> bool {
        self.tile_position_changed
    }

    /// Whether the cursor is inside the window.
    #[must_use]
    pub fn is_in_window(&self) -> bool {
        self.in_window
    }

    /// Whether the current cell lies inside a `width` x `height` world.
    #[must_use]
    pub fn is_current_in_world(&self, width: i32, height: i32) -> bool {
        is_in_bounds(self.current.x, self.current.y, width, height)
    }

    /// Whether the previous cell lies inside a `width` x `height` world.
    #[must_use]
    pub fn is_last_in_world(&self, width: i32, height: i32) -> bool {
        is_in_bounds(self.last.x, self.last.y, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(rotation: Rotation) -> PickerView {
        PickerView {
            zoom: Zoom::Gfx,
            rotation,
            world_width: 8,
            world_height: 8,
            camera: Vec2::ZERO,
        }
    }

    #[test]
    fn cell_centres_pick_the_diamond_formula() {
        let picker = MousePicker::with_synthetic_images();
        // cell (1, 2), pixel in the middle, elevation pushed back up
        let mouse = IVec2::new(64 + 32, 64 + 16 - 20);

        assert_eq!(picker.pick(mouse, &view(Rotation::Deg0)), IVec2::new(3, 1));
        assert_eq!(picker.pick(mouse, &view(Rotation::Deg90)), IVec2::new(1, 4));
        assert_eq!(picker.pick(mouse, &view(Rotation::Deg180)), IVec2::new(4, 6));
        assert_eq!(picker.pick(mouse, &view(Rotation::Deg270)), IVec2::new(6, 3));
    }

    #[test]
    fn corner_triangles_shift_to_the_neighbour() {
        let picker = MousePicker::with_synthetic_images();
        let top_left = IVec2::new(64 + 1, 64 + 1 - 20);
        let bottom_right = IVec2::new(64 + 62, 64 + 30 - 20);

        assert_eq!(picker.pick(top_left, &view(Rotation::Deg0)), IVec2::new(2, 1));
        assert_eq!(picker.pick(bottom_right, &view(Rotation::Deg0)), IVec2::new(4, 1));
        assert_eq!(picker.pick(top_left, &view(Rotation::Deg90)), IVec2::new(1, 5));
    }

    #[test]
    fn the_camera_offsets_whole_cells() {
        let picker = MousePicker::with_synthetic_images();
        let mut moved = view(Rotation::Deg0);
        moved.camera = Vec2::new(64.0, 0.0);
        let mouse = IVec2::new(32, 64 + 16 - 20);

        assert_eq!(picker.pick(mouse, &moved), IVec2::new(3, 1));
    }

    #[test]
    fn moves_track_current_and_last_cells() {
        let mut picker = MousePicker::with_synthetic_images();
        let view = view(Rotation::Deg0);
        assert_eq!(picker.current_position(), NO_POSITION);
        assert!(!picker.is_current_in_world(8, 8));

        assert!(picker.on_mouse_moved(IVec2::new(96, 60), &view));
        assert!(!picker.on_mouse_moved(IVec2::new(97, 61), &view), "same diamond");
        assert!(!picker.tile_position_changed());
        assert!(picker.on_mouse_moved(IVec2::new(160, 60), &view));

        assert_eq!(picker.last_position(), IVec2::new(3, 1));
        assert!(picker.is_current_in_world(8, 8));
        assert!(picker.is_last_in_world(8, 8));

        picker.on_mouse_enter(true);
        assert!(picker.is_in_window());
    }

    #[test]
    fn images_must_follow_zoom_order() {
        let images = [
            CornerImage::synthesize(Zoom::Mgfx),
            CornerImage::synthesize(Zoom::Mgfx),
            CornerImage::synthesize(Zoom::Gfx),
        ];
        assert!(matches!(
            MousePicker::new(images),
            Err(CornerImageError::UnexpectedZoom {
                expected: Zoom::Sgfx,
                found: Zoom::Mgfx
            })
        ));
    }
}

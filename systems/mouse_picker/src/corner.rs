//! Tile-sized reference images that resolve which diamond a pixel belongs to.
//!
//! Screen cells are tile-sized rectangles. Each cell holds one whole diamond
//! plus four corner triangles owned by the neighbouring diamonds; the corner
//! image paints those triangles in four key colours.

use glam::IVec2;
use isle_core::Zoom;
use thiserror::Error;

const BYTES_PER_PIXEL: usize = 4;

const RED: [u8; 3] = [255, 0, 0];
const GREEN: [u8; 3] = [0, 255, 0];
const BLUE: [u8; 3] = [0, 0, 255];
const YELLOW: [u8; 3] = [255, 255, 0];
const WHITE: [u8; 3] = [255, 255, 255];

/// Region of a screen cell, as painted in the corner image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corner {
    /// The diamond centred in the cell.
    Center,
    /// Red triangle.
    TopLeft,
    /// Green triangle.
    TopRight,
    /// Blue triangle.
    BottomLeft,
    /// Yellow triangle.
    BottomRight,
}

impl Corner {
    fn from_rgb(rgb: [u8; 3]) -> Self {
        match rgb {
            RED => Self::TopLeft,
            GREEN => Self::TopRight,
            BLUE => Self::BottomLeft,
            YELLOW => Self::BottomRight,
            _ => Self::Center,
        }
    }

    const fn rgb(self) -> [u8; 3] {
        match self {
            Self::Center => WHITE,
            Self::TopLeft => RED,
            Self::TopRight => GREEN,
            Self::BottomLeft => BLUE,
            Self::BottomRight => YELLOW,
        }
    }
}

/// Rejected corner image data.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CornerImageError {
    /// The image is not exactly one tile wide.
    #[error("{zoom:?} corner image is {actual} pixels wide, expected {expected}")]
    InvalidWidth {
        /// Zoom the image was loaded for.
        zoom: Zoom,
        /// Tile width of the zoom.
        expected: u32,
        /// Width of the image.
        actual: u32,
    },
    /// The image is not exactly one tile high.
    #[error("{zoom:?} corner image is {actual} pixels high, expected {expected}")]
    InvalidHeight {
        /// Zoom the image was loaded for.
        zoom: Zoom,
        /// Tile height of the zoom.
        expected: u32,
        /// Height of the image.
        actual: u32,
    },
    /// The pixel buffer does not hold one RGBA pixel per image cell.
    #[error("{zoom:?} corner image holds {actual} bytes, expected {expected}")]
    InvalidByteCount {
        /// Zoom the image was loaded for.
        zoom: Zoom,
        /// `width * height * 4`.
        expected: usize,
        /// Bytes provided.
        actual: usize,
    },
    /// The images passed to the picker are not ordered by zoom.
    #[error("expected the {expected:?} corner image, found {found:?}")]
    UnexpectedZoom {
        /// Zoom required at this position.
        expected: Zoom,
        /// Zoom of the provided image.
        found: Zoom,
    },
}

/// RGBA8 corner image of one zoom level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CornerImage {
    zoom: Zoom,
    pixels: Vec<u8>,
}

impl CornerImage {
    /// Wraps decoded RGBA8 pixels after checking they cover exactly one tile.
    pub fn from_rgba(
        zoom: Zoom,
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, CornerImageError> {
        let (tile_width, tile_height) = tile_size(zoom);
        if width != tile_width {
            return Err(CornerImageError::InvalidWidth {
                zoom,
                expected: tile_width,
                actual: width,
            });
        }
        if height != tile_height {
            return Err(CornerImageError::InvalidHeight {
                zoom,
                expected: tile_height,
                actual: height,
            });
        }

        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(CornerImageError::InvalidByteCount {
                zoom,
                expected,
                actual: pixels.len(),
            });
        }

        Ok(Self { zoom, pixels })
    }

    /// Paints the reference image for a zoom level.
    ///
    /// Pixels whose centre lies on or inside the diamond stay white; the four
    /// corner triangles get their key colours.
    #[must_use]
    pub fn synthesize(zoom: Zoom) -> Self {
        let (width, height) = tile_size(zoom);
        let half_width = width as f32 / 2.0;
        let half_height = height as f32 / 2.0;

        let mut pixels = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for y in 0..height {
            for x in 0..width {
                let dx = (x as f32 + 0.5 - half_width) / half_width;
                let dy = (y as f32 + 0.5 - half_height) / half_height;
                let corner = if dx.abs() + dy.abs() <= 1.0 {
                    Corner::Center
                } else {
                    match (dx < 0.0, dy < 0.0) {
                        (true, true) => Corner::TopLeft,
                        (false, true) => Corner::TopRight,
                        (true, false) => Corner::BottomLeft,
                        (false, false) => Corner::BottomRight,
                    }
                };
                pixels.extend_from_slice(&corner.rgb());
                pixels.push(u8::MAX);
            }
        }

        Self { zoom, pixels }
    }

    /// Zoom level the image belongs to.
    #[must_use]
    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    /// Region painted at an offset inside the cell.
    ///
    /// # Panics
    ///
    /// Panics when the offset lies outside the tile.
    #[must_use]
    pub fn corner_at(&self, offset: IVec2) -> Corner {
        let width = self.zoom.tile_width();
        assert!(
            isle_core::is_in_bounds(offset.x, offset.y, width, self.zoom.tile_height()),
            "offset ({}, {}) lies outside of the {:?} tile",
            offset.x,
            offset.y,
            self.zoom
        );

        let start = (offset.y * width + offset.x) as usize * BYTES_PER_PIXEL;
        Corner::from_rgb([
            self.pixels[start],
            self.pixels[start + 1],
            self.pixels[start + 2],
        ])
    }
}

fn tile_size(zoom: Zoom) -> (u32, u32) {
    (
        zoom.tile_width().unsigned_abs(),
        zoom.tile_height().unsigned_abs(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_images_have_tile_size() {
        for zoom in Zoom::ALL {
            let image = CornerImage::synthesize(zoom);
            let (width, height) = tile_size(zoom);
            assert!(
                CornerImage::from_rgba(zoom, width, height, image.pixels.clone()).is_ok(),
                "{zoom:?} synthetic image must pass validation"
            );
        }
    }

    #[test]
    fn synthetic_corners_surround_the_diamond() {
        let image = CornerImage::synthesize(Zoom::Gfx);
        assert_eq!(image.corner_at(IVec2::new(32, 16)), Corner::Center);
        assert_eq!(image.corner_at(IVec2::new(0, 0)), Corner::TopLeft);
        assert_eq!(image.corner_at(IVec2::new(63, 0)), Corner::TopRight);
        assert_eq!(image.corner_at(IVec2::new(0, 31)), Corner::BottomLeft);
        assert_eq!(image.corner_at(IVec2::new(63, 31)), Corner::BottomRight);
        assert_eq!(image.corner_at(IVec2::new(1, 16)), Corner::Center, "left tip");
    }

    #[test]
    fn wrong_sizes_are_rejected() {
        assert_eq!(
            CornerImage::from_rgba(Zoom::Sgfx, 15, 8, vec![0; 15 * 8 * 4]),
            Err(CornerImageError::InvalidWidth {
                zoom: Zoom::Sgfx,
                expected: 16,
                actual: 15
            })
        );
        assert_eq!(
            CornerImage::from_rgba(Zoom::Mgfx, 32, 15, vec![0; 32 * 15 * 4]),
            Err(CornerImageError::InvalidHeight {
                zoom: Zoom::Mgfx,
                expected: 16,
                actual: 15
            })
        );
        assert_eq!(
            CornerImage::from_rgba(Zoom::Sgfx, 16, 8, vec![0; 16 * 8 * 3]),
            Err(CornerImageError::InvalidByteCount {
                zoom: Zoom::Sgfx,
                expected: 512,
                actual: 384
            })
        );
    }

    #[test]
    #[should_panic(expected = "outside of")]
    fn offsets_outside_the_tile_panic() {
        let _ = CornerImage::synthesize(Zoom::Sgfx).corner_at(IVec2::new(16, 0));
    }
}
